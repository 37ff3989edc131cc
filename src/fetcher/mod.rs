pub mod http;

use async_trait::async_trait;

use crate::app::Result;

pub use http::HttpFetcher;

/// Downloads raw feed bytes.
///
/// Every fetch is a full GET; the cache layer above decides when to skip
/// the network entirely, so there is no conditional-request support here.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>>;
}
