pub mod json;
pub mod memory;

use crate::app::Result;
use crate::domain::{CacheDoc, FeedSource, ReadState};

pub use json::JsonStore;
pub use memory::MemStore;

/// Key-addressed persistence for the three engine documents: the source
/// list, the read-state ledger and the fetch cache.
///
/// Loads are infallible by contract. A missing file yields the default
/// document, and so does a corrupt one (after a logged warning): bad state
/// on disk must never prevent startup. Saves can fail; callers log and
/// degrade to in-memory for the session.
pub trait Store: Send + Sync {
    fn load_sources(&self) -> Vec<FeedSource>;
    fn save_sources(&self, sources: &[FeedSource]) -> Result<()>;

    fn load_read_state(&self) -> ReadState;
    fn save_read_state(&self, state: &ReadState) -> Result<()>;

    fn load_cache(&self) -> CacheDoc;
    fn save_cache(&self, cache: &CacheDoc) -> Result<()>;
}
