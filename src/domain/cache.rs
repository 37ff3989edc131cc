use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::FeedItem;

/// On-disk shape of the fetch cache.
///
/// Both maps are keyed by feed URL, not source id, so renaming a source
/// keeps its cache while editing its URL targets a different entry. A URL
/// missing from `last_fetch_times` reads as the epoch-zero sentinel,
/// forcing the next fetch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CacheDoc {
    pub feed_cache: HashMap<String, Vec<FeedItem>>,
    pub last_fetch_times: HashMap<String, DateTime<Utc>>,
}
