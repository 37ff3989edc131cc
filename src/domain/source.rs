use serde::{Deserialize, Serialize};

pub type SourceId = u64;

/// A named feed subscription.
///
/// The URL doubles as the cache key, so two sources never share one:
/// duplicate URLs are rejected on add. The id stays stable across renames
/// and URL edits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedSource {
    pub id: SourceId,
    pub name: String,
    pub url: String,
}

impl FeedSource {
    pub fn new(id: SourceId, name: String, url: String) -> Self {
        Self { id, name, url }
    }
}
