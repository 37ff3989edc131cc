use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One syndicated entry.
///
/// The link is the identity key: two items with the same link are the same
/// item regardless of title differences. Equality is exact string equality,
/// no URL normalization. Items are immutable once parsed; merging builds
/// new sequences instead of mutating these records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedItem {
    pub title: String,
    pub link: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pub_date: Option<DateTime<Utc>>,
    /// Carried in the cache file for format compatibility. The read-state
    /// ledger, not this field, is authoritative.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_read: Option<bool>,
}

impl FeedItem {
    pub fn new(title: String, link: String) -> Self {
        Self {
            title,
            link,
            pub_date: None,
            is_read: None,
        }
    }

    pub fn display_title(&self) -> &str {
        if self.title.is_empty() {
            "(Untitled)"
        } else {
            &self.title
        }
    }
}
