use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Persisted read/unread ledger.
///
/// An item is read iff its link is a member of `read_links`. The set lives
/// outside the items themselves so that re-fetching a feed never resets
/// read status. `last_read_dates` is part of the on-disk format but is not
/// consulted by any engine logic.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReadState {
    pub read_links: HashSet<String>,
    pub last_read_dates: HashMap<String, DateTime<Utc>>,
}

impl ReadState {
    pub fn is_read(&self, link: &str) -> bool {
        self.read_links.contains(link)
    }

    pub fn mark_read(&mut self, link: &str, at: DateTime<Utc>) {
        self.read_links.insert(link.to_string());
        self.last_read_dates.insert(link.to_string(), at);
    }

    pub fn mark_unread(&mut self, link: &str) {
        self.read_links.remove(link);
    }
}

/// Externally observable fetch state of one source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FeedStatus {
    /// Nothing fetched for this source yet this session.
    #[default]
    NoCache,
    /// A fetch is in flight.
    Loading,
    /// The last fetch or cache-serve completed, possibly with zero items.
    Ready,
    /// Fetch failed and no cached items exist to fall back on.
    Error,
    /// Fetch failed; the previously cached items remain on display.
    ErrorStaleCache,
}
