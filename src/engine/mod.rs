//! Cache and merge logic.
//!
//! Owns the per-URL item cache and last-fetch timestamps, decides
//! fetch-versus-serve-cache, and merges fresh fetch results with retained
//! items. Entries are keyed by feed URL, so the engine neither knows nor
//! cares which source owns a URL.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::domain::{CacheDoc, FeedItem};
use crate::store::Store;

/// How long a cache entry satisfies `resolve` without a refetch.
pub const CACHE_DURATION_SECS: i64 = 600;

/// Hard cap on retained items per source URL.
pub const MAX_CACHED_ITEMS: usize = 200;

/// Outcome of the fetch-or-serve decision for one URL.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchPlan {
    Fetch,
    ServeCache(Vec<FeedItem>),
}

/// Merge freshly fetched items into an existing cached sequence.
///
/// An item whose link is already cached is dropped in favor of the
/// existing copy, so previously seen items keep their order. Brand-new
/// items go in front, in the order the parser produced them, and the
/// result is truncated to [`MAX_CACHED_ITEMS`] from the tail. The result
/// depends only on its two inputs, so concurrent fetch completions applied
/// one at a time stay consistent regardless of their order.
pub fn merge_items(existing: &[FeedItem], fresh: Vec<FeedItem>) -> Vec<FeedItem> {
    let mut seen: HashSet<String> = existing.iter().map(|i| i.link.clone()).collect();

    let mut merged: Vec<FeedItem> = Vec::with_capacity(existing.len() + fresh.len());
    for item in fresh {
        if seen.insert(item.link.clone()) {
            merged.push(item);
        }
    }
    merged.extend_from_slice(existing);
    merged.truncate(MAX_CACHED_ITEMS);
    merged
}

pub struct CacheEngine {
    items: HashMap<String, Vec<FeedItem>>,
    last_fetch: HashMap<String, DateTime<Utc>>,
    store: Arc<dyn Store>,
}

impl CacheEngine {
    pub fn load(store: Arc<dyn Store>) -> Self {
        let doc = store.load_cache();
        Self {
            items: doc.feed_cache,
            last_fetch: doc.last_fetch_times,
            store,
        }
    }

    /// Decide whether `url` needs a network fetch or can be served from
    /// the cache. A missing timestamp behaves as the epoch-zero sentinel.
    pub fn resolve(&self, url: &str, force_refresh: bool, now: DateTime<Utc>) -> FetchPlan {
        if force_refresh {
            return FetchPlan::Fetch;
        }
        let Some(cached) = self.items.get(url) else {
            return FetchPlan::Fetch;
        };
        let last = self
            .last_fetch
            .get(url)
            .copied()
            .unwrap_or(DateTime::UNIX_EPOCH);
        if (now - last).num_seconds() >= CACHE_DURATION_SECS {
            FetchPlan::Fetch
        } else {
            FetchPlan::ServeCache(cached.clone())
        }
    }

    /// Merge a successful fetch into the cache and write the full cache
    /// through to the store. A persistence failure is logged and the
    /// engine keeps running in memory for the session.
    ///
    /// Fetch failures never reach this method: the previous entry and
    /// timestamp stay authoritative until a future fetch succeeds.
    pub fn apply_fetch(&mut self, url: &str, fresh: Vec<FeedItem>, completed_at: DateTime<Utc>) {
        let existing = self.items.get(url).map(Vec::as_slice).unwrap_or(&[]);
        let merged = merge_items(existing, fresh);
        self.items.insert(url.to_string(), merged);
        self.last_fetch.insert(url.to_string(), completed_at);

        if let Err(e) = self.store.save_cache(&self.to_doc()) {
            tracing::warn!(url, error = %e, "failed to persist feed cache");
        }
    }

    pub fn items(&self, url: &str) -> &[FeedItem] {
        self.items.get(url).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn has_entry(&self, url: &str) -> bool {
        self.items.contains_key(url)
    }

    /// True iff the entry for `url` holds at least one item whose link is
    /// not in the read ledger.
    pub fn has_unread(&self, url: &str, read_links: &HashSet<String>) -> bool {
        self.items
            .get(url)
            .map(|items| items.iter().any(|i| !read_links.contains(&i.link)))
            .unwrap_or(false)
    }

    fn to_doc(&self) -> CacheDoc {
        CacheDoc {
            feed_cache: self.items.clone(),
            last_fetch_times: self.last_fetch.clone(),
        }
    }
}
