use std::sync::Mutex;

use crate::app::Result;
use crate::domain::{CacheDoc, FeedSource, ReadState};
use crate::store::Store;

/// In-memory store for tests and ephemeral runs. Saves replace the held
/// document; loads clone it back out.
#[derive(Default)]
pub struct MemStore {
    sources: Mutex<Vec<FeedSource>>,
    read_state: Mutex<ReadState>,
    cache: Mutex<CacheDoc>,
}

impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Store for MemStore {
    fn load_sources(&self) -> Vec<FeedSource> {
        self.sources
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    fn save_sources(&self, sources: &[FeedSource]) -> Result<()> {
        *self.sources.lock().unwrap_or_else(|e| e.into_inner()) = sources.to_vec();
        Ok(())
    }

    fn load_read_state(&self) -> ReadState {
        self.read_state
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    fn save_read_state(&self, state: &ReadState) -> Result<()> {
        *self.read_state.lock().unwrap_or_else(|e| e.into_inner()) = state.clone();
        Ok(())
    }

    fn load_cache(&self) -> CacheDoc {
        self.cache.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn save_cache(&self, cache: &CacheDoc) -> Result<()> {
        *self.cache.lock().unwrap_or_else(|e| e.into_inner()) = cache.clone();
        Ok(())
    }
}
