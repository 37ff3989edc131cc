use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::app::{FreshetError, Result};
use crate::domain::{CacheDoc, FeedSource, ReadState};
use crate::store::Store;

pub const FEEDS_FILE: &str = "feeds.json";
pub const READ_STATE_FILE: &str = "readstate.json";
pub const FEED_CACHE_FILE: &str = "feedcache.json";

/// Flat-file store: one JSON document per file in a single directory.
///
/// The directory is created lazily on first save. Writes go to a temp file
/// that is renamed over the target, so a crash mid-write leaves the prior
/// version intact.
pub struct JsonStore {
    dir: PathBuf,
}

impl JsonStore {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    /// Store rooted at the platform data directory.
    pub fn open_default() -> Result<Self> {
        Ok(Self::new(Self::default_dir()?))
    }

    pub fn default_dir() -> Result<PathBuf> {
        let data_dir = dirs::data_dir()
            .ok_or_else(|| FreshetError::Config("could not determine data directory".into()))?;
        Ok(data_dir.join("freshet"))
    }

    fn path(&self, file: &str) -> PathBuf {
        self.dir.join(file)
    }

    fn load_doc<T>(&self, file: &str) -> T
    where
        T: DeserializeOwned + Default,
    {
        let path = self.path(file);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return T::default(),
            Err(e) => {
                tracing::warn!(file, error = %e, "failed to read document, starting empty");
                return T::default();
            }
        };

        match serde_json::from_slice(&bytes) {
            Ok(doc) => doc,
            Err(e) => {
                tracing::warn!(file, error = %e, "corrupt document, starting empty");
                T::default()
            }
        }
    }

    fn save_doc<T: Serialize>(&self, file: &str, doc: &T) -> Result<()> {
        fs::create_dir_all(&self.dir)?;
        let tmp = self.path(&format!("{file}.tmp"));
        fs::write(&tmp, serde_json::to_vec_pretty(doc)?)?;
        // atomic replace within the same directory
        fs::rename(&tmp, self.path(file))?;
        Ok(())
    }
}

impl Store for JsonStore {
    fn load_sources(&self) -> Vec<FeedSource> {
        self.load_doc(FEEDS_FILE)
    }

    fn save_sources(&self, sources: &[FeedSource]) -> Result<()> {
        self.save_doc(FEEDS_FILE, &sources)
    }

    fn load_read_state(&self) -> ReadState {
        self.load_doc(READ_STATE_FILE)
    }

    fn save_read_state(&self, state: &ReadState) -> Result<()> {
        self.save_doc(READ_STATE_FILE, state)
    }

    fn load_cache(&self) -> CacheDoc {
        self.load_doc(FEED_CACHE_FILE)
    }

    fn save_cache(&self, cache: &CacheDoc) -> Result<()> {
        self.save_doc(FEED_CACHE_FILE, cache)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::domain::FeedItem;

    fn store() -> (tempfile::TempDir, JsonStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::new(dir.path());
        (dir, store)
    }

    #[test]
    fn test_sources_round_trip() {
        let (_dir, store) = store();
        let sources = vec![
            FeedSource::new(1, "Rust Blog".into(), "https://blog.rust-lang.org/feed".into()),
            FeedSource::new(2, "Other".into(), "https://other.example/rss".into()),
        ];

        store.save_sources(&sources).unwrap();
        assert_eq!(store.load_sources(), sources);
    }

    #[test]
    fn test_read_state_round_trip() {
        let (_dir, store) = store();
        let mut state = ReadState::default();
        state.mark_read("http://a/1", Utc::now());

        store.save_read_state(&state).unwrap();
        assert_eq!(store.load_read_state(), state);
    }

    #[test]
    fn test_cache_round_trip() {
        let (_dir, store) = store();
        let mut cache = CacheDoc::default();
        cache.feed_cache.insert(
            "http://feed".into(),
            vec![FeedItem::new("X".into(), "http://a/1".into())],
        );
        cache.last_fetch_times.insert("http://feed".into(), Utc::now());

        store.save_cache(&cache).unwrap();
        assert_eq!(store.load_cache(), cache);
    }

    #[test]
    fn test_empty_documents_round_trip() {
        let (_dir, store) = store();
        store.save_sources(&[]).unwrap();
        store.save_read_state(&ReadState::default()).unwrap();
        store.save_cache(&CacheDoc::default()).unwrap();

        assert!(store.load_sources().is_empty());
        assert_eq!(store.load_read_state(), ReadState::default());
        assert_eq!(store.load_cache(), CacheDoc::default());
    }

    #[test]
    fn test_missing_files_load_as_default() {
        let (_dir, store) = store();
        assert!(store.load_sources().is_empty());
        assert_eq!(store.load_read_state(), ReadState::default());
        assert_eq!(store.load_cache(), CacheDoc::default());
    }

    #[test]
    fn test_corrupt_file_loads_as_default() {
        let (dir, store) = store();
        std::fs::write(dir.path().join(FEEDS_FILE), b"{ not json").unwrap();
        assert!(store.load_sources().is_empty());
    }

    #[test]
    fn test_save_creates_directory_lazily() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        let store = JsonStore::new(&nested);

        store.save_sources(&[]).unwrap();
        assert!(nested.join(FEEDS_FILE).exists());
    }

    #[test]
    fn test_no_temp_file_left_behind() {
        let (dir, store) = store();
        store.save_sources(&[]).unwrap();
        assert!(!dir.path().join(format!("{FEEDS_FILE}.tmp")).exists());
    }
}
