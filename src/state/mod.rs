//! Durable crawl state
//!
//! One JSON snapshot per crawl identifier, written atomically (temp file
//! then rename) so a reader never observes a half-written flush. Loading is
//! soft-fail: a missing, corrupt, or incompatible snapshot simply means a
//! cold start.

use crate::crawler::{FrontierItem, PageError, ScrapedPage};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::PathBuf;

/// Snapshot format version; snapshots with a different version are ignored
pub const STATE_VERSION: u32 = 1;

/// Persisted crawl state snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrawlState {
    pub version: u32,

    pub start_url: String,

    pub base_origin: String,

    /// Frontier items not yet dispatched
    pub queue: Vec<FrontierItem>,

    /// Canonical URLs already dequeued for scraping
    pub visited: Vec<String>,

    /// Canonical URLs currently in the queue
    pub queued: Vec<String>,

    /// Accepted pages; only carried when persist-pages is enabled
    #[serde(default)]
    pub pages: Vec<ScrapedPage>,

    /// Per-page errors; only carried when persist-pages is enabled
    #[serde(default)]
    pub errors: Vec<PageError>,

    pub max_depth_reached: u32,

    pub updated_at: DateTime<Utc>,
}

/// Derives the default crawl identifier from the start URL
///
/// A 16-hex-character SHA-256 prefix, stable across runs so repeated crawls
/// of the same seed share a snapshot file.
pub fn default_state_id(start_url: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(start_url.as_bytes());
    hex::encode(hasher.finalize())[..16].to_string()
}

/// Directory-scoped store for crawl state snapshots
#[derive(Debug, Clone)]
pub struct StateStore {
    dir: PathBuf,
}

impl StateStore {
    /// Creates a store rooted at `dir`; the directory is created lazily on
    /// the first save
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Path of the snapshot file for a crawl identifier
    pub fn state_path(&self, id: &str) -> PathBuf {
        self.dir.join(format!("{}.json", id))
    }

    /// Loads the snapshot for a crawl identifier
    ///
    /// # Returns
    ///
    /// * `Some(CrawlState)` - A readable snapshot with a matching version
    /// * `None` - Missing, unreadable, corrupt, or version-incompatible
    pub fn load(&self, id: &str) -> Option<CrawlState> {
        let path = self.state_path(id);
        let content = match std::fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) => {
                tracing::debug!("No crawl state at {}: {}", path.display(), e);
                return None;
            }
        };

        let state: CrawlState = match serde_json::from_str(&content) {
            Ok(s) => s,
            Err(e) => {
                tracing::warn!("Ignoring corrupt crawl state {}: {}", path.display(), e);
                return None;
            }
        };

        if state.version != STATE_VERSION {
            tracing::warn!(
                "Ignoring crawl state {} with version {} (expected {})",
                path.display(),
                state.version,
                STATE_VERSION
            );
            return None;
        }

        Some(state)
    }

    /// Saves a snapshot atomically
    ///
    /// Serializes to `{id}.json.tmp`, then renames over `{id}.json`.
    /// Callers are expected to swallow the error (log and continue); a
    /// failed flush never aborts a crawl.
    pub fn save(&self, id: &str, state: &CrawlState) -> crate::Result<()> {
        std::fs::create_dir_all(&self.dir)?;

        let path = self.state_path(id);
        let tmp_path = self.dir.join(format!("{}.json.tmp", id));

        let json = serde_json::to_string(state)?;
        std::fs::write(&tmp_path, json)?;
        std::fs::rename(&tmp_path, &path)?;

        tracing::debug!(
            "Flushed crawl state to {} ({} queued, {} visited)",
            path.display(),
            state.queue.len(),
            state.visited.len()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample_state() -> CrawlState {
        CrawlState {
            version: STATE_VERSION,
            start_url: "https://example.com/".to_string(),
            base_origin: "https://example.com".to_string(),
            queue: vec![FrontierItem {
                url: "https://example.com/next".to_string(),
                depth: 1,
            }],
            visited: vec!["https://example.com/".to_string()],
            queued: vec!["https://example.com/next".to_string()],
            pages: Vec::new(),
            errors: Vec::new(),
            max_depth_reached: 0,
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_save_then_load_round_trip() {
        let dir = TempDir::new().unwrap();
        let store = StateStore::new(dir.path());

        let state = sample_state();
        store.save("abc", &state).unwrap();

        let loaded = store.load("abc").unwrap();
        assert_eq!(loaded.start_url, state.start_url);
        assert_eq!(loaded.queue.len(), 1);
        assert_eq!(loaded.queue[0].depth, 1);
        assert_eq!(loaded.visited, state.visited);
    }

    #[test]
    fn test_load_missing_returns_none() {
        let dir = TempDir::new().unwrap();
        let store = StateStore::new(dir.path());
        assert!(store.load("nope").is_none());
    }

    #[test]
    fn test_load_corrupt_returns_none() {
        let dir = TempDir::new().unwrap();
        let store = StateStore::new(dir.path());
        std::fs::write(store.state_path("bad"), "{ not json").unwrap();
        assert!(store.load("bad").is_none());
    }

    #[test]
    fn test_load_wrong_version_returns_none() {
        let dir = TempDir::new().unwrap();
        let store = StateStore::new(dir.path());

        let mut state = sample_state();
        state.version = 99;
        store.save("v99", &state).unwrap();
        assert!(store.load("v99").is_none());
    }

    #[test]
    fn test_save_overwrites_atomically() {
        let dir = TempDir::new().unwrap();
        let store = StateStore::new(dir.path());

        let mut state = sample_state();
        store.save("abc", &state).unwrap();

        state.max_depth_reached = 3;
        store.save("abc", &state).unwrap();

        let loaded = store.load("abc").unwrap();
        assert_eq!(loaded.max_depth_reached, 3);
        // No temp file left behind
        assert!(!dir.path().join("abc.json.tmp").exists());
    }

    #[test]
    fn test_default_state_id_stable() {
        let a = default_state_id("https://example.com/");
        let b = default_state_id("https://example.com/");
        let c = default_state_id("https://other.com/");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.len(), 16);
    }

}
