//! Optional disk tier: one JSON file per cache entry, named by query hash.
//!
//! The directory is shared across processes, so writes go to a temp file
//! first and are renamed into place — a reader never observes a partial
//! write. Readers treat a missing or truncated file as a miss rather than
//! an error.

use crate::models::Track;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::warn;

#[derive(Debug, Serialize, Deserialize)]
struct DiskEntry {
    normalized_query: String,
    inserted_at_unix_ms: i64,
    results: Vec<Track>,
}

pub struct DiskCache {
    dir: PathBuf,
    ttl: Duration,
}

impl DiskCache {
    /// Ensures the cache directory exists.
    pub fn new(dir: PathBuf, ttl: Duration) -> std::io::Result<Self> {
        std::fs::create_dir_all(&dir)?;
        Ok(DiskCache { dir, ttl })
    }

    fn entry_path(&self, hash_key: &str) -> PathBuf {
        self.dir.join(format!("{hash_key}.json"))
    }

    pub fn get(&self, hash_key: &str, normalized_query: &str) -> Option<Vec<Track>> {
        let path = self.entry_path(hash_key);
        let raw = std::fs::read_to_string(&path).ok()?;
        let entry: DiskEntry = match serde_json::from_str(&raw) {
            Ok(e) => e,
            Err(_) => return None,
        };

        if entry.normalized_query != normalized_query {
            return None;
        }

        let age_ms = now_unix_ms().saturating_sub(entry.inserted_at_unix_ms);
        if age_ms > self.ttl.as_millis() as i64 {
            return None;
        }

        Some(entry.results)
    }

    pub fn put(&self, hash_key: &str, normalized_query: &str, results: &[Track]) -> std::io::Result<()> {
        let entry = DiskEntry {
            normalized_query: normalized_query.to_string(),
            inserted_at_unix_ms: now_unix_ms(),
            results: results.to_vec(),
        };
        let serialized = serde_json::to_vec(&entry)?;

        let final_path = self.entry_path(hash_key);
        let tmp_path = self.dir.join(format!("{hash_key}.json.tmp-{}", std::process::id()));
        std::fs::write(&tmp_path, &serialized)?;
        std::fs::rename(&tmp_path, &final_path)?;
        Ok(())
    }

    /// Removes entries older than the configured TTL. Call on startup and
    /// periodically (the design's once-per-hour background sweep).
    pub fn sweep(&self) {
        let Ok(read_dir) = std::fs::read_dir(&self.dir) else {
            return;
        };

        for entry in read_dir.flatten() {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            if is_stale(&path, self.ttl) {
                if let Err(e) = std::fs::remove_file(&path) {
                    warn!(path = %path.display(), error = %e, "failed to sweep stale cache entry");
                }
            }
        }
    }
}

fn is_stale(path: &Path, ttl: Duration) -> bool {
    let raw = match std::fs::read_to_string(path) {
        Ok(r) => r,
        Err(_) => return true,
    };
    match serde_json::from_str::<DiskEntry>(&raw) {
        Ok(entry) => now_unix_ms().saturating_sub(entry.inserted_at_unix_ms) > ttl.as_millis() as i64,
        Err(_) => true,
    }
}

fn now_unix_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}
