//! Lookup Cache: a bounded, process-wide map from normalized query string to
//! materialized search results, sitting in front of the Query Engine.
//!
//! The cache is a value (constructed via [`LookupCache::init`], torn down
//! via [`LookupCache::shutdown`]), not a global singleton, so tests can
//! inject a fresh instance per the design's "process-wide cache handle"
//! guidance.

pub mod disk;
pub mod key;
pub mod memory;

use crate::models::Track;
use disk::DiskCache;
use memory::MemoryCache;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::{debug, warn};

/// Default TTL for both cache tiers.
pub const DEFAULT_TTL: Duration = Duration::from_secs(600);
/// Default in-process entry cap.
const DEFAULT_MAX_ENTRIES: usize = 1024;

/// Hit/miss counters, exposed for instrumentation (logging, `stats`-style
/// reporting). Cheap to read; updated with relaxed atomics since exactness
/// under race is not load-bearing, only observability.
#[derive(Debug, Default)]
pub struct CacheInstrumentation {
    hits: AtomicU64,
    misses: AtomicU64,
}

impl CacheInstrumentation {
    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }
}

/// The two-tier (memory + optional disk) query cache described in the
/// design. `get` never fails: disk I/O errors and malformed entries are
/// treated as misses, never surfaced to the caller.
pub struct LookupCache {
    memory: MemoryCache,
    disk: Option<DiskCache>,
    instrumentation: CacheInstrumentation,
}

impl LookupCache {
    /// Initializes a cache with the default TTL/size, optionally backed by
    /// a disk tier at `disk_dir`. Pass `None` to run memory-only (e.g. in
    /// tests).
    pub fn init(disk_dir: Option<PathBuf>) -> Self {
        let disk = disk_dir.and_then(|dir| match DiskCache::new(dir, DEFAULT_TTL) {
            Ok(cache) => Some(cache),
            Err(e) => {
                warn!(error = %e, "failed to initialize disk cache tier; running memory-only");
                None
            }
        });

        // Sweep stale disk entries once at startup, per the design's
        // "purged ... on startup" requirement.
        if let Some(disk) = &disk {
            disk.sweep();
        }

        LookupCache {
            memory: MemoryCache::new(DEFAULT_TTL, DEFAULT_MAX_ENTRIES),
            disk,
            instrumentation: CacheInstrumentation::default(),
        }
    }

    /// Looks up `query`, normalized, across the memory tier then the disk
    /// tier. Returns `(results, true)` on a hit, `(vec![], false)` on a
    /// miss; a miss is authoritative — the caller must invoke the Query
    /// Engine itself.
    pub fn get(&self, query: &str) -> (Vec<Track>, bool) {
        let normalized = key::normalize(query);

        if let Some(results) = self.memory.get(&normalized) {
            self.instrumentation.hits.fetch_add(1, Ordering::Relaxed);
            debug!(query = %normalized, tier = "memory", "cache hit");
            return (results, true);
        }

        if let Some(disk) = &self.disk {
            let hash_key = key::hash_key(&normalized);
            if let Some(results) = disk.get(&hash_key, &normalized) {
                self.instrumentation.hits.fetch_add(1, Ordering::Relaxed);
                debug!(query = %normalized, tier = "disk", "cache hit");
                // Promote to the memory tier so the next lookup is fast.
                self.memory.put(normalized, results.clone());
                return (results, true);
            }
        }

        self.instrumentation.misses.fetch_add(1, Ordering::Relaxed);
        (Vec::new(), false)
    }

    /// Stores `results` for `query`. Per the design, only results with at
    /// least one row are cached — an empty result is cheap to recompute and
    /// caching it would mask a subsequent real result from showing up
    /// until the TTL expires.
    pub fn put(&self, query: &str, results: Vec<Track>) {
        if results.is_empty() {
            return;
        }

        let normalized = key::normalize(query);

        if let Some(disk) = &self.disk {
            let hash_key = key::hash_key(&normalized);
            if let Err(e) = disk.put(&hash_key, &normalized, &results) {
                warn!(query = %normalized, error = %e, "failed to write disk cache entry");
            }
        }

        self.memory.put(normalized, results);
    }

    /// Runs the disk tier's stale-entry sweep. Callers schedule this once
    /// an hour, per the design.
    pub fn sweep(&self) {
        if let Some(disk) = &self.disk {
            disk.sweep();
        }
    }

    pub fn instrumentation(&self) -> &CacheInstrumentation {
        &self.instrumentation
    }

    /// No-op hook for symmetry with [`Self::init`]; present so callers have
    /// an explicit lifecycle boundary even though neither tier holds a
    /// resource that needs releasing (the disk tier is files, not a held
    /// handle).
    pub fn shutdown(self) {}
}
