//! Bounded in-process memory tier.

use crate::models::Track;
use rand::Rng;
use std::collections::HashMap;
use std::time::{Duration, Instant};

struct Entry {
    results: Vec<Track>,
    inserted_at: Instant,
}

/// A size-capped, TTL-expiring map guarded by a single mutex (held only
/// during insert/lookup) so contention stays O(1) per call.
pub struct MemoryCache {
    entries: std::sync::Mutex<HashMap<String, Entry>>,
    ttl: Duration,
    max_entries: usize,
}

impl MemoryCache {
    pub fn new(ttl: Duration, max_entries: usize) -> Self {
        MemoryCache {
            entries: std::sync::Mutex::new(HashMap::new()),
            ttl,
            max_entries,
        }
    }

    /// Returns a clone of the cached results if present and not expired.
    pub fn get(&self, key: &str) -> Option<Vec<Track>> {
        let mut entries = self.entries.lock().unwrap();
        match entries.get(key) {
            Some(entry) if entry.inserted_at.elapsed() <= self.ttl => Some(entry.results.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    /// Inserts `results`, evicting a uniformly random entry first if the
    /// cache is already at capacity.
    pub fn put(&self, key: String, results: Vec<Track>) {
        let mut entries = self.entries.lock().unwrap();
        if entries.len() >= self.max_entries && !entries.contains_key(&key) {
            if let Some(victim) = random_key(&entries) {
                entries.remove(&victim);
            }
        }
        entries.insert(
            key,
            Entry {
                results,
                inserted_at: Instant::now(),
            },
        );
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }
}

fn random_key(entries: &HashMap<String, Entry>) -> Option<String> {
    if entries.is_empty() {
        return None;
    }
    let idx = rand::thread_rng().gen_range(0..entries.len());
    entries.keys().nth(idx).cloned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_track(external_id: &str) -> Track {
        Track {
            id: 1,
            external_id: external_id.to_string(),
            name: "Test".to_string(),
            artist: None,
            album: None,
            genre: None,
            collection: String::new(),
            rating: 0,
            starred: false,
            ranking: 0.0,
            duration_secs: 0.0,
            play_count: 0,
            streaming: false,
            kind: String::new(),
            stream_url: None,
            playlist_names: "[]".to_string(),
            created_at: String::new(),
            modified_at: String::new(),
        }
    }

    #[test]
    fn put_then_get_round_trips() {
        let cache = MemoryCache::new(Duration::from_secs(60), 10);
        cache.put("q".to_string(), vec![sample_track("T001")]);
        let hit = cache.get("q").unwrap();
        assert_eq!(hit[0].external_id, "T001");
    }

    #[test]
    fn expired_entry_is_a_miss() {
        let cache = MemoryCache::new(Duration::from_millis(1), 10);
        cache.put("q".to_string(), vec![sample_track("T001")]);
        std::thread::sleep(Duration::from_millis(5));
        assert!(cache.get("q").is_none());
    }

    #[test]
    fn eviction_keeps_cache_at_capacity() {
        let cache = MemoryCache::new(Duration::from_secs(60), 2);
        cache.put("a".to_string(), vec![sample_track("T001")]);
        cache.put("b".to_string(), vec![sample_track("T002")]);
        cache.put("c".to_string(), vec![sample_track("T003")]);
        assert!(cache.len() <= 2);
    }
}
