use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use super::Cache;

struct Entry {
    value: serde_json::Value,
    expires_at: Instant,
}

/// In-memory TTL cache. Expired entries are dropped lazily on read and
/// swept on write, so the map never grows past the live working set.
#[derive(Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, Entry>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }
}

impl Cache for MemoryCache {
    fn get(&self, key: &str) -> Option<serde_json::Value> {
        let mut entries = self.entries.lock().unwrap();
        match entries.get(key) {
            Some(entry) if entry.expires_at > Instant::now() => Some(entry.value.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    fn set(&self, key: &str, value: serde_json::Value, ttl: Duration) {
        let now = Instant::now();
        let mut entries = self.entries.lock().unwrap();
        entries.retain(|_, entry| entry.expires_at > now);
        entries.insert(
            key.to_string(),
            Entry {
                value,
                expires_at: now + ttl,
            },
        );
    }

    fn remove(&self, key: &str) {
        self.entries.lock().unwrap().remove(key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{get_json, put_json};
    use serde_json::json;

    #[test]
    fn test_set_and_get() {
        let cache = MemoryCache::new();
        cache.set("key", json!({"a": 1}), Duration::from_secs(60));
        assert_eq!(cache.get("key"), Some(json!({"a": 1})));
    }

    #[test]
    fn test_missing_key() {
        let cache = MemoryCache::new();
        assert_eq!(cache.get("nope"), None);
    }

    #[test]
    fn test_expired_entry_is_a_miss() {
        let cache = MemoryCache::new();
        cache.set("key", json!(1), Duration::from_secs(0));
        assert_eq!(cache.get("key"), None);
    }

    #[test]
    fn test_overwrite_replaces_value() {
        let cache = MemoryCache::new();
        cache.set("key", json!(1), Duration::from_secs(60));
        cache.set("key", json!(2), Duration::from_secs(60));
        assert_eq!(cache.get("key"), Some(json!(2)));
    }

    #[test]
    fn test_remove() {
        let cache = MemoryCache::new();
        cache.set("key", json!(1), Duration::from_secs(60));
        cache.remove("key");
        assert_eq!(cache.get("key"), None);
    }

    #[test]
    fn test_expired_entries_swept_on_write() {
        let cache = MemoryCache::new();
        cache.set("old", json!(1), Duration::from_secs(0));
        cache.set("new", json!(2), Duration::from_secs(60));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_typed_helpers_round_trip() {
        let cache = MemoryCache::new();
        put_json(&cache, "nums", &vec![1u32, 2, 3], Duration::from_secs(60));
        let nums: Vec<u32> = get_json(&cache, "nums").unwrap();
        assert_eq!(nums, vec![1, 2, 3]);
    }

    #[test]
    fn test_typed_helper_mismatched_shape_is_a_miss() {
        let cache = MemoryCache::new();
        cache.set("key", json!("text"), Duration::from_secs(60));
        let value: Option<Vec<u32>> = get_json(&cache, "key");
        assert!(value.is_none());
    }
}
