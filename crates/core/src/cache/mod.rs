//! TTL cache used for external API responses and background task progress.
//!
//! Values are stored as JSON so heterogeneous payloads share one cache and
//! entries survive type changes without a schema.

mod memory;

pub use memory::MemoryCache;

use serde::{de::DeserializeOwned, Serialize};
use std::time::Duration;

/// A key-value cache with per-entry time-to-live.
pub trait Cache: Send + Sync {
    /// Returns the cached value, or None when absent or expired.
    fn get(&self, key: &str) -> Option<serde_json::Value>;

    /// Stores a value, replacing any existing entry under the same key.
    fn set(&self, key: &str, value: serde_json::Value, ttl: Duration);

    fn remove(&self, key: &str);
}

/// Typed read helper. Entries that fail to deserialize are treated as misses.
pub fn get_json<T: DeserializeOwned>(cache: &dyn Cache, key: &str) -> Option<T> {
    let value = cache.get(key)?;
    serde_json::from_value(value).ok()
}

/// Typed write helper. Serialization failures drop the write silently, a
/// cache miss later is the correct outcome for an unstorable value.
pub fn put_json<T: Serialize>(cache: &dyn Cache, key: &str, value: &T, ttl: Duration) {
    if let Ok(json) = serde_json::to_value(value) {
        cache.set(key, json, ttl);
    }
}
