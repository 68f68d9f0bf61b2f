//! Result cache with TTL support.
//!
//! The aggregator talks to a [`CacheStore`], a plain key-value store holding
//! JSON values with a per-entry TTL. Hosts plug in whatever they already
//! run; [`MemoryCache`] is the in-process implementation.
//!
//! Concurrent writes to the same key are last-writer-wins.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use eventfeed_providers::BoxFuture;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, trace, warn};

/// A key-value store with per-entry expiry.
pub trait CacheStore: Send + Sync {
    /// Returns the value for `key` if present and not expired.
    fn get<'a>(&'a self, key: &'a str) -> BoxFuture<'a, Option<Value>>;

    /// Stores `value` under `key` for `ttl`.
    fn set<'a>(&'a self, key: &'a str, value: Value, ttl: Duration) -> BoxFuture<'a, ()>;

    /// Drops the entry for `key`, if any.
    fn remove<'a>(&'a self, key: &'a str) -> BoxFuture<'a, ()>;
}

impl dyn CacheStore {
    /// Reads `key` and decodes it as `T`.
    ///
    /// Returns `Ok(None)` on a miss.
    ///
    /// # Errors
    ///
    /// Returns the decode error if the stored value is not a `T`.
    pub async fn get_typed<T: DeserializeOwned>(
        &self,
        key: &str,
    ) -> Result<Option<T>, serde_json::Error> {
        match self.get(key).await {
            Some(value) => serde_json::from_value(value).map(Some),
            None => Ok(None),
        }
    }

    /// Encodes `value` and stores it under `key`.
    ///
    /// A value that cannot be encoded is logged and not stored.
    pub async fn set_typed<T: Serialize + ?Sized>(&self, key: &str, value: &T, ttl: Duration) {
        match serde_json::to_value(value) {
            Ok(value) => self.set(key, value, ttl).await,
            Err(e) => warn!(key = %key, error = %e, "failed to encode cache value"),
        }
    }
}

/// Cache entry holding one JSON value.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// Cached value.
    pub value: Value,
    /// When the entry expires (monotonic clock). `None` when the TTL is too
    /// large to represent, in which case the entry never expires.
    expires_at: Option<Instant>,
}

impl CacheEntry {
    /// Creates a new cache entry with the given TTL.
    pub fn new(value: Value, ttl: Duration) -> Self {
        Self {
            value,
            expires_at: Instant::now().checked_add(ttl),
        }
    }

    /// Returns true if the entry has expired.
    pub fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|at| Instant::now() >= at)
    }
}

/// In-process [`CacheStore`].
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl MemoryCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<String, CacheEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns a valid entry's value. An expired entry is dropped.
    pub fn get_valid(&self, key: &str) -> Option<Value> {
        let mut entries = self.entries();
        if entries.get(key)?.is_expired() {
            trace!(key = %key, "dropping expired cache entry");
            entries.remove(key);
            return None;
        }
        entries.get(key).map(|entry| entry.value.clone())
    }

    /// Inserts or replaces an entry, evicting whatever has expired.
    pub fn insert(&self, key: impl Into<String>, value: Value, ttl: Duration) {
        let key = key.into();
        debug!(key = %key, ttl_secs = ttl.as_secs(), "storing cache entry");
        let mut entries = self.entries();
        evict_expired(&mut entries);
        entries.insert(key, CacheEntry::new(value, ttl));
    }

    /// Removes an entry, returning it.
    pub fn take(&self, key: &str) -> Option<CacheEntry> {
        let entry = self.entries().remove(key);
        if entry.is_some() {
            debug!(key = %key, "removed cache entry");
        }
        entry
    }

    /// Returns the number of entries, expired ones included.
    pub fn len(&self) -> usize {
        self.entries().len()
    }

    /// Returns true if the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }
}

fn evict_expired(entries: &mut HashMap<String, CacheEntry>) {
    let before = entries.len();
    entries.retain(|key, entry| {
        let keep = !entry.is_expired();
        if !keep {
            trace!(key = %key, "evicting expired cache entry");
        }
        keep
    });
    let evicted = before - entries.len();
    if evicted > 0 {
        debug!(evicted, "evicted expired cache entries");
    }
}

impl CacheStore for MemoryCache {
    fn get<'a>(&'a self, key: &'a str) -> BoxFuture<'a, Option<Value>> {
        let value = self.get_valid(key);
        Box::pin(async move { value })
    }

    fn set<'a>(&'a self, key: &'a str, value: Value, ttl: Duration) -> BoxFuture<'a, ()> {
        self.insert(key, value, ttl);
        Box::pin(async {})
    }

    fn remove<'a>(&'a self, key: &'a str) -> BoxFuture<'a, ()> {
        self.take(key);
        Box::pin(async {})
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn cache_entry_expiration() {
        let entry = CacheEntry::new(json!([1, 2]), Duration::from_millis(50));

        assert!(!entry.is_expired());
        thread::sleep(Duration::from_millis(60));
        assert!(entry.is_expired());
    }

    #[test]
    fn oversized_ttl_never_expires() {
        let entry = CacheEntry::new(json!(1), Duration::MAX);
        assert!(!entry.is_expired());

        let cache = MemoryCache::new();
        cache.insert("forever", json!(1), Duration::from_secs(u64::MAX));
        assert_eq!(cache.get_valid("forever"), Some(json!(1)));
    }

    #[test]
    fn insert_and_get() {
        let cache = MemoryCache::new();
        cache.insert("events:a", json!({"n": 1}), Duration::from_secs(60));

        assert_eq!(cache.get_valid("events:a"), Some(json!({"n": 1})));
        assert!(cache.get_valid("events:b").is_none());
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn expired_entry_is_dropped_on_read() {
        let cache = MemoryCache::new();
        cache.insert("short", json!(1), Duration::from_millis(50));
        cache.insert("long", json!(2), Duration::from_secs(60));

        thread::sleep(Duration::from_millis(60));

        assert_eq!(cache.len(), 2);
        assert!(cache.get_valid("short").is_none());
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get_valid("long"), Some(json!(2)));
    }

    #[test]
    fn insert_evicts_expired_entries() {
        let cache = MemoryCache::new();
        cache.insert("a", json!(1), Duration::from_millis(50));
        cache.insert("b", json!(2), Duration::from_millis(50));

        thread::sleep(Duration::from_millis(60));
        cache.insert("c", json!(3), Duration::from_secs(60));

        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get_valid("c"), Some(json!(3)));
    }

    #[test]
    fn last_writer_wins() {
        let cache = MemoryCache::new();
        cache.insert("k", json!("first"), Duration::from_secs(60));
        cache.insert("k", json!("second"), Duration::from_secs(60));
        assert_eq!(cache.get_valid("k"), Some(json!("second")));
    }

    #[test]
    fn take_removes_entries() {
        let cache = MemoryCache::new();
        cache.insert("a", json!(1), Duration::from_secs(60));
        cache.insert("b", json!(2), Duration::from_secs(60));

        assert!(cache.take("a").is_some());
        assert!(cache.take("a").is_none());
        assert!(cache.take("b").is_some());
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn typed_helpers_through_trait_object() {
        let store: Arc<dyn CacheStore> = Arc::new(MemoryCache::new());

        store.set_typed("nums", &vec![1u32, 2, 3], Duration::from_secs(60)).await;
        let nums: Option<Vec<u32>> = store.get_typed("nums").await.unwrap();
        assert_eq!(nums, Some(vec![1, 2, 3]));

        let missing: Option<Vec<u32>> = store.get_typed("missing").await.unwrap();
        assert!(missing.is_none());

        let wrong: Result<Option<Vec<String>>, _> = store.get_typed("nums").await;
        assert!(wrong.is_err());

        store.remove("nums").await;
        assert!(store.get("nums").await.is_none());
    }
}
