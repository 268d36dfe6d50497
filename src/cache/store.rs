//! In-process cache backend.

use std::{sync::Mutex, time::Duration};

use async_trait::async_trait;
use lru::LruCache;
use serde_json::Value as JsonValue;
use tokio::time::Instant;

use super::backend::{CacheBackend, CacheError};
use super::config::CacheConfig;
use crate::util::lock::mutex_lock;

const SOURCE: &str = "cache::store";

struct CacheEntry {
    value: JsonValue,
    expires_at: Instant,
}

/// LRU map with per-entry expiry.
///
/// Expired entries are dropped lazily on read. Capacity evictions discard the
/// least recently used key regardless of its remaining lifetime.
pub struct MemoryCache {
    entries: Mutex<LruCache<String, CacheEntry>>,
}

impl MemoryCache {
    pub fn new(config: &CacheConfig) -> Self {
        Self {
            entries: Mutex::new(LruCache::new(config.capacity_non_zero())),
        }
    }

    /// Number of stored entries, expired ones included until they are read.
    pub fn len(&self) -> usize {
        mutex_lock(&self.entries, SOURCE, "len").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::new(&CacheConfig::default())
    }
}

#[async_trait]
impl CacheBackend for MemoryCache {
    async fn get(&self, key: &str) -> Result<Option<JsonValue>, CacheError> {
        let mut entries = mutex_lock(&self.entries, SOURCE, "get");
        let expired = match entries.get(key) {
            None => return Ok(None),
            Some(entry) if entry.expires_at > Instant::now() => {
                return Ok(Some(entry.value.clone()));
            }
            Some(_) => true,
        };
        if expired {
            entries.pop(key);
        }
        Ok(None)
    }

    async fn set(&self, key: &str, value: JsonValue, ttl: Duration) -> Result<(), CacheError> {
        let entry = CacheEntry {
            value,
            expires_at: Instant::now() + ttl,
        };
        mutex_lock(&self.entries, SOURCE, "set").put(key.to_string(), entry);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool, CacheError> {
        Ok(mutex_lock(&self.entries, SOURCE, "delete")
            .pop(key)
            .is_some())
    }

    async fn clear(&self) -> Result<(), CacheError> {
        mutex_lock(&self.entries, SOURCE, "clear").clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[tokio::test(start_paused = true)]
    async fn entries_expire_after_ttl() {
        let cache = MemoryCache::default();
        cache
            .set("k", json!([1, 2]), Duration::from_secs(60))
            .await
            .unwrap();

        tokio::time::advance(Duration::from_secs(59)).await;
        assert_eq!(cache.get("k").await.unwrap(), Some(json!([1, 2])));

        tokio::time::advance(Duration::from_secs(1)).await;
        assert_eq!(cache.get("k").await.unwrap(), None);
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn least_recently_used_key_is_evicted() {
        let cache = MemoryCache::new(&CacheConfig {
            capacity: 2,
            ..Default::default()
        });
        let ttl = Duration::from_secs(60);
        cache.set("a", json!(1), ttl).await.unwrap();
        cache.set("b", json!(2), ttl).await.unwrap();
        assert!(cache.get("a").await.unwrap().is_some());
        cache.set("c", json!(3), ttl).await.unwrap();

        assert!(cache.get("b").await.unwrap().is_none());
        assert_eq!(cache.get("a").await.unwrap(), Some(json!(1)));
        assert_eq!(cache.get("c").await.unwrap(), Some(json!(3)));
    }

    #[tokio::test]
    async fn delete_and_clear_remove_entries() {
        let cache = MemoryCache::default();
        let ttl = Duration::from_secs(5);
        cache.set("a", json!("x"), ttl).await.unwrap();
        cache.set("b", json!("y"), ttl).await.unwrap();

        assert!(cache.delete("a").await.unwrap());
        assert!(!cache.delete("a").await.unwrap());
        cache.clear().await.unwrap();
        assert!(cache.is_empty());
    }
}
