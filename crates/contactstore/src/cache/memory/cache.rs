//! In-memory cache implementation with LRU eviction.
//!
//! Provides a thread-safe in-memory cache with TTL support using
//! tokio synchronization primitives and LRU eviction policy.

use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use lru::LruCache;
use tokio::sync::RwLock;

use contactstore_core::cache::{Cache, Result};

/// A single cache entry with optional expiration.
#[derive(Debug, Clone)]
struct CacheEntry {
    value: Vec<u8>,
    expires_at: Option<Instant>,
}

impl CacheEntry {
    fn new(value: Vec<u8>, ttl: Option<Duration>) -> Self {
        let expires_at = ttl.map(|d| Instant::now() + d);
        Self { value, expires_at }
    }

    fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|exp| Instant::now() >= exp)
    }
}

/// In-memory cache implementation with LRU eviction.
///
/// Thread-safe cache using `Arc<RwLock<LruCache>>` for concurrent access.
/// Expired entries are dropped lazily when they are next read. Once
/// `max_entries` is reached the least recently used entry is evicted.
#[derive(Debug, Clone)]
pub struct MemoryCache {
    store: Arc<RwLock<LruCache<String, CacheEntry>>>,
}

impl MemoryCache {
    /// Creates a new in-memory cache with LRU eviction.
    ///
    /// A `max_entries` of 0 is treated as 1.
    pub fn new(max_entries: usize) -> Self {
        let capacity = NonZeroUsize::new(max_entries).unwrap_or(NonZeroUsize::MIN);
        Self {
            store: Arc::new(RwLock::new(LruCache::new(capacity))),
        }
    }

    /// Number of entries currently held, expired ones included.
    pub async fn len(&self) -> usize {
        self.store.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.store.read().await.is_empty()
    }
}

#[async_trait]
impl Cache for MemoryCache {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        // `LruCache::get` updates recency, so a write lock is needed.
        let mut store = self.store.write().await;

        let expired = match store.get(key) {
            Some(entry) if !entry.is_expired() => return Ok(Some(entry.value.clone())),
            Some(_) => true,
            None => false,
        };
        if expired {
            store.pop(key);
        }
        Ok(None)
    }

    async fn set(&self, key: &str, value: &[u8], ttl: Option<Duration>) -> Result<()> {
        let mut store = self.store.write().await;
        store.put(key.to_string(), CacheEntry::new(value.to_vec(), ttl));
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let mut store = self.store.write().await;
        store.pop(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contactstore_core::cache::contact_key;
    use uuid::Uuid;

    const CAPACITY: usize = 1000;

    #[tokio::test]
    async fn test_set_and_get() {
        let cache = MemoryCache::new(CAPACITY);
        let key = contact_key(Uuid::new_v4());

        cache.set(&key, b"{\"id\":1}", None).await.unwrap();
        let result = cache.get(&key).await.unwrap();

        assert_eq!(result, Some(b"{\"id\":1}".to_vec()));
    }

    #[tokio::test]
    async fn test_get_nonexistent() {
        let cache = MemoryCache::new(CAPACITY);
        let result = cache.get(&contact_key(Uuid::new_v4())).await.unwrap();

        assert_eq!(result, None);
    }

    #[tokio::test]
    async fn test_delete() {
        let cache = MemoryCache::new(CAPACITY);
        let key = contact_key(Uuid::new_v4());

        cache.set(&key, b"{}", None).await.unwrap();
        cache.delete(&key).await.unwrap();

        assert_eq!(cache.get(&key).await.unwrap(), None);

        // Deleting again is fine
        cache.delete(&key).await.unwrap();
    }

    #[tokio::test]
    async fn test_ttl_expiration_drops_entry() {
        let cache = MemoryCache::new(CAPACITY);
        let key = contact_key(Uuid::new_v4());

        let ttl = Some(Duration::from_millis(50));
        cache.set(&key, b"{}", ttl).await.unwrap();
        assert_eq!(cache.len().await, 1);

        tokio::time::sleep(Duration::from_millis(100)).await;

        assert_eq!(cache.get(&key).await.unwrap(), None);
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn test_overwrite_resets_value_and_ttl() {
        let cache = MemoryCache::new(CAPACITY);
        let key = contact_key(Uuid::new_v4());

        cache
            .set(&key, b"first", Some(Duration::from_millis(50)))
            .await
            .unwrap();
        cache.set(&key, b"second", None).await.unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;

        let result = cache.get(&key).await.unwrap();
        assert_eq!(result, Some(b"second".to_vec()));
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn test_least_recently_read_contact_is_evicted() {
        let cache = MemoryCache::new(3);
        let keys: Vec<String> = (0..4).map(|_| contact_key(Uuid::new_v4())).collect();

        for key in &keys[..3] {
            cache.set(key, key.as_bytes(), None).await.unwrap();
        }
        // Reading the oldest entry makes keys[1] the eviction candidate
        cache.get(&keys[0]).await.unwrap();
        cache.set(&keys[3], b"newest", None).await.unwrap();

        let present: Vec<bool> = {
            let mut present = Vec::new();
            for key in &keys {
                present.push(cache.get(key).await.unwrap().is_some());
            }
            present
        };
        assert_eq!(present, vec![true, false, true, true]);
    }

    #[tokio::test]
    async fn test_zero_max_entries_holds_one_entry() {
        let cache = MemoryCache::new(0);

        let first = contact_key(Uuid::new_v4());
        let second = contact_key(Uuid::new_v4());
        cache.set(&first, b"1", None).await.unwrap();
        cache.set(&second, b"2", None).await.unwrap();

        assert_eq!(cache.len().await, 1);
        assert_eq!(cache.get(&second).await.unwrap(), Some(b"2".to_vec()));
    }
}
