//! Memoization of pipeline results keyed by content hash

use std::hash::{Hash, Hasher};
use std::sync::Arc;

use ahash::{AHashMap, AHasher};
use parking_lot::RwLock;

/// Hash any value into a cache key
pub fn content_hash<T: Hash + ?Sized>(value: &T) -> u64 {
    let mut hasher = AHasher::default();
    value.hash(&mut hasher);
    hasher.finish()
}

/// Bounded cache with least-recently-used eviction
pub struct DataCache<V> {
    inner: Arc<RwLock<CacheInner<V>>>,
    /// Maximum number of entries to keep
    max_entries: usize,
}

struct CacheInner<V> {
    entries: AHashMap<u64, V>,
    /// LRU tracking, least recent first
    access_order: Vec<u64>,
}

impl<V: Clone> DataCache<V> {
    /// Create a new data cache
    pub fn new(max_entries: usize) -> Self {
        Self {
            inner: Arc::new(RwLock::new(CacheInner {
                entries: AHashMap::new(),
                access_order: Vec::new(),
            })),
            max_entries: max_entries.max(1),
        }
    }

    /// Get an entry, marking it most recently used
    pub fn get(&self, key: u64) -> Option<V> {
        let mut inner = self.inner.write();
        let value = inner.entries.get(&key).cloned()?;
        inner.touch(key);
        Some(value)
    }

    /// Put an entry, evicting the least recently used one when full
    pub fn put(&self, key: u64, value: V) {
        let mut inner = self.inner.write();

        if !inner.entries.contains_key(&key) && inner.entries.len() >= self.max_entries {
            if !inner.access_order.is_empty() {
                let evicted = inner.access_order.remove(0);
                inner.entries.remove(&evicted);
            }
        }

        inner.entries.insert(key, value);
        inner.touch(key);
    }

    /// Return the cached entry or compute, store and return it
    pub fn get_or_insert_with(&self, key: u64, compute: impl FnOnce() -> V) -> V {
        if let Some(value) = self.get(key) {
            return value;
        }
        let value = compute();
        self.put(key, value.clone());
        value
    }

    pub fn len(&self) -> usize {
        self.inner.read().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Clear the cache
    pub fn clear(&self) {
        let mut inner = self.inner.write();
        inner.entries.clear();
        inner.access_order.clear();
    }
}

impl<V> CacheInner<V> {
    fn touch(&mut self, key: u64) {
        self.access_order.retain(|&k| k != key);
        self.access_order.push(key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_is_stable_for_equal_values() {
        assert_eq!(content_hash(&("a", 1)), content_hash(&("a", 1)));
        assert_ne!(content_hash(&("a", 1)), content_hash(&("a", 2)));
    }

    #[test]
    fn test_lru_eviction() {
        let cache = DataCache::new(2);
        cache.put(1, "one");
        cache.put(2, "two");
        assert_eq!(cache.get(1), Some("one"));

        cache.put(3, "three");
        assert_eq!(cache.get(2), None);
        assert_eq!(cache.get(1), Some("one"));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_get_or_insert_computes_once() {
        let cache = DataCache::new(4);
        let mut calls = 0;
        for _ in 0..3 {
            cache.get_or_insert_with(7, || {
                calls += 1;
                42
            });
        }
        assert_eq!(calls, 1);
        cache.clear();
        assert!(cache.is_empty());
    }
}
