use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::{Mutex, MutexGuard};

use crate::normalize::NormalizationRecord;

/// Thread-safe LRU cache of normalization records
///
/// Keyed by the id sent to the normalizer. Only successful lookups are
/// stored, so ids from a failed batch are retried on the next run.
pub struct NormalizationCache {
    cache: Mutex<LruCache<String, NormalizationRecord>>,
}

impl NormalizationCache {
    /// Create a new cache holding at most `capacity` records (minimum 1)
    pub fn new(capacity: usize) -> Self {
        let cap = NonZeroUsize::new(capacity.max(1)).unwrap_or(NonZeroUsize::MIN);

        Self {
            cache: Mutex::new(LruCache::new(cap)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, LruCache<String, NormalizationRecord>> {
        self.cache.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Get a cached record for an id
    pub fn get(&self, id: &str) -> Option<NormalizationRecord> {
        self.lock().get(id).cloned()
    }

    /// Store a record for an id
    pub fn put(&self, id: String, record: NormalizationRecord) {
        self.lock().put(id, record);
    }

    /// Get the current number of cached entries
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Check if the cache is empty
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Clear all entries from the cache
    pub fn clear(&self) {
        self.lock().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str) -> NormalizationRecord {
        NormalizationRecord::new(id)
    }

    #[test]
    fn test_cache_put_and_get() {
        let cache = NormalizationCache::new(10);
        cache.put("UniProtKB:P1-2".to_string(), record("UniProtKB:P1"));

        let retrieved = cache.get("UniProtKB:P1-2");
        assert_eq!(retrieved.unwrap().canonical_id, "UniProtKB:P1");
    }

    #[test]
    fn test_cache_miss() {
        let cache = NormalizationCache::new(10);
        assert!(cache.get("MONDO:1").is_none());
    }

    #[test]
    fn test_cache_eviction() {
        let cache = NormalizationCache::new(2);

        cache.put("A:1".to_string(), record("A:1"));
        cache.put("A:2".to_string(), record("A:2"));
        // Third entry evicts A:1 (LRU)
        cache.put("A:3".to_string(), record("A:3"));

        assert!(cache.get("A:1").is_none());
        assert!(cache.get("A:2").is_some());
        assert!(cache.get("A:3").is_some());
    }

    #[test]
    fn test_cache_get_updates_lru() {
        let cache = NormalizationCache::new(2);

        cache.put("A:1".to_string(), record("A:1"));
        cache.put("A:2".to_string(), record("A:2"));
        let _ = cache.get("A:1");
        cache.put("A:3".to_string(), record("A:3"));

        assert!(cache.get("A:1").is_some());
        assert!(cache.get("A:2").is_none());
    }

    #[test]
    fn test_cache_len_and_clear() {
        let cache = NormalizationCache::new(10);
        assert!(cache.is_empty());

        cache.put("A:1".to_string(), record("A:1"));
        cache.put("A:2".to_string(), record("A:2"));
        assert_eq!(cache.len(), 2);

        cache.clear();
        assert!(cache.is_empty());
        assert!(cache.get("A:1").is_none());
    }

    #[test]
    fn test_cache_capacity_zero_becomes_one() {
        let cache = NormalizationCache::new(0);
        cache.put("A:1".to_string(), record("A:1"));
        cache.put("A:2".to_string(), record("A:2"));
        assert_eq!(cache.len(), 1);
        assert!(cache.get("A:2").is_some());
    }
}
