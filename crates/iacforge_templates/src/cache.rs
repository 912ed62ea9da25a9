//! Bounded, time-expiring cache for parsed templates.
//!
//! The cache knows nothing about formats or resources. Entries expire once
//! their age exceeds the configured TTL and are removed lazily on the next
//! lookup. When a new key would push the cache past its capacity, the entry
//! with the oldest creation time is evicted first.

use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use parking_lot::RwLock;
use tracing::debug;

/// A cached value together with its bookkeeping.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    value: V,
    created_at: Instant,
    size_hint: usize,
    sequence: u64,
}

impl<V> CacheEntry<V> {
    pub fn value(&self) -> &V {
        &self.value
    }

    pub fn into_value(self) -> V {
        self.value
    }

    pub fn created_at(&self) -> Instant {
        self.created_at
    }

    /// Size of the raw template source in bytes.
    pub fn size_hint(&self) -> usize {
        self.size_hint
    }

    pub fn age(&self) -> Duration {
        self.created_at.elapsed()
    }

    pub fn is_expired(&self, ttl: Duration) -> bool {
        self.age() > ttl
    }

    fn order_key(&self) -> (Instant, u64) {
        (self.created_at, self.sequence)
    }
}

/// Snapshot of cache occupancy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub entries: usize,
    pub capacity: usize,
    pub total_size: usize,
}

/// Thread-safe template cache guarded by a reader/writer lock.
pub struct TemplateCache<K, V> {
    entries: RwLock<HashMap<K, CacheEntry<V>>>,
    capacity: usize,
    ttl: Duration,
    sequence: AtomicU64,
}

impl<K, V> TemplateCache<K, V>
where
    K: Eq + Hash + Clone + Debug,
    V: Clone,
{
    /// Create an empty cache. A capacity of zero is treated as one.
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            capacity: capacity.max(1),
            ttl,
            sequence: AtomicU64::new(0),
        }
    }

    /// Look up a fresh entry.
    ///
    /// An expired entry is removed and reported as a miss. The common path
    /// only takes the shared lock; the exclusive lock is taken solely to
    /// drop an expired entry.
    pub fn get(&self, key: &K) -> Option<CacheEntry<V>> {
        {
            let entries = self.entries.read();
            match entries.get(key) {
                Some(entry) if !entry.is_expired(self.ttl) => return Some(entry.clone()),
                Some(_) => {}
                None => return None,
            }
        }

        let mut entries = self.entries.write();
        // Another writer may have refreshed the entry since the read lock was released.
        if let Some(entry) = entries.get(key) {
            if !entry.is_expired(self.ttl) {
                return Some(entry.clone());
            }
            entries.remove(key);
            debug!("Evicted expired cache entry {:?}", key);
        }
        None
    }

    /// Insert or overwrite an entry.
    pub fn set(&self, key: K, value: V, size_hint: usize) {
        let entry = CacheEntry {
            value,
            created_at: Instant::now(),
            size_hint,
            sequence: self.sequence.fetch_add(1, Ordering::Relaxed),
        };

        let mut entries = self.entries.write();
        if !entries.contains_key(&key) && entries.len() >= self.capacity {
            Self::evict_oldest(&mut entries);
        }
        entries.insert(key, entry);
    }

    /// Drop every entry.
    pub fn clear(&self) {
        let mut entries = self.entries.write();
        let dropped = entries.len();
        entries.clear();
        debug!("Cleared {} cache entries", dropped);
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Whether the key is present, fresh or not.
    pub fn contains(&self, key: &K) -> bool {
        self.entries.read().contains_key(key)
    }

    pub fn stats(&self) -> CacheStats {
        let entries = self.entries.read();
        CacheStats {
            entries: entries.len(),
            capacity: self.capacity,
            total_size: entries.values().map(|e| e.size_hint).sum(),
        }
    }

    fn evict_oldest(entries: &mut HashMap<K, CacheEntry<V>>) {
        let oldest = entries
            .iter()
            .min_by_key(|(_, entry)| entry.order_key())
            .map(|(key, _)| key.clone());

        if let Some(key) = oldest {
            entries.remove(&key);
            debug!("Evicted oldest cache entry {:?}", key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    fn cache(capacity: usize) -> TemplateCache<String, String> {
        TemplateCache::new(capacity, Duration::from_secs(60))
    }

    #[test]
    fn test_get_returns_inserted_entry() {
        let cache = cache(4);
        cache.set("a".into(), "alpha".into(), 5);

        let entry = cache.get(&"a".to_string()).unwrap();
        assert_eq!(entry.value(), "alpha");
        assert_eq!(entry.size_hint(), 5);
        assert!(cache.get(&"b".to_string()).is_none());
    }

    #[test]
    fn test_capacity_evicts_oldest() {
        let cache = cache(3);
        for key in ["first", "second", "third", "fourth"] {
            cache.set(key.to_string(), key.to_uppercase(), key.len());
        }

        assert_eq!(cache.len(), 3);
        assert!(!cache.contains(&"first".to_string()));
        assert!(cache.contains(&"second".to_string()));
        assert!(cache.contains(&"fourth".to_string()));
    }

    #[test]
    fn test_overwrite_at_capacity_keeps_other_entries() {
        let cache = cache(2);
        cache.set("a".into(), "1".into(), 1);
        cache.set("b".into(), "2".into(), 1);
        cache.set("a".into(), "3".into(), 1);

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get(&"a".to_string()).unwrap().into_value(), "3");
        assert!(cache.contains(&"b".to_string()));
    }

    #[test]
    fn test_overwritten_entry_becomes_newest() {
        let cache = cache(2);
        cache.set("a".into(), "1".into(), 1);
        cache.set("b".into(), "2".into(), 1);
        cache.set("a".into(), "3".into(), 1);
        cache.set("c".into(), "4".into(), 1);

        assert!(!cache.contains(&"b".to_string()));
        assert!(cache.contains(&"a".to_string()));
        assert!(cache.contains(&"c".to_string()));
    }

    #[test]
    fn test_expired_entry_is_removed_on_get() {
        let cache: TemplateCache<String, String> =
            TemplateCache::new(4, Duration::from_millis(20));
        cache.set("a".into(), "alpha".into(), 5);
        thread::sleep(Duration::from_millis(50));

        assert!(cache.contains(&"a".to_string()));
        assert!(cache.get(&"a".to_string()).is_none());
        assert!(!cache.contains(&"a".to_string()));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_clear() {
        let cache = cache(4);
        cache.set("a".into(), "alpha".into(), 5);
        cache.set("b".into(), "beta".into(), 4);
        cache.clear();

        assert!(cache.is_empty());
        assert!(cache.get(&"a".to_string()).is_none());
    }

    #[test]
    fn test_zero_capacity_holds_one_entry() {
        let cache = cache(0);
        cache.set("a".into(), "1".into(), 1);
        cache.set("b".into(), "2".into(), 1);

        assert_eq!(cache.capacity(), 1);
        assert_eq!(cache.len(), 1);
        assert!(cache.contains(&"b".to_string()));
    }

    #[test]
    fn test_stats() {
        let cache = cache(10);
        cache.set("a".into(), "alpha".into(), 120);
        cache.set("b".into(), "beta".into(), 80);

        assert_eq!(
            cache.stats(),
            CacheStats {
                entries: 2,
                capacity: 10,
                total_size: 200,
            }
        );
    }

    #[test]
    fn test_concurrent_access_respects_capacity() {
        let cache = Arc::new(cache(16));
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let cache = Arc::clone(&cache);
                thread::spawn(move || {
                    for i in 0..50 {
                        let key = format!("{}-{}", t, i);
                        cache.set(key.clone(), key.clone(), 1);
                        let _ = cache.get(&key);
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(cache.len(), 16);
    }
}
