//! Segment cache.
//!
//! Bounded LRU from full segment name to the signed Data, serving
//! retrieval Interests for already-produced results. Locking lives with
//! the adapter, which shares one mutex between this cache and the
//! active-query registry.

use std::num::NonZeroUsize;
use std::sync::Arc;

use lru::LruCache;

use stratus_ndn::{Data, Name};

/// Default capacity, in cached segments.
pub const DEFAULT_CACHE_CAPACITY: usize = 250_000;

pub struct SegmentCache {
    entries: LruCache<Name, Arc<Data>>,
    hits: u64,
    misses: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
    pub capacity: usize,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

impl SegmentCache {
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: LruCache::new(capacity),
            hits: 0,
            misses: 0,
        }
    }

    /// Store a segment under its own name, evicting the least recently
    /// used entry when full.
    pub fn insert(&mut self, data: Arc<Data>) {
        self.entries.put(data.name().clone(), data);
    }

    /// Look a segment up and mark it most recently used.
    pub fn find(&mut self, name: &Name) -> Option<Arc<Data>> {
        match self.entries.get(name) {
            Some(data) => {
                self.hits += 1;
                Some(Arc::clone(data))
            }
            None => {
                self.misses += 1;
                None
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits,
            misses: self.misses,
            entries: self.entries.len(),
            capacity: self.entries.cap().get(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segment(uri: &str) -> Arc<Data> {
        Arc::new(Data::new(Name::from_uri(uri).unwrap()))
    }

    #[test]
    fn test_find_returns_inserted_segment() {
        let mut cache = SegmentCache::new(4);
        let data = segment("/catalog/lap/query-results/a/0");
        cache.insert(Arc::clone(&data));
        assert_eq!(cache.find(data.name()), Some(data));
    }

    #[test]
    fn test_unknown_name_is_a_miss() {
        let mut cache = SegmentCache::new(4);
        assert_eq!(cache.find(&Name::from_uri("/nope").unwrap()), None);
        let stats = cache.stats();
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.hits, 0);
    }

    #[test]
    fn test_eviction_is_least_recently_used() {
        let mut cache = SegmentCache::new(2);
        let first = segment("/r/0");
        let second = segment("/r/1");
        let third = segment("/r/2");

        cache.insert(Arc::clone(&first));
        cache.insert(Arc::clone(&second));
        // Touch the older entry so the newer one becomes the victim.
        assert!(cache.find(first.name()).is_some());
        cache.insert(third);

        assert!(cache.find(first.name()).is_some());
        assert!(cache.find(second.name()).is_none());
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_reinsert_replaces_by_name() {
        let mut cache = SegmentCache::new(2);
        let name = Name::from_uri("/r/0").unwrap();
        let mut replacement = Data::new(name.clone());
        replacement.set_content(b"new".to_vec());

        cache.insert(Arc::new(Data::new(name.clone())));
        cache.insert(Arc::new(replacement.clone()));

        assert_eq!(cache.len(), 1);
        assert_eq!(cache.find(&name).unwrap().content(), b"new");
    }

    #[test]
    fn test_hit_rate() {
        let mut cache = SegmentCache::new(2);
        let data = segment("/r/0");
        cache.insert(Arc::clone(&data));
        cache.find(data.name());
        cache.find(&Name::from_uri("/r/9").unwrap());
        assert!((cache.stats().hit_rate() - 0.5).abs() < f64::EPSILON);
    }
}
