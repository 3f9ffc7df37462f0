//! Memoization of per-link average latencies
//!
//! The graph consults an [`AverageCache`] before averaging a link's samples
//! and invalidates the entry whenever a new sample lands on that link.
//! Correctness only depends on that invalidation; expiry is an optimization.

use crate::link::LinkKey;
use crate::Latency;
use dashmap::DashMap;
use std::time::{Duration, Instant};

/// Storage for computed link averages.
///
/// Methods take `&self` so queries can populate the cache through a shared
/// reference to the graph.
pub trait AverageCache: Send + Sync {
    /// Cached average for `key`, if present and still valid
    fn get(&self, key: &LinkKey) -> Option<Latency>;

    /// Store the average for `key`
    fn insert(&self, key: LinkKey, average: Latency);

    /// Drop the entry for `key`
    fn invalidate(&self, key: &LinkKey);

    /// Drop every entry
    fn clear(&self);

    /// Number of stored entries
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, Copy)]
struct CachedAverage {
    value: Latency,
    last_access: Instant,
}

/// Concurrent map of link averages with optional expire-after-access.
pub struct MemoCache {
    entries: DashMap<LinkKey, CachedAverage>,
    ttl: Option<Duration>,
}

impl MemoCache {
    /// Cache whose entries live until invalidated
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
            ttl: None,
        }
    }

    /// Cache whose entries also expire `ttl` after their last read
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl: Some(ttl),
        }
    }

    pub fn ttl(&self) -> Option<Duration> {
        self.ttl
    }

    /// Remove `key` only if it was already stale at `now`, so a value
    /// inserted after the staleness check survives.
    fn evict_expired(&self, key: &LinkKey, now: Instant) {
        if let Some(ttl) = self.ttl {
            self.entries
                .remove_if(key, |_, entry| now.duration_since(entry.last_access) >= ttl);
        }
    }
}

impl Default for MemoCache {
    fn default() -> Self {
        Self::new()
    }
}

impl AverageCache for MemoCache {
    fn get(&self, key: &LinkKey) -> Option<Latency> {
        let now = Instant::now();
        {
            let mut entry = self.entries.get_mut(key)?;
            let fresh = self
                .ttl
                .map_or(true, |ttl| now.duration_since(entry.last_access) < ttl);
            if fresh {
                entry.last_access = now;
                return Some(entry.value);
            }
        }
        // Guard released above; removing while holding it would deadlock.
        self.evict_expired(key, now);
        None
    }

    fn insert(&self, key: LinkKey, average: Latency) {
        self.entries.insert(
            key,
            CachedAverage {
                value: average,
                last_access: Instant::now(),
            },
        );
    }

    fn invalidate(&self, key: &LinkKey) {
        self.entries.remove(key);
    }

    fn clear(&self) {
        self.entries.clear();
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Cache that never stores anything; every lookup recomputes.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopCache;

impl AverageCache for NoopCache {
    fn get(&self, _key: &LinkKey) -> Option<Latency> {
        None
    }

    fn insert(&self, _key: LinkKey, _average: Latency) {}

    fn invalidate(&self, _key: &LinkKey) {}

    fn clear(&self) {}

    fn len(&self) -> usize {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ServiceId;

    fn key(from: &str, to: &str) -> LinkKey {
        LinkKey::new(ServiceId::new(from), ServiceId::new(to))
    }

    #[test]
    fn test_insert_get_invalidate() {
        let cache = MemoCache::new();
        assert!(cache.is_empty());

        cache.insert(key("A", "B"), 5);
        assert_eq!(cache.get(&key("A", "B")), Some(5));
        assert_eq!(cache.get(&key("B", "A")), None);
        assert_eq!(cache.len(), 1);

        cache.invalidate(&key("A", "B"));
        assert_eq!(cache.get(&key("A", "B")), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_entries_expire_after_ttl() {
        let cache = MemoCache::with_ttl(Duration::ZERO);
        cache.insert(key("A", "B"), 5);
        assert_eq!(cache.get(&key("A", "B")), None);
        assert_eq!(cache.len(), 0);
    }

    #[test]
    fn test_long_ttl_keeps_entries() {
        let cache = MemoCache::with_ttl(Duration::from_secs(3600));
        cache.insert(key("A", "B"), 5);
        assert_eq!(cache.get(&key("A", "B")), Some(5));
        assert_eq!(cache.ttl(), Some(Duration::from_secs(3600)));
    }

    #[test]
    fn test_eviction_spares_entries_written_after_check() {
        let cache = MemoCache::with_ttl(Duration::from_millis(1));
        let checked_at = Instant::now();
        std::thread::sleep(Duration::from_millis(2));

        cache.insert(key("A", "B"), 9);
        cache.evict_expired(&key("A", "B"), checked_at);
        assert_eq!(cache.len(), 1);

        cache.evict_expired(&key("A", "B"), Instant::now() + Duration::from_millis(5));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_clear() {
        let cache = MemoCache::new();
        cache.insert(key("A", "B"), 1);
        cache.insert(key("B", "C"), 2);
        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_noop_cache_never_stores() {
        let cache = NoopCache;
        cache.insert(key("A", "B"), 5);
        assert_eq!(cache.get(&key("A", "B")), None);
        assert!(cache.is_empty());
    }
}
