//! Bounded, time-expiring store for materialized query results

use crate::key::StatementKey;
use crate::snapshot::ResultSnapshot;
use crate::stats::CacheStats;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Configuration for the query cache.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Maximum number of cached results.
    pub capacity: usize,
    /// Maximum age of a cached result before it counts as a miss.
    pub ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: 1000,
            ttl: Duration::from_secs(10 * 60),
        }
    }
}

impl CacheConfig {
    /// Create a config with the given capacity and TTL.
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        Self {
            capacity: capacity.max(1),
            ttl,
        }
    }

    /// Set the maximum entry count.
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity.max(1);
        self
    }

    /// Set the maximum entry age.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }
}

struct Entry {
    snapshot: Arc<ResultSnapshot>,
    inserted_at: Instant,
    /// Recency tick; higher means used more recently.
    last_used: u64,
}

struct Inner {
    map: HashMap<StatementKey, Entry>,
    tick: u64,
}

/// A bounded, time-expiring map from statement keys to result snapshots.
///
/// All operations are internally synchronized; `get`, `put` and
/// `invalidate_all` may be called concurrently from any number of
/// statements sharing the store. Expired entries are treated as misses
/// and removed lazily on access; when an insert would exceed capacity the
/// least recently used entry is evicted first.
pub struct QueryCache {
    config: CacheConfig,
    inner: RwLock<Inner>,
    stats: CacheStats,
}

impl QueryCache {
    /// Create a cache with the given configuration.
    pub fn new(config: CacheConfig) -> Self {
        Self {
            inner: RwLock::new(Inner {
                map: HashMap::with_capacity(config.capacity.min(1024)),
                tick: 0,
            }),
            config,
            stats: CacheStats::new(),
        }
    }

    /// Look up a snapshot, refreshing its recency on a hit.
    ///
    /// An entry older than the TTL is removed and reported as a miss even
    /// if capacity is not exhausted.
    pub fn get(&self, key: &StatementKey) -> Option<Arc<ResultSnapshot>> {
        let mut inner = self.inner.write();
        let Inner { map, tick } = &mut *inner;

        let expired = match map.get(key) {
            Some(entry) => entry.inserted_at.elapsed() > self.config.ttl,
            None => {
                self.stats.record_miss();
                return None;
            }
        };

        if expired {
            map.remove(key);
            self.stats.record_miss();
            tracing::trace!("cache entry expired");
            return None;
        }

        *tick += 1;
        let snapshot = map.get_mut(key).map(|entry| {
            entry.last_used = *tick;
            Arc::clone(&entry.snapshot)
        });
        match &snapshot {
            Some(_) => self.stats.record_hit(),
            None => self.stats.record_miss(),
        }
        snapshot
    }

    /// Insert a snapshot, evicting the least recently used entry if the
    /// cache is full.
    pub fn put(&self, key: StatementKey, snapshot: Arc<ResultSnapshot>) {
        let mut inner = self.inner.write();

        if !inner.map.contains_key(&key) && inner.map.len() >= self.config.capacity {
            // Scan for the LRU victim. Linear, but capacity is small
            // (hundreds to low thousands of entries).
            if let Some(victim) = inner
                .map
                .iter()
                .min_by_key(|(_, e)| e.last_used)
                .map(|(k, _)| k.clone())
            {
                inner.map.remove(&victim);
                self.stats.record_eviction();
                tracing::trace!("evicted least recently used entry");
            }
        }

        inner.tick += 1;
        let tick = inner.tick;
        inner.map.insert(
            key,
            Entry {
                snapshot,
                inserted_at: Instant::now(),
                last_used: tick,
            },
        );
        self.stats.record_insert();
    }

    /// Drop every entry, regardless of age.
    pub fn invalidate_all(&self) {
        let mut inner = self.inner.write();
        let dropped = inner.map.len();
        inner.map.clear();
        self.stats.record_invalidation();
        tracing::debug!(dropped, "cache invalidated");
    }

    /// Number of entries currently held (expired entries included until
    /// they are lazily removed).
    pub fn len(&self) -> usize {
        self.inner.read().map.len()
    }

    /// True if the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.inner.read().map.is_empty()
    }

    /// Point-in-time statistics.
    pub fn stats(&self) -> CacheStats {
        self.stats.clone()
    }

    /// The configuration this cache was created with.
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use recall_core::{ColumnDescriptor, Value};

    fn key(n: i64) -> StatementKey {
        StatementKey::new("select * from t where id = ?", &[Value::Int64(n)])
    }

    fn snapshot(n: i64) -> Arc<ResultSnapshot> {
        Arc::new(ResultSnapshot::from_rows(
            vec![ColumnDescriptor::named("id", "INTEGER")],
            vec![vec![Value::Int64(n)]],
        ))
    }

    #[test]
    fn get_returns_what_was_put() {
        let cache = QueryCache::new(CacheConfig::default());
        cache.put(key(1), snapshot(1));

        let hit = cache.get(&key(1)).unwrap();
        assert_eq!(hit.rows()[0][0], Value::Int64(1));
        assert!(cache.get(&key(2)).is_none());
    }

    #[test]
    fn capacity_is_never_exceeded() {
        let cache = QueryCache::new(CacheConfig::default().with_capacity(10));
        for n in 0..25 {
            cache.put(key(n), snapshot(n));
        }
        assert!(cache.len() <= 10);
        assert_eq!(cache.stats().evictions(), 15);
    }

    #[test]
    fn eviction_prefers_least_recently_used() {
        let cache = QueryCache::new(CacheConfig::default().with_capacity(2));
        cache.put(key(1), snapshot(1));
        cache.put(key(2), snapshot(2));

        // Touch key 1 so key 2 becomes the LRU victim.
        assert!(cache.get(&key(1)).is_some());
        cache.put(key(3), snapshot(3));

        assert!(cache.get(&key(1)).is_some());
        assert!(cache.get(&key(2)).is_none());
        assert!(cache.get(&key(3)).is_some());
    }

    #[test]
    fn reinserting_an_existing_key_does_not_evict() {
        let cache = QueryCache::new(CacheConfig::default().with_capacity(2));
        cache.put(key(1), snapshot(1));
        cache.put(key(2), snapshot(2));
        cache.put(key(1), snapshot(10));

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.stats().evictions(), 0);
        assert_eq!(cache.get(&key(1)).unwrap().rows()[0][0], Value::Int64(10));
    }

    #[test]
    fn expired_entries_are_misses() {
        let cache = QueryCache::new(CacheConfig::default().with_ttl(Duration::from_millis(20)));
        cache.put(key(1), snapshot(1));
        assert!(cache.get(&key(1)).is_some());

        std::thread::sleep(Duration::from_millis(40));
        assert!(cache.get(&key(1)).is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn invalidate_all_drops_everything() {
        let cache = QueryCache::new(CacheConfig::default());
        for n in 0..5 {
            cache.put(key(n), snapshot(n));
        }
        cache.invalidate_all();

        assert!(cache.is_empty());
        assert!(cache.get(&key(0)).is_none());
        assert_eq!(cache.stats().invalidations(), 1);
    }

    #[test]
    fn concurrent_put_and_invalidate_never_corrupt() {
        let cache = Arc::new(QueryCache::new(CacheConfig::default().with_capacity(64)));
        let mut handles = Vec::new();

        for t in 0..4 {
            let cache = Arc::clone(&cache);
            handles.push(std::thread::spawn(move || {
                for n in 0..200 {
                    let id = t * 1000 + n;
                    cache.put(key(id), snapshot(id));
                    if let Some(hit) = cache.get(&key(id)) {
                        // A hit must always be a complete snapshot.
                        assert_eq!(hit.rows()[0][0], Value::Int64(id));
                    }
                    if n % 50 == 0 {
                        cache.invalidate_all();
                    }
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }
        assert!(cache.len() <= 64);
    }
}
