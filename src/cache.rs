//! A bounded expiring map over `moka::sync::Cache`.
//!
//! moka evicts past `max_capacity` and reclaims entries older than the TTL
//! during its housekeeping, whichever key they belong to. Each value also
//! carries its insertion instant so a read applies the exact `>= ttl`
//! boundary of [`is_expired`] against a caller-supplied clock. Two
//! concurrent misses on the same key may both fetch upstream and both
//! insert, the last write wins.

use moka::sync::Cache;
use std::hash::Hash;
use std::time::{Duration, Instant};

/// Entry bound when the caller does not pick one.
pub const DEFAULT_CAPACITY: u64 = 1_000;

/// True once `ttl` has elapsed since `inserted_at`.
pub fn is_expired(inserted_at: Instant, now: Instant, ttl: Duration) -> bool {
    now.saturating_duration_since(inserted_at) >= ttl
}

pub struct ExpiringCache<K, V> {
    ttl: Duration,
    entries: Cache<K, (V, Instant)>,
}

impl<K, V> ExpiringCache<K, V>
where
    K: Eq + Hash + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    pub fn new(ttl: Duration) -> Self {
        Self::with_capacity(ttl, DEFAULT_CAPACITY)
    }

    pub fn with_capacity(ttl: Duration, max_capacity: u64) -> Self {
        let entries = Cache::builder()
            .max_capacity(max_capacity)
            .time_to_live(ttl)
            .build();
        Self { ttl, entries }
    }

    pub fn get(&self, key: &K) -> Option<V> {
        self.get_at(key, Instant::now())
    }

    /// Returns a live entry, removing it instead if it has expired.
    pub fn get_at(&self, key: &K, now: Instant) -> Option<V> {
        let (value, inserted_at) = self.entries.get(key)?;
        if !is_expired(inserted_at, now, self.ttl) {
            return Some(value);
        }
        self.entries.invalidate(key);
        None
    }

    pub fn insert(&self, key: K, value: V) {
        self.insert_at(key, value, Instant::now());
    }

    pub fn insert_at(&self, key: K, value: V, now: Instant) {
        self.entries.insert(key, (value, now));
    }

    /// Number of stored entries after pending evictions are applied.
    pub fn len(&self) -> u64 {
        self.entries.run_pending_tasks();
        self.entries.entry_count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
