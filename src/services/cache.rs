//! Time-boxed in-memory cache for upstream payloads.
//!
//! Entries are never evicted proactively; a stale entry is simply ignored on
//! read and overwritten by the next successful fetch. Backed by `DashMap`, so
//! lookups never block behind an in-flight upstream call.

use dashmap::DashMap;
use std::hash::Hash;
use std::time::{Duration, Instant};

/// A cached payload with the instant it was fetched.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    pub payload: V,
    pub fetched_at: Instant,
}

impl<V> CacheEntry<V> {
    pub fn is_fresh(&self, ttl: Duration) -> bool {
        self.fetched_at.elapsed() < ttl
    }
}

/// Keyed cache where every entry shares one TTL.
#[derive(Debug)]
pub struct TtlCache<K: Eq + Hash, V> {
    ttl: Duration,
    entries: DashMap<K, CacheEntry<V>>,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: DashMap::new(),
        }
    }

    /// Return a clone of the payload if present and younger than the TTL.
    pub fn get_fresh(&self, key: &K) -> Option<V> {
        self.entries
            .get(key)
            .filter(|entry| entry.is_fresh(self.ttl))
            .map(|entry| entry.payload.clone())
    }

    /// Insert or overwrite the entry for `key`, stamped with the current instant.
    pub fn insert(&self, key: K, payload: V) {
        self.entries.insert(
            key,
            CacheEntry {
                payload,
                fetched_at: Instant::now(),
            },
        );
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.entries.len()
    }
}
