//! Cache Store Module
//!
//! Capacity-bounded map of lookup results with LRU eviction and TTL staleness.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;

use crate::cache::{CacheCounters, CacheEntry, CacheStats, LruTracker};

/// Result of consulting the store for a key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    /// Entry present and within its TTL
    Fresh(Option<Bytes>),
    /// Entry present but past its TTL
    Stale(Option<Bytes>),
    /// No entry for the key
    Missing,
}

// == Cache Store ==
/// Lookup results keyed by cache key.
///
/// Holds at most `capacity` entries. Both [`CacheStore::get`] and
/// [`CacheStore::put`] make the key most recently used; a `put` that would
/// exceed capacity first evicts the least recently used entry. Stale entries
/// stay resident until overwritten or evicted.
#[derive(Debug)]
pub struct CacheStore {
    entries: HashMap<String, CacheEntry>,
    lru: LruTracker,
    counters: Arc<CacheCounters>,
    capacity: usize,
    ttl: Duration,
}

impl CacheStore {
    // == Constructor ==
    /// Creates a store holding up to `capacity` entries, each fresh for `ttl`.
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        Self {
            entries: HashMap::with_capacity(capacity.min(1024)),
            lru: LruTracker::new(),
            counters: Arc::new(CacheCounters::new()),
            capacity,
            ttl,
        }
    }

    // == Get ==
    /// Looks up `key`, classifying the entry as fresh or stale.
    pub fn get(&mut self, key: &str) -> Lookup {
        let Some(entry) = self.entries.get(key) else {
            self.counters.record_miss();
            return Lookup::Missing;
        };

        let lookup = if entry.is_expired() {
            self.counters.record_stale();
            Lookup::Stale(entry.value.clone())
        } else {
            self.counters.record_hit();
            Lookup::Fresh(entry.value.clone())
        };
        self.lru.touch(key);
        lookup
    }

    // == Put ==
    /// Stores `value` for `key`, fresh for the store's TTL from now.
    ///
    /// Overwriting keeps the entry count unchanged. Inserting a new key into a
    /// full store evicts the least recently used entry first.
    pub fn put(&mut self, key: &str, value: Option<Bytes>) {
        if self.capacity == 0 {
            return;
        }

        if !self.entries.contains_key(key) {
            while self.entries.len() >= self.capacity {
                let Some(evicted) = self.lru.evict_oldest() else {
                    break;
                };
                self.entries.remove(&evicted);
                self.counters.record_eviction();
            }
        }

        self.entries
            .insert(key.to_string(), CacheEntry::new(value, self.ttl));
        self.lru.touch(key);
        debug_assert_eq!(self.lru.len(), self.entries.len());
        self.counters.set_entries(self.entries.len());
    }

    /// Returns the entry for `key` without affecting recency or stats.
    pub fn peek(&self, key: &str) -> Option<&CacheEntry> {
        self.entries.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn record_refresh_failure(&mut self) {
        self.counters.record_refresh_failure();
    }

    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        self.counters.snapshot()
    }

    /// Shared handle on the live counters.
    pub fn counters(&self) -> Arc<CacheCounters> {
        self.counters.clone()
    }

    /// Resident keys from least to most recently used.
    pub fn keys_by_recency(&self) -> Vec<String> {
        self.lru.iter_oldest_first().map(str::to_string).collect()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
