//! Cache Statistics Module
//!
//! Counters describing how lookups were served by the coherent cache.
//!
//! The store updates [`CacheCounters`] under the cache lock; readers take a
//! [`CacheStats`] snapshot without it.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use serde::Serialize;

// == Cache Stats ==
/// A point-in-time copy of the counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Lookups answered from a fresh entry
    pub hits: u64,
    /// Lookups for keys with no entry
    pub misses: u64,
    /// Lookups that found a stale entry and had to revalidate
    pub stale: u64,
    /// Backing store failures while filling or revalidating
    pub refresh_failures: u64,
    /// Entries evicted by capacity pressure
    pub evictions: u64,
    /// Current number of resident entries
    pub total_entries: usize,
}

impl CacheStats {
    // == Hit Rate ==
    /// Fraction of lookups answered without the backing store, 0.0 when idle.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses + self.stale;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

// == Cache Counters ==
/// Live counters, readable while a lookup holds the cache lock.
#[derive(Debug, Default)]
pub struct CacheCounters {
    hits: AtomicU64,
    misses: AtomicU64,
    stale: AtomicU64,
    refresh_failures: AtomicU64,
    evictions: AtomicU64,
    entries: AtomicUsize,
}

impl CacheCounters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_stale(&self) {
        self.stale.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_refresh_failure(&self) {
        self.refresh_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_eviction(&self) {
        self.evictions.fetch_add(1, Ordering::Relaxed);
    }

    pub fn set_entries(&self, entries: usize) {
        self.entries.store(entries, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            stale: self.stale.load(Ordering::Relaxed),
            refresh_failures: self.refresh_failures.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            total_entries: self.entries.load(Ordering::Relaxed),
        }
    }
}
