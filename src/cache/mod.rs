//! Cache Module
//!
//! Read-through caching of backing store lookups with TTL staleness and LRU
//! eviction, plus the two lookup policies built on it.

mod entry;
mod lru;
mod policy;
mod stats;
mod store;

#[cfg(test)]
mod property_tests;

// Re-export public types
pub use entry::CacheEntry;
pub use lru::LruTracker;
pub use policy::{CoherentCache, DirectLookup, LookupPolicy};
pub use stats::{CacheCounters, CacheStats};
pub use store::{CacheStore, Lookup};
