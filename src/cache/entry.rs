//! Cache Entry Module
//!
//! Defines a cached lookup result together with its freshness deadline.

use std::time::Duration;

use bytes::Bytes;
use tokio::time::Instant;

// == Cache Entry ==
/// A cached backing store answer.
///
/// `value == None` is a negative entry: the store was reached and reported the
/// key absent. Expiry only marks the entry stale; it is never removed for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    /// The cached value, or `None` for a confirmed absence
    pub value: Option<Bytes>,
    /// Instant from which the entry is stale
    pub expires_at: Instant,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates an entry fresh for `ttl` from now.
    pub fn new(value: Option<Bytes>, ttl: Duration) -> Self {
        Self {
            value,
            expires_at: Instant::now() + ttl,
        }
    }

    // == Is Expired ==
    /// Checks if the entry is stale.
    ///
    /// Boundary condition: an entry is stale once the current time is greater
    /// than or equal to `expires_at`.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Instant::now())
    }

    /// Checks staleness against a given instant.
    pub fn is_expired_at(&self, now: Instant) -> bool {
        now >= self.expires_at
    }

    // == Time To Live ==
    /// Remaining freshness, zero once stale.
    pub fn ttl_remaining(&self) -> Duration {
        self.expires_at.saturating_duration_since(Instant::now())
    }
}
