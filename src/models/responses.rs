//! Response DTOs for the proxy's JSON endpoints
//!
//! Key lookups answer with raw bytes; only the operational endpoints use JSON.

use std::time::Duration;

use serde::Serialize;

use crate::cache::CacheStats;

/// Response body for the stats endpoint (GET /_proxy/stats)
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    /// Coherent cache counters
    pub cache: CacheStats,
    /// Fraction of cached lookups answered without the backing store
    pub hit_rate: f64,
    /// Maximum resident entries
    pub capacity: usize,
    /// Freshness window in seconds
    pub ttl_secs: u64,
    /// Lookups currently admitted
    pub in_flight: usize,
    /// Admission ceiling
    pub max_in_flight: usize,
}

impl StatsResponse {
    pub fn new(
        cache: CacheStats,
        capacity: usize,
        ttl: Duration,
        in_flight: usize,
        max_in_flight: usize,
    ) -> Self {
        Self {
            hit_rate: cache.hit_rate(),
            cache,
            capacity,
            ttl_secs: ttl.as_secs(),
            in_flight,
            max_in_flight,
        }
    }
}

/// Response body for the health endpoint (GET /_proxy/health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}
