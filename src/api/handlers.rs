//! API Handlers
//!
//! HTTP request handlers for the key lookup and operational endpoints.

use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use bytes::{BufMut, BytesMut};
use tracing::{debug, info};

use crate::admission::AdmissionController;
use crate::backend::BackingStore;
use crate::cache::{CacheStore, CoherentCache, DirectLookup, LookupPolicy};
use crate::error::{ProxyError, Result};
use crate::models::{HealthResponse, StatsResponse};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Ceiling on concurrent lookups
    pub admission: AdmissionController,
    /// Uncached lookups
    pub direct: Arc<DirectLookup>,
    /// Read-through cached lookups
    pub cached: Arc<CoherentCache>,
}

impl AppState {
    /// Creates a new AppState; both policies share `backend`.
    pub fn new(
        admission: AdmissionController,
        cache: CacheStore,
        backend: Arc<dyn BackingStore>,
    ) -> Self {
        Self {
            admission,
            direct: Arc::new(DirectLookup::new(backend.clone())),
            cached: Arc::new(CoherentCache::new(cache, backend)),
        }
    }

    /// Creates a new AppState from configuration.
    pub fn from_config(config: &crate::config::Config, backend: Arc<dyn BackingStore>) -> Self {
        Self::new(
            AdmissionController::new(config.max_conn),
            CacheStore::new(config.cache_size, config.ttl),
            backend,
        )
    }
}

/// Handler for GET /:key
///
/// Looks the key up through the read-through cache.
pub async fn cached_lookup_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Response> {
    serve_lookup(&state, state.cached.as_ref(), key).await
}

/// Handler for GET /direct/:key
///
/// Looks the key up in the backing store, bypassing the cache.
pub async fn direct_lookup_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Response> {
    serve_lookup(&state, state.direct.as_ref(), key).await
}

/// Admission, lookup, response. The admission slot is held until return.
async fn serve_lookup(
    state: &AppState,
    policy: &dyn LookupPolicy,
    key: String,
) -> Result<Response> {
    let _admitted = state.admission.enter()?;
    let begin = Instant::now();
    info!(
        "Processing {} request for {}. In flight: {}",
        policy.name(),
        key,
        state.admission.in_flight()
    );

    let result = policy.lookup(&key).await;
    debug!("{} request for {} took {:?}", policy.name(), key, begin.elapsed());

    match result? {
        Some(value) => {
            let mut body = BytesMut::with_capacity(value.len() + 1);
            body.put_slice(&value);
            body.put_u8(b'\n');
            Ok((StatusCode::OK, body.freeze()).into_response())
        }
        None => Err(ProxyError::KeyAbsent(key)),
    }
}

/// Handler for GET /_proxy/stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(StatsResponse::new(
        state.cached.stats(),
        state.cached.capacity(),
        state.cached.ttl(),
        state.admission.in_flight(),
        state.admission.max_in_flight(),
    ))
}

/// Handler for GET /_proxy/health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
