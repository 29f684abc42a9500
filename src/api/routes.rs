//! API Routes
//!
//! Configures the Axum router with all proxy endpoints.

use axum::{routing::get, Router};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    cached_lookup_handler, direct_lookup_handler, health_handler, stats_handler, AppState,
};

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `GET /_proxy/health` - Health check
/// - `GET /_proxy/stats` - Cache and admission statistics
/// - `GET /direct/:key` - Uncached lookup
/// - `GET /:key` - Cached lookup
///
/// Operational endpoints sit two segments deep so every single-segment key,
/// `health` and `stats` included, reaches the cached lookup.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/_proxy/health", get(health_handler))
        .route("/_proxy/stats", get(stats_handler))
        .route("/direct/:key", get(direct_lookup_handler))
        .route("/:key", get(cached_lookup_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
