//! API Module
//!
//! HTTP handlers and routing for the proxy.
//!
//! # Endpoints
//! - `GET /:key` - Cached lookup
//! - `GET /direct/:key` - Uncached lookup
//! - `GET /_proxy/stats` - Cache and admission statistics
//! - `GET /_proxy/health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
