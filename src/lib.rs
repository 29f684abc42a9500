//! Redis Cache Proxy - a read-through caching proxy in front of Redis
//!
//! Serves point lookups over HTTP (cached or direct) and over a minimal RESP
//! listener, with admission control and bounded reconnects to the store.

pub mod admission;
pub mod api;
pub mod backend;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod resp;
pub mod wire;

pub use admission::AdmissionController;
pub use api::AppState;
pub use backend::{BackingStore, MemoryStore, RedisClient};
pub use config::Config;
pub use wire::{spawn_wire_server, WireServer};
