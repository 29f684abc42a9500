//! Response models for the proxy's operational endpoints.

pub mod responses;

pub use responses::{HealthResponse, StatsResponse};
