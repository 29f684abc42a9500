//! Error types for the caching proxy
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

// == Proxy Error Enum ==
/// Errors surfaced to HTTP clients of the proxy.
#[derive(Error, Debug)]
pub enum ProxyError {
    /// Admission ceiling reached
    #[error("Number of connections reached its maximum.")]
    CapacitySaturated,

    /// Backing store could not be reached after exhausting retries
    #[error("Backing Redis server not available.")]
    BackingStoreUnavailable(#[source] StoreError),

    /// Backing store definitively reported the key absent
    #[error("None")]
    KeyAbsent(String),
}

impl From<StoreError> for ProxyError {
    fn from(err: StoreError) -> Self {
        ProxyError::BackingStoreUnavailable(err)
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let status = match &self {
            ProxyError::CapacitySaturated => StatusCode::SERVICE_UNAVAILABLE,
            ProxyError::BackingStoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ProxyError::KeyAbsent(_) => StatusCode::NOT_FOUND,
        };

        (status, format!("{}\n", self)).into_response()
    }
}

// == Store Error Enum ==
/// Errors raised by a backing store lookup.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Connection could not be established or broke mid-request
    #[error("Connection error: {0}")]
    Connection(#[from] std::io::Error),

    /// Retry budget exhausted
    #[error("Backing store unavailable after {attempts} attempts")]
    Unavailable { attempts: u32 },

    /// The store answered with an error reply
    #[error("Server error: {0}")]
    Server(String),

    /// The store answered with something that is not a valid reply
    #[error("Protocol error: {0}")]
    Protocol(String),
}

impl StoreError {
    /// Returns true for failures that a reconnect may cure.
    pub fn is_retryable(&self) -> bool {
        matches!(self, StoreError::Connection(_))
    }
}

// == Frame Error Enum ==
/// Errors raised while decoding a wire frame.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum FrameError {
    /// Bytes cannot start or continue a valid frame
    #[error("Malformed frame: {0}")]
    Malformed(String),

    /// Buffered input grew past the frame size limit
    #[error("Frame exceeds {0} bytes")]
    TooLarge(usize),
}

// == Config Error Enum ==
/// Errors raised while loading startup configuration.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// A required variable is not set
    #[error("Missing required environment variable {0}")]
    Missing(&'static str),

    /// A variable is set but cannot be parsed or is out of range
    #[error("Invalid value for {name}: {value:?}")]
    Invalid { name: &'static str, value: String },
}

// == Result Type Alias ==
/// Convenience Result type for the request path.
pub type Result<T> = std::result::Result<T, ProxyError>;
