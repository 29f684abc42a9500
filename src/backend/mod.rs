//! Backing Store Module
//!
//! Point lookups against the store the proxy sits in front of.
//!
//! A lookup has three outcomes:
//! - `Ok(Some(value))` - the store holds a value
//! - `Ok(None)` - the store answered and the key is absent
//! - `Err(_)` - the store could not be reached (after retries) or misbehaved

mod memory;
mod redis;
mod retry;

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::StoreError;

pub use memory::MemoryStore;
pub use redis::{RedisClient, RedisEndpoint};
pub use retry::{retry, RetryPolicy};

/// A remote key-value store supporting single-key reads.
#[async_trait]
pub trait BackingStore: Send + Sync {
    /// Reads the value stored under `key`.
    async fn get(&self, key: &[u8]) -> Result<Option<Bytes>, StoreError>;
}
