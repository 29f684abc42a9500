//! In-process backing store.

use std::collections::HashMap;
use std::io;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::RwLock;

use async_trait::async_trait;
use bytes::Bytes;

use super::BackingStore;
use crate::error::StoreError;

// == Memory Store ==
/// A `BackingStore` held in memory.
///
/// Counts lookups and can simulate an outage, which makes it the store of
/// choice for exercising the cache policies and front ends without Redis.
#[derive(Debug, Default)]
pub struct MemoryStore {
    data: RwLock<HashMap<Vec<u8>, Bytes>>,
    lookups: AtomicU64,
    unavailable: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `value` under `key`, replacing any previous value.
    pub fn insert(&self, key: impl AsRef<[u8]>, value: impl Into<Bytes>) {
        if let Ok(mut data) = self.data.write() {
            data.insert(key.as_ref().to_vec(), value.into());
        }
    }

    /// While set, every lookup fails with a connection error.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Number of lookups served or attempted so far.
    pub fn lookups(&self) -> u64 {
        self.lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BackingStore for MemoryStore {
    async fn get(&self, key: &[u8]) -> Result<Option<Bytes>, StoreError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Connection(io::Error::from(
                io::ErrorKind::ConnectionRefused,
            )));
        }
        let data = self
            .data
            .read()
            .map_err(|_| StoreError::Protocol("memory store lock poisoned".to_string()))?;
        Ok(data.get(key).cloned())
    }
}
