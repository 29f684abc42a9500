//! Lookup Policies
//!
//! How a key lookup reaches the backing store: straight through, or through
//! the read-through cache.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::Mutex;
use tracing::debug;

use crate::backend::BackingStore;
use crate::cache::{CacheCounters, CacheStats, CacheStore, Lookup};
use crate::error::StoreError;

/// A strategy for answering a key lookup.
#[async_trait]
pub trait LookupPolicy: Send + Sync {
    /// Resolves `key` to its value, `None` when the store reports it absent.
    async fn lookup(&self, key: &str) -> Result<Option<Bytes>, StoreError>;

    /// Short name used in logs.
    fn name(&self) -> &'static str;
}

// == Direct Lookup ==
/// Queries the backing store on every request. Never touches the cache.
pub struct DirectLookup {
    backend: Arc<dyn BackingStore>,
}

impl DirectLookup {
    pub fn new(backend: Arc<dyn BackingStore>) -> Self {
        Self { backend }
    }
}

#[async_trait]
impl LookupPolicy for DirectLookup {
    async fn lookup(&self, key: &str) -> Result<Option<Bytes>, StoreError> {
        self.backend.get(key.as_bytes()).await
    }

    fn name(&self) -> &'static str {
        "direct"
    }
}

// == Coherent Cache ==
/// Read-through cache serialized by one lock shared by all keys.
///
/// The lock is held for the whole check, fetch and store sequence, including
/// the backing store round trip, so every cached lookup observes the effects
/// of all earlier ones. Statistics are read without the lock.
pub struct CoherentCache {
    store: Mutex<CacheStore>,
    counters: Arc<CacheCounters>,
    capacity: usize,
    ttl: Duration,
    backend: Arc<dyn BackingStore>,
}

impl CoherentCache {
    pub fn new(store: CacheStore, backend: Arc<dyn BackingStore>) -> Self {
        Self {
            counters: store.counters(),
            capacity: store.capacity(),
            ttl: store.ttl(),
            store: Mutex::new(store),
            backend,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Returns current cache statistics, even while a lookup holds the lock.
    pub fn stats(&self) -> CacheStats {
        self.counters.snapshot()
    }

    /// Runs `f` against the underlying store under the cache lock.
    #[cfg(test)]
    pub(crate) async fn with_store<R>(&self, f: impl FnOnce(&mut CacheStore) -> R) -> R {
        let mut store = self.store.lock().await;
        f(&mut store)
    }
}

#[async_trait]
impl LookupPolicy for CoherentCache {
    async fn lookup(&self, key: &str) -> Result<Option<Bytes>, StoreError> {
        let mut store = self.store.lock().await;

        match store.get(key) {
            Lookup::Fresh(value) => {
                debug!("Cache hit for {}", key);
                Ok(value)
            }
            lookup => {
                let state = if matches!(lookup, Lookup::Missing) { "miss" } else { "stale" };
                debug!("Cache {} for {}", state, key);
                match self.backend.get(key.as_bytes()).await {
                    Ok(value) => {
                        store.put(key, value.clone());
                        Ok(value)
                    }
                    Err(err) => {
                        // Stale entries keep their old expiry so the next lookup revalidates
                        store.record_refresh_failure();
                        Err(err)
                    }
                }
            }
        }
    }

    fn name(&self) -> &'static str {
        "cached"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::backend::MemoryStore;

    const TTL: Duration = Duration::from_secs(10);

    fn setup(capacity: usize) -> (Arc<MemoryStore>, CoherentCache, DirectLookup) {
        let backend = Arc::new(MemoryStore::new());
        let cache = CoherentCache::new(CacheStore::new(capacity, TTL), backend.clone());
        let direct = DirectLookup::new(backend.clone());
        (backend, cache, direct)
    }

    #[tokio::test]
    async fn test_direct_always_queries_backend() {
        let (backend, cache, direct) = setup(10);
        backend.insert("foo", "bar");

        assert_eq!(direct.lookup("foo").await.unwrap(), Some(Bytes::from("bar")));
        assert_eq!(direct.lookup("foo").await.unwrap(), Some(Bytes::from("bar")));

        assert_eq!(backend.lookups(), 2);
        assert_eq!(cache.stats().total_entries, 0);
    }

    #[tokio::test]
    async fn test_fresh_lookups_hit_cache() {
        let (backend, cache, _) = setup(10);
        backend.insert("foo", "bar");

        for _ in 0..5 {
            assert_eq!(cache.lookup("foo").await.unwrap(), Some(Bytes::from("bar")));
        }

        assert_eq!(backend.lookups(), 1);
        let stats = cache.stats();
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.hits, 4);
    }

    #[tokio::test]
    async fn test_fresh_entry_hides_backend_changes() {
        let (backend, cache, direct) = setup(10);
        backend.insert("foo", "old");
        cache.lookup("foo").await.unwrap();

        backend.insert("foo", "new");

        assert_eq!(cache.lookup("foo").await.unwrap(), Some(Bytes::from("old")));
        assert_eq!(direct.lookup("foo").await.unwrap(), Some(Bytes::from("new")));
    }

    #[tokio::test]
    async fn test_negative_results_are_cached() {
        let (backend, cache, _) = setup(10);

        assert_eq!(cache.lookup("missing").await.unwrap(), None);
        assert_eq!(cache.lookup("missing").await.unwrap(), None);

        assert_eq!(backend.lookups(), 1);
        assert!(cache.with_store(|s| s.contains("missing")).await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_entry_revalidated_once() {
        let (backend, cache, _) = setup(10);
        backend.insert("foo", "v1");
        cache.lookup("foo").await.unwrap();

        backend.insert("foo", "v2");
        tokio::time::advance(TTL).await;

        assert_eq!(cache.lookup("foo").await.unwrap(), Some(Bytes::from("v2")));
        assert_eq!(cache.lookup("foo").await.unwrap(), Some(Bytes::from("v2")));
        assert_eq!(backend.lookups(), 2);

        let remaining = cache
            .with_store(|s| s.peek("foo").map(|e| e.ttl_remaining()))
            .await;
        assert_eq!(remaining, Some(TTL));
    }

    #[tokio::test]
    async fn test_miss_with_backend_down_leaves_cache_unchanged() {
        let (backend, cache, _) = setup(10);
        backend.set_unavailable(true);

        assert!(cache.lookup("foo").await.is_err());
        assert_eq!(cache.stats().total_entries, 0);
        assert_eq!(cache.stats().refresh_failures, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_revalidation_keeps_stale_entry_and_expiry() {
        let (backend, cache, _) = setup(10);
        backend.insert("foo", "v1");
        cache.lookup("foo").await.unwrap();
        let expires_at = cache.with_store(|s| s.peek("foo").unwrap().expires_at).await;

        tokio::time::advance(TTL + Duration::from_secs(1)).await;
        backend.set_unavailable(true);

        assert!(cache.lookup("foo").await.is_err());
        let entry = cache.with_store(|s| s.peek("foo").cloned()).await.unwrap();
        assert_eq!(entry.value, Some(Bytes::from("v1")));
        assert_eq!(entry.expires_at, expires_at);

        // Next request tries again and recovers
        backend.set_unavailable(false);
        assert_eq!(cache.lookup("foo").await.unwrap(), Some(Bytes::from("v1")));
        assert_eq!(backend.lookups(), 3);
    }

    /// Backing store that blocks until released.
    struct BlockedStore(tokio::sync::Notify);

    #[async_trait]
    impl BackingStore for BlockedStore {
        async fn get(&self, _key: &[u8]) -> Result<Option<Bytes>, StoreError> {
            self.0.notified().await;
            Ok(None)
        }
    }

    #[tokio::test]
    async fn test_stats_readable_while_lookup_holds_lock() {
        let backend = Arc::new(BlockedStore(tokio::sync::Notify::new()));
        let cache = Arc::new(CoherentCache::new(CacheStore::new(10, TTL), backend.clone()));

        let pending = tokio::spawn({
            let cache = cache.clone();
            async move { cache.lookup("foo").await }
        });
        while cache.stats().misses == 0 {
            tokio::task::yield_now().await;
        }

        // The miss is recorded and the lookup is parked on the backend
        assert!(cache.store.try_lock().is_err());
        assert_eq!(cache.stats().misses, 1);

        backend.0.notify_one();
        assert_eq!(pending.await.unwrap().unwrap(), None);
        assert_eq!(cache.stats().total_entries, 1);
    }

    #[tokio::test]
    async fn test_capacity_evicts_least_recent() {
        let (backend, cache, _) = setup(2);
        for key in ["a", "b", "c"] {
            backend.insert(key, key);
        }

        cache.lookup("a").await.unwrap();
        cache.lookup("b").await.unwrap();
        cache.lookup("a").await.unwrap();
        cache.lookup("c").await.unwrap();

        let keys = cache.with_store(|s| s.keys_by_recency()).await;
        assert_eq!(keys, ["a", "c"]);
    }
}
