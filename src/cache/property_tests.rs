//! Property-Based Tests for Cache Module
//!
//! Uses proptest to check the store against a simple recency model and the
//! coherent policy against an in-memory backing store.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use proptest::prelude::*;

use crate::backend::MemoryStore;
use crate::cache::{CacheStore, CoherentCache, Lookup, LookupPolicy};

// == Test Configuration ==
const TEST_TTL: Duration = Duration::from_secs(300);

// == Strategies ==
/// Keys from a small alphabet so sequences revisit keys often
fn key_strategy() -> impl Strategy<Value = String> {
    "[a-h]{1,2}"
}

fn value_strategy() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 0..64)
}

#[derive(Debug, Clone)]
enum StoreOp {
    Get(String),
    Put(String, Option<Vec<u8>>),
}

fn store_op_strategy() -> impl Strategy<Value = StoreOp> {
    prop_oneof![
        key_strategy().prop_map(StoreOp::Get),
        (key_strategy(), prop::option::of(value_strategy()))
            .prop_map(|(key, value)| StoreOp::Put(key, value)),
    ]
}

/// Moves `key` to the most recent end of `model`.
fn model_touch(model: &mut Vec<String>, key: &str) {
    model.retain(|k| k != key);
    model.push(key.to_string());
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    // After any sequence of gets and puts the store holds at most `capacity`
    // entries, and they are exactly the most recently touched resident keys.
    #[test]
    fn prop_resident_set_is_most_recent(
        capacity in 1usize..6,
        ops in prop::collection::vec(store_op_strategy(), 1..80)
    ) {
        let mut store = CacheStore::new(capacity, TEST_TTL);
        let mut model: Vec<String> = Vec::new();

        for op in ops {
            match op {
                StoreOp::Get(key) => {
                    let resident = model.contains(&key);
                    let lookup = store.get(&key);
                    prop_assert_eq!(resident, lookup != Lookup::Missing);
                    if resident {
                        model_touch(&mut model, &key);
                    }
                }
                StoreOp::Put(key, value) => {
                    store.put(&key, value.map(Bytes::from));
                    model_touch(&mut model, &key);
                    if model.len() > capacity {
                        model.remove(0);
                    }
                }
            }

            prop_assert!(store.len() <= capacity);
            prop_assert_eq!(store.keys_by_recency(), model.clone());
        }
    }

    // The last value put for a key is what a fresh get returns.
    #[test]
    fn prop_put_then_get_returns_latest(
        key in key_strategy(),
        values in prop::collection::vec(prop::option::of(value_strategy()), 1..5)
    ) {
        let mut store = CacheStore::new(4, TEST_TTL);
        for value in &values {
            store.put(&key, value.clone().map(Bytes::from));
        }

        let expected = values.last().cloned().flatten().map(Bytes::from);
        prop_assert_eq!(store.get(&key), Lookup::Fresh(expected));
        prop_assert_eq!(store.len(), 1);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(50))]

    // A value stored in the backing store comes back unchanged through the
    // coherent cache, and repeated fresh lookups never reach the store again.
    #[test]
    fn prop_coherent_round_trip_and_idempotence(
        key in key_strategy(),
        value in prop::option::of(value_strategy()),
        repeats in 1usize..10
    ) {
        let backend = Arc::new(MemoryStore::new());
        if let Some(value) = &value {
            backend.insert(key.as_bytes(), value.clone());
        }
        let cache = CoherentCache::new(CacheStore::new(8, TEST_TTL), backend.clone());

        let expected = value.map(Bytes::from);
        for _ in 0..repeats {
            let got = tokio_test::block_on(cache.lookup(&key)).unwrap();
            prop_assert_eq!(got, expected.clone());
        }
        prop_assert_eq!(backend.lookups(), 1);
    }
}
