//! Property-Based Tests for Cache Module
//!
//! Uses proptest to check the store against a simple HashMap model.

use proptest::prelude::*;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread::{self, sleep};
use std::time::Duration;

use crate::cache::{CacheStore, Ttl};
use crate::config::Settings;

// == Test Configuration ==
const TEST_DEFAULT_TTL: Duration = Duration::from_secs(300);
const TAGS: [&str; 3] = ["red", "green", "blue"];

fn test_store() -> CacheStore<String> {
    CacheStore::new(Settings::new(TEST_DEFAULT_TTL, Duration::from_secs(60)))
}

// == Strategies ==
/// Generates keys from a small alphabet so operations collide often
fn key_strategy() -> impl Strategy<Value = String> {
    "[a-e]{1,2}".prop_map(|s| s)
}

fn value_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 ]{0,32}".prop_map(|s| s)
}

/// Generates a subset of TAGS, possibly with repeats
fn tags_strategy() -> impl Strategy<Value = Vec<&'static str>> {
    prop::collection::vec(prop::sample::select(TAGS.to_vec()), 0..4)
}

#[derive(Debug, Clone)]
enum CacheOp {
    Set {
        key: String,
        value: String,
        tags: Vec<&'static str>,
    },
    Get {
        key: String,
    },
    Delete {
        key: String,
    },
    FlushTag {
        tag: &'static str,
    },
    FlushAll,
}

fn cache_op_strategy() -> impl Strategy<Value = CacheOp> {
    prop_oneof![
        4 => (key_strategy(), value_strategy(), tags_strategy())
            .prop_map(|(key, value, tags)| CacheOp::Set { key, value, tags }),
        3 => key_strategy().prop_map(|key| CacheOp::Get { key }),
        2 => key_strategy().prop_map(|key| CacheOp::Delete { key }),
        1 => prop::sample::select(TAGS.to_vec()).prop_map(|tag| CacheOp::FlushTag { tag }),
        1 => Just(CacheOp::FlushAll),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    // Any sequence of operations leaves the store agreeing with a HashMap of
    // (value, tags), and every operation reports the same outcome as the model.
    #[test]
    fn prop_store_matches_model(ops in prop::collection::vec(cache_op_strategy(), 1..60)) {
        let store = test_store();
        let mut model: HashMap<String, (String, Vec<&'static str>)> = HashMap::new();

        for op in ops {
            match op {
                CacheOp::Set { key, value, tags } => {
                    store.set(key.clone(), value.clone(), Ttl::Default, &tags);
                    model.insert(key, (value, tags));
                }
                CacheOp::Get { key } => {
                    let expected = model.get(&key).map(|(value, _)| value.clone());
                    prop_assert_eq!(store.get(&key), expected);
                }
                CacheOp::Delete { key } => {
                    prop_assert_eq!(store.delete(&key), model.remove(&key).is_some());
                }
                CacheOp::FlushTag { tag } => {
                    let before = model.len();
                    model.retain(|_, (_, tags)| !tags.contains(&tag));
                    prop_assert_eq!(store.flush_tag(tag), before - model.len());
                }
                CacheOp::FlushAll => {
                    store.flush_all();
                    model.clear();
                }
            }
            prop_assert_eq!(store.len(), model.len());
        }
    }

    // flush_tag removes exactly the entries carrying the tag.
    #[test]
    fn prop_flush_tag_survivors(
        entries in prop::collection::vec((key_strategy(), tags_strategy()), 1..30),
        tag in prop::sample::select(TAGS.to_vec()),
    ) {
        let store = test_store();
        let mut latest: HashMap<String, Vec<&'static str>> = HashMap::new();
        for (key, tags) in entries {
            store.set(key.clone(), key.clone(), Ttl::Never, &tags);
            latest.insert(key, tags);
        }

        store.flush_tag(&tag);

        for (key, tags) in &latest {
            let survived = store.get(key).is_some();
            prop_assert_eq!(survived, !tags.contains(&tag), "key {}", key);
        }
    }

    // A Set fully replaces the previous entry, tags included.
    #[test]
    fn prop_overwrite_replaces_tags(
        key in key_strategy(),
        value1 in value_strategy(),
        value2 in value_strategy(),
    ) {
        let store = test_store();

        store.set(key.clone(), value1, Ttl::Default, &["red"]);
        store.set(key.clone(), value2.clone(), Ttl::Default, &["blue"]);

        prop_assert_eq!(store.flush_tag("red"), 0);
        prop_assert_eq!(store.get(&key), Some(value2));
        prop_assert_eq!(store.len(), 1);
    }
}

// Separate proptest block with fewer cases for time-sensitive tests
proptest! {
    #![proptest_config(ProptestConfig::with_cases(5))]

    // An entry is readable until its TTL elapses and hidden afterwards, and
    // only a sweep physically removes it.
    #[test]
    fn prop_ttl_expiration_behavior(
        key in key_strategy(),
        value in value_strategy(),
        ttl_ms in 20u64..60,
    ) {
        let store = test_store();

        store.set(key.clone(), value.clone(), Duration::from_millis(ttl_ms), &[]);
        prop_assert_eq!(store.get(&key), Some(value));

        sleep(Duration::from_millis(ttl_ms + 30));

        prop_assert!(store.get(&key).is_none(), "Entry should not be found after TTL expires");
        prop_assert_eq!(store.len(), 1);
        prop_assert_eq!(store.sweep_expired(), 1);
        prop_assert!(store.is_empty());
    }

    // Concurrent misses on one key run the computation once and every caller
    // sees its result.
    #[test]
    fn prop_concurrent_get_or_compute(threads in 2usize..8, value in value_strategy()) {
        let store = Arc::new(test_store());
        let calls = Arc::new(AtomicUsize::new(0));
        let barrier = Arc::new(Barrier::new(threads));

        let handles: Vec<_> = (0..threads)
            .map(|_| {
                let store = Arc::clone(&store);
                let calls = Arc::clone(&calls);
                let barrier = Arc::clone(&barrier);
                let value = value.clone();
                thread::spawn(move || {
                    barrier.wait();
                    store.get_or_compute(
                        "memo",
                        || {
                            calls.fetch_add(1, Ordering::SeqCst);
                            sleep(Duration::from_millis(20));
                            value
                        },
                        Ttl::Default,
                        &[],
                    )
                })
            })
            .collect();

        for handle in handles {
            prop_assert_eq!(handle.join().expect("Thread should not panic"), value.clone());
        }
        prop_assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
