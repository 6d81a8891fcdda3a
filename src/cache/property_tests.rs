//! Property-Based Tests for Cache Module
//!
//! Uses proptest to check store and coalescing behaviour against a plain HashMap model.

use proptest::prelude::*;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::cache::{CacheStore, ResponseCache};

// == Test Configuration ==
/// Long enough that nothing expires while a case runs
const TEST_TTL: Duration = Duration::from_secs(300);

// == Strategies ==
/// Generates cache keys shaped like the client's (`perfil-5`, `preferencias-12`)
fn valid_key_strategy() -> impl Strategy<Value = String> {
    "(perfil|preferencias|medidas|plan)-[0-9]{1,3}".prop_map(|s| s)
}

fn valid_value_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 ]{1,64}".prop_map(|s| s)
}

#[derive(Debug, Clone)]
enum CacheOp {
    Set { key: String, value: String },
    Get { key: String },
    Invalidate { key: String },
    InvalidatePattern { pattern: String },
}

fn cache_op_strategy() -> impl Strategy<Value = CacheOp> {
    prop_oneof![
        3 => (valid_key_strategy(), valid_value_strategy())
            .prop_map(|(key, value)| CacheOp::Set { key, value }),
        3 => valid_key_strategy().prop_map(|key| CacheOp::Get { key }),
        1 => valid_key_strategy().prop_map(|key| CacheOp::Invalidate { key }),
        1 => "[0-9]{1,2}".prop_map(|pattern| CacheOp::InvalidatePattern { pattern }),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // Any sequence of operations leaves the store agreeing with a HashMap model,
    // and the hit/miss counters match what the lookups returned.
    #[test]
    fn prop_store_matches_model(ops in prop::collection::vec(cache_op_strategy(), 1..60)) {
        let mut store = CacheStore::new(TEST_TTL);
        let mut model: HashMap<String, String> = HashMap::new();
        let mut expected_hits: u64 = 0;
        let mut expected_misses: u64 = 0;

        for op in ops {
            match op {
                CacheOp::Set { key, value } => {
                    store.set(key.clone(), value.clone(), None);
                    model.insert(key, value);
                }
                CacheOp::Get { key } => {
                    let got = store.get(&key);
                    prop_assert_eq!(got.as_ref(), model.get(&key));
                    match got {
                        Some(_) => expected_hits += 1,
                        None => expected_misses += 1,
                    }
                }
                CacheOp::Invalidate { key } => {
                    prop_assert_eq!(store.invalidate(&key), model.remove(&key).is_some());
                }
                CacheOp::InvalidatePattern { pattern } => {
                    let before = model.len();
                    model.retain(|key, _| !key.contains(&pattern));
                    prop_assert_eq!(store.invalidate_pattern(&pattern), before - model.len());
                }
            }
        }

        let stats = store.stats();
        prop_assert_eq!(stats.hits, expected_hits, "Hits mismatch");
        prop_assert_eq!(stats.misses, expected_misses, "Misses mismatch");
        prop_assert_eq!(stats.total_entries, model.len(), "Total entries mismatch");
    }

    // Storing then reading before expiry returns the stored value, however often it is read.
    #[test]
    fn prop_fresh_reads_are_idempotent(
        key in valid_key_strategy(),
        value in valid_value_strategy(),
        reads in 1usize..10
    ) {
        let mut store = CacheStore::new(TEST_TTL);
        store.set(key.clone(), value.clone(), None);

        for _ in 0..reads {
            prop_assert!(store.has(&key));
            prop_assert_eq!(store.get(&key), Some(value.clone()));
        }
        prop_assert_eq!(store.len(), 1);
    }

    // Overwriting a key keeps one entry holding the newest value.
    #[test]
    fn prop_overwrite_semantics(
        key in valid_key_strategy(),
        value1 in valid_value_strategy(),
        value2 in valid_value_strategy()
    ) {
        let mut store = CacheStore::new(TEST_TTL);

        store.set(key.clone(), value1, None);
        store.set(key.clone(), value2.clone(), None);

        prop_assert_eq!(store.get(&key), Some(value2));
        prop_assert_eq!(store.len(), 1);
    }

    // After invalidate_pattern, no surviving key contains the pattern
    // and every key that did not contain it survives.
    #[test]
    fn prop_invalidate_pattern_is_exact(
        keys in prop::collection::hash_set(valid_key_strategy(), 1..30),
        pattern in "[0-9]{1,2}"
    ) {
        let mut store = CacheStore::new(TEST_TTL);
        for key in &keys {
            store.set(key.clone(), 0u8, None);
        }

        store.invalidate_pattern(&pattern);

        for key in &keys {
            prop_assert_eq!(store.has(key), !key.contains(&pattern), "key {}", key);
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(25))]

    // For any number of concurrent fetches per key, each key's fetcher runs
    // exactly once and every caller for that key sees the same value.
    #[test]
    fn prop_fetch_runs_once_per_key(
        keys in prop::collection::hash_set(valid_key_strategy(), 1..5),
        callers in 2usize..6
    ) {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .start_paused(true)
            .build()
            .unwrap();

        rt.block_on(async {
            let cache: ResponseCache<String, String> = ResponseCache::new(TEST_TTL);
            let calls = Arc::new(AtomicUsize::new(0));
            let mut handles = vec![];

            for key in &keys {
                for caller in 0..callers {
                    let cache = cache.clone();
                    let calls = Arc::clone(&calls);
                    let key = key.clone();
                    handles.push(tokio::spawn(async move {
                        let fetched = format!("{}#{}", key, caller);
                        let value = cache
                            .fetch(&key, || async move {
                                calls.fetch_add(1, Ordering::SeqCst);
                                tokio::time::sleep(Duration::from_millis(20)).await;
                                Ok::<_, String>(fetched)
                            }, None)
                            .await;
                        (key, value)
                    }));
                }
            }

            let mut seen: HashMap<String, String> = HashMap::new();
            for handle in handles {
                let (key, value) = handle.await.expect("fetch task should not panic");
                let value = value.expect("fetcher never fails here");
                let first = seen.entry(key).or_insert_with(|| value.clone());
                prop_assert_eq!(first.as_str(), value.as_str());
            }

            prop_assert_eq!(calls.load(Ordering::SeqCst), keys.len());
            prop_assert_eq!(cache.in_flight().await, 0);
            prop_assert_eq!(cache.len().await, keys.len());
            Ok(())
        })?;
    }
}

// == Property Test for Error Response Format ==
// This tests the CacheError -> HTTP response conversion

proptest! {
    #![proptest_config(ProptestConfig::with_cases(50))]

    // Every error renders as a JSON body with a string "error" field
    // carrying the error's message.
    #[test]
    fn prop_error_response_format(
        error_msg in "[a-zA-Z0-9 _-]{1,100}",
        status in 400u16..600
    ) {
        use crate::error::CacheError;
        use axum::body::to_bytes;
        use axum::response::IntoResponse;

        let error_variants = vec![
            CacheError::NotFound(error_msg.clone()),
            CacheError::InvalidRequest(error_msg.clone()),
            CacheError::UpstreamStatus { status, body: error_msg.clone() },
            CacheError::Upstream(error_msg.clone()),
            CacheError::Internal(error_msg.clone()),
        ];

        let rt = tokio::runtime::Runtime::new().unwrap();
        for error in error_variants {
            let expected_msg = error.to_string();
            let response = error.into_response();

            let content_type = response.headers()
                .get("content-type")
                .and_then(|v| v.to_str().ok());
            prop_assert!(
                content_type.map(|ct| ct.contains("application/json")).unwrap_or(false),
                "Response should have JSON content-type"
            );

            let bytes = rt.block_on(async {
                to_bytes(response.into_body(), usize::MAX).await.unwrap()
            });
            let json: serde_json::Value = serde_json::from_slice(&bytes)
                .expect("Response body should be valid JSON");

            prop_assert_eq!(json["error"].as_str(), Some(expected_msg.as_str()));
        }
    }
}
