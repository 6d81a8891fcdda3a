//! Response Cache Module
//!
//! Shared, clonable cache handle that coalesces concurrent fetches of the same key.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{OnceCell, RwLock};
use tracing::{debug, warn};

use crate::cache::{CacheStats, CacheStore};

/// Outcome of one fetcher run. Only set once the run has been settled.
type Flight<V, E> = OnceCell<Result<V, E>>;

struct Shared<V, E> {
    store: CacheStore<V>,
    /// At most one flight per key
    in_flight: HashMap<String, Arc<Flight<V, E>>>,
}

impl<V: Clone, E> Shared<V, E> {
    /// Records a finished fetcher run for `flight`.
    ///
    /// The value is stored only if `flight` is still the registered flight
    /// for `key`. Invalidation detaches flights, so a read that started
    /// before an invalidation never writes its result back.
    fn settle(
        &mut self,
        key: &str,
        flight: &Arc<Flight<V, E>>,
        outcome: &Result<V, E>,
        ttl: Option<Duration>,
    ) {
        self.store.stats_mut().record_fetch();

        let registered = self
            .in_flight
            .get(key)
            .is_some_and(|current| Arc::ptr_eq(current, flight));
        if registered {
            self.in_flight.remove(key);
        }

        match outcome {
            Ok(value) if registered => self.store.set(key, value.clone(), ttl),
            Ok(_) => debug!(key, "flight detached by invalidation, result not cached"),
            Err(_) => {
                self.store.stats_mut().record_fetch_failure();
                warn!(key, "fetch failed, nothing cached");
            }
        }
    }

    /// Drops every flight whose key matches, so its result is not stored.
    fn detach_flights(&mut self, matches: impl Fn(&str) -> bool) {
        self.in_flight.retain(|key, _| !matches(key));
    }
}

// == Response Cache ==
/// TTL cache with request deduplication.
///
/// Cloning the handle is cheap and every clone sees the same entries, so the
/// application builds one instance at startup and hands clones to its
/// consumers. Tests build their own.
///
/// `E` is the fetcher's error type. It must be `Clone` because one failure
/// is delivered to every caller waiting on the same flight.
pub struct ResponseCache<V, E> {
    inner: Arc<RwLock<Shared<V, E>>>,
}

impl<V, E> Clone for ResponseCache<V, E> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<V, E> fmt::Debug for ResponseCache<V, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResponseCache").finish_non_exhaustive()
    }
}

impl<V: Clone, E: Clone> ResponseCache<V, E> {
    // == Constructor ==
    /// Creates an empty cache with the given global TTL.
    pub fn new(ttl: Duration) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Shared {
                store: CacheStore::new(ttl),
                in_flight: HashMap::new(),
            })),
        }
    }

    // == Fetch ==
    /// Returns the cached value for `key`, or retrieves it with `fetcher`.
    ///
    /// - A fresh entry is returned without calling `fetcher`.
    /// - If another caller is already fetching `key`, this call waits for
    ///   that result instead of starting a second fetch.
    /// - Otherwise `fetcher` runs. On success its value is stored with
    ///   `ttl` (global TTL when None); on failure nothing is stored and the
    ///   error goes to every waiting caller.
    /// - If `key` is invalidated while the fetch runs, waiters still get the
    ///   result but it is not stored.
    ///
    /// There is no timeout: a fetcher that never resolves keeps `key` in flight.
    pub async fn fetch<F, Fut>(&self, key: &str, fetcher: F, ttl: Option<Duration>) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        // Check and register under one guard, before the first suspension point
        let (flight, joined) = {
            let mut shared = self.inner.write().await;
            if let Some(value) = shared.store.get(key) {
                debug!(key, "cache hit");
                return Ok(value);
            }

            match shared.in_flight.get(key).map(Arc::clone) {
                Some(flight) => {
                    debug!(key, "joining in-flight fetch");
                    (flight, true)
                }
                None => {
                    let flight = Arc::new(OnceCell::new());
                    shared.in_flight.insert(key.to_string(), Arc::clone(&flight));
                    debug!(key, "cache miss, fetching");
                    (flight, false)
                }
            }
        };

        // The cell is only filled after the run is settled under the guard.
        // A runner dropped before that leaves it empty, and the next waiter
        // runs its own fetcher instead of inheriting an unsettled result.
        let mut ran_fetcher = false;
        let outcome = flight
            .get_or_init(|| {
                ran_fetcher = true;
                let inner = Arc::clone(&self.inner);
                let settling = Arc::clone(&flight);
                async move {
                    let outcome = fetcher().await;
                    inner.write().await.settle(key, &settling, &outcome, ttl);
                    outcome
                }
            })
            .await
            .clone();

        if joined && !ran_fetcher {
            self.inner.write().await.store.stats_mut().record_coalesced();
        }

        outcome
    }

    // == Store Operations ==
    /// Stores `value` under `key`; `ttl` overrides the global TTL for this entry.
    pub async fn set(&self, key: impl Into<String>, value: V, ttl: Option<Duration>) {
        self.inner.write().await.store.set(key, value, ttl);
    }

    /// Returns the value if present and fresh, evicting it if stale.
    pub async fn get(&self, key: &str) -> Option<V> {
        self.inner.write().await.store.get(key)
    }

    /// Like `get`, also returning how long the entry stays fresh.
    pub async fn get_with_remaining(&self, key: &str) -> Option<(V, Duration)> {
        self.inner.write().await.store.get_with_remaining(key)
    }

    pub async fn has(&self, key: &str) -> bool {
        self.inner.write().await.store.has(key)
    }

    /// Removes `key` and detaches any fetch of it still in flight.
    pub async fn invalidate(&self, key: &str) -> bool {
        let mut shared = self.inner.write().await;
        shared.detach_flights(|k| k == key);
        shared.store.invalidate(key)
    }

    /// Removes keys containing `pattern` and detaches their in-flight fetches.
    pub async fn invalidate_pattern(&self, pattern: &str) -> usize {
        let mut shared = self.inner.write().await;
        shared.detach_flights(|k| k.contains(pattern));
        shared.store.invalidate_pattern(pattern)
    }

    /// Removes keys starting with `prefix` and detaches their in-flight fetches.
    pub async fn invalidate_prefix(&self, prefix: &str) -> usize {
        let mut shared = self.inner.write().await;
        shared.detach_flights(|k| k.starts_with(prefix));
        shared.store.invalidate_prefix(prefix)
    }

    pub async fn clear(&self) -> usize {
        let mut shared = self.inner.write().await;
        shared.detach_flights(|_| true);
        shared.store.clear()
    }

    pub async fn set_ttl(&self, ttl: Duration) {
        self.inner.write().await.store.set_ttl(ttl);
    }

    pub async fn ttl(&self) -> Duration {
        self.inner.read().await.store.ttl()
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.store.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.store.is_empty()
    }

    pub async fn stats(&self) -> CacheStats {
        self.inner.read().await.store.stats()
    }

    /// Number of keys with a fetch currently in progress.
    pub async fn in_flight(&self) -> usize {
        self.inner.read().await.in_flight.len()
    }
}
