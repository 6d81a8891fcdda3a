//! Cache Store Module
//!
//! Synchronous cache engine: a HashMap of timestamped entries with lazy TTL eviction.

use std::collections::HashMap;
use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, info};

use crate::cache::{duration_ms, CacheEntry, CacheStats};

// == Cache Store ==
/// Key-value storage whose entries go stale after a TTL.
///
/// Expired entries are never swept in the background; they are dropped the
/// next time `get` or `has` looks at them.
#[derive(Debug)]
pub struct CacheStore<V> {
    /// Key-value storage
    entries: HashMap<String, CacheEntry<V>>,
    /// Performance statistics
    stats: CacheStats,
    /// TTL applied to every entry stored without an override
    ttl: Duration,
}

impl<V: Clone> CacheStore<V> {
    // == Constructor ==
    /// Creates an empty store with the given global TTL.
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: HashMap::new(),
            stats: CacheStats::new(),
            ttl,
        }
    }

    // == Set ==
    /// Stores a value under `key`, stamped with the current instant.
    ///
    /// Overwrites any existing entry. `ttl` overrides the global TTL for
    /// this entry only.
    pub fn set(&mut self, key: impl Into<String>, value: V, ttl: Option<Duration>) {
        self.entries.insert(key.into(), CacheEntry::new(value, ttl));
        self.stats.set_total_entries(self.entries.len());
    }

    // == Get ==
    /// Returns the value if present and fresh.
    ///
    /// A stale entry is removed on the spot and reported as a miss.
    pub fn get(&mut self, key: &str) -> Option<V> {
        if !self.evict_if_stale(key) {
            self.stats.record_miss();
            return None;
        }

        match self.entries.get(key) {
            Some(entry) => {
                self.stats.record_hit();
                Some(entry.value.clone())
            }
            None => {
                self.stats.record_miss();
                None
            }
        }
    }

    // == Get With Remaining ==
    /// Same as `get`, also returning how long the entry stays fresh.
    pub fn get_with_remaining(&mut self, key: &str) -> Option<(V, Duration)> {
        let value = self.get(key)?;
        let remaining = self
            .entries
            .get(key)
            .map(|entry| entry.remaining(self.ttl, Instant::now()))
            .unwrap_or_default();
        Some((value, remaining))
    }

    // == Has ==
    /// Same freshness check as `get`, without cloning the value or touching hit counters.
    pub fn has(&mut self, key: &str) -> bool {
        self.evict_if_stale(key) && self.entries.contains_key(key)
    }

    // == Invalidate ==
    /// Removes the entry for `key`. Returns whether one was present.
    pub fn invalidate(&mut self, key: &str) -> bool {
        let removed = self.entries.remove(key).is_some();
        if removed {
            self.stats.record_invalidated(1);
            self.stats.set_total_entries(self.entries.len());
            info!(key, "cache entry invalidated");
        }
        removed
    }

    // == Invalidate Pattern ==
    /// Removes every entry whose key contains `pattern`. Returns how many were removed.
    pub fn invalidate_pattern(&mut self, pattern: &str) -> usize {
        let removed = self.invalidate_where(|key| key.contains(pattern));
        if removed > 0 {
            info!(pattern, removed, "cache entries invalidated by pattern");
        }
        removed
    }

    // == Invalidate Prefix ==
    /// Removes every entry whose key starts with `prefix`. Returns how many were removed.
    pub fn invalidate_prefix(&mut self, prefix: &str) -> usize {
        let removed = self.invalidate_where(|key| key.starts_with(prefix));
        if removed > 0 {
            info!(prefix, removed, "cache entries invalidated by prefix");
        }
        removed
    }

    fn invalidate_where(&mut self, matches: impl Fn(&str) -> bool) -> usize {
        let before = self.entries.len();
        self.entries.retain(|key, _| !matches(key));
        let removed = before - self.entries.len();

        self.stats.record_invalidated(removed);
        self.stats.set_total_entries(self.entries.len());
        removed
    }

    // == Clear ==
    /// Removes all entries. Returns how many were removed.
    pub fn clear(&mut self) -> usize {
        let removed = self.entries.len();
        self.entries.clear();

        self.stats.record_invalidated(removed);
        self.stats.set_total_entries(0);
        info!(removed, "cache cleared");
        removed
    }

    // == TTL ==
    /// Changes the global TTL.
    ///
    /// Entries keep their original store instant, so the new TTL applies
    /// uniformly to every entry without an override.
    pub fn set_ttl(&mut self, ttl: Duration) {
        info!(ttl_ms = duration_ms(ttl), "cache ttl changed");
        self.ttl = ttl;
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.set_total_entries(self.entries.len());
        stats
    }

    /// Mutable access for the coalescing layer's fetch counters.
    pub(crate) fn stats_mut(&mut self) -> &mut CacheStats {
        &mut self.stats
    }

    // == Length ==
    /// Returns the current number of entries, stale ones included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drops `key` if its entry is stale. Returns false when it did so.
    fn evict_if_stale(&mut self, key: &str) -> bool {
        let stale = self
            .entries
            .get(key)
            .is_some_and(|entry| entry.is_expired(self.ttl, Instant::now()));

        if stale {
            self.entries.remove(key);
            self.stats.record_expired();
            self.stats.set_total_entries(self.entries.len());
            debug!(key, "evicted stale cache entry");
        }
        !stale
    }
}
