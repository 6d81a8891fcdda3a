//! Cache Entry Module
//!
//! Defines the structure for individual cache entries with TTL support.

use std::time::Duration;

use tokio::time::Instant;

// == Cache Entry ==
/// Represents a single cache entry with value and metadata.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    /// The stored value
    pub value: V,
    /// Instant the value was stored
    pub stored_at: Instant,
    /// Per-entry TTL override, None = follow the store's global TTL
    pub ttl: Option<Duration>,
}

impl<V> CacheEntry<V> {
    // == Constructor ==
    /// Creates a new cache entry stamped with the current instant.
    ///
    /// # Arguments
    /// * `value` - The value to store
    /// * `ttl` - Optional TTL override for this entry only
    pub fn new(value: V, ttl: Option<Duration>) -> Self {
        Self {
            value,
            stored_at: Instant::now(),
            ttl,
        }
    }

    // == Effective TTL ==
    /// Returns the TTL that gates this entry: its own override, or the global one.
    pub fn effective_ttl(&self, global_ttl: Duration) -> Duration {
        self.ttl.unwrap_or(global_ttl)
    }

    // == Age ==
    /// Time elapsed since the entry was stored.
    pub fn age(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.stored_at)
    }

    // == Is Expired ==
    /// Checks if the entry has expired.
    ///
    /// Boundary condition: an entry is stale only once its age strictly
    /// exceeds the effective TTL. An entry exactly `ttl` old is still served.
    pub fn is_expired(&self, global_ttl: Duration, now: Instant) -> bool {
        self.age(now) > self.effective_ttl(global_ttl)
    }

    // == Time To Live ==
    /// Returns the remaining lifetime, `Duration::ZERO` once expired.
    pub fn remaining(&self, global_ttl: Duration, now: Instant) -> Duration {
        self.effective_ttl(global_ttl).saturating_sub(self.age(now))
    }
}

// == Utility Functions ==
/// Whole milliseconds in `duration`, saturating at `u64::MAX`.
pub fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
