//! Cache Module
//!
//! Provides in-memory caching with TTL expiration, lazy eviction and
//! request coalescing.

mod entry;
mod response;
mod stats;
mod store;

#[cfg(test)]
mod property_tests;

// Re-export public types
pub use entry::{duration_ms, CacheEntry};
pub use response::ResponseCache;
pub use stats::CacheStats;
pub use store::CacheStore;
