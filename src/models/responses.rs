//! Response DTOs for the gateway's cache admin API
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::Serialize;
use serde_json::Value;

use crate::cache::CacheStats;

/// Response body for GET /cache/entry
#[derive(Debug, Clone, Serialize)]
pub struct EntryResponse {
    /// The requested key
    pub key: String,
    /// The cached value
    pub value: Value,
    /// Milliseconds until the entry goes stale
    pub ttl_remaining_ms: u64,
}

impl EntryResponse {
    pub fn new(key: impl Into<String>, value: Value, ttl_remaining_ms: u64) -> Self {
        Self {
            key: key.into(),
            value,
            ttl_remaining_ms,
        }
    }
}

/// Response body for DELETE /cache
#[derive(Debug, Clone, Serialize)]
pub struct InvalidateResponse {
    /// Human readable summary
    pub message: String,
    /// Number of entries removed
    pub removed: usize,
}

impl InvalidateResponse {
    pub fn new(target: impl std::fmt::Display, removed: usize) -> Self {
        Self {
            message: format!("Invalidated {} ({} removed)", target, removed),
            removed,
        }
    }
}

/// Response body for PUT /cache/ttl
#[derive(Debug, Clone, Serialize)]
pub struct TtlResponse {
    pub message: String,
    pub ttl_ms: u64,
}

impl TtlResponse {
    pub fn new(ttl_ms: u64) -> Self {
        Self {
            message: format!("Cache TTL set to {} ms", ttl_ms),
            ttl_ms,
        }
    }
}

/// Response body for the stats endpoint (GET /cache/stats)
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    #[serde(flatten)]
    pub stats: CacheStats,
    /// Hit rate (hits / (hits + misses))
    pub hit_rate: f64,
    /// Current global TTL in milliseconds
    pub ttl_ms: u64,
    /// Keys with an upstream fetch in progress
    pub in_flight: usize,
}

impl StatsResponse {
    /// Creates a new StatsResponse from cache statistics
    pub fn new(stats: CacheStats, ttl_ms: u64, in_flight: usize) -> Self {
        Self {
            hit_rate: stats.hit_rate(),
            stats,
            ttl_ms,
            in_flight,
        }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}
