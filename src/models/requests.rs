//! Request DTOs for the gateway's cache admin API
//!
//! Defines the structure of incoming request bodies and query strings.

use serde::Deserialize;

/// Request body for changing the global TTL (PUT /cache/ttl)
#[derive(Debug, Clone, Deserialize)]
pub struct TtlRequest {
    /// New TTL in milliseconds
    pub ttl_ms: u64,
}

/// Query for reading one cached entry (GET /cache/entry?key=...)
#[derive(Debug, Clone, Deserialize)]
pub struct EntryQuery {
    pub key: String,
}

/// Query for invalidation (DELETE /cache)
///
/// # Fields
/// - `key`: remove exactly this key
/// - `pattern`: remove every key containing this substring
///
/// Neither field clears the whole cache.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InvalidateQuery {
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default)]
    pub pattern: Option<String>,
}

/// What an invalidation request asks for, once validated
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Invalidation {
    Key(String),
    Pattern(String),
    All,
}

impl InvalidateQuery {
    /// Validates the query
    ///
    /// Returns an error message if both selectors are given or one is empty.
    pub fn validate(self) -> Result<Invalidation, String> {
        match (self.key, self.pattern) {
            (Some(_), Some(_)) => Err("Specify either key or pattern, not both".to_string()),
            (Some(key), None) if key.is_empty() => Err("Key cannot be empty".to_string()),
            (None, Some(pattern)) if pattern.is_empty() => {
                Err("Pattern cannot be empty".to_string())
            }
            (Some(key), None) => Ok(Invalidation::Key(key)),
            (None, Some(pattern)) => Ok(Invalidation::Pattern(pattern)),
            (None, None) => Ok(Invalidation::All),
        }
    }
}
