//! Configuration Module
//!
//! Handles loading and managing gateway configuration from environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Gateway configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Global cache TTL in milliseconds
    pub default_ttl_ms: u64,
    /// HTTP server port
    pub server_port: u16,
    /// Base URL of the nutrition backend, without trailing slash
    pub upstream_url: String,
    /// Per-request timeout of the upstream HTTP client, in seconds
    pub upstream_timeout_secs: u64,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `DEFAULT_TTL_MS` - Cache TTL in milliseconds (default: 300000)
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `UPSTREAM_URL` - Backend base URL (default: http://localhost:8000)
    /// - `UPSTREAM_TIMEOUT_SECS` - Upstream request timeout (default: 30)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            default_ttl_ms: parse_var("DEFAULT_TTL_MS").unwrap_or(defaults.default_ttl_ms),
            server_port: parse_var("SERVER_PORT").unwrap_or(defaults.server_port),
            upstream_url: env::var("UPSTREAM_URL")
                .ok()
                .map(|url| url.trim_end_matches('/').to_string())
                .filter(|url| !url.is_empty())
                .unwrap_or(defaults.upstream_url),
            upstream_timeout_secs: parse_var("UPSTREAM_TIMEOUT_SECS")
                .unwrap_or(defaults.upstream_timeout_secs),
        }
    }

    pub fn default_ttl(&self) -> Duration {
        Duration::from_millis(self.default_ttl_ms)
    }

    pub fn upstream_timeout(&self) -> Duration {
        Duration::from_secs(self.upstream_timeout_secs)
    }
}

fn parse_var<T: FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.parse().ok())
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_ttl_ms: 300_000,
            server_port: 3000,
            upstream_url: "http://localhost:8000".to_string(),
            upstream_timeout_secs: 30,
        }
    }
}
