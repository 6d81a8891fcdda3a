//! Upstream Client
//!
//! Thin reqwest wrapper for the nutrition backend the gateway fronts.
//! Paths and payloads are forwarded opaquely.

use axum::http::{Method, StatusCode};
use reqwest::Client;
use serde_json::Value;
use tracing::debug;

use crate::config::Config;
use crate::error::{CacheError, Result};

/// HTTP client bound to one backend base URL.
#[derive(Debug, Clone)]
pub struct UpstreamClient {
    client: Client,
    base_url: String,
}

impl UpstreamClient {
    /// Creates a client for `base_url` using the configured timeout.
    pub fn from_config(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.upstream_timeout())
            .build()
            .map_err(|e| CacheError::Internal(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self::new(client, &config.upstream_url))
    }

    pub fn new(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    // == GET ==
    /// Fetches `path_and_query` and decodes the body as JSON.
    pub async fn get_json(&self, path_and_query: &str) -> Result<Value> {
        let (_, body) = self.send(Method::GET, path_and_query, None).await?;
        Ok(body)
    }

    // == Send ==
    /// Sends a request and returns the upstream status with its JSON body.
    ///
    /// Non-success statuses become `CacheError::UpstreamStatus`. An empty
    /// body decodes as `null`.
    pub async fn send(
        &self,
        method: Method,
        path_and_query: &str,
        body: Option<Value>,
    ) -> Result<(StatusCode, Value)> {
        let url = format!("{}{}", self.base_url, path_and_query);
        debug!(%method, %url, "forwarding upstream");

        let mut request = self.client.request(method, &url);
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request.send().await?;
        let status = response.status();
        let bytes = response.bytes().await?;

        if !status.is_success() {
            return Err(CacheError::UpstreamStatus {
                status: status.as_u16(),
                body: String::from_utf8_lossy(&bytes).into_owned(),
            });
        }

        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .map_err(|e| CacheError::Upstream(format!("invalid JSON from upstream: {}", e)))?
        };

        Ok((status, body))
    }
}
