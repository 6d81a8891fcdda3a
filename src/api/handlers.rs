//! API Handlers
//!
//! HTTP request handlers for the cache admin endpoints and the `/api` proxy.

use std::time::Duration;

use axum::{
    body::Bytes,
    extract::{Path, Query, RawQuery, State},
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::Value;
use tracing::info;

use crate::cache::{duration_ms, ResponseCache};
use crate::config::Config;
use crate::error::{CacheError, Result};
use crate::keys::{cache_key, invalidate_for_mutation};
use crate::models::{
    EntryQuery, EntryResponse, HealthResponse, InvalidateQuery, InvalidateResponse, Invalidation,
    StatsResponse, TtlRequest, TtlResponse,
};
use crate::upstream::UpstreamClient;

/// Cache of decoded upstream JSON bodies, keyed by upstream path and query.
pub type GatewayCache = ResponseCache<Value, CacheError>;

/// Application state shared across all handlers.
///
/// Holds the gateway's one cache; every handler sees the same instance.
#[derive(Clone)]
pub struct AppState {
    pub cache: GatewayCache,
    pub upstream: UpstreamClient,
}

impl AppState {
    /// Creates a new AppState from a cache and an upstream client.
    pub fn new(cache: GatewayCache, upstream: UpstreamClient) -> Self {
        Self { cache, upstream }
    }

    /// Creates a new AppState from configuration.
    pub fn from_config(config: &Config) -> Result<Self> {
        let cache = ResponseCache::new(config.default_ttl());
        let upstream = UpstreamClient::from_config(config)?;
        Ok(Self::new(cache, upstream))
    }
}

/// Handler for GET /api/*path
///
/// Serves the upstream resource through the cache. Concurrent requests for
/// the same path and query share a single upstream call.
pub async fn read_through_handler(
    State(state): State<AppState>,
    Path(path): Path<String>,
    RawQuery(query): RawQuery,
) -> Result<Json<Value>> {
    let key = cache_key(&format!("/{}", path), query.as_deref());

    let upstream = state.upstream.clone();
    let target = key.clone();
    let value = state
        .cache
        .fetch(&key, move || async move { upstream.get_json(&target).await }, None)
        .await?;

    Ok(Json(value))
}

/// Handler for POST/PUT/PATCH/DELETE /api/*path
///
/// Forwards the mutation and, once the upstream accepts it, evicts the
/// cached reads of the affected resource.
pub async fn forward_handler(
    State(state): State<AppState>,
    method: Method,
    Path(path): Path<String>,
    RawQuery(query): RawQuery,
    body: Bytes,
) -> Result<Response> {
    let path = format!("/{}", path);
    let target = cache_key(&path, query.as_deref());

    let body = if body.is_empty() {
        None
    } else {
        Some(
            serde_json::from_slice(&body)
                .map_err(|e| CacheError::InvalidRequest(format!("Body is not valid JSON: {}", e)))?,
        )
    };

    let (status, value) = state.upstream.send(method.clone(), &target, body).await?;

    let removed = invalidate_for_mutation(&state.cache, &path).await;
    info!(%method, %path, removed, "mutation forwarded");

    if status == StatusCode::NO_CONTENT {
        return Ok(status.into_response());
    }
    Ok((status, Json(value)).into_response())
}

/// Handler for GET /cache/entry?key=...
pub async fn entry_handler(
    State(state): State<AppState>,
    Query(query): Query<EntryQuery>,
) -> Result<Json<EntryResponse>> {
    let (value, remaining) = state
        .cache
        .get_with_remaining(&query.key)
        .await
        .ok_or_else(|| CacheError::NotFound(query.key.clone()))?;

    Ok(Json(EntryResponse::new(query.key, value, duration_ms(remaining))))
}

/// Handler for DELETE /cache
///
/// `?key=` removes one key, `?pattern=` removes by substring, no query clears everything.
pub async fn invalidate_handler(
    State(state): State<AppState>,
    Query(query): Query<InvalidateQuery>,
) -> Result<Json<InvalidateResponse>> {
    let invalidation = query.validate().map_err(CacheError::InvalidRequest)?;

    let response = match invalidation {
        Invalidation::Key(key) => {
            let removed = usize::from(state.cache.invalidate(&key).await);
            InvalidateResponse::new(format!("key '{}'", key), removed)
        }
        Invalidation::Pattern(pattern) => {
            let removed = state.cache.invalidate_pattern(&pattern).await;
            InvalidateResponse::new(format!("pattern '{}'", pattern), removed)
        }
        Invalidation::All => InvalidateResponse::new("all entries", state.cache.clear().await),
    };

    Ok(Json(response))
}

/// Handler for PUT /cache/ttl
pub async fn ttl_handler(
    State(state): State<AppState>,
    Json(req): Json<TtlRequest>,
) -> Json<TtlResponse> {
    state.cache.set_ttl(Duration::from_millis(req.ttl_ms)).await;
    Json(TtlResponse::new(req.ttl_ms))
}

/// Handler for GET /cache/stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    let stats = state.cache.stats().await;
    let ttl_ms = duration_ms(state.cache.ttl().await);
    let in_flight = state.cache.in_flight().await;

    Json(StatsResponse::new(stats, ttl_ms, in_flight))
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
