//! API Routes
//!
//! Configures the Axum router with the proxy and cache admin endpoints.

use axum::{
    routing::{delete, get, put},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    entry_handler, forward_handler, health_handler, invalidate_handler, read_through_handler,
    stats_handler, ttl_handler, AppState,
};

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `GET /api/*path` - Read through the cache
/// - `POST|PUT|PATCH|DELETE /api/*path` - Forward, then invalidate
/// - `GET /cache/entry?key=` - Inspect one cached entry
/// - `DELETE /cache` - Invalidate by `key`, by `pattern`, or everything
/// - `PUT /cache/ttl` - Change the global TTL
/// - `GET /cache/stats` - Cache statistics
/// - `GET /health` - Health check endpoint
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route(
            "/api/*path",
            get(read_through_handler)
                .post(forward_handler)
                .put(forward_handler)
                .patch(forward_handler)
                .delete(forward_handler),
        )
        .route("/cache", delete(invalidate_handler))
        .route("/cache/entry", get(entry_handler))
        .route("/cache/ttl", put(ttl_handler))
        .route("/cache/stats", get(stats_handler))
        .route("/health", get(health_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
