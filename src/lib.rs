//! Nutri Cache - A read-through caching gateway for the nutrition tracking backend
//!
//! Provides a TTL response cache that coalesces concurrent fetches of the
//! same key, and an HTTP gateway that serves backend reads through it.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod keys;
pub mod models;
pub mod upstream;

pub use api::AppState;
pub use cache::ResponseCache;
pub use config::Config;
pub use error::CacheError;
