//! Request and Response models for the gateway's cache admin API
//!
//! This module defines the DTOs (Data Transfer Objects) used for
//! serializing/deserializing HTTP request and response bodies.
//! Proxied `/api` payloads are passed through as raw JSON and have no DTOs.

pub mod requests;
pub mod responses;

// Re-export commonly used types
pub use requests::{EntryQuery, InvalidateQuery, Invalidation, TtlRequest};
pub use responses::{
    EntryResponse, HealthResponse, InvalidateResponse, StatsResponse, TtlResponse,
};
