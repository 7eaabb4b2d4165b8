//! API response body types.
//!
//! Successful responses are the bare JSON payloads (records, lists of
//! records, aggregates). Failures use [`ErrorDetail`].

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

/// Error body returned by every failing endpoint.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorDetail {
    /// Human-readable error message.
    pub detail: String,
}

impl ErrorDetail {
    /// Creates an error body from a message.
    pub fn new(detail: impl Into<String>) -> Self {
        Self {
            detail: detail.into(),
        }
    }
}

/// Health check body.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Service status.
    pub status: String,
    /// Service name.
    pub service: String,
    /// Service version.
    pub version: String,
    /// Time the response was produced.
    pub timestamp: DateTime<Utc>,
}

impl HealthResponse {
    /// A healthy status for `service` at `version`.
    pub fn healthy(service: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            status: "healthy".to_string(),
            service: service.into(),
            version: version.into(),
            timestamp: Utc::now(),
        }
    }
}
