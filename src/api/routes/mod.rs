//! Route handlers for the REST API
//!
//! Handlers are organized by domain:
//! - [`downloads`] - Submission, progress polling and completed listing
//! - [`gallery`] - HTML page of completed downloads
//! - [`system`] - Health, events, OpenAPI

use serde::{Deserialize, Serialize};

mod downloads;
mod gallery;
mod system;

// Re-export all handlers so `routes::function_name` continues to work
pub use downloads::*;
pub use gallery::*;
pub use system::*;

// ============================================================================
// Request/Response Types (shared across handlers)
// ============================================================================

/// Request body for POST /download
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct SubmitRequest {
    /// Media page URL (short links are accepted)
    #[serde(default)]
    pub url: Option<String>,
}

/// Response body for POST /download
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct SubmitResponse {
    /// Identifier to poll with GET /progress/{video_id}
    pub video_id: crate::types::JobId,
}

/// Response body for GET /health
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct HealthResponse {
    /// Always "ok" while the server answers
    pub status: String,
    /// Crate version
    pub version: String,
    /// Name of the extraction backend
    pub extractor: String,
    /// Whether the backend can download anything
    pub extractor_available: bool,
    /// Whether new submissions are accepted
    pub accepting: bool,
    /// Number of jobs known to the registry
    pub jobs: usize,
    /// Number of workers still running
    pub active_workers: usize,
}
