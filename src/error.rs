//! Error types for media-dl
//!
//! This module provides the error handling for the library, including:
//! - The domain error taxonomy (resolution, not found, duplicate job, etc.)
//! - HTTP status code mapping for API integration
//! - Structured error responses with machine-readable error codes

use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// Result type alias for media-dl operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for media-dl
///
/// Resolution and validation failures are surfaced synchronously to whoever
/// called [`submit`](crate::MediaDownloader::submit). Errors raised while a
/// download runs never reach a caller; the worker records them in the job's
/// `error` field instead.
#[derive(Debug, Error)]
pub enum Error {
    /// Metadata lookup failed; the job was never created
    #[error("{0}")]
    Resolution(String),

    /// The request itself is malformed (e.g. missing URL)
    #[error("{0}")]
    Validation(String),

    /// Unknown job identifier
    #[error("download not found: {0}")]
    NotFound(String),

    /// A job with this identifier already exists.
    ///
    /// Identifiers come from an atomic counter, so this signals a programming
    /// error rather than a client mistake.
    #[error("duplicate job identifier: {0}")]
    DuplicateJob(String),

    /// The extractor failed while downloading
    #[error("extractor error: {0}")]
    Extractor(String),

    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "download_dir")
        key: Option<String>,
    },

    /// Shutdown in progress - not accepting new downloads
    #[error("shutdown in progress: not accepting new downloads")]
    ShuttingDown,

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// API server error
    #[error("API server error: {0}")]
    ApiServerError(String),

    /// Operation not supported (missing binary, etc.)
    #[error("not supported: {0}")]
    NotSupported(String),
}

/// API error response format
///
/// Returned by API endpoints when an error occurs. `detail` carries the
/// human-readable message, `code` a machine-readable error code.
///
/// # Example JSON Response
///
/// ```json
/// {
///   "detail": "Download not found",
///   "code": "not_found"
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApiError {
    /// Human-readable error message
    pub detail: String,

    /// Machine-readable error code (e.g., "not_found", "resolution_failed")
    pub code: String,
}

/// Convert errors to HTTP status codes for API responses
pub trait ToHttpStatus {
    /// Get the HTTP status code for this error
    fn status_code(&self) -> u16;

    /// Get the machine-readable error code
    fn error_code(&self) -> &str;
}

impl ToHttpStatus for Error {
    fn status_code(&self) -> u16 {
        match self {
            // 400 Bad Request - Client error (invalid input)
            Error::Resolution(_) => 400,
            Error::Validation(_) => 400,
            Error::Config { .. } => 400,

            // 404 Not Found
            Error::NotFound(_) => 404,

            // 500 Internal Server Error - Server-side issues
            Error::DuplicateJob(_) => 500,
            Error::Io(_) => 500,
            Error::ApiServerError(_) => 500,

            // 501 Not Implemented - Feature not supported
            Error::NotSupported(_) => 501,

            // 502 Bad Gateway - External tool errors
            Error::Extractor(_) => 502,

            // 503 Service Unavailable
            Error::ShuttingDown => 503,
        }
    }

    fn error_code(&self) -> &str {
        match self {
            Error::Resolution(_) => "resolution_failed",
            Error::Validation(_) => "validation_error",
            Error::NotFound(_) => "not_found",
            Error::DuplicateJob(_) => "duplicate_job",
            Error::Extractor(_) => "extractor_error",
            Error::Config { .. } => "config_error",
            Error::ShuttingDown => "shutting_down",
            Error::Io(_) => "io_error",
            Error::ApiServerError(_) => "api_server_error",
            Error::NotSupported(_) => "not_supported",
        }
    }
}

impl From<Error> for ApiError {
    fn from(error: Error) -> Self {
        let code = error.error_code().to_string();

        // Pollers match on this exact text, so it does not carry the id
        let detail = match &error {
            Error::NotFound(_) => "Download not found".to_string(),
            other => other.to_string(),
        };

        ApiError { detail, code }
    }
}
