//! OpenAPI documentation and schema generation
//!
//! This module defines the OpenAPI specification for the media-dl REST API
//! using utoipa for compile-time spec generation.

use utoipa::OpenApi;

/// OpenAPI documentation for the media-dl REST API
///
/// The spec is served as JSON from `/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "media-dl REST API",
        version = "0.1.0",
        description = "Submit media URLs for background download and poll their progress",
        license(
            name = "MIT OR Apache-2.0"
        )
    ),
    servers(
        (url = "http://localhost:8000", description = "Local development server")
    ),
    paths(
        // Downloads
        crate::api::routes::submit_download,
        crate::api::routes::get_progress,
        crate::api::routes::list_completed,

        // Gallery
        crate::api::routes::gallery,

        // System
        crate::api::routes::health_check,
        crate::api::routes::openapi_spec,
        crate::api::routes::event_stream,
    ),
    components(
        schemas(
            crate::api::routes::SubmitRequest,
            crate::api::routes::SubmitResponse,
            crate::api::routes::HealthResponse,
            crate::types::JobId,
            crate::types::JobStatus,
            crate::types::JobSnapshot,
            crate::types::VideoMetadata,
            crate::types::Event,
            crate::error::ApiError,
        )
    ),
    tags(
        (name = "downloads", description = "Submit downloads and poll their progress"),
        (name = "gallery", description = "HTML listing of completed downloads"),
        (name = "system", description = "Health, OpenAPI and event stream"),
    )
)]
pub struct ApiDoc;

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_lists_every_route() {
        let doc = ApiDoc::openapi();
        let paths: Vec<&String> = doc.paths.paths.keys().collect();

        for expected in [
            "/download",
            "/progress/{video_id}",
            "/completed",
            "/",
            "/health",
            "/openapi.json",
            "/events",
        ] {
            assert!(
                paths.iter().any(|p| p.as_str() == expected),
                "missing path {expected}, have {paths:?}"
            );
        }
    }

    #[test]
    fn test_openapi_serializes() {
        let json = serde_json::to_value(ApiDoc::openapi()).unwrap();
        assert_eq!(json["info"]["title"], "media-dl REST API");
        assert!(json["components"]["schemas"]["JobSnapshot"].is_object());
    }
}
