//! Download submission and progress handlers.

use super::{SubmitRequest, SubmitResponse};
use crate::api::AppState;
use crate::error::Error;
use crate::types::{JobId, JobSnapshot};
use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
};

/// POST /download - Submit a URL for download
///
/// Resolves metadata synchronously; the download itself runs in the
/// background.
#[utoipa::path(
    post,
    path = "/download",
    tag = "downloads",
    request_body = SubmitRequest,
    responses(
        (status = 200, description = "Job created", body = SubmitResponse),
        (status = 400, description = "Missing URL or metadata resolution failed", body = crate::error::ApiError),
        (status = 503, description = "Shutting down", body = crate::error::ApiError)
    )
)]
pub async fn submit_download(
    State(state): State<AppState>,
    payload: Result<Json<SubmitRequest>, JsonRejection>,
) -> Result<Json<SubmitResponse>, Error> {
    let Json(request) = payload?;

    // a missing URL is rejected by submit like an empty one
    let url = request.url.unwrap_or_default();
    let video_id = state.downloader.submit(&url).await?;

    Ok(Json(SubmitResponse { video_id }))
}

/// GET /progress/:video_id - Poll a job
#[utoipa::path(
    get,
    path = "/progress/{video_id}",
    tag = "downloads",
    params(
        ("video_id" = String, Path, description = "Identifier returned by POST /download")
    ),
    responses(
        (status = 200, description = "Current job state", body = JobSnapshot),
        (status = 404, description = "Download not found", body = crate::error::ApiError)
    )
)]
pub async fn get_progress(
    State(state): State<AppState>,
    Path(video_id): Path<String>,
) -> Result<Json<JobSnapshot>, Error> {
    let snapshot = state.downloader.get_job(&JobId::from(video_id)).await?;
    Ok(Json(snapshot))
}

/// GET /completed - Completed jobs in submission order
#[utoipa::path(
    get,
    path = "/completed",
    tag = "downloads",
    responses(
        (status = 200, description = "Completed jobs", body = Vec<JobSnapshot>)
    )
)]
pub async fn list_completed(State(state): State<AppState>) -> Json<Vec<JobSnapshot>> {
    Json(state.downloader.completed_jobs().await)
}
