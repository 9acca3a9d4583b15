//! Job submission, lookup, claiming and progress handlers.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use tracing::debug;

use vnote_models::{JobId, JobRequest, JobSnapshot, ProgressUpdate};

use crate::error::ApiResult;
use crate::metrics;
use crate::state::AppState;

/// Submit a clip request.
///
/// The job is queued immediately; the response carries its position.
pub async fn create_job(
    State(state): State<AppState>,
    payload: Result<Json<JobRequest>, JsonRejection>,
) -> ApiResult<Json<JobSnapshot>> {
    let Json(request) = payload?;
    let job = state.store.create(request).await?;

    metrics::record_job_created();
    metrics::set_queue_length(state.store.pending_len().await);

    Ok(Json(job))
}

/// List every job the service knows about.
pub async fn list_jobs(State(state): State<AppState>) -> Json<Vec<JobSnapshot>> {
    Json(state.store.list().await)
}

/// Get a job by ID.
pub async fn get_job(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> ApiResult<Json<JobSnapshot>> {
    let job = state.store.get(&JobId::from(job_id)).await?;
    Ok(Json(job))
}

/// Claim the oldest queued job for a worker.
///
/// Returns 204 with an empty body when nothing is waiting.
pub async fn next_job(State(state): State<AppState>) -> Response {
    match state.store.dequeue().await {
        Some(job) => {
            metrics::record_job_claimed();
            metrics::set_queue_length(state.store.pending_len().await);
            Json(job).into_response()
        }
        None => {
            debug!("No queued jobs");
            StatusCode::NO_CONTENT.into_response()
        }
    }
}

/// Record a worker's stage change for a job.
pub async fn report_progress(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
    payload: Result<Json<ProgressUpdate>, JsonRejection>,
) -> ApiResult<Json<JobSnapshot>> {
    let Json(update) = payload?;
    let job_id = JobId::from(job_id);
    let stage = update.stage;

    let job = state.store.update(&job_id, update).await?;

    if stage.is_terminal() {
        metrics::record_job_finished(stage);
    }
    metrics::set_queue_length(state.store.pending_len().await);

    Ok(Json(job))
}
