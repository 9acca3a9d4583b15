//! Health check handlers.

use axum::extract::State;
use axum::Json;
use chrono::Utc;
use serde::Serialize;

use crate::state::AppState;

/// Root response.
#[derive(Serialize)]
pub struct StatusResponse {
    pub status: String,
}

/// Root endpoint.
pub async fn root() -> Json<StatusResponse> {
    Json(StatusResponse {
        status: "ok".to_string(),
    })
}

/// Health response.
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: String,
}

/// Health check endpoint (liveness probe).
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now().to_rfc3339(),
    })
}

/// Readiness check response.
#[derive(Serialize)]
pub struct ReadinessResponse {
    pub status: String,
    pub jobs: usize,
    pub pending: usize,
}

/// Readiness check endpoint (readiness probe).
///
/// The store lives in process, so being able to take its lock is enough.
pub async fn ready(State(state): State<AppState>) -> Json<ReadinessResponse> {
    let stats = state.store.stats().await;
    Json(ReadinessResponse {
        status: "ready".to_string(),
        jobs: stats.total,
        pending: stats.pending,
    })
}
