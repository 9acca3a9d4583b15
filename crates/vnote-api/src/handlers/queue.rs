//! Queue overview handler.

use axum::extract::State;
use axum::Json;

use vnote_queue::QueueStats;

use crate::state::AppState;

/// Pending count, total count and a per-stage breakdown.
pub async fn queue_status(State(state): State<AppState>) -> Json<QueueStats> {
    Json(state.store.stats().await)
}
