//! API routes.

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use metrics_exporter_prometheus::PrometheusHandle;

use crate::handlers::{
    create_job, get_job, health, list_jobs, next_job, queue_status, ready, report_progress, root,
};
use crate::metrics::metrics_middleware;
use crate::middleware::{
    cors_layer, rate_limit_middleware, request_id, request_logging, security_headers,
    RateLimiterCache,
};
use crate::state::AppState;

/// Create the API router.
pub fn create_router(state: AppState, metrics_handle: Option<PrometheusHandle>) -> Router {
    // `/jobs/next` is a static segment, so it wins over `/jobs/:job_id`
    let job_routes = Router::new()
        .route("/jobs", post(create_job).get(list_jobs))
        .route("/jobs/next", get(next_job))
        .route("/jobs/:job_id", get(get_job))
        .route("/jobs/:job_id/progress", post(report_progress));

    let queue_routes = Router::new().route("/queue/status", get(queue_status));

    let rate_limiter = Arc::new(RateLimiterCache::new(state.config.rate_limit_rps));

    let api_routes = Router::new()
        .merge(job_routes)
        .merge(queue_routes)
        .layer(middleware::from_fn_with_state(rate_limiter, rate_limit_middleware));

    let health_routes = Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/healthz", get(health))
        .route("/ready", get(ready));

    // Metrics endpoint (if enabled)
    let metrics_routes = if let Some(handle) = metrics_handle {
        Router::new().route("/metrics", get(move || async move { handle.render() }))
    } else {
        Router::new()
    };

    Router::new()
        .merge(api_routes)
        .merge(health_routes)
        .merge(metrics_routes)
        // Enforced by the body extractors, so oversized bodies become a JsonRejection
        .layer(DefaultBodyLimit::max(state.config.max_body_size))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(middleware::from_fn(security_headers))
        .layer(middleware::from_fn(request_logging))
        .layer(middleware::from_fn(request_id))
        .layer(cors_layer(&state.config.cors_origins))
        .with_state(state)
}
