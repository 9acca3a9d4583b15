//! Prometheus metrics for the API server.

use std::time::Instant;

use axum::body::Body;
use axum::http::{Request, Response};
use axum::middleware::Next;
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use vnote_models::Stage;

/// Initialize the Prometheus metrics recorder.
/// Returns a handle that can be used to render metrics.
pub fn init_metrics() -> Result<PrometheusHandle, BuildError> {
    PrometheusBuilder::new().install_recorder()
}

/// Metric names as constants for consistency.
pub mod names {
    // HTTP metrics
    pub const HTTP_REQUESTS_TOTAL: &str = "vnote_http_requests_total";
    pub const HTTP_REQUEST_DURATION_SECONDS: &str = "vnote_http_request_duration_seconds";
    pub const HTTP_REQUESTS_IN_FLIGHT: &str = "vnote_http_requests_in_flight";

    // Queue metrics
    pub const QUEUE_LENGTH: &str = "vnote_queue_length";
    pub const JOBS_CREATED_TOTAL: &str = "vnote_jobs_created_total";
    pub const JOBS_CLAIMED_TOTAL: &str = "vnote_jobs_claimed_total";
    pub const JOBS_FINISHED_TOTAL: &str = "vnote_jobs_finished_total";

    // Rate limiting metrics
    pub const RATE_LIMIT_HITS_TOTAL: &str = "vnote_rate_limit_hits_total";
}

/// Record an HTTP request.
pub fn record_http_request(method: &str, path: &str, status: u16, duration_secs: f64) {
    let labels = [
        ("method", method.to_string()),
        ("path", sanitize_path(path)),
        ("status", status.to_string()),
    ];

    counter!(names::HTTP_REQUESTS_TOTAL, &labels).increment(1);
    histogram!(names::HTTP_REQUEST_DURATION_SECONDS, &labels).record(duration_secs);
}

/// Update queue length gauge.
pub fn set_queue_length(length: usize) {
    gauge!(names::QUEUE_LENGTH).set(length as f64);
}

/// Record job accepted into the queue.
pub fn record_job_created() {
    counter!(names::JOBS_CREATED_TOTAL).increment(1);
}

/// Record job handed to a worker.
pub fn record_job_claimed() {
    counter!(names::JOBS_CLAIMED_TOTAL).increment(1);
}

/// Record job reaching `done` or `failed`.
pub fn record_job_finished(stage: Stage) {
    let labels = [("stage", stage.as_str().to_string())];
    counter!(names::JOBS_FINISHED_TOTAL, &labels).increment(1);
}

/// Record rate limit hit.
pub fn record_rate_limit_hit(endpoint: &str) {
    let labels = [("endpoint", sanitize_path(endpoint))];
    counter!(names::RATE_LIMIT_HITS_TOTAL, &labels).increment(1);
}

/// Sanitize path for metrics labels (remove IDs, etc.).
fn sanitize_path(path: &str) -> String {
    let mut previous = "";
    let segments: Vec<&str> = path
        .split('/')
        .map(|segment| {
            let replaced = if uuid::Uuid::parse_str(segment).is_ok()
                || (!segment.is_empty() && segment.bytes().all(|b| b.is_ascii_digit()))
            {
                ":id"
            } else if previous == "jobs" && !segment.is_empty() && segment != "next" {
                ":job_id"
            } else {
                segment
            };
            previous = segment;
            replaced
        })
        .collect();
    segments.join("/")
}

/// Metrics middleware for HTTP requests.
pub async fn metrics_middleware(request: Request<Body>, next: Next) -> Response<Body> {
    let method = request.method().to_string();
    let path = request.uri().path().to_string();
    let start = Instant::now();

    gauge!(names::HTTP_REQUESTS_IN_FLIGHT).increment(1.0);

    let response = next.run(request).await;

    gauge!(names::HTTP_REQUESTS_IN_FLIGHT).decrement(1.0);

    let status = response.status().as_u16();
    let duration = start.elapsed().as_secs_f64();

    record_http_request(&method, &path, status, duration);

    response
}
