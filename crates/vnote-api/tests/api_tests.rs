//! HTTP contract tests driving the router in process.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use vnote_api::{create_router, ApiConfig, AppState};
use vnote_queue::{JobStore, StoreConfig};

fn test_router() -> Router {
    router_with(ApiConfig::default(), StoreConfig::default())
}

fn router_with(config: ApiConfig, store_config: StoreConfig) -> Router {
    create_router(AppState::new(config, JobStore::new(store_config)), None)
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

fn clip(file: &str, start: f64, end: f64) -> Value {
    json!({"telegram_file_id": file, "start": start, "end": end})
}

#[tokio::test]
async fn test_root_and_health() {
    let app = test_router();

    let (status, body) = send(&app, "GET", "/", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "ok"}));

    let (status, body) = send(&app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");

    let (status, body) = send(&app, "GET", "/ready", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ready");
}

#[tokio::test]
async fn test_full_job_lifecycle() {
    let app = test_router();

    let (status, created) = send(&app, "POST", "/jobs", Some(clip("file-1", 0.0, 10.0))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(created["stage"], "queued");
    assert_eq!(created["position"], 1);
    assert_eq!(created["payload"]["telegram_file_id"], "file-1");
    assert_eq!(created["payload"]["mute"], false);
    let job_id = created["job_id"].as_str().unwrap().to_string();

    let (status, claimed) = send(&app, "GET", "/jobs/next", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(claimed["job_id"], job_id.as_str());
    assert_eq!(claimed["stage"], "processing");
    assert!(claimed["position"].is_null());

    let (status, done) = send(
        &app,
        "POST",
        &format!("/jobs/{job_id}/progress"),
        Some(json!({"stage": "done", "result_file_id": "local://x.mp4"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(done["stage"], "done");
    assert_eq!(done["result_file_id"], "local://x.mp4");

    let (status, fetched) = send(&app, "GET", &format!("/jobs/{job_id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["stage"], "done");
    assert_eq!(fetched["result_file_id"], "local://x.mp4");
    assert!(fetched["position"].is_null());
}

#[tokio::test]
async fn test_positions_shift_after_claim() {
    let app = test_router();

    let (_, first) = send(&app, "POST", "/jobs", Some(clip("a", 0.0, 5.0))).await;
    let (_, second) = send(&app, "POST", "/jobs", Some(clip("b", 0.0, 5.0))).await;
    assert_eq!(first["position"], 1);
    assert_eq!(second["position"], 2);

    let (_, claimed) = send(&app, "GET", "/jobs/next", None).await;
    assert_eq!(claimed["job_id"], first["job_id"]);

    let second_id = second["job_id"].as_str().unwrap();
    let (_, second) = send(&app, "GET", &format!("/jobs/{second_id}"), None).await;
    assert_eq!(second["position"], 1);
}

#[tokio::test]
async fn test_clip_longer_than_limit_is_rejected() {
    let app = test_router();

    let (status, body) = send(&app, "POST", "/jobs", Some(clip("file-1", 0.0, 120.0))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["detail"].is_string());

    let (_, jobs) = send(&app, "GET", "/jobs", None).await;
    assert_eq!(jobs, json!([]));
}

#[tokio::test]
async fn test_inverted_range_and_malformed_body_are_rejected() {
    let app = test_router();

    let (status, _) = send(&app, "POST", "/jobs", Some(clip("file-1", 10.0, 5.0))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, body) = send(&app, "POST", "/jobs", Some(json!({"start": 0, "end": 5}))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["detail"].is_string());
}

#[tokio::test]
async fn test_next_on_empty_queue_returns_no_content() {
    let app = test_router();

    let (status, body) = send(&app, "GET", "/jobs/next", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(body.is_null());
}

#[tokio::test]
async fn test_unknown_job_returns_not_found() {
    let app = test_router();

    let (status, body) = send(&app, "GET", "/jobs/does-not-exist", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["detail"], "Job not found");

    let (status, _) = send(
        &app,
        "POST",
        "/jobs/does-not-exist/progress",
        Some(json!({"stage": "processing"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_unknown_stage_is_rejected() {
    let app = test_router();
    let (_, created) = send(&app, "POST", "/jobs", Some(clip("file-1", 0.0, 10.0))).await;
    let job_id = created["job_id"].as_str().unwrap();

    let (status, _) = send(
        &app,
        "POST",
        &format!("/jobs/{job_id}/progress"),
        Some(json!({"stage": "paused"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (_, job) = send(&app, "GET", &format!("/jobs/{job_id}"), None).await;
    assert_eq!(job["stage"], "queued");
}

#[tokio::test]
async fn test_requeue_goes_to_the_tail() {
    let app = test_router();
    let (_, first) = send(&app, "POST", "/jobs", Some(clip("a", 0.0, 5.0))).await;
    let (_, second) = send(&app, "POST", "/jobs", Some(clip("b", 0.0, 5.0))).await;

    let (_, claimed) = send(&app, "GET", "/jobs/next", None).await;
    let first_id = first["job_id"].as_str().unwrap();
    assert_eq!(claimed["job_id"], first_id);

    let (status, requeued) = send(
        &app,
        "POST",
        &format!("/jobs/{first_id}/progress"),
        Some(json!({"stage": "queued"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(requeued["position"], 2);

    let (_, next) = send(&app, "GET", "/jobs/next", None).await;
    assert_eq!(next["job_id"], second["job_id"]);
    let (_, next) = send(&app, "GET", "/jobs/next", None).await;
    assert_eq!(next["job_id"], first_id);
}

#[tokio::test]
async fn test_terminal_updates_rejected_when_configured() {
    let app = router_with(
        ApiConfig::default(),
        StoreConfig {
            reject_terminal_updates: true,
        },
    );
    let (_, created) = send(&app, "POST", "/jobs", Some(clip("a", 0.0, 5.0))).await;
    let job_id = created["job_id"].as_str().unwrap();
    let uri = format!("/jobs/{job_id}/progress");

    let (status, _) = send(&app, "POST", &uri, Some(json!({"stage": "failed", "detail": "boom"}))).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&app, "POST", &uri, Some(json!({"stage": "processing"}))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["detail"].is_string());
}

#[tokio::test]
async fn test_queue_status_counts_stages() {
    let app = test_router();
    send(&app, "POST", "/jobs", Some(clip("a", 0.0, 5.0))).await;
    send(&app, "POST", "/jobs", Some(clip("b", 0.0, 5.0))).await;
    send(&app, "GET", "/jobs/next", None).await;

    let (status, body) = send(&app, "GET", "/queue/status", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["pending"], 1);
    assert_eq!(body["total"], 2);
    assert_eq!(body["by_stage"]["queued"], 1);
    assert_eq!(body["by_stage"]["processing"], 1);
    assert_eq!(body["by_stage"]["done"], 0);
}

#[tokio::test]
async fn test_security_and_request_id_headers() {
    let app = test_router();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .header("x-request-id", "abc-123")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    let headers = response.headers();
    assert_eq!(headers.get("x-content-type-options").unwrap(), "nosniff");
    assert_eq!(headers.get("x-frame-options").unwrap(), "DENY");
    assert_eq!(headers.get("x-request-id").unwrap(), "abc-123");
}

#[tokio::test]
async fn test_rate_limit_applies_per_client() {
    let app = router_with(
        ApiConfig {
            rate_limit_rps: 2,
            ..ApiConfig::default()
        },
        StoreConfig::default(),
    );

    let request = |ip: &str| {
        Request::builder()
            .uri("/queue/status")
            .header("x-forwarded-for", ip)
            .body(Body::empty())
            .unwrap()
    };

    let mut statuses = Vec::new();
    for _ in 0..3 {
        let response = app.clone().oneshot(request("203.0.113.9")).await.unwrap();
        statuses.push(response.status());
    }
    assert_eq!(statuses[..2], [StatusCode::OK, StatusCode::OK]);
    assert_eq!(statuses[2], StatusCode::TOO_MANY_REQUESTS);

    let other = app.clone().oneshot(request("203.0.113.10")).await.unwrap();
    assert_eq!(other.status(), StatusCode::OK);

    // Probes are not limited
    let health = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .header("x-forwarded-for", "203.0.113.9")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(health.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_oversized_body_is_rejected() {
    let app = router_with(
        ApiConfig {
            max_body_size: 128,
            ..ApiConfig::default()
        },
        StoreConfig::default(),
    );

    let padding = "x".repeat(512);
    let (status, body) = send(&app, "POST", "/jobs", Some(clip(&padding, 0.0, 5.0))).await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert!(body["detail"].is_string());
}

#[tokio::test]
async fn test_oversized_body_with_content_length_gets_detail() {
    let app = router_with(
        ApiConfig {
            max_body_size: 128,
            ..ApiConfig::default()
        },
        StoreConfig::default(),
    );

    let payload = clip(&"x".repeat(512), 0.0, 5.0).to_string();
    let request = Request::builder()
        .method("POST")
        .uri("/jobs")
        .header("content-type", "application/json")
        .header("content-length", payload.len())
        .body(Body::from(payload))
        .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(response.headers()["content-type"], "application/json");
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert!(body["detail"].is_string());

    let (status, body) = send(&app, "GET", "/jobs", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
}
