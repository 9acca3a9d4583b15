//! API middleware.

use std::net::{IpAddr, SocketAddr};
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::body::Body;
use axum::extract::{ConnectInfo, State};
use axum::http::{header, HeaderName, HeaderValue, Method, Request, Response};
use axum::middleware::Next;
use axum::response::IntoResponse;
use governor::{DefaultKeyedRateLimiter, Quota, RateLimiter};
use tower_http::cors::{Any, CorsLayer};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::ApiError;
use crate::metrics;

/// Request ID header, echoed back on every response.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Prune idle limiter entries once the map grows past this many clients.
const MAX_RATE_LIMITER_ENTRIES: usize = 10_000;

/// Request ID attached to request extensions by [`request_id`].
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

/// Per-IP rate limiter.
pub struct RateLimiterCache {
    limiter: DefaultKeyedRateLimiter<IpAddr>,
}

impl RateLimiterCache {
    /// Create a limiter allowing `requests_per_second` per client, with an
    /// equal burst.
    pub fn new(requests_per_second: u32) -> Self {
        let rps = NonZeroU32::new(requests_per_second).unwrap_or(NonZeroU32::MIN);
        Self {
            limiter: RateLimiter::keyed(Quota::per_second(rps)),
        }
    }

    /// Check rate limit for an IP.
    pub fn check(&self, ip: IpAddr) -> bool {
        if self.limiter.len() > MAX_RATE_LIMITER_ENTRIES {
            self.limiter.retain_recent();
            self.limiter.shrink_to_fit();
            debug!(entries = self.limiter.len(), "Pruned rate limiter entries");
        }
        self.limiter.check_key(&ip).is_ok()
    }
}

/// Create CORS layer.
pub fn cors_layer(origins: &[String]) -> CorsLayer {
    let max_age = Duration::from_secs(600);

    if origins.iter().any(|o| o == "*") {
        CorsLayer::new()
            .allow_methods(Any)
            .allow_headers(Any)
            .allow_origin(Any)
            .max_age(max_age)
    } else {
        let origins: Vec<HeaderValue> = origins.iter().filter_map(|o| o.parse().ok()).collect();

        CorsLayer::new()
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers([header::CONTENT_TYPE, header::ACCEPT, header::ORIGIN])
            .expose_headers([HeaderName::from_static(REQUEST_ID_HEADER)])
            .allow_origin(origins)
            .max_age(max_age)
    }
}

/// Security headers middleware.
pub async fn security_headers(request: Request<Body>, next: Next) -> Response<Body> {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();

    headers.insert(
        header::X_CONTENT_TYPE_OPTIONS,
        HeaderValue::from_static("nosniff"),
    );
    headers.insert(header::X_FRAME_OPTIONS, HeaderValue::from_static("DENY"));
    headers.insert(
        header::REFERRER_POLICY,
        HeaderValue::from_static("no-referrer"),
    );
    headers.insert(
        HeaderName::from_static("cross-origin-resource-policy"),
        HeaderValue::from_static("same-origin"),
    );
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));

    response
}

/// Request ID middleware.
pub async fn request_id(mut request: Request<Body>, next: Next) -> Response<Body> {
    let request_id = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|s| !s.is_empty() && s.len() <= 128)
        .map(|s| s.to_string())
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    request.extensions_mut().insert(RequestId(request_id.clone()));

    let mut response = next.run(request).await;

    if let Ok(header_value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, header_value);
    }

    response
}

/// Request logging middleware.
pub async fn request_logging(request: Request<Body>, next: Next) -> Response<Body> {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let request_id = request
        .extensions()
        .get::<RequestId>()
        .map(|id| id.0.clone())
        .unwrap_or_default();
    let start = Instant::now();

    let response = next.run(request).await;

    let status = response.status();
    let duration = start.elapsed();

    // Probes and worker polling would drown everything else
    let quiet = matches!(uri.path(), "/" | "/health" | "/healthz" | "/ready" | "/metrics")
        || (uri.path() == "/jobs/next" && status.as_u16() == 204);

    if quiet {
        debug!(method = %method, uri = %uri, status = %status, "Request completed");
    } else {
        info!(
            request_id = %request_id,
            method = %method,
            uri = %uri,
            status = %status,
            duration_ms = %duration.as_millis(),
            "Request completed"
        );
    }

    response
}

/// Rate limiting middleware using IP-based rate limiter.
pub async fn rate_limit_middleware(
    State(rate_limiter): State<Arc<RateLimiterCache>>,
    request: Request<Body>,
    next: Next,
) -> Response<Body> {
    if let Some(ip) = extract_client_ip(&request) {
        if !rate_limiter.check(ip) {
            warn!(ip = %ip, "Rate limit exceeded");
            metrics::record_rate_limit_hit(request.uri().path());
            let mut response = ApiError::RateLimited.into_response();
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from_static("1"));
            return response;
        }
    }

    next.run(request).await
}

/// Extract client IP from proxy headers or connection info.
pub fn extract_client_ip(request: &Request<Body>) -> Option<IpAddr> {
    // First hop in X-Forwarded-For is the original client
    let forwarded = request
        .headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .and_then(|ip| ip.trim().parse().ok());

    let real_ip = || {
        request
            .headers()
            .get("x-real-ip")
            .and_then(|v| v.to_str().ok())
            .and_then(|ip| ip.trim().parse().ok())
    };

    forwarded.or_else(real_ip).or_else(|| {
        request
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ci| ci.0.ip())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limiter_is_per_ip() {
        let limiter = RateLimiterCache::new(2);
        let a: IpAddr = "10.0.0.1".parse().unwrap();
        let b: IpAddr = "10.0.0.2".parse().unwrap();

        assert!(limiter.check(a));
        assert!(limiter.check(a));
        assert!(!limiter.check(a));
        assert!(limiter.check(b));
    }

    #[test]
    fn test_extract_client_ip_prefers_forwarded_header() {
        let request = Request::builder()
            .uri("/jobs")
            .header("x-forwarded-for", "203.0.113.7, 10.0.0.1")
            .header("x-real-ip", "198.51.100.2")
            .body(Body::empty())
            .unwrap();
        assert_eq!(extract_client_ip(&request), "203.0.113.7".parse().ok());

        let request = Request::builder()
            .uri("/jobs")
            .header("x-real-ip", "198.51.100.2")
            .body(Body::empty())
            .unwrap();
        assert_eq!(extract_client_ip(&request), "198.51.100.2".parse().ok());
    }

    #[test]
    fn test_extract_client_ip_without_source() {
        let request = Request::builder().uri("/jobs").body(Body::empty()).unwrap();
        assert_eq!(extract_client_ip(&request), None);
    }
}
