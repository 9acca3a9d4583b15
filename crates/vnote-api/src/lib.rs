//! Axum HTTP API for the video note job queue.
//!
//! This crate provides:
//! - Job submission, lookup and listing for producers and observers
//! - Exclusive claiming and progress reporting for workers
//! - Rate limiting, security headers and request logging
//! - Prometheus metrics

pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod state;

pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use state::AppState;
