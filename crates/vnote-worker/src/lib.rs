//! Reference worker for the video note queue.
//!
//! This crate provides:
//! - HTTP client for claiming jobs and reporting progress
//! - Poll loop with idle backoff and graceful shutdown
//! - FFmpeg pipeline producing round video notes or voice clips

pub mod client;
pub mod config;
pub mod error;
pub mod executor;
pub mod logging;
pub mod processor;
pub mod retry;

pub use client::JobApiClient;
pub use config::WorkerConfig;
pub use error::{WorkerError, WorkerResult};
pub use executor::JobExecutor;
pub use logging::JobLogger;
pub use processor::{FfmpegProcessor, JobProcessor};
