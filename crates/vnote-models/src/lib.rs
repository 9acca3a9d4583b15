//! Shared data models for the video note job service.
//!
//! This crate provides Serde-serializable types for:
//! - Job identifiers, stages and snapshots
//! - Job submission requests and their validation
//! - Progress reports sent by workers

pub mod job;
pub mod progress;

// Re-export common types
pub use job::{Job, JobId, JobRequest, JobSnapshot, Stage, MAX_CLIP_DURATION_SECS};
pub use progress::ProgressUpdate;
