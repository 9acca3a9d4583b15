//! Queue error types.

use thiserror::Error;
use vnote_models::{JobId, Stage};

pub type QueueResult<T> = Result<T, QueueError>;

#[derive(Debug, Error)]
pub enum QueueError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Job not found: {0}")]
    JobNotFound(String),

    #[error("Job {job_id} is already {stage}")]
    TerminalState { job_id: String, stage: Stage },
}

impl QueueError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn job_not_found(job_id: &JobId) -> Self {
        Self::JobNotFound(job_id.to_string())
    }

    pub fn terminal_state(job_id: &JobId, stage: Stage) -> Self {
        Self::TerminalState {
            job_id: job_id.to_string(),
            stage,
        }
    }
}

impl From<validator::ValidationErrors> for QueueError {
    fn from(errors: validator::ValidationErrors) -> Self {
        Self::Validation(errors.to_string())
    }
}
