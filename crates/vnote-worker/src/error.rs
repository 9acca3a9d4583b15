//! Worker error types.

use reqwest::StatusCode;
use thiserror::Error;

pub type WorkerResult<T> = Result<T, WorkerError>;

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API returned {status}: {detail}")]
    Api { status: StatusCode, detail: String },

    #[error("Processing failed: {0}")]
    ProcessingFailed(String),

    #[error("Media error: {0}")]
    Media(#[from] vnote_media::MediaError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl WorkerError {
    pub fn api(status: StatusCode, detail: impl Into<String>) -> Self {
        Self::Api {
            status,
            detail: detail.into(),
        }
    }

    pub fn processing_failed(msg: impl Into<String>) -> Self {
        Self::ProcessingFailed(msg.into())
    }

    /// Check if error is retryable.
    ///
    /// Transport failures and server-side errors may clear up; a 4xx answer
    /// will not change on retry.
    pub fn is_retryable(&self) -> bool {
        match self {
            WorkerError::Http(e) => e.is_connect() || e.is_timeout() || e.is_request(),
            WorkerError::Api { status, .. } => {
                status.is_server_error() || *status == StatusCode::TOO_MANY_REQUESTS
            }
            _ => false,
        }
    }

    /// The API no longer knows the job.
    pub fn is_not_found(&self) -> bool {
        matches!(self, WorkerError::Api { status, .. } if *status == StatusCode::NOT_FOUND)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_errors_retry_only_on_server_side() {
        assert!(WorkerError::api(StatusCode::BAD_GATEWAY, "upstream").is_retryable());
        assert!(WorkerError::api(StatusCode::TOO_MANY_REQUESTS, "slow down").is_retryable());
        assert!(!WorkerError::api(StatusCode::UNPROCESSABLE_ENTITY, "bad stage").is_retryable());
        assert!(!WorkerError::processing_failed("ffmpeg crashed").is_retryable());
    }

    #[test]
    fn test_not_found() {
        assert!(WorkerError::api(StatusCode::NOT_FOUND, "Job not found").is_not_found());
        assert!(!WorkerError::api(StatusCode::CONFLICT, "done").is_not_found());
    }
}
