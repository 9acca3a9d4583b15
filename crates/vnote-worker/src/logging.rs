//! Structured job logging.

use std::time::Instant;

use tracing::{error, info, Span};
use vnote_models::{JobSnapshot, Stage};

/// Logs one job's lifecycle with the job ID and operation attached.
#[derive(Debug, Clone)]
pub struct JobLogger {
    job_id: String,
    operation: &'static str,
    started: Instant,
}

impl JobLogger {
    /// Logger for a claimed job; the operation follows the requested output.
    pub fn for_job(job: &JobSnapshot) -> Self {
        let operation = if job.payload.audio_only {
            "voice_clip"
        } else {
            "video_note"
        };
        Self {
            job_id: job.job_id.to_string(),
            operation,
            started: Instant::now(),
        }
    }

    pub fn log_claimed(&self, job: &JobSnapshot) {
        info!(
            job_id = %self.job_id,
            operation = self.operation,
            start = job.payload.start,
            end = job.payload.end,
            mute = job.payload.mute,
            "Job claimed"
        );
    }

    pub fn log_step(&self, step: &str) {
        info!(
            job_id = %self.job_id,
            operation = self.operation,
            "Job step: {}", step
        );
    }

    pub fn log_reported(&self, stage: Stage) {
        info!(
            job_id = %self.job_id,
            operation = self.operation,
            stage = %stage,
            elapsed_ms = self.started.elapsed().as_millis() as u64,
            "Job stage reported"
        );
    }

    pub fn log_failure(&self, reason: &str) {
        error!(
            job_id = %self.job_id,
            operation = self.operation,
            elapsed_ms = self.started.elapsed().as_millis() as u64,
            "Job failed: {}", reason
        );
    }

    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    pub fn operation(&self) -> &str {
        self.operation
    }

    /// Span carrying the job fields, for instrumenting a whole job run.
    pub fn span(&self) -> Span {
        tracing::info_span!("job", job_id = %self.job_id, operation = self.operation)
    }
}
