//! Job records, stages and the snapshots handed out to callers.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

/// Longest fragment a single job may cut from its source, in seconds.
pub const MAX_CLIP_DURATION_SECS: f64 = 60.0;

/// Unique identifier for a job.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(pub String);

impl JobId {
    /// Generate a new random job ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Create from an existing string.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for JobId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Lifecycle stage of a job.
///
/// `Accepted` only exists between record creation and the implicit enqueue,
/// so callers normally observe `Queued` first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    #[default]
    Accepted,
    Queued,
    Processing,
    Done,
    Failed,
}

impl Stage {
    pub const ALL: [Stage; 5] = [
        Stage::Accepted,
        Stage::Queued,
        Stage::Processing,
        Stage::Done,
        Stage::Failed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Accepted => "accepted",
            Stage::Queued => "queued",
            Stage::Processing => "processing",
            Stage::Done => "done",
            Stage::Failed => "failed",
        }
    }

    /// Check if no further transitions are expected from this stage.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Stage::Done | Stage::Failed)
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Parameters of a video note job, fixed at submission time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[validate(schema(function = "validate_clip_range"))]
pub struct JobRequest {
    /// Reference to the source media as known to the chat front end
    #[serde(rename = "telegram_file_id")]
    #[validate(length(min = 1, message = "telegram_file_id must not be empty"))]
    pub source_file_id: String,

    /// Start of the fragment in seconds
    #[validate(range(min = 0.0, message = "start must be non-negative"))]
    pub start: f64,

    /// End of the fragment in seconds
    pub end: f64,

    /// Drop the audio track from the rendered note
    #[serde(default)]
    pub mute: bool,

    /// Render an audio-only message instead of a video note
    #[serde(default)]
    pub audio_only: bool,
}

impl JobRequest {
    /// Create a request for the given source fragment.
    pub fn new(source_file_id: impl Into<String>, start: f64, end: f64) -> Self {
        Self {
            source_file_id: source_file_id.into(),
            start,
            end,
            mute: false,
            audio_only: false,
        }
    }

    /// Mute the rendered note.
    pub fn muted(mut self) -> Self {
        self.mute = true;
        self
    }

    /// Produce audio only.
    pub fn audio_only(mut self) -> Self {
        self.audio_only = true;
        self
    }

    /// Length of the requested fragment in seconds.
    pub fn duration_secs(&self) -> f64 {
        self.end - self.start
    }
}

fn validate_clip_range(request: &JobRequest) -> Result<(), ValidationError> {
    if !request.start.is_finite() || !request.end.is_finite() {
        return Err(range_error("start and end must be finite numbers"));
    }
    if request.end <= request.start {
        return Err(range_error("end must be greater than start"));
    }
    if request.duration_secs() > MAX_CLIP_DURATION_SECS {
        return Err(range_error("Requested fragment is longer than 60 seconds"));
    }
    Ok(())
}

fn range_error(message: &'static str) -> ValidationError {
    let mut error = ValidationError::new("clip_range");
    error.message = Some(message.into());
    error
}

/// Mutable record of a job, owned by the job store.
#[derive(Debug, Clone)]
pub struct Job {
    pub id: JobId,
    pub request: JobRequest,
    pub stage: Stage,
    /// 1-based rank among queued jobs, present only while queued
    pub position: Option<u32>,
    pub result_file_id: Option<String>,
    pub detail: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Job {
    /// Create a freshly accepted job.
    pub fn new(id: JobId, request: JobRequest) -> Self {
        let now = Utc::now();
        Self {
            id,
            request,
            stage: Stage::Accepted,
            position: None,
            result_file_id: None,
            detail: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Bump the updated_at timestamp.
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    /// Copy the current state out of the store.
    pub fn snapshot(&self) -> JobSnapshot {
        JobSnapshot {
            job_id: self.id.clone(),
            stage: self.stage,
            position: self.position,
            result_file_id: self.result_file_id.clone(),
            detail: self.detail.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
            payload: self.request.clone(),
        }
    }
}

/// Point-in-time copy of a job as returned to producers, workers and observers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobSnapshot {
    pub job_id: JobId,
    pub stage: Stage,
    pub position: Option<u32>,
    pub result_file_id: Option<String>,
    pub detail: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub payload: JobRequest,
}
