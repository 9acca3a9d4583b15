//! Progress reports sent by workers.

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::Stage;

/// Stage change reported for a job, optionally carrying its outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct ProgressUpdate {
    /// New stage
    pub stage: Stage,

    /// Position the reporter believes the job holds; positions are always
    /// recomputed from the pending order, so this is informational only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 1, message = "position must be at least 1"))]
    pub position: Option<u32>,

    /// Handle of the produced artifact
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result_file_id: Option<String>,

    /// Human-readable note, usually the failure reason
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl ProgressUpdate {
    /// Report a bare stage change.
    pub fn stage(stage: Stage) -> Self {
        Self {
            stage,
            position: None,
            result_file_id: None,
            detail: None,
        }
    }

    /// Report successful completion with the produced artifact.
    pub fn done(result_file_id: impl Into<String>) -> Self {
        Self::stage(Stage::Done).with_result(result_file_id)
    }

    /// Report a failure with its reason.
    pub fn failed(detail: impl Into<String>) -> Self {
        Self::stage(Stage::Failed).with_detail(detail)
    }

    pub fn with_position(mut self, position: u32) -> Self {
        self.position = Some(position);
        self
    }

    pub fn with_result(mut self, result_file_id: impl Into<String>) -> Self {
        self.result_file_id = Some(result_file_id.into());
        self
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}
