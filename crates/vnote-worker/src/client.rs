//! HTTP client for the job API.

use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use tracing::debug;

use vnote_models::{JobId, JobRequest, JobSnapshot, ProgressUpdate};

use crate::config::WorkerConfig;
use crate::error::{WorkerError, WorkerResult};
use crate::retry::{retry_async, RetryConfig};

/// Error body returned by the API.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: serde_json::Value,
}

/// Client for claiming jobs and reporting their progress.
#[derive(Debug, Clone)]
pub struct JobApiClient {
    http: Client,
    base_url: String,
    retry: RetryConfig,
}

impl JobApiClient {
    /// Create a client for the API at `base_url`.
    pub fn new(base_url: impl Into<String>, config: &WorkerConfig) -> WorkerResult<Self> {
        let http = Client::builder().timeout(config.request_timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            retry: RetryConfig::new("report_progress"),
        })
    }

    /// Create a client from worker configuration.
    pub fn from_config(config: &WorkerConfig) -> WorkerResult<Self> {
        Self::new(config.api_base_url.clone(), config)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Claim the next queued job, or `None` when the queue is empty.
    ///
    /// Not retried: a lost response would leave the job claimed.
    pub async fn claim_next(&self) -> WorkerResult<Option<JobSnapshot>> {
        let response = self
            .http
            .get(format!("{}/jobs/next", self.base_url))
            .send()
            .await?;

        if response.status() == StatusCode::NO_CONTENT {
            debug!("Queue is empty");
            return Ok(None);
        }

        Ok(Some(Self::json(response).await?))
    }

    /// Report a stage change, retrying transient failures.
    pub async fn report(&self, job_id: &JobId, update: &ProgressUpdate) -> WorkerResult<JobSnapshot> {
        let url = format!("{}/jobs/{}/progress", self.base_url, job_id);
        let url = url.as_str();
        retry_async(
            &self.retry,
            || async move {
                let response = self.http.post(url).json(update).send().await?;
                Self::json(response).await
            },
            WorkerError::is_retryable,
        )
        .await
    }

    /// Submit a new clip request.
    pub async fn submit(&self, request: &JobRequest) -> WorkerResult<JobSnapshot> {
        let response = self
            .http
            .post(format!("{}/jobs", self.base_url))
            .json(request)
            .send()
            .await?;
        Self::json(response).await
    }

    /// Fetch a job by ID.
    pub async fn get_job(&self, job_id: &JobId) -> WorkerResult<JobSnapshot> {
        let response = self
            .http
            .get(format!("{}/jobs/{}", self.base_url, job_id))
            .send()
            .await?;
        Self::json(response).await
    }

    async fn json(response: Response) -> WorkerResult<JobSnapshot> {
        let status = response.status();
        if status.is_success() {
            return Ok(response.json().await?);
        }

        let text = response.text().await.unwrap_or_default();
        let detail = serde_json::from_str::<ErrorBody>(&text)
            .map(|body| match body.detail {
                serde_json::Value::String(s) => s,
                other => other.to_string(),
            })
            .unwrap_or(text);
        Err(WorkerError::api(status, detail))
    }
}
