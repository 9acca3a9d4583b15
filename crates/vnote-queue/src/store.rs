//! Job store with an arrival-ordered pending queue.
//!
//! One mutex guards both the record map and the pending order. Every
//! operation holds it from start to finish, so observers never see a
//! half-updated position set and two workers can never claim the same job.

use std::collections::{BTreeMap, HashMap, VecDeque};

use chrono::Utc;
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use validator::Validate;

use vnote_models::{Job, JobId, JobRequest, JobSnapshot, ProgressUpdate, Stage};

use crate::error::{QueueError, QueueResult};

/// Store configuration.
#[derive(Debug, Clone, Default)]
pub struct StoreConfig {
    /// Reject progress reports for jobs that are already done or failed
    pub reject_terminal_updates: bool,
}

impl StoreConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            reject_terminal_updates: std::env::var("STORE_REJECT_TERMINAL_UPDATES")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(false),
        }
    }
}

/// Aggregate view of the store, taken in a single critical section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueueStats {
    /// Jobs waiting in the pending order
    pub pending: usize,
    /// All jobs ever created
    pub total: usize,
    /// Job count per stage
    pub by_stage: BTreeMap<Stage, usize>,
}

#[derive(Debug, Default)]
struct StoreState {
    jobs: HashMap<JobId, Job>,
    pending: VecDeque<JobId>,
}

impl StoreState {
    fn snapshot(&self, job_id: &JobId) -> QueueResult<JobSnapshot> {
        self.jobs
            .get(job_id)
            .map(Job::snapshot)
            .ok_or_else(|| QueueError::job_not_found(job_id))
    }

    fn fresh_id(&self) -> JobId {
        let mut id = JobId::new();
        while self.jobs.contains_key(&id) {
            id = JobId::new();
        }
        id
    }

    /// Reassign positions 1..N along the pending order.
    fn recalculate_positions(&mut self) {
        let now = Utc::now();
        for (index, job_id) in self.pending.iter().enumerate() {
            if let Some(job) = self.jobs.get_mut(job_id) {
                job.stage = Stage::Queued;
                job.position = Some(index as u32 + 1);
                job.updated_at = now;
            }
        }
        debug_assert!(self.positions_consistent(), "queued positions drifted from pending order");
    }

    fn withdraw(&mut self, job_id: &JobId) -> bool {
        match self.pending.iter().position(|id| id == job_id) {
            Some(index) => {
                self.pending.remove(index);
                true
            }
            None => false,
        }
    }

    fn positions_consistent(&self) -> bool {
        let queued = self.jobs.values().filter(|job| job.stage == Stage::Queued).count();
        queued == self.pending.len()
            && self.pending.iter().enumerate().all(|(index, id)| {
                self.jobs
                    .get(id)
                    .is_some_and(|job| job.position == Some(index as u32 + 1))
            })
    }
}

/// Authoritative owner of all job records.
#[derive(Debug, Default)]
pub struct JobStore {
    state: Mutex<StoreState>,
    config: StoreConfig,
}

impl JobStore {
    /// Create an empty store.
    pub fn new(config: StoreConfig) -> Self {
        Self {
            state: Mutex::new(StoreState::default()),
            config,
        }
    }

    /// Create from environment variables.
    pub fn from_env() -> Self {
        Self::new(StoreConfig::from_env())
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Validate a request, store it and append it to the pending order.
    pub async fn create(&self, request: JobRequest) -> QueueResult<JobSnapshot> {
        request.validate()?;

        let mut guard = self.state.lock().await;
        let state = &mut *guard;

        let job_id = state.fresh_id();
        state.jobs.insert(job_id.clone(), Job::new(job_id.clone(), request));
        state.pending.push_back(job_id.clone());
        state.recalculate_positions();

        let snapshot = state.snapshot(&job_id)?;
        info!(
            job_id = %job_id,
            position = ?snapshot.position,
            "Enqueued job"
        );
        Ok(snapshot)
    }

    /// Get a snapshot of one job.
    pub async fn get(&self, job_id: &JobId) -> QueueResult<JobSnapshot> {
        self.state.lock().await.snapshot(job_id)
    }

    /// Claim the earliest queued job, moving it to processing.
    ///
    /// Returns `None` when nothing is pending; callers are expected to poll.
    pub async fn dequeue(&self) -> Option<JobSnapshot> {
        let mut guard = self.state.lock().await;
        let state = &mut *guard;

        while let Some(job_id) = state.pending.pop_front() {
            let Some(job) = state.jobs.get_mut(&job_id) else {
                warn!(job_id = %job_id, "Dropping pending entry without a record");
                continue;
            };
            job.stage = Stage::Processing;
            job.position = None;
            job.touch();
            let snapshot = job.snapshot();

            state.recalculate_positions();
            info!(job_id = %job_id, remaining = state.pending.len(), "Dequeued job");
            return Some(snapshot);
        }

        None
    }

    /// Apply a progress report.
    ///
    /// `queued` re-enqueues the job at the tail if it is not already pending.
    /// Any other stage clears the position and withdraws the job from the
    /// pending order if it was still there.
    pub async fn update(&self, job_id: &JobId, update: ProgressUpdate) -> QueueResult<JobSnapshot> {
        update.validate()?;

        let mut guard = self.state.lock().await;
        let state = &mut *guard;

        let job = state
            .jobs
            .get_mut(job_id)
            .ok_or_else(|| QueueError::job_not_found(job_id))?;

        if job.stage.is_terminal() {
            if self.config.reject_terminal_updates {
                return Err(QueueError::terminal_state(job_id, job.stage));
            }
            warn!(
                job_id = %job_id,
                from = %job.stage,
                to = %update.stage,
                "Updating job that already reached a terminal stage"
            );
        }

        let previous = job.stage;
        if let Some(result_file_id) = update.result_file_id {
            job.result_file_id = Some(result_file_id);
        }
        if let Some(detail) = update.detail {
            job.detail = Some(detail);
        }
        job.touch();

        match update.stage {
            Stage::Queued => {
                job.stage = Stage::Queued;
                if !state.pending.contains(job_id) {
                    state.pending.push_back(job_id.clone());
                }
                state.recalculate_positions();
            }
            stage => {
                job.stage = stage;
                job.position = None;
                if state.withdraw(job_id) {
                    state.recalculate_positions();
                }
            }
        }

        let snapshot = state.snapshot(job_id)?;
        if let (Some(hint), Some(actual)) = (update.position, snapshot.position) {
            if hint != actual {
                debug!(job_id = %job_id, hint, actual, "Ignoring position hint");
            }
        }
        info!(
            job_id = %job_id,
            from = %previous,
            to = %snapshot.stage,
            "Updated job"
        );
        Ok(snapshot)
    }

    /// Copy out every job, in no particular order.
    pub async fn list(&self) -> Vec<JobSnapshot> {
        self.state.lock().await.jobs.values().map(Job::snapshot).collect()
    }

    /// Number of jobs waiting to be claimed.
    pub async fn pending_len(&self) -> usize {
        self.state.lock().await.pending.len()
    }

    /// Count jobs per stage.
    pub async fn stats(&self) -> QueueStats {
        let state = self.state.lock().await;
        let mut by_stage: BTreeMap<Stage, usize> = Stage::ALL.into_iter().map(|s| (s, 0)).collect();
        for job in state.jobs.values() {
            *by_stage.entry(job.stage).or_default() += 1;
        }
        QueueStats {
            pending: state.pending.len(),
            total: state.jobs.len(),
            by_stage,
        }
    }
}
