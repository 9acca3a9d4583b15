//! Job executor.

use std::time::Duration;

use tokio::sync::watch;
use tracing::{debug, info, warn, Instrument};

use vnote_models::{JobId, JobSnapshot, ProgressUpdate, Stage};

use crate::client::JobApiClient;
use crate::config::WorkerConfig;
use crate::error::{WorkerError, WorkerResult};
use crate::logging::JobLogger;
use crate::processor::JobProcessor;
use crate::retry::FailureTracker;

/// Polls the API for jobs and runs them one at a time.
pub struct JobExecutor<P> {
    config: WorkerConfig,
    client: JobApiClient,
    processor: P,
    shutdown: watch::Sender<bool>,
}

impl<P: JobProcessor> JobExecutor<P> {
    pub fn new(config: WorkerConfig, client: JobApiClient, processor: P) -> Self {
        let (shutdown, _) = watch::channel(false);
        Self {
            config,
            client,
            processor,
            shutdown,
        }
    }

    /// Poll until shutdown is signalled.
    ///
    /// Empty polls and API errors double the wait up to
    /// `max_poll_interval`; a claimed job resets it.
    pub async fn run(&self) -> WorkerResult<()> {
        info!(
            "Starting job executor against {} (poll every {:?})",
            self.client.base_url(),
            self.config.poll_interval
        );

        let mut shutdown_rx = self.shutdown.subscribe();
        let mut idle_delay = self.config.poll_interval;
        let mut failures = FailureTracker::new(3);

        loop {
            if *shutdown_rx.borrow_and_update() {
                break;
            }

            let delay = match self.run_once().await {
                Ok(true) => {
                    failures.record_success();
                    idle_delay = self.config.poll_interval;
                    continue;
                }
                Ok(false) => {
                    failures.record_success();
                    idle_delay
                }
                Err(e) => {
                    if failures.record_failure() {
                        warn!("Polling failed: {}", e);
                    }
                    idle_delay
                }
            };
            idle_delay = (idle_delay * 2).min(self.config.max_poll_interval);

            tokio::select! {
                _ = shutdown_rx.changed() => {}
                _ = tokio::time::sleep(delay) => {}
            }
        }

        info!("Job executor stopped");
        Ok(())
    }

    /// Claim and process at most one job. Returns whether a job was claimed.
    pub async fn run_once(&self) -> WorkerResult<bool> {
        match self.client.claim_next().await? {
            Some(job) => {
                self.process_job(job).await?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Drive one claimed job to `done` or `failed`.
    ///
    /// If a report fails, the job is marked `failed` before the error is
    /// returned, so it is not left `processing`.
    pub async fn process_job(&self, job: JobSnapshot) -> WorkerResult<JobSnapshot> {
        let logger = JobLogger::for_job(&job);
        let span = logger.span();

        async {
            logger.log_claimed(&job);

            if let Err(e) = self
                .client
                .report(&job.job_id, &ProgressUpdate::stage(Stage::Processing))
                .await
            {
                self.abandon(&job.job_id, &logger, &e).await;
                return Err(e);
            }
            logger.log_reported(Stage::Processing);

            let update = match self.processor.process(&job).await {
                Ok(result_file_id) => {
                    logger.log_step(&format!("rendered {result_file_id}"));
                    ProgressUpdate::done(result_file_id)
                }
                Err(e) => {
                    logger.log_failure(&e.to_string());
                    ProgressUpdate::failed(e.to_string())
                }
            };

            let finished = match self.client.report(&job.job_id, &update).await {
                Ok(finished) => finished,
                Err(e) => {
                    if update.stage != Stage::Failed {
                        self.abandon(&job.job_id, &logger, &e).await;
                    }
                    return Err(e);
                }
            };
            logger.log_reported(finished.stage);
            Ok::<_, WorkerError>(finished)
        }
        .instrument(span)
        .await
    }

    /// Last attempt to mark a job `failed` after a report error. Errors are
    /// logged and dropped.
    async fn abandon(&self, job_id: &JobId, logger: &JobLogger, cause: &WorkerError) {
        logger.log_failure(&format!("progress report failed: {cause}"));

        let update = ProgressUpdate::failed(format!("Worker could not report progress: {cause}"));
        match self.client.report(job_id, &update).await {
            Ok(job) => logger.log_reported(job.stage),
            Err(e) => warn!("Could not mark job {} as failed: {}", job_id, e),
        }
    }

    /// Signal shutdown; the current job finishes first.
    pub fn shutdown(&self) {
        debug!("Shutdown requested");
        self.shutdown.send_replace(true);
    }
}
