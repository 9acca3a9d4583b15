//! Retry utilities with exponential backoff.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use tracing::{debug, warn};

/// Configuration for retry behavior.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of retry attempts (not including the initial attempt).
    pub max_retries: u32,
    /// Base delay for exponential backoff (doubles each attempt).
    pub base_delay: Duration,
    /// Maximum delay between retries.
    pub max_delay: Duration,
    /// Operation name for logging.
    pub operation_name: String,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(200),
            max_delay: Duration::from_secs(5),
            operation_name: "operation".to_string(),
        }
    }
}

impl RetryConfig {
    /// Create a new retry config with the given operation name.
    pub fn new(operation_name: impl Into<String>) -> Self {
        Self {
            operation_name: operation_name.into(),
            ..Default::default()
        }
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_base_delay(mut self, base_delay: Duration) -> Self {
        self.base_delay = base_delay;
        self
    }

    /// Delay before retry number `attempt` (1-based).
    fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }
}

/// Run `operation`, retrying while `should_retry` accepts the error.
///
/// Returns the last error once retries are exhausted or the error is not
/// retryable.
pub async fn retry_async<F, Fut, T, E, R>(
    config: &RetryConfig,
    mut operation: F,
    should_retry: R,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
    R: Fn(&E) -> bool,
{
    let mut attempt = 0u32;

    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(e) if attempt < config.max_retries && should_retry(&e) => {
                attempt += 1;
                let delay = config.delay_for_attempt(attempt);
                debug!(
                    "{} attempt {} failed, retrying in {:?}: {}",
                    config.operation_name, attempt, delay, e
                );
                tokio::time::sleep(delay).await;
            }
            Err(e) => {
                if attempt > 0 {
                    warn!(
                        "{} failed after {} attempts: {}",
                        config.operation_name,
                        attempt + 1,
                        e
                    );
                }
                return Err(e);
            }
        }
    }
}

/// Suppresses log spam from a loop that keeps failing the same way.
#[derive(Debug, Default)]
pub struct FailureTracker {
    consecutive_failures: u32,
    max_logged_failures: u32,
}

impl FailureTracker {
    pub fn new(max_logged_failures: u32) -> Self {
        Self {
            consecutive_failures: 0,
            max_logged_failures,
        }
    }

    /// Record a successful operation (resets failure count).
    pub fn record_success(&mut self) {
        if self.consecutive_failures > self.max_logged_failures {
            debug!(
                "Operation recovered after {} consecutive failures",
                self.consecutive_failures
            );
        }
        self.consecutive_failures = 0;
    }

    /// Record a failed operation.
    ///
    /// Returns `true` if this failure should be logged.
    pub fn record_failure(&mut self) -> bool {
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);

        if self.consecutive_failures == self.max_logged_failures + 1 {
            warn!(
                "Suppressing further failure logs after {} consecutive failures",
                self.max_logged_failures
            );
        }
        self.consecutive_failures <= self.max_logged_failures
    }

    pub fn failure_count(&self) -> u32 {
        self.consecutive_failures
    }
}
