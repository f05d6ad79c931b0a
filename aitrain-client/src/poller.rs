//! Job state poller
//!
//! Drives one job from submission to a terminal state. Each tick fetches the
//! job record and classifies its state:
//! - `DONE` ends the loop with the final record
//! - `INTERRUPTED`, `FAILED`, `ERROR` fetch the logs and fail with them
//! - anything else sleeps for the poll interval, then checks both budgets
//!
//! Budgets are checked after the sleep and before the next fetch, so a job
//! that finishes in the same instant its budget runs out is still reported as
//! a timeout.

use aitrain_core::domain::job::{Job, JobState};
use aitrain_core::domain::spec::JobSpec;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{self, Instant};
use tracing::{debug, info, warn};

use crate::api::JobApi;
use crate::error::{Budget, ClientError, Result};
use crate::jobs::JobHandle;
use crate::notifier::Notifier;

/// Default wait between two poll ticks
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(3);

/// Poll loop configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollConfig {
    /// Wait between two status fetches
    pub interval: Duration,

    /// Caller-side limit on the whole loop; `None` waits for as long as the
    /// remote budget allows
    pub local_timeout: Option<Duration>,
}

impl PollConfig {
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_local_timeout(mut self, timeout: Duration) -> Self {
        self.local_timeout = Some(timeout);
        self
    }

    /// Validates the configuration
    pub fn validate(&self) -> Result<()> {
        if self.interval.is_zero() {
            return Err(ClientError::InvalidConfig(
                "poll interval must be greater than 0".to_string(),
            ));
        }

        if self.local_timeout.is_some_and(|t| t.is_zero()) {
            return Err(ClientError::InvalidConfig(
                "local timeout must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            local_timeout: None,
        }
    }
}

/// Polls a job until it succeeds, fails or runs out of time
pub struct JobPoller<A> {
    api: A,
    config: PollConfig,
    notifier: Option<Arc<dyn Notifier>>,
}

impl<A: JobApi> JobPoller<A> {
    /// Creates a poller without notifications
    pub fn new(api: A, config: PollConfig) -> Self {
        Self {
            api,
            config,
            notifier: None,
        }
    }

    /// Sends state changes to `notifier`
    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Submits `spec` and waits for the job to finish
    ///
    /// An unusable poll configuration is refused before anything is submitted.
    pub async fn run(&self, spec: &JobSpec) -> Result<Job> {
        self.config.validate()?;

        let mut handle = self.api.submit_job(spec).await?;
        self.notify(&handle.id, &handle.state).await;

        self.wait(&mut handle).await
    }

    /// Waits for a submitted job to reach a terminal state
    ///
    /// `handle.state` is updated on every tick.
    ///
    /// # Errors
    /// - [`ClientError::InvalidConfig`] if the poll configuration is unusable
    /// - [`ClientError::InfoFetch`] if a status fetch is refused
    /// - [`ClientError::JobFailed`] with the job logs on a failure terminal state
    /// - [`ClientError::LogFetch`] if those logs cannot be fetched
    /// - [`ClientError::Timeout`] naming the budget that ran out
    pub async fn wait(&self, handle: &mut JobHandle) -> Result<Job> {
        self.config.validate()?;

        let started = Instant::now();

        info!(
            "Waiting for job {} (interval: {:?}, local timeout: {:?})",
            handle.id, self.config.interval, self.config.local_timeout
        );

        loop {
            let job = self.api.get_info(&handle.id).await?;
            let state = job.status.state.clone();

            debug!("Job {} is {}", handle.id, state);

            if state != handle.state {
                self.notify(&handle.id, &state).await;
                handle.state = state.clone();
            }

            if state.is_failure() {
                warn!("Job {} ended in state {}", handle.id, state);
                let logs = self.api.get_logs(&handle.id).await?;

                return Err(ClientError::JobFailed {
                    id: handle.id.clone(),
                    state,
                    logs,
                });
            }

            if state.is_success() {
                info!("Job {} is done", handle.id);
                return Ok(job);
            }

            time::sleep(self.config.interval).await;

            if let Some(limit) = job.remote_timeout() {
                let elapsed = handle.submitted_at.elapsed();
                if elapsed >= limit {
                    return Err(self.timeout(handle, Budget::Remote, elapsed, limit));
                }
            }

            if let Some(limit) = self.config.local_timeout {
                let elapsed = started.elapsed();
                if elapsed >= limit {
                    return Err(self.timeout(handle, Budget::Local, elapsed, limit));
                }
            }
        }
    }

    fn timeout(
        &self,
        handle: &JobHandle,
        budget: Budget,
        elapsed: Duration,
        limit: Duration,
    ) -> ClientError {
        warn!(
            "Job {} exceeded the {} timeout in state {}",
            handle.id, budget, handle.state
        );

        ClientError::Timeout {
            id: handle.id.clone(),
            budget,
            elapsed,
            limit,
        }
    }

    async fn notify(&self, job_id: &str, state: &JobState) {
        let Some(notifier) = &self.notifier else {
            return;
        };

        if let Err(e) = notifier.notify(job_id, state).await {
            warn!("Failed to notify state {} of job {}: {}", state, job_id, e);
        }
    }
}
