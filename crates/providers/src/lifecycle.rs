//! Job-lifecycle driver: submit, poll to a terminal status, extract.
//!
//! The poll loop sleeps a fixed interval between status checks and stops
//! at the first terminal status. It is unbounded unless
//! [`PollPolicy::max_wait`] is set.

use std::time::Duration;

use mediagen_core::{GenerationRequest, JobStatus};
use serde_json::Value;
use tokio::time::Instant;

use crate::adapter::JobAdapter;
use crate::error::ProviderError;
use crate::job::{Generation, Job, Submission, TerminalJob};

/// Default sleep between status checks.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// How a job is polled once submitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    /// Fixed sleep before each status check.
    pub interval: Duration,
    /// Upper bound on total waiting; `None` polls until a terminal status.
    pub max_wait: Option<Duration>,
}

impl PollPolicy {
    pub fn every(interval: Duration) -> Self {
        Self {
            interval,
            max_wait: None,
        }
    }

    pub fn with_max_wait(mut self, max_wait: Duration) -> Self {
        self.max_wait = Some(max_wait);
        self
    }
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self::every(DEFAULT_POLL_INTERVAL)
    }
}

/// Poll `job` until it reaches a terminal status.
///
/// Returns the terminal payload on `Succeeded`. `Failed` and `Cancelled`
/// become [`ProviderError::JobFailed`] carrying the provider's raw status,
/// and no further status checks are made.
pub async fn await_completion(
    adapter: &dyn JobAdapter,
    mut job: Job,
    policy: &PollPolicy,
) -> Result<TerminalJob, ProviderError> {
    let started = Instant::now();
    let mut payload = Value::Null;
    let mut polls = 0u32;

    loop {
        match job.status {
            JobStatus::Succeeded => {
                tracing::info!(
                    provider = %job.provider,
                    job_id = %job.id,
                    polls,
                    "Provider job succeeded",
                );
                let payload = adapter.fetch_result(&job, payload).await?;
                return Ok(TerminalJob { job, payload });
            }
            JobStatus::Failed | JobStatus::Cancelled => {
                tracing::warn!(
                    provider = %job.provider,
                    job_id = %job.id,
                    status = %job.raw_status,
                    polls,
                    "Provider job did not succeed",
                );
                return Err(ProviderError::JobFailed {
                    provider: job.provider,
                    job_id: job.id,
                    status: job.raw_status,
                });
            }
            JobStatus::Queued | JobStatus::Running => {}
        }

        if let Some(max_wait) = policy.max_wait {
            let waited = started.elapsed();
            if waited >= max_wait {
                return Err(ProviderError::PollTimeout {
                    provider: job.provider,
                    job_id: job.id,
                    waited,
                });
            }
        }

        tokio::time::sleep(policy.interval).await;

        let response = adapter.poll(&job).await?;
        polls += 1;
        tracing::debug!(
            provider = %job.provider,
            job_id = %job.id,
            status = %response.raw_status,
            polls,
            "Polled provider job",
        );
        job.observe(&response);
        payload = response.payload;
    }
}

/// Run the full pipeline for one request: submit, wait, extract.
pub async fn run_job(
    adapter: &dyn JobAdapter,
    request: &GenerationRequest,
    policy: &PollPolicy,
) -> Result<Generation, ProviderError> {
    let terminal = match adapter.submit(request).await? {
        Submission::Pending(job) => {
            tracing::info!(
                provider = %job.provider,
                job_id = %job.id,
                status = %job.raw_status,
                "Provider job submitted",
            );
            await_completion(adapter, job, policy).await?
        }
        Submission::Completed(terminal) => {
            tracing::info!(
                provider = %terminal.job.provider,
                job_id = %terminal.job.id,
                "Provider answered synchronously, skipping poll",
            );
            terminal
        }
    };

    let artifact = adapter.extract_artifact(&terminal)?;
    let usage = adapter.usage(&terminal);

    Ok(Generation {
        artifact,
        provider: adapter.provider(),
        model: adapter.model().to_string(),
        usage,
        payload: terminal.payload,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
