use std::fmt;
use std::time::Duration;

use crate::job::ProviderKind;

/// Errors raised while driving a provider job from submission to artifact.
///
/// None of these are retried locally; they propagate to the caller.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// The request was rejected before a job existed (bad request,
    /// non-2xx response, or a response without a job identifier).
    #[error("{provider} submission failed: {message}")]
    Submission {
        provider: ProviderKind,
        message: String,
    },

    /// A status check failed (non-2xx or malformed body).
    #[error("{provider} poll failed for job {job_id}: {message}")]
    Poll {
        provider: ProviderKind,
        job_id: String,
        message: String,
    },

    /// The provider reported the job as failed or cancelled.
    #[error("{provider} job {job_id} ended with status {status}")]
    JobFailed {
        provider: ProviderKind,
        job_id: String,
        /// Raw status string as reported by the provider.
        status: String,
    },

    /// The terminal payload lacks the expected result field.
    #[error("{provider} result for job {job_id} has no artifact: {message}")]
    Extraction {
        provider: ProviderKind,
        job_id: String,
        message: String,
    },

    /// The job did not reach a terminal status within the configured bound.
    #[error("{provider} job {job_id} still not finished after {waited:?}")]
    PollTimeout {
        provider: ProviderKind,
        job_id: String,
        waited: Duration,
    },

    /// Missing credential or unusable client setup.
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl ProviderError {
    pub fn submission(provider: ProviderKind, message: impl fmt::Display) -> Self {
        ProviderError::Submission {
            provider,
            message: message.to_string(),
        }
    }

    pub fn poll(provider: ProviderKind, job_id: &str, message: impl fmt::Display) -> Self {
        ProviderError::Poll {
            provider,
            job_id: job_id.to_string(),
            message: message.to_string(),
        }
    }

    pub fn extraction(provider: ProviderKind, job_id: &str, message: impl fmt::Display) -> Self {
        ProviderError::Extraction {
            provider,
            job_id: job_id.to_string(),
            message: message.to_string(),
        }
    }
}
