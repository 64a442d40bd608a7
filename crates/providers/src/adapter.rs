//! The uniform job-lifecycle contract every provider adapter implements.

use async_trait::async_trait;
use mediagen_core::{Artifact, GenerationRequest};
use serde_json::Value;

use crate::error::ProviderError;
use crate::job::{Job, PollResponse, ProviderKind, Submission, TerminalJob, Usage};

/// One concrete long-running-job HTTP API, normalized to
/// submit / poll / extract.
///
/// Adapters hold configuration only (credentials, base URL, HTTP client);
/// all per-job state lives in the [`Job`] handle owned by the caller, so a
/// single adapter can drive any number of jobs concurrently.
#[async_trait]
pub trait JobAdapter: Send + Sync {
    fn provider(&self) -> ProviderKind;

    /// Model identifier reported in usage records.
    fn model(&self) -> &str;

    /// Build the provider payload and issue one authenticated POST.
    async fn submit(&self, request: &GenerationRequest) -> Result<Submission, ProviderError>;

    /// Issue one authenticated status GET.
    async fn poll(&self, job: &Job) -> Result<PollResponse, ProviderError>;

    /// Turn the payload of the poll that observed `Succeeded` into the
    /// document [`extract_artifact`](Self::extract_artifact) reads.
    ///
    /// Most providers return the result inline with the status.
    async fn fetch_result(&self, _job: &Job, payload: Value) -> Result<Value, ProviderError> {
        Ok(payload)
    }

    /// Navigate the provider-specific result shape to the artifact URL.
    fn extract_artifact(&self, terminal: &TerminalJob) -> Result<Artifact, ProviderError>;

    /// Usage-cost proxy for a finished job.
    fn usage(&self, terminal: &TerminalJob) -> Usage;
}
