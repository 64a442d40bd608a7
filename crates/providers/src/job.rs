//! Job handles and lifecycle payloads shared by all adapters.

use std::fmt;

use mediagen_core::{Artifact, JobStatus};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Which external provider a job belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// fal.ai queue (FLUX image synthesis and transform).
    Fal,
    /// Kling video via PiAPI (task based).
    Kling,
    /// Runway image-to-video (single job).
    Runway,
    /// Deterministic test double.
    Dummy,
}

impl ProviderKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ProviderKind::Fal => "fal",
            ProviderKind::Kling => "kling",
            ProviderKind::Runway => "runway",
            ProviderKind::Dummy => "dummy",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Provider-supplied URLs for following a job, when the provider hands
/// them out instead of expecting the client to build them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobLinks {
    pub status_url: Option<String>,
    pub result_url: Option<String>,
}

/// Handle to one in-flight provider job.
///
/// Local to a single pipeline run; never shared or persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct Job {
    pub provider: ProviderKind,
    /// Provider-side task / job / request identifier.
    pub id: String,
    /// Last observed status.
    pub status: JobStatus,
    /// Last observed raw status string.
    pub raw_status: String,
    pub links: JobLinks,
}

impl Job {
    pub fn new(
        provider: ProviderKind,
        id: impl Into<String>,
        status: JobStatus,
        raw_status: impl Into<String>,
    ) -> Self {
        Self {
            provider,
            id: id.into(),
            status,
            raw_status: raw_status.into(),
            links: JobLinks::default(),
        }
    }

    pub fn with_links(mut self, links: JobLinks) -> Self {
        self.links = links;
        self
    }

    /// Record a fresh observation from a poll.
    pub fn observe(&mut self, response: &PollResponse) {
        self.status = response.status;
        self.raw_status = response.raw_status.clone();
    }
}

/// Result of one status check.
#[derive(Debug, Clone, PartialEq)]
pub struct PollResponse {
    pub status: JobStatus,
    pub raw_status: String,
    /// Full status document as returned by the provider.
    pub payload: Value,
}

/// A job that reached `Succeeded`, with its full result document.
#[derive(Debug, Clone, PartialEq)]
pub struct TerminalJob {
    pub job: Job,
    pub payload: Value,
}

/// Outcome of a submission.
#[derive(Debug, Clone, PartialEq)]
pub enum Submission {
    /// The provider accepted the job; poll until terminal.
    Pending(Job),
    /// The provider answered synchronously with the final result.
    Completed(TerminalJob),
}

/// Usage-cost proxy reported alongside each generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "unit", content = "amount", rename_all = "lowercase")]
pub enum Usage {
    /// Output pixel count (images).
    Pixels(u64),
    /// Flat units (video).
    Units(u32),
}

/// A finished generation: the artifact plus what produced it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Generation {
    pub artifact: Artifact,
    pub provider: ProviderKind,
    pub model: String,
    pub usage: Usage,
    /// Terminal provider payload the artifact was extracted from.
    pub payload: Value,
}
