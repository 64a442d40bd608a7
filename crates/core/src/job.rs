//! Provider-neutral job status and the artifact produced by a finished job.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Projection of every provider's raw status vocabulary.
///
/// `Succeeded`, `Failed` and `Cancelled` are terminal: once one is
/// observed the job is never polled again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobStatus {
    Queued,
    Running,
    Succeeded,
    Failed,
    Cancelled,
}

impl JobStatus {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            JobStatus::Succeeded | JobStatus::Failed | JobStatus::Cancelled
        )
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            JobStatus::Queued => "queued",
            JobStatus::Running => "running",
            JobStatus::Succeeded => "succeeded",
            JobStatus::Failed => "failed",
            JobStatus::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}

/// The generated image or video, represented by its retrieval URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifact {
    pub url: String,
}

impl Artifact {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}
