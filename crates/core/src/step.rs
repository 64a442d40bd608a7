//! Step (work item) lifecycle types exchanged with the coordination layer.
//!
//! A step moves `Pending -> Completed` or `Pending -> Failed` exactly once.

use serde::{Deserialize, Serialize};

use crate::request::GenerationKind;
use crate::types::{CostUnits, StepId};

/// Cost charged for image kinds.
pub const IMAGE_STEP_COST: CostUnits = 1;
/// Cost charged for video kinds.
pub const VIDEO_STEP_COST: CostUnits = 5;

/// Cost attached to a completed step, determined purely by request kind.
pub fn step_cost(kind: GenerationKind) -> CostUnits {
    if kind.is_video() {
        VIDEO_STEP_COST
    } else {
        IMAGE_STEP_COST
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StepStatus {
    Pending,
    Completed,
    Failed,
}

impl StepStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, StepStatus::Pending)
    }
}

/// A step as held by the coordination layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepRecord {
    pub id: StepId,
    pub status: StepStatus,
    /// Raw kind tag, e.g. `"text2video"`.
    pub kind: String,
    /// Free-form parameter bag for the kind.
    pub params: serde_json::Value,
    #[serde(default)]
    pub artifact_id: Option<String>,
    #[serde(default)]
    pub cost: Option<CostUnits>,
    #[serde(default)]
    pub output: Option<String>,
    #[serde(default)]
    pub output_artifacts: Vec<String>,
}

impl StepRecord {
    /// Create a new pending step.
    pub fn pending(id: StepId, kind: impl Into<String>, params: serde_json::Value) -> Self {
        Self {
            id,
            status: StepStatus::Pending,
            kind: kind.into(),
            params,
            artifact_id: None,
            cost: None,
            output: None,
            output_artifacts: Vec::new(),
        }
    }

    pub fn with_artifact_id(mut self, artifact_id: impl Into<String>) -> Self {
        self.artifact_id = Some(artifact_id.into());
        self
    }

    /// Apply a terminal update to this record.
    pub fn apply(&mut self, update: StepUpdate) {
        match update {
            StepUpdate::Completed {
                cost,
                output_artifacts,
            } => {
                self.status = StepStatus::Completed;
                self.cost = Some(cost);
                self.output_artifacts = output_artifacts;
            }
            StepUpdate::Failed { output } => {
                self.status = StepStatus::Failed;
                self.output = Some(output);
            }
        }
    }
}

/// Outbound write describing how a step ended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status")]
pub enum StepUpdate {
    Completed {
        cost: CostUnits,
        output_artifacts: Vec<String>,
    },
    Failed {
        output: String,
    },
}

impl StepUpdate {
    pub fn completed(kind: GenerationKind, url: impl Into<String>) -> Self {
        StepUpdate::Completed {
            cost: step_cost(kind),
            output_artifacts: vec![url.into()],
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        StepUpdate::Failed {
            output: message.into(),
        }
    }

    pub fn status(&self) -> StepStatus {
        match self {
            StepUpdate::Completed { .. } => StepStatus::Completed,
            StepUpdate::Failed { .. } => StepStatus::Failed,
        }
    }
}
