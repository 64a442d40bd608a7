//! Domain types shared by every mediagen crate.
//!
//! Holds the normalized generation request, the provider-neutral job
//! status vocabulary, step lifecycle types, and the step cost table.
//! Contains no I/O.

pub mod error;
pub mod job;
pub mod request;
pub mod step;
pub mod types;

pub use error::CoreError;
pub use job::{Artifact, JobStatus};
pub use request::{GenerationKind, GenerationRequest, RequestContext};
pub use step::{step_cost, StepRecord, StepStatus, StepUpdate};
pub use types::{CostUnits, StepId};
