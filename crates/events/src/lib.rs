//! Coordination-layer boundary for the mediagen worker.
//!
//! - [`EventBus`]: in-process publish/subscribe hub backed by
//!   `tokio::sync::broadcast`, announcing steps ready for work.
//! - [`StepEvent`]: the event envelope.
//! - [`StepStore`]: read step details, write step outcomes.
//! - [`InMemoryStepStore`]: process-local store implementation.

pub mod bus;
pub mod steps;

pub use bus::{EventBus, StepEvent, STEP_PENDING};
pub use steps::{InMemoryStepStore, StepStore, StepStoreError};
