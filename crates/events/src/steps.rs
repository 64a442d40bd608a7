//! Step store: the coordination layer's record of each work item.
//!
//! [`StepStore`] is the boundary the dispatcher reads step details from
//! and writes outcomes to. [`InMemoryStepStore`] backs the standalone
//! worker binary and the test suites.

use std::collections::HashMap;

use async_trait::async_trait;
use mediagen_core::{StepId, StepRecord, StepStatus, StepUpdate};
use tokio::sync::RwLock;

#[derive(Debug, thiserror::Error)]
pub enum StepStoreError {
    #[error("Step not found: {0}")]
    NotFound(StepId),

    /// The step already left `Pending`; outcomes are written once.
    #[error("Step {id} is already {status:?}")]
    Conflict { id: StepId, status: StepStatus },
}

/// Read/write access to step records held by the coordination layer.
#[async_trait]
pub trait StepStore: Send + Sync {
    /// Fetch the current state of a step.
    async fn fetch(&self, id: StepId) -> Result<StepRecord, StepStoreError>;

    /// Record the terminal outcome of a step.
    async fn apply(&self, id: StepId, update: StepUpdate) -> Result<(), StepStoreError>;
}

/// Step store held entirely in process memory.
#[derive(Default)]
pub struct InMemoryStepStore {
    steps: RwLock<HashMap<StepId, StepRecord>>,
}

impl InMemoryStepStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a step record.
    pub async fn insert(&self, step: StepRecord) {
        self.steps.write().await.insert(step.id, step);
    }

    pub async fn len(&self) -> usize {
        self.steps.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.steps.read().await.is_empty()
    }
}

#[async_trait]
impl StepStore for InMemoryStepStore {
    async fn fetch(&self, id: StepId) -> Result<StepRecord, StepStoreError> {
        self.steps
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(StepStoreError::NotFound(id))
    }

    async fn apply(&self, id: StepId, update: StepUpdate) -> Result<(), StepStoreError> {
        let mut steps = self.steps.write().await;
        let step = steps.get_mut(&id).ok_or(StepStoreError::NotFound(id))?;

        if step.status.is_terminal() {
            return Err(StepStoreError::Conflict {
                id,
                status: step.status,
            });
        }

        tracing::debug!(step_id = %id, status = ?update.status(), "Applying step update");
        step.apply(update);
        Ok(())
    }
}
