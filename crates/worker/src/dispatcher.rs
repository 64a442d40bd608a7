//! Per-step handler: turns one pending step into one generation.
//!
//! A step moves `Pending → Completed` or `Pending → Failed` exactly once.
//! Steps that already left `Pending` are skipped without side effects, and
//! a step already being generated by this handler is not started again, so
//! a duplicated trigger event is harmless. Failures are written to the
//! step before the error is returned to the caller.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};

use mediagen_core::{
    step_cost, CostUnits, CoreError, GenerationKind, GenerationRequest, RequestContext, StepId,
    StepRecord, StepStatus, StepUpdate,
};
use mediagen_events::{StepStore, StepStoreError};
use mediagen_pipeline::{GenerationError, Generator};

#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// Reading or writing the step failed.
    #[error(transparent)]
    Store(#[from] StepStoreError),

    /// The step's kind or parameters do not describe a valid request.
    #[error("Invalid work item: {0}")]
    InvalidWorkItem(#[from] CoreError),

    /// Generation failed; the step has been marked `Failed`.
    #[error(transparent)]
    Generation(#[from] GenerationError),
}

/// What [`StepHandler::handle`] did with a step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandleOutcome {
    /// The step was generated and marked `Completed`.
    Completed { url: String, cost: CostUnits },
    /// The step was not `Pending`; nothing was done.
    Skipped { status: StepStatus },
    /// Another call is already generating this step; nothing was done.
    InFlight,
}

/// Dispatches steps to the live or dummy generator.
pub struct StepHandler {
    store: Arc<dyn StepStore>,
    live: Arc<dyn Generator>,
    dummy: Arc<dyn Generator>,
    dummy_mode: bool,
    in_flight: Mutex<HashSet<StepId>>,
}

/// Holds a step's in-flight slot; releases it on drop.
struct Claim<'a> {
    in_flight: &'a Mutex<HashSet<StepId>>,
    step_id: StepId,
}

impl Drop for Claim<'_> {
    fn drop(&mut self) {
        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.step_id);
    }
}

impl StepHandler {
    pub fn new(
        store: Arc<dyn StepStore>,
        live: Arc<dyn Generator>,
        dummy: Arc<dyn Generator>,
        dummy_mode: bool,
    ) -> Self {
        Self {
            store,
            live,
            dummy,
            dummy_mode,
            in_flight: Mutex::new(HashSet::new()),
        }
    }

    pub fn dummy_mode(&self) -> bool {
        self.dummy_mode
    }

    /// Process one step.
    pub async fn handle(&self, step_id: StepId) -> Result<HandleOutcome, DispatchError> {
        let Some(_claim) = self.claim(step_id) else {
            tracing::info!(step_id = %step_id, "Step is already being generated, skipping");
            return Ok(HandleOutcome::InFlight);
        };

        let step = self.store.fetch(step_id).await?;
        if step.status != StepStatus::Pending {
            tracing::info!(
                step_id = %step_id,
                status = ?step.status,
                "Step is not pending, skipping",
            );
            return Ok(HandleOutcome::Skipped {
                status: step.status,
            });
        }

        let request = match parse_request(&step) {
            Ok(request) => request,
            Err(e) => {
                self.record_failure(step_id, &e.to_string()).await;
                return Err(DispatchError::InvalidWorkItem(e));
            }
        };
        let kind = request.kind();
        let context = RequestContext {
            artifact_id: step.artifact_id.clone(),
        };

        let generator = if self.dummy_mode {
            &self.dummy
        } else {
            &self.live
        };
        tracing::info!(
            step_id = %step_id,
            kind = %kind,
            dummy = self.dummy_mode,
            "Generating step",
        );

        match generator.generate(&request, &context).await {
            Ok(generation) => {
                let cost = step_cost(kind);
                self.store
                    .apply(step_id, StepUpdate::completed(kind, generation.artifact.url.clone()))
                    .await?;
                tracing::info!(
                    step_id = %step_id,
                    kind = %kind,
                    provider = %generation.provider,
                    cost,
                    url = %generation.artifact.url,
                    "Step completed",
                );
                Ok(HandleOutcome::Completed {
                    url: generation.artifact.url,
                    cost,
                })
            }
            Err(e) => {
                self.record_failure(step_id, &e.to_string()).await;
                Err(DispatchError::Generation(e))
            }
        }
    }

    /// Reserve `step_id` for this call, or `None` if another call holds it.
    fn claim(&self, step_id: StepId) -> Option<Claim<'_>> {
        let inserted = self
            .in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(step_id);
        inserted.then_some(Claim {
            in_flight: &self.in_flight,
            step_id,
        })
    }

    /// Mark the step `Failed`. A store error here is logged; the caller
    /// still sees the original failure.
    async fn record_failure(&self, step_id: StepId, message: &str) {
        tracing::error!(step_id = %step_id, error = message, "Step failed");
        if let Err(e) = self.store.apply(step_id, StepUpdate::failed(message)).await {
            tracing::error!(
                step_id = %step_id,
                error = %e,
                "Failed to record step failure",
            );
        }
    }
}

fn parse_request(step: &StepRecord) -> Result<GenerationRequest, CoreError> {
    let kind: GenerationKind = step.kind.parse()?;
    GenerationRequest::from_params(kind, &step.params)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use mediagen_events::InMemoryStepStore;
    use mediagen_pipeline::DummyGenerator;
    use serde_json::json;
    use std::time::Duration;

    use super::*;

    fn handler(store: Arc<InMemoryStepStore>) -> StepHandler {
        let dummy: Arc<dyn Generator> =
            Arc::new(DummyGenerator::new().with_delay(Duration::ZERO, Duration::ZERO));
        StepHandler::new(store, Arc::clone(&dummy), dummy, true)
    }

    #[tokio::test]
    async fn unknown_kind_marks_step_failed() {
        let store = Arc::new(InMemoryStepStore::new());
        let id = StepId::new_v4();
        store
            .insert(StepRecord::pending(id, "text2audio", json!({"prompt": "hum"})))
            .await;

        let err = handler(Arc::clone(&store)).handle(id).await.unwrap_err();

        assert_matches!(err, DispatchError::InvalidWorkItem(CoreError::UnknownKind(_)));
        let step = store.fetch(id).await.unwrap();
        assert_eq!(step.status, StepStatus::Failed);
        assert!(step.output.unwrap().contains("text2audio"));
    }

    #[tokio::test]
    async fn missing_step_is_a_store_error() {
        let store = Arc::new(InMemoryStepStore::new());
        let err = handler(store).handle(StepId::new_v4()).await.unwrap_err();
        assert_matches!(err, DispatchError::Store(StepStoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn image_steps_cost_one_unit() {
        let store = Arc::new(InMemoryStepStore::new());
        let id = StepId::new_v4();
        store
            .insert(StepRecord::pending(
                id,
                "image2image",
                json!({"image_url": "https://x/src.png", "prompt": "ink"}),
            ))
            .await;

        let outcome = handler(Arc::clone(&store)).handle(id).await.unwrap();

        assert_matches!(outcome, HandleOutcome::Completed { cost: 1, .. });
        assert_eq!(store.fetch(id).await.unwrap().cost, Some(1));
    }
}
