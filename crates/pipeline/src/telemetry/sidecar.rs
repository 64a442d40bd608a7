//! Transparent usage recording around an operation.

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use mediagen_core::{GenerationKind, GenerationRequest, RequestContext};
use mediagen_providers::{Generation, Usage};
use serde::Serialize;
use serde_json::Value;

use super::identity::Identity;
use super::sink::{UsageRecord, UsageSink};
use crate::error::GenerationError;
use crate::generator::Generator;

/// Records usage for successful operations without touching their result.
#[derive(Clone)]
pub struct Sidecar {
    identity: Identity,
    sink: Arc<dyn UsageSink>,
}

impl Sidecar {
    pub fn new(identity: Identity, sink: Arc<dyn UsageSink>) -> Self {
        Self { identity, sink }
    }

    pub fn identity(&self) -> Identity {
        self.identity
    }

    /// Run `operation` and return `result_extractor` applied to its output.
    ///
    /// On success a [`UsageRecord`] built from `usage_calculator` is written
    /// on a background task; sink errors are only logged. On failure the
    /// error is returned as is and nothing is recorded.
    pub async fn observe<T, R, E, Fut, X, U>(
        &self,
        model: &str,
        input: Value,
        operation: Fut,
        result_extractor: X,
        usage_calculator: U,
    ) -> Result<R, E>
    where
        Fut: Future<Output = Result<T, E>>,
        T: Serialize,
        X: FnOnce(T) -> R,
        U: FnOnce(&T) -> Usage,
    {
        let result = operation.await?;

        let usage = usage_calculator(&result);
        let output = serde_json::to_value(&result).unwrap_or_else(|e| {
            tracing::warn!(error = %e, model, "Usage output not serializable");
            Value::Null
        });
        let record = UsageRecord {
            session_id: self.identity.session_id,
            agent_id: self.identity.agent_id,
            model: model.to_string(),
            input,
            output,
            usage,
            recorded_at: Utc::now(),
        };

        let sink = Arc::clone(&self.sink);
        tokio::spawn(async move {
            if let Err(e) = sink.record(&record).await {
                tracing::warn!(error = %e, model = %record.model, "Failed to record usage");
            }
        });

        Ok(result_extractor(result))
    }
}

// ---------------------------------------------------------------------------
// ObservedGenerator
// ---------------------------------------------------------------------------

/// [`Generator`] decorator that routes every call through a [`Sidecar`].
pub struct ObservedGenerator<G> {
    inner: G,
    sidecar: Sidecar,
}

impl<G: Generator> ObservedGenerator<G> {
    pub fn new(inner: G, sidecar: Sidecar) -> Self {
        Self { inner, sidecar }
    }

    pub fn inner(&self) -> &G {
        &self.inner
    }
}

#[async_trait]
impl<G: Generator> Generator for ObservedGenerator<G> {
    fn model(&self, kind: GenerationKind) -> &str {
        self.inner.model(kind)
    }

    async fn generate(
        &self,
        request: &GenerationRequest,
        context: &RequestContext,
    ) -> Result<Generation, GenerationError> {
        let input = serde_json::to_value(request).unwrap_or(Value::Null);
        self.sidecar
            .observe(
                self.inner.model(request.kind()),
                input,
                self.inner.generate(request, context),
                |generation: Generation| generation,
                |generation: &Generation| generation.usage,
            )
            .await
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
