//! Shared fixtures for worker integration tests.

#![allow(dead_code)]

pub mod kling;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use mediagen_core::{Artifact, GenerationKind, GenerationRequest, RequestContext, StepId, StepRecord};
use mediagen_events::InMemoryStepStore;
use mediagen_pipeline::{GenerationError, Generator, ProviderRouter, ProviderSettings};
use mediagen_providers::{Generation, PollPolicy, ProviderKind, Usage};
use serde_json::{json, Value};

/// Generator that counts calls and always returns the same URL.
#[derive(Default)]
pub struct CountingGenerator {
    calls: AtomicUsize,
    delay: Duration,
}

impl CountingGenerator {
    pub const URL: &'static str = "https://cdn/counted.png";

    /// Sleep for `delay` inside every call before returning.
    pub fn slow(delay: Duration) -> Self {
        Self {
            delay,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Generator for CountingGenerator {
    fn model(&self, _kind: GenerationKind) -> &str {
        "counting"
    }

    async fn generate(
        &self,
        _request: &GenerationRequest,
        _context: &RequestContext,
    ) -> Result<Generation, GenerationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        Ok(Generation {
            artifact: Artifact::new(Self::URL),
            provider: ProviderKind::Dummy,
            model: "counting".into(),
            usage: Usage::Units(1),
            payload: Value::Null,
        })
    }
}

/// Live router whose video adapter talks to a fake Kling at `base_url`.
pub fn kling_router(base_url: String) -> ProviderRouter {
    let settings = ProviderSettings {
        fal_api_key: Some("fal-key".into()),
        piapi_api_key: Some("piapi-key".into()),
        piapi_base_url: Some(base_url),
        poll: PollPolicy::every(Duration::from_millis(10)),
        ..ProviderSettings::default()
    };
    ProviderRouter::from_settings(&settings).expect("router from test settings")
}

/// Insert a pending step and return its id.
pub async fn pending_step(store: &InMemoryStepStore, kind: &str, params: Value) -> StepId {
    let id = StepId::new_v4();
    store.insert(StepRecord::pending(id, kind, params)).await;
    id
}

pub fn video_params(duration: u32) -> Value {
    json!({"images": ["https://x/1.png"], "prompt": "fox running", "duration": duration})
}

pub fn store() -> Arc<InMemoryStepStore> {
    Arc::new(InMemoryStepStore::new())
}
