//! Provider-free generator used in dummy mode.
//!
//! Simulates provider latency with a random delay, then returns one of a
//! fixed set of sample URLs for the request kind. When the caller
//! supplies an artifact identifier the choice is a pure function of it,
//! so repeated runs for the same artifact yield the same URL.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use mediagen_core::{Artifact, GenerationKind, GenerationRequest, RequestContext};
use mediagen_providers::{Generation, ProviderKind, Usage};
use rand::Rng;
use serde_json::json;
use sha2::{Digest, Sha256};

use crate::error::GenerationError;
use crate::generator::Generator;

/// Returned when a kind has no sample pool.
pub const FALLBACK_SAMPLE_URL: &str = "https://samples.mediagen.dev/fallback/sample.png";

const IMAGE_SAMPLES: &[&str] = &[
    "https://samples.mediagen.dev/image/lighthouse.png",
    "https://samples.mediagen.dev/image/red-fox.png",
    "https://samples.mediagen.dev/image/harbor-dusk.png",
    "https://samples.mediagen.dev/image/forest-path.png",
    "https://samples.mediagen.dev/image/city-rain.png",
];

const VIDEO_SAMPLES: &[&str] = &[
    "https://samples.mediagen.dev/video/fox-running.mp4",
    "https://samples.mediagen.dev/video/waves.mp4",
    "https://samples.mediagen.dev/video/timelapse-clouds.mp4",
];

const DUMMY_MODEL: &str = "dummy";
const MIN_DELAY: Duration = Duration::from_secs(1);
const MAX_DELAY: Duration = Duration::from_secs(10);

/// Deterministic / random stand-in for the live providers.
pub struct DummyGenerator {
    min_delay: Duration,
    max_delay: Duration,
    pools: HashMap<GenerationKind, Vec<String>>,
}

impl DummyGenerator {
    pub fn new() -> Self {
        let images: Vec<String> = IMAGE_SAMPLES.iter().map(|s| s.to_string()).collect();
        let videos: Vec<String> = VIDEO_SAMPLES.iter().map(|s| s.to_string()).collect();
        let pools = HashMap::from([
            (GenerationKind::TextToImage, images.clone()),
            (GenerationKind::ImageToImage, images),
            (GenerationKind::TextToVideo, videos),
        ]);
        Self {
            min_delay: MIN_DELAY,
            max_delay: MAX_DELAY,
            pools,
        }
    }

    /// Override the simulated latency range (inclusive).
    pub fn with_delay(mut self, min: Duration, max: Duration) -> Self {
        self.min_delay = min.min(max);
        self.max_delay = max.max(min);
        self
    }

    /// Replace the sample pool for one kind.
    pub fn with_pool(mut self, kind: GenerationKind, urls: Vec<String>) -> Self {
        self.pools.insert(kind, urls);
        self
    }

    pub fn pool(&self, kind: GenerationKind) -> &[String] {
        self.pools.get(&kind).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Pick the sample URL for a request.
    pub fn pick(&self, kind: GenerationKind, artifact_id: Option<&str>) -> String {
        let pool = self.pool(kind);
        if pool.is_empty() {
            return FALLBACK_SAMPLE_URL.to_string();
        }
        let index = match artifact_id {
            Some(id) => stable_index(id, pool.len()),
            None => rand::rng().random_range(0..pool.len()),
        };
        pool[index].clone()
    }

    fn delay(&self) -> Duration {
        let min = self.min_delay.as_millis() as u64;
        let max = self.max_delay.as_millis() as u64;
        Duration::from_millis(rand::rng().random_range(min..=max))
    }
}

impl Default for DummyGenerator {
    fn default() -> Self {
        Self::new()
    }
}

/// Index into a pool of `len` derived from the SHA-256 of `id`.
fn stable_index(id: &str, len: usize) -> usize {
    let digest = Sha256::digest(id.as_bytes());
    let mut head = [0u8; 8];
    head.copy_from_slice(&digest[..8]);
    (u64::from_be_bytes(head) % len as u64) as usize
}

#[async_trait]
impl Generator for DummyGenerator {
    fn model(&self, _kind: GenerationKind) -> &str {
        DUMMY_MODEL
    }

    async fn generate(
        &self,
        request: &GenerationRequest,
        context: &RequestContext,
    ) -> Result<Generation, GenerationError> {
        let kind = request.kind();
        let delay = self.delay();
        tokio::time::sleep(delay).await;

        let url = self.pick(kind, context.artifact_id.as_deref());
        tracing::info!(
            kind = %kind,
            delay_ms = delay.as_millis() as u64,
            url = %url,
            "Dummy generation finished",
        );

        let usage = if kind.is_video() {
            Usage::Units(1)
        } else {
            Usage::Pixels(1024 * 1024)
        };
        Ok(Generation {
            artifact: Artifact::new(url),
            provider: ProviderKind::Dummy,
            model: DUMMY_MODEL.to_string(),
            usage,
            payload: json!({ "simulated_delay_ms": delay.as_millis() as u64 }),
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
