//! Static routing from request kind to provider adapter.
//!
//! | Kind          | Adapter                                   |
//! |---------------|-------------------------------------------|
//! | `text2image`  | fal.ai FLUX text-to-image                 |
//! | `image2image` | fal.ai FLUX image-to-image                |
//! | `text2video`  | Kling or Runway, per [`VideoBackend`]     |
//!
//! The video backend is chosen once from configuration. There is no
//! failover between video providers.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use mediagen_core::{GenerationKind, GenerationRequest, RequestContext};
use mediagen_providers::http::DEFAULT_REQUEST_TIMEOUT;
use mediagen_providers::{
    run_job, FalImageToImage, FalTextToImage, Generation, JobAdapter, KlingAdapter, PollPolicy,
    ProviderHttp, RunwayAdapter,
};

use crate::error::GenerationError;
use crate::generator::Generator;

// ---------------------------------------------------------------------------
// VideoBackend
// ---------------------------------------------------------------------------

/// Which provider serves `text2video`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VideoBackend {
    #[default]
    Kling,
    Runway,
}

impl VideoBackend {
    pub fn as_str(self) -> &'static str {
        match self {
            VideoBackend::Kling => "kling",
            VideoBackend::Runway => "runway",
        }
    }
}

impl fmt::Display for VideoBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VideoBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "kling" | "piapi" => Ok(VideoBackend::Kling),
            "runway" => Ok(VideoBackend::Runway),
            other => Err(format!("unknown video provider '{other}'")),
        }
    }
}

// ---------------------------------------------------------------------------
// ProviderSettings
// ---------------------------------------------------------------------------

/// Credentials and endpoints for building a [`ProviderRouter`].
///
/// Base URLs left as `None` use each provider's public endpoint.
#[derive(Debug, Clone)]
pub struct ProviderSettings {
    pub fal_api_key: Option<String>,
    pub piapi_api_key: Option<String>,
    pub runway_api_key: Option<String>,
    pub fal_base_url: Option<String>,
    pub piapi_base_url: Option<String>,
    pub runway_base_url: Option<String>,
    pub video_backend: VideoBackend,
    pub poll: PollPolicy,
    pub http_timeout: Duration,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            fal_api_key: None,
            piapi_api_key: None,
            runway_api_key: None,
            fal_base_url: None,
            piapi_base_url: None,
            runway_base_url: None,
            video_backend: VideoBackend::default(),
            poll: PollPolicy::default(),
            http_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

fn require(key: &Option<String>, var: &str) -> Result<String, GenerationError> {
    key.as_deref()
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .map(str::to_string)
        .ok_or_else(|| GenerationError::Configuration(format!("{var} is not set")))
}

// ---------------------------------------------------------------------------
// ProviderRouter
// ---------------------------------------------------------------------------

/// Live [`Generator`]: one adapter per kind, driven by [`run_job`].
pub struct ProviderRouter {
    text_to_image: Arc<dyn JobAdapter>,
    image_to_image: Arc<dyn JobAdapter>,
    text_to_video: Arc<dyn JobAdapter>,
    policy: PollPolicy,
}

impl ProviderRouter {
    pub fn new(
        text_to_image: Arc<dyn JobAdapter>,
        image_to_image: Arc<dyn JobAdapter>,
        text_to_video: Arc<dyn JobAdapter>,
        policy: PollPolicy,
    ) -> Self {
        Self {
            text_to_image,
            image_to_image,
            text_to_video,
            policy,
        }
    }

    /// Build all adapters from settings.
    ///
    /// Fails with [`GenerationError::Configuration`] when a key needed by
    /// the selected providers is missing.
    pub fn from_settings(settings: &ProviderSettings) -> Result<Self, GenerationError> {
        let http = ProviderHttp::new(settings.http_timeout)?;

        let fal_key = require(&settings.fal_api_key, "FAL_API_KEY")?;
        let mut text_to_image = FalTextToImage::new(http.clone(), fal_key.clone());
        let mut image_to_image = FalImageToImage::new(http.clone(), fal_key);
        if let Some(url) = &settings.fal_base_url {
            text_to_image = text_to_image.with_base_url(url);
            image_to_image = image_to_image.with_base_url(url);
        }

        let text_to_video: Arc<dyn JobAdapter> = match settings.video_backend {
            VideoBackend::Kling => {
                let key = require(&settings.piapi_api_key, "PIAPI_API_KEY")?;
                let mut adapter = KlingAdapter::new(http, key);
                if let Some(url) = &settings.piapi_base_url {
                    adapter = adapter.with_base_url(url);
                }
                Arc::new(adapter)
            }
            VideoBackend::Runway => {
                let key = require(&settings.runway_api_key, "RUNWAY_API_KEY")?;
                let mut adapter = RunwayAdapter::new(http, key);
                if let Some(url) = &settings.runway_base_url {
                    adapter = adapter.with_base_url(url);
                }
                Arc::new(adapter)
            }
        };

        tracing::info!(
            video_backend = %settings.video_backend,
            poll_interval_ms = settings.poll.interval.as_millis() as u64,
            "Provider router configured",
        );

        Ok(Self::new(
            Arc::new(text_to_image),
            Arc::new(image_to_image),
            text_to_video,
            settings.poll,
        ))
    }

    pub fn adapter_for(&self, kind: GenerationKind) -> &dyn JobAdapter {
        match kind {
            GenerationKind::TextToImage => self.text_to_image.as_ref(),
            GenerationKind::ImageToImage => self.image_to_image.as_ref(),
            GenerationKind::TextToVideo => self.text_to_video.as_ref(),
        }
    }
}

#[async_trait]
impl Generator for ProviderRouter {
    fn model(&self, kind: GenerationKind) -> &str {
        self.adapter_for(kind).model()
    }

    async fn generate(
        &self,
        request: &GenerationRequest,
        _context: &RequestContext,
    ) -> Result<Generation, GenerationError> {
        let adapter = self.adapter_for(request.kind());
        tracing::debug!(
            kind = %request.kind(),
            provider = %adapter.provider(),
            model = adapter.model(),
            "Routing generation request",
        );
        Ok(run_job(adapter, request, &self.policy).await?)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
