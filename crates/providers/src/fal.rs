//! FLUX image generation through the fal.ai queue API.
//!
//! Both the image-synthesis and image-transform adapters share the same
//! queue protocol:
//!
//! * `POST {base}/{model}` enqueues a request and returns a `request_id`
//!   (plus, usually, `status_url` and `response_url`);
//! * `GET status_url` reports `IN_QUEUE`, `IN_PROGRESS` or `COMPLETED`;
//! * `GET response_url` returns the result document with an `images` list.

use async_trait::async_trait;
use mediagen_core::{Artifact, GenerationRequest, JobStatus};
use serde_json::{json, Value};

use crate::adapter::JobAdapter;
use crate::error::ProviderError;
use crate::http::{join_url, str_at, HttpError, ProviderHttp};
use crate::job::{Job, JobLinks, PollResponse, ProviderKind, Submission, TerminalJob, Usage};

pub const DEFAULT_FAL_URL: &str = "https://queue.fal.run";
pub const FLUX_TEXT_TO_IMAGE: &str = "fal-ai/flux/dev";
pub const FLUX_IMAGE_TO_IMAGE: &str = "fal-ai/flux/dev/image-to-image";

/// Dimensions assumed when the result omits them.
const FALLBACK_DIMENSION: u64 = 1024;

/// Map a fal queue status document to [`JobStatus`] and a raw status.
///
/// A `COMPLETED` request that carries an `error` is a failure.
pub fn map_status(body: &Value) -> (JobStatus, String) {
    let raw = str_at(body, "/status").unwrap_or("IN_QUEUE");
    match raw {
        "IN_QUEUE" => (JobStatus::Queued, raw.to_string()),
        "IN_PROGRESS" => (JobStatus::Running, raw.to_string()),
        "COMPLETED" => match str_at(body, "/error") {
            Some(error) => (JobStatus::Failed, format!("ERROR: {error}")),
            None => (JobStatus::Succeeded, raw.to_string()),
        },
        other => {
            tracing::warn!(status = other, "Unrecognized fal queue status, treating as running");
            (JobStatus::Running, other.to_string())
        }
    }
}

/// First image URL of a result document.
pub fn extract_image_url(payload: &Value) -> Option<&str> {
    str_at(payload, "/images/0/url")
}

/// Pixel count of the first image, saturating on oversized dimensions.
pub fn image_pixels(payload: &Value) -> u64 {
    let dim = |field: &str| {
        payload
            .pointer(&format!("/images/0/{field}"))
            .and_then(Value::as_u64)
            .unwrap_or(FALLBACK_DIMENSION)
    };
    dim("width").saturating_mul(dim("height"))
}

// ---------------------------------------------------------------------------
// Shared queue client
// ---------------------------------------------------------------------------

struct FalQueue {
    http: ProviderHttp,
    api_key: String,
    base_url: String,
    model: String,
}

impl FalQueue {
    fn new(http: ProviderHttp, api_key: String, model: &str) -> Self {
        Self {
            http,
            api_key,
            base_url: DEFAULT_FAL_URL.to_string(),
            model: model.to_string(),
        }
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<Value, HttpError> {
        self.http
            .send_json(request.header("Authorization", format!("Key {}", self.api_key)))
            .await
    }

    fn request_url(&self, id: &str) -> String {
        join_url(&self.base_url, &format!("{}/requests/{id}", self.model))
    }

    async fn submit(&self, payload: Value) -> Result<Submission, ProviderError> {
        let url = join_url(&self.base_url, &self.model);
        let body = self
            .send(self.http.client().post(url).json(&payload))
            .await
            .map_err(|e| ProviderError::submission(ProviderKind::Fal, e))?;

        let id = str_at(&body, "/request_id").ok_or_else(|| {
            ProviderError::submission(ProviderKind::Fal, "response has no request_id")
        })?;
        let (status, raw_status) = map_status(&body);
        let links = JobLinks {
            status_url: str_at(&body, "/status_url").map(str::to_string),
            result_url: str_at(&body, "/response_url").map(str::to_string),
        };

        Ok(Submission::Pending(
            Job::new(ProviderKind::Fal, id, status, raw_status).with_links(links),
        ))
    }

    async fn poll(&self, job: &Job) -> Result<PollResponse, ProviderError> {
        let url = job
            .links
            .status_url
            .clone()
            .unwrap_or_else(|| format!("{}/status", self.request_url(&job.id)));

        let body = self
            .send(self.http.client().get(url))
            .await
            .map_err(|e| ProviderError::poll(ProviderKind::Fal, &job.id, e))?;
        if str_at(&body, "/status").is_none() {
            return Err(ProviderError::poll(ProviderKind::Fal, &job.id, "response has no status"));
        }

        let (status, raw_status) = map_status(&body);
        Ok(PollResponse {
            status,
            raw_status,
            payload: body,
        })
    }

    async fn fetch_result(&self, job: &Job) -> Result<Value, ProviderError> {
        let url = job
            .links
            .result_url
            .clone()
            .unwrap_or_else(|| self.request_url(&job.id));

        self.send(self.http.client().get(url))
            .await
            .map_err(|e| ProviderError::poll(ProviderKind::Fal, &job.id, e))
    }

    fn extract_artifact(&self, terminal: &TerminalJob) -> Result<Artifact, ProviderError> {
        extract_image_url(&terminal.payload)
            .map(Artifact::new)
            .ok_or_else(|| {
                ProviderError::extraction(ProviderKind::Fal, &terminal.job.id, "result has no images")
            })
    }
}

// ---------------------------------------------------------------------------
// Text to image
// ---------------------------------------------------------------------------

/// FLUX text-to-image (image-synthesis provider).
pub struct FalTextToImage {
    queue: FalQueue,
}

impl FalTextToImage {
    pub fn new(http: ProviderHttp, api_key: impl Into<String>) -> Self {
        Self {
            queue: FalQueue::new(http, api_key.into(), FLUX_TEXT_TO_IMAGE),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.queue.base_url = base_url.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.queue.model = model.into();
        self
    }

    pub fn submit_payload(request: &GenerationRequest) -> Result<Value, ProviderError> {
        match request {
            GenerationRequest::TextToImage { prompt } => Ok(json!({
                "prompt": prompt,
                "num_images": 1,
            })),
            other => Err(ProviderError::submission(
                ProviderKind::Fal,
                format!("{FLUX_TEXT_TO_IMAGE} cannot serve {}", other.kind()),
            )),
        }
    }
}

#[async_trait]
impl JobAdapter for FalTextToImage {
    fn provider(&self) -> ProviderKind {
        ProviderKind::Fal
    }

    fn model(&self) -> &str {
        &self.queue.model
    }

    async fn submit(&self, request: &GenerationRequest) -> Result<Submission, ProviderError> {
        self.queue.submit(Self::submit_payload(request)?).await
    }

    async fn poll(&self, job: &Job) -> Result<PollResponse, ProviderError> {
        self.queue.poll(job).await
    }

    async fn fetch_result(&self, job: &Job, _payload: Value) -> Result<Value, ProviderError> {
        self.queue.fetch_result(job).await
    }

    fn extract_artifact(&self, terminal: &TerminalJob) -> Result<Artifact, ProviderError> {
        self.queue.extract_artifact(terminal)
    }

    fn usage(&self, terminal: &TerminalJob) -> Usage {
        Usage::Pixels(image_pixels(&terminal.payload))
    }
}

// ---------------------------------------------------------------------------
// Image to image
// ---------------------------------------------------------------------------

/// Numeric knobs for the image-transform model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransformSettings {
    pub strength: f64,
    pub guidance_scale: f64,
    pub num_inference_steps: u32,
}

impl Default for TransformSettings {
    fn default() -> Self {
        Self {
            strength: 0.95,
            guidance_scale: 5.0,
            num_inference_steps: 40,
        }
    }
}

/// FLUX image-to-image (image-transform provider).
pub struct FalImageToImage {
    queue: FalQueue,
    settings: TransformSettings,
}

impl FalImageToImage {
    pub fn new(http: ProviderHttp, api_key: impl Into<String>) -> Self {
        Self {
            queue: FalQueue::new(http, api_key.into(), FLUX_IMAGE_TO_IMAGE),
            settings: TransformSettings::default(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.queue.base_url = base_url.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.queue.model = model.into();
        self
    }

    pub fn with_settings(mut self, settings: TransformSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn submit_payload(&self, request: &GenerationRequest) -> Result<Value, ProviderError> {
        match request {
            GenerationRequest::ImageToImage { source_url, prompt } => Ok(json!({
                "image_url": source_url,
                "prompt": prompt,
                "strength": self.settings.strength,
                "guidance_scale": self.settings.guidance_scale,
                "num_inference_steps": self.settings.num_inference_steps,
                "num_images": 1,
            })),
            other => Err(ProviderError::submission(
                ProviderKind::Fal,
                format!("{FLUX_IMAGE_TO_IMAGE} cannot serve {}", other.kind()),
            )),
        }
    }
}

#[async_trait]
impl JobAdapter for FalImageToImage {
    fn provider(&self) -> ProviderKind {
        ProviderKind::Fal
    }

    fn model(&self) -> &str {
        &self.queue.model
    }

    async fn submit(&self, request: &GenerationRequest) -> Result<Submission, ProviderError> {
        self.queue.submit(self.submit_payload(request)?).await
    }

    async fn poll(&self, job: &Job) -> Result<PollResponse, ProviderError> {
        self.queue.poll(job).await
    }

    async fn fetch_result(&self, job: &Job, _payload: Value) -> Result<Value, ProviderError> {
        self.queue.fetch_result(job).await
    }

    fn extract_artifact(&self, terminal: &TerminalJob) -> Result<Artifact, ProviderError> {
        self.queue.extract_artifact(terminal)
    }

    fn usage(&self, terminal: &TerminalJob) -> Usage {
        Usage::Pixels(image_pixels(&terminal.payload))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn http() -> ProviderHttp {
        ProviderHttp::with_client(reqwest::Client::new())
    }

    #[test]
    fn transform_defaults() {
        let settings = TransformSettings::default();
        assert_eq!(settings.strength, 0.95);
        assert_eq!(settings.guidance_scale, 5.0);
        assert_eq!(settings.num_inference_steps, 40);
    }

    #[test]
    fn image_to_image_payload() {
        let adapter = FalImageToImage::new(http(), "key");
        let payload = adapter
            .submit_payload(&GenerationRequest::image_to_image("https://x/src.png", "watercolor"))
            .unwrap();
        assert_eq!(
            payload,
            json!({
                "image_url": "https://x/src.png",
                "prompt": "watercolor",
                "strength": 0.95,
                "guidance_scale": 5.0,
                "num_inference_steps": 40,
                "num_images": 1
            })
        );
    }

    #[test]
    fn text_to_image_rejects_other_kinds() {
        let err = FalTextToImage::submit_payload(&GenerationRequest::image_to_image("https://x", "p"))
            .unwrap_err();
        assert_matches!(err, ProviderError::Submission { provider: ProviderKind::Fal, .. });
    }

    #[test]
    fn queue_statuses() {
        assert_eq!(map_status(&json!({"status": "IN_QUEUE"})).0, JobStatus::Queued);
        assert_eq!(map_status(&json!({"status": "IN_PROGRESS"})).0, JobStatus::Running);
        assert_eq!(map_status(&json!({"status": "COMPLETED"})).0, JobStatus::Succeeded);
        assert_eq!(
            map_status(&json!({"status": "COMPLETED", "error": "nsfw"})),
            (JobStatus::Failed, "ERROR: nsfw".to_string())
        );
    }

    #[test]
    fn first_image_wins() {
        let payload = json!({"images": [
            {"url": "https://cdn/a.png", "width": 512, "height": 768},
            {"url": "https://cdn/b.png"}
        ]});
        assert_eq!(extract_image_url(&payload), Some("https://cdn/a.png"));
        assert_eq!(image_pixels(&payload), 512 * 768);
    }

    #[test]
    fn empty_image_list_has_no_artifact() {
        assert_eq!(extract_image_url(&json!({"images": []})), None);
    }

    #[test]
    fn missing_dimensions_fall_back() {
        assert_eq!(image_pixels(&json!({"images": [{"url": "u"}]})), 1024 * 1024);
    }

    #[test]
    fn oversized_dimensions_saturate() {
        let payload = json!({"images": [{"url": "u", "width": u64::MAX, "height": 2}]});
        assert_eq!(image_pixels(&payload), u64::MAX);
    }
}
