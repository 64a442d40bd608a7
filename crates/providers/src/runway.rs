//! Runway image-to-video (video provider B).
//!
//! A single reference image plus a prompt is posted to
//! `/v1/image_to_video`; the job is followed with `GET /v1/tasks/{id}`.
//! When the creation response already carries an `output` array the job
//! finished synchronously and is never polled.

use async_trait::async_trait;
use mediagen_core::{Artifact, GenerationRequest, JobStatus};
use serde_json::{json, Value};

use crate::adapter::JobAdapter;
use crate::error::ProviderError;
use crate::http::{join_url, str_at, HttpError, ProviderHttp};
use crate::job::{Job, PollResponse, ProviderKind, Submission, TerminalJob, Usage};

pub const DEFAULT_RUNWAY_URL: &str = "https://api.dev.runwayml.com";
pub const RUNWAY_API_VERSION: &str = "2024-11-06";

const MODEL: &str = "gen3a_turbo";
const DURATION_SECS: u32 = 5;

/// Map a Runway task status to [`JobStatus`].
///
/// Any value outside the documented vocabulary is logged and treated as
/// still running rather than failing the job.
pub fn map_status(raw: &str) -> JobStatus {
    match raw {
        "SUCCEEDED" => JobStatus::Succeeded,
        "FAILED" => JobStatus::Failed,
        "CANCELLED" => JobStatus::Cancelled,
        "RUNNING" | "PENDING" | "THROTTLED" => JobStatus::Running,
        other => {
            tracing::warn!(status = other, "Unrecognized Runway task status, treating as running");
            JobStatus::Running
        }
    }
}

/// Build the image-to-video body. Runway takes exactly one reference
/// image; the first one is used.
pub fn submit_payload(request: &GenerationRequest) -> Result<Value, ProviderError> {
    let GenerationRequest::TextToVideo {
        prompt,
        reference_images,
        ..
    } = request
    else {
        return Err(ProviderError::submission(
            ProviderKind::Runway,
            format!("unsupported request kind {}", request.kind()),
        ));
    };

    let image = reference_images.first().ok_or_else(|| {
        ProviderError::submission(ProviderKind::Runway, "a reference image is required")
    })?;
    if reference_images.len() > 1 {
        tracing::debug!(
            ignored = reference_images.len() - 1,
            "Runway accepts one reference image, ignoring the rest",
        );
    }

    Ok(json!({
        "model": MODEL,
        "promptImage": image,
        "promptText": prompt,
        "duration": DURATION_SECS,
    }))
}

pub fn extract_video_url(payload: &Value) -> Option<&str> {
    str_at(payload, "/output/0")
}

/// Adapter for Runway Gen-3 Alpha Turbo.
pub struct RunwayAdapter {
    http: ProviderHttp,
    api_key: String,
    base_url: String,
}

impl RunwayAdapter {
    pub fn new(http: ProviderHttp, api_key: impl Into<String>) -> Self {
        Self {
            http,
            api_key: api_key.into(),
            base_url: DEFAULT_RUNWAY_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<Value, HttpError> {
        let request = request
            .bearer_auth(&self.api_key)
            .header("X-Runway-Version", RUNWAY_API_VERSION);
        self.http.send_json(request).await
    }
}

#[async_trait]
impl JobAdapter for RunwayAdapter {
    fn provider(&self) -> ProviderKind {
        ProviderKind::Runway
    }

    fn model(&self) -> &str {
        MODEL
    }

    async fn submit(&self, request: &GenerationRequest) -> Result<Submission, ProviderError> {
        let payload = submit_payload(request)?;
        let url = join_url(&self.base_url, "v1/image_to_video");

        let body = self
            .send(self.http.client().post(url).json(&payload))
            .await
            .map_err(|e| ProviderError::submission(ProviderKind::Runway, e))?;

        if body.get("output").is_some_and(Value::is_array) {
            let id = str_at(&body, "/id").unwrap_or("synchronous");
            let job = Job::new(ProviderKind::Runway, id, JobStatus::Succeeded, "SUCCEEDED");
            return Ok(Submission::Completed(TerminalJob { job, payload: body }));
        }

        let id = str_at(&body, "/id").ok_or_else(|| {
            ProviderError::submission(ProviderKind::Runway, "response has neither id nor output")
        })?;
        let raw_status = str_at(&body, "/status").unwrap_or("PENDING");
        Ok(Submission::Pending(Job::new(
            ProviderKind::Runway,
            id,
            map_status(raw_status),
            raw_status,
        )))
    }

    async fn poll(&self, job: &Job) -> Result<PollResponse, ProviderError> {
        let url = join_url(&self.base_url, &format!("v1/tasks/{}", job.id));

        let body = self
            .send(self.http.client().get(url))
            .await
            .map_err(|e| ProviderError::poll(ProviderKind::Runway, &job.id, e))?;

        let raw_status = str_at(&body, "/status")
            .ok_or_else(|| ProviderError::poll(ProviderKind::Runway, &job.id, "response has no status"))?
            .to_string();

        Ok(PollResponse {
            status: map_status(&raw_status),
            raw_status,
            payload: body,
        })
    }

    fn extract_artifact(&self, terminal: &TerminalJob) -> Result<Artifact, ProviderError> {
        extract_video_url(&terminal.payload)
            .map(Artifact::new)
            .ok_or_else(|| {
                ProviderError::extraction(ProviderKind::Runway, &terminal.job.id, "output[0] is missing")
            })
    }

    fn usage(&self, _terminal: &TerminalJob) -> Usage {
        Usage::Units(1)
    }
}
