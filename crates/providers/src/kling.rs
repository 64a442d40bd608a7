//! Kling video generation via the PiAPI task API (video provider A).
//!
//! Tasks are created with `POST /api/v1/task` and followed with
//! `GET /api/v1/task/{id}`. Both responses wrap the task in a `data`
//! envelope whose `status` drives the lifecycle.

use async_trait::async_trait;
use mediagen_core::{Artifact, GenerationRequest, JobStatus};
use serde_json::{json, Value};

use crate::adapter::JobAdapter;
use crate::error::ProviderError;
use crate::http::{join_url, str_at, HttpError, ProviderHttp};
use crate::job::{Job, PollResponse, ProviderKind, Submission, TerminalJob, Usage};

pub const DEFAULT_PIAPI_URL: &str = "https://api.piapi.ai";

const MODEL: &str = "kling";
const MODEL_VERSION: &str = "1.6";

/// Coerce a requested duration to what Kling accepts: 5 stays 5,
/// anything else (including no request) becomes 10.
pub fn kling_duration(requested: Option<u32>) -> u32 {
    match requested {
        Some(5) => 5,
        _ => 10,
    }
}

/// Map a PiAPI task status to [`JobStatus`].
///
/// Unknown values are treated as still running.
pub fn map_status(raw: &str) -> JobStatus {
    match raw.to_ascii_lowercase().as_str() {
        "pending" | "staged" => JobStatus::Queued,
        "processing" => JobStatus::Running,
        "completed" => JobStatus::Succeeded,
        "failed" => JobStatus::Failed,
        "cancelled" | "canceled" => JobStatus::Cancelled,
        other => {
            tracing::warn!(status = other, "Unrecognized Kling task status, treating as running");
            JobStatus::Running
        }
    }
}

/// Build the task-creation body for a text-to-video request.
pub fn submit_payload(request: &GenerationRequest) -> Result<Value, ProviderError> {
    let GenerationRequest::TextToVideo {
        prompt,
        reference_images,
        duration_secs,
    } = request
    else {
        return Err(ProviderError::submission(
            ProviderKind::Kling,
            format!("unsupported request kind {}", request.kind()),
        ));
    };

    let elements: Vec<Value> = reference_images
        .iter()
        .map(|url| json!({ "image_url": url }))
        .collect();

    Ok(json!({
        "model": MODEL,
        "task_type": "video_generation",
        "input": {
            "prompt": prompt,
            "negative_prompt": "",
            "duration": kling_duration(*duration_secs),
            "elements": elements,
            "mode": "std",
            "aspect_ratio": "16:9",
            "version": MODEL_VERSION,
        }
    }))
}

/// Pick the video URL from a completed task, preferring the
/// watermark-free rendition.
pub fn extract_video_url(payload: &Value) -> Option<&str> {
    let video = payload.pointer("/data/output/works/0/video")?;
    str_at(video, "/resource_without_watermark").or_else(|| str_at(video, "/resource"))
}

/// PiAPI also reports failures in-band through a `code` field.
fn check_envelope(body: &Value) -> Result<(), String> {
    match body.get("code").and_then(Value::as_i64) {
        Some(200) | None => Ok(()),
        Some(code) => Err(format!(
            "code {code}: {}",
            str_at(body, "/message").unwrap_or("no message")
        )),
    }
}

/// Adapter for Kling text/reference-image to video.
pub struct KlingAdapter {
    http: ProviderHttp,
    api_key: String,
    base_url: String,
}

impl KlingAdapter {
    pub fn new(http: ProviderHttp, api_key: impl Into<String>) -> Self {
        Self {
            http,
            api_key: api_key.into(),
            base_url: DEFAULT_PIAPI_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<Value, HttpError> {
        self.http
            .send_json(request.header("x-api-key", &self.api_key))
            .await
    }
}

#[async_trait]
impl JobAdapter for KlingAdapter {
    fn provider(&self) -> ProviderKind {
        ProviderKind::Kling
    }

    fn model(&self) -> &str {
        MODEL
    }

    async fn submit(&self, request: &GenerationRequest) -> Result<Submission, ProviderError> {
        let payload = submit_payload(request)?;
        let url = join_url(&self.base_url, "api/v1/task");

        let body = self
            .send(self.http.client().post(url).json(&payload))
            .await
            .map_err(|e| ProviderError::submission(ProviderKind::Kling, e))?;
        check_envelope(&body).map_err(|e| ProviderError::submission(ProviderKind::Kling, e))?;

        let task_id = str_at(&body, "/data/task_id").ok_or_else(|| {
            ProviderError::submission(ProviderKind::Kling, "response has no data.task_id")
        })?;
        let raw_status = str_at(&body, "/data/status").unwrap_or("pending");
        let job = Job::new(ProviderKind::Kling, task_id, map_status(raw_status), raw_status);

        if job.status == JobStatus::Succeeded {
            return Ok(Submission::Completed(TerminalJob { job, payload: body }));
        }
        Ok(Submission::Pending(job))
    }

    async fn poll(&self, job: &Job) -> Result<PollResponse, ProviderError> {
        let url = join_url(&self.base_url, &format!("api/v1/task/{}", job.id));

        let body = self
            .send(self.http.client().get(url))
            .await
            .map_err(|e| ProviderError::poll(ProviderKind::Kling, &job.id, e))?;
        check_envelope(&body).map_err(|e| ProviderError::poll(ProviderKind::Kling, &job.id, e))?;

        let raw_status = str_at(&body, "/data/status")
            .ok_or_else(|| ProviderError::poll(ProviderKind::Kling, &job.id, "response has no data.status"))?
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
                ProviderError::extraction(
                    ProviderKind::Kling,
                    &terminal.job.id,
                    "data.output.works[0].video has no resource",
                )
            })
    }

    fn usage(&self, _terminal: &TerminalJob) -> Usage {
        Usage::Units(1)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
