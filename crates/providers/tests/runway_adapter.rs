//! Integration tests for the Runway adapter against a fake task API.

mod common;

use assert_matches::assert_matches;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use mediagen_core::GenerationRequest;
use mediagen_providers::runway::RUNWAY_API_VERSION;
use mediagen_providers::{run_job, ProviderError, ProviderKind, RunwayAdapter};
use serde_json::{json, Value};

use common::{fast_policy, header, http, serve, Script};

async fn submit(
    State(script): State<Script>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    let (status, body) = script.submit(headers, body);
    (status, Json(body))
}

async fn task(
    State(script): State<Script>,
    Path(_id): Path<String>,
    headers: HeaderMap,
) -> (StatusCode, Json<Value>) {
    let (status, body) = script.poll(headers);
    (status, Json(body))
}

async fn adapter_for(script: &Script) -> RunwayAdapter {
    let app = Router::new()
        .route("/v1/image_to_video", post(submit))
        .route("/v1/tasks/{id}", get(task))
        .with_state(script.clone());
    let base_url = serve(app).await;
    RunwayAdapter::new(http(), "runway-key").with_base_url(base_url)
}

fn request() -> GenerationRequest {
    GenerationRequest::text_to_video(
        "waves at dusk",
        vec!["https://img/first.png".into(), "https://img/second.png".into()],
        Some(10),
    )
}

// ---------------------------------------------------------------------------
// Test: synchronous completion
// ---------------------------------------------------------------------------

/// An `output` array in the creation response completes the job without a
/// single status check.
#[tokio::test]
async fn synchronous_output_skips_polling() {
    let script = Script::new(
        json!({"id": "rw-1", "output": ["https://cdn/sync.mp4"]}),
        vec![],
    );
    let adapter = adapter_for(&script).await;

    let generation = run_job(&adapter, &request(), &fast_policy())
        .await
        .expect("job should succeed");

    assert_eq!(generation.artifact.url, "https://cdn/sync.mp4");
    assert_eq!(generation.provider, ProviderKind::Runway);
    assert_eq!(generation.model, "gen3a_turbo");
    assert_eq!(script.poll_count(), 0);
}

/// Creation carries bearer auth, the API version header, and the
/// single-image body.
#[tokio::test]
async fn submission_headers_and_body() {
    let script = Script::new(json!({"output": ["https://cdn/sync.mp4"]}), vec![]);
    let adapter = adapter_for(&script).await;

    run_job(&adapter, &request(), &fast_policy())
        .await
        .expect("job should succeed");

    let captured = &script.submissions()[0];
    assert_eq!(header(&captured.headers, "authorization"), "Bearer runway-key");
    assert_eq!(header(&captured.headers, "x-runway-version"), RUNWAY_API_VERSION);
    assert_eq!(
        captured.body,
        json!({
            "model": "gen3a_turbo",
            "promptImage": "https://img/first.png",
            "promptText": "waves at dusk",
            "duration": 5
        })
    );
}

// ---------------------------------------------------------------------------
// Test: polled completion
// ---------------------------------------------------------------------------

/// Without inline output the task is polled until it succeeds.
#[tokio::test]
async fn polled_task_succeeds() {
    let script = Script::new(
        json!({"id": "rw-2", "status": "PENDING"}),
        vec![
            json!({"id": "rw-2", "status": "THROTTLED"}),
            json!({"id": "rw-2", "status": "RUNNING"}),
            json!({"id": "rw-2", "status": "SUCCEEDED", "output": ["https://cdn/polled.mp4"]}),
        ],
    );
    let adapter = adapter_for(&script).await;

    let generation = run_job(&adapter, &request(), &fast_policy())
        .await
        .expect("job should succeed");

    assert_eq!(script.poll_count(), 3);
    assert_eq!(generation.artifact.url, "https://cdn/polled.mp4");
    for headers in script.poll_headers() {
        assert_eq!(header(&headers, "x-runway-version"), RUNWAY_API_VERSION);
    }
}

/// A failed task stops polling with the provider's raw status.
#[tokio::test]
async fn failed_task_stops_polling() {
    let script = Script::new(
        json!({"id": "rw-3"}),
        vec![json!({"id": "rw-3", "status": "FAILED", "failure": "moderation"})],
    );
    let adapter = adapter_for(&script).await;

    let err = run_job(&adapter, &request(), &fast_policy())
        .await
        .expect_err("job should fail");

    assert_matches!(err, ProviderError::JobFailed { ref status, .. } if status == "FAILED");
    assert_eq!(script.poll_count(), 1);
}

/// A response with neither an id nor output is a submission error.
#[tokio::test]
async fn creation_without_id_fails() {
    let script = Script::new(json!({"status": "PENDING"}), vec![]);
    let adapter = adapter_for(&script).await;

    let err = run_job(&adapter, &request(), &fast_policy())
        .await
        .expect_err("submission should fail");

    assert_matches!(err, ProviderError::Submission { provider: ProviderKind::Runway, .. });
}

/// A request without a reference image never reaches the provider.
#[tokio::test]
async fn missing_reference_image_is_rejected_locally() {
    let script = Script::new(json!({"id": "rw-4"}), vec![]);
    let adapter = adapter_for(&script).await;
    let request = GenerationRequest::text_to_video("waves", vec![], None);

    let err = run_job(&adapter, &request, &fast_policy())
        .await
        .expect_err("submission should fail");

    assert_matches!(err, ProviderError::Submission { .. });
    assert!(script.submissions().is_empty());
}
