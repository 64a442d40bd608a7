//! Fake Kling task API for pipeline tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};

/// Replays one `data.status` per poll; the last entry repeats.
#[derive(Clone, Default)]
pub struct FakeKling {
    statuses: Arc<Mutex<VecDeque<Value>>>,
    last: Arc<Mutex<Value>>,
    submissions: Arc<Mutex<Vec<Value>>>,
    polls: Arc<AtomicUsize>,
}

impl FakeKling {
    pub fn new(statuses: Vec<Value>) -> Self {
        Self {
            statuses: Arc::new(Mutex::new(statuses.into())),
            ..Self::default()
        }
    }

    pub fn polls(&self) -> usize {
        self.polls.load(Ordering::SeqCst)
    }

    pub fn submissions(&self) -> Vec<Value> {
        self.submissions.lock().unwrap().clone()
    }

    /// Serve the fake on an ephemeral port and return its base URL.
    pub async fn serve(&self) -> String {
        let app = Router::new()
            .route("/api/v1/task", post(submit))
            .route("/api/v1/task/{id}", get(task))
            .with_state(self.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind test listener");
        let addr = listener.local_addr().expect("listener address");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("test server");
        });
        format!("http://{addr}")
    }
}

async fn submit(State(fake): State<FakeKling>, Json(body): Json<Value>) -> Json<Value> {
    fake.submissions.lock().unwrap().push(body);
    Json(json!({"code": 200, "data": {"task_id": "task-1", "status": "pending"}}))
}

async fn task(State(fake): State<FakeKling>, Path(_id): Path<String>) -> Json<Value> {
    fake.polls.fetch_add(1, Ordering::SeqCst);
    let mut last = fake.last.lock().unwrap();
    if let Some(next) = fake.statuses.lock().unwrap().pop_front() {
        *last = next;
    }
    Json(last.clone())
}

pub fn status(status: &str) -> Value {
    json!({"code": 200, "data": {"task_id": "task-1", "status": status}})
}

pub fn completed(url: &str) -> Value {
    json!({"code": 200, "data": {
        "task_id": "task-1",
        "status": "completed",
        "output": {"works": [{"video": {"resource_without_watermark": url}}]}
    }})
}
