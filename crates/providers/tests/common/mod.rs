//! Shared fixtures for provider integration tests.
//!
//! Each test stands up a small axum server that plays the provider: it
//! records what was submitted and replays a scripted sequence of status
//! documents, one per poll.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::http::{HeaderMap, StatusCode};
use axum::Router;
use mediagen_providers::{PollPolicy, ProviderHttp};
use serde_json::Value;
use tokio::net::TcpListener;

/// Bind an ephemeral local port and return the listener with its base URL.
pub async fn bind() -> (TcpListener, String) {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind test listener");
    let addr = listener.local_addr().expect("listener address");
    (listener, format!("http://{addr}"))
}

/// Serve `app` on `listener` in the background.
pub fn spawn(listener: TcpListener, app: Router) {
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("test server");
    });
}

/// Bind and serve in one step when the routes do not need their own URL.
pub async fn serve(app: Router) -> String {
    let (listener, base_url) = bind().await;
    spawn(listener, app);
    base_url
}

/// Client used against the fake servers.
pub fn http() -> ProviderHttp {
    ProviderHttp::new(Duration::from_secs(5)).expect("build HTTP client")
}

/// Poll fast enough to keep the suite quick while still sleeping between
/// status checks.
pub fn fast_policy() -> PollPolicy {
    PollPolicy::every(Duration::from_millis(10))
}

// ---------------------------------------------------------------------------
// Script
// ---------------------------------------------------------------------------

/// One captured submission.
#[derive(Debug, Clone)]
pub struct Captured {
    pub headers: HeaderMap,
    pub body: Value,
}

/// Scripted provider behaviour shared between the router and the test.
#[derive(Clone)]
pub struct Script {
    inner: Arc<ScriptInner>,
}

struct ScriptInner {
    submit_status: StatusCode,
    submit_response: Value,
    poll_status: StatusCode,
    polls: Mutex<VecDeque<Value>>,
    last_poll: Mutex<Value>,
    result: Value,
    submissions: Mutex<Vec<Captured>>,
    poll_headers: Mutex<Vec<HeaderMap>>,
    poll_count: AtomicUsize,
    result_count: AtomicUsize,
}

impl Script {
    pub fn new(submit_response: Value, polls: Vec<Value>) -> Self {
        Self::build(StatusCode::OK, submit_response, StatusCode::OK, polls, Value::Null)
    }

    pub fn with_result(submit_response: Value, polls: Vec<Value>, result: Value) -> Self {
        Self::build(StatusCode::OK, submit_response, StatusCode::OK, polls, result)
    }

    pub fn rejecting_submit(status: StatusCode, body: Value) -> Self {
        Self::build(status, body, StatusCode::OK, Vec::new(), Value::Null)
    }

    pub fn failing_polls(submit_response: Value, status: StatusCode) -> Self {
        Self::build(StatusCode::OK, submit_response, status, Vec::new(), Value::Null)
    }

    fn build(
        submit_status: StatusCode,
        submit_response: Value,
        poll_status: StatusCode,
        polls: Vec<Value>,
        result: Value,
    ) -> Self {
        Self {
            inner: Arc::new(ScriptInner {
                submit_status,
                submit_response,
                poll_status,
                polls: Mutex::new(polls.into()),
                last_poll: Mutex::new(Value::Null),
                result,
                submissions: Mutex::new(Vec::new()),
                poll_headers: Mutex::new(Vec::new()),
                poll_count: AtomicUsize::new(0),
                result_count: AtomicUsize::new(0),
            }),
        }
    }

    /// Record a submission and return the scripted reply.
    pub fn submit(&self, headers: HeaderMap, body: Value) -> (StatusCode, Value) {
        self.inner
            .submissions
            .lock()
            .unwrap()
            .push(Captured { headers, body });
        (self.inner.submit_status, self.inner.submit_response.clone())
    }

    /// Return the next status document. Once the script runs out the last
    /// document is repeated.
    pub fn poll(&self, headers: HeaderMap) -> (StatusCode, Value) {
        self.inner.poll_count.fetch_add(1, Ordering::SeqCst);
        self.inner.poll_headers.lock().unwrap().push(headers);

        let mut last = self.inner.last_poll.lock().unwrap();
        if let Some(next) = self.inner.polls.lock().unwrap().pop_front() {
            *last = next;
        }
        (self.inner.poll_status, last.clone())
    }

    pub fn result(&self) -> Value {
        self.inner.result_count.fetch_add(1, Ordering::SeqCst);
        self.inner.result.clone()
    }

    pub fn submissions(&self) -> Vec<Captured> {
        self.inner.submissions.lock().unwrap().clone()
    }

    pub fn poll_headers(&self) -> Vec<HeaderMap> {
        self.inner.poll_headers.lock().unwrap().clone()
    }

    pub fn poll_count(&self) -> usize {
        self.inner.poll_count.load(Ordering::SeqCst)
    }

    pub fn result_count(&self) -> usize {
        self.inner.result_count.load(Ordering::SeqCst)
    }
}

/// Header value as a string, or `""` when absent.
pub fn header<'a>(headers: &'a HeaderMap, name: &str) -> &'a str {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
}
