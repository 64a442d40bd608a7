//! Destinations for usage records.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mediagen_providers::Usage;
use serde::Serialize;
use uuid::Uuid;

/// One usage entry: who asked, what ran, what it cost.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UsageRecord {
    pub session_id: Uuid,
    pub agent_id: Uuid,
    pub model: String,
    /// Echo of the request as submitted.
    pub input: serde_json::Value,
    /// The operation's result.
    pub output: serde_json::Value,
    pub usage: Usage,
    pub recorded_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    /// The underlying HTTP request failed (network, DNS, timeout, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The collector returned a non-2xx status code.
    #[error("Usage collector returned HTTP {0}")]
    HttpStatus(u16),
}

/// Where usage records go. Writes are best-effort.
#[async_trait]
pub trait UsageSink: Send + Sync {
    async fn record(&self, record: &UsageRecord) -> Result<(), SinkError>;
}

// ---------------------------------------------------------------------------
// Sinks
// ---------------------------------------------------------------------------

/// Emits each record as a structured event on the `mediagen::usage` target.
#[derive(Debug, Default)]
pub struct TracingUsageSink;

#[async_trait]
impl UsageSink for TracingUsageSink {
    async fn record(&self, record: &UsageRecord) -> Result<(), SinkError> {
        tracing::info!(
            target: "mediagen::usage",
            session_id = %record.session_id,
            agent_id = %record.agent_id,
            model = %record.model,
            usage = ?record.usage,
            input = %record.input,
            output = %record.output,
            "Generation usage",
        );
        Ok(())
    }
}

/// Discards everything.
#[derive(Debug, Default)]
pub struct NoopUsageSink;

#[async_trait]
impl UsageSink for NoopUsageSink {
    async fn record(&self, _record: &UsageRecord) -> Result<(), SinkError> {
        Ok(())
    }
}

/// POSTs each record as JSON to an external collector.
pub struct HttpUsageSink {
    client: reqwest::Client,
    url: String,
    api_key: Option<String>,
}

impl HttpUsageSink {
    pub fn new(
        url: impl Into<String>,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, SinkError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: url.into(),
            api_key,
        })
    }
}

#[async_trait]
impl UsageSink for HttpUsageSink {
    async fn record(&self, record: &UsageRecord) -> Result<(), SinkError> {
        let mut request = self.client.post(&self.url).json(record);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }
        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(SinkError::HttpStatus(response.status().as_u16()));
        }
        Ok(())
    }
}
