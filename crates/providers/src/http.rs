//! Shared HTTP plumbing for provider adapters.
//!
//! Every adapter builds its own authenticated [`reqwest::RequestBuilder`]
//! and hands it to [`ProviderHttp::send_json`], which enforces a 2xx status
//! and decodes the JSON body.

use std::time::Duration;

use serde_json::Value;

use crate::error::ProviderError;

/// Default per-request timeout for provider calls.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Errors from a single provider HTTP exchange.
///
/// Adapters fold these into [`ProviderError::Submission`] or
/// [`ProviderError::Poll`] depending on which call failed.
#[derive(Debug, thiserror::Error)]
pub enum HttpError {
    /// The HTTP request itself failed (network, DNS, TLS, timeout).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The provider returned a non-2xx status code.
    #[error("provider returned HTTP {status}: {body}")]
    Status {
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },

    /// The body was not valid JSON.
    #[error("malformed response body: {0}")]
    Decode(String),
}

/// HTTP client shared by the adapters of one worker process.
///
/// Cloning is cheap; the underlying connection pool is shared.
#[derive(Debug, Clone)]
pub struct ProviderHttp {
    client: reqwest::Client,
}

impl ProviderHttp {
    /// Build a client with the given per-request timeout.
    pub fn new(timeout: Duration) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ProviderError::Configuration(format!("HTTP client: {e}")))?;
        Ok(Self { client })
    }

    /// Reuse an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }

    /// Send a prepared request and decode its JSON body.
    pub async fn send_json(&self, request: reqwest::RequestBuilder) -> Result<Value, HttpError> {
        let response = Self::ensure_success(request.send().await?).await?;
        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| HttpError::Decode(e.to_string()))
    }

    /// Return the response unchanged on 2xx, or an [`HttpError::Status`]
    /// carrying the status and body text.
    async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, HttpError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(HttpError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }
}

/// Non-empty string at a JSON pointer.
pub(crate) fn str_at<'a>(value: &'a Value, pointer: &str) -> Option<&'a str> {
    value
        .pointer(pointer)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
}

/// Join a base URL and a path without doubling the slash.
pub(crate) fn join_url(base: &str, path: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn new_does_not_panic() {
        let _http = ProviderHttp::new(DEFAULT_REQUEST_TIMEOUT).unwrap();
    }

    #[test]
    fn str_at_skips_missing_and_empty() {
        let v = json!({"data": {"task_id": "abc", "blank": ""}});
        assert_eq!(str_at(&v, "/data/task_id"), Some("abc"));
        assert_eq!(str_at(&v, "/data/blank"), None);
        assert_eq!(str_at(&v, "/data/absent"), None);
    }

    #[test]
    fn join_url_normalizes_slashes() {
        assert_eq!(join_url("http://h/", "/api/v1/task"), "http://h/api/v1/task");
        assert_eq!(join_url("http://h", "v1/tasks/1"), "http://h/v1/tasks/1");
    }

    #[test]
    fn status_error_display() {
        let err = HttpError::Status {
            status: 502,
            body: "bad gateway".into(),
        };
        assert_eq!(err.to_string(), "provider returned HTTP 502: bad gateway");
    }
}
