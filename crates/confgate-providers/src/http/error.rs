//! HTTP error classification
//!
//! Failed calls to third-party APIs are normalized into [`HttpError`] so the
//! retry logic and the validators can reason about them uniformly.

use reqwest::StatusCode;
use serde::Serialize;
use serde_json::Value;
use std::fmt;

/// Classification of HTTP errors for retry logic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ErrorClassification {
    /// Client errors (4xx) - should not retry
    ClientError,
    /// Server errors (5xx) - should retry
    ServerError,
    /// Network errors - should retry
    NetworkError,
    /// Rate limiting - should retry with backoff
    RateLimitError,
    /// Rejected credentials - should not retry
    AuthenticationError,
    /// Unexpected response body - should not retry
    InvalidResponse,
    Unknown,
}

impl ErrorClassification {
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ErrorClassification::ServerError | ErrorClassification::NetworkError | ErrorClassification::RateLimitError
        )
    }

    pub(crate) fn from_status(status: StatusCode) -> Self {
        match status.as_u16() {
            401 | 403 => ErrorClassification::AuthenticationError,
            429 => ErrorClassification::RateLimitError,
            400..=499 => ErrorClassification::ClientError,
            500..=599 => ErrorClassification::ServerError,
            _ => ErrorClassification::Unknown,
        }
    }
}

/// Normalized error from a third-party API call
#[derive(Debug, Clone, Serialize)]
pub struct HttpError {
    pub status_code: Option<u16>,
    pub classification: ErrorClassification,
    /// Human-readable reason, taken from the response body when possible
    pub message: String,
    /// Retry-After header value in seconds
    pub retry_after: Option<u64>,
}

impl HttpError {
    pub async fn from_response(response: reqwest::Response) -> Self {
        let status = response.status();
        let retry_after = response
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse::<u64>().ok());
        let body = response.text().await.unwrap_or_default();
        let message = extract_message(&body).unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("unexpected status")
                .to_string()
        });

        Self {
            status_code: Some(status.as_u16()),
            classification: ErrorClassification::from_status(status),
            message,
            retry_after,
        }
    }

    pub fn from_request_error(error: reqwest::Error) -> Self {
        let classification = if error.is_timeout() || error.is_connect() || error.is_request() {
            ErrorClassification::NetworkError
        } else if error.is_decode() {
            ErrorClassification::InvalidResponse
        } else {
            ErrorClassification::Unknown
        };
        Self {
            status_code: error.status().map(|s| s.as_u16()),
            classification,
            message: error.to_string(),
            retry_after: None,
        }
    }

    pub fn invalid_response<M: Into<String>>(message: M) -> Self {
        Self {
            status_code: None,
            classification: ErrorClassification::InvalidResponse,
            message: message.into(),
            retry_after: None,
        }
    }

    pub fn should_retry(&self) -> bool {
        self.classification.is_retryable()
    }

    pub fn is_auth_failure(&self) -> bool {
        self.classification == ErrorClassification::AuthenticationError
    }
}

/// Pull a message out of common JSON error envelopes
///
/// Cloudflare and the OCI distribution API both use `{"errors": [{"message": ...}]}`.
fn extract_message(body: &str) -> Option<String> {
    let json: Value = serde_json::from_str(body).ok()?;
    if let Some(message) = json
        .get("errors")
        .and_then(Value::as_array)
        .and_then(|errors| errors.first())
        .and_then(|first| first.get("message"))
        .and_then(Value::as_str)
    {
        return Some(message.to_string());
    }
    json.get("message")
        .or_else(|| json.get("error"))
        .and_then(Value::as_str)
        .map(str::to_string)
}

impl fmt::Display for HttpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status_code {
            Some(code) => write!(f, "HTTP {}: {}", code, self.message),
            None => write!(f, "{}", self.message),
        }
    }
}

impl std::error::Error for HttpError {}
