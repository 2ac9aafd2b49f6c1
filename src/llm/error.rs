//! LLM error types

use std::time::Duration;
use thiserror::Error;

/// Longest provider-requested delay honoured before a retry
pub const MAX_RETRY_AFTER: Duration = Duration::from_secs(60);

/// LLM failure, classified so callers can decide whether to retry
#[derive(Debug, Error)]
#[error("{message}")]
pub struct LlmError {
    pub kind: LlmErrorKind,
    pub message: String,
    pub retry_after: Option<Duration>,
}

impl LlmError {
    pub fn new(kind: LlmErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            retry_after: None,
        }
    }

    pub fn with_retry_after(mut self, duration: Duration) -> Self {
        self.retry_after = Some(duration);
        self
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(LlmErrorKind::Network, message)
    }

    pub fn rate_limit(message: impl Into<String>) -> Self {
        Self::new(LlmErrorKind::RateLimit, message)
    }

    pub fn server_error(message: impl Into<String>) -> Self {
        Self::new(LlmErrorKind::ServerError, message)
    }

    pub fn auth(message: impl Into<String>) -> Self {
        Self::new(LlmErrorKind::Auth, message)
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(LlmErrorKind::InvalidRequest, message)
    }

    pub fn unknown(message: impl Into<String>) -> Self {
        Self::new(LlmErrorKind::Unknown, message)
    }

    /// Classify a non-success HTTP response from a provider.
    ///
    /// Rate-limit bodies of the form `{"error": {"retry_after": 1.5}}` carry
    /// their delay into `retry_after`, capped at [`MAX_RETRY_AFTER`].
    pub fn from_status(status: u16, body: &str) -> Self {
        match status {
            401 | 403 => Self::auth(format!("Authentication failed: {body}")),
            429 => {
                let err = Self::rate_limit(format!("Rate limited: {body}"));
                let retry_after = serde_json::from_str::<serde_json::Value>(body)
                    .ok()
                    .and_then(|v| v.get("error")?.get("retry_after")?.as_f64())
                    .filter(|secs| secs.is_finite() && *secs >= 0.0)
                    .map(|secs| {
                        Duration::try_from_secs_f64(secs)
                            .map_or(MAX_RETRY_AFTER, |d| d.min(MAX_RETRY_AFTER))
                    });
                match retry_after {
                    Some(delay) => err.with_retry_after(delay),
                    None => err,
                }
            }
            400 | 413 | 422 => Self::invalid_request(format!("Invalid request: {body}")),
            500..=599 => Self::server_error(format!("Server error: {body}")),
            _ => Self::unknown(format!("HTTP {status}: {body}")),
        }
    }
}

impl From<reqwest::Error> for LlmError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::network(format!("Request timeout: {e}"))
        } else if e.is_connect() {
            Self::network(format!("Connection failed: {e}"))
        } else if e.is_decode() {
            Self::unknown(format!("Failed to decode response: {e}"))
        } else {
            Self::unknown(format!("Request failed: {e}"))
        }
    }
}

/// Error classification for retry logic
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmErrorKind {
    /// Network issues, timeouts - retryable
    Network,
    /// Rate limited (429) - retryable with backoff
    RateLimit,
    /// Server error (5xx) - retryable
    ServerError,
    /// Authentication failed (401, 403)
    Auth,
    /// Malformed request (400)
    InvalidRequest,
    Unknown,
}

impl LlmErrorKind {
    pub fn is_retryable(self) -> bool {
        matches!(self, Self::Network | Self::RateLimit | Self::ServerError)
    }
}
