//! LLM provider abstraction
//!
//! Intent detection and reply formatting both go through [`LlmService`], so
//! the provider behind it can be swapped (Anthropic, mock) without touching
//! the controllers.

mod anthropic;
mod error;
mod mock;
mod registry;
mod types;

pub use anthropic::AnthropicService;
#[allow(unused_imports)] // Public API re-exports
pub use error::{LlmError, LlmErrorKind};
pub use mock::MockService;
pub use registry::LlmConfig;
pub use types::*;

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// Common interface for LLM providers
#[async_trait]
pub trait LlmService: Send + Sync {
    /// Make a completion request
    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse, LlmError>;

    /// Get the model ID
    fn model_id(&self) -> &str;
}

/// Logging wrapper for LLM services
pub struct LoggingService {
    inner: Arc<dyn LlmService>,
    model_id: String,
}

impl LoggingService {
    pub fn new(inner: Arc<dyn LlmService>) -> Self {
        let model_id = inner.model_id().to_string();
        Self { inner, model_id }
    }
}

#[async_trait]
impl LlmService for LoggingService {
    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse, LlmError> {
        let start = std::time::Instant::now();
        let result = self.inner.complete(request).await;
        let duration = start.elapsed();

        match &result {
            Ok(response) => {
                tracing::info!(
                    model = %self.model_id,
                    duration_ms = %duration.as_millis(),
                    input_tokens = response.usage.input_tokens,
                    output_tokens = response.usage.output_tokens,
                    "LLM request completed"
                );
            }
            Err(e) => {
                tracing::error!(
                    model = %self.model_id,
                    duration_ms = %duration.as_millis(),
                    error = %e.message,
                    retryable = e.kind.is_retryable(),
                    "LLM request failed"
                );
            }
        }

        result
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}

/// Retries retryable failures with exponential backoff.
///
/// A `retry_after` hint from the provider overrides the computed delay.
pub struct RetryingService {
    inner: Arc<dyn LlmService>,
    max_attempts: u32,
    base_delay: Duration,
}

impl RetryingService {
    pub fn new(inner: Arc<dyn LlmService>, max_attempts: u32) -> Self {
        Self {
            inner,
            max_attempts: max_attempts.max(1),
            base_delay: Duration::from_millis(500),
        }
    }

    #[cfg(test)]
    pub fn with_base_delay(mut self, delay: Duration) -> Self {
        self.base_delay = delay;
        self
    }

    fn retry_delay(&self, attempt: u32) -> Duration {
        // 1x, 2x, 4x ... of the base delay
        self.base_delay * (1 << (attempt - 1).min(6))
    }
}

#[async_trait]
impl LlmService for RetryingService {
    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse, LlmError> {
        let mut attempt = 1;
        loop {
            match self.inner.complete(request).await {
                Ok(response) => return Ok(response),
                Err(e) if e.kind.is_retryable() && attempt < self.max_attempts => {
                    let delay = e.retry_after.unwrap_or_else(|| self.retry_delay(attempt));
                    tracing::warn!(
                        model = %self.inner.model_id(),
                        attempt,
                        max_attempts = self.max_attempts,
                        delay_ms = %delay.as_millis(),
                        error = %e.message,
                        "Retrying LLM request"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    fn model_id(&self) -> &str {
        self.inner.model_id()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    struct Scripted {
        results: Mutex<VecDeque<Result<LlmResponse, LlmError>>>,
        calls: Mutex<u32>,
    }

    impl Scripted {
        fn new(results: Vec<Result<LlmResponse, LlmError>>) -> Self {
            Self {
                results: Mutex::new(results.into()),
                calls: Mutex::new(0),
            }
        }

        fn calls(&self) -> u32 {
            *self.calls.lock().unwrap()
        }
    }

    #[async_trait]
    impl LlmService for Scripted {
        async fn complete(&self, _request: &LlmRequest) -> Result<LlmResponse, LlmError> {
            *self.calls.lock().unwrap() += 1;
            self.results
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(LlmError::unknown("script exhausted")))
        }

        fn model_id(&self) -> &str {
            "scripted"
        }
    }

    fn request() -> LlmRequest {
        LlmRequest::new(vec![LlmMessage::user("hi")])
    }

    #[tokio::test]
    async fn test_retry_recovers_from_transient_errors() {
        let inner = Arc::new(Scripted::new(vec![
            Err(LlmError::network("reset")),
            Err(LlmError::server_error("503")),
            Ok(LlmResponse::text("ok")),
        ]));
        let service =
            RetryingService::new(inner.clone(), 3).with_base_delay(Duration::from_millis(1));

        let response = service.complete(&request()).await.unwrap();
        assert_eq!(response.text, "ok");
        assert_eq!(inner.calls(), 3);
    }

    #[tokio::test]
    async fn test_retry_stops_on_non_retryable() {
        let inner = Arc::new(Scripted::new(vec![
            Err(LlmError::auth("bad key")),
            Ok(LlmResponse::text("never reached")),
        ]));
        let service =
            RetryingService::new(inner.clone(), 3).with_base_delay(Duration::from_millis(1));

        let err = service.complete(&request()).await.unwrap_err();
        assert_eq!(err.kind, LlmErrorKind::Auth);
        assert_eq!(inner.calls(), 1);
    }

    #[tokio::test]
    async fn test_retry_gives_up_after_max_attempts() {
        let inner = Arc::new(Scripted::new(vec![
            Err(LlmError::rate_limit("slow down")),
            Err(LlmError::rate_limit("slow down")),
            Ok(LlmResponse::text("too late")),
        ]));
        let service =
            RetryingService::new(inner.clone(), 2).with_base_delay(Duration::from_millis(1));

        let err = service.complete(&request()).await.unwrap_err();
        assert_eq!(err.kind, LlmErrorKind::RateLimit);
        assert_eq!(inner.calls(), 2);
    }
}
