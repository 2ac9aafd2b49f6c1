//! Provider selection from environment configuration

use super::{AnthropicService, LlmService, LoggingService, MockService, RetryingService};
use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_MODEL: &str = "claude-3-5-haiku-20241022";
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Configuration for the LLM provider
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub anthropic_api_key: Option<String>,
    /// Gateway base URL; when set the gateway handles authentication
    pub gateway: Option<String>,
    pub model: String,
    /// Answer every request with a fixed mock response
    pub mock_responses: bool,
    pub timeout: Duration,
    /// First try plus retries
    pub max_attempts: u32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            anthropic_api_key: None,
            gateway: None,
            model: DEFAULT_MODEL.to_string(),
            mock_responses: false,
            timeout: Duration::from_secs(30),
            max_attempts: DEFAULT_MAX_RETRIES + 1,
        }
    }
}

impl LlmConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            anthropic_api_key: lookup("ANTHROPIC_API_KEY").filter(|k| !k.is_empty()),
            gateway: lookup("LLM_GATEWAY").filter(|g| !g.is_empty()),
            model: lookup("LLM_MODEL").unwrap_or(defaults.model),
            mock_responses: lookup("LLM_MOCK_RESPONSES").is_some_and(|v| v == "true"),
            timeout: lookup("LLM_TIMEOUT_SECS")
                .and_then(|v| v.parse().ok())
                .map_or(defaults.timeout, Duration::from_secs),
            max_attempts: lookup("LLM_MAX_RETRIES")
                .and_then(|v| v.parse::<u32>().ok())
                .map_or(defaults.max_attempts, |retries| retries.saturating_add(1)),
        }
    }

    /// Build the configured provider, wrapped with retry and logging.
    ///
    /// Returns `None` when no provider is usable (no key, no gateway, mock
    /// mode off).
    pub fn build_service(&self) -> Option<Arc<dyn LlmService>> {
        let base: Arc<dyn LlmService> = if self.mock_responses {
            Arc::new(MockService::new(format!("mock:{}", self.model)))
        } else {
            // In gateway mode the key is a placeholder
            let api_key = match (&self.gateway, &self.anthropic_api_key) {
                (Some(_), key) => key.clone().unwrap_or_else(|| "implicit".to_string()),
                (None, Some(key)) => key.clone(),
                (None, None) => return None,
            };
            match AnthropicService::new(
                api_key,
                self.model.clone(),
                self.gateway.as_deref(),
                self.timeout,
            ) {
                Ok(service) => Arc::new(service),
                Err(e) => {
                    tracing::error!(error = %e, "Failed to create LLM client");
                    return None;
                }
            }
        };

        let retrying = Arc::new(RetryingService::new(base, self.max_attempts));
        Some(Arc::new(LoggingService::new(retrying)))
    }
}
