//! Canned-response provider for running without LLM credentials

use super::{LlmError, LlmRequest, LlmResponse, LlmService};
use async_trait::async_trait;

pub const MOCK_RESPONSE: &str = "[MOCK] This is a mock LLM response.";

/// Returns the same text for every request
pub struct MockService {
    model_id: String,
}

impl MockService {
    pub fn new(model_id: impl Into<String>) -> Self {
        Self {
            model_id: model_id.into(),
        }
    }
}

#[async_trait]
impl LlmService for MockService {
    async fn complete(&self, _request: &LlmRequest) -> Result<LlmResponse, LlmError> {
        Ok(LlmResponse::text(MOCK_RESPONSE))
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}
