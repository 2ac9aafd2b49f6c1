//! Anthropic Messages API provider

use super::types::{LlmMessage, LlmRequest, LlmResponse, MessageRole, Usage};
use super::{LlmError, LlmService};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const DEFAULT_MAX_TOKENS: u32 = 1024;
const API_VERSION: &str = "2023-06-01";

/// Anthropic service implementation
pub struct AnthropicService {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl AnthropicService {
    /// Build a client for `model`.
    ///
    /// With a gateway the request goes to `{gateway}/anthropic/v1/messages`
    /// and the gateway supplies credentials.
    pub fn new(
        api_key: String,
        model: impl Into<String>,
        gateway: Option<&str>,
        timeout: Duration,
    ) -> Result<Self, LlmError> {
        let base_url = match gateway {
            Some(gw) => format!("{}/anthropic/v1/messages", gw.trim_end_matches('/')),
            None => "https://api.anthropic.com/v1/messages".to_string(),
        };

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LlmError::unknown(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_key,
            model: model.into(),
            base_url,
        })
    }

    fn translate_request(&self, request: &LlmRequest) -> AnthropicRequest {
        AnthropicRequest {
            model: self.model.clone(),
            max_tokens: request.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
            system: request.system.clone().filter(|s| !s.trim().is_empty()),
            temperature: request.temperature,
            messages: request.messages.iter().map(translate_message).collect(),
        }
    }
}

fn translate_message(msg: &LlmMessage) -> AnthropicMessage {
    let role = match msg.role {
        MessageRole::User => "user",
        MessageRole::Assistant => "assistant",
    };
    AnthropicMessage {
        role,
        content: vec![AnthropicContentBlock::Text {
            text: msg.text.clone(),
        }],
    }
}

fn normalize_response(resp: AnthropicResponse) -> LlmResponse {
    let text = resp
        .content
        .into_iter()
        .filter_map(|block| match block {
            AnthropicContentBlock::Text { text } => Some(text),
            AnthropicContentBlock::Other => None,
        })
        .collect::<Vec<_>>()
        .join("");

    LlmResponse {
        text,
        usage: Usage {
            input_tokens: resp.usage.input_tokens,
            output_tokens: resp.usage.output_tokens,
        },
    }
}

#[async_trait]
impl LlmService for AnthropicService {
    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse, LlmError> {
        let body = self.translate_request(request);

        let response = self
            .client
            .post(&self.base_url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| LlmError::network(format!("Failed to read response: {e}")))?;

        if !status.is_success() {
            return Err(LlmError::from_status(status.as_u16(), &text));
        }

        let parsed: AnthropicResponse = serde_json::from_str(&text).map_err(|e| {
            LlmError::unknown(format!("Failed to parse response: {e} - body: {text}"))
        })?;

        Ok(normalize_response(parsed))
    }

    fn model_id(&self) -> &str {
        &self.model
    }
}

// Anthropic API types

#[derive(Debug, Serialize)]
struct AnthropicRequest {
    model: String,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    messages: Vec<AnthropicMessage>,
}

#[derive(Debug, Serialize)]
struct AnthropicMessage {
    role: &'static str,
    content: Vec<AnthropicContentBlock>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum AnthropicContentBlock {
    Text {
        text: String,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    content: Vec<AnthropicContentBlock>,
    usage: AnthropicUsage,
}

#[derive(Debug, Deserialize)]
struct AnthropicUsage {
    input_tokens: u64,
    output_tokens: u64,
}
