//! Server configuration from environment variables

use crate::session::{SessionConfig, DEFAULT_MAX_MESSAGES};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_CONTEXT_MESSAGES: usize = 10;

/// Which classifier turns user messages into intents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IntentBackend {
    /// LLM classifier, when an LLM is configured
    #[default]
    Llm,
    /// Offline keyword rules
    Keyword,
}

impl IntentBackend {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "llm" => Some(Self::Llm),
            "keyword" | "keywords" => Some(Self::Keyword),
            _ => None,
        }
    }

    /// The backend actually used; LLM classification needs a real, non-mock LLM
    pub fn effective(self, llm_available: bool, llm_mocked: bool) -> Self {
        match self {
            Self::Llm if llm_available && !llm_mocked => Self::Llm,
            _ => Self::Keyword,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    pub session: SessionConfig,
    /// Previous messages given to the LLM as conversation context
    pub context_messages: usize,
    pub intent_backend: IntentBackend,
    /// Beneficiary profiles; the bundled sample set when unset
    pub beneficiaries_path: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            session: SessionConfig::default(),
            context_messages: DEFAULT_CONTEXT_MESSAGES,
            intent_backend: IntentBackend::default(),
            beneficiaries_path: None,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; unparseable values fall back to defaults
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let number = |key: &str| lookup(key).and_then(|v| v.trim().parse::<u64>().ok());

        let intent_backend = match lookup("INTENT_BACKEND") {
            Some(value) => IntentBackend::parse(&value).unwrap_or_else(|| {
                tracing::warn!(value = %value, "Unknown INTENT_BACKEND, using llm");
                IntentBackend::Llm
            }),
            None => defaults.intent_backend,
        };

        Self {
            port: lookup("CHATBOT_PORT")
                .and_then(|p| p.trim().parse().ok())
                .unwrap_or(defaults.port),
            session: SessionConfig {
                timeout: number("SESSION_TIMEOUT_SECS")
                    .map_or(defaults.session.timeout, Duration::from_secs),
                sweep_interval: number("SESSION_SWEEP_INTERVAL_SECS")
                    .filter(|s| *s > 0)
                    .map_or(defaults.session.sweep_interval, Duration::from_secs),
                max_messages: number("MAX_CONVERSATION_LENGTH")
                    .and_then(|n| usize::try_from(n).ok())
                    .filter(|n| *n > 0)
                    .unwrap_or(DEFAULT_MAX_MESSAGES),
            },
            context_messages: number("INTENT_CONTEXT_MESSAGES")
                .and_then(|n| usize::try_from(n).ok())
                .unwrap_or(defaults.context_messages),
            intent_backend,
            beneficiaries_path: lookup("BENEFICIARIES_PATH")
                .filter(|p| !p.trim().is_empty())
                .map(PathBuf::from),
        }
    }
}
