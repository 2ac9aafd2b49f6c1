//! Chat messages exchanged within a session

use super::Slots;
use crate::controller::{Card, CtaLink};
use crate::intent::IntentName;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Who authored a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
}

/// Intent bookkeeping attached to assistant replies
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MessageMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intent: Option<IntentName>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slots: Option<Slots>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence_score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processing_time_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: String,
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<MessageMetadata>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cards: Vec<Card>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cta: Option<CtaLink>,
}

impl ChatMessage {
    /// Content is stored trimmed
    pub fn new(role: Role, content: &str) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            role,
            content: content.trim().to_string(),
            timestamp: Utc::now(),
            metadata: None,
            cards: Vec::new(),
            cta: None,
        }
    }

    pub fn user(content: &str) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: &str, metadata: MessageMetadata) -> Self {
        Self {
            metadata: Some(metadata),
            ..Self::new(Role::Assistant, content)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_trimmed() {
        let msg = ChatMessage::user("  how much is Lipitor?\n");
        assert_eq!(msg.content, "how much is Lipitor?");
        assert_eq!(msg.role, Role::User);
        assert!(msg.metadata.is_none());
    }

    #[test]
    fn test_ids_unique() {
        assert_ne!(ChatMessage::user("a").id, ChatMessage::user("a").id);
    }

    #[test]
    fn test_serialized_shape() {
        let msg = ChatMessage::assistant(
            "Hello",
            MessageMetadata {
                intent: Some(IntentName::Welcome),
                confidence_score: Some(1.0),
                processing_time_ms: Some(0),
                ..Default::default()
            },
        );
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["role"], "assistant");
        assert_eq!(json["metadata"]["intent"], "Welcome");
        assert!(json["metadata"].get("slots").is_none());
    }
}
