//! Chat sessions: conversation history plus the intent context carried
//! between turns.

mod message;
mod slots;
mod state;
mod store;

pub use message::{ChatMessage, MessageMetadata, Role};
pub use slots::{is_present, same_value, Slots};
pub use state::DialogueState;
pub use store::{SessionConfig, SessionHandle, SessionStore};

use crate::intent::IntentName;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Duration;

/// Default cap on stored messages per session
pub const DEFAULT_MAX_MESSAGES: usize = 50;

/// Partial update of the session's intent context
#[derive(Debug, Clone, Default)]
pub struct ContextUpdate {
    pub intent: Option<IntentName>,
    pub slots: Option<Slots>,
    pub confidence: Option<f64>,
}

/// One conversation with one beneficiary
#[derive(Debug, Clone, Serialize)]
pub struct ChatSession {
    pub session_id: String,
    pub beneficiary_key: u64,
    pub created_at: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
    pub messages: Vec<ChatMessage>,
    pub current_intent: Option<IntentName>,
    pub current_confidence: Option<f64>,
    pub collected_slots: Slots,
    pub dialogue_state: DialogueState,
    #[serde(skip)]
    max_messages: usize,
}

impl ChatSession {
    pub fn new(beneficiary_key: u64) -> Self {
        let now = Utc::now();
        Self {
            session_id: uuid::Uuid::new_v4().simple().to_string(),
            beneficiary_key,
            created_at: now,
            last_activity: now,
            messages: Vec::new(),
            current_intent: None,
            current_confidence: None,
            collected_slots: Slots::new(),
            dialogue_state: DialogueState::New,
            max_messages: DEFAULT_MAX_MESSAGES,
        }
    }

    pub fn with_max_messages(mut self, max_messages: usize) -> Self {
        self.max_messages = max_messages.max(1);
        self
    }

    /// Append a message, dropping the oldest ones past the cap
    pub fn add_message(&mut self, message: ChatMessage) {
        self.messages.push(message);
        if self.messages.len() > self.max_messages {
            let excess = self.messages.len() - self.max_messages;
            self.messages.drain(..excess);
        }
        self.touch();
    }

    pub fn touch(&mut self) {
        self.last_activity = Utc::now();
    }

    /// Apply whichever parts of `update` are set; slots merge shallowly
    pub fn update_context(&mut self, update: ContextUpdate) {
        if let Some(intent) = update.intent {
            self.current_intent = Some(intent);
        }
        if let Some(slots) = update.slots {
            self.collected_slots.extend(slots);
        }
        if let Some(confidence) = update.confidence {
            self.current_confidence = Some(confidence);
        }
        self.touch();
    }

    /// Up to `limit` messages ending `offset` messages before the newest,
    /// oldest first
    pub fn last_n_messages(&self, limit: usize, offset: usize) -> &[ChatMessage] {
        let end = self.messages.len().saturating_sub(offset);
        let start = end.saturating_sub(limit);
        &self.messages[start..end]
    }

    pub fn last_message(&self, role: Option<Role>) -> Option<&ChatMessage> {
        match role {
            None => self.messages.last(),
            Some(role) => self.messages.iter().rev().find(|m| m.role == role),
        }
    }

    pub fn last_user_text(&self) -> Option<&str> {
        self.last_message(Some(Role::User)).map(|m| m.content.as_str())
    }

    #[allow(dead_code)] // Session API; not exposed over HTTP yet
    pub fn message_by_id(&self, id: &str) -> Option<&ChatMessage> {
        self.messages.iter().find(|m| m.id == id)
    }

    pub fn is_expired(&self, timeout: Duration, now: DateTime<Utc>) -> bool {
        let idle = now.signed_duration_since(self.last_activity);
        idle.to_std().is_ok_and(|idle| idle > timeout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn session_with(n: usize) -> ChatSession {
        let mut session = ChatSession::new(1).with_max_messages(1000);
        for i in 0..n {
            let msg = if i % 2 == 0 {
                ChatMessage::user(&format!("u{i}"))
            } else {
                ChatMessage::assistant(&format!("a{i}"), MessageMetadata::default())
            };
            session.add_message(msg);
        }
        session
    }

    #[test]
    fn test_last_n_messages_window() {
        let session = session_with(6);
        let window: Vec<_> = session
            .last_n_messages(3, 1)
            .iter()
            .map(|m| m.content.as_str())
            .collect();
        assert_eq!(window, vec!["u2", "a3", "u4"]);
    }

    #[test]
    fn test_last_n_messages_short_history() {
        let session = session_with(2);
        assert_eq!(session.last_n_messages(10, 0).len(), 2);
        assert!(session.last_n_messages(10, 5).is_empty());
    }

    #[test]
    fn test_last_message_by_role() {
        let session = session_with(4);
        assert_eq!(session.last_message(None).unwrap().content, "a3");
        assert_eq!(session.last_message(Some(Role::User)).unwrap().content, "u2");
        assert_eq!(session.last_user_text(), Some("u2"));
        assert!(ChatSession::new(1).last_message(Some(Role::User)).is_none());
    }

    #[test]
    fn test_message_by_id() {
        let session = session_with(3);
        let id = session.messages[1].id.clone();
        assert_eq!(session.message_by_id(&id).unwrap().content, "a1");
        assert!(session.message_by_id("nope").is_none());
    }

    #[test]
    fn test_history_capped() {
        let mut session = ChatSession::new(1).with_max_messages(3);
        for i in 0..5 {
            session.add_message(ChatMessage::user(&format!("m{i}")));
        }
        let contents: Vec<_> = session.messages.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["m2", "m3", "m4"]);
    }

    #[test]
    fn test_update_context_merges() {
        let mut session = ChatSession::new(1);
        let mut slots = Slots::new();
        slots.insert("drug_name", "Lipitor");
        session.update_context(ContextUpdate {
            intent: Some(IntentName::GetSingleDrugPrice),
            slots: Some(slots),
            confidence: Some(0.9),
        });

        let mut more = Slots::new();
        more.insert("dosage", "20mg");
        session.update_context(ContextUpdate {
            slots: Some(more),
            ..Default::default()
        });

        assert_eq!(session.current_intent, Some(IntentName::GetSingleDrugPrice));
        assert_eq!(session.current_confidence, Some(0.9));
        assert!(session.collected_slots.has("drug_name"));
        assert!(session.collected_slots.has("dosage"));
    }

    #[test]
    fn test_expiry() {
        let session = ChatSession::new(1);
        let timeout = Duration::from_secs(60);
        assert!(!session.is_expired(timeout, Utc::now()));
        assert!(session.is_expired(timeout, Utc::now() + chrono::Duration::seconds(61)));
        // Clock skew backwards never expires
        assert!(!session.is_expired(timeout, Utc::now() - chrono::Duration::seconds(600)));
    }

    proptest! {
        #[test]
        fn prop_window_is_suffix_slice(len in 0usize..40, limit in 0usize..20, offset in 0usize..20) {
            let session = session_with(len);
            let window = session.last_n_messages(limit, offset);
            prop_assert!(window.len() <= limit);
            let end = len.saturating_sub(offset);
            prop_assert_eq!(window.len(), limit.min(end));
            if let Some(last) = window.last() {
                prop_assert_eq!(&last.id, &session.messages[end - 1].id);
            }
        }
    }
}
