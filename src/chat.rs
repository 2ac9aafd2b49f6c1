//! Turn orchestration
//!
//! A user message goes through session lookup and the ownership check,
//! intent detection, context merge and controller routing before the reply
//! is stored. The session lock is held for the whole turn, so turns on one
//! session never interleave.

#[cfg(test)]
pub(crate) mod testing;

use crate::beneficiary::BeneficiaryDirectory;
use crate::controller::{route, welcome_message, ControllerServices, TurnContext};
use crate::intent::{detect_or_unknown, merge_context, IntentDetector, IntentName};
use crate::session::{ChatMessage, ChatSession, DialogueState, MessageMetadata, SessionStore};
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChatError {
    #[error("{0}")]
    Validation(String),
    #[error("Session not found or expired")]
    SessionNotFound,
    #[error("Unauthorized - Session does not belong to authenticated user")]
    Forbidden,
    #[error("turn failed: {0}")]
    Internal(String),
}

/// Entry point for everything the HTTP layer asks of the chatbot
#[derive(Clone)]
pub struct ChatService {
    store: Arc<SessionStore>,
    detector: Arc<dyn IntentDetector>,
    directory: Arc<BeneficiaryDirectory>,
    services: ControllerServices,
}

impl ChatService {
    pub fn new(
        store: Arc<SessionStore>,
        detector: Arc<dyn IntentDetector>,
        directory: Arc<BeneficiaryDirectory>,
        services: ControllerServices,
    ) -> Self {
        Self {
            store,
            detector,
            directory,
            services,
        }
    }

    pub async fn active_sessions(&self) -> usize {
        self.store.active_count().await
    }

    /// Open a session and greet the beneficiary.
    ///
    /// The greeting is returned to the caller but not stored in the session.
    pub async fn welcome(&self, beneficiary_key: u64) -> (String, ChatMessage) {
        let beneficiary = self.directory.resolve(beneficiary_key);
        let (session_id, _) = self.store.create(beneficiary_key).await;

        let message = ChatMessage::assistant(
            &welcome_message(&beneficiary),
            MessageMetadata {
                intent: Some(IntentName::Welcome),
                confidence_score: Some(1.0),
                processing_time_ms: Some(0),
                ..MessageMetadata::default()
            },
        );
        (session_id, message)
    }

    async fn owned_session(
        &self,
        session_id: &str,
        beneficiary_key: u64,
    ) -> Result<crate::session::SessionHandle, ChatError> {
        let handle = self
            .store
            .get(session_id)
            .await
            .ok_or(ChatError::SessionNotFound)?;
        if handle.lock().await.beneficiary_key != beneficiary_key {
            tracing::warn!(session_id, beneficiary_key, "Session accessed by another beneficiary");
            return Err(ChatError::Forbidden);
        }
        Ok(handle)
    }

    /// Process one user message and return the assistant's reply
    pub async fn handle_message(
        &self,
        session_id: &str,
        beneficiary_key: u64,
        text: &str,
    ) -> Result<ChatMessage, ChatError> {
        let text = text.trim();
        if session_id.trim().is_empty() || text.is_empty() {
            return Err(ChatError::Validation(
                "Invalid request - session_id and message are required".to_string(),
            ));
        }
        let handle = self.owned_session(session_id.trim(), beneficiary_key).await?;

        // Run the turn on its own task so a bug in one controller cannot take
        // the connection down with it
        let this = self.clone();
        let text = text.to_string();
        tokio::spawn(async move {
            let mut session = handle.lock().await;
            this.run_turn(&mut session, &text).await
        })
        .await
        .map_err(|e| {
            tracing::error!(session_id, error = %e, "Turn task failed");
            ChatError::Internal(e.to_string())
        })
    }

    async fn run_turn(&self, session: &mut ChatSession, text: &str) -> ChatMessage {
        let started = Instant::now();
        session.add_message(ChatMessage::user(text));

        let detected = detect_or_unknown(self.detector.as_ref(), session).await;
        let merged = merge_context(session.current_intent, &session.collected_slots, &detected);
        if merged.reason.cleared() {
            tracing::info!(
                session_id = %session.session_id,
                reason = ?merged.reason,
                "Starting a fresh intent context"
            );
        }
        session.collected_slots = merged.slots;
        session.current_intent = Some(detected.intent);
        session.current_confidence = Some(detected.confidence);

        let beneficiary = self.directory.resolve(session.beneficiary_key);
        let reply = {
            let mut ctx = TurnContext {
                session: &mut *session,
                beneficiary: &beneficiary,
                services: &self.services,
            };
            route(detected.intent, &mut ctx).await
        };
        session.dialogue_state = DialogueState::after_turn(detected.intent, &reply.outcome);

        let elapsed = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        let mut message = ChatMessage::assistant(
            &reply.message,
            MessageMetadata {
                intent: Some(detected.intent),
                slots: Some(session.collected_slots.clone()),
                confidence_score: Some(detected.confidence),
                processing_time_ms: Some(elapsed),
                error: None,
            },
        );
        message.cards = reply.cards;
        message.cta = reply.cta;
        session.add_message(message.clone());

        tracing::info!(
            session_id = %session.session_id,
            intent = %detected.intent,
            confidence = detected.confidence,
            state = ?session.dialogue_state,
            elapsed_ms = elapsed,
            "Turn complete"
        );
        message
    }

    /// Snapshot of a session owned by `beneficiary_key`
    pub async fn history(
        &self,
        session_id: &str,
        beneficiary_key: u64,
    ) -> Result<ChatSession, ChatError> {
        let handle = self.owned_session(session_id, beneficiary_key).await?;
        let session = handle.lock().await;
        Ok(session.clone())
    }
}
