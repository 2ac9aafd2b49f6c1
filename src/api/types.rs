//! API request and response types
//!
//! Request fields are optional so missing ones surface as validation errors
//! in our own error format rather than as extractor rejections.

use crate::session::{ChatMessage, ChatSession};
use serde::{Deserialize, Serialize};

/// Request to open a chat session
#[derive(Debug, Deserialize)]
pub struct WelcomeRequest {
    pub beneficiary_key: Option<u64>,
}

/// Request to send a message within a session
#[derive(Debug, Deserialize)]
pub struct MessageRequest {
    pub session_id: Option<String>,
    pub beneficiary_key: Option<u64>,
    pub message: Option<String>,
}

/// Query string of the session history endpoint
#[derive(Debug, Deserialize)]
pub struct SessionQuery {
    pub beneficiary_key: Option<u64>,
}

#[derive(Debug, Serialize)]
pub struct WelcomeResponse {
    pub success: bool,
    pub session_id: String,
    pub message: ChatMessage,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub success: bool,
    pub message: ChatMessage,
    pub session_updated: bool,
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub success: bool,
    pub session: ChatSession,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub active_sessions: usize,
}

/// Machine-readable error category sent with every failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    ValidationError,
    SessionAuthError,
    SessionError,
    ServerError,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
    pub code: ErrorCode,
}

impl ErrorResponse {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: message.into(),
            code,
        }
    }
}
