//! HTTP request handlers

use super::types::{
    ErrorCode, ErrorResponse, HealthResponse, MessageRequest, MessageResponse, SessionQuery,
    SessionResponse, WelcomeRequest, WelcomeResponse,
};
use super::AppState;
use crate::chat::ChatError;
use axum::{
    extract::{rejection::JsonRejection, rejection::QueryRejection, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Session lifecycle
        .route("/api/chatbot/welcome", post(welcome))
        .route("/api/chatbot/message", post(send_message))
        .route("/api/chatbot/sessions/:id", get(get_session))
        // Operations
        .route("/api/health", get(health))
        .route("/version", get(get_version))
        .with_state(state)
}

// ============================================================
// Chat
// ============================================================

async fn welcome(
    State(state): State<AppState>,
    body: Result<Json<WelcomeRequest>, JsonRejection>,
) -> Result<Json<WelcomeResponse>, AppError> {
    let Json(request) = body.map_err(AppError::from)?;
    let beneficiary_key = request.beneficiary_key.ok_or_else(|| {
        AppError::Validation("Invalid request - beneficiary_key is required".to_string())
    })?;

    let (session_id, message) = state.chat.welcome(beneficiary_key).await;
    Ok(Json(WelcomeResponse {
        success: true,
        session_id,
        message,
    }))
}

async fn send_message(
    State(state): State<AppState>,
    body: Result<Json<MessageRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>, AppError> {
    let Json(request) = body.map_err(AppError::from)?;
    let (Some(session_id), Some(beneficiary_key), Some(text)) =
        (request.session_id, request.beneficiary_key, request.message)
    else {
        return Err(AppError::Validation(
            "Invalid request - session_id, beneficiary_key and message are required".to_string(),
        ));
    };

    let message = state
        .chat
        .handle_message(&session_id, beneficiary_key, &text)
        .await?;
    Ok(Json(MessageResponse {
        success: true,
        message,
        session_updated: true,
    }))
}

async fn get_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    query: Result<Query<SessionQuery>, QueryRejection>,
) -> Result<Json<SessionResponse>, AppError> {
    let beneficiary_key = query
        .map_err(|e| AppError::Validation(e.body_text()))?
        .0
        .beneficiary_key
        .ok_or_else(|| {
            AppError::Validation("Invalid request - beneficiary_key is required".to_string())
        })?;

    let session = state.chat.history(&session_id, beneficiary_key).await?;
    Ok(Json(SessionResponse {
        success: true,
        session,
    }))
}

// ============================================================
// Operations
// ============================================================

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        active_sessions: state.chat.active_sessions().await,
    })
}

async fn get_version() -> &'static str {
    concat!("medicare-chatbot ", env!("CARGO_PKG_VERSION"))
}

// ============================================================
// Error Handling
// ============================================================

#[derive(Debug)]
enum AppError {
    Validation(String),
    Forbidden(String),
    NotFound(String),
    Internal(String),
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl From<ChatError> for AppError {
    fn from(error: ChatError) -> Self {
        let message = error.to_string();
        match error {
            ChatError::Validation(_) => AppError::Validation(message),
            ChatError::SessionNotFound => AppError::NotFound(message),
            ChatError::Forbidden => AppError::Forbidden(message),
            ChatError::Internal(_) => AppError::Internal("Internal server error".to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, ErrorCode::ValidationError, msg),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, ErrorCode::SessionAuthError, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, ErrorCode::SessionError, msg),
            AppError::Internal(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, ErrorCode::ServerError, msg)
            }
        };

        let body = Json(ErrorResponse::new(code, message));
        (status, body).into_response()
    }
}
