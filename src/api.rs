//! HTTP API for the chatbot

mod handlers;
mod types;

pub use handlers::create_router;

use crate::chat::ChatService;
use std::sync::Arc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub chat: Arc<ChatService>,
}

impl AppState {
    pub fn new(chat: ChatService) -> Self {
        Self {
            chat: Arc::new(chat),
        }
    }
}
