//! In-memory session store with idle-timeout eviction

use super::{ChatMessage, ChatSession, ContextUpdate, DEFAULT_MAX_MESSAGES};
use chrono::Utc;
use std::collections::HashMap;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;

/// Shared handle to one session; holding the lock serializes turns
pub type SessionHandle = Arc<Mutex<ChatSession>>;

#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Idle time after which a session is evicted
    pub timeout: Duration,
    /// How often the background sweep runs
    pub sweep_interval: Duration,
    /// Cap on stored messages per session
    pub max_messages: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(60 * 60),
            sweep_interval: Duration::from_secs(5 * 60),
            max_messages: DEFAULT_MAX_MESSAGES,
        }
    }
}

pub struct SessionStore {
    config: SessionConfig,
    sessions: RwLock<HashMap<String, SessionHandle>>,
}

impl SessionStore {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            config,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Create and register a new session, returning its id and handle
    pub async fn create(&self, beneficiary_key: u64) -> (String, SessionHandle) {
        let session = ChatSession::new(beneficiary_key).with_max_messages(self.config.max_messages);
        let id = session.session_id.clone();
        let handle = Arc::new(Mutex::new(session));
        self.sessions
            .write()
            .await
            .insert(id.clone(), Arc::clone(&handle));
        tracing::info!(session_id = %id, beneficiary_key, "Created chat session");
        (id, handle)
    }

    /// Look up a live session; an expired one is evicted and reported absent
    pub async fn get(&self, session_id: &str) -> Option<SessionHandle> {
        let handle = self.sessions.read().await.get(session_id).cloned()?;

        let expired = handle
            .lock()
            .await
            .is_expired(self.config.timeout, Utc::now());
        if expired {
            self.sessions.write().await.remove(session_id);
            tracing::info!(session_id = %session_id, "Evicted expired session on lookup");
            return None;
        }
        Some(handle)
    }

    pub async fn touch(&self, session_id: &str) -> bool {
        match self.get(session_id).await {
            Some(handle) => {
                handle.lock().await.touch();
                true
            }
            None => false,
        }
    }

    pub async fn add_message(&self, session_id: &str, message: ChatMessage) -> bool {
        match self.get(session_id).await {
            Some(handle) => {
                handle.lock().await.add_message(message);
                true
            }
            None => false,
        }
    }

    pub async fn update_context(&self, session_id: &str, update: ContextUpdate) -> bool {
        match self.get(session_id).await {
            Some(handle) => {
                handle.lock().await.update_context(update);
                true
            }
            None => false,
        }
    }

    /// Evict every expired session, returning how many were removed.
    ///
    /// Sessions locked by an in-flight turn are skipped; they are active.
    pub async fn sweep_expired(&self) -> usize {
        let now = Utc::now();
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, handle| match handle.try_lock() {
            Ok(session) => !session.is_expired(self.config.timeout, now),
            Err(_) => true,
        });
        let removed = before - sessions.len();
        if removed > 0 {
            tracing::info!(
                removed,
                remaining = sessions.len(),
                "Cleaned up expired chat sessions"
            );
        }
        removed
    }

    pub async fn active_count(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Run [`Self::sweep_expired`] every `sweep_interval` until the store is
    /// dropped
    pub fn spawn_sweeper(self: &Arc<Self>) -> JoinHandle<()> {
        let store: Weak<Self> = Arc::downgrade(self);
        let interval = self.config.sweep_interval;
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // First tick completes immediately
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let Some(store) = store.upgrade() else {
                    break;
                };
                store.sweep_expired().await;
            }
            tracing::debug!("Session sweeper stopped");
        })
    }
}
