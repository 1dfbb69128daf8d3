use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

/// Conversational mode of a single user. A user with no stored entry is Idle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserState {
    Idle,
    /// Last successfully dispatched command. Recorded on every dispatch but
    /// not consulted by routing; every message re-parses from scratch.
    LockedCommand { command: String },
    /// The user sent an image and the next text message is its analysis prompt.
    AwaitingImagePrompt { image_url: String },
}

/// Key-value store for per-user state, injected into the router so the
/// in-memory map can be swapped for a persistent backend.
#[async_trait]
pub trait StateStore: Send + Sync {
    async fn get(&self, user_id: &str) -> UserState;
    async fn set(&self, user_id: &str, state: UserState);
    async fn clear(&self, user_id: &str);
}

#[derive(Default)]
pub struct MemoryStateStore {
    states: Mutex<HashMap<String, UserState>>,
}

impl MemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StateStore for MemoryStateStore {
    async fn get(&self, user_id: &str) -> UserState {
        self.states
            .lock()
            .await
            .get(user_id)
            .cloned()
            .unwrap_or(UserState::Idle)
    }

    async fn set(&self, user_id: &str, state: UserState) {
        self.states.lock().await.insert(user_id.to_string(), state);
    }

    async fn clear(&self, user_id: &str) {
        self.states.lock().await.remove(user_id);
    }
}

/// One inbound message as recorded in a user's history.
#[derive(Debug, Clone)]
pub struct ConversationEntry {
    pub role: String,
    pub text: String,
    pub at: DateTime<Utc>,
}

/// Per-user append-only message history. Diagnostic only; routing never
/// reads it. Grows unbounded for the process lifetime.
#[derive(Default)]
pub struct ConversationLog {
    entries: Mutex<HashMap<String, Vec<ConversationEntry>>>,
}

impl ConversationLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn append_user_message(&self, user_id: &str, text: &str) {
        let entry = ConversationEntry {
            role: "user".to_string(),
            text: text.to_string(),
            at: Utc::now(),
        };
        self.entries
            .lock()
            .await
            .entry(user_id.to_string())
            .or_default()
            .push(entry);
    }

    pub async fn entries_for(&self, user_id: &str) -> Vec<ConversationEntry> {
        self.entries
            .lock()
            .await
            .get(user_id)
            .cloned()
            .unwrap_or_default()
    }
}
