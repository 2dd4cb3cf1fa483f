//! Wizard session storage.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::state::WizardStage;

/// Identifies one user's wizard in one chat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionKey {
    pub chat_id: i64,
    pub user_id: i64,
}

impl SessionKey {
    #[must_use]
    pub const fn new(chat_id: i64, user_id: i64) -> Self {
        Self { chat_id, user_id }
    }
}

/// Where in-progress wizards are kept.
///
/// Each operation is atomic with respect to a single key.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Returns a copy of the session, if any.
    async fn get(&self, key: SessionKey) -> Option<WizardStage>;

    /// Stores the session, replacing any previous one.
    async fn set(&self, key: SessionKey, stage: WizardStage);

    /// Removes the session.
    async fn clear(&self, key: SessionKey);

    /// Removes and returns the session.
    ///
    /// Of two concurrent `take` calls for the same key, at most one sees
    /// the session.
    async fn take(&self, key: SessionKey) -> Option<WizardStage>;
}

/// Process-local store. Sessions are lost on restart.
#[derive(Debug, Default)]
pub struct InMemorySessionStore {
    sessions: Mutex<HashMap<SessionKey, WizardStage>>,
}

impl InMemorySessionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn get(&self, key: SessionKey) -> Option<WizardStage> {
        self.sessions.lock().await.get(&key).cloned()
    }

    async fn set(&self, key: SessionKey, stage: WizardStage) {
        self.sessions.lock().await.insert(key, stage);
    }

    async fn clear(&self, key: SessionKey) {
        self.sessions.lock().await.remove(&key);
    }

    async fn take(&self, key: SessionKey) -> Option<WizardStage> {
        self.sessions.lock().await.remove(&key)
    }
}
