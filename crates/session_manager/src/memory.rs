//! In-memory session store shared by all command handlers

use crate::store::SessionStore;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Process-wide active list map (user_id -> list_id)
#[derive(Debug, Clone, Default)]
pub struct InMemorySessionStore {
    sessions: Arc<RwLock<HashMap<String, String>>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of users with an active list
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn get(&self, user_id: &str) -> Option<String> {
        let sessions = self.sessions.read().await;
        sessions.get(user_id).cloned()
    }

    async fn set(&self, user_id: &str, list_id: &str) {
        let mut sessions = self.sessions.write().await;
        let previous = sessions.insert(user_id.to_string(), list_id.to_string());
        log::debug!(
            "Active list for user {} set to {} (previous: {:?})",
            user_id,
            list_id,
            previous
        );
    }
}
