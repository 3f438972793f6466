//! Session store trait

use async_trait::async_trait;

/// Mapping from chat user id to that user's active task list id.
///
/// There is intentionally no removal operation: once a user picks a list
/// it stays active until they pick another one.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Active task list for a user, if one was set
    async fn get(&self, user_id: &str) -> Option<String>;

    /// Set (or replace) the active task list for a user
    async fn set(&self, user_id: &str, list_id: &str);
}
