use async_trait::async_trait;

use crate::api::models::{Task, TaskList};
use crate::auth::Credential;
use crate::error::TaskServiceError;

/// Remote task operations. Each call is a single request/response with no retry.
#[async_trait]
pub trait TaskService: Send + Sync {
    /// Create a task; returns the title echoed back by the service.
    async fn create_task(
        &self,
        credential: &Credential,
        list_id: &str,
        title: &str,
    ) -> Result<String, TaskServiceError>;

    /// Tasks of a list, first page only.
    async fn list_tasks(
        &self,
        credential: &Credential,
        list_id: &str,
    ) -> Result<Vec<Task>, TaskServiceError>;

    async fn delete_task(
        &self,
        credential: &Credential,
        list_id: &str,
        task_id: &str,
    ) -> Result<(), TaskServiceError>;

    async fn create_task_list(
        &self,
        credential: &Credential,
        title: &str,
    ) -> Result<TaskList, TaskServiceError>;

    /// Task lists of the account, first page only.
    async fn list_task_lists(&self, credential: &Credential)
        -> Result<Vec<TaskList>, TaskServiceError>;

    async fn delete_task_list(
        &self,
        credential: &Credential,
        list_id: &str,
    ) -> Result<(), TaskServiceError>;
}
