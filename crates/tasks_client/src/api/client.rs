use std::sync::Arc;

use async_trait::async_trait;
use bot_core::Config;
use log::warn;
use reqwest::Response;
use reqwest_middleware::ClientWithMiddleware;

use crate::api::models::{NewItem, Task, TaskList, TaskListsPage, TasksPage};
use crate::auth::Credential;
use crate::client_trait::TaskService;
use crate::error::TaskServiceError;
use crate::utils::http_utils::{build_http_client, build_plain_client, execute_request};

/// Google Tasks REST v1 client
#[derive(Debug, Clone)]
pub struct GoogleTasksClient {
    client: Arc<ClientWithMiddleware>,
    base_url: String,
}

impl GoogleTasksClient {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let client = build_http_client(config)?;
        Ok(Self::with_client(
            Arc::new(build_plain_client(client)),
            config.tasks_api_base.clone(),
        ))
    }

    pub fn with_client(client: Arc<ClientWithMiddleware>, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        GoogleTasksClient { client, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn tasks_url(&self, list_id: &str) -> String {
        format!("{}/lists/{}/tasks", self.base_url, urlencoding::encode(list_id))
    }

    fn task_url(&self, list_id: &str, task_id: &str) -> String {
        format!(
            "{}/{}",
            self.tasks_url(list_id),
            urlencoding::encode(task_id)
        )
    }

    fn task_lists_url(&self) -> String {
        format!("{}/users/@me/lists", self.base_url)
    }

    fn task_list_url(&self, list_id: &str) -> String {
        format!("{}/{}", self.task_lists_url(), urlencoding::encode(list_id))
    }

    /// Map any non-2xx status to `TaskServiceError::Remote`, keeping the body for the log.
    async fn check_status(response: Response) -> Result<Response, TaskServiceError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        warn!("Task service rejected request with {}: {}", status, body);
        Err(TaskServiceError::Remote { status, body })
    }
}

#[async_trait]
impl TaskService for GoogleTasksClient {
    async fn create_task(
        &self,
        credential: &Credential,
        list_id: &str,
        title: &str,
    ) -> Result<String, TaskServiceError> {
        let request = self
            .client
            .post(self.tasks_url(list_id))
            .header("Authorization", credential.authorization_header())
            .json(&NewItem { title });
        let response = execute_request(request, "tasks.insert").await?;
        let task = Self::check_status(response).await?.json::<Task>().await?;
        Ok(task.title)
    }

    async fn list_tasks(
        &self,
        credential: &Credential,
        list_id: &str,
    ) -> Result<Vec<Task>, TaskServiceError> {
        let request = self
            .client
            .get(self.tasks_url(list_id))
            .header("Authorization", credential.authorization_header());
        let response = execute_request(request, "tasks.list").await?;
        let page = Self::check_status(response).await?.json::<TasksPage>().await?;
        Ok(page.items)
    }

    async fn delete_task(
        &self,
        credential: &Credential,
        list_id: &str,
        task_id: &str,
    ) -> Result<(), TaskServiceError> {
        let request = self
            .client
            .delete(self.task_url(list_id, task_id))
            .header("Authorization", credential.authorization_header());
        let response = execute_request(request, "tasks.delete").await?;
        Self::check_status(response).await?;
        Ok(())
    }

    async fn create_task_list(
        &self,
        credential: &Credential,
        title: &str,
    ) -> Result<TaskList, TaskServiceError> {
        let request = self
            .client
            .post(self.task_lists_url())
            .header("Authorization", credential.authorization_header())
            .json(&NewItem { title });
        let response = execute_request(request, "tasklists.insert").await?;
        let list = Self::check_status(response)
            .await?
            .json::<TaskList>()
            .await?;
        Ok(list)
    }

    async fn list_task_lists(
        &self,
        credential: &Credential,
    ) -> Result<Vec<TaskList>, TaskServiceError> {
        let request = self
            .client
            .get(self.task_lists_url())
            .header("Authorization", credential.authorization_header());
        let response = execute_request(request, "tasklists.list").await?;
        let page = Self::check_status(response)
            .await?
            .json::<TaskListsPage>()
            .await?;
        Ok(page.items)
    }

    async fn delete_task_list(
        &self,
        credential: &Credential,
        list_id: &str,
    ) -> Result<(), TaskServiceError> {
        let request = self
            .client
            .delete(self.task_list_url(list_id))
            .header("Authorization", credential.authorization_header());
        let response = execute_request(request, "tasklists.delete").await?;
        Self::check_status(response).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest_middleware::ClientBuilder;

    fn client(base: &str) -> GoogleTasksClient {
        let inner = reqwest::Client::builder().no_proxy().build().expect("client");
        GoogleTasksClient::with_client(Arc::new(ClientBuilder::new(inner).build()), base)
    }

    #[test]
    fn trailing_slash_is_trimmed() {
        let client = client("https://tasks.example.com/tasks/v1/");
        assert_eq!(client.base_url(), "https://tasks.example.com/tasks/v1");
    }

    #[test]
    fn ids_are_percent_encoded_in_paths() {
        let client = client("https://tasks.example.com/tasks/v1");
        assert_eq!(
            client.task_url("my list", "a/b"),
            "https://tasks.example.com/tasks/v1/lists/my%20list/tasks/a%2Fb"
        );
        assert_eq!(
            client.task_list_url("abc"),
            "https://tasks.example.com/tasks/v1/users/@me/lists/abc"
        );
    }
}
