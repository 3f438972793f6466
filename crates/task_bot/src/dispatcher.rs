use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use session_manager::SessionStore;
use tasks_client::{CredentialProvider, TaskService};
use tracing::{debug, error, info};

use crate::command::{Command, ParsedCommand};
use crate::error::CommandError;
use crate::messages;

/// Routes parsed commands to the session store and the task service.
///
/// Cheap to share behind an `Arc`; every inbound message is handled
/// independently and the only shared mutable state lives in the session store
/// and the credential provider.
pub struct Dispatcher {
    sessions: Arc<dyn SessionStore>,
    credentials: Arc<dyn CredentialProvider>,
    tasks: Arc<dyn TaskService>,
    command_timeout: Duration,
}

impl Dispatcher {
    pub fn new(
        sessions: Arc<dyn SessionStore>,
        credentials: Arc<dyn CredentialProvider>,
        tasks: Arc<dyn TaskService>,
        command_timeout: Duration,
    ) -> Self {
        Dispatcher {
            sessions,
            credentials,
            tasks,
            command_timeout,
        }
    }

    /// Parse and handle raw message text. `None` when the text is not one of our commands.
    pub async fn handle_text(
        &self,
        user_id: &str,
        text: &str,
        bot_username: Option<&str>,
    ) -> Option<String> {
        let parsed = ParsedCommand::parse(text, bot_username)?;
        Some(self.dispatch(user_id, &parsed).await)
    }

    /// Run one command to completion and return the reply text. Never fails.
    pub async fn dispatch(&self, user_id: &str, parsed: &ParsedCommand) -> String {
        let command = parsed.command;
        debug!(user_id, command = command.name(), "Dispatching command");

        match self.execute(user_id, parsed).await {
            Ok(reply) => reply,
            Err(err) if err.is_validation() => {
                debug!(user_id, command = command.name(), "Rejected: {}", err);
                err.user_message().to_string()
            }
            Err(err) => {
                error!(user_id, command = command.name(), "Command failed: {}", err);
                err.user_message().to_string()
            }
        }
    }

    async fn execute(&self, user_id: &str, parsed: &ParsedCommand) -> Result<String, CommandError> {
        // The session check precedes argument validation.
        let active_list = if parsed.command.requires_active_list() {
            Some(self.active_list(user_id).await?)
        } else {
            None
        };

        match (parsed.command, active_list) {
            (Command::Start, _) => Ok(messages::help()),
            (Command::SetList, _) => self.set_list(user_id, parsed).await,
            (Command::NewTask, Some(list_id)) => self.new_task(list_id, parsed).await,
            (Command::ListTasks, Some(list_id)) => self.list_tasks(list_id).await,
            (Command::DeleteTask, Some(list_id)) => self.delete_task(list_id, parsed).await,
            (Command::NewTask | Command::ListTasks | Command::DeleteTask, None) => {
                Err(CommandError::NoActiveSession)
            }
            (Command::CreateTaskList, _) => self.create_task_list(parsed).await,
            (Command::ListTaskLists, _) => self.list_task_lists().await,
            (Command::DeleteTaskList, _) => self.delete_task_list(parsed).await,
        }
    }

    async fn active_list(&self, user_id: &str) -> Result<String, CommandError> {
        self.sessions
            .get(user_id)
            .await
            .ok_or(CommandError::NoActiveSession)
    }

    /// Bound the remote phase (credential + API call) of a command.
    async fn with_timeout<T, F>(&self, work: F) -> Result<T, CommandError>
    where
        F: Future<Output = Result<T, CommandError>>,
    {
        tokio::time::timeout(self.command_timeout, work)
            .await
            .map_err(|_| CommandError::Timeout(self.command_timeout))?
    }

    async fn set_list(&self, user_id: &str, parsed: &ParsedCommand) -> Result<String, CommandError> {
        let list_id = required(parsed.remainder(), messages::SET_LIST_USAGE)?;
        self.sessions.set(user_id, &list_id).await;
        info!(user_id, list_id = %list_id, "Active task list changed");
        Ok(messages::active_list_set(&list_id))
    }

    async fn new_task(&self, list_id: String, parsed: &ParsedCommand) -> Result<String, CommandError> {
        let title = required(parsed.remainder(), messages::NEW_TASK_USAGE)?;

        let created = self
            .with_timeout(async {
                let credential = self.credentials.valid_credential().await?;
                let created = self.tasks.create_task(&credential, &list_id, &title).await?;
                Ok::<_, CommandError>(created)
            })
            .await?;
        Ok(messages::task_created(&created, &list_id))
    }

    async fn list_tasks(&self, list_id: String) -> Result<String, CommandError> {
        let tasks = self
            .with_timeout(async {
                let credential = self.credentials.valid_credential().await?;
                let tasks = self.tasks.list_tasks(&credential, &list_id).await?;
                Ok::<_, CommandError>(tasks)
            })
            .await?;
        Ok(messages::tasks_in_list(&list_id, &tasks))
    }

    async fn delete_task(&self, list_id: String, parsed: &ParsedCommand) -> Result<String, CommandError> {
        let task_id = parsed
            .first_arg()
            .ok_or(CommandError::MissingArgument(messages::DELETE_TASK_USAGE))?;

        self.with_timeout(async {
            let credential = self.credentials.valid_credential().await?;
            self.tasks.delete_task(&credential, &list_id, task_id).await?;
            Ok::<_, CommandError>(())
        })
        .await?;
        Ok(messages::TASK_DELETED.to_string())
    }

    async fn create_task_list(&self, parsed: &ParsedCommand) -> Result<String, CommandError> {
        let title = required(parsed.remainder(), messages::CREATE_TASK_LIST_USAGE)?;

        let list = self
            .with_timeout(async {
                let credential = self.credentials.valid_credential().await?;
                let list = self.tasks.create_task_list(&credential, &title).await?;
                Ok::<_, CommandError>(list)
            })
            .await?;
        Ok(messages::task_list_created(&list))
    }

    async fn list_task_lists(&self) -> Result<String, CommandError> {
        let lists = self
            .with_timeout(async {
                let credential = self.credentials.valid_credential().await?;
                let lists = self.tasks.list_task_lists(&credential).await?;
                Ok::<_, CommandError>(lists)
            })
            .await?;
        Ok(messages::available_task_lists(&lists))
    }

    async fn delete_task_list(&self, parsed: &ParsedCommand) -> Result<String, CommandError> {
        let list_id = required(parsed.remainder(), messages::DELETE_TASK_LIST_USAGE)?;

        self.with_timeout(async {
            let credential = self.credentials.valid_credential().await?;
            self.tasks.delete_task_list(&credential, &list_id).await?;
            Ok::<_, CommandError>(())
        })
        .await?;
        Ok(messages::task_list_deleted(&list_id))
    }
}

fn required(value: String, usage: &'static str) -> Result<String, CommandError> {
    if value.is_empty() {
        Err(CommandError::MissingArgument(usage))
    } else {
        Ok(value)
    }
}
