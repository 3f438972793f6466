pub mod api;
pub mod auth;
pub mod client_trait;
pub mod error;
pub mod utils;

pub use api::client::GoogleTasksClient;
pub use api::models::{Task, TaskList};
pub use auth::auth_handler::GoogleCredentialProvider;
pub use auth::{Credential, CredentialProvider};
pub use bot_core::Config;
pub use client_trait::TaskService;
pub use error::{CredentialError, TaskServiceError};
pub use reqwest::StatusCode;
