use std::time::Duration;

use tasks_client::{CredentialError, TaskServiceError};
use thiserror::Error;

use crate::messages;

/// Why a command did not produce its success reply
#[derive(Debug, Error)]
pub enum CommandError {
    /// Carries the usage text to show the user
    #[error("missing argument")]
    MissingArgument(&'static str),

    #[error("no active task list")]
    NoActiveSession,

    #[error(transparent)]
    Remote(#[from] TaskServiceError),

    #[error(transparent)]
    Credential(#[from] CredentialError),

    #[error("remote call timed out after {0:?}")]
    Timeout(Duration),
}

impl CommandError {
    /// Validation failures get specific guidance; everything else collapses to one generic reply.
    pub fn user_message(&self) -> &'static str {
        match self {
            CommandError::MissingArgument(usage) => usage,
            CommandError::NoActiveSession => messages::NO_ACTIVE_LIST,
            CommandError::Remote(_) | CommandError::Credential(_) | CommandError::Timeout(_) => {
                messages::GENERIC_ERROR
            }
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            CommandError::MissingArgument(_) | CommandError::NoActiveSession
        )
    }
}
