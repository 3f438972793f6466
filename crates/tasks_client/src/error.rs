use std::path::PathBuf;

use reqwest::StatusCode;
use thiserror::Error;

/// Failure of a call against the remote task API
#[derive(Debug, Error)]
pub enum TaskServiceError {
    #[error("task service returned {status}: {body}")]
    Remote { status: StatusCode, body: String },

    #[error("task service request failed: {0}")]
    Http(#[from] reqwest_middleware::Error),

    #[error("failed to decode task service response: {0}")]
    Decode(#[from] reqwest::Error),
}

/// Failure to obtain a usable access token
#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("client secrets at {path} are unusable: {reason}")]
    ClientSecrets { path: PathBuf, reason: String },

    #[error("token cache I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("token cache serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("token request failed: {0}")]
    Http(#[from] reqwest_middleware::Error),

    #[error("token endpoint returned {status}: {body}")]
    TokenEndpoint { status: StatusCode, body: String },

    #[error("authorization callback failed: {0}")]
    Callback(String),

    #[error("authorization denied: {0}")]
    Denied(String),
}

impl CredentialError {
    /// The token endpoint refused the grant itself (revoked or expired
    /// refresh token), so only a new consent can recover.
    pub fn is_rejected_grant(&self) -> bool {
        matches!(
            self,
            CredentialError::TokenEndpoint { status, .. }
                if *status == StatusCode::BAD_REQUEST || *status == StatusCode::UNAUTHORIZED
        )
    }
}
