pub mod auth_handler;
pub mod callback_server;
pub mod client_secrets;

use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::CredentialError;

/// OAuth scope granting read/write access to Google Tasks
pub const TASKS_SCOPE: &str = "https://www.googleapis.com/auth/tasks";

/// Tokens expiring within this window are treated as expired.
const EXPIRY_BUFFER_SECS: u64 = 60;

/// Access token for the task API, persisted as JSON in the token cache.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    /// Expiry as seconds since the Unix epoch
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<u64>,
    #[serde(default = "default_token_type")]
    pub token_type: String,
}

fn default_token_type() -> String {
    "Bearer".to_string()
}

pub(crate) fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|duration| duration.as_secs())
        .unwrap_or(0)
}

impl Credential {
    pub fn new(access_token: impl Into<String>) -> Self {
        Credential {
            access_token: access_token.into(),
            refresh_token: None,
            expires_at: None,
            token_type: default_token_type(),
        }
    }

    /// A token without a known expiry is assumed valid; the API rejects it otherwise.
    pub fn is_valid(&self) -> bool {
        self.is_valid_at(now_secs())
    }

    pub fn is_valid_at(&self, now: u64) -> bool {
        match self.expires_at {
            Some(expires_at) => expires_at.saturating_sub(EXPIRY_BUFFER_SECS) > now,
            None => !self.access_token.is_empty(),
        }
    }

    pub fn can_refresh(&self) -> bool {
        self.refresh_token
            .as_deref()
            .is_some_and(|token| !token.is_empty())
    }

    pub fn authorization_header(&self) -> String {
        format!("Bearer {}", self.access_token)
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("access_token", &"<redacted>")
            .field(
                "refresh_token",
                &self.refresh_token.as_ref().map(|_| "<redacted>"),
            )
            .field("expires_at", &self.expires_at)
            .field("token_type", &self.token_type)
            .finish()
    }
}

/// Source of a currently valid credential. Implementations refresh or
/// re-authorize as needed; callers borrow the result for one command.
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    async fn valid_credential(&self) -> Result<Credential, CredentialError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expiring_at(expires_at: u64) -> Credential {
        Credential {
            expires_at: Some(expires_at),
            ..Credential::new("token")
        }
    }

    #[test]
    fn expiry_buffer_applies() {
        let now = 1_700_000_000;
        assert!(expiring_at(now + 120).is_valid_at(now));
        assert!(!expiring_at(now + 30).is_valid_at(now));
        assert!(!expiring_at(now - 3600).is_valid_at(now));
    }

    #[test]
    fn missing_expiry_counts_as_valid() {
        assert!(Credential::new("token").is_valid());
        assert!(!Credential::new("").is_valid());
    }

    #[test]
    fn can_refresh_requires_non_empty_token() {
        let mut credential = Credential::new("token");
        assert!(!credential.can_refresh());
        credential.refresh_token = Some(String::new());
        assert!(!credential.can_refresh());
        credential.refresh_token = Some("refresh".to_string());
        assert!(credential.can_refresh());
    }

    #[test]
    fn debug_output_hides_tokens() {
        let credential = Credential {
            refresh_token: Some("refresh-secret".to_string()),
            ..Credential::new("access-secret")
        };
        let debug = format!("{credential:?}");
        assert!(!debug.contains("access-secret"));
        assert!(!debug.contains("refresh-secret"));
    }

    #[test]
    fn token_type_defaults_when_absent() {
        let credential: Credential =
            serde_json::from_str(r#"{"access_token":"abc","expires_at":10}"#).unwrap();
        assert_eq!(credential.token_type, "Bearer");
        assert_eq!(credential.authorization_header(), "Bearer abc");
    }
}
