//! Google OAuth client secrets (`credentials.json` as downloaded from the Cloud console).

use std::path::Path;

use serde::Deserialize;

use crate::error::CredentialError;

pub const DEFAULT_AUTH_URI: &str = "https://accounts.google.com/o/oauth2/auth";
pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

#[derive(Debug, Clone, Deserialize)]
pub struct ClientSecrets {
    pub client_id: String,
    #[serde(default)]
    pub client_secret: String,
    #[serde(default = "default_auth_uri")]
    pub auth_uri: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_auth_uri() -> String {
    DEFAULT_AUTH_URI.to_string()
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

/// The file wraps the secrets in an `installed` (desktop app) or `web` section.
#[derive(Debug, Deserialize)]
struct ClientSecretsFile {
    installed: Option<ClientSecrets>,
    web: Option<ClientSecrets>,
}

impl ClientSecrets {
    pub fn load(path: &Path) -> Result<Self, CredentialError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| CredentialError::ClientSecrets {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;
        Self::parse(&content).map_err(|reason| CredentialError::ClientSecrets {
            path: path.to_path_buf(),
            reason,
        })
    }

    pub fn parse(content: &str) -> Result<Self, String> {
        let file: ClientSecretsFile =
            serde_json::from_str(content).map_err(|e| format!("invalid JSON: {e}"))?;
        let secrets = file
            .installed
            .or(file.web)
            .ok_or_else(|| "missing `installed` or `web` section".to_string())?;
        if secrets.client_id.trim().is_empty() {
            return Err("empty client_id".to_string());
        }
        Ok(secrets)
    }
}
