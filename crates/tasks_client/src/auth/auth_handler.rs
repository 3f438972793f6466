use std::{
    fs::{create_dir_all, read_to_string, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use async_trait::async_trait;
use bot_core::Config;
use log::{info, warn};
use rand::{distributions::Alphanumeric, Rng};
use reqwest_middleware::ClientWithMiddleware;
use serde::Deserialize;
use tokio::sync::Mutex;

use super::callback_server::CallbackServer;
use super::client_secrets::ClientSecrets;
use super::{now_secs, Credential, CredentialProvider, TASKS_SCOPE};
use crate::error::CredentialError;
use crate::utils::http_utils::{build_http_client, build_retry_client, execute_request};

/// How long the interactive consent flow waits for the browser redirect
const AUTHORIZATION_TIMEOUT: Duration = Duration::from_secs(300);

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: Option<String>,
    expires_in: Option<u64>,
    token_type: Option<String>,
}

impl TokenResponse {
    fn into_credential(self, previous_refresh_token: Option<&str>) -> Credential {
        Credential {
            access_token: self.access_token,
            refresh_token: self
                .refresh_token
                .or_else(|| previous_refresh_token.map(str::to_string)),
            expires_at: self.expires_in.map(|secs| now_secs() + secs),
            token_type: self.token_type.unwrap_or_else(|| "Bearer".to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum ConsentPresentation {
    Headless(String),
    Browser(String),
}

/// Installed-app OAuth2 flow against Google with an on-disk token cache.
///
/// One shared identity serves every chat user. Acquisition is serialized so
/// that a single refresh or consent prompt runs at a time and the token file
/// has a single writer.
#[derive(Debug)]
pub struct GoogleCredentialProvider {
    client: Arc<ClientWithMiddleware>,
    secrets_path: PathBuf,
    token_path: PathBuf,
    oauth_port: u16,
    headless_auth: bool,
    acquisition_lock: Mutex<()>,
}

impl GoogleCredentialProvider {
    pub fn new(
        client: Arc<ClientWithMiddleware>,
        secrets_path: PathBuf,
        token_path: PathBuf,
        oauth_port: u16,
        headless_auth: bool,
    ) -> Self {
        GoogleCredentialProvider {
            client,
            secrets_path,
            token_path,
            oauth_port,
            headless_auth,
            acquisition_lock: Mutex::new(()),
        }
    }

    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let client = build_http_client(config)?;
        Ok(Self::new(
            Arc::new(build_retry_client(client)),
            config.credentials_path.clone(),
            config.token_path.clone(),
            config.oauth_port,
            config.headless_auth,
        ))
    }

    pub fn token_path(&self) -> &Path {
        &self.token_path
    }

    fn read_cached_credential(&self) -> Option<Credential> {
        let cached_str = read_to_string(&self.token_path).ok()?;
        match serde_json::from_str::<Credential>(&cached_str) {
            Ok(credential) => Some(credential),
            Err(e) => {
                warn!(
                    "Ignoring unreadable token cache {}: {}",
                    self.token_path.display(),
                    e
                );
                None
            }
        }
    }

    fn write_cached_credential(&self, credential: &Credential) -> Result<(), CredentialError> {
        if let Some(parent) = self.token_path.parent() {
            if !parent.as_os_str().is_empty() {
                create_dir_all(parent)?;
            }
        }
        let serialized = serde_json::to_string_pretty(credential)?;
        let mut options = OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }
        let mut file = options.open(&self.token_path)?;

        // mode() only applies on creation; tighten a file left by an older run.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            file.set_permissions(std::fs::Permissions::from_mode(0o600))?;
        }
        file.write_all(serialized.as_bytes())?;
        Ok(())
    }

    fn consent_presentation(&self, auth_url: &str) -> ConsentPresentation {
        if self.headless_auth {
            ConsentPresentation::Headless(format!(
                "Google Tasks authorization (headless)\nOpen this URL in a browser on this machine:\n{auth_url}\n"
            ))
        } else {
            ConsentPresentation::Browser(auth_url.to_string())
        }
    }

    fn build_auth_url(secrets: &ClientSecrets, redirect_uri: &str, state: &str) -> String {
        format!(
            "{}?response_type=code\
             &client_id={}\
             &redirect_uri={}\
             &scope={}\
             &state={}\
             &access_type=offline\
             &prompt=consent",
            secrets.auth_uri,
            urlencoding::encode(&secrets.client_id),
            urlencoding::encode(redirect_uri),
            urlencoding::encode(TASKS_SCOPE),
            state
        )
    }

    fn generate_state() -> String {
        rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(32)
            .map(char::from)
            .collect()
    }

    async fn request_token(
        &self,
        token_uri: &str,
        form: &[(&str, &str)],
        label: &str,
    ) -> Result<TokenResponse, CredentialError> {
        let request = self.client.post(token_uri).form(form);
        let response = execute_request(request, label).await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CredentialError::TokenEndpoint { status, body });
        }
        response
            .json::<TokenResponse>()
            .await
            .map_err(|e| CredentialError::Http(e.into()))
    }

    pub(crate) async fn refresh(
        &self,
        secrets: &ClientSecrets,
        refresh_token: &str,
    ) -> Result<Credential, CredentialError> {
        let response = self
            .request_token(
                &secrets.token_uri,
                &[
                    ("grant_type", "refresh_token"),
                    ("refresh_token", refresh_token),
                    ("client_id", secrets.client_id.as_str()),
                    ("client_secret", secrets.client_secret.as_str()),
                ],
                "oauth token refresh",
            )
            .await?;
        Ok(response.into_credential(Some(refresh_token)))
    }

    pub(crate) async fn exchange_code(
        &self,
        secrets: &ClientSecrets,
        code: &str,
        redirect_uri: &str,
    ) -> Result<Credential, CredentialError> {
        let response = self
            .request_token(
                &secrets.token_uri,
                &[
                    ("grant_type", "authorization_code"),
                    ("code", code),
                    ("redirect_uri", redirect_uri),
                    ("client_id", secrets.client_id.as_str()),
                    ("client_secret", secrets.client_secret.as_str()),
                ],
                "oauth code exchange",
            )
            .await?;
        Ok(response.into_credential(None))
    }

    /// Interactive consent: open the consent page and wait for the loopback redirect.
    async fn authorize(&self, secrets: &ClientSecrets) -> Result<Credential, CredentialError> {
        let state = Self::generate_state();
        let server = CallbackServer::bind(self.oauth_port, state.clone()).await?;
        let redirect_uri = server.redirect_uri();
        let auth_url = Self::build_auth_url(secrets, &redirect_uri, &state);

        match self.consent_presentation(&auth_url) {
            ConsentPresentation::Headless(message) => {
                println!("{message}");
                info!("Waiting for Google authorization on port {}", server.port());
            }
            ConsentPresentation::Browser(url) => {
                info!("Opening browser for Google authorization");
                if let Err(e) = webbrowser::open(&url) {
                    warn!("Failed to open browser: {e}");
                    println!("Open this URL to authorize access to Google Tasks:\n{url}");
                }
            }
        }

        let code = server.wait_for_code(AUTHORIZATION_TIMEOUT).await?;
        info!("Received authorization code, exchanging for tokens");
        self.exchange_code(secrets, &code, &redirect_uri).await
    }
}

#[async_trait]
impl CredentialProvider for GoogleCredentialProvider {
    async fn valid_credential(&self) -> Result<Credential, CredentialError> {
        let _guard = self.acquisition_lock.lock().await;

        if let Some(cached) = self.read_cached_credential() {
            if cached.is_valid() {
                return Ok(cached);
            }
            if let Some(refresh_token) = cached
                .refresh_token
                .as_deref()
                .filter(|_| cached.can_refresh())
            {
                let secrets = ClientSecrets::load(&self.secrets_path)?;
                match self.refresh(&secrets, refresh_token).await {
                    Ok(credential) => {
                        self.write_cached_credential(&credential)?;
                        info!("Refreshed Google access token");
                        return Ok(credential);
                    }
                    Err(e) if e.is_rejected_grant() => {
                        warn!("Refresh token rejected, falling back to interactive authorization: {e}");
                    }
                    Err(e) => {
                        warn!("Token refresh failed: {e}");
                        return Err(e);
                    }
                }
            }
        }

        let secrets = ClientSecrets::load(&self.secrets_path)?;
        let credential = self.authorize(&secrets).await?;
        self.write_cached_credential(&credential)?;
        info!("Stored new Google credential at {}", self.token_path.display());
        Ok(credential)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest_middleware::ClientBuilder;
    use tempfile::tempdir;

    fn test_http_client() -> Arc<ClientWithMiddleware> {
        let client = reqwest::Client::builder().no_proxy().build().expect("client");
        Arc::new(ClientBuilder::new(client).build())
    }

    fn provider(dir: &Path, headless: bool) -> GoogleCredentialProvider {
        GoogleCredentialProvider::new(
            test_http_client(),
            dir.join("credentials.json"),
            dir.join("token.json"),
            0,
            headless,
        )
    }

    fn sample_secrets() -> ClientSecrets {
        ClientSecrets::parse(r#"{"installed":{"client_id":"client id","client_secret":"secret"}}"#)
            .expect("secrets")
    }

    #[test]
    fn cached_credential_round_trip() {
        let dir = tempdir().expect("tempdir");
        let handler = provider(dir.path(), true);
        let credential = Credential {
            refresh_token: Some("refresh".to_string()),
            expires_at: Some(1234567890),
            ..Credential::new("cached-token")
        };

        handler
            .write_cached_credential(&credential)
            .expect("write cache");
        let loaded = handler.read_cached_credential().expect("read cache");
        assert_eq!(loaded, credential);
    }

    #[cfg(unix)]
    #[test]
    fn token_file_is_private() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().expect("tempdir");
        let handler = provider(dir.path(), true);
        handler
            .write_cached_credential(&Credential::new("t"))
            .expect("write cache");
        let mode = std::fs::metadata(handler.token_path())
            .expect("metadata")
            .permissions()
            .mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[cfg(unix)]
    #[test]
    fn existing_world_readable_token_file_is_tightened() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().expect("tempdir");
        let handler = provider(dir.path(), true);
        std::fs::write(handler.token_path(), "{}").expect("write");
        std::fs::set_permissions(handler.token_path(), std::fs::Permissions::from_mode(0o644))
            .expect("chmod");

        handler
            .write_cached_credential(&Credential::new("t"))
            .expect("write cache");
        let mode = std::fs::metadata(handler.token_path())
            .expect("metadata")
            .permissions()
            .mode();
        assert_eq!(mode & 0o777, 0o600);
        assert_eq!(
            handler.read_cached_credential().expect("read cache").access_token,
            "t"
        );
    }

    #[test]
    fn corrupt_cache_is_ignored() {
        let dir = tempdir().expect("tempdir");
        let handler = provider(dir.path(), true);
        std::fs::write(handler.token_path(), "{not json").expect("write");
        assert!(handler.read_cached_credential().is_none());
    }

    #[test]
    fn auth_url_requests_offline_tasks_scope() {
        let url = GoogleCredentialProvider::build_auth_url(
            &sample_secrets(),
            "http://localhost:8080/",
            "state123",
        );
        assert!(url.starts_with("https://accounts.google.com/o/oauth2/auth?"));
        assert!(url.contains("client_id=client%20id"));
        assert!(url.contains("redirect_uri=http%3A%2F%2Flocalhost%3A8080%2F"));
        assert!(url.contains("scope=https%3A%2F%2Fwww.googleapis.com%2Fauth%2Ftasks"));
        assert!(url.contains("state=state123"));
        assert!(url.contains("access_type=offline"));
    }

    #[test]
    fn generated_state_is_random_alphanumeric() {
        let a = GoogleCredentialProvider::generate_state();
        let b = GoogleCredentialProvider::generate_state();
        assert_eq!(a.len(), 32);
        assert!(a.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(a, b);
    }

    #[test]
    fn consent_presentation_respects_headless_flag() {
        let dir = tempdir().expect("tempdir");
        let url = "https://accounts.google.com/o/oauth2/auth?x=1";

        let headless = provider(dir.path(), true);
        assert!(matches!(
            headless.consent_presentation(url),
            ConsentPresentation::Headless(message) if message.contains(url)
        ));

        let gui = provider(dir.path(), false);
        assert_eq!(
            gui.consent_presentation(url),
            ConsentPresentation::Browser(url.to_string())
        );
    }

    #[test]
    fn token_response_keeps_previous_refresh_token() {
        let response = TokenResponse {
            access_token: "new".to_string(),
            refresh_token: None,
            expires_in: Some(3600),
            token_type: None,
        };
        let credential = response.into_credential(Some("old-refresh"));
        assert_eq!(credential.refresh_token.as_deref(), Some("old-refresh"));
        assert_eq!(credential.token_type, "Bearer");
        assert!(credential.is_valid());
    }
}
