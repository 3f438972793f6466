use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::paths::{default_credentials_path, default_token_path};

pub const DEFAULT_TASKS_API_BASE: &str = "https://tasks.googleapis.com/tasks/v1";
pub const DEFAULT_OAUTH_PORT: u16 = 8080;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

const CONFIG_FILE_PATH: &str = "config.toml";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub telegram_token: Option<String>,
    pub credentials_path: PathBuf,
    pub token_path: PathBuf,
    pub tasks_api_base: String,
    pub oauth_port: u16,
    pub request_timeout_secs: u64,
    pub http_proxy: String,
    pub https_proxy: String,
    pub http_proxy_auth: Option<ProxyAuth>,
    pub https_proxy_auth: Option<ProxyAuth>,
    pub headless_auth: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProxyAuth {
    pub username: String,
    pub password: String,
}

fn parse_bool_env(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "y" | "on"
    )
}

impl Default for Config {
    fn default() -> Self {
        Config {
            telegram_token: None,
            credentials_path: default_credentials_path(),
            token_path: default_token_path(),
            tasks_api_base: DEFAULT_TASKS_API_BASE.to_string(),
            oauth_port: DEFAULT_OAUTH_PORT,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            http_proxy: String::new(),
            https_proxy: String::new(),
            http_proxy_auth: None,
            https_proxy_auth: None,
            headless_auth: false,
        }
    }
}

impl Config {
    /// Defaults, then `config.toml` from the working directory, then the process environment.
    pub fn new() -> Self {
        let mut config = Self::from_file(Path::new(CONFIG_FILE_PATH)).unwrap_or_default();
        config.apply_env(|key| std::env::var(key).ok());
        config
    }

    /// Read a TOML config file. Missing or unparsable files yield `None`.
    pub fn from_file(path: &Path) -> Option<Self> {
        if !path.exists() {
            return None;
        }
        let content = std::fs::read_to_string(path).ok()?;
        match toml::from_str::<Config>(&content) {
            Ok(config) => Some(config),
            Err(err) => {
                log::warn!("Ignoring malformed config file {}: {}", path.display(), err);
                None
            }
        }
    }

    /// Override fields from environment-style lookups.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(token) = lookup("TELOXIDE_TOKEN") {
            self.telegram_token = Some(token);
        }
        if let Some(path) = lookup("GOOGLE_CLIENT_SECRETS") {
            self.credentials_path = PathBuf::from(path);
        }
        if let Some(path) = lookup("GOOGLE_TOKEN_PATH") {
            self.token_path = PathBuf::from(path);
        }
        if let Some(base) = lookup("TASKS_API_BASE") {
            self.tasks_api_base = base;
        }
        if let Some(port) = lookup("OAUTH_PORT").and_then(|p| p.trim().parse().ok()) {
            self.oauth_port = port;
        }
        if let Some(secs) = lookup("REQUEST_TIMEOUT_SECS")
            .and_then(|s| s.trim().parse().ok())
            .filter(|secs: &u64| *secs > 0)
        {
            self.request_timeout_secs = secs;
        }
        if let Some(http_proxy) = lookup("HTTP_PROXY") {
            self.http_proxy = http_proxy;
        }
        if let Some(https_proxy) = lookup("HTTPS_PROXY") {
            self.https_proxy = https_proxy;
        }
        if let Some(headless) = lookup("TASK_BOT_HEADLESS") {
            self.headless_auth = parse_bool_env(&headless);
        }
    }

    /// A zero timeout from config.toml falls back to the default.
    pub fn request_timeout(&self) -> std::time::Duration {
        let secs = match self.request_timeout_secs {
            0 => DEFAULT_REQUEST_TIMEOUT_SECS,
            secs => secs,
        };
        std::time::Duration::from_secs(secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn parse_bool_env_true_values() {
        for value in ["1", "true", "TRUE", " yes ", "Y", "on"] {
            assert!(parse_bool_env(value), "value {value:?} should be true");
        }
    }

    #[test]
    fn parse_bool_env_false_values() {
        for value in ["0", "false", "no", "off", "", "  "] {
            assert!(!parse_bool_env(value), "value {value:?} should be false");
        }
    }

    #[test]
    fn env_overrides_defaults() {
        let env = HashMap::from([
            ("TELOXIDE_TOKEN", "123:abc"),
            ("OAUTH_PORT", "9090"),
            ("REQUEST_TIMEOUT_SECS", "5"),
            ("TASKS_API_BASE", "http://localhost:1234"),
            ("TASK_BOT_HEADLESS", "yes"),
        ]);
        let mut config = Config::default();
        config.apply_env(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.telegram_token.as_deref(), Some("123:abc"));
        assert_eq!(config.oauth_port, 9090);
        assert_eq!(config.request_timeout_secs, 5);
        assert_eq!(config.tasks_api_base, "http://localhost:1234");
        assert!(config.headless_auth);
    }

    #[test]
    fn unparsable_port_keeps_default() {
        let mut config = Config::default();
        config.apply_env(|key| (key == "OAUTH_PORT").then(|| "not-a-port".to_string()));
        assert_eq!(config.oauth_port, DEFAULT_OAUTH_PORT);
    }

    #[test]
    fn zero_timeout_keeps_default() {
        let mut config = Config::default();
        config.apply_env(|key| (key == "REQUEST_TIMEOUT_SECS").then(|| "0".to_string()));
        assert_eq!(config.request_timeout_secs, DEFAULT_REQUEST_TIMEOUT_SECS);

        let from_file = Config {
            request_timeout_secs: 0,
            ..Config::default()
        };
        assert_eq!(
            from_file.request_timeout(),
            std::time::Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS)
        );
    }

    #[test]
    fn partial_toml_file_fills_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "oauth_port = 8181\nheadless_auth = true\n").expect("write config");

        let config = Config::from_file(&path).expect("config");
        assert_eq!(config.oauth_port, 8181);
        assert!(config.headless_auth);
        assert_eq!(config.tasks_api_base, DEFAULT_TASKS_API_BASE);
        assert_eq!(config.request_timeout_secs, DEFAULT_REQUEST_TIMEOUT_SECS);
    }

    #[test]
    fn missing_file_is_none() {
        let dir = tempfile::tempdir().expect("tempdir");
        assert!(Config::from_file(&dir.path().join("absent.toml")).is_none());
    }
}
