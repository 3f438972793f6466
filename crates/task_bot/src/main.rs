use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, Context};
use bot_core::Config;
use clap::Parser;
use session_manager::InMemorySessionStore;
use task_bot::transport::telegram;
use task_bot::Dispatcher;
use tasks_client::{CredentialProvider, GoogleCredentialProvider, GoogleTasksClient};
use teloxide::Bot;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "task_bot")]
#[command(about = "Telegram bot for managing Google Tasks lists")]
#[command(version)]
struct Cli {
    /// Telegram bot token
    #[arg(long, env = "TELOXIDE_TOKEN", hide_env_values = true)]
    telegram_token: Option<String>,

    /// Google OAuth client secrets file
    #[arg(long, env = "GOOGLE_CLIENT_SECRETS")]
    credentials: Option<PathBuf>,

    /// Cached OAuth token file
    #[arg(long, env = "GOOGLE_TOKEN_PATH")]
    token_path: Option<PathBuf>,

    /// Port of the local OAuth redirect listener
    #[arg(long, env = "OAUTH_PORT")]
    oauth_port: Option<u16>,

    /// Print the consent URL instead of opening a browser
    #[arg(long, default_value = "false")]
    headless: bool,

    /// Run the OAuth flow (if needed) and exit without starting the bot
    #[arg(long, default_value = "false")]
    authorize_only: bool,
}

impl Cli {
    fn apply(self, config: &mut Config) {
        if let Some(token) = self.telegram_token {
            config.telegram_token = Some(token);
        }
        if let Some(path) = self.credentials {
            config.credentials_path = path;
        }
        if let Some(path) = self.token_path {
            config.token_path = path;
        }
        if let Some(port) = self.oauth_port {
            config.oauth_port = port;
        }
        if self.headless {
            config.headless_auth = true;
        }
    }
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(
            fmt::layer()
                .with_target(true)
                .with_thread_ids(false)
                .with_line_number(true)
                .with_file(false),
        )
        .init();

    if let Err(e) = run().await {
        tracing::error!("task_bot failed: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let authorize_only = cli.authorize_only;

    let mut config = Config::new();
    cli.apply(&mut config);

    bot_core::paths::ensure_data_dir().context("Failed to create data directory")?;

    let credentials = Arc::new(GoogleCredentialProvider::from_config(&config)?);

    if authorize_only {
        credentials
            .valid_credential()
            .await
            .context("Google authorization failed")?;
        tracing::info!(
            "Google credential stored at {}",
            credentials.token_path().display()
        );
        return Ok(());
    }

    let token = config
        .telegram_token
        .clone()
        .ok_or_else(|| anyhow!("Telegram token missing: set TELOXIDE_TOKEN or --telegram-token"))?;

    let tasks = Arc::new(GoogleTasksClient::new(&config)?);
    let sessions = Arc::new(InMemorySessionStore::new());
    let dispatcher = Arc::new(Dispatcher::new(
        sessions,
        credentials,
        tasks,
        config.request_timeout(),
    ));

    tracing::info!("Starting task bot (tasks API: {})", config.tasks_api_base);
    telegram::run(Bot::new(token), dispatcher).await
}
