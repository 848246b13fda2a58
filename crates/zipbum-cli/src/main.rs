use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Registry, fmt, reload};

use zipbum_application::{AdminConsole, SessionController, view_channel};
use zipbum_core::config::ClientConfig;
use zipbum_core::preference::PreferenceStore;
use zipbum_core::transport::Transport;
use zipbum_infrastructure::{ConfigService, HttpTransport, TomlPreferenceStore};

mod helper;
mod repl;
mod view;

use view::TerminalView;

const LOG_ENV: &str = "ZIPBUM_LOG";
const DEFAULT_LOG_LEVEL: &str = "warn";

#[derive(Parser)]
#[command(name = "zipbum")]
#[command(about = "ZIPBUM chat client", long_about = None)]
struct Cli {
    /// Backend base URL
    #[arg(long, env = "ZIPBUM_BASE_URL", global = true)]
    base_url: Option<String>,

    /// Account email used to log in
    #[arg(long, env = "ZIPBUM_EMAIL", global = true)]
    email: Option<String>,

    /// Account password
    #[arg(long, env = "ZIPBUM_PASSWORD", hide_env_values = true, global = true)]
    password: Option<String>,

    /// Request timeout in seconds
    #[arg(long, global = true)]
    timeout: Option<u64>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Chat with the assistant (default)
    Chat,
    /// Browse and answer every user's conversations
    Admin,
}

impl Cli {
    /// Flags win over the config file and environment.
    fn apply(&self, config: &mut ClientConfig) {
        if let Some(base_url) = &self.base_url {
            config.base_url = base_url.clone();
        }
        if let Some(email) = &self.email {
            config.email = Some(email.clone());
        }
        if let Some(timeout) = self.timeout {
            config.request_timeout_secs = Some(timeout);
        }
    }
}

/// Installs the stderr subscriber before anything else can log.
///
/// The filter comes from `ZIPBUM_LOG`, else `warn` until the config file's
/// level is known.
fn init_tracing() -> reload::Handle<EnvFilter, Registry> {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_LEVEL));
    let (filter, handle) = reload::Layer::new(filter);
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .try_init();
    handle
}

/// The filter to switch to once the config is loaded; `ZIPBUM_LOG` wins.
fn config_filter(env_filter_set: bool, log_level: &str) -> Option<EnvFilter> {
    (!env_filter_set).then(|| EnvFilter::new(log_level))
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_filter = init_tracing();

    let mut config = ConfigService::new()?.load()?;
    cli.apply(&mut config);
    if let Some(filter) = config_filter(std::env::var_os(LOG_ENV).is_some(), &config.log_level) {
        if let Err(err) = log_filter.reload(filter) {
            tracing::warn!(error = %err, "Log level from config not applied");
        }
    }

    let transport = HttpTransport::new(&config)?;
    match (&config.email, &cli.password) {
        (Some(email), Some(password)) => {
            transport
                .login(email, password)
                .await
                .with_context(|| format!("login to {} failed", transport.base_url()))?;
        }
        _ => tracing::warn!("No credentials given; the backend may redirect to its login page"),
    }
    let transport: Arc<dyn Transport> = Arc::new(transport);

    let preferences = TomlPreferenceStore::new()?;
    let terminal = TerminalView::new(preferences.theme().unwrap_or_default());
    let (publisher, events) = view_channel();

    match cli.command.unwrap_or(Commands::Chat) {
        Commands::Chat => {
            let controller = SessionController::new(transport, publisher);
            repl::run_chat(controller, events, terminal, &preferences).await
        }
        Commands::Admin => {
            let console = AdminConsole::new(transport, publisher);
            repl::run_admin(console, events, terminal, &preferences).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_level_applies_without_env_filter() {
        let filter = config_filter(false, "debug").unwrap();
        assert_eq!(filter.to_string(), "debug");
    }

    #[test]
    fn env_filter_overrides_config_level() {
        assert!(config_filter(true, "debug").is_none());
    }

    #[test]
    fn flags_override_loaded_config() {
        let cli = Cli::parse_from(["zipbum", "--base-url", "http://zip:5000", "--timeout", "5"]);
        let mut config = ClientConfig::default();

        cli.apply(&mut config);

        assert_eq!(config.base_url, "http://zip:5000");
        assert_eq!(config.request_timeout_secs, Some(5));
    }
}
