//! Food Scheduler CLI

mod commands;
mod config;
mod logging;
mod store;

use anyhow::Result;
use clap::{Parser, ValueEnum};
use commands::Commands;
use foodsched_client::{AccountService, ApiClient, MemoryCookieJar, TokenStore};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use store::FileStore;
use tracing::{Level, debug, error};

#[derive(Parser)]
#[command(name = "foodsched")]
#[command(about = "Command line client for the Food Scheduler backend")]
#[command(version)]
struct Cli {
    /// Set logging level
    #[arg(short = 'l', long, global = true, default_value = "warn")]
    log_level: LogLevel,

    /// Configuration file (TOML)
    #[arg(short = 'c', long, global = true)]
    config: Option<PathBuf>,

    /// Directory holding configuration and stored tokens
    #[arg(short = 'd', long, global = true, env = "FOODSCHED_STATE_DIR")]
    state_dir: Option<PathBuf>,

    /// Backend base URL, overriding the configuration
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Timeout for the whole command in seconds (0 = no timeout)
    #[arg(short = 't', long, global = true, default_value = "30")]
    timeout: u64,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init_logging(cli.log_level.into())?;

    let state_dir = match &cli.state_dir {
        Some(path) => config::StateDir::with_override(path),
        None => config::StateDir::new(),
    };

    let mut client_config = config::load_client_config(cli.config.as_deref(), &state_dir)?;
    if let Some(base_url) = cli.base_url {
        client_config.base_url = base_url;
    }

    let store = FileStore::open(state_dir.token_file())?;
    debug!(path = %store.path().display(), "Opened token store");
    let tokens = TokenStore::new(Arc::new(store), Arc::new(MemoryCookieJar::new()))
        .with_always_report_logged_in(client_config.always_report_logged_in);

    let client = ApiClient::from_config(&client_config, tokens)?;
    let accounts = AccountService::new(client);

    let outcome = if cli.timeout == 0 {
        cli.command.execute(&accounts).await
    } else {
        let timeout_duration = Duration::from_secs(cli.timeout);
        match tokio::time::timeout(timeout_duration, cli.command.execute(&accounts)).await {
            Ok(result) => result,
            Err(_) => Err(anyhow::anyhow!(
                "Command timed out after {} seconds",
                cli.timeout
            )),
        }
    };

    if let Err(e) = outcome {
        error!("Command failed: {e}");
        eprintln!("Error: {e}");
        std::process::exit(1);
    }

    Ok(())
}

#[derive(Clone, Debug, ValueEnum)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for Level {
    fn from(log_level: LogLevel) -> Self {
        match log_level {
            LogLevel::Error => Level::ERROR,
            LogLevel::Warn => Level::WARN,
            LogLevel::Info => Level::INFO,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Trace => Level::TRACE,
        }
    }
}
