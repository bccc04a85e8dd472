//! Expense tracker CLI

mod commands;
mod config;
mod logging;

use anyhow::Result;
use clap::{Parser, ValueEnum};
use commands::Commands;
use crate::config::TrackerConfig;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast::Receiver;
use tracing::{Level, debug, error};
use tracker_http::{ClientError, FileTokenStore, SessionEvent, TrackerClient};

/// File in the data directory holding the access token between runs
const SESSION_FILE: &str = "session.json";

#[derive(Parser)]
#[command(name = "tracker")]
#[command(about = "Track expenses, incomes, savings and budgets")]
#[command(version)]
struct Cli {
    /// Set logging level (overrides the config file)
    #[arg(short = 'l', long, global = true)]
    log_level: Option<LogLevel>,

    /// Data directory for the session file and logs
    #[arg(short = 'd', long, global = true)]
    data_dir: Option<PathBuf>,

    /// Configuration file (TOML)
    #[arg(short = 'c', long, global = true)]
    config: Option<PathBuf>,

    /// API origin, overriding the configured one
    #[arg(long, global = true, env = "TRACKER_BASE_URL")]
    base_url: Option<String>,

    /// Timeout for the whole command in seconds (0 = no timeout)
    #[arg(short = 't', long, global = true, default_value = "30")]
    timeout: u64,

    /// Disable file logging (only log to stderr)
    #[arg(long, global = true)]
    no_file_log: bool,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = TrackerConfig::load(cli.config.as_deref())?;
    let data_dir = config.resolve_data_dir(cli.data_dir.clone());

    let filter = match cli.log_level {
        Some(_) => None,
        None => config.log_level.as_deref(),
    };
    let level = cli.log_level.map_or(Level::WARN, Level::from);
    logging::init_logging(level, filter, &data_dir, cli.no_file_log)?;

    if let Some(base_url) = cli.base_url {
        config.client.base_url = base_url;
    }
    debug!(base_url = %config.client.base_url, data_dir = %data_dir.display(), "Starting tracker CLI");

    let tokens = Arc::new(FileTokenStore::new(data_dir.join(SESSION_FILE)));
    let client = TrackerClient::builder()
        .config(&config.client)
        .token_store(tokens)
        .build()?;
    let mut events = client.subscribe();

    // Execute command with optional timeout
    let outcome = if cli.timeout == 0 {
        Some(cli.command.execute(&client).await)
    } else {
        let timeout_duration = Duration::from_secs(cli.timeout);
        tokio::time::timeout(timeout_duration, cli.command.execute(&client))
            .await
            .ok()
    };

    let expired = session_expired(&mut events);
    match outcome {
        Some(Ok(())) => {
            if expired {
                eprintln!("Your session has expired. Run `tracker login` to log in again.");
            }
        }
        Some(Err(e)) => {
            let session_error = e
                .downcast_ref::<ClientError>()
                .is_some_and(ClientError::is_session_expired);
            if expired || session_error {
                eprintln!("Your session has expired. Run `tracker login` to log in again.");
            } else {
                error!("Command failed: {e:#}");
                eprintln!("Error: {e:#}");
            }
            std::process::exit(1);
        }
        None => {
            error!("Command timed out after {} seconds", cli.timeout);
            eprintln!("Timed out after {} seconds", cli.timeout);
            std::process::exit(1);
        }
    }

    Ok(())
}

/// Whether the session ended underneath the command
fn session_expired(events: &mut Receiver<SessionEvent>) -> bool {
    let mut expired = false;
    while let Ok(event) = events.try_recv() {
        debug!(?event, "Session event");
        expired |= event == SessionEvent::Expired;
    }
    expired
}

#[derive(Clone, Copy, Debug, ValueEnum)]
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
