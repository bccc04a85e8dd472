use anyhow::Result;
use std::fs::OpenOptions;
use std::path::Path;
use tracing::Level;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

const LOG_FILE: &str = "tracker.log";

/// Initialize logging for the CLI.
///
/// `RUST_LOG` takes precedence over `filter`. Console output goes to
/// stderr so command output on stdout stays clean.
pub fn init_logging(level: Level, filter: Option<&str>, data_dir: &Path, no_file_log: bool) -> Result<()> {
    let env_filter = env_filter(level, filter);

    if no_file_log {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
        return Ok(());
    }

    std::fs::create_dir_all(data_dir)?;
    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(data_dir.join(LOG_FILE))?;

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(log_file)
                .with_ansi(false),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(true),
        )
        .init();

    Ok(())
}

fn env_filter(level: Level, filter: Option<&str>) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        filter.map_or_else(
            || {
                let level = level.as_str().to_lowercase();
                format!("tracker={level},tracker_http={level},tracker_core={level}").into()
            },
            EnvFilter::new,
        )
    })
}
