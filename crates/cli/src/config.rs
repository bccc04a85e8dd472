//! CLI configuration

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracker_core::ValidateConfig;
use tracker_http::ClientConfig;

/// Config files picked up from the working directory when no explicit path
/// is given
const CONFIG_PATHS: &[&str] = &["tracker.toml", "config/tracker.toml"];

/// Environment variable overriding the data directory
pub const DATA_DIR_ENV: &str = "TRACKER_DATA_DIR";

/// Everything the `tracker` binary can be configured with
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TrackerConfig {
    #[serde(default)]
    pub client: ClientConfig,

    /// Default log filter when `RUST_LOG` is unset
    #[serde(default)]
    pub log_level: Option<String>,

    /// Where the session file and logs are kept
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
}

impl TrackerConfig {
    /// Load defaults, then a config file, then `TRACKER__*` variables
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder().add_source(Config::try_from(&Self::default())?);

        match path {
            Some(path) => {
                builder = builder.add_source(File::from(path));
            }
            None => {
                for path in CONFIG_PATHS {
                    if Path::new(path).exists() {
                        builder = builder.add_source(File::with_name(path).required(false));
                    }
                }
            }
        }

        builder = builder.add_source(
            Environment::with_prefix("TRACKER")
                .separator("__")
                .try_parsing(true),
        );

        let config: Self = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Data directory: explicit flag, then config, then
    /// `$TRACKER_DATA_DIR`, then the platform data directory
    pub fn resolve_data_dir(&self, flag: Option<PathBuf>) -> PathBuf {
        flag.or_else(|| self.data_dir.clone())
            .or_else(|| std::env::var_os(DATA_DIR_ENV).map(PathBuf::from))
            .unwrap_or_else(|| {
                dirs::data_dir()
                    .unwrap_or_else(|| PathBuf::from("."))
                    .join("expense-tracker")
            })
    }
}

impl ValidateConfig for TrackerConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        self.client.validate()
    }
}
