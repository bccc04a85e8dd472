//! Client configuration

use config::ConfigError;
use serde::{Deserialize, Serialize};
use tracker_core::ValidateConfig;
use tracker_core::validation::validators;

/// Default API origin used when nothing else is configured
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_user_agent() -> String {
    concat!("expense-tracker-client/", env!("CARGO_PKG_VERSION")).to_string()
}

/// Settings selecting and tuning the API transport
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClientConfig {
    /// API origin, e.g. `https://tracker.example.com`
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-request timeout in seconds; unset means the transport default
    #[serde(default)]
    pub timeout_secs: Option<u64>,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: None,
            user_agent: default_user_agent(),
        }
    }
}

impl ValidateConfig for ClientConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        validators::validate_url(&self.base_url, "client.base_url")?;
        if self.timeout_secs == Some(0) {
            return Err(ConfigError::Message(
                "client.timeout_secs: must be greater than zero".to_string(),
            ));
        }
        validators::validate_not_empty(&self.user_agent, "client.user_agent")?;
        Ok(())
    }
}
