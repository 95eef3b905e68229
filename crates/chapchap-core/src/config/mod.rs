mod defaults;


use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::ChapchapError;
use defaults::*;

/// Environment variable overriding `gateway.base_url`.
pub const ENV_API_URL: &str = "EVOLUTION_API_URL";
/// Environment variable overriding `gateway.api_key`.
pub const ENV_API_KEY: &str = "EVOLUTION_API_KEY";

/// Top-level Chapchap configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub chapchap: ChapchapConfig,
    #[serde(default)]
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub linking: LinkingConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub messaging: MessagingConfig,
    /// File the values were read from. `None` when running on defaults.
    #[serde(skip)]
    pub source: Option<PathBuf>,
}

/// General settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChapchapConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ChapchapConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            log_level: default_log_level(),
        }
    }
}

/// Evolution API connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Global API key sent as the `apikey` header.
    #[serde(default)]
    pub api_key: String,
    /// Integration type requested when creating instances.
    #[serde(default = "default_integration")]
    pub integration: String,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key: String::new(),
            integration: default_integration(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

/// Device-linking timings and retry budget.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkingConfig {
    /// Wait before the first QR fetch when the create response had none.
    #[serde(default = "default_qr_initial_delay_ms")]
    pub qr_initial_delay_ms: u64,
    #[serde(default = "default_qr_retry_interval_ms")]
    pub qr_retry_interval_ms: u64,
    /// Retries for ordinary QR failures.
    #[serde(default = "default_qr_max_retries")]
    pub qr_max_retries: u32,
    /// Retries while the instance reports it is not ready yet.
    #[serde(default = "default_qr_max_retries_not_ready")]
    pub qr_max_retries_not_ready: u32,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Give up waiting for `open` after this long. 0 = wait forever.
    #[serde(default = "default_link_timeout_secs")]
    pub link_timeout_secs: u64,
}

impl Default for LinkingConfig {
    fn default() -> Self {
        Self {
            qr_initial_delay_ms: default_qr_initial_delay_ms(),
            qr_retry_interval_ms: default_qr_retry_interval_ms(),
            qr_max_retries: default_qr_max_retries(),
            qr_max_retries_not_ready: default_qr_max_retries_not_ready(),
            poll_interval_ms: default_poll_interval_ms(),
            link_timeout_secs: default_link_timeout_secs(),
        }
    }
}

impl LinkingConfig {
    pub fn qr_initial_delay(&self) -> Duration {
        Duration::from_millis(self.qr_initial_delay_ms)
    }

    pub fn qr_retry_interval(&self) -> Duration {
        Duration::from_millis(self.qr_retry_interval_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn link_timeout(&self) -> Option<Duration> {
        (self.link_timeout_secs > 0).then(|| Duration::from_secs(self.link_timeout_secs))
    }
}

/// Local record store config.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_db_path")]
    pub db_path: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
        }
    }
}

/// Outgoing message options passed to the gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessagingConfig {
    /// Typing delay the gateway simulates before delivering.
    #[serde(default = "default_send_delay_ms")]
    pub delay_ms: u64,
    #[serde(default = "default_presence")]
    pub presence: String,
}

impl Default for MessagingConfig {
    fn default() -> Self {
        Self {
            delay_ms: default_send_delay_ms(),
            presence: default_presence(),
        }
    }
}

/// Expand `~` to home directory.
pub fn shellexpand(path: &str) -> String {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = std::env::var_os("HOME") {
            return format!("{}/{rest}", home.to_string_lossy());
        }
    }
    path.to_string()
}

impl Config {
    /// Apply `EVOLUTION_API_URL` / `EVOLUTION_API_KEY` on top of the file values.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(
            std::env::var(ENV_API_URL).ok(),
            std::env::var(ENV_API_KEY).ok(),
        );
    }

    fn apply_overrides(&mut self, base_url: Option<String>, api_key: Option<String>) {
        if let Some(url) = base_url.filter(|v| !v.trim().is_empty()) {
            self.gateway.base_url = url;
        }
        if let Some(key) = api_key.filter(|v| !v.trim().is_empty()) {
            self.gateway.api_key = key;
        }
    }
}

/// Load configuration from a TOML file.
///
/// Falls back to defaults if the file does not exist; `source` tells which.
pub fn load(path: &str) -> Result<Config, ChapchapError> {
    let path = Path::new(path);
    let mut config = if !path.exists() {
        Config::default()
    } else {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ChapchapError::Config(format!("failed to read {}: {}", path.display(), e))
        })?;
        let mut config: Config = toml::from_str(&content)
            .map_err(|e| ChapchapError::Config(format!("failed to parse config: {}", e)))?;
        config.source = Some(path.to_path_buf());
        config
    };

    config.apply_env_overrides();
    Ok(config)
}
