//! Configuration loading and management
//!
//! Configuration is loaded from `~/.config/bjornwatch/config.toml`
//!
//! This module follows the XDG Base Directory Specification:
//! - Config: `$XDG_CONFIG_HOME/bjornwatch/` (~/.config/bjornwatch/)
//! - Data: `$XDG_DATA_HOME/bjornwatch/` (~/.local/share/bjornwatch/)
//! - State/Logs: `$XDG_STATE_HOME/bjornwatch/` (~/.local/state/bjornwatch/)
//!
//! The backend endpoint can also be supplied through the environment
//! (`BJORNWATCH_API_BASE`, `BJORNWATCH_API_TOKEN`); the environment wins
//! over the config file.

use crate::error::{Error, Result};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Environment override for `[api] base_url`
pub const ENV_API_BASE: &str = "BJORNWATCH_API_BASE";

/// Environment override for `[api] token`
pub const ENV_API_TOKEN: &str = "BJORNWATCH_API_TOKEN";

/// Returns a best-effort home directory path.
fn home_dir() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Returns XDG_CONFIG_HOME or ~/.config
fn xdg_config_home() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".config"))
}

/// Returns XDG_DATA_HOME or ~/.local/share
fn xdg_data_home() -> PathBuf {
    std::env::var("XDG_DATA_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".local/share"))
}

/// Returns XDG_STATE_HOME or ~/.local/state
fn xdg_state_home() -> PathBuf {
    std::env::var("XDG_STATE_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".local/state"))
}

/// Main configuration struct
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    /// Session backend endpoint configuration
    #[serde(default)]
    pub api: ApiConfig,

    /// Poll loop configuration
    #[serde(default)]
    pub poll: PollConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Session backend endpoint configuration
///
/// `base_url` absent (in both file and environment) is a valid state: the
/// fetcher then fails every lookup locally with a static message instead
/// of touching the network.
#[derive(Debug, Deserialize, Clone)]
pub struct ApiConfig {
    /// Backend base URL (e.g., `https://bjorn.example.com`)
    pub base_url: Option<String>,

    /// Optional bearer token sent with every request
    pub token: Option<String>,

    /// HTTP request timeout in seconds
    #[serde(default = "default_api_timeout")]
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            token: None,
            timeout_secs: default_api_timeout(),
        }
    }
}

impl ApiConfig {
    /// Base URL after applying the `BJORNWATCH_API_BASE` override.
    pub fn resolved_base_url(&self) -> Option<String> {
        std::env::var(ENV_API_BASE)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .or_else(|| self.base_url.clone())
    }

    /// Bearer token after applying the `BJORNWATCH_API_TOKEN` override.
    pub fn resolved_token(&self) -> Option<String> {
        std::env::var(ENV_API_TOKEN)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .or_else(|| self.token.clone())
    }
}

fn default_api_timeout() -> u64 {
    10
}

/// Poll loop configuration
#[derive(Debug, Deserialize, Clone)]
pub struct PollConfig {
    /// Milliseconds between transcript fetches
    #[serde(default = "default_poll_interval_ms")]
    pub interval_ms: u64,
}

impl PollConfig {
    /// The poll interval as a [`Duration`].
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_poll_interval_ms(),
        }
    }
}

fn default_poll_interval_ms() -> u64 {
    2000
}

/// Logging configuration
#[derive(Debug, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Load configuration from the default path
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();

        if !config_path.exists() {
            tracing::info!("No config file found at {:?}, using defaults", config_path);
            return Ok(Config::default());
        }

        Self::load_from(&config_path)
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &PathBuf) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read config file {:?}: {}", path, e)))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("failed to parse config: {}", e)))?;

        Ok(config)
    }

    /// Returns the default config file path
    ///
    /// `$XDG_CONFIG_HOME/bjornwatch/config.toml` (~/.config/bjornwatch/config.toml)
    pub fn config_path() -> PathBuf {
        xdg_config_home().join("bjornwatch").join("config.toml")
    }

    /// Returns the data directory path (for the stored login)
    ///
    /// `$XDG_DATA_HOME/bjornwatch/` (~/.local/share/bjornwatch/)
    pub fn data_dir() -> PathBuf {
        xdg_data_home().join("bjornwatch")
    }

    /// Returns the state directory path (for logs)
    ///
    /// `$XDG_STATE_HOME/bjornwatch/` (~/.local/state/bjornwatch/)
    pub fn state_dir() -> PathBuf {
        xdg_state_home().join("bjornwatch")
    }

    /// Returns the stored login file path
    ///
    /// `$XDG_DATA_HOME/bjornwatch/login.json` (~/.local/share/bjornwatch/login.json)
    pub fn login_path() -> PathBuf {
        Self::data_dir().join("login.json")
    }

    /// Returns the log file path
    ///
    /// `$XDG_STATE_HOME/bjornwatch/bjornwatch.log` (~/.local/state/bjornwatch/bjornwatch.log)
    pub fn log_path() -> PathBuf {
        Self::state_dir().join("bjornwatch.log")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.api.base_url.is_none());
        assert!(config.api.token.is_none());
        assert_eq!(config.api.timeout_secs, 10);
        assert_eq!(config.poll.interval_ms, 2000);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_parse_config() {
        let toml = r#"
[api]
base_url = "https://bjorn.example.com"
token = "tok_abc123"
timeout_secs = 5

[poll]
interval_ms = 1500

[logging]
level = "debug"
"#;
        let config: Config = toml::from_str(toml).unwrap();

        assert_eq!(
            config.api.base_url.as_deref(),
            Some("https://bjorn.example.com")
        );
        assert_eq!(config.api.token.as_deref(), Some("tok_abc123"));
        assert_eq!(config.api.timeout_secs, 5);
        assert_eq!(config.poll.interval_ms, 1500);
        assert_eq!(config.poll.interval(), Duration::from_millis(1500));
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_partial_config_keeps_defaults() {
        let toml = r#"
[api]
base_url = "https://bjorn.example.com"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.api.timeout_secs, 10);
        assert_eq!(config.poll.interval_ms, 2000);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_login_path() {
        let path = Config::login_path();
        assert!(path.ends_with("bjornwatch/login.json"));
    }
}
