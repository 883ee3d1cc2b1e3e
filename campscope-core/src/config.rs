//! Configuration loading and management
//!
//! Configuration is loaded from `~/.config/campscope/config.toml`
//!
//! This module follows the XDG Base Directory Specification:
//! - Config: `$XDG_CONFIG_HOME/campscope/` (~/.config/campscope/)
//! - State/Logs: `$XDG_STATE_HOME/campscope/` (~/.local/state/campscope/)
//!
//! Database and model credentials are never read from the config file; they
//! are supplied per request by the caller.

use crate::error::{Error, Result};
use serde::Deserialize;
use std::path::PathBuf;

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

/// Returns XDG_STATE_HOME or ~/.local/state
fn xdg_state_home() -> PathBuf {
    std::env::var("XDG_STATE_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".local/state"))
}

/// Main configuration struct
#[derive(Debug, Deserialize, Default, Clone)]
pub struct Config {
    /// Database connection target
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Model API settings
    #[serde(default)]
    pub model: ModelConfig,

    /// Display tuning for rendered tables and stats
    #[serde(default)]
    pub display: DisplayConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Database connection target. Credentials are supplied at request time.
#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    /// Database host
    #[serde(default = "default_db_host")]
    pub host: String,

    /// Database port
    #[serde(default = "default_db_port")]
    pub port: u16,

    /// Database (schema) name
    #[serde(default = "default_db_name")]
    pub database: String,

    /// Connect timeout in seconds
    #[serde(default = "default_db_timeout")]
    pub connect_timeout_secs: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            host: default_db_host(),
            port: default_db_port(),
            database: default_db_name(),
            connect_timeout_secs: default_db_timeout(),
        }
    }
}

fn default_db_host() -> String {
    "localhost".to_string()
}

fn default_db_port() -> u16 {
    3306
}

fn default_db_name() -> String {
    "campaigns".to_string()
}

fn default_db_timeout() -> u64 {
    10
}

/// Model API settings. The API key is supplied at request time.
#[derive(Debug, Deserialize, Clone)]
pub struct ModelConfig {
    /// Model to use
    #[serde(default = "default_model_name")]
    pub model_name: String,

    /// API endpoint override; defaults to the OpenAI-compatible endpoint
    pub endpoint: Option<String>,

    /// Request timeout in seconds; streamed analyses can run long
    #[serde(default = "default_model_timeout")]
    pub timeout_secs: u64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            model_name: default_model_name(),
            endpoint: None,
            timeout_secs: default_model_timeout(),
        }
    }
}

fn default_model_name() -> String {
    "gpt-4o-mini".to_string()
}

fn default_model_timeout() -> u64 {
    600
}

/// Display tuning.
#[derive(Debug, Deserialize, Clone)]
pub struct DisplayConfig {
    /// Cap on rendered old/new value length before truncation
    #[serde(default = "default_max_value_length")]
    pub max_value_length: usize,

    /// How many top modified fields the stats block lists
    #[serde(default = "default_top_fields_limit")]
    pub top_fields_limit: usize,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            max_value_length: default_max_value_length(),
            top_fields_limit: default_top_fields_limit(),
        }
    }
}

fn default_max_value_length() -> usize {
    100
}

fn default_top_fields_limit() -> usize {
    10
}

/// Logging configuration
#[derive(Debug, Deserialize, Clone)]
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
    /// `$XDG_CONFIG_HOME/campscope/config.toml`
    pub fn config_path() -> PathBuf {
        xdg_config_home().join("campscope").join("config.toml")
    }

    /// Returns the state directory path (for logs)
    ///
    /// `$XDG_STATE_HOME/campscope/`
    pub fn state_dir() -> PathBuf {
        xdg_state_home().join("campscope")
    }

    /// Returns the log file path
    pub fn log_path() -> PathBuf {
        Self::state_dir().join("campscope.log")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.database.port, 3306);
        assert_eq!(config.database.connect_timeout_secs, 10);
        assert_eq!(config.model.model_name, "gpt-4o-mini");
        assert_eq!(config.display.max_value_length, 100);
        assert_eq!(config.display.top_fields_limit, 10);
    }

    #[test]
    fn test_parse_config() {
        let toml = r#"
[database]
host = "db.internal.example.com"
port = 6033
database = "trc"

[model]
model_name = "gpt-4o"

[display]
max_value_length = 60

[logging]
level = "debug"
"#;
        let config: Config = toml::from_str(toml).unwrap();

        assert_eq!(config.database.host, "db.internal.example.com");
        assert_eq!(config.database.port, 6033);
        assert_eq!(config.database.database, "trc");
        assert_eq!(config.model.model_name, "gpt-4o");
        assert_eq!(config.display.max_value_length, 60);
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let toml = r#"
[database]
host = "10.0.0.5"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.database.host, "10.0.0.5");
        assert_eq!(config.database.port, 3306);
        assert_eq!(config.model.timeout_secs, 600);
    }
}
