//! Configuration management for ledgerscan

use crate::error::{ExplorerError, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// Unix time of the chain's first block (2019-04-18 06:07:02 UTC).
pub const DEFAULT_GENESIS_TIME: i64 = 1_555_567_622;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub explorer: ExplorerConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_api_port")]
    pub api_port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            api_port: default_api_port(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExplorerConfig {
    /// Lower bound used by the time-range filter when `startTime` is unset.
    #[serde(default = "default_genesis_time")]
    pub genesis_time: i64,
}

impl Default for ExplorerConfig {
    fn default() -> Self {
        Self {
            genesis_time: default_genesis_time(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_api_port() -> u16 {
    3000
}

fn default_db_path() -> String {
    "./data/ledger.db".to_string()
}

fn default_genesis_time() -> i64 {
    DEFAULT_GENESIS_TIME
}

impl Config {
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: Config = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.database.path.is_empty() {
            return Err(ExplorerError::ConfigError(
                "database.path must be set".to_string(),
            ));
        }
        if self.explorer.genesis_time < 0 {
            return Err(ExplorerError::ConfigError(format!(
                "explorer.genesis_time must not be negative, got {}",
                self.explorer.genesis_time
            )));
        }
        Ok(())
    }
}

/// Loads the config file at `path`, falling back to defaults when it is absent.
pub fn load_config(path: &Path) -> Result<Config> {
    if !path.exists() {
        tracing::warn!(path = %path.display(), "config file not found, using defaults");
        return Ok(Config::default());
    }
    let config_str = fs::read_to_string(path)?;
    Config::from_toml_str(&config_str)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_uses_defaults() {
        let config = Config::from_toml_str("").unwrap();
        assert_eq!(config.server.api_port, 3000);
        assert_eq!(config.database.path, "./data/ledger.db");
        assert_eq!(config.explorer.genesis_time, DEFAULT_GENESIS_TIME);
    }

    #[test]
    fn test_partial_sections() {
        let config = Config::from_toml_str(
            r#"
            [server]
            api_port = 8080

            [explorer]
            genesis_time = 42
            "#,
        )
        .unwrap();
        assert_eq!(config.server.api_port, 8080);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.explorer.genesis_time, 42);
    }

    #[test]
    fn test_rejects_empty_db_path() {
        let err = Config::from_toml_str("[database]\npath = \"\"\n").unwrap_err();
        assert!(matches!(err, ExplorerError::ConfigError(_)));
    }

    #[test]
    fn test_missing_file_falls_back() {
        let config = load_config(Path::new("/nonexistent/ledgerscan.toml")).unwrap();
        assert_eq!(config.server.api_port, 3000);
    }
}
