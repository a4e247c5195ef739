//! Configuration parsing and management.
//!
//! This module handles parsing of the service configuration file (TOML)
//! that defines the HTTP bind address, the ledger database path, and the
//! optional downstream forwarder. Binary flags override file values.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    /// The configuration file could not be parsed.
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// The configuration could not be serialized.
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Top-level service configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ServiceConfig {
    /// HTTP server configuration.
    #[serde(default)]
    pub server: ServerConfig,

    /// Ledger storage configuration.
    #[serde(default)]
    pub ledger: LedgerConfig,

    /// Downstream forwarder; emission is disabled when absent.
    #[serde(default)]
    pub forwarder: Option<ForwarderConfig>,
}

impl ServiceConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &std::path::Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is invalid.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Serialize configuration to TOML.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }
}

/// HTTP server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address the HTTP server binds to.
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
        }
    }
}

/// Ledger storage configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerConfig {
    /// Path to the ledger database file (`SQLite`).
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
        }
    }
}

/// Downstream forwarder configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForwarderConfig {
    /// Endpoint accepted envelopes are POSTed to.
    pub url: String,

    /// Request timeout in seconds.
    #[serde(default = "default_forward_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_bind_addr() -> String {
    "127.0.0.1:8330".to_string()
}

fn default_db_path() -> PathBuf {
    PathBuf::from("missions.db")
}

const fn default_forward_timeout_secs() -> u64 {
    10
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_uses_defaults() {
        let config = ServiceConfig::from_toml("").expect("empty config should parse");
        assert_eq!(config.server.bind_addr, "127.0.0.1:8330");
        assert_eq!(config.ledger.db_path, PathBuf::from("missions.db"));
        assert!(config.forwarder.is_none());
    }

    #[test]
    fn partial_config_fills_remaining_defaults() {
        let config = ServiceConfig::from_toml(
            r#"
            [ledger]
            db_path = "/var/lib/mctl/missions.db"
            "#,
        )
        .expect("config should parse");

        assert_eq!(
            config.ledger.db_path,
            PathBuf::from("/var/lib/mctl/missions.db")
        );
        assert_eq!(config.server.bind_addr, "127.0.0.1:8330");
    }

    #[test]
    fn forwarder_section_enables_emission() {
        let config = ServiceConfig::from_toml(
            r#"
            [forwarder]
            url = "https://downstream.example/api/ingest"
            "#,
        )
        .expect("config should parse");

        let forwarder = config.forwarder.expect("forwarder should be set");
        assert_eq!(forwarder.url, "https://downstream.example/api/ingest");
        assert_eq!(forwarder.timeout_secs, 10);
    }

    #[test]
    fn config_round_trips_through_toml() {
        let config = ServiceConfig {
            forwarder: Some(ForwarderConfig {
                url: "https://downstream.example/api/ingest".to_string(),
                timeout_secs: 5,
            }),
            ..ServiceConfig::default()
        };

        let toml = config.to_toml().expect("config should serialize");
        let parsed = ServiceConfig::from_toml(&toml).expect("config should re-parse");
        assert_eq!(parsed.forwarder.expect("forwarder").timeout_secs, 5);
    }

    #[test]
    fn invalid_toml_is_rejected() {
        assert!(matches!(
            ServiceConfig::from_toml("[server\nbind_addr = 3"),
            Err(ConfigError::Parse(_))
        ));
    }
}
