use crate::error::config::ConfigError;

use common::ErrorLocation;

use std::panic::Location;
use std::path::Path;

use log::{info, warn};
use serde::Deserialize;

pub const CONFIG_FILE_NAME: &str = "config.json";

// ============================================
// CONFIG STRUCTS
// ============================================

/// Where the Moonraker instance lives.
///
/// `address` is usually `host:port` already; `port` is only appended when the
/// address carries none.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ServerConfig {
    pub address: String,
    #[serde(default)]
    pub port: Option<u16>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MonitorConfig {
    pub server: ServerConfig,
}

// ============================================
// IMPLEMENTATION
// ============================================

impl ServerConfig {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            port: None,
        }
    }

    /// `host:port` used for both the HTTP endpoints and the socket.
    pub fn authority(&self) -> String {
        let has_port = self
            .address
            .rsplit_once(':')
            .is_some_and(|(_, port)| port.parse::<u16>().is_ok());

        match self.port {
            Some(port) if !has_port => format!("{}:{}", self.address, port),
            _ => self.address.clone(),
        }
    }
}

impl MonitorConfig {
    /// Load config from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read, is not valid JSON,
    /// or fails [`MonitorConfig::validate`].
    pub fn load(config_path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(config_path).map_err(|e| {
            warn!("Failed to read config file {}: {}", config_path.display(), e);
            ConfigError::ReadError {
                location: ErrorLocation::from(Location::caller()),
                path: config_path.to_path_buf(),
                source: e,
            }
        })?;

        let config: MonitorConfig = serde_json::from_str(&contents).map_err(|e| {
            warn!("Failed to parse config JSON: {}", e);
            ConfigError::ParseError {
                location: ErrorLocation::from(Location::caller()),
                path: config_path.to_path_buf(),
                reason: e.to_string(),
            }
        })?;

        config.validate()?;

        info!(
            "Config loaded from {} (server {})",
            config_path.display(),
            config.server.authority()
        );
        Ok(config)
    }

    /// Validate config values.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ValidationError`] if the address is empty, has a
    /// scheme or a path, or the port is zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let address = self.server.address.trim();

        if address.is_empty() {
            return Err(ConfigError::ValidationError {
                location: ErrorLocation::from(Location::caller()),
                reason: "server.address cannot be empty".to_string(),
            });
        }

        // The scheme is chosen per endpoint (http:// or ws://)
        if address.contains("://") || address.contains('/') {
            return Err(ConfigError::ValidationError {
                location: ErrorLocation::from(Location::caller()),
                reason: format!(
                    "server.address must be host[:port] without scheme or path: {}",
                    address
                ),
            });
        }

        if self.server.port == Some(0) {
            return Err(ConfigError::ValidationError {
                location: ErrorLocation::from(Location::caller()),
                reason: "server.port must be non-zero".to_string(),
            });
        }

        Ok(())
    }
}
