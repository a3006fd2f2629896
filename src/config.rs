//! Service configuration.
//!
//! Read from a TOML file (path in `ORDER_SERVICE_CONFIG`, default
//! `config/order-service.toml`), then overridden by environment variables.
//! A missing file means defaults.

use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::utils::CircuitBreakerConfig;

pub const CONFIG_PATH_ENV: &str = "ORDER_SERVICE_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "config/order-service.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("Validation error: {0}")]
    Validation(String),
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::Parse(err.to_string())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub inventory: InventoryConfig,
    pub database: DatabaseConfig,
    pub metrics: MetricsConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct InventoryConfig {
    /// Base URL of the stock service, without a trailing path
    pub base_url: String,
    /// Per-request timeout for reserve/release calls
    pub timeout_ms: u64,
    pub circuit_breaker: CircuitBreakerConfig,
}

impl InventoryConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for InventoryConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:9091".to_string(),
            timeout_ms: 5_000,
            circuit_breaker: CircuitBreakerConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// PostgreSQL URL. Orders are kept in memory when unset.
    pub url: Option<String>,
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            max_connections: 5,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    pub enabled: bool,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl FromStr for AppConfig {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let config: AppConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }
}

impl AppConfig {
    /// Load from the configured file and apply environment overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let path =
            std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        let mut config = Self::from_file(&path)?;
        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            tracing::info!(path = %path.display(), "No config file found, using defaults");
            return Ok(Self::default());
        }
        std::fs::read_to_string(path)?.parse()
    }

    /// Apply `ORDER_SERVICE_*` overrides looked up through `lookup`.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("ORDER_SERVICE_INVENTORY_URL") {
            self.inventory.base_url = url;
        }
        if let Some(url) = lookup("ORDER_SERVICE_DATABASE_URL") {
            self.database.url = Some(url);
        }
        if let Some(port) = lookup("ORDER_SERVICE_PORT") {
            self.server.port = port.parse().map_err(|_| {
                ConfigError::Validation(format!("ORDER_SERVICE_PORT is not a valid port: {}", port))
            })?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.inventory.base_url.trim().is_empty() {
            return Err(ConfigError::Validation(
                "inventory.base_url cannot be empty".to_string(),
            ));
        }
        if self.inventory.timeout_ms == 0 {
            return Err(ConfigError::Validation(
                "inventory.timeout_ms must be greater than zero".to_string(),
            ));
        }
        if self.database.max_connections == 0 {
            return Err(ConfigError::Validation(
                "database.max_connections must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}
