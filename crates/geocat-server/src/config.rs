//! Configuration management for the catalog service.
//!
//! Configuration is layered:
//! 1. Default values (hardcoded)
//! 2. Configuration file (YAML)
//! 3. Environment variables (override)
//!
//! Environment variables use the `GEOCAT_` prefix and `__` as the nested
//! key separator, e.g. `GEOCAT_LOGGING__LEVEL=debug`.
//!
//! # Example
//!
//! ```ignore
//! use geocat_server::config::ServerConfig;
//!
//! let config = ServerConfig::load("geocat.yaml")?;
//! let config = ServerConfig::from_env()?;
//! ```

use std::net::IpAddr;
use std::path::Path;

use config::{Config, ConfigError, Environment, File, FileFormat};
use geocat_domain::IntranetNetwork;
use serde::{Deserialize, Serialize};

const ENV_PREFIX: &str = "GEOCAT";

/// Service configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct ServerConfig {
    #[serde(default)]
    pub storage: StorageSettings,

    #[serde(default)]
    pub logging: LoggingSettings,

    #[serde(default)]
    pub access: AccessSettings,
}

/// Storage backend settings.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct StorageSettings {
    /// Storage backend type. Only "memory" is available.
    #[serde(default = "default_storage_backend")]
    pub backend: String,

    /// YAML catalog seed loaded at startup.
    #[serde(default)]
    pub fixtures: Option<String>,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            backend: default_storage_backend(),
            fixtures: None,
        }
    }
}

fn default_storage_backend() -> String {
    "memory".to_string()
}

/// Logging settings.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct LoggingSettings {
    /// Log level: "trace", "debug", "info", "warn", "error"
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Use JSON format (true for production, false for development)
    #[serde(default)]
    pub json: bool,

    /// Log span enter/exit events
    #[serde(default)]
    pub spans: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
            spans: false,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Network treated as the intranet when computing group membership.
///
/// Clients inside it are members of the reserved `intranet` group.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct AccessSettings {
    #[serde(default = "default_intranet_network")]
    pub intranet_network: String,

    #[serde(default = "default_intranet_netmask")]
    pub intranet_netmask: String,
}

impl Default for AccessSettings {
    fn default() -> Self {
        Self {
            intranet_network: default_intranet_network(),
            intranet_netmask: default_intranet_netmask(),
        }
    }
}

fn default_intranet_network() -> String {
    "127.0.0.1".to_string()
}

fn default_intranet_netmask() -> String {
    "255.0.0.0".to_string()
}

impl AccessSettings {
    /// Parses the configured network and netmask.
    pub fn intranet(&self) -> Result<IntranetNetwork, ConfigLoadError> {
        let network = parse_ip("access.intranet_network", &self.intranet_network)?;
        let netmask = parse_ip("access.intranet_netmask", &self.intranet_netmask)?;
        if network.is_ipv4() != netmask.is_ipv4() {
            return Err(ConfigLoadError::Invalid {
                message: format!(
                    "access.intranet_network ({network}) and access.intranet_netmask ({netmask}) must be the same address family"
                ),
            });
        }
        Ok(IntranetNetwork::new(network, netmask))
    }
}

fn parse_ip(key: &str, value: &str) -> Result<IpAddr, ConfigLoadError> {
    value.trim().parse().map_err(|_| ConfigLoadError::Invalid {
        message: format!("{key} must be an IP address, got: {value}"),
    })
}

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigLoadError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] ConfigError),

    #[error("configuration file not found: {path}")]
    FileNotFound { path: String },

    #[error("invalid configuration: {message}")]
    Invalid { message: String },
}

impl ServerConfig {
    /// Load configuration from a YAML file with environment variable overrides.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigLoadError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigLoadError::FileNotFound {
                path: path.display().to_string(),
            });
        }

        let config = Config::builder()
            .add_source(Config::try_from(&ServerConfig::default())?)
            .add_source(File::from(path).format(FileFormat::Yaml))
            .add_source(environment())
            .build()?;

        let server_config: ServerConfig = config.try_deserialize()?;
        server_config.validate()?;

        Ok(server_config)
    }

    /// Load configuration from defaults and environment variables only.
    pub fn from_env() -> Result<Self, ConfigLoadError> {
        let config = Config::builder()
            .add_source(Config::try_from(&ServerConfig::default())?)
            .add_source(environment())
            .build()?;

        let server_config: ServerConfig = config.try_deserialize()?;
        server_config.validate()?;

        Ok(server_config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigLoadError> {
        let valid_backends = ["memory"];
        if !valid_backends.contains(&self.storage.backend.as_str()) {
            return Err(ConfigLoadError::Invalid {
                message: format!(
                    "storage.backend must be one of: {:?}, got: {}",
                    valid_backends, self.storage.backend
                ),
            });
        }

        if self
            .storage
            .fixtures
            .as_deref()
            .is_some_and(|p| p.trim().is_empty())
        {
            return Err(ConfigLoadError::Invalid {
                message: "storage.fixtures must not be empty when set".to_string(),
            });
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.to_lowercase().as_str()) {
            return Err(ConfigLoadError::Invalid {
                message: format!(
                    "logging.level must be one of: {:?}, got: {}",
                    valid_levels, self.logging.level
                ),
            });
        }

        self.access.intranet()?;

        Ok(())
    }
}

// GEOCAT_LOGGING__LEVEL -> logging.level
fn environment() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("_")
        .separator("__")
}
