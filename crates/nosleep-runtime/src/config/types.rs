//! Configuration types.
//!
//! All types implement [`Default`] for compile-time fallback values.

use super::ConfigError;
use crate::rpc::{Endpoint, Network};
use serde::{Deserialize, Serialize};

/// Port the control server listens on by default.
pub const DEFAULT_PORT: u16 = 9001;

/// Main configuration structure.
///
/// # Example
///
/// ```
/// use nosleep_runtime::config::NosleepConfig;
///
/// let config = NosleepConfig::default();
/// assert_eq!(config.server.port, 9001);
/// assert!(!config.server.display);
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct NosleepConfig {
    /// Listener and initial-state settings.
    pub server: ServerConfig,

    /// Log output settings.
    pub logging: LoggingConfig,
}

impl NosleepConfig {
    /// Serializes to a TOML string.
    ///
    /// # Errors
    ///
    /// Returns error if serialization fails.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Deserializes from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns error if deserialization fails.
    pub fn from_toml(toml_str: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(toml_str)
    }

    /// Merges `other` into `self`, taking only fields that differ from
    /// their defaults.
    pub fn merge(&mut self, other: &Self) {
        self.server.merge(&other.server);
        self.logging.merge(&other.logging);
    }
}

/// Listener and initial-state settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ServerConfig {
    /// `tcp`, `tcp4`, `tcp6` or `unix`.
    pub network: String,

    /// Bind address, or socket path for `unix`.
    pub address: String,

    /// Bind port. Ignored for `unix`.
    pub port: u16,

    /// Start in display mode instead of system mode.
    pub display: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            network: "tcp".into(),
            address: "127.0.0.1".into(),
            port: DEFAULT_PORT,
            display: false,
        }
    }
}

impl ServerConfig {
    /// Validates the network kind and builds the endpoint to bind or dial.
    ///
    /// # Errors
    ///
    /// [`ConfigError::InvalidNetwork`] for unknown or unsupported kinds
    /// (including `unixpacket`).
    pub fn endpoint(&self) -> Result<Endpoint, ConfigError> {
        let network: Network = self
            .network
            .parse()
            .map_err(|_| ConfigError::InvalidNetwork(self.network.clone()))?;
        Ok(Endpoint::new(network, self.address.clone(), self.port))
    }

    fn merge(&mut self, other: &Self) {
        let default = Self::default();

        if other.network != default.network {
            self.network.clone_from(&other.network);
        }
        if other.address != default.address {
            self.address.clone_from(&other.address);
        }
        if other.port != default.port {
            self.port = other.port;
        }
        if other.display != default.display {
            self.display = other.display;
        }
    }
}

/// Log output settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive when neither flags nor `RUST_LOG` set one.
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
        }
    }
}

impl LoggingConfig {
    fn merge(&mut self, other: &Self) {
        if other.level != Self::default().level {
            self.level.clone_from(&other.level);
        }
    }
}
