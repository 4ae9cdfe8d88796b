//! Configuration with hierarchical layering.
//!
//! # Architecture
//!
//! ```text
//! Priority (highest to lowest):
//!
//! ┌──────────────────────────────────────────────┐
//! │  1. Command-line flags (ConfigResolver)      │  Per invocation
//! ├──────────────────────────────────────────────┤
//! │  2. Environment Variables (NOSLEEP_*)        │  Runtime override
//! ├──────────────────────────────────────────────┤
//! │  3. Config file (--config or                 │  User defaults
//! │     ~/.nosleep/config.toml)                  │
//! ├──────────────────────────────────────────────┤
//! │  4. Default Values (compile-time)            │  Fallback
//! └──────────────────────────────────────────────┘
//! ```
//!
//! # Environment Variables
//!
//! | Variable | Config Field | Type |
//! |----------|--------------|------|
//! | `NOSLEEP_NETWORK` | `server.network` | String |
//! | `NOSLEEP_ADDRESS` | `server.address` | String |
//! | `NOSLEEP_PORT` | `server.port` | u16 |
//! | `NOSLEEP_DISPLAY` | `server.display` | bool |
//! | `NOSLEEP_LOG_LEVEL` | `logging.level` | String |
//!
//! # Example Configuration
//!
//! ```toml
//! # ~/.nosleep/config.toml
//!
//! [server]
//! network = "tcp"
//! address = "127.0.0.1"
//! port = 9001
//! display = false
//!
//! [logging]
//! level = "info"
//! ```

mod error;
mod loader;
mod resolver;
mod types;

pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use resolver::ConfigResolver;
pub use types::{LoggingConfig, NosleepConfig, ServerConfig, DEFAULT_PORT};

/// Default global config directory.
pub fn default_config_dir() -> std::path::PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| std::path::PathBuf::from("."))
        .join(".nosleep")
}

/// Default global config file path.
pub fn default_config_path() -> std::path::PathBuf {
    default_config_dir().join("config.toml")
}
