//! Configuration loader with hierarchical merging.
//!
//! # Load Order
//!
//! 1. Default values (compile-time)
//! 2. Config file (`--config PATH`, else `~/.nosleep/config.toml`)
//! 3. Environment variables (`NOSLEEP_*`)
//!
//! Each layer overrides the previous. Command-line flags are applied
//! afterwards through a [`ConfigResolver`](super::ConfigResolver).

use super::{default_config_path, ConfigError, NosleepConfig};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Helper macro for parsing boolean environment variables.
macro_rules! parse_env_bool {
    ($field:expr, $var:literal) => {
        if let Ok(val) = std::env::var($var) {
            $field = parse_bool(&val)
                .ok_or_else(|| ConfigError::invalid_env_var($var, "expected bool"))?;
        }
    };
}

/// Configuration loader with builder pattern.
///
/// # Example
///
/// ```
/// use nosleep_runtime::config::ConfigLoader;
///
/// let config = ConfigLoader::new()
///     .skip_global_config()
///     .skip_env_vars()
///     .load()
///     .unwrap();
/// assert_eq!(config.server.network, "tcp");
/// ```
#[derive(Debug, Clone, Default)]
pub struct ConfigLoader {
    /// Explicit config file. Must exist when set.
    config_file: Option<PathBuf>,

    /// Skip environment variable loading.
    skip_env: bool,

    /// Skip the default `~/.nosleep/config.toml`.
    skip_global: bool,
}

impl ConfigLoader {
    /// Creates a new loader with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads `path` instead of the default global config.
    ///
    /// Unlike the default location, a missing explicit file is an error.
    #[must_use]
    pub fn with_config_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_file = Some(path.into());
        self
    }

    /// Skips environment variable loading.
    ///
    /// Useful for testing with deterministic config.
    #[must_use]
    pub fn skip_env_vars(mut self) -> Self {
        self.skip_env = true;
        self
    }

    /// Skips the default global config file.
    #[must_use]
    pub fn skip_global_config(mut self) -> Self {
        self.skip_global = true;
        self
    }

    /// Loads and merges configuration from all sources.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a config file exists but cannot be read
    /// or parsed, if an explicit config file is missing, or if an
    /// environment variable holds an invalid value.
    pub fn load(&self) -> Result<NosleepConfig, ConfigError> {
        let mut config = NosleepConfig::default();

        if let Some(path) = &self.config_file {
            let file_config = self.load_file(path)?;
            debug!(path = %path.display(), "Loaded config file");
            config.merge(&file_config);
        } else if !self.skip_global {
            let path = default_config_path();
            if path.exists() {
                let file_config = self.load_file(&path)?;
                debug!(path = %path.display(), "Loaded global config");
                config.merge(&file_config);
            }
        }

        if !self.skip_env {
            self.apply_env_vars(&mut config)?;
        }

        Ok(config)
    }

    fn load_file(&self, path: &Path) -> Result<NosleepConfig, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::read_file(path, e))?;
        NosleepConfig::from_toml(&content).map_err(|e| ConfigError::parse_toml(path, e))
    }

    /// Applies environment variable overrides.
    fn apply_env_vars(&self, config: &mut NosleepConfig) -> Result<(), ConfigError> {
        parse_env_bool!(config.server.display, "NOSLEEP_DISPLAY");

        if let Ok(val) = std::env::var("NOSLEEP_NETWORK") {
            config.server.network = val;
        }
        if let Ok(val) = std::env::var("NOSLEEP_ADDRESS") {
            config.server.address = val;
        }
        if let Ok(val) = std::env::var("NOSLEEP_PORT") {
            config.server.port = val
                .trim()
                .parse()
                .map_err(|_| ConfigError::invalid_env_var("NOSLEEP_PORT", "expected port number"))?;
        }
        if let Ok(val) = std::env::var("NOSLEEP_LOG_LEVEL") {
            config.logging.level = val;
        }

        Ok(())
    }
}

/// Parses a boolean from string.
///
/// Accepts: "true", "false", "1", "0", "yes", "no", "on", "off"
/// (case-insensitive).
fn parse_bool(s: &str) -> Option<bool> {
    match s.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_config_file(dir: &Path, content: &str) -> PathBuf {
        let path = dir.join("config.toml");
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn load_defaults_only() {
        let config = ConfigLoader::new()
            .skip_global_config()
            .skip_env_vars()
            .load()
            .unwrap();

        assert_eq!(config, NosleepConfig::default());
    }

    #[test]
    fn load_explicit_config_file() {
        let temp = TempDir::new().unwrap();
        let path = create_config_file(
            temp.path(),
            r#"
[server]
address = "0.0.0.0"
port = 9015
display = true
"#,
        );

        let config = ConfigLoader::new()
            .with_config_file(&path)
            .skip_env_vars()
            .load()
            .unwrap();

        assert_eq!(config.server.address, "0.0.0.0");
        assert_eq!(config.server.port, 9015);
        assert!(config.server.display);
        assert_eq!(config.server.network, "tcp");
    }

    #[test]
    fn missing_explicit_file_is_error() {
        let err = ConfigLoader::new()
            .with_config_file("/nonexistent/nosleep/config.toml")
            .skip_env_vars()
            .load()
            .unwrap_err();

        assert!(matches!(err, ConfigError::ReadFile { .. }));
    }

    #[test]
    fn invalid_toml_is_error() {
        let temp = TempDir::new().unwrap();
        let path = create_config_file(temp.path(), "[server\nport = ");

        let err = ConfigLoader::new()
            .with_config_file(&path)
            .skip_env_vars()
            .load()
            .unwrap_err();

        assert!(matches!(err, ConfigError::ParseToml { .. }));
    }

    #[test]
    fn parse_bool_values() {
        assert_eq!(parse_bool("true"), Some(true));
        assert_eq!(parse_bool("TRUE"), Some(true));
        assert_eq!(parse_bool("1"), Some(true));
        assert_eq!(parse_bool("yes"), Some(true));
        assert_eq!(parse_bool("on"), Some(true));

        assert_eq!(parse_bool("false"), Some(false));
        assert_eq!(parse_bool("0"), Some(false));
        assert_eq!(parse_bool("no"), Some(false));
        assert_eq!(parse_bool("off"), Some(false));

        assert_eq!(parse_bool("invalid"), None);
    }

    #[test]
    fn env_var_override() {
        // Modifies process env; the only test here that reads it.
        std::env::set_var("NOSLEEP_PORT", "9123");
        std::env::set_var("NOSLEEP_DISPLAY", "yes");
        std::env::set_var("NOSLEEP_NETWORK", "tcp4");

        let loaded = ConfigLoader::new().skip_global_config().load();

        std::env::remove_var("NOSLEEP_PORT");
        std::env::remove_var("NOSLEEP_DISPLAY");
        std::env::remove_var("NOSLEEP_NETWORK");

        let config = loaded.unwrap();
        assert_eq!(config.server.port, 9123);
        assert!(config.server.display);
        assert_eq!(config.server.network, "tcp4");
    }
}
