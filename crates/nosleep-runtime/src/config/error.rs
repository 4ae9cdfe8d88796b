//! Configuration errors.
//!
//! # Error Codes
//!
//! | Variant | Code |
//! |---------|------|
//! | [`ConfigError::ReadFile`] | `CONFIG_READ_FAILED` |
//! | [`ConfigError::ParseToml`] | `CONFIG_PARSE_FAILED` |
//! | [`ConfigError::Serialize`] | `CONFIG_SERIALIZE_FAILED` |
//! | [`ConfigError::InvalidEnvVar`] | `CONFIG_INVALID_ENV_VAR` |
//! | [`ConfigError::InvalidNetwork`] | `CONFIG_INVALID_NETWORK` |

use nosleep_types::ErrorCode;
use std::path::PathBuf;
use thiserror::Error;

/// Configuration error type.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read config file.
    #[error("failed to read config file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse TOML.
    #[error("failed to parse config file '{path}': {source}")]
    ParseToml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// Failed to serialize config.
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// Invalid environment variable value.
    #[error("invalid value for environment variable '{name}': {message}")]
    InvalidEnvVar { name: String, message: String },

    /// Network kind not usable for serving.
    #[error("invalid network '{0}': expected tcp, tcp4, tcp6 or unix")]
    InvalidNetwork(String),
}

impl ConfigError {
    /// Creates a read file error.
    pub fn read_file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::ReadFile {
            path: path.into(),
            source,
        }
    }

    /// Creates a parse TOML error.
    pub fn parse_toml(path: impl Into<PathBuf>, source: toml::de::Error) -> Self {
        Self::ParseToml {
            path: path.into(),
            source,
        }
    }

    /// Creates an invalid env var error.
    pub fn invalid_env_var(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidEnvVar {
            name: name.into(),
            message: message.into(),
        }
    }
}

impl ErrorCode for ConfigError {
    fn code(&self) -> &'static str {
        match self {
            Self::ReadFile { .. } => "CONFIG_READ_FAILED",
            Self::ParseToml { .. } => "CONFIG_PARSE_FAILED",
            Self::Serialize(_) => "CONFIG_SERIALIZE_FAILED",
            Self::InvalidEnvVar { .. } => "CONFIG_INVALID_ENV_VAR",
            Self::InvalidNetwork(_) => "CONFIG_INVALID_NETWORK",
        }
    }

    fn is_recoverable(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nosleep_types::assert_error_codes;

    #[test]
    fn error_display() {
        let err = ConfigError::invalid_env_var("NOSLEEP_PORT", "expected port number");
        assert!(err.to_string().contains("NOSLEEP_PORT"));
        assert!(err.to_string().contains("expected port number"));
    }

    #[test]
    fn all_error_codes_valid() {
        let parse_err = toml::from_str::<toml::Value>("= nope").expect_err("invalid toml");
        assert_error_codes(
            &[
                ConfigError::read_file("/x", std::io::Error::other("x")),
                ConfigError::parse_toml("/x", parse_err),
                ConfigError::invalid_env_var("X", "y"),
                ConfigError::InvalidNetwork("udp".into()),
            ],
            "CONFIG_",
        );
    }
}
