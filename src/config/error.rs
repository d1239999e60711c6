//! Errors raised while resolving, reading or writing configuration.

use crate::port::PortError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    /// A file given explicitly (flag or `load_from`) does not exist.
    #[error("No configuration file at {0}")]
    NotFound(PathBuf),

    #[error("Cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed configuration: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Cannot encode configuration: {0}")]
    Encode(#[from] toml::ser::Error),

    #[error("Cannot write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The value parsed but this platform cannot use it.
    #[error("{key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("{var}: {message}")]
    InvalidEnv { var: String, message: String },

    /// `save` on a loader that was built from defaults.
    #[error("No configuration path to save to")]
    NoPath,
}

impl ConfigError {
    pub fn invalid_value(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            key: key.into(),
            message: message.into(),
        }
    }

    /// A line setting the port layer rejected.
    pub fn port_value(key: &str, err: &PortError) -> Self {
        Self::invalid_value(key, err.to_string())
    }

    pub fn invalid_env(var: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidEnv {
            var: var.into(),
            message: message.into(),
        }
    }
}

pub type ConfigResult<T> = Result<T, ConfigError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_port_value_message() {
        let err = ConfigError::port_value("port.stop_bit", &PortError::not_supported("Stop bit"));
        assert_eq!(err.to_string(), "port.stop_bit: Stop bit not supported");
    }

    #[test]
    fn test_invalid_env_names_variable() {
        let err = ConfigError::invalid_env("PORTABLE_SERIAL_PORT_PARITY", "unknown variant `loud`");
        assert!(err.to_string().starts_with("PORTABLE_SERIAL_PORT_PARITY: "));
    }
}
