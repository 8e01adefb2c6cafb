//! Configuration errors.

use std::path::PathBuf;

use bindery_core::RegistrationError;
use thiserror::Error;

/// Why a configuration could not be loaded or applied.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// No file at the given path.
    #[error("no bindery configuration at {}", .path.display())]
    Missing {
        /// The path that was tried.
        path: PathBuf,
    },

    /// The file exists but could not be read.
    #[error("cannot read {}", .path.display())]
    Unreadable {
        /// The file.
        path: PathBuf,
        /// I/O cause.
        #[source]
        source: std::io::Error,
    },

    /// Malformed TOML, or TOML that does not fit [`BinderyConfig`](crate::BinderyConfig).
    #[error("bad TOML configuration: {0}")]
    Toml(#[from] toml::de::Error),

    /// Malformed JSON, or JSON that does not fit [`BinderyConfig`](crate::BinderyConfig).
    #[error("bad JSON configuration: {0}")]
    Json(#[from] serde_json::Error),

    /// A value parsed but is not acceptable.
    #[error("`{key}` {reason}")]
    Invalid {
        /// Dotted key, e.g. `openapi.title`.
        key: String,
        /// What is wrong with it.
        reason: String,
    },

    /// An environment override could not be applied.
    #[error("environment variable {var}: {reason}")]
    Env {
        /// Variable name.
        var: String,
        /// What is wrong with it.
        reason: String,
    },

    /// Neither `toml` nor `json`.
    #[error("unknown configuration format `{0}`, expected toml or json")]
    Format(String),

    /// The configuration names a setup that cannot be installed.
    #[error(transparent)]
    Setup(#[from] RegistrationError),
}

impl ConfigError {
    pub(crate) fn missing(path: impl Into<PathBuf>) -> Self {
        Self::Missing { path: path.into() }
    }

    pub(crate) fn unreadable(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Unreadable {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn invalid(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key: key.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn env(var: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Env {
            var: var.into(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        assert_eq!(
            ConfigError::missing("/etc/bindery.toml").to_string(),
            "no bindery configuration at /etc/bindery.toml"
        );
        assert_eq!(
            ConfigError::invalid("openapi.title", "must not be empty").to_string(),
            "`openapi.title` must not be empty"
        );
        assert_eq!(
            ConfigError::env("BINDERY__TELEMETRY__METRICS__ENABLED", "expected a boolean").to_string(),
            "environment variable BINDERY__TELEMETRY__METRICS__ENABLED: expected a boolean"
        );
        assert_eq!(
            ConfigError::Format("yaml".to_owned()).to_string(),
            "unknown configuration format `yaml`, expected toml or json"
        );
    }

    #[test]
    fn test_setup_error_is_transparent() {
        let err: ConfigError = RegistrationError::not_configured(vec!["parser_factory"]).into();
        assert_eq!(err.to_string(), "setup missing: parser_factory, call setup first");
    }
}
