//! Configuration types.
//!
//! [`BinderyConfig`] is the root. Every section has serde defaults, so a file
//! only needs the keys it changes; unknown keys are rejected.

use bindery_telemetry::TelemetryConfig;
use serde::{Deserialize, Serialize};

use crate::setup::Mode;
use crate::ConfigError;

/// Complete Bindery configuration.
///
/// ```
/// use bindery_config::BinderyConfig;
///
/// let config = BinderyConfig::default();
/// assert_eq!(config.mode, "http");
/// assert_eq!(config.openapi.openapi_url, "/openapi.json");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BinderyConfig {
    /// Which set of source parsers to install: `http` or `query`.
    #[serde(default = "default_mode")]
    pub mode: String,

    /// OpenAPI document and docs page settings.
    #[serde(default)]
    pub openapi: OpenApiConfig,

    /// Logging and metrics.
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

fn default_mode() -> String {
    Mode::Http.as_str().to_owned()
}

impl Default for BinderyConfig {
    fn default() -> Self {
        Self {
            mode: default_mode(),
            openapi: OpenApiConfig::default(),
            telemetry: TelemetryConfig::default(),
        }
    }
}

impl BinderyConfig {
    /// Checks values serde cannot.
    ///
    /// # Errors
    ///
    /// Fails on an unknown mode, an empty title or version, a URL without a
    /// leading slash, or a docs page without an OpenAPI document to load.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.mode.parse::<Mode>()?;

        let openapi = &self.openapi;
        if openapi.title.trim().is_empty() {
            return Err(ConfigError::invalid("openapi.title", "must not be empty"));
        }
        if openapi.version.trim().is_empty() {
            return Err(ConfigError::invalid("openapi.version", "must not be empty"));
        }
        for (field, url) in [
            ("openapi.openapi_url", &openapi.openapi_url),
            ("openapi.docs_url", &openapi.docs_url),
        ] {
            if !url.is_empty() && !url.starts_with('/') {
                return Err(ConfigError::invalid(
                    field,
                    format!("`{url}` must start with '/'"),
                ));
            }
        }
        if !openapi.docs_url.is_empty() && openapi.openapi_url.is_empty() {
            return Err(ConfigError::invalid(
                "openapi.docs_url",
                "requires openapi.openapi_url",
            ));
        }
        Ok(())
    }

    /// The parsed mode. Call after [`validate`](Self::validate).
    pub fn parsed_mode(&self) -> Result<Mode, ConfigError> {
        Ok(self.mode.parse()?)
    }
}

/// OpenAPI settings.
///
/// An empty URL disables the corresponding endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OpenApiConfig {
    /// Where the JSON document is served.
    pub openapi_url: String,

    /// Where the Swagger UI page is served.
    pub docs_url: String,

    /// API title.
    pub title: String,

    /// API version.
    pub version: String,

    /// API description.
    pub description: Option<String>,
}

impl Default for OpenApiConfig {
    fn default() -> Self {
        Self {
            openapi_url: "/openapi.json".to_owned(),
            docs_url: "/docs".to_owned(),
            title: "bindery".to_owned(),
            version: "0.1".to_owned(),
            description: None,
        }
    }
}

impl OpenApiConfig {
    /// The document URL, unless disabled.
    pub fn openapi_url(&self) -> Option<&str> {
        Some(self.openapi_url.as_str()).filter(|url| !url.is_empty())
    }

    /// The docs page URL, unless disabled. Requires a document URL.
    pub fn docs_url(&self) -> Option<&str> {
        self.openapi_url()?;
        Some(self.docs_url.as_str()).filter(|url| !url.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        let config = BinderyConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.parsed_mode().unwrap(), Mode::Http);
        assert_eq!(config.openapi.docs_url(), Some("/docs"));
    }

    #[test]
    fn test_unknown_mode_rejected() {
        let config = BinderyConfig {
            mode: "flask".to_owned(),
            ..BinderyConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert_eq!(
            err.to_string(),
            "unsupported mode `flask`, expected one of: http, query"
        );
    }

    #[test]
    fn test_disabled_document_disables_docs() {
        let mut config = BinderyConfig::default();
        config.openapi.openapi_url.clear();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid { ref key, .. }) if key == "openapi.docs_url"
        ));

        config.openapi.docs_url.clear();
        assert!(config.validate().is_ok());
        assert_eq!(config.openapi.openapi_url(), None);
        assert_eq!(config.openapi.docs_url(), None);
    }

    #[test]
    fn test_relative_url_rejected() {
        let mut config = BinderyConfig::default();
        config.openapi.docs_url = "docs".to_owned();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_unknown_field_rejected() {
        let result: Result<BinderyConfig, _> = toml::from_str("port = 8080");
        assert!(result.is_err());

        let result: Result<BinderyConfig, _> = toml::from_str("[openapi]\nurl = \"/schema\"");
        assert!(result.is_err());
    }
}
