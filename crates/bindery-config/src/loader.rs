//! Layered loading of [`BinderyConfig`].

use std::env;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use crate::{BinderyConfig, ConfigError};

/// Builds a [`BinderyConfig`] from defaults, then at most one document, then
/// `PREFIX__*` environment variables, and validates the result.
///
/// A document replaces everything before it. Sections it leaves out keep
/// their defaults, since every section is `#[serde(default)]`.
///
/// ```no_run
/// use bindery_config::ConfigLoader;
///
/// # fn main() -> Result<(), bindery_config::ConfigError> {
/// let config = ConfigLoader::new()
///     .with_file("bindery.toml")?
///     .with_dotenv()
///     .with_env_prefix("BINDERY")
///     .load()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Default)]
pub struct ConfigLoader {
    config: BinderyConfig,
    env_prefix: Option<String>,
}

impl ConfigLoader {
    /// Starts from [`BinderyConfig::default`].
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads a `.toml` or `.json` document, chosen by extension.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Missing`] when nothing is at `path`,
    /// [`ConfigError::Unreadable`] for other I/O failures, and a parse error
    /// for malformed content or unknown keys.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => ConfigError::missing(path),
            _ => ConfigError::unreadable(path, e),
        })?;
        let format = path.extension().and_then(|ext| ext.to_str()).unwrap_or("");

        self.config = parse(&content, format)?;
        tracing::debug!(path = %path.display(), "configuration file loaded");
        Ok(self)
    }

    /// Like [`with_file`](Self::with_file), but a missing file is skipped.
    pub fn with_optional_file<P: AsRef<Path>>(self, path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if fs::metadata(path).is_err_and(|e| e.kind() == ErrorKind::NotFound) {
            return Ok(self);
        }
        self.with_file(path)
    }

    /// Parses `content` as `format`, which is `toml` or `json`.
    ///
    /// ```
    /// use bindery_config::ConfigLoader;
    ///
    /// let toml = r#"
    ///     mode = "query"
    ///
    ///     [openapi]
    ///     title = "Shop"
    /// "#;
    ///
    /// let config = ConfigLoader::new()
    ///     .with_string(toml, "toml")
    ///     .unwrap()
    ///     .load()
    ///     .unwrap();
    ///
    /// assert_eq!(config.mode, "query");
    /// assert_eq!(config.openapi.title, "Shop");
    /// assert_eq!(config.openapi.docs_url, "/docs");
    /// ```
    pub fn with_string(mut self, content: &str, format: &str) -> Result<Self, ConfigError> {
        self.config = parse(content, format)?;
        Ok(self)
    }

    /// Reads overrides named `PREFIX__SECTION__KEY` at [`load`](Self::load),
    /// e.g. `BINDERY__MODE=query` or `BINDERY__OPENAPI__TITLE=Shop`.
    #[must_use]
    pub fn with_env_prefix(mut self, prefix: &str) -> Self {
        self.env_prefix = Some(prefix.to_uppercase());
        self
    }

    /// Exports `./.env` into the process environment if it exists. Variables
    /// that are already set win.
    #[must_use]
    pub fn with_dotenv(self) -> Self {
        if let Err(e) = dotenvy::dotenv() {
            tracing::debug!(error = %e, "no .env file loaded");
        }
        self
    }

    /// Exports the variables in `path`.
    ///
    /// # Errors
    ///
    /// The file cannot be read or a line does not parse.
    pub fn with_dotenv_file<P: AsRef<Path>>(self, path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        dotenvy::from_path(path).map_err(|e| match e {
            dotenvy::Error::Io(source) => ConfigError::unreadable(path, source),
            other => ConfigError::invalid(path.display().to_string(), other.to_string()),
        })?;
        Ok(self)
    }

    /// Applies overrides, then [`BinderyConfig::validate`].
    ///
    /// # Errors
    ///
    /// An override does not parse, or the result is invalid.
    ///
    /// ```
    /// use bindery_config::ConfigLoader;
    ///
    /// let config = ConfigLoader::new().load().unwrap();
    /// assert_eq!(config.openapi.openapi_url, "/openapi.json");
    /// ```
    pub fn load(mut self) -> Result<BinderyConfig, ConfigError> {
        if let Some(prefix) = self.env_prefix.take() {
            self.apply_env_overrides(&prefix)?;
        }
        self.config.validate()?;
        Ok(self.config)
    }

    /// The configuration as it stands, skipping overrides and validation.
    #[must_use]
    pub fn load_unvalidated(self) -> BinderyConfig {
        self.config
    }

    fn apply_env_overrides(&mut self, prefix: &str) -> Result<(), ConfigError> {
        let head = format!("{prefix}__");
        let mut vars: Vec<(String, String)> = env::vars().filter(|(k, _)| k.starts_with(&head)).collect();
        vars.sort();
        vars.iter()
            .try_for_each(|(key, value)| self.apply_env_var(key, value, prefix))
    }

    fn apply_env_var(&mut self, key: &str, value: &str, prefix: &str) -> Result<(), ConfigError> {
        let rest = key
            .strip_prefix(prefix)
            .and_then(|k| k.strip_prefix("__"))
            .ok_or_else(|| ConfigError::env(key, "invalid key format"))?;

        let parts: Vec<&str> = rest.split("__").collect();
        let openapi = &mut self.config.openapi;
        let logging = &mut self.config.telemetry.logging;

        match parts.as_slice() {
            ["MODE"] => self.config.mode = value.to_lowercase(),

            ["OPENAPI", "OPENAPI_URL"] => openapi.openapi_url = value.to_owned(),
            ["OPENAPI", "DOCS_URL"] => openapi.docs_url = value.to_owned(),
            ["OPENAPI", "TITLE"] => openapi.title = value.to_owned(),
            ["OPENAPI", "VERSION"] => openapi.version = value.to_owned(),
            ["OPENAPI", "DESCRIPTION"] => {
                openapi.description = Some(value.to_owned()).filter(|v| !v.is_empty());
            }

            ["TELEMETRY", "LOGGING", "ENABLED"] => logging.enabled = parse_bool(key, value)?,
            ["TELEMETRY", "LOGGING", "LEVEL"] => logging.level = value.to_owned(),
            ["TELEMETRY", "LOGGING", "FORMAT"] => {
                logging.format = value.parse().map_err(|reason: String| ConfigError::env(key, reason))?;
            }
            ["TELEMETRY", "LOGGING", "SPAN_EVENTS"] => logging.span_events = parse_bool(key, value)?,
            ["TELEMETRY", "LOGGING", "SOURCE_LOCATION"] => {
                logging.source_location = parse_bool(key, value)?;
            }
            ["TELEMETRY", "LOGGING", "TARGET"] => logging.target = parse_bool(key, value)?,
            ["TELEMETRY", "METRICS", "ENABLED"] => {
                self.config.telemetry.metrics.enabled = parse_bool(key, value)?;
            }

            _ => tracing::debug!(key, "ignoring unknown configuration variable"),
        }

        Ok(())
    }
}

fn parse(content: &str, format: &str) -> Result<BinderyConfig, ConfigError> {
    match format.to_lowercase().as_str() {
        "toml" => Ok(toml::from_str(content)?),
        "json" => Ok(serde_json::from_str(content)?),
        other => Err(ConfigError::Format(other.to_owned())),
    }
}

fn parse_bool(key: &str, s: &str) -> Result<bool, ConfigError> {
    match s.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::env(key, "expected a boolean")),
    }
}
