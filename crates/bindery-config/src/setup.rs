//! Registration-time setup.
//!
//! A [`Setup`] holds what every view needs at registration: the parser
//! factory and the error handlers for blocking and cooperative views. A
//! mode installs all three; [`Setup::customize`] installs a custom factory
//! and keeps the default handlers unless others are given.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use bindery_core::{RegistrationError, RegistrationResult};
use bindery_extract::ParserFactory;
use bindery_router::{ErrorHandler, JsonErrorHandler};

use crate::config::{BinderyConfig, OpenApiConfig};
use crate::ConfigError;

/// Built-in parser sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Query, header, path, cookie, form and JSON body parsers.
    Http,
    /// Only the query-string parser.
    Query,
}

impl Mode {
    /// Names accepted by [`FromStr`].
    pub const SUPPORTED: [&'static str; 2] = ["http", "query"];

    /// Configuration name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Http => "http",
            Self::Query => "query",
        }
    }

    /// The parser factory this mode installs.
    pub fn factory(self) -> ParserFactory {
        match self {
            Self::Http => ParserFactory::http(),
            Self::Query => ParserFactory::query_only(),
        }
    }
}

impl FromStr for Mode {
    type Err = RegistrationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "http" => Ok(Self::Http),
            "query" => Ok(Self::Query),
            _ => Err(RegistrationError::UnsupportedMode {
                mode: s.to_owned(),
                supported: Self::SUPPORTED.to_vec(),
            }),
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Registration-time configuration.
///
/// ```
/// use bindery_config::Setup;
/// use bindery_core::ParamKind;
///
/// let setup = Setup::from_mode("query").unwrap();
/// assert!(setup.factory().unwrap().supports(ParamKind::Query));
/// assert!(!setup.factory().unwrap().supports(ParamKind::Body));
///
/// assert!(Setup::default().check().is_err());
/// ```
#[derive(Clone, Default)]
pub struct Setup {
    factory: Option<ParserFactory>,
    error_handler: Option<Arc<dyn ErrorHandler>>,
    async_error_handler: Option<Arc<dyn ErrorHandler>>,
    openapi: OpenApiConfig,
}

impl Setup {
    /// Installs the parsers of a named mode and the default error handlers.
    pub fn from_mode(mode: &str) -> RegistrationResult<Self> {
        let mode: Mode = mode.parse()?;
        tracing::debug!(%mode, "setup installed");
        Ok(Self::default().customize(mode.factory()))
    }

    /// Validates `config` and builds the matching setup.
    pub fn from_config(config: &BinderyConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let setup = Self::from_mode(&config.mode)?;
        Ok(setup.with_openapi(config.openapi.clone()))
    }

    /// Installs a custom parser factory. Error handlers not yet set fall back
    /// to [`JsonErrorHandler`].
    #[must_use]
    pub fn customize(mut self, factory: ParserFactory) -> Self {
        self.factory = Some(factory);
        self.error_handler
            .get_or_insert_with(|| Arc::new(JsonErrorHandler));
        self.async_error_handler
            .get_or_insert_with(|| Arc::new(JsonErrorHandler));
        self
    }

    /// Error handler for blocking views.
    #[must_use]
    pub fn with_error_handler(mut self, handler: Arc<dyn ErrorHandler>) -> Self {
        self.error_handler = Some(handler);
        self
    }

    /// Error handler for cooperative views.
    #[must_use]
    pub fn with_async_error_handler(mut self, handler: Arc<dyn ErrorHandler>) -> Self {
        self.async_error_handler = Some(handler);
        self
    }

    /// OpenAPI settings.
    #[must_use]
    pub fn with_openapi(mut self, openapi: OpenApiConfig) -> Self {
        self.openapi = openapi;
        self
    }

    /// Fails with every missing piece if the setup is incomplete.
    pub fn check(&self) -> RegistrationResult<()> {
        let mut missing = Vec::new();
        if self.factory.is_none() {
            missing.push("parser_factory");
        }
        if self.error_handler.is_none() {
            missing.push("error_handler");
        }
        if self.async_error_handler.is_none() {
            missing.push("async_error_handler");
        }
        if missing.is_empty() {
            Ok(())
        } else {
            Err(RegistrationError::not_configured(missing))
        }
    }

    /// The parser factory.
    pub fn factory(&self) -> RegistrationResult<&ParserFactory> {
        self.factory
            .as_ref()
            .ok_or_else(|| RegistrationError::not_configured(vec!["parser_factory"]))
    }

    /// Error handler for blocking views.
    pub fn error_handler(&self) -> RegistrationResult<Arc<dyn ErrorHandler>> {
        self.error_handler
            .clone()
            .ok_or_else(|| RegistrationError::not_configured(vec!["error_handler"]))
    }

    /// Error handler for cooperative views.
    pub fn async_error_handler(&self) -> RegistrationResult<Arc<dyn ErrorHandler>> {
        self.async_error_handler
            .clone()
            .ok_or_else(|| RegistrationError::not_configured(vec!["async_error_handler"]))
    }

    /// OpenAPI settings.
    pub fn openapi(&self) -> &OpenApiConfig {
        &self.openapi
    }
}

impl fmt::Debug for Setup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Setup")
            .field("factory", &self.factory)
            .field("error_handler", &self.error_handler.is_some())
            .field("async_error_handler", &self.async_error_handler.is_some())
            .field("openapi", &self.openapi)
            .finish()
    }
}
