//! Parser factory: the registry from descriptor kind to source parser.
//!
//! A descriptor kind is supported exactly when the active factory has a
//! parser registered for it. The factory also carries the validator every
//! manager it builds will use.

use std::fmt;
use std::sync::Arc;

use bindery_core::{
    ParamKind, RegistrationResult, SchemaValidator, Signature, ValidationSchema, Validator,
};
use indexmap::IndexMap;

use crate::manager::{ManagerOptions, ParserManager};
use crate::parser::{
    CookieParser, FormParser, HeaderParser, JsonBodyParser, PathParser, QueryParser, SourceParser,
};

/// Builds a parser for the fields of a schema.
pub type ParserConstructor =
    Arc<dyn Fn(&ValidationSchema) -> Box<dyn SourceParser> + Send + Sync>;

/// Registry of source parsers plus the validator.
///
/// # Example
///
/// ```rust
/// use bindery_extract::ParserFactory;
/// use bindery_core::ParamKind;
///
/// let factory = ParserFactory::query_only();
/// assert!(factory.supports(ParamKind::Query));
/// assert!(!factory.supports(ParamKind::Body));
/// ```
#[derive(Clone)]
pub struct ParserFactory {
    parsers: IndexMap<ParamKind, ParserConstructor>,
    validator: Arc<dyn Validator>,
}

impl ParserFactory {
    /// Creates a factory with no parsers and the built-in validator.
    #[must_use]
    pub fn new() -> Self {
        Self {
            parsers: IndexMap::new(),
            validator: Arc::new(SchemaValidator),
        }
    }

    /// Factory with parsers for every kind: query, header, path, cookie,
    /// form and JSON body.
    #[must_use]
    pub fn http() -> Self {
        Self::new()
            .register(ParamKind::Query, |s| Box::new(QueryParser::from_schema(s)))
            .register(ParamKind::Header, |s| Box::new(HeaderParser::from_schema(s)))
            .register(ParamKind::Path, |s| Box::new(PathParser::from_schema(s)))
            .register(ParamKind::Cookie, |s| Box::new(CookieParser::from_schema(s)))
            .register(ParamKind::Form, |s| Box::new(FormParser::from_schema(s)))
            .register(ParamKind::Body, |s| Box::new(JsonBodyParser::from_schema(s)))
    }

    /// Factory with the query parser only.
    #[must_use]
    pub fn query_only() -> Self {
        Self::new().register(ParamKind::Query, |s| Box::new(QueryParser::from_schema(s)))
    }

    /// Registers (or replaces) the parser for `kind`.
    #[must_use]
    pub fn register<F>(mut self, kind: ParamKind, constructor: F) -> Self
    where
        F: Fn(&ValidationSchema) -> Box<dyn SourceParser> + Send + Sync + 'static,
    {
        self.parsers.insert(kind, Arc::new(constructor));
        self
    }

    /// Replaces the validator.
    #[must_use]
    pub fn with_validator(mut self, validator: impl Validator + 'static) -> Self {
        self.validator = Arc::new(validator);
        self
    }

    /// Returns `true` if a parser is registered for `kind`.
    #[must_use]
    pub fn supports(&self, kind: ParamKind) -> bool {
        self.parsers.contains_key(&kind)
    }

    /// Registered kinds in registration order.
    pub fn kinds(&self) -> impl Iterator<Item = ParamKind> + '_ {
        self.parsers.keys().copied()
    }

    /// The validator.
    #[must_use]
    pub fn validator(&self) -> &Arc<dyn Validator> {
        &self.validator
    }

    /// Builds the non-inert parsers for `schema`.
    #[must_use]
    pub fn parsers_for(&self, schema: &ValidationSchema) -> Vec<Box<dyn SourceParser>> {
        self.parsers
            .values()
            .map(|constructor| constructor(schema))
            .filter(|parser| !parser.is_inert())
            .collect()
    }

    /// Builds the parser manager for a view or dependency signature.
    pub fn manager(
        &self,
        signature: &Signature,
        options: &ManagerOptions,
    ) -> RegistrationResult<ParserManager> {
        ParserManager::build(self, signature, options)
    }
}

impl Default for ParserFactory {
    fn default() -> Self {
        Self::http()
    }
}

impl fmt::Debug for ParserFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParserFactory")
            .field("kinds", &self.parsers.keys().collect::<Vec<_>>())
            .field("validator", &self.validator)
            .finish()
    }
}
