//! View options and the resolved per-view metadata.

use bindery_core::{RegistrationResult, Signature, ValidationSchema};
use bindery_extract::{ManagerOptions, ParserFactory, ParserManager};

/// Registration options for one view.
///
/// ```rust
/// use bindery_router::ViewOptions;
///
/// let options = ViewOptions::new()
///     .path("/items")
///     .methods(["get", "POST", "GET"])
///     .tags(["items"]);
/// assert_eq!(options.methods_list(), ["GET", "POST"]);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewOptions {
    path: Option<String>,
    methods: Vec<String>,
    tags: Vec<String>,
    summary: Option<String>,
    description: Option<String>,
    deprecated: bool,
    exclude_from_schema: bool,
    name: Option<String>,
    is_method: bool,
}

impl ViewOptions {
    /// Options with no path and no methods.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Route path template.
    #[must_use]
    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Adds one HTTP method.
    #[must_use]
    pub fn method(mut self, method: impl AsRef<str>) -> Self {
        let method = method.as_ref().to_ascii_uppercase();
        if let Err(pos) = self.methods.binary_search(&method) {
            self.methods.insert(pos, method);
        }
        self
    }

    /// Adds HTTP methods. Methods are upper-cased, de-duplicated and kept
    /// sorted.
    #[must_use]
    pub fn methods<I, S>(self, methods: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        methods.into_iter().fold(self, Self::method)
    }

    /// OpenAPI tags.
    #[must_use]
    pub fn tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags.extend(tags.into_iter().map(Into::into));
        self
    }

    /// Operation summary.
    #[must_use]
    pub fn summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }

    /// Operation description.
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Marks the operation deprecated.
    #[must_use]
    pub fn deprecated(mut self) -> Self {
        self.deprecated = true;
        self
    }

    /// Includes or hides the view in the OpenAPI document. Views without a
    /// path are always hidden.
    #[must_use]
    pub fn include_in_schema(mut self, include: bool) -> Self {
        self.exclude_from_schema = !include;
        self
    }

    /// View name; defaults to the signature name.
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// The handler takes a receiver as its first declared parameter.
    #[must_use]
    pub fn is_method(mut self, is_method: bool) -> Self {
        self.is_method = is_method;
        self
    }

    /// The normalized method list.
    #[must_use]
    pub fn methods_list(&self) -> &[String] {
        &self.methods
    }
}

/// Everything a view knows besides its handler: resolved options and the
/// parser manager built for its signature.
#[derive(Debug)]
pub struct ViewMeta {
    name: String,
    path: Option<String>,
    methods: Vec<String>,
    tags: Vec<String>,
    summary: Option<String>,
    description: Option<String>,
    deprecated: bool,
    include_in_schema: bool,
    is_method: bool,
    manager: ParserManager,
}

impl ViewMeta {
    /// Resolves `options` and builds the parser manager for `signature`.
    pub fn build(
        options: ViewOptions,
        signature: &Signature,
        factory: &ParserFactory,
    ) -> RegistrationResult<Self> {
        let model_name = ValidationSchema::view_name(options.path.as_deref(), &options.methods);
        let manager = factory.manager(
            signature,
            &ManagerOptions {
                model_name: Some(model_name),
                skip_receiver: options.is_method,
            },
        )?;

        let include_in_schema = options.path.is_some() && !options.exclude_from_schema;
        Ok(Self {
            name: options.name.unwrap_or_else(|| signature.name().to_owned()),
            path: options.path,
            methods: options.methods,
            tags: options.tags,
            summary: options.summary,
            description: options.description,
            deprecated: options.deprecated,
            include_in_schema,
            is_method: options.is_method,
            manager,
        })
    }

    /// View name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Route path, if any.
    #[must_use]
    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    /// Upper-case methods, sorted.
    #[must_use]
    pub fn methods(&self) -> &[String] {
        &self.methods
    }

    /// OpenAPI tags.
    #[must_use]
    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    /// Explicit summary.
    #[must_use]
    pub fn summary(&self) -> Option<&str> {
        self.summary.as_deref()
    }

    /// Explicit description.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Whether the operation is deprecated.
    #[must_use]
    pub fn is_deprecated(&self) -> bool {
        self.deprecated
    }

    /// Whether the view appears in the OpenAPI document.
    #[must_use]
    pub fn include_in_schema(&self) -> bool {
        self.include_in_schema
    }

    /// Whether the first declared parameter was skipped as a receiver.
    #[must_use]
    pub fn is_method(&self) -> bool {
        self.is_method
    }

    /// The parser manager.
    #[must_use]
    pub fn manager(&self) -> &ParserManager {
        &self.manager
    }

    /// The view's validation schema.
    #[must_use]
    pub fn schema(&self) -> &ValidationSchema {
        self.manager.schema()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bindery_core::{FieldType, Query};

    fn signature() -> Signature {
        Signature::new("list_items").param("q", FieldType::String, Query::required())
    }

    #[test]
    fn test_schema_named_after_route() {
        let meta = ViewMeta::build(
            ViewOptions::new().path("/items").method("get"),
            &signature(),
            &ParserFactory::http(),
        )
        .unwrap();
        assert_eq!(meta.name(), "list_items");
        assert_eq!(meta.schema().name(), "RequestValidateModel<for /items, methods=GET>");
        assert!(meta.include_in_schema());
    }

    #[test]
    fn test_no_path_is_hidden() {
        let meta = ViewMeta::build(
            ViewOptions::new().include_in_schema(true).name("helper"),
            &signature(),
            &ParserFactory::http(),
        )
        .unwrap();
        assert!(!meta.include_in_schema());
        assert_eq!(meta.path(), None);
        assert_eq!(meta.name(), "helper");
    }

    #[test]
    fn test_receiver_skipped() {
        let sig = Signature::new("get")
            .param("self", FieldType::Any, Query::required())
            .param("q", FieldType::String, Query::required());
        let meta = ViewMeta::build(
            ViewOptions::new().path("/x").is_method(true),
            &sig,
            &ParserFactory::http(),
        )
        .unwrap();
        assert!(meta.is_method());
        assert_eq!(meta.schema().fields().len(), 1);
    }

    #[test]
    fn test_options_builder() {
        let options = ViewOptions::new()
            .methods(["post", "get"])
            .tags(["a", "b"])
            .summary("List")
            .description("All of them")
            .deprecated()
            .include_in_schema(false);
        assert_eq!(options.methods_list(), ["GET", "POST"]);
        assert!(options.deprecated);
        assert!(options.exclude_from_schema);
    }
}
