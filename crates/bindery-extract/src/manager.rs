//! Parser managers and dependency nodes.
//!
//! A [`ParserManager`] is built once per view (and once per dependency it
//! reaches) at registration. It owns the validation schema, the source
//! parsers that serve it, and one [`DependencyNode`] per dependency
//! parameter. It holds no per-request state: the request and the
//! per-request [`DependencyCache`] are passed into every parse call.
//!
//! Both parse paths follow the same order:
//!
//! 1. run every source parser and merge their raw values,
//! 2. validate the merged mapping once, tagging errors with their kind,
//! 3. resolve dependency nodes in declaration order, appending their errors.

use std::sync::Arc;

use bindery_core::{
    BuildOptions, CacheEntry, DependencyCache, DependencyError, DependencyId, Depends, FieldError,
    ParamKind, RawValues, RegistrationError, RegistrationResult, SchemaField, Signature,
    SignatureModel, ValidationSchema, Validator, Values,
};
use bindery_telemetry::metrics::{record_dependency_cache_hit, record_dependency_call};
use futures_util::future::BoxFuture;
use serde_json::Value;

use crate::error::ExtractionError;
use crate::factory::ParserFactory;
use crate::parser::SourceParser;
use crate::request::{AsyncRequestSource, RequestSource};

/// Deepest dependency nesting accepted at registration.
///
/// A dependency whose `signature()` builds fresh instances on every call has
/// no stable identity, so a cycle through it is only caught by this bound.
pub const MAX_DEPENDENCY_DEPTH: usize = 32;

/// Registration-time options for a manager.

#[derive(Debug, Clone, Default)]
pub struct ManagerOptions {
    /// Schema name; dependency naming is used when absent.
    pub model_name: Option<String>,
    /// Drop the first declared parameter.
    pub skip_receiver: bool,
}

/// Result of one parse call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Parsed {
    /// Validated values by parameter name, then dependency results by
    /// parameter name.
    pub values: Values,
    /// Top-level errors first, then dependency errors in declaration order.
    pub errors: Vec<FieldError>,
}

impl Parsed {
    /// Returns `true` if no error was recorded.
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Per-view aggregation of parsers and dependency nodes.
#[derive(Debug)]
pub struct ParserManager {
    schema: Arc<ValidationSchema>,
    parsers: Vec<Box<dyn SourceParser>>,
    validator: Arc<dyn Validator>,
    dependencies: Vec<DependencyNode>,
    passthrough: Vec<String>,
}

/// A resolved dependency: its declaring parameter, its marker, and the
/// manager for its own signature.
#[derive(Debug)]
pub struct DependencyNode {
    name: String,
    depends: Depends,
    manager: ParserManager,
}

impl ParserManager {
    /// Builds the manager for `signature`, recursing into dependencies.
    ///
    /// Fails on any builder error and on dependency cycles. A cycle is an
    /// instance reached again from itself, or nesting deeper than
    /// [`MAX_DEPENDENCY_DEPTH`].
    pub fn build(
        factory: &ParserFactory,
        signature: &Signature,
        options: &ManagerOptions,
    ) -> RegistrationResult<Self> {
        let mut stack = Vec::new();
        Self::build_inner(factory, signature, options, &mut stack)
    }

    fn build_inner(
        factory: &ParserFactory,
        signature: &Signature,
        options: &ManagerOptions,
        stack: &mut Vec<(DependencyId, String)>,
    ) -> RegistrationResult<Self> {
        let supported = |kind: ParamKind| factory.supports(kind);
        let model = SignatureModel::build(
            signature,
            &BuildOptions {
                model_name: options.model_name.clone(),
                skip_receiver: options.skip_receiver,
                supported: &supported,
            },
        )?;

        let mut dependencies = Vec::with_capacity(model.dependencies.len());
        for (name, depends) in model.dependencies {
            let dependency = depends.dependency();
            let id = depends.id();
            if let Some(start) = stack.iter().position(|(seen, _)| *seen == id) {
                let mut path: Vec<String> = stack[start..].iter().map(|(_, n)| n.clone()).collect();
                path.push(dependency.name().to_owned());
                return Err(RegistrationError::DependencyCycle { path });
            }
            if stack.len() >= MAX_DEPENDENCY_DEPTH {
                return Err(RegistrationError::DependencyCycle {
                    path: repeating_path(stack, dependency.name()),
                });
            }

            stack.push((id, dependency.name().to_owned()));
            let manager = Self::build_inner(
                factory,
                &dependency.signature(),
                &ManagerOptions::default(),
                stack,
            )?;
            stack.pop();

            dependencies.push(DependencyNode {
                name,
                depends,
                manager,
            });
        }

        let parsers = factory.parsers_for(&model.schema);
        Ok(Self {
            schema: Arc::new(model.schema),
            parsers,
            validator: Arc::clone(factory.validator()),
            dependencies,
            passthrough: model.passthrough,
        })
    }

    /// The validation schema.
    #[must_use]
    pub fn schema(&self) -> &ValidationSchema {
        &self.schema
    }

    /// The active source parsers.
    #[must_use]
    pub fn parsers(&self) -> &[Box<dyn SourceParser>] {
        &self.parsers
    }

    /// Dependency nodes in declaration order.
    #[must_use]
    pub fn dependencies(&self) -> &[DependencyNode] {
        &self.dependencies
    }

    /// Untyped parameters passed through from the framework.
    #[must_use]
    pub fn passthrough(&self) -> &[String] {
        &self.passthrough
    }

    /// Own fields, then every dependency's fields, depth first.
    #[must_use]
    pub fn all_fields(&self) -> Vec<&SchemaField> {
        let mut out: Vec<&SchemaField> = self.schema.fields().iter().collect();
        for node in &self.dependencies {
            out.extend(node.manager.all_fields());
        }
        out
    }

    /// Name of the first dependency, at any depth, that cannot run on the
    /// blocking path.
    #[must_use]
    pub fn async_only_dependency(&self) -> Option<&str> {
        self.dependencies.iter().find_map(|node| {
            let dependency = node.depends.dependency();
            if dependency.is_async_only() {
                Some(dependency.name())
            } else {
                node.manager.async_only_dependency()
            }
        })
    }

    fn validate(&self, raw: &RawValues) -> (Values, Vec<FieldError>) {
        let validation = self.validator.validate(&self.schema, raw);
        let errors = validation
            .errors
            .into_iter()
            .map(|err| match err.loc.first().and_then(|alias| self.schema.field_by_alias(alias)) {
                Some(field) => err.tagged(field.kind()),
                None => err,
            })
            .collect();
        (validation.values, errors)
    }

    fn merge(
        &self,
        raw: &mut RawValues,
        parser: &dyn SourceParser,
        result: Result<RawValues, ExtractionError>,
    ) {
        match result {
            Ok(values) => raw.extend(values),
            Err(e) => tracing::debug!(
                schema = %self.schema.name(),
                kind = %parser.kind(),
                error = %e,
                "source contributed no data"
            ),
        }
    }

    /// Parses and validates on the blocking path.
    pub fn parse(&self, request: &dyn RequestSource, cache: &mut DependencyCache) -> Parsed {
        let mut parsed = Parsed::default();

        if !self.schema.is_empty() {
            let mut raw = RawValues::new();
            for parser in &self.parsers {
                let result = parser.parse(request);
                self.merge(&mut raw, parser.as_ref(), result);
            }
            let (values, errors) = self.validate(&raw);
            parsed.values = values;
            parsed.errors = errors;
        }

        for node in &self.dependencies {
            let (value, errors) = node.resolve(request, cache);
            parsed.errors.extend(errors);
            parsed.values.insert(node.name.clone(), value);
        }
        parsed
    }

    /// Parses and validates on the cooperative path. Same contract and
    /// ordering as [`parse`](Self::parse).
    pub fn parse_async<'a>(
        &'a self,
        request: &'a dyn AsyncRequestSource,
        cache: &'a mut DependencyCache,
    ) -> BoxFuture<'a, Parsed> {
        Box::pin(async move {
            let mut parsed = Parsed::default();

            if !self.schema.is_empty() {
                let mut raw = RawValues::new();
                for parser in &self.parsers {
                    let result = parser.parse_async(request).await;
                    self.merge(&mut raw, parser.as_ref(), result);
                }
                let (values, errors) = self.validate(&raw);
                parsed.values = values;
                parsed.errors = errors;
            }

            for node in &self.dependencies {
                let (value, errors) = node.resolve_async(request, &mut *cache).await;
                parsed.errors.extend(errors);
                parsed.values.insert(node.name.clone(), value);
            }
            parsed
        })
    }
}

/// The shortest run of names that starts and ends with the same name, or the
/// whole chain when no name repeats.
fn repeating_path(stack: &[(DependencyId, String)], next: &str) -> Vec<String> {
    let names: Vec<&str> = stack.iter().map(|(_, n)| n.as_str()).chain([next]).collect();
    for end in 1..names.len() {
        if let Some(start) = names[..end].iter().position(|n| *n == names[end]) {
            return names[start..=end].iter().map(|n| (*n).to_owned()).collect();
        }
    }
    names.into_iter().map(str::to_owned).collect()
}

impl DependencyNode {
    /// Declaring parameter name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The dependency marker.
    #[must_use]
    pub fn depends(&self) -> &Depends {
        &self.depends
    }

    /// Manager for the dependency's own signature.
    #[must_use]
    pub fn manager(&self) -> &ParserManager {
        &self.manager
    }

    /// A cached failure yields `null` and no errors, since the resolution
    /// that failed already reported them.
    fn cached(&self, cache: &DependencyCache) -> Option<Value> {
        if !self.depends.is_cached() {
            return None;
        }
        let hit = match cache.get(&self.depends.id())? {
            CacheEntry::Resolved(value) => value.clone(),
            CacheEntry::Failed => Value::Null,
        };
        record_dependency_cache_hit(self.depends.dependency().name());
        Some(hit)
    }

    fn failed(
        &self,
        errors: Vec<FieldError>,
        cache: &mut DependencyCache,
    ) -> (Value, Vec<FieldError>) {
        if self.depends.is_cached() {
            cache.insert_failure(self.depends.id());
        }
        (Value::Null, errors)
    }

    fn finish(
        &self,
        result: Result<Value, DependencyError>,
        cache: &mut DependencyCache,
    ) -> (Value, Vec<FieldError>) {
        match result {
            Ok(value) => {
                if self.depends.is_cached() {
                    cache.insert(self.depends.id(), value.clone());
                }
                (value, Vec::new())
            }
            Err(e) => {
                tracing::debug!(dependency = %self.name, error = %e, "dependency failed");
                self.failed(vec![FieldError::dependency(&self.name, e.message())], cache)
            }
        }
    }

    /// Resolves on the blocking path.
    ///
    /// A cache hit returns immediately with no errors. If the dependency's
    /// own arguments fail validation it is not invoked, and its slot is
    /// `null`. Cache-eligible failures are remembered for the rest of the
    /// request.
    pub fn resolve(
        &self,
        request: &dyn RequestSource,
        cache: &mut DependencyCache,
    ) -> (Value, Vec<FieldError>) {
        if let Some(value) = self.cached(cache) {
            return (value, Vec::new());
        }
        let parsed = self.manager.parse(request, cache);
        if !parsed.is_ok() {
            return self.failed(parsed.errors, cache);
        }
        let dependency = self.depends.dependency();
        record_dependency_call(dependency.name());
        let result = dependency.call(&parsed.values);
        self.finish(result, cache)
    }

    /// Resolves on the cooperative path.
    pub fn resolve_async<'a>(
        &'a self,
        request: &'a dyn AsyncRequestSource,
        cache: &'a mut DependencyCache,
    ) -> BoxFuture<'a, (Value, Vec<FieldError>)> {
        Box::pin(async move {
            if let Some(value) = self.cached(cache) {
                return (value, Vec::new());
            }
            let parsed = self.manager.parse_async(request, &mut *cache).await;
            if !parsed.is_ok() {
                return self.failed(parsed.errors, cache);
            }
            let dependency = self.depends.dependency();
            record_dependency_call(dependency.name());
            let result = dependency.call_async(&parsed.values).await;
            self.finish(result, cache)
        })
    }
}
