//! Signature Model Builder.
//!
//! A [`Signature`] is the explicit parameter list of a view or dependency.
//! [`SignatureModel::build`] splits it into a [`ValidationSchema`] of value
//! fields and an ordered mapping of dependency parameters. Building happens
//! once, at registration; errors are fatal [`RegistrationError`]s.

use std::collections::HashSet;
use std::fmt;

use indexmap::IndexMap;
use regex::Regex;

use crate::di::Depends;
use crate::error::{RegistrationError, RegistrationResult};
use crate::params::{Descriptor, FieldType, Param, ParamKind};

/// One declared parameter.
#[derive(Debug, Clone)]
pub struct ParamDecl {
    /// Parameter name, as the handler sees it.
    pub name: String,
    /// Declared type. `None` means untyped: skipped by the builder.
    pub ty: Option<FieldType>,
    /// Default descriptor.
    pub default: Option<Descriptor>,
}

/// Ordered parameter list of a callable.
#[derive(Debug, Clone)]
pub struct Signature {
    name: String,
    params: Vec<ParamDecl>,
}

impl Signature {
    /// Starts an empty signature for the callable `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: Vec::new(),
        }
    }

    /// Adds a typed value parameter.
    pub fn param(self, name: impl Into<String>, ty: FieldType, descriptor: Param) -> Self {
        self.push(ParamDecl {
            name: name.into(),
            ty: Some(ty),
            default: Some(Descriptor::Param(descriptor)),
        })
    }

    /// Adds a dependency parameter.
    pub fn depends(self, name: impl Into<String>, depends: Depends) -> Self {
        self.push(ParamDecl {
            name: name.into(),
            ty: Some(FieldType::Any),
            default: Some(Descriptor::Depends(depends)),
        })
    }

    /// Adds an untyped parameter, passed through from the framework.
    pub fn untyped(self, name: impl Into<String>) -> Self {
        self.push(ParamDecl {
            name: name.into(),
            ty: None,
            default: None,
        })
    }

    /// Adds a raw declaration.
    pub fn push(mut self, decl: ParamDecl) -> Self {
        self.params.push(decl);
        self
    }

    /// Callable name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared parameters in order.
    pub fn params(&self) -> &[ParamDecl] {
        &self.params
    }
}

/// A value field of a [`ValidationSchema`].
#[derive(Debug, Clone)]
pub struct SchemaField {
    name: String,
    alias: String,
    ty: FieldType,
    param: Param,
    pattern: Option<Regex>,
}

impl SchemaField {
    /// Parameter name; key of the validated output.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Lookup name in the request; key of raw input and error locations.
    pub fn alias(&self) -> &str {
        &self.alias
    }

    /// Declared type.
    pub fn ty(&self) -> &FieldType {
        &self.ty
    }

    /// Descriptor.
    pub fn param(&self) -> &Param {
        &self.param
    }

    /// Provenance kind.
    pub fn kind(&self) -> ParamKind {
        self.param.kind()
    }

    /// Whether absence is an error.
    pub fn is_required(&self) -> bool {
        self.param.is_required()
    }

    /// Compiled `pattern` constraint.
    pub fn pattern(&self) -> Option<&Regex> {
        self.pattern.as_ref()
    }

    /// Short human-readable rendering of the type and constraints, e.g.
    /// `("integer", ["required", "100 <= x"])`.
    pub fn summary(&self) -> (String, Vec<String>) {
        let display = match &self.ty {
            FieldType::Array(item) => format!("array[{}]", item.type_name()),
            FieldType::Set(item) => format!("set[{}]", item.type_name()),
            other => other.type_name().to_owned(),
        };

        let mut notes = Vec::new();
        match self.param.default_value() {
            None => notes.push("required".to_owned()),
            Some(serde_json::Value::String(s)) => notes.push(format!("default '{s}'")),
            Some(v) => notes.push(format!("default {v}")),
        }

        let c = self.param.constraints();
        let lower = c.gt.map(|v| format!("{v} <")).or_else(|| c.ge.map(|v| format!("{v} <=")));
        let upper = c.lt.map(|v| format!("< {v}")).or_else(|| c.le.map(|v| format!("<= {v}")));
        match (lower, upper) {
            (Some(l), Some(u)) => notes.push(format!("{l} x {u}")),
            (Some(l), None) => notes.push(format!("{l} x")),
            (None, Some(u)) => notes.push(format!("x {u}")),
            (None, None) => {}
        }

        match (c.min_length, c.max_length) {
            (Some(min), Some(max)) if min == max => notes.push(format!("length {min}")),
            (Some(min), Some(max)) => notes.push(format!("{min} <= length <= {max}")),
            (Some(min), None) => notes.push(format!("length >= {min}")),
            (None, Some(max)) => notes.push(format!("length <= {max}")),
            (None, None) => {}
        }

        if let Some(p) = &c.pattern {
            notes.push(format!("regex: {p}"));
        }
        if !c.one_of.is_empty() {
            let values: Vec<String> = c.one_of.iter().map(ToString::to_string).collect();
            notes.push(format!("one of {}", values.join(", ")));
        }

        (display, notes)
    }
}

/// Named, ordered set of value fields for one callable.
#[derive(Debug, Clone)]
pub struct ValidationSchema {
    name: String,
    fields: Vec<SchemaField>,
}

impl ValidationSchema {
    /// Schema name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// All fields in declaration order.
    pub fn fields(&self) -> &[SchemaField] {
        &self.fields
    }

    /// Fields served by one provenance kind.
    pub fn fields_of(&self, kind: ParamKind) -> impl Iterator<Item = &SchemaField> {
        self.fields.iter().filter(move |f| f.kind() == kind)
    }

    /// Field looked up by alias.
    pub fn field_by_alias(&self, alias: &str) -> Option<&SchemaField> {
        self.fields.iter().find(|f| f.alias == alias)
    }

    /// Returns `true` if the schema has no value fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Name for a view schema: `RequestValidateModel<for /items, methods=GET>`.
    ///
    /// A single method is printed bare; several are printed as a sorted list.
    pub fn view_name(path: Option<&str>, methods: &[String]) -> String {
        let mut name = format!("RequestValidateModel<for {}", path.unwrap_or("None"));
        match methods {
            [] => {}
            [one] => name.push_str(&format!(", methods={one}")),
            many => {
                let mut sorted: Vec<&str> = many.iter().map(String::as_str).collect();
                sorted.sort_unstable();
                let quoted: Vec<String> = sorted.iter().map(|m| format!("'{m}'")).collect();
                name.push_str(&format!(", methods=[{}]", quoted.join(", ")));
            }
        }
        name.push('>');
        name
    }

    /// Name for a dependency schema: `RequestValidateModel<for: 'name'>`.
    pub fn dependency_name(callable: &str) -> String {
        format!("RequestValidateModel<for: '{callable}'>")
    }
}

/// Options for [`SignatureModel::build`].
pub struct BuildOptions<'a> {
    /// Schema name. Defaults to [`ValidationSchema::dependency_name`].
    pub model_name: Option<String>,
    /// Drop the first declared parameter (a method receiver).
    pub skip_receiver: bool,
    /// Kinds with an installed parser; any other kind is unsupported.
    pub supported: &'a dyn Fn(ParamKind) -> bool,
}

impl fmt::Debug for BuildOptions<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BuildOptions")
            .field("model_name", &self.model_name)
            .field("skip_receiver", &self.skip_receiver)
            .finish_non_exhaustive()
    }
}

/// Output of the Signature Model Builder.
#[derive(Debug, Clone)]
pub struct SignatureModel {
    /// Value fields.
    pub schema: ValidationSchema,
    /// Dependency parameters in declaration order.
    pub dependencies: IndexMap<String, Depends>,
    /// Untyped parameters, passed through unmodified.
    pub passthrough: Vec<String>,
}

impl SignatureModel {
    /// Builds the schema and dependency mapping for `signature`.
    pub fn build(signature: &Signature, options: &BuildOptions<'_>) -> RegistrationResult<Self> {
        let callable = signature.name();
        let params = if options.skip_receiver {
            signature.params().get(1..).unwrap_or_default()
        } else {
            signature.params()
        };

        let mut fields = Vec::new();
        let mut dependencies = IndexMap::new();
        let mut passthrough = Vec::new();
        let mut aliases = HashSet::new();

        for decl in params {
            let Some(ty) = &decl.ty else {
                passthrough.push(decl.name.clone());
                continue;
            };
            let Some(default) = &decl.default else {
                return Err(RegistrationError::missing_default(callable, &decl.name));
            };

            let param = match default {
                Descriptor::Depends(depends) => {
                    dependencies.insert(decl.name.clone(), depends.clone());
                    continue;
                }
                Descriptor::Param(param) => param,
            };

            if !(options.supported)(param.kind()) {
                return Err(RegistrationError::UnsupportedDescriptor {
                    callable: callable.to_owned(),
                    param: decl.name.clone(),
                    kind: param.kind(),
                });
            }

            let alias = match param.alias_name() {
                Some(alias) => alias.to_owned(),
                None if param.kind() == ParamKind::Header => decl.name.replace('_', "-"),
                None => decl.name.clone(),
            };
            if !aliases.insert(alias.clone()) {
                return Err(RegistrationError::DuplicateAlias {
                    callable: callable.to_owned(),
                    alias,
                });
            }

            let pattern = match &param.constraints().pattern {
                Some(p) => Some(Regex::new(p).map_err(|source| {
                    RegistrationError::InvalidPattern {
                        field: decl.name.clone(),
                        pattern: p.clone(),
                        source,
                    }
                })?),
                None => None,
            };

            fields.push(SchemaField {
                name: decl.name.clone(),
                alias,
                ty: ty.clone(),
                param: param.clone(),
                pattern,
            });
        }

        let name = options
            .model_name
            .clone()
            .unwrap_or_else(|| ValidationSchema::dependency_name(callable));
        tracing::debug!(
            schema = %name,
            fields = fields.len(),
            dependencies = dependencies.len(),
            "built validation schema"
        );

        Ok(Self {
            schema: ValidationSchema { name, fields },
            dependencies,
            passthrough,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::di::dependency_fn;
    use crate::params::{Body, Form, Header, Query};
    use serde_json::json;

    fn all(_: ParamKind) -> bool {
        true
    }

    fn options() -> BuildOptions<'static> {
        BuildOptions {
            model_name: None,
            skip_receiver: false,
            supported: &all,
        }
    }

    #[test]
    fn test_splits_values_and_dependencies() {
        let dep = dependency_fn("settings", Signature::new("settings"), |_| Ok(json!({})));
        let sig = Signature::new("list_items")
            .param("q", FieldType::String, Query::required())
            .untyped("request")
            .depends("settings", Depends::new(dep))
            .param("limit", FieldType::Integer, Query::default_value(10));

        let model = SignatureModel::build(&sig, &options()).unwrap();
        let names: Vec<_> = model.schema.fields().iter().map(SchemaField::name).collect();
        assert_eq!(names, ["q", "limit"]);
        assert_eq!(model.dependencies.keys().collect::<Vec<_>>(), ["settings"]);
        assert_eq!(model.passthrough, ["request"]);
        assert_eq!(model.schema.name(), "RequestValidateModel<for: 'list_items'>");
    }

    #[test]
    fn test_missing_default() {
        let sig = Signature::new("f").push(ParamDecl {
            name: "a".into(),
            ty: Some(FieldType::Integer),
            default: None,
        });
        let err = SignatureModel::build(&sig, &options()).unwrap_err();
        assert!(matches!(err, RegistrationError::MissingDefault { ref param, .. } if param == "a"));
    }

    #[test]
    fn test_untyped_with_descriptor_is_skipped() {
        let sig = Signature::new("f").push(ParamDecl {
            name: "a".into(),
            ty: None,
            default: Some(Query::required().into()),
        });
        let model = SignatureModel::build(&sig, &options()).unwrap();
        assert!(model.schema.is_empty());
        assert_eq!(model.passthrough, ["a"]);
    }

    #[test]
    fn test_unsupported_descriptor() {
        let only_query = |kind: ParamKind| kind == ParamKind::Query;
        let sig = Signature::new("f").param("a", FieldType::String, Form::required());
        let opts = BuildOptions {
            model_name: None,
            skip_receiver: false,
            supported: &only_query,
        };
        let err = SignatureModel::build(&sig, &opts).unwrap_err();
        assert!(matches!(
            err,
            RegistrationError::UnsupportedDescriptor { kind: ParamKind::Form, .. }
        ));
    }

    #[test]
    fn test_duplicate_alias_across_kinds() {
        let sig = Signature::new("f")
            .param("a", FieldType::String, Query::required())
            .param("b", FieldType::String, Body::required().alias("a"));
        let err = SignatureModel::build(&sig, &options()).unwrap_err();
        assert!(matches!(err, RegistrationError::DuplicateAlias { ref alias, .. } if alias == "a"));
    }

    #[test]
    fn test_header_alias_defaults_to_hyphenated_name() {
        let sig = Signature::new("f").param("user_agent", FieldType::String, Header::required());
        let model = SignatureModel::build(&sig, &options()).unwrap();
        assert_eq!(model.schema.fields()[0].alias(), "user-agent");
        assert_eq!(model.schema.fields()[0].name(), "user_agent");
    }

    #[test]
    fn test_invalid_pattern() {
        let sig = Signature::new("f").param("a", FieldType::String, Query::required().pattern("("));
        let err = SignatureModel::build(&sig, &options()).unwrap_err();
        assert!(matches!(err, RegistrationError::InvalidPattern { .. }));
    }

    #[test]
    fn test_skip_receiver() {
        let sig = Signature::new("method")
            .untyped("self")
            .param("a", FieldType::String, Query::required());
        let opts = BuildOptions {
            model_name: Some("custom".into()),
            skip_receiver: true,
            supported: &all,
        };
        let model = SignatureModel::build(&sig, &opts).unwrap();
        assert!(model.passthrough.is_empty());
        assert_eq!(model.schema.fields().len(), 1);
        assert_eq!(model.schema.name(), "custom");
    }

    #[test]
    fn test_view_names() {
        assert_eq!(
            ValidationSchema::view_name(Some("/items"), &["GET".into()]),
            "RequestValidateModel<for /items, methods=GET>"
        );
        assert_eq!(
            ValidationSchema::view_name(Some("/items"), &["POST".into(), "GET".into()]),
            "RequestValidateModel<for /items, methods=['GET', 'POST']>"
        );
        assert_eq!(ValidationSchema::view_name(None, &[]), "RequestValidateModel<for None>");
    }

    #[test]
    fn test_field_summary() {
        let sig = Signature::new("f")
            .param("a", FieldType::Integer, Query::required().ge(100.0))
            .param("b", FieldType::String, Query::default_value("x").min_length(1).max_length(1))
            .param("c", FieldType::array(FieldType::String), Query::default_value(json!([])));
        let model = SignatureModel::build(&sig, &options()).unwrap();
        let fields = model.schema.fields();

        assert_eq!(fields[0].summary(), ("integer".into(), vec!["required".into(), "100 <= x".into()]));
        assert_eq!(fields[1].summary(), ("string".into(), vec!["default 'x'".into(), "length 1".into()]));
        assert_eq!(fields[2].summary().0, "array[string]");
    }
}
