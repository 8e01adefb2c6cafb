//! Error types for Bindery.
//!
//! Two families of errors exist:
//!
//! | Type | When | Recoverable |
//! |---|---|---|
//! | [`RegistrationError`] | building views, schemas, dependency graphs | no, aborts registration |
//! | [`FieldError`] / [`BindError`] | binding one request | yes, becomes an error response |
//!
//! Registration errors never surface per request, and binding errors never
//! escape the view that produced them.

use std::fmt;

use http::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::params::ParamKind;

/// Result type alias using [`RegistrationError`].
pub type RegistrationResult<T> = Result<T, RegistrationError>;

/// Fatal configuration errors raised while registering a view.
#[derive(Error, Debug)]
pub enum RegistrationError {
    /// A typed parameter was declared without a descriptor default.
    #[error("{callable} arg `{param}` has no default descriptor")]
    MissingDefault {
        /// View or dependency name.
        callable: String,
        /// Parameter name.
        param: String,
    },

    /// No parser is installed for the descriptor's kind.
    #[error("{callable} arg `{param}` uses unsupported descriptor kind `{kind}`")]
    UnsupportedDescriptor {
        /// View or dependency name.
        callable: String,
        /// Parameter name.
        param: String,
        /// Descriptor kind with no parser.
        kind: ParamKind,
    },

    /// Two fields share one alias.
    #[error("{callable} declares alias `{alias}` more than once")]
    DuplicateAlias {
        /// View or dependency name.
        callable: String,
        /// Colliding alias.
        alias: String,
    },

    /// A `pattern` constraint failed to compile.
    #[error("invalid pattern `{pattern}` on field `{field}`: {source}")]
    InvalidPattern {
        /// Parameter name.
        field: String,
        /// The pattern as declared.
        pattern: String,
        /// Compile error.
        #[source]
        source: regex::Error,
    },

    /// The dependency graph contains a cycle.
    #[error("dependency cycle: {}", .path.join(" -> "))]
    DependencyCycle {
        /// Dependency names from the first repeated node back to itself.
        path: Vec<String>,
    },

    /// A blocking view reached a dependency that can only run asynchronously.
    #[error("view `{view}` is blocking but dependency `{dependency}` is async-only")]
    AsyncDependency {
        /// View name.
        view: String,
        /// Dependency name.
        dependency: String,
    },

    /// Another view is already registered for this path and method.
    #[error("route {method} {path} is already registered")]
    DuplicateRoute {
        /// HTTP method.
        method: String,
        /// Route path.
        path: String,
    },

    /// The requested setup mode is unknown.
    #[error("unsupported mode `{mode}`, expected one of: {}", .supported.join(", "))]
    UnsupportedMode {
        /// Requested mode.
        mode: String,
        /// Known modes.
        supported: Vec<&'static str>,
    },

    /// Views were declared before the required setup was installed.
    #[error("setup missing: {}, call setup first", .missing.join(", "))]
    NotConfigured {
        /// Names of the missing pieces.
        missing: Vec<&'static str>,
    },
}

impl RegistrationError {
    /// Creates a missing-default error.
    #[must_use]
    pub fn missing_default(callable: impl Into<String>, param: impl Into<String>) -> Self {
        Self::MissingDefault {
            callable: callable.into(),
            param: param.into(),
        }
    }

    /// Creates a duplicate-route error.
    #[must_use]
    pub fn duplicate_route(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self::DuplicateRoute {
            method: method.into(),
            path: path.into(),
        }
    }

    /// Creates a not-configured error.
    #[must_use]
    pub fn not_configured(missing: Vec<&'static str>) -> Self {
        Self::NotConfigured { missing }
    }
}

/// Location prefix for dependency invocation failures.
pub const DEPENDENCY_LOCATION: &str = "dependency";

/// A single field-level failure.
///
/// Serializes as `{"loc": [...], "msg": ..., "type": ..., "ctx": ...}`.
/// `loc[0]` names the provenance kind once the error has been tagged by the
/// parser manager; the remaining elements name the field (and item index for
/// sequence elements).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldError {
    /// Location path.
    pub loc: Vec<String>,
    /// Human readable message.
    pub msg: String,
    /// Machine readable error type, e.g. `value_error.missing`.
    #[serde(rename = "type")]
    pub error_type: String,
    /// Constraint context, e.g. `{"limit_value": 100}`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ctx: Option<Value>,
}

impl FieldError {
    /// Creates an error located at `field`.
    #[must_use]
    pub fn new(
        field: impl Into<String>,
        msg: impl Into<String>,
        error_type: impl Into<String>,
    ) -> Self {
        Self {
            loc: vec![field.into()],
            msg: msg.into(),
            error_type: error_type.into(),
            ctx: None,
        }
    }

    /// `value_error.missing` for an absent required field.
    #[must_use]
    pub fn missing(field: impl Into<String>) -> Self {
        Self::new(field, "field required", "value_error.missing")
    }

    /// A failed dependency invocation.
    #[must_use]
    pub fn dependency(name: impl Into<String>, msg: impl Into<String>) -> Self {
        Self {
            loc: vec![DEPENDENCY_LOCATION.to_owned(), name.into()],
            msg: msg.into(),
            error_type: "dependency_error".to_owned(),
            ctx: None,
        }
    }

    /// Attaches constraint context.
    #[must_use]
    pub fn with_ctx(mut self, ctx: Value) -> Self {
        self.ctx = Some(ctx);
        self
    }

    /// Prefixes the location with the provenance kind.
    #[must_use]
    pub fn tagged(mut self, kind: ParamKind) -> Self {
        self.loc.insert(0, kind.as_str().to_owned());
        self
    }

    /// The provenance part of the location, if tagged.
    pub fn source(&self) -> Option<&str> {
        (self.loc.len() > 1).then(|| self.loc[0].as_str())
    }

    /// The field part of the location.
    pub fn field(&self) -> &str {
        match self.loc.as_slice() {
            [] => "",
            [only] => only,
            [_, field, ..] => field,
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} ({})", self.loc.join("."), self.msg, self.error_type)
    }
}

/// Aggregated binding failure for one request.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("request binding failed with {} error(s)", .errors.len())]
pub struct BindError {
    errors: Vec<FieldError>,
}

impl BindError {
    /// Wraps a non-empty error list.
    #[must_use]
    pub fn new(errors: Vec<FieldError>) -> Self {
        Self { errors }
    }

    /// The field errors in aggregation order.
    pub fn errors(&self) -> &[FieldError] {
        &self.errors
    }

    /// Consumes the wrapper.
    pub fn into_errors(self) -> Vec<FieldError> {
        self.errors
    }

    /// HTTP status used by the default error handler.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        StatusCode::UNPROCESSABLE_ENTITY
    }

    /// JSON body used by the default error handler: the bare error list.
    #[must_use]
    pub fn to_json(&self) -> Value {
        serde_json::to_value(&self.errors).unwrap_or(Value::Array(Vec::new()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_field_error_serialization() {
        let err = FieldError::new("a", "ensure this value is greater than or equal to 100", "value_error.number.not_ge")
            .with_ctx(json!({"limit_value": 100}))
            .tagged(ParamKind::Query);

        assert_eq!(
            serde_json::to_value(&err).unwrap(),
            json!({
                "loc": ["query", "a"],
                "msg": "ensure this value is greater than or equal to 100",
                "type": "value_error.number.not_ge",
                "ctx": {"limit_value": 100}
            })
        );
        assert_eq!(err.source(), Some("query"));
        assert_eq!(err.field(), "a");
    }

    #[test]
    fn test_missing_omits_ctx() {
        let value = serde_json::to_value(FieldError::missing("q")).unwrap();
        assert_eq!(value, json!({"loc": ["q"], "msg": "field required", "type": "value_error.missing"}));
    }

    #[test]
    fn test_dependency_error_location() {
        let err = FieldError::dependency("current_user", "token expired");
        assert_eq!(err.source(), Some("dependency"));
        assert_eq!(err.field(), "current_user");
        assert_eq!(err.to_string(), "dependency.current_user: token expired (dependency_error)");
    }

    #[test]
    fn test_bind_error() {
        let err = BindError::new(vec![FieldError::missing("q").tagged(ParamKind::Query)]);
        assert_eq!(err.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(err.to_json()[0]["loc"], json!(["query", "q"]));
        assert_eq!(err.to_string(), "request binding failed with 1 error(s)");
    }

    #[test]
    fn test_registration_error_messages() {
        let err = RegistrationError::DependencyCycle {
            path: vec!["a".into(), "b".into(), "a".into()],
        };
        assert_eq!(err.to_string(), "dependency cycle: a -> b -> a");

        let err = RegistrationError::duplicate_route("GET", "/items");
        assert_eq!(err.to_string(), "route GET /items is already registered");

        let err = RegistrationError::not_configured(vec!["parser factory"]);
        assert!(err.to_string().contains("call setup first"));
    }
}
