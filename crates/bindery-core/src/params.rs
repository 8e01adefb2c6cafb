//! Parameter descriptors.
//!
//! A descriptor is the default value attached to a handler parameter. It says
//! which section of the request the value comes from ([`ParamKind`]) and which
//! constraints the value must satisfy once coerced.
//!
//! ```
//! use bindery_core::params::{Query, Header, ParamKind};
//!
//! let limit = Query::default_value(10).ge(1.0).le(100.0);
//! assert_eq!(limit.kind(), ParamKind::Query);
//! assert!(!limit.is_required());
//!
//! let agent = Header::required().alias("user_agent");
//! assert_eq!(agent.alias_name(), Some("user-agent"));
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::di::Depends;

/// The request section a field's raw value is extracted from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamKind {
    /// URL query string.
    Query,
    /// Request header.
    Header,
    /// Path segment captured by the router.
    Path,
    /// Cookie from the `Cookie` header.
    Cookie,
    /// Field of an `application/x-www-form-urlencoded` body.
    Form,
    /// Field of a JSON body.
    Body,
}

impl ParamKind {
    /// All kinds, in the order parsers are run.
    pub const ALL: [ParamKind; 6] = [
        ParamKind::Query,
        ParamKind::Header,
        ParamKind::Path,
        ParamKind::Cookie,
        ParamKind::Form,
        ParamKind::Body,
    ];

    /// Lowercase name, used as the first element of an error location.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Query => "query",
            Self::Header => "header",
            Self::Path => "path",
            Self::Cookie => "cookie",
            Self::Form => "form",
            Self::Body => "body",
        }
    }

    /// Whether values of this kind travel in the request body.
    pub const fn is_body(self) -> bool {
        matches!(self, Self::Form | Self::Body)
    }
}

impl fmt::Display for ParamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What happens when a field is absent from the request.
#[derive(Debug, Clone, PartialEq)]
pub enum DefaultValue {
    /// Absence is a validation error.
    Required,
    /// Absence yields this value.
    Value(Value),
}

/// Validation constraints carried by a descriptor.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Constraints {
    /// Exclusive lower bound.
    pub gt: Option<f64>,
    /// Inclusive lower bound.
    pub ge: Option<f64>,
    /// Exclusive upper bound.
    pub lt: Option<f64>,
    /// Inclusive upper bound.
    pub le: Option<f64>,
    /// Minimum string length, or minimum item count for sequences.
    pub min_length: Option<usize>,
    /// Maximum string length, or maximum item count for sequences.
    pub max_length: Option<usize>,
    /// Regular expression a string value must match from its start.
    pub pattern: Option<String>,
    /// Permitted values. Empty means unrestricted.
    pub one_of: Vec<Value>,
}

impl Constraints {
    /// Returns `true` if no constraint is set.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// A value-parameter descriptor: provenance kind, default, and constraints.
///
/// Built through the kind-specific entry points [`Query`], [`Header`],
/// [`Path`], [`Cookie`], [`Form`] and [`Body`].
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    kind: ParamKind,
    default: DefaultValue,
    alias: Option<String>,
    title: Option<String>,
    description: Option<String>,
    constraints: Constraints,
    example: Option<Value>,
    deprecated: bool,
}

impl Param {
    /// Creates a descriptor of the given kind.
    pub fn new(kind: ParamKind, default: DefaultValue) -> Self {
        Self {
            kind,
            default,
            alias: None,
            title: None,
            description: None,
            constraints: Constraints::default(),
            example: None,
            deprecated: false,
        }
    }

    /// Sets the name the value is looked up under in the request.
    ///
    /// Header aliases have underscores converted to hyphens.
    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        let alias = alias.into();
        self.alias = Some(if self.kind == ParamKind::Header {
            alias.replace('_', "-")
        } else {
            alias
        });
        self
    }

    /// Sets the documentation title.
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Sets the documentation description.
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Exclusive lower bound.
    pub fn gt(mut self, value: f64) -> Self {
        self.constraints.gt = Some(value);
        self
    }

    /// Inclusive lower bound.
    pub fn ge(mut self, value: f64) -> Self {
        self.constraints.ge = Some(value);
        self
    }

    /// Exclusive upper bound.
    pub fn lt(mut self, value: f64) -> Self {
        self.constraints.lt = Some(value);
        self
    }

    /// Inclusive upper bound.
    pub fn le(mut self, value: f64) -> Self {
        self.constraints.le = Some(value);
        self
    }

    /// Minimum length (characters for strings, items for sequences).
    pub fn min_length(mut self, value: usize) -> Self {
        self.constraints.min_length = Some(value);
        self
    }

    /// Maximum length (characters for strings, items for sequences).
    pub fn max_length(mut self, value: usize) -> Self {
        self.constraints.max_length = Some(value);
        self
    }

    /// Regular expression the value must match. Compiled at registration.
    pub fn pattern(mut self, pattern: impl Into<String>) -> Self {
        self.constraints.pattern = Some(pattern.into());
        self
    }

    /// Restricts the value to the given set.
    pub fn one_of<I, V>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.constraints.one_of = values.into_iter().map(Into::into).collect();
        self
    }

    /// Example value for documentation.
    pub fn example(mut self, example: impl Into<Value>) -> Self {
        self.example = Some(example.into());
        self
    }

    /// Marks the parameter as deprecated in documentation.
    pub fn deprecated(mut self) -> Self {
        self.deprecated = true;
        self
    }

    /// Provenance kind.
    pub fn kind(&self) -> ParamKind {
        self.kind
    }

    /// Default behavior when absent.
    pub fn default(&self) -> &DefaultValue {
        &self.default
    }

    /// The default value, if the parameter is optional.
    pub fn default_value(&self) -> Option<&Value> {
        match &self.default {
            DefaultValue::Required => None,
            DefaultValue::Value(v) => Some(v),
        }
    }

    /// Whether absence is an error.
    pub fn is_required(&self) -> bool {
        matches!(self.default, DefaultValue::Required)
    }

    /// The explicit alias, if any.
    pub fn alias_name(&self) -> Option<&str> {
        self.alias.as_deref()
    }

    /// Documentation title.
    pub fn title_text(&self) -> Option<&str> {
        self.title.as_deref()
    }

    /// Documentation description.
    pub fn description_text(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Constraints.
    pub fn constraints(&self) -> &Constraints {
        &self.constraints
    }

    /// Example value.
    pub fn example_value(&self) -> Option<&Value> {
        self.example.as_ref()
    }

    /// Whether the parameter is deprecated.
    pub fn is_deprecated(&self) -> bool {
        self.deprecated
    }
}

macro_rules! descriptor_kind {
    ($(#[$doc:meta])* $name:ident => $kind:expr) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy)]
        pub struct $name;

        impl $name {
            /// A descriptor whose absence is a validation error.
            pub fn required() -> Param {
                Param::new($kind, DefaultValue::Required)
            }

            /// A descriptor that falls back to `value` when absent.
            pub fn default_value(value: impl Into<Value>) -> Param {
                Param::new($kind, DefaultValue::Value(value.into()))
            }

            /// A descriptor that falls back to `null` when absent.
            pub fn optional() -> Param {
                Param::new($kind, DefaultValue::Value(Value::Null))
            }
        }
    };
}

descriptor_kind!(
    /// Descriptors for query-string values.
    Query => ParamKind::Query
);
descriptor_kind!(
    /// Descriptors for header values.
    Header => ParamKind::Header
);
descriptor_kind!(
    /// Descriptors for path segments.
    Path => ParamKind::Path
);
descriptor_kind!(
    /// Descriptors for cookie values.
    Cookie => ParamKind::Cookie
);
descriptor_kind!(
    /// Descriptors for urlencoded form fields.
    Form => ParamKind::Form
);
descriptor_kind!(
    /// Descriptors for JSON body fields.
    Body => ParamKind::Body
);

/// The default attached to a declared handler parameter.
///
/// An explicit tagged union: the Signature Model Builder dispatches on the
/// variant, and the Parser Factory maps each [`ParamKind`] to a parser.
#[derive(Debug, Clone)]
pub enum Descriptor {
    /// A value extracted from the request.
    Param(Param),
    /// The result of a nested dependency.
    Depends(Depends),
}

impl Descriptor {
    /// Provenance kind, or `None` for dependencies.
    pub fn kind(&self) -> Option<ParamKind> {
        match self {
            Self::Param(p) => Some(p.kind()),
            Self::Depends(_) => None,
        }
    }
}

impl From<Param> for Descriptor {
    fn from(param: Param) -> Self {
        Self::Param(param)
    }
}

impl From<Depends> for Descriptor {
    fn from(depends: Depends) -> Self {
        Self::Depends(depends)
    }
}

/// Declared type of a field. Drives coercion and scalar/sequence extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldType {
    /// UTF-8 string.
    String,
    /// 64-bit signed integer.
    Integer,
    /// 64-bit float.
    Number,
    /// Boolean.
    Boolean,
    /// Ordered sequence.
    Array(Box<FieldType>),
    /// Sequence without duplicates.
    Set(Box<FieldType>),
    /// JSON object.
    Object,
    /// Anything; passed through untouched.
    Any,
}

impl FieldType {
    /// `Array` of `item`.
    pub fn array(item: FieldType) -> Self {
        Self::Array(Box::new(item))
    }

    /// `Set` of `item`.
    pub fn set(item: FieldType) -> Self {
        Self::Set(Box::new(item))
    }

    /// Returns `true` for sequences whose elements are neither objects nor
    /// nested structures. These are fetched with the multi-value accessor.
    pub fn is_scalar_sequence(&self) -> bool {
        match self {
            Self::Array(item) | Self::Set(item) => item.is_scalar(),
            _ => false,
        }
    }

    /// Returns `true` for single-valued primitive types.
    pub fn is_scalar(&self) -> bool {
        matches!(
            self,
            Self::String | Self::Integer | Self::Number | Self::Boolean | Self::Any
        )
    }

    /// OpenAPI type name.
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Integer => "integer",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Array(_) | Self::Set(_) => "array",
            Self::Object => "object",
            Self::Any => "any",
        }
    }
}
