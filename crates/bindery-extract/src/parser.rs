//! Source parsers: per-section extraction of raw values.
//!
//! Each parser serves one [`ParamKind`] and holds the schema fields of that
//! kind, pre-partitioned into scalar and sequence getters. Absent fields are
//! omitted; defaults and requiredness are left to validation.

use std::fmt;

use async_trait::async_trait;
use bindery_core::{ParamKind, RawValues, ValidationSchema};
use serde_json::Value;

use crate::error::ExtractionError;
use crate::request::{AsyncRequestSource, MultiMap, RequestSource};

/// How a field's value is taken from a multi-valued section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Getter {
    /// First value only.
    Single,
    /// Every value, as an array.
    Multi,
}

/// One field a parser looks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldGetter {
    /// Key of the raw output (the field alias).
    pub alias: String,
    /// Key looked up in the section.
    pub key: String,
    /// Accessor.
    pub getter: Getter,
}

/// The fields of one kind, with their accessors.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldGetters {
    getters: Vec<FieldGetter>,
}

impl FieldGetters {
    /// Selects the schema fields of `kind` and classifies each one.
    ///
    /// Header keys are matched case-insensitively.
    #[must_use]
    pub fn from_schema(schema: &ValidationSchema, kind: ParamKind) -> Self {
        let getters = schema
            .fields_of(kind)
            .map(|field| FieldGetter {
                alias: field.alias().to_owned(),
                key: if kind == ParamKind::Header {
                    field.alias().to_ascii_lowercase()
                } else {
                    field.alias().to_owned()
                },
                getter: if field.ty().is_scalar_sequence() {
                    Getter::Multi
                } else {
                    Getter::Single
                },
            })
            .collect();
        Self { getters }
    }

    /// Returns `true` if no field is served.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.getters.is_empty()
    }

    /// The getters in declaration order.
    #[must_use]
    pub fn getters(&self) -> &[FieldGetter] {
        &self.getters
    }

    /// Extracts every present field from a multi-valued section.
    #[must_use]
    pub fn pick(&self, section: &MultiMap) -> RawValues {
        let mut out = RawValues::new();
        for field in &self.getters {
            if !section.contains(&field.key) {
                continue;
            }
            let value = match field.getter {
                Getter::Single => section
                    .get(&field.key)
                    .map_or(Value::Null, |v| Value::String(v.to_owned())),
                Getter::Multi => Value::Array(
                    section
                        .get_all(&field.key)
                        .into_iter()
                        .map(|v| Value::String(v.to_owned()))
                        .collect(),
                ),
            };
            out.insert(field.alias.clone(), value);
        }
        out
    }

    /// Extracts every present field from a JSON object body. Non-object
    /// bodies contribute nothing.
    #[must_use]
    pub fn pick_json(&self, body: Option<&Value>) -> RawValues {
        let mut out = RawValues::new();
        if let Some(Value::Object(map)) = body {
            for field in &self.getters {
                if let Some(v) = map.get(&field.key) {
                    out.insert(field.alias.clone(), v.clone());
                }
            }
        }
        out
    }
}

/// Extraction strategy for one request section.
#[async_trait]
pub trait SourceParser: Send + Sync + fmt::Debug {
    /// The kind served.
    fn kind(&self) -> ParamKind;

    /// The fields served.
    fn fields(&self) -> &FieldGetters;

    /// Returns `true` if the parser serves no field and can be skipped.
    fn is_inert(&self) -> bool {
        self.fields().is_empty()
    }

    /// Extracts raw values on the blocking path.
    fn parse(&self, request: &dyn RequestSource) -> Result<RawValues, ExtractionError>;

    /// Extracts raw values on the cooperative path.
    async fn parse_async(
        &self,
        request: &dyn AsyncRequestSource,
    ) -> Result<RawValues, ExtractionError>;
}

macro_rules! pair_parser {
    ($(#[$doc:meta])* $name:ident, $kind:expr, $accessor:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone)]
        pub struct $name {
            fields: FieldGetters,
        }

        impl $name {
            /// Builds the parser for the fields of `schema` it serves.
            #[must_use]
            pub fn from_schema(schema: &ValidationSchema) -> Self {
                Self {
                    fields: FieldGetters::from_schema(schema, $kind),
                }
            }
        }

        #[async_trait]
        impl SourceParser for $name {
            fn kind(&self) -> ParamKind {
                $kind
            }

            fn fields(&self) -> &FieldGetters {
                &self.fields
            }

            fn parse(&self, request: &dyn RequestSource) -> Result<RawValues, ExtractionError> {
                Ok(self.fields.pick(request.$accessor()))
            }

            async fn parse_async(
                &self,
                request: &dyn AsyncRequestSource,
            ) -> Result<RawValues, ExtractionError> {
                Ok(self.fields.pick(request.$accessor()))
            }
        }
    };
}

pair_parser!(
    /// Parser for query-string fields.
    QueryParser,
    ParamKind::Query,
    query
);
pair_parser!(
    /// Parser for header fields. Lookups are case-insensitive.
    HeaderParser,
    ParamKind::Header,
    headers
);
pair_parser!(
    /// Parser for cookie fields.
    CookieParser,
    ParamKind::Cookie,
    cookies
);
pair_parser!(
    /// Parser for path parameters.
    PathParser,
    ParamKind::Path,
    path_params
);

/// Parser for urlencoded form fields.
#[derive(Debug, Clone)]
pub struct FormParser {
    fields: FieldGetters,
}

impl FormParser {
    /// Builds the parser for the form fields of `schema`.
    #[must_use]
    pub fn from_schema(schema: &ValidationSchema) -> Self {
        Self {
            fields: FieldGetters::from_schema(schema, ParamKind::Form),
        }
    }
}

#[async_trait]
impl SourceParser for FormParser {
    fn kind(&self) -> ParamKind {
        ParamKind::Form
    }

    fn fields(&self) -> &FieldGetters {
        &self.fields
    }

    fn parse(&self, request: &dyn RequestSource) -> Result<RawValues, ExtractionError> {
        Ok(self.fields.pick(request.form()?))
    }

    async fn parse_async(
        &self,
        request: &dyn AsyncRequestSource,
    ) -> Result<RawValues, ExtractionError> {
        Ok(self.fields.pick(request.form().await?))
    }
}

/// Parser for JSON body fields. A missing or `null` body yields nothing.
#[derive(Debug, Clone)]
pub struct JsonBodyParser {
    fields: FieldGetters,
}

impl JsonBodyParser {
    /// Builds the parser for the body fields of `schema`.
    #[must_use]
    pub fn from_schema(schema: &ValidationSchema) -> Self {
        Self {
            fields: FieldGetters::from_schema(schema, ParamKind::Body),
        }
    }
}

#[async_trait]
impl SourceParser for JsonBodyParser {
    fn kind(&self) -> ParamKind {
        ParamKind::Body
    }

    fn fields(&self) -> &FieldGetters {
        &self.fields
    }

    fn parse(&self, request: &dyn RequestSource) -> Result<RawValues, ExtractionError> {
        Ok(self.fields.pick_json(request.json()?))
    }

    async fn parse_async(
        &self,
        request: &dyn AsyncRequestSource,
    ) -> Result<RawValues, ExtractionError> {
        Ok(self.fields.pick_json(request.json().await?))
    }
}
