//! The OpenAPI 3.0 objects the generator fills.
//!
//! Empty optional members are left out of the JSON, so a rendered document
//! reads like one written by hand. Everything also deserializes, which lets
//! callers load and compare documents.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

fn is_false(b: &bool) -> bool {
    !*b
}

/// Root of the document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenApi {
    /// `openapi` version string, `3.0.2` unless overridden.
    pub openapi: String,
    /// `info` object.
    pub info: Info,
    /// `servers`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub servers: Vec<Server>,
    /// Path templates mapped to their operations, in registration order.
    #[serde(default)]
    pub paths: IndexMap<String, PathItem>,
    /// Body schemas shared through `$ref`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub components: Option<Components>,
    /// Tag declarations.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<Tag>,
}

/// `info` object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Info {
    /// Shown as the page heading.
    pub title: String,
    /// Version of the described API.
    pub version: String,
    /// Markdown.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub terms_of_service: Option<String>,
    /// Maintainer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact: Option<Contact>,
    /// Licence of the API.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license: Option<License>,
}

/// `contact` object. Every member is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[allow(missing_docs)]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[allow(missing_docs)]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[allow(missing_docs)]
    pub email: Option<String>,
}

/// `license` object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct License {
    /// SPDX name or free text.
    pub name: String,
    /// Licence text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// `server` object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Server {
    /// Base URL, possibly relative.
    pub url: String,
    /// Label shown in the server picker.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Operations on one path template, one slot per method.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
#[allow(missing_docs)]
pub struct PathItem {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub get: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub put: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub post: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delete: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub head: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patch: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace: Option<Operation>,
}

impl PathItem {
    /// Mutable slot for a lowercase method. `None` when OpenAPI has no
    /// member for the method, e.g. `connect`.
    pub fn slot_mut(&mut self, method: &str) -> Option<&mut Option<Operation>> {
        Some(match method {
            "get" => &mut self.get,
            "put" => &mut self.put,
            "post" => &mut self.post,
            "delete" => &mut self.delete,
            "options" => &mut self.options,
            "head" => &mut self.head,
            "patch" => &mut self.patch,
            "trace" => &mut self.trace,
            _ => return None,
        })
    }

    /// The operation registered for a lowercase method.
    pub fn operation(&self, method: &str) -> Option<&Operation> {
        let slot = match method {
            "get" => &self.get,
            "put" => &self.put,
            "post" => &self.post,
            "delete" => &self.delete,
            "options" => &self.options,
            "head" => &self.head,
            "patch" => &self.patch,
            "trace" => &self.trace,
            _ => return None,
        };
        slot.as_ref()
    }
}

/// One method on one path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Operation {
    /// Groups shown in Swagger UI.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    /// One line, shown next to the path.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    /// Markdown, shown when the operation is expanded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// `{view}{path}_{method}`.
    pub operation_id: String,
    #[serde(default, skip_serializing_if = "is_false")]
    #[allow(missing_docs)]
    pub deprecated: bool,
    /// Every non-body field, always written even when empty.
    #[serde(default)]
    pub parameters: Vec<Parameter>,
    /// Present when any field binds from the body.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_body: Option<RequestBody>,
    /// Status code to response.
    pub responses: IndexMap<String, Response>,
}

/// The `in` of a parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[allow(missing_docs)]
pub enum ParameterIn {
    Query,
    Path,
    Header,
    Cookie,
}

/// A non-body field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    /// Wire name, after alias and header conversion.
    pub name: String,
    /// Request section.
    #[serde(rename = "in")]
    pub location: ParameterIn,
    /// From the field's description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// `true` when the field has no default.
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    #[allow(missing_docs)]
    pub deprecated: bool,
    /// Type and constraints.
    pub schema: Schema,
}

/// `requestBody` object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestBody {
    /// `true` when some body field is required.
    #[serde(default)]
    pub required: bool,
    /// Media type to schema, e.g. `application/json`.
    pub content: IndexMap<String, MediaType>,
}

/// Schema for one media type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaType {
    /// Usually a `$ref` into `components`.
    pub schema: Schema,
}

/// `response` object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    /// Required by OpenAPI, e.g. `Successful Response`.
    pub description: String,
}

/// `components` object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Components {
    /// Schemas referenced as `#/components/schemas/{name}`.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub schemas: IndexMap<String, Schema>,
}

/// Document-level tag declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    /// Matches `Operation::tags` entries.
    pub name: String,
    /// Markdown.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// The `type` keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[allow(missing_docs)]
pub enum SchemaType {
    String,
    Number,
    Integer,
    Boolean,
    Array,
    Object,
}

/// The JSON Schema subset OpenAPI 3.0 allows. Numeric and length bounds
/// come straight from field constraints.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Schema {
    /// Field name, or the generated body model name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// `None` accepts any value.
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub schema_type: Option<SchemaType>,
    /// Field description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// `#/components/schemas/...`. Other members are ignored when set.
    #[serde(rename = "$ref", skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    /// Members of an object.
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub properties: IndexMap<String, Schema>,
    /// Names in `properties` with no default.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub required: Vec<String>,
    /// Element schema of an array.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<Schema>>,
    /// Set for set-typed fields.
    #[serde(skip_serializing_if = "is_false")]
    pub unique_items: bool,
    /// Allowed values.
    #[serde(rename = "enum", skip_serializing_if = "Vec::is_empty")]
    pub enum_values: Vec<Value>,
    /// From `ge`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimum: Option<f64>,
    /// From `gt`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exclusive_minimum: Option<f64>,
    /// From `le`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maximum: Option<f64>,
    /// From `lt`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exclusive_maximum: Option<f64>,
    /// From `min_length` on strings.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_length: Option<usize>,
    /// From `max_length` on strings.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
    /// From `min_length` on sequences.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_items: Option<usize>,
    /// From `max_length` on sequences.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_items: Option<usize>,
    /// From `regex`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    /// A declared default other than "required".
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    /// From the field's example.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub example: Option<Value>,
}

impl Schema {
    fn typed(schema_type: SchemaType) -> Self {
        Self {
            schema_type: Some(schema_type),
            ..Default::default()
        }
    }

    /// String schema.
    #[must_use]
    pub fn string() -> Self {
        Self::typed(SchemaType::String)
    }

    /// Integer schema.
    #[must_use]
    pub fn integer() -> Self {
        Self::typed(SchemaType::Integer)
    }

    /// Number schema.
    #[must_use]
    pub fn number() -> Self {
        Self::typed(SchemaType::Number)
    }

    /// Boolean schema.
    #[must_use]
    pub fn boolean() -> Self {
        Self::typed(SchemaType::Boolean)
    }

    /// Array schema.
    #[must_use]
    pub fn array(items: Schema) -> Self {
        Self {
            items: Some(Box::new(items)),
            ..Self::typed(SchemaType::Array)
        }
    }

    /// Object schema.
    #[must_use]
    pub fn object() -> Self {
        Self::typed(SchemaType::Object)
    }

    /// Schema that accepts any value.
    #[must_use]
    pub fn any() -> Self {
        Self::default()
    }

    /// Reference to a component schema.
    #[must_use]
    pub fn reference(ref_path: impl Into<String>) -> Self {
        Self {
            reference: Some(ref_path.into()),
            ..Default::default()
        }
    }

    /// Sets the title.
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, desc: impl Into<String>) -> Self {
        self.description = Some(desc.into());
        self
    }

    /// Adds an object property.
    #[must_use]
    pub fn property(mut self, name: impl Into<String>, schema: Schema) -> Self {
        self.properties.insert(name.into(), schema);
        self
    }

    /// Marks an object property required.
    #[must_use]
    pub fn required_property(mut self, name: impl Into<String>) -> Self {
        self.required.push(name.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_schema_builders() {
        let schema = Schema::object()
            .with_title("Body")
            .property("name", Schema::string())
            .property("tags", Schema::array(Schema::string()))
            .required_property("name");

        assert_eq!(
            serde_json::to_value(&schema).unwrap(),
            json!({
                "title": "Body",
                "type": "object",
                "properties": {
                    "name": {"type": "string"},
                    "tags": {"type": "array", "items": {"type": "string"}}
                },
                "required": ["name"]
            })
        );
    }

    #[test]
    fn test_any_schema_is_empty_object() {
        assert_eq!(serde_json::to_value(Schema::any()).unwrap(), json!({}));
    }

    #[test]
    fn test_schema_reference() {
        let schema = Schema::reference("#/components/schemas/Body_create");
        let json = serde_json::to_value(&schema).unwrap();
        assert_eq!(json, json!({"$ref": "#/components/schemas/Body_create"}));
    }

    #[test]
    fn test_parameter_in_serialization() {
        let param = Parameter {
            name: "x-token".to_owned(),
            location: ParameterIn::Header,
            description: None,
            required: true,
            deprecated: false,
            schema: Schema::string(),
        };
        let json = serde_json::to_value(&param).unwrap();
        assert_eq!(json["in"], "header");
        assert_eq!(json["required"], true);
        assert!(json.get("deprecated").is_none());
    }

    #[test]
    fn test_path_item_slots() {
        let mut item = PathItem::default();
        let op = Operation {
            tags: vec![],
            summary: None,
            description: None,
            operation_id: "list/items_get".to_owned(),
            deprecated: false,
            parameters: vec![],
            request_body: None,
            responses: IndexMap::new(),
        };
        *item.slot_mut("get").unwrap() = Some(op);
        assert!(item.slot_mut("connect").is_none());
        assert!(item.operation("get").is_some());
        assert!(item.operation("post").is_none());

        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["get"]["operationId"], "list/items_get");
        assert!(json.get("post").is_none());
    }

    #[test]
    fn test_info_serialization() {
        let info = Info {
            title: "Shop".to_owned(),
            version: "1.0".to_owned(),
            description: None,
            terms_of_service: Some("https://example.com/tos".to_owned()),
            contact: None,
            license: Some(License {
                name: "MIT".to_owned(),
                url: None,
            }),
        };
        let json = serde_json::to_value(&info).unwrap();
        assert_eq!(json["termsOfService"], "https://example.com/tos");
        assert_eq!(json["license"], json!({"name": "MIT"}));
        assert!(json.get("description").is_none());
    }
}
