//! OpenAPI generation from a [`ViewRegistry`].
//!
//! Every registered view with a path contributes one operation per method.
//! Parameters come from the view's own schema and, depth first, from the
//! schemas of its dependencies. Body and form fields are described by a
//! request body whose schemas live under `components/schemas`.

use bindery_core::{FieldType, ParamKind, SchemaField};
use bindery_router::{ViewMeta, ViewRegistry};
use indexmap::IndexMap;

use crate::error::DocsResult;
use crate::openapi::{
    Components, Contact, Info, License, MediaType, OpenApi, Operation, Parameter, ParameterIn,
    RequestBody, Response, Schema, Server, Tag,
};

/// Default OpenAPI version of generated documents.
pub const DEFAULT_OPENAPI_VERSION: &str = "3.0.2";

const SCHEMA_REF_PREFIX: &str = "#/components/schemas/";

/// Builds [`OpenApi`] documents from registered views.
///
/// ```rust
/// use bindery_docs::OpenApiGenerator;
/// use bindery_router::ViewRegistry;
///
/// let doc = OpenApiGenerator::new()
///     .title("Shop")
///     .version("1.2.0")
///     .generate(&ViewRegistry::new());
/// assert_eq!(doc.openapi, "3.0.2");
/// assert!(doc.paths.is_empty());
/// ```
#[derive(Debug, Clone)]
pub struct OpenApiGenerator {
    title: String,
    version: String,
    openapi_version: String,
    description: Option<String>,
    terms_of_service: Option<String>,
    contact: Option<Contact>,
    license: Option<License>,
    servers: Vec<Server>,
    tags: Vec<Tag>,
}

impl Default for OpenApiGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl OpenApiGenerator {
    /// Creates a generator titled `bindery`, version `0.1`.
    #[must_use]
    pub fn new() -> Self {
        Self {
            title: "bindery".to_owned(),
            version: "0.1".to_owned(),
            openapi_version: DEFAULT_OPENAPI_VERSION.to_owned(),
            description: None,
            terms_of_service: None,
            contact: None,
            license: None,
            servers: Vec::new(),
            tags: Vec::new(),
        }
    }

    /// Sets the API title.
    #[must_use]
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Sets the API version.
    #[must_use]
    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// Sets the OpenAPI version string.
    #[must_use]
    pub fn openapi_version(mut self, version: impl Into<String>) -> Self {
        self.openapi_version = version.into();
        self
    }

    /// Sets the API description.
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the terms of service URL.
    #[must_use]
    pub fn terms_of_service(mut self, url: impl Into<String>) -> Self {
        self.terms_of_service = Some(url.into());
        self
    }

    /// Sets contact information.
    #[must_use]
    pub fn contact(mut self, contact: Contact) -> Self {
        self.contact = Some(contact);
        self
    }

    /// Sets license information.
    #[must_use]
    pub fn license(mut self, name: impl Into<String>, url: Option<String>) -> Self {
        self.license = Some(License {
            name: name.into(),
            url,
        });
        self
    }

    /// Adds a server.
    #[must_use]
    pub fn server(mut self, url: impl Into<String>, description: Option<String>) -> Self {
        self.servers.push(Server {
            url: url.into(),
            description,
        });
        self
    }

    /// Declares a document-level tag.
    #[must_use]
    pub fn tag(mut self, name: impl Into<String>, description: Option<String>) -> Self {
        self.tags.push(Tag {
            name: name.into(),
            description,
        });
        self
    }

    /// Generates the document for every view in `registry`.
    #[must_use]
    pub fn generate(&self, registry: &ViewRegistry) -> OpenApi {
        let mut doc = OpenApi {
            openapi: self.openapi_version.clone(),
            info: Info {
                title: self.title.clone(),
                version: self.version.clone(),
                description: self.description.clone(),
                terms_of_service: self.terms_of_service.clone(),
                contact: self.contact.clone(),
                license: self.license.clone(),
            },
            servers: self.servers.clone(),
            paths: IndexMap::new(),
            components: None,
            tags: self.tags.clone(),
        };
        let mut components = Components::default();

        for view in registry {
            let meta = view.meta();
            let Some(path) = meta.path() else { continue };
            if !meta.include_in_schema() {
                continue;
            }

            let item = doc.paths.entry(path.to_owned()).or_default();
            for method in meta.methods() {
                let method = method.to_ascii_lowercase();
                let Some(slot) = item.slot_mut(&method) else {
                    tracing::debug!(view = %meta.name(), method, "method not representable in OpenAPI");
                    continue;
                };
                *slot = Some(operation(meta, path, &method, &mut components));
            }
            tracing::debug!(view = %meta.name(), path, "view documented");
        }

        if !components.schemas.is_empty() {
            doc.components = Some(components);
        }
        doc
    }

    /// Generates the document and renders it as JSON.
    pub fn generate_json(&self, registry: &ViewRegistry) -> DocsResult<String> {
        Ok(serde_json::to_string(&self.generate(registry))?)
    }
}

fn operation(meta: &ViewMeta, path: &str, method: &str, components: &mut Components) -> Operation {
    let operation_id = format!("{}{}_{}", meta.name(), path, method);
    let fields = meta.manager().all_fields();

    // A dependency shared by several others contributes its fields once.
    let mut parameters: Vec<Parameter> = Vec::new();
    for param in fields.iter().filter_map(|field| parameter(field)) {
        if !parameters
            .iter()
            .any(|p| p.location == param.location && p.name == param.name)
        {
            parameters.push(param);
        }
    }
    let request_body = request_body(&fields, &operation_id, components);

    let mut responses = IndexMap::new();
    responses.insert(
        "200".to_owned(),
        Response {
            description: "Successful Response".to_owned(),
        },
    );

    Operation {
        tags: meta.tags().to_vec(),
        summary: Some(
            meta.summary()
                .map_or_else(|| title_case(&meta.name().replace('_', " ")), str::to_owned),
        ),
        description: meta.description().map(str::to_owned),
        operation_id,
        deprecated: meta.is_deprecated(),
        parameters,
        request_body,
        responses,
    }
}

fn parameter(field: &SchemaField) -> Option<Parameter> {
    let location = match field.kind() {
        ParamKind::Query => ParameterIn::Query,
        ParamKind::Header => ParameterIn::Header,
        ParamKind::Path => ParameterIn::Path,
        ParamKind::Cookie => ParameterIn::Cookie,
        ParamKind::Form | ParamKind::Body => return None,
    };
    Some(Parameter {
        name: field.alias().to_owned(),
        location,
        description: field.param().description_text().map(str::to_owned),
        required: field.is_required(),
        deprecated: field.param().is_deprecated(),
        schema: field_schema(field),
    })
}

fn request_body(
    fields: &[&SchemaField],
    operation_id: &str,
    components: &mut Components,
) -> Option<RequestBody> {
    let mut content = IndexMap::new();
    let mut required = false;

    for (kind, media_type, prefix) in [
        (ParamKind::Body, "application/json", "Body"),
        (ParamKind::Form, "application/x-www-form-urlencoded", "Form"),
    ] {
        let mut schema = Schema::object();
        for field in fields.iter().filter(|f| f.kind() == kind) {
            schema.properties.insert(field.alias().to_owned(), field_schema(field));
            if field.is_required() && !schema.required.iter().any(|r| r == field.alias()) {
                schema.required.push(field.alias().to_owned());
            }
        }
        if schema.properties.is_empty() {
            continue;
        }
        required |= !schema.required.is_empty();

        let name = component_name(prefix, operation_id);
        components
            .schemas
            .insert(name.clone(), schema.with_title(name.clone()));
        content.insert(
            media_type.to_owned(),
            MediaType {
                schema: Schema::reference(format!("{SCHEMA_REF_PREFIX}{name}")),
            },
        );
    }

    if content.is_empty() {
        None
    } else {
        Some(RequestBody { required, content })
    }
}

/// JSON Schema for one field: type, constraints, default and documentation.
#[must_use]
pub fn field_schema(field: &SchemaField) -> Schema {
    let param = field.param();
    let constraints = param.constraints();
    let ty = field.ty();

    let mut schema = type_schema(ty);
    schema.title = Some(
        param
            .title_text()
            .map_or_else(|| title_case(&field.name().replace('_', " ")), str::to_owned),
    );
    schema.description = param.description_text().map(str::to_owned);
    schema.exclusive_minimum = constraints.gt;
    schema.minimum = constraints.ge;
    schema.exclusive_maximum = constraints.lt;
    schema.maximum = constraints.le;
    if matches!(ty, FieldType::Array(_) | FieldType::Set(_)) {
        schema.min_items = constraints.min_length;
        schema.max_items = constraints.max_length;
    } else {
        schema.min_length = constraints.min_length;
        schema.max_length = constraints.max_length;
    }
    schema.pattern = constraints.pattern.clone();
    schema.enum_values = constraints.one_of.clone();
    schema.default = param.default_value().filter(|v| !v.is_null()).cloned();
    schema.example = param.example_value().cloned();
    schema
}

fn type_schema(ty: &FieldType) -> Schema {
    match ty {
        FieldType::String => Schema::string(),
        FieldType::Integer => Schema::integer(),
        FieldType::Number => Schema::number(),
        FieldType::Boolean => Schema::boolean(),
        FieldType::Array(item) => Schema::array(type_schema(item)),
        FieldType::Set(item) => Schema {
            unique_items: true,
            ..Schema::array(type_schema(item))
        },
        FieldType::Object => Schema::object(),
        FieldType::Any => Schema::any(),
    }
}

fn component_name(prefix: &str, operation_id: &str) -> String {
    let id: String = operation_id
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    format!("{prefix}_{id}")
}

/// Upper-cases the first letter of every word and lower-cases the rest.
fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_alpha = false;
    for c in s.chars() {
        if prev_alpha {
            out.extend(c.to_lowercase());
        } else {
            out.extend(c.to_uppercase());
        }
        prev_alpha = c.is_alphabetic();
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use bindery_core::{
        dependency_fn, Body, Depends, Form, Header, Path, Query, Signature, Values,
    };
    use bindery_extract::ParserFactory;
    use bindery_router::{View, ViewOptions};
    use bytes::Bytes;
    use serde_json::json;

    fn register(registry: &mut ViewRegistry, options: ViewOptions, sig: &Signature) {
        let meta = ViewMeta::build(options, sig, &ParserFactory::http()).unwrap();
        let view = View::new(meta, |_: Values| http::Response::new(Bytes::new())).unwrap();
        registry.register(Arc::new(view)).unwrap();
    }

    #[test]
    fn test_required_query_parameter() {
        let mut registry = ViewRegistry::new();
        let sig = Signature::new("list_items").param("q", FieldType::String, Query::required());
        register(&mut registry, ViewOptions::new().path("/items").method("GET"), &sig);

        let doc = OpenApiGenerator::new().generate(&registry);
        let op = doc.paths["/items"].get.as_ref().unwrap();
        assert_eq!(op.parameters.len(), 1);
        let param = serde_json::to_value(&op.parameters[0]).unwrap();
        assert_eq!(param["name"], "q");
        assert_eq!(param["in"], "query");
        assert_eq!(param["required"], true);
        assert_eq!(param["schema"], json!({"title": "Q", "type": "string"}));
    }

    #[test]
    fn test_operation_metadata() {
        let mut registry = ViewRegistry::new();
        let sig = Signature::new("list_items");
        register(
            &mut registry,
            ViewOptions::new()
                .path("/items")
                .methods(["GET", "POST"])
                .tags(["items"])
                .description("Lists items")
                .deprecated(),
            &sig,
        );

        let doc = OpenApiGenerator::new().generate(&registry);
        let item = &doc.paths["/items"];
        let get = item.get.as_ref().unwrap();
        assert_eq!(get.operation_id, "list_items/items_get");
        assert_eq!(get.summary.as_deref(), Some("List Items"));
        assert_eq!(get.description.as_deref(), Some("Lists items"));
        assert_eq!(get.tags, ["items"]);
        assert!(get.deprecated);
        assert_eq!(get.responses["200"].description, "Successful Response");
        assert_eq!(item.post.as_ref().unwrap().operation_id, "list_items/items_post");
    }

    #[test]
    fn test_excluded_views_skipped() {
        let mut registry = ViewRegistry::new();
        register(
            &mut registry,
            ViewOptions::new().path("/hidden").method("GET").include_in_schema(false),
            &Signature::new("hidden"),
        );
        register(
            &mut registry,
            ViewOptions::new().path("/shown").method("GET").summary("Shown"),
            &Signature::new("shown"),
        );

        let doc = OpenApiGenerator::new().generate(&registry);
        assert_eq!(doc.paths.keys().collect::<Vec<_>>(), ["/shown"]);
        assert_eq!(doc.paths["/shown"].get.as_ref().unwrap().summary.as_deref(), Some("Shown"));
    }

    #[test]
    fn test_dependency_parameters_included() {
        let token = dependency_fn(
            "verify_token",
            Signature::new("verify_token").param("x_token", FieldType::String, Header::required()),
            |args| Ok(args.raw("x_token").cloned().unwrap_or_default()),
        );
        let sig = Signature::new("read_item")
            .param("item_id", FieldType::Integer, Path::required().ge(1.0))
            .depends("token", Depends::new(token));

        let mut registry = ViewRegistry::new();
        register(&mut registry, ViewOptions::new().path("/items/{item_id}").method("GET"), &sig);

        let doc = OpenApiGenerator::new().generate(&registry);
        let op = doc.paths["/items/{item_id}"].get.as_ref().unwrap();
        let params = serde_json::to_value(&op.parameters).unwrap();
        assert_eq!(
            params,
            json!([
                {"name": "item_id", "in": "path", "required": true,
                 "schema": {"title": "Item Id", "type": "integer", "minimum": 1.0}},
                {"name": "x-token", "in": "header", "required": true,
                 "schema": {"title": "X Token", "type": "string"}}
            ])
        );
    }

    #[test]
    fn test_shared_dependency_parameters_listed_once() {
        let shared: Arc<dyn bindery_core::Dependency> = Arc::new(dependency_fn(
            "pagination",
            Signature::new("pagination").param("skip", FieldType::Integer, Query::default_value(0)),
            |args| Ok(args.raw("skip").cloned().unwrap_or_default()),
        ));
        let sig = Signature::new("overview")
            .depends("a", Depends::from_arc(Arc::clone(&shared)))
            .depends("b", Depends::from_arc(shared));

        let mut registry = ViewRegistry::new();
        register(&mut registry, ViewOptions::new().path("/overview").method("GET"), &sig);

        let doc = OpenApiGenerator::new().generate(&registry);
        let op = doc.paths["/overview"].get.as_ref().unwrap();
        assert_eq!(op.parameters.len(), 1);
        assert_eq!(op.parameters[0].name, "skip");
        assert!(!op.parameters[0].required);
    }

    #[test]
    fn test_body_and_form_request_body() {
        let sig = Signature::new("create")
            .param("name", FieldType::String, Body::required().max_length(20))
            .param("tags", FieldType::set(FieldType::String), Body::default_value(json!([])))
            .param("note", FieldType::String, Form::optional());

        let mut registry = ViewRegistry::new();
        register(&mut registry, ViewOptions::new().path("/items").method("POST"), &sig);

        let doc = OpenApiGenerator::new().generate(&registry);
        let op = doc.paths["/items"].post.as_ref().unwrap();
        assert!(op.parameters.is_empty());

        let body = op.request_body.as_ref().unwrap();
        assert!(body.required);
        assert_eq!(
            body.content["application/json"].schema.reference.as_deref(),
            Some("#/components/schemas/Body_create_items_post")
        );
        assert!(body.content.contains_key("application/x-www-form-urlencoded"));

        let schemas = &doc.components.as_ref().unwrap().schemas;
        let json_body = serde_json::to_value(&schemas["Body_create_items_post"]).unwrap();
        assert_eq!(json_body["required"], json!(["name"]));
        assert_eq!(json_body["properties"]["name"]["maxLength"], 20);
        assert_eq!(
            json_body["properties"]["tags"],
            json!({"title": "Tags", "type": "array", "items": {"type": "string"},
                   "uniqueItems": true, "default": []})
        );
        let form = &schemas["Form_create_items_post"];
        assert!(form.required.is_empty());
    }

    #[test]
    fn test_field_schema_constraints() {
        let sig = Signature::new("v").param(
            "size",
            FieldType::String,
            Query::default_value(json!("m"))
                .title("Shirt size")
                .description("Size code")
                .one_of(["s", "m", "l"])
                .pattern("^[sml]$"),
        );
        let meta = ViewMeta::build(ViewOptions::new(), &sig, &ParserFactory::http()).unwrap();
        let schema = field_schema(&meta.schema().fields()[0]);
        assert_eq!(
            serde_json::to_value(&schema).unwrap(),
            json!({
                "title": "Shirt size",
                "type": "string",
                "description": "Size code",
                "enum": ["s", "m", "l"],
                "pattern": "^[sml]$",
                "default": "m"
            })
        );
    }

    #[test]
    fn test_paths_shared_between_views() {
        let mut registry = ViewRegistry::new();
        register(&mut registry, ViewOptions::new().path("/items").method("GET"), &Signature::new("list"));
        register(&mut registry, ViewOptions::new().path("/items").method("POST"), &Signature::new("create"));

        let doc = OpenApiGenerator::new().generate(&registry);
        let item = &doc.paths["/items"];
        assert_eq!(item.operation("get").unwrap().operation_id, "list/items_get");
        assert_eq!(item.operation("post").unwrap().operation_id, "create/items_post");
        assert!(doc.components.is_none());
    }

    #[test]
    fn test_document_info() {
        let json = OpenApiGenerator::new()
            .title("Shop")
            .version("2.0")
            .description("Shop API")
            .terms_of_service("https://shop.test/tos")
            .license("MIT", None)
            .server("https://shop.test", None)
            .tag("items", Some("Item operations".to_owned()))
            .generate_json(&ViewRegistry::new())
            .unwrap();
        let doc: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(doc["openapi"], "3.0.2");
        assert_eq!(doc["info"]["title"], "Shop");
        assert_eq!(doc["info"]["termsOfService"], "https://shop.test/tos");
        assert_eq!(doc["servers"][0]["url"], "https://shop.test");
        assert_eq!(doc["tags"][0]["name"], "items");
        assert_eq!(doc["paths"], json!({}));
    }

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("list items"), "List Items");
        assert_eq!(title_case("x token"), "X Token");
        assert_eq!(title_case("get2fa code"), "Get2Fa Code");
    }
}
