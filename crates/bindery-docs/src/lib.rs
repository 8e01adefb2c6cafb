//! # Bindery Docs
//!
//! OpenAPI documentation for Bindery views.
//!
//! This crate provides:
//! - an **OpenAPI 3 document model** ([`OpenApi`] and friends)
//! - an **OpenAPI generator** that walks a [`ViewRegistry`](bindery_router::ViewRegistry)
//! - a **Swagger UI** page pointing at the served document
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use bindery_core::{FieldType, Query, Signature, Values};
//! use bindery_docs::{OpenApiGenerator, SwaggerUi};
//! use bindery_extract::{response::JsonResponse, ParserFactory};
//! use bindery_router::{View, ViewMeta, ViewOptions, ViewRegistry};
//!
//! let sig = Signature::new("list_items").param("q", FieldType::String, Query::required());
//! let meta = ViewMeta::build(
//!     ViewOptions::new().path("/items").method("GET"),
//!     &sig,
//!     &ParserFactory::http(),
//! )
//! .unwrap();
//! let view = View::new(meta, |args: Values| JsonResponse::new(args.into_json()).into_response())
//!     .unwrap();
//!
//! let mut registry = ViewRegistry::new();
//! registry.register(Arc::new(view)).unwrap();
//!
//! let doc = OpenApiGenerator::new().title("Shop").generate(&registry);
//! let op = doc.paths["/items"].get.as_ref().unwrap();
//! assert_eq!(op.parameters[0].name, "q");
//!
//! let page = SwaggerUi::new("/openapi.json").html();
//! assert!(page.contains("swagger-ui"));
//! ```

#![doc(html_root_url = "https://docs.rs/bindery-docs/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod error;
mod generator;
mod openapi;
mod swagger;

pub use error::{DocsError, DocsResult};
pub use generator::{field_schema, OpenApiGenerator, DEFAULT_OPENAPI_VERSION};
pub use openapi::{
    Components, Contact, Info, License, MediaType, OpenApi, Operation, Parameter, ParameterIn,
    PathItem, RequestBody, Response, Schema, SchemaType, Server, Tag,
};
pub use swagger::{DocExpansion, SwaggerUi, DEFAULT_SWAGGER_CDN};
