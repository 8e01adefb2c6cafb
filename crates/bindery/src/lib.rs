//! # Bindery
//!
//! **Request-parameter binding for HTTP handlers**
//!
//! Bindery reads a handler's declared parameters, extracts matching values
//! from a request, validates and coerces them, resolves dependencies, and
//! reports every problem as a structured error list. The same parameter
//! metadata feeds an OpenAPI document.
//!
//! - **Declarative parameters**: `Query`, `Header`, `Path`, `Cookie`, `Form`
//!   and `Body` descriptors with defaults, aliases and constraints
//! - **Dependencies**: callables with their own parameters, cached per request
//! - **Blocking and async views** that bind identically
//! - **OpenAPI 3** document and Swagger UI page from the registered views
//!
//! ## Quick Start
//!
//! ```rust
//! use bindery::prelude::*;
//!
//! let mut app = Bindery::setup("http").unwrap();
//!
//! let sig = Signature::new("list_items")
//!     .param("q", FieldType::String, Query::required())
//!     .param("limit", FieldType::Integer, Query::default_value(10).le(100.0));
//! let view = app
//!     .view(ViewOptions::new().path("/items").method("GET"), &sig, |args: Values| {
//!         JsonResponse::new(args.into_json()).into_response()
//!     })
//!     .unwrap();
//!
//! let req = RequestParts::builder().uri("/items?q=lamp").build();
//! let response = view.call(&req, Values::new());
//! assert_eq!(response.status(), http::StatusCode::OK);
//!
//! let bad = RequestParts::builder().uri("/items?limit=500").build();
//! assert_eq!(view.call(&bad, Values::new()).status(), 422);
//! ```
//!
//! ## Architecture
//!
//! ```text
//!  Signature ──► SignatureModel ──► ParserManager ──► View ──► ViewRegistry ──► OpenAPI
//!                 (schema + deps)    (parsers +        (handler +
//!                                     dependency nodes) error handler)
//! ```

#![doc(html_root_url = "https://docs.rs/bindery/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod app;

pub use app::Bindery;

// Re-export core types
pub use bindery_core as core;

// Re-export extraction types
pub use bindery_extract as extract;

// Re-export view and registry types
pub use bindery_router as router;

// Re-export documentation types
pub use bindery_docs as docs;

// Re-export configuration types
pub use bindery_config as config;

// Re-export telemetry types
pub use bindery_telemetry as telemetry;

pub use bindery_telemetry::{init_telemetry, TelemetryConfig};

/// Prelude module for convenient imports.
///
/// ```rust
/// use bindery::prelude::*;
/// ```
pub mod prelude {
    pub use crate::Bindery;

    pub use bindery_core::{
        async_dependency_fn, dependency_fn, Body, Cookie, Dependency, DependencyError, Depends,
        FieldError, FieldType, Form, Header, Path, Query, RegistrationError, RegistrationResult,
        Signature, Values,
    };

    pub use bindery_extract::response::{HtmlResponse, JsonResponse};
    pub use bindery_extract::{ParserFactory, RequestParts, StreamingRequest};

    pub use bindery_router::{
        error_handler_fn, AsyncView, ErrorHandler, JsonErrorHandler, View, ViewOptions,
        ViewRegistry,
    };

    pub use bindery_docs::{OpenApi, OpenApiGenerator, SwaggerUi};

    pub use bindery_config::{BinderyConfig, ConfigLoader, Setup};
}
