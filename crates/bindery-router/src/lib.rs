//! Request-binding views for Bindery.
//!
//! A view binds one handler to the parser manager built from its
//! [`Signature`](bindery_core::Signature), plus the metadata the OpenAPI
//! generator reads. Views are collected in an explicit [`ViewRegistry`].
//!
//! # Request Lifecycle
//!
//! ```text
//!   request ──► parse + validate ──► errors? ──yes──► ErrorHandler ──► response
//!                                      │
//!                                      no
//!                                      ▼
//!                         merge over args ──► handler ──► response
//! ```
//!
//! # Example
//!
//! ```rust
//! use bindery_core::{FieldType, Query, Signature, Values};
//! use bindery_extract::{response::JsonResponse, ParserFactory, RequestParts};
//! use bindery_router::{View, ViewMeta, ViewOptions, ViewRegistry};
//! use std::sync::Arc;
//!
//! let sig = Signature::new("search").param("q", FieldType::String, Query::required());
//! let meta = ViewMeta::build(
//!     ViewOptions::new().path("/search").method("GET"),
//!     &sig,
//!     &ParserFactory::http(),
//! )
//! .unwrap();
//! let view = Arc::new(
//!     View::new(meta, |args: Values| JsonResponse::new(args.into_json()).into_response()).unwrap(),
//! );
//!
//! let mut registry = ViewRegistry::new();
//! registry.register(Arc::clone(&view)).unwrap();
//!
//! let req = RequestParts::builder().uri("/search?q=rust").build();
//! assert_eq!(view.call(&req, Values::new()).status(), http::StatusCode::OK);
//! ```

#![doc(html_root_url = "https://docs.rs/bindery-router/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod handler;
mod meta;
mod registry;
mod route;
mod view;

pub use handler::{
    async_handler, error_handler_fn, AsyncHandler, ErrorHandler, FnErrorHandler, JsonErrorHandler,
    SyncHandler,
};
pub use meta::{ViewMeta, ViewOptions};
pub use registry::{RegisteredView, ViewRegistry};
pub use route::{match_path, BufferedRequest, Route, RoutedRequest};
pub use view::{AsyncView, View};
