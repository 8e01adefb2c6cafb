//! # Bindery Core
//!
//! Core types for the Bindery request-binding layer.
//!
//! This crate provides the registration-time building blocks that the
//! extraction, routing and documentation crates share:
//!
//! - **Descriptors**: [`Query`], [`Header`], [`Path`], [`Cookie`], [`Form`],
//!   [`Body`] and [`Depends`], attached to declared parameters
//! - **Signatures**: [`Signature`] and the [`SignatureModel`] builder that
//!   turns them into a [`ValidationSchema`]
//! - **Validation**: the [`Validator`] seam and the built-in [`SchemaValidator`]
//! - **Dependencies**: the [`Dependency`] trait, [`dependency_fn`] and the
//!   per-request [`DependencyCache`]
//! - **Errors**: [`RegistrationError`] for setup, [`FieldError`] and
//!   [`BindError`] for requests
//!
//! ## Example
//!
//! ```
//! use bindery_core::{FieldType, Query, Signature, SignatureModel, BuildOptions};
//!
//! let sig = Signature::new("list_items")
//!     .param("q", FieldType::String, Query::required())
//!     .param("limit", FieldType::Integer, Query::default_value(10).le(100.0));
//!
//! let model = SignatureModel::build(&sig, &BuildOptions {
//!     model_name: None,
//!     skip_receiver: false,
//!     supported: &|_| true,
//! })
//! .unwrap();
//! assert_eq!(model.schema.fields().len(), 2);
//! ```

#![doc(html_root_url = "https://docs.rs/bindery-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod di;
pub mod error;
pub mod params;
pub mod signature;
pub mod validate;
pub mod values;

pub use di::{
    async_dependency_fn, dependency_fn, CacheEntry, Dependency, DependencyCache, DependencyError,
    DependencyId, DependencyResult, Depends,
};
pub use error::{BindError, FieldError, RegistrationError, RegistrationResult};
pub use params::{
    Body, Constraints, Cookie, DefaultValue, Descriptor, FieldType, Form, Header, Param,
    ParamKind, Path, Query,
};
pub use signature::{
    BuildOptions, ParamDecl, SchemaField, Signature, SignatureModel, ValidationSchema,
};
pub use validate::{SchemaValidator, Validation, Validator};
pub use values::{RawValues, ValueError, Values};
