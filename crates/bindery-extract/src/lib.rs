//! # Bindery Extract
//!
//! Request representations, source parsers and parser managers.
//!
//! A view's [`ParserManager`] is built once at registration by a
//! [`ParserFactory`]. On each request it runs one [`SourceParser`] per
//! section its schema uses, validates the merged raw values, and resolves
//! dependencies against a per-request cache.
//!
//! ## Sections
//!
//! | Parser | Kind | Source |
//! |--------|------|--------|
//! | [`QueryParser`] | `query` | URL query string |
//! | [`HeaderParser`] | `header` | Headers, case-insensitive |
//! | [`PathParser`] | `path` | Router-captured path parameters |
//! | [`CookieParser`] | `cookie` | `Cookie` headers |
//! | [`FormParser`] | `form` | Urlencoded body |
//! | [`JsonBodyParser`] | `body` | JSON body |
//!
//! Scalar fields take the first value of a multi-valued section; fields
//! declared as sequences of scalars take every value.
//!
//! ## Example
//!
//! ```rust
//! use bindery_core::{DependencyCache, FieldType, Query, Signature};
//! use bindery_extract::{ManagerOptions, ParserFactory, RequestParts};
//!
//! let sig = Signature::new("search")
//!     .param("q", FieldType::String, Query::required())
//!     .param("tag", FieldType::array(FieldType::String), Query::default_value(Vec::<String>::new()));
//! let manager = ParserFactory::http()
//!     .manager(&sig, &ManagerOptions::default())
//!     .unwrap();
//!
//! let req = RequestParts::builder().uri("/search?q=rust&tag=a&tag=b").build();
//! let parsed = manager.parse(&req, &mut DependencyCache::new());
//! assert!(parsed.is_ok());
//! assert_eq!(parsed.values.get::<Vec<String>>("tag").unwrap(), ["a", "b"]);
//! ```
//!
//! ## Error Handling
//!
//! An unreadable section is an [`ExtractionError`]. The manager logs it and
//! treats the section as empty, so validation reports whatever it was
//! expected to provide.

#![doc(html_root_url = "https://docs.rs/bindery-extract/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod context;
mod error;
mod factory;
mod manager;
mod parser;
mod request;
pub mod response;
mod streaming;

pub use context::{RequestParts, RequestPartsBuilder};
pub use error::{ExtractionError, ExtractionErrorKind};
pub use factory::{ParserConstructor, ParserFactory};
pub use manager::{DependencyNode, ManagerOptions, ParserManager, Parsed, MAX_DEPENDENCY_DEPTH};
pub use parser::{
    CookieParser, FieldGetter, FieldGetters, FormParser, Getter, HeaderParser, JsonBodyParser,
    PathParser, QueryParser, SourceParser,
};
pub use request::{AsyncRequestSource, MultiMap, RequestSource, DEFAULT_MAX_BODY_SIZE};
pub use streaming::{BodyStream, StreamingRequest};
