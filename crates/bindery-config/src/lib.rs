//! Registration-time configuration for Bindery.
//!
//! [`BinderyConfig`] is read from TOML or JSON by [`ConfigLoader`], which
//! layers defaults, one file and `BINDERY__*` variables in that order.
//! Unknown keys are rejected. [`Setup`] turns the `mode` into the parser
//! factory and error handlers that view registration needs. A custom
//! [`ParserFactory`](bindery_extract::ParserFactory) can replace the mode.
//!
//! # Example
//!
//! ```no_run
//! use bindery_config::{ConfigLoader, Setup};
//!
//! # fn main() -> Result<(), bindery_config::ConfigError> {
//! let config = ConfigLoader::new()
//!     .with_optional_file("bindery.toml")?
//!     .with_env_prefix("BINDERY")
//!     .load()?;
//! let setup = Setup::from_config(&config)?;
//! # Ok(())
//! # }
//! ```
//!
//! # `bindery.toml`
//!
//! ```toml
//! mode = "http"
//!
//! [openapi]
//! openapi_url = "/openapi.json"
//! docs_url = "/docs"
//! title = "Shop"
//! version = "1.0.0"
//!
//! [telemetry.logging]
//! level = "info"
//! format = "json"
//!
//! [telemetry.metrics]
//! enabled = true
//! ```
//!
//! # Overrides
//!
//! - `BINDERY__MODE=query`
//! - `BINDERY__OPENAPI__TITLE=Shop`
//! - `BINDERY__TELEMETRY__LOGGING__FORMAT=pretty`
//! - `BINDERY__TELEMETRY__LOGGING__SOURCE_LOCATION=true`
//!
//! Every field of `[openapi]` and `[telemetry.*]` has a variable named after
//! its path.

#![warn(missing_docs)]

mod config;
mod error;
mod loader;
mod setup;

pub use config::{BinderyConfig, OpenApiConfig};
pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use setup::{Mode, Setup};
