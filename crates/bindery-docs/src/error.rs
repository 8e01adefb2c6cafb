//! Rendering errors.

use thiserror::Error;

/// The document could not be rendered.
#[derive(Debug, Error)]
pub enum DocsError {
    /// A schema default or example holds a value JSON cannot represent.
    #[error("OpenAPI document is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result of rendering.
pub type DocsResult<T> = Result<T, DocsError>;
