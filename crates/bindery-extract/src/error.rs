//! Extraction error types.
//!
//! An [`ExtractionError`] is an I/O-level failure while reading one request
//! section: a malformed or oversized body, or undecodable bytes. It is not a
//! validation failure. The parser manager logs it and treats the section as
//! contributing no data; required-field validation reports what is missing.

use std::fmt;

use bindery_core::ParamKind;

/// Error that occurs while reading a request section.
///
/// # Example
///
/// ```rust
/// use bindery_extract::ExtractionError;
/// use bindery_core::ParamKind;
///
/// let err = ExtractionError::payload_too_large(1024, 4096);
/// assert_eq!(err.section(), ParamKind::Body);
/// assert!(err.to_string().contains("4096"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionError {
    section: ParamKind,
    kind: ExtractionErrorKind,
    message: String,
}

/// What went wrong while reading a section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionErrorKind {
    /// The body did not parse as the expected format.
    Malformed,
    /// The body exceeded the configured size limit.
    PayloadTooLarge,
    /// Reading the body stream failed.
    Io,
}

impl ExtractionError {
    /// Creates an error for content that failed to parse.
    #[must_use]
    pub fn malformed(section: ParamKind, error: impl fmt::Display) -> Self {
        Self {
            section,
            kind: ExtractionErrorKind::Malformed,
            message: format!("failed to parse {section} data: {error}"),
        }
    }

    /// Creates an error for a payload that's too large.
    #[must_use]
    pub fn payload_too_large(max_size: usize, actual_size: usize) -> Self {
        Self {
            section: ParamKind::Body,
            kind: ExtractionErrorKind::PayloadTooLarge,
            message: format!("payload too large: max {max_size} bytes, got {actual_size} bytes"),
        }
    }

    /// Creates an error for a failed body read.
    #[must_use]
    pub fn io(error: impl fmt::Display) -> Self {
        Self {
            section: ParamKind::Body,
            kind: ExtractionErrorKind::Io,
            message: format!("failed to read body: {error}"),
        }
    }

    /// Returns a copy attributed to another section.
    #[must_use]
    pub fn in_section(mut self, section: ParamKind) -> Self {
        self.section = section;
        self
    }

    /// The section being read.
    #[must_use]
    pub fn section(&self) -> ParamKind {
        self.section
    }

    /// The failure kind.
    #[must_use]
    pub fn kind(&self) -> ExtractionErrorKind {
        self.kind
    }

    /// The error message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for ExtractionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ExtractionError {}
