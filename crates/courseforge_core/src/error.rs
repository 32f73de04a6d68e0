//! crates/courseforge_core/src/error.rs
//!
//! The error taxonomy for the core. Every failure a caller can see maps to
//! one of these kinds plus a human-readable message; nothing is swallowed
//! inside the core and nothing is retried automatically.

use crate::ports::PortError;

/// The primary error type for all core operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A malformed or missing required field. The caller's fault, never retried.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// A referenced Course, Module, Lesson or Content record is absent.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The ownership check failed.
    #[error("Access denied: {0}")]
    Forbidden(String),

    /// The generation collaborator replied, but the reply could not be parsed
    /// into the expected shape. Surfaced to the caller, not retried.
    #[error("Failed to parse AI response: {0}")]
    GenerationParse(String),

    /// A media kind the generation path does not support.
    #[error("Unsupported media type: {0}")]
    UnsupportedMediaType(String),

    /// The storage collaborator failed during an upload. No partial Content
    /// record is created.
    #[error("File upload failed: {0}")]
    Upload(String),

    /// A course was removed but the cascade delete of its Content records
    /// failed part-way. Surfaced distinctly so callers can reconcile.
    #[error("Course deleted but content cascade failed: {0}")]
    Cascade(String),

    /// An unexpected failure inside an external collaborator.
    #[error("Collaborator error: {0}")]
    Collaborator(String),
}

impl From<PortError> for Error {
    fn from(err: PortError) -> Self {
        match err {
            PortError::NotFound(msg) => Error::NotFound(msg),
            PortError::Parse(msg) => Error::GenerationParse(msg),
            PortError::Unsupported(msg) => Error::UnsupportedMediaType(msg),
            PortError::Unexpected(msg) => Error::Collaborator(msg),
        }
    }
}

/// A convenience type alias for `Result<T, Error>`.
pub type CoreResult<T> = Result<T, Error>;
