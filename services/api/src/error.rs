//! services/api/src/error.rs
//!
//! Defines the primary error type for the entire API service and its
//! mapping onto HTTP responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde_json::json;
use tracing::error;

use crate::config::ConfigError;
use courseforge_core::error::Error as CoreError;
use courseforge_core::ports::PortError;

/// The primary error type for the `api` service.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Represents an error that occurred during configuration loading.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Represents an error raised by the core services.
    #[error("{0}")]
    Core(#[from] CoreError),

    /// Represents an error that propagated up from one of the core service ports.
    #[error("Service Port Error: {0}")]
    Port(#[from] PortError),

    /// Represents an error from the underlying database library.
    #[error("Database Error: {0}")]
    Database(#[from] sqlx::Error),

    /// A malformed request that never reached the core.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Represents a standard Input/Output error (e.g., binding to a network socket).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A catch-all for any other unexpected errors.
    #[error("An unexpected internal error occurred: {0}")]
    Internal(String),
}

impl ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::Core(CoreError::Validation(_)) | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Core(CoreError::Forbidden(_)) => StatusCode::FORBIDDEN,
            Self::Core(CoreError::NotFound(_)) | Self::Port(PortError::NotFound(_)) => {
                StatusCode::NOT_FOUND
            }
            Self::Core(CoreError::UnsupportedMediaType(_)) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            Self::Core(CoreError::GenerationParse(_))
            | Self::Core(CoreError::Collaborator(_))
            | Self::Core(CoreError::Upload(_)) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            error!("internal error: {self}");
        }
        let body = Json(json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}
