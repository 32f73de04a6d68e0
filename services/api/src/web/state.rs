//! services/api/src/web/state.rs
//!
//! Defines the application's shared state and the principal extraction
//! helpers used by every handler.

use axum::http::HeaderMap;
use std::sync::Arc;
use uuid::Uuid;

use crate::config::Config;
use crate::error::ApiError;
use courseforge_core::content::ContentService;
use courseforge_core::courses::CourseService;
use courseforge_core::domain::{Principal, Role};
use courseforge_core::generation::GenerationOrchestrator;
use courseforge_core::upload::UploadOrchestrator;

//=========================================================================================
// AppState (Shared Across All Connections)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub courses: CourseService,
    pub contents: ContentService,
    pub generator: GenerationOrchestrator,
    pub uploader: UploadOrchestrator,
}

//=========================================================================================
// Principal Extraction
//=========================================================================================

/// Builds the requesting principal from the `x-user-id` and `x-user-role`
/// headers issued by the upstream auth layer. The role defaults to
/// `student` when the header is absent.
pub fn principal_from_headers(headers: &HeaderMap) -> Result<Principal, ApiError> {
    optional_principal(headers)?
        .ok_or_else(|| ApiError::BadRequest("x-user-id header is required".to_string()))
}

/// Like `principal_from_headers`, but tolerates an absent `x-user-id` for
/// endpoints that serve anonymous readers. Malformed headers still fail.
pub fn optional_principal(headers: &HeaderMap) -> Result<Option<Principal>, ApiError> {
    let Some(user_id_str) = headers.get("x-user-id").and_then(|v| v.to_str().ok()) else {
        return Ok(None);
    };
    let user_id = Uuid::parse_str(user_id_str)
        .map_err(|_| ApiError::BadRequest("Invalid x-user-id format".to_string()))?;

    let role = match headers.get("x-user-role").and_then(|v| v.to_str().ok()) {
        Some(raw) => raw
            .parse::<Role>()
            .map_err(|_| ApiError::BadRequest(format!("Invalid x-user-role: '{raw}'")))?,
        None => Role::Student,
    };

    Ok(Some(Principal::new(user_id, role)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn extracts_principal_with_role() {
        let mut headers = HeaderMap::new();
        let id = Uuid::new_v4();
        headers.insert("x-user-id", HeaderValue::from_str(&id.to_string()).unwrap());
        headers.insert("x-user-role", HeaderValue::from_static("instructor"));

        let principal = principal_from_headers(&headers).unwrap();
        assert_eq!(principal.id, id);
        assert_eq!(principal.role, Role::Instructor);
    }

    #[test]
    fn role_defaults_to_student() {
        let mut headers = HeaderMap::new();
        let id = Uuid::new_v4();
        headers.insert("x-user-id", HeaderValue::from_str(&id.to_string()).unwrap());

        let principal = principal_from_headers(&headers).unwrap();
        assert_eq!(principal.role, Role::Student);
    }

    #[test]
    fn missing_user_is_anonymous_not_an_error() {
        let headers = HeaderMap::new();
        assert!(optional_principal(&headers).unwrap().is_none());
        assert!(principal_from_headers(&headers).is_err());
    }

    #[test]
    fn malformed_headers_are_rejected() {
        let mut headers = HeaderMap::new();
        headers.insert("x-user-id", HeaderValue::from_static("not-a-uuid"));
        assert!(optional_principal(&headers).is_err());

        let mut headers = HeaderMap::new();
        let id = Uuid::new_v4();
        headers.insert("x-user-id", HeaderValue::from_str(&id.to_string()).unwrap());
        headers.insert("x-user-role", HeaderValue::from_static("emperor"));
        assert!(optional_principal(&headers).is_err());
    }
}
