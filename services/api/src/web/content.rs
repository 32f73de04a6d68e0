//! services/api/src/web/content.rs
//!
//! Axum handlers for standalone content records: direct uploads, processing
//! callbacks, archival, queries and the per-kind aggregation.

use axum::{
    extract::{Multipart, Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json},
};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::ApiError;
use crate::web::state::{optional_principal, principal_from_headers, AppState};
use courseforge_core::authz::{self, CourseAction};
use courseforge_core::domain::{ContentKind, ContentStatus, Principal, Role};
use courseforge_core::ports::{ContentFilter, UploadSource};
use courseforge_core::upload::UploadRequest;

//=========================================================================================
// API Payload Structs
//=========================================================================================

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStatusPayload {
    pub progress: u8,
    pub status: Option<String>,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ContentListQuery {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub status: Option<String>,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct StatsQuery {
    pub created_by: Option<Uuid>,
}

#[derive(Deserialize, Default)]
pub struct AiListQuery {
    pub limit: Option<u32>,
}

/// Verifies that the principal may mutate content belonging to `course_id`.
async fn require_course_owner(
    state: &AppState,
    principal: &Principal,
    course_id: Uuid,
) -> Result<(), ApiError> {
    let course = state.courses.get_course(course_id, Some(principal)).await?;
    authz::require(Some(principal), Some(&course), CourseAction::Modify)?;
    Ok(())
}

//=========================================================================================
// Upload Handler
//=========================================================================================

/// Upload a file and attach it to a lesson as a ready content record.
///
/// Accepts multipart/form-data with a `file` part plus `courseId`,
/// `moduleId`, `lessonId`, `type` and `title` text parts. `description`
/// and comma-separated `tags` are optional.
#[utoipa::path(
    post,
    path = "/content/upload",
    request_body(content_type = "multipart/form-data", description = "The file and its placement."),
    responses(
        (status = 201, description = "Content stored and recorded"),
        (status = 400, description = "Missing part or malformed field"),
        (status = 502, description = "The media store rejected the file"),
    ),
    params(("x-user-id" = Uuid, Header, description = "The unique ID of the instructor."))
)]
pub async fn upload_content_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let principal = principal_from_headers(&headers)?;

    let mut file: Option<(bytes::Bytes, String)> = None;
    let mut course_id: Option<Uuid> = None;
    let mut module_id: Option<Uuid> = None;
    let mut lesson_id: Option<Uuid> = None;
    let mut kind: Option<ContentKind> = None;
    let mut title: Option<String> = None;
    let mut description: Option<String> = None;
    let mut tags: Vec<String> = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Failed to read multipart data: {e}")))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                let file_name = field.file_name().unwrap_or("upload.bin").to_string();
                let data = field.bytes().await.map_err(|e| {
                    ApiError::BadRequest(format!("Failed to read file bytes: {e}"))
                })?;
                file = Some((data, file_name));
            }
            "courseId" => course_id = Some(parse_uuid_field(&name, field).await?),
            "moduleId" => module_id = Some(parse_uuid_field(&name, field).await?),
            "lessonId" => lesson_id = Some(parse_uuid_field(&name, field).await?),
            "type" => {
                let raw = text_field(&name, field).await?;
                kind = Some(raw.parse::<ContentKind>()?);
            }
            "title" => title = Some(text_field(&name, field).await?),
            "description" => description = Some(text_field(&name, field).await?),
            "tags" => {
                tags = text_field(&name, field)
                    .await?
                    .split(',')
                    .map(|t| t.trim().to_string())
                    .filter(|t| !t.is_empty())
                    .collect();
            }
            _ => {}
        }
    }

    let (data, file_name) =
        file.ok_or_else(|| ApiError::BadRequest("a 'file' part is required".to_string()))?;
    let course = course_id
        .ok_or_else(|| ApiError::BadRequest("a 'courseId' part is required".to_string()))?;
    let module = module_id
        .ok_or_else(|| ApiError::BadRequest("a 'moduleId' part is required".to_string()))?;
    let lesson = lesson_id
        .ok_or_else(|| ApiError::BadRequest("a 'lessonId' part is required".to_string()))?;
    let kind =
        kind.ok_or_else(|| ApiError::BadRequest("a 'type' part is required".to_string()))?;
    let title =
        title.ok_or_else(|| ApiError::BadRequest("a 'title' part is required".to_string()))?;

    let content = state
        .uploader
        .upload(
            &principal,
            UploadRequest {
                course,
                module,
                lesson,
                kind,
                title,
                description,
                tags,
                source: UploadSource::Bytes { data, file_name },
            },
        )
        .await?;
    Ok((StatusCode::CREATED, Json(content)))
}

async fn text_field(name: &str, field: axum::extract::multipart::Field<'_>) -> Result<String, ApiError> {
    field
        .text()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Failed to read '{name}' field: {e}")))
}

async fn parse_uuid_field(
    name: &str,
    field: axum::extract::multipart::Field<'_>,
) -> Result<Uuid, ApiError> {
    let raw = text_field(name, field).await?;
    Uuid::parse_str(raw.trim())
        .map_err(|_| ApiError::BadRequest(format!("'{name}' is not a valid UUID")))
}

//=========================================================================================
// Query Handlers
//=========================================================================================

/// List the content records of a course, optionally narrowed by kind and status.
#[utoipa::path(
    get,
    path = "/courses/{id}/content",
    responses((status = 200, description = "Content records, newest first")),
    params(("id" = Uuid, Path, description = "Course id"))
)]
pub async fn list_course_content_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
    Query(query): Query<ContentListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let principal = optional_principal(&headers)?;
    // Visibility follows the course itself.
    state.courses.get_course(id, principal.as_ref()).await?;

    let filter = ContentFilter {
        kind: query
            .kind
            .as_deref()
            .map(str::parse::<ContentKind>)
            .transpose()?,
        status: query
            .status
            .as_deref()
            .map(str::parse::<ContentStatus>)
            .transpose()?,
    };
    let contents = state.contents.find_by_course(id, filter).await?;
    Ok(Json(contents))
}

/// Fetch one content record.
#[utoipa::path(
    get,
    path = "/content/{id}",
    responses(
        (status = 200, description = "The content record"),
        (status = 404, description = "No such content"),
    ),
    params(("id" = Uuid, Path, description = "Content id"))
)]
pub async fn get_content_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let content = state.contents.fetch(id).await?;
    Ok(Json(content))
}

/// Recently AI-generated content across all courses.
#[utoipa::path(
    get,
    path = "/content/ai-generated",
    responses((status = 200, description = "AI-generated content, newest first"))
)]
pub async fn list_ai_content_handler(
    State(state): State<AppState>,
    Query(query): Query<AiListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let contents = state
        .contents
        .find_ai_generated(query.limit.unwrap_or(20).min(100))
        .await?;
    Ok(Json(contents))
}

/// Per-kind content statistics. Admins may aggregate globally or scope to
/// any creator; everyone else sees their own content only.
#[utoipa::path(
    get,
    path = "/content/stats",
    responses((status = 200, description = "Counts, sizes and durations grouped by kind")),
    params(("x-user-id" = Uuid, Header, description = "The unique ID of the caller."))
)]
pub async fn content_stats_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<StatsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let principal = principal_from_headers(&headers)?;
    let scope = if principal.role == Role::Admin {
        query.created_by
    } else {
        Some(principal.id)
    };
    let stats = state.contents.stats(scope).await?;
    Ok(Json(stats))
}

//=========================================================================================
// Mutation Handlers
//=========================================================================================

/// Apply a processing-progress callback to a content record.
#[utoipa::path(
    patch,
    path = "/content/{id}/status",
    request_body = UpdateStatusPayload,
    responses((status = 200, description = "The updated record")),
    params(("id" = Uuid, Path, description = "Content id"))
)]
pub async fn update_content_status_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateStatusPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let principal = principal_from_headers(&headers)?;
    let content = state.contents.fetch(id).await?;
    require_course_owner(&state, &principal, content.course).await?;

    let status = payload
        .status
        .as_deref()
        .map(str::parse::<ContentStatus>)
        .transpose()?;
    let content = state
        .contents
        .update_processing_status(id, payload.progress, status)
        .await?;
    Ok(Json(content))
}

/// Retire a ready content record.
#[utoipa::path(
    post,
    path = "/content/{id}/archive",
    responses(
        (status = 200, description = "The archived record"),
        (status = 400, description = "Record is still processing"),
    ),
    params(("id" = Uuid, Path, description = "Content id"))
)]
pub async fn archive_content_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let principal = principal_from_headers(&headers)?;
    let content = state.contents.fetch(id).await?;
    require_course_owner(&state, &principal, content.course).await?;

    let content = state.contents.archive(id).await?;
    Ok(Json(content))
}

/// Delete a content record.
#[utoipa::path(
    delete,
    path = "/content/{id}",
    responses((status = 204, description = "Content deleted")),
    params(("id" = Uuid, Path, description = "Content id"))
)]
pub async fn delete_content_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let principal = principal_from_headers(&headers)?;
    let content = state.contents.fetch(id).await?;
    require_course_owner(&state, &principal, content.course).await?;

    state.contents.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
