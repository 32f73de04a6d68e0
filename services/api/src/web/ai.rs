//! services/api/src/web/ai.rs
//!
//! Axum handlers for the AI generation endpoints: course outlines, lesson
//! drafts, quizzes and media content.

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json},
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::ApiError;
use crate::web::state::{principal_from_headers, AppState};
use courseforge_core::domain::{Content, ContentKind, GenerationConfig};
use courseforge_core::generation::{
    LessonRequest, MediaRequest, OutlineRequest, Placement, QuestionType, QuizDifficulty,
    QuizRequest,
};

//=========================================================================================
// API Payload Structs
//=========================================================================================

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OutlinePayload {
    pub title: String,
    pub description: String,
    pub category: String,
    pub level: String,
    #[serde(default)]
    pub learning_outcomes: Vec<String>,
    #[serde(default)]
    pub target_audience: Vec<String>,
    /// When present, the caller must own this course.
    pub course_id: Option<Uuid>,
    #[schema(value_type = Object)]
    pub config: Option<GenerationConfig>,
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LessonPayload {
    pub module_title: String,
    pub lesson_title: String,
    pub lesson_description: Option<String>,
    pub previous_content: Option<String>,
    pub course_id: Option<Uuid>,
    #[schema(value_type = Object)]
    pub config: Option<GenerationConfig>,
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QuizPayload {
    pub lesson_content: String,
    pub difficulty: Option<String>,
    pub question_count: Option<u8>,
    #[serde(default)]
    pub question_types: Vec<String>,
    pub course_id: Option<Uuid>,
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MediaItemPayload {
    pub prompt: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub style: Option<String>,
    pub size: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub module_id: Uuid,
    pub lesson_id: Uuid,
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MediaPayload {
    pub course_id: Uuid,
    pub prompt: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub style: Option<String>,
    pub size: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub module_id: Uuid,
    pub lesson_id: Uuid,
    #[schema(value_type = Object)]
    pub config: Option<GenerationConfig>,
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MediaBatchPayload {
    pub course_id: Uuid,
    pub items: Vec<MediaItemPayload>,
    #[schema(value_type = Object)]
    pub config: Option<GenerationConfig>,
}

/// One entry of a batch response. Failed items carry the error message
/// instead of aborting the whole batch.
#[derive(Serialize)]
#[serde(rename_all = "camelCase", tag = "status")]
pub enum BatchEntry {
    Fulfilled {
        #[serde(rename = "type")]
        kind: ContentKind,
        content: Box<Content>,
    },
    Rejected {
        #[serde(rename = "type")]
        kind: ContentKind,
        error: String,
    },
}

impl MediaItemPayload {
    fn into_request(self) -> Result<MediaRequest, ApiError> {
        Ok(MediaRequest {
            prompt: self.prompt,
            kind: self.kind.parse::<ContentKind>()?,
            style: self.style.unwrap_or_else(|| "realistic".to_string()),
            size: self.size,
            title: self.title,
            description: self.description,
            placement: Placement {
                module: self.module_id,
                lesson: self.lesson_id,
            },
        })
    }
}

//=========================================================================================
// Generation Handlers
//=========================================================================================

/// Generate a structured course outline.
#[utoipa::path(
    post,
    path = "/ai/outline",
    request_body = OutlinePayload,
    responses(
        (status = 200, description = "The generated outline"),
        (status = 502, description = "The model reply could not be parsed"),
    ),
    params(("x-user-id" = Uuid, Header, description = "The unique ID of the instructor."))
)]
pub async fn generate_outline_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<OutlinePayload>,
) -> Result<impl IntoResponse, ApiError> {
    let principal = principal_from_headers(&headers)?;
    let config = payload.config.unwrap_or_default();
    let request = OutlineRequest {
        title: payload.title,
        description: payload.description,
        category: payload.category,
        level: payload.level,
        learning_outcomes: payload.learning_outcomes,
        target_audience: payload.target_audience,
    };

    let outline = state
        .generator
        .generate_outline(&principal, payload.course_id, &request, &config)
        .await?;
    Ok(Json(serde_json::json!({ "outline": outline })))
}

/// Generate a lesson body draft.
#[utoipa::path(
    post,
    path = "/ai/lesson",
    request_body = LessonPayload,
    responses((status = 200, description = "The generated lesson draft")),
    params(("x-user-id" = Uuid, Header, description = "The unique ID of the instructor."))
)]
pub async fn generate_lesson_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<LessonPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let principal = principal_from_headers(&headers)?;
    let config = payload.config.unwrap_or_default();
    let request = LessonRequest {
        module_title: payload.module_title,
        lesson_title: payload.lesson_title,
        lesson_description: payload.lesson_description,
        previous_content: payload.previous_content,
    };

    let draft = state
        .generator
        .generate_lesson(&principal, payload.course_id, &request, &config)
        .await?;
    Ok(Json(serde_json::json!({
        "content": draft.content,
        "estimatedReadingMinutes": draft.estimated_reading_minutes,
        "suggestedMedia": draft.suggested_media,
    })))
}

/// Generate a quiz from lesson content.
#[utoipa::path(
    post,
    path = "/ai/quiz",
    request_body = QuizPayload,
    responses((status = 200, description = "The generated quiz")),
    params(("x-user-id" = Uuid, Header, description = "The unique ID of the instructor."))
)]
pub async fn generate_quiz_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<QuizPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let principal = principal_from_headers(&headers)?;

    let difficulty = payload
        .difficulty
        .as_deref()
        .map(str::parse::<QuizDifficulty>)
        .transpose()?
        .unwrap_or_default();
    let question_types = if payload.question_types.is_empty() {
        vec![QuestionType::MultipleChoice]
    } else {
        payload
            .question_types
            .iter()
            .map(|t| t.parse::<QuestionType>())
            .collect::<Result<Vec<_>, _>>()?
    };
    let request = QuizRequest {
        lesson_content: payload.lesson_content,
        difficulty,
        question_count: payload.question_count.unwrap_or(5),
        question_types,
    };

    let quiz = state
        .generator
        .generate_quiz(&principal, payload.course_id, &request)
        .await?;
    Ok(Json(serde_json::json!({ "quiz": quiz })))
}

/// Generate one piece of media content and attach it to a lesson.
#[utoipa::path(
    post,
    path = "/ai/media",
    request_body = MediaPayload,
    responses(
        (status = 201, description = "The generated content record"),
        (status = 415, description = "Kind cannot be generated as media"),
    ),
    params(("x-user-id" = Uuid, Header, description = "The unique ID of the instructor."))
)]
pub async fn generate_media_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<MediaPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let principal = principal_from_headers(&headers)?;
    let config = payload.config.unwrap_or_default();
    let request = MediaItemPayload {
        prompt: payload.prompt,
        kind: payload.kind,
        style: payload.style,
        size: payload.size,
        title: payload.title,
        description: payload.description,
        module_id: payload.module_id,
        lesson_id: payload.lesson_id,
    }
    .into_request()?;

    let content = state
        .generator
        .generate_media(&principal, payload.course_id, &request, &config)
        .await?;
    Ok((StatusCode::CREATED, Json(content)))
}

/// Generate several media items concurrently. Items succeed or fail
/// independently; the response reports each outcome.
#[utoipa::path(
    post,
    path = "/ai/media/batch",
    request_body = MediaBatchPayload,
    responses((status = 200, description = "Per-item outcomes")),
    params(("x-user-id" = Uuid, Header, description = "The unique ID of the instructor."))
)]
pub async fn generate_media_batch_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<MediaBatchPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let principal = principal_from_headers(&headers)?;
    let config = payload.config.unwrap_or_default();
    let requests = payload
        .items
        .into_iter()
        .map(MediaItemPayload::into_request)
        .collect::<Result<Vec<_>, _>>()?;

    let outcomes = state
        .generator
        .generate_media_batch(&principal, payload.course_id, &requests, &config)
        .await?;

    let entries: Vec<BatchEntry> = outcomes
        .into_iter()
        .map(|outcome| match outcome.outcome {
            Ok(content) => BatchEntry::Fulfilled {
                kind: outcome.kind,
                content: Box::new(content),
            },
            Err(e) => BatchEntry::Rejected {
                kind: outcome.kind,
                error: e.to_string(),
            },
        })
        .collect();
    Ok(Json(entries))
}
