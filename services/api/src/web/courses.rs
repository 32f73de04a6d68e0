//! services/api/src/web/courses.rs
//!
//! Axum handlers for the course catalog: CRUD on courses plus module and
//! lesson appends. All mutating routes resolve the principal from headers
//! and let the core's ownership guard decide.

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json},
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::ApiError;
use crate::web::state::{optional_principal, principal_from_headers, AppState};
use courseforge_core::courses::{CoursePatch, NewCourse, NewLesson, NewModule, Page};
use courseforge_core::domain::{
    Course, CourseCategory, CourseLevel, CourseStatus, GenerationConfig,
};
use courseforge_core::ports::{CourseQuery, CourseSort};

//=========================================================================================
// API Payload Structs
//=========================================================================================

/// Payload for creating a course.
#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateCoursePayload {
    pub title: String,
    pub description: String,
    pub short_description: Option<String>,
    pub category: String,
    pub level: Option<String>,
    pub price: Option<f64>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub requirements: Vec<String>,
    #[serde(default)]
    pub learning_outcomes: Vec<String>,
    #[serde(default)]
    pub target_audience: Vec<String>,
    #[schema(value_type = Object)]
    pub ai_config: Option<GenerationConfig>,
}

/// Payload for a partial course update. The `instructor` field of a course
/// is immutable, so there is no slot for it here; unknown JSON keys,
/// including a smuggled `instructor`, are dropped by serde.
#[derive(Deserialize, Default, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCoursePayload {
    pub title: Option<String>,
    pub description: Option<String>,
    pub short_description: Option<String>,
    pub category: Option<String>,
    pub level: Option<String>,
    pub price: Option<f64>,
    pub tags: Option<Vec<String>>,
    pub requirements: Option<Vec<String>>,
    pub learning_outcomes: Option<Vec<String>>,
    pub target_audience: Option<Vec<String>>,
    #[schema(value_type = Object)]
    pub ai_config: Option<GenerationConfig>,
    pub status: Option<String>,
    pub is_published: Option<bool>,
    pub is_featured: Option<bool>,
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddModulePayload {
    pub title: String,
    pub description: Option<String>,
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddLessonPayload {
    pub title: String,
    pub content: String,
    pub duration: Option<u32>,
}

/// Query parameters accepted by the published-course listing.
#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ListCoursesQuery {
    pub category: Option<String>,
    pub level: Option<String>,
    pub instructor: Option<Uuid>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub search: Option<String>,
    pub sort: Option<String>,
    #[serde(default)]
    pub page: u32,
    #[serde(default)]
    pub limit: u32,
}

/// Listing response: one page of courses plus pagination metadata.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseListResponse {
    pub courses: Vec<Course>,
    pub pagination: Pagination,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub current: u32,
    pub pages: u32,
    pub total: u64,
}

impl From<Page> for Pagination {
    fn from(page: Page) -> Self {
        Self {
            current: page.current,
            pages: page.pages,
            total: page.total,
        }
    }
}

fn parse_sort(raw: Option<&str>) -> Result<CourseSort, ApiError> {
    match raw {
        None | Some("newest") => Ok(CourseSort::Newest),
        Some("oldest") => Ok(CourseSort::Oldest),
        Some("price-asc") => Ok(CourseSort::PriceAsc),
        Some("price-desc") => Ok(CourseSort::PriceDesc),
        Some("title") => Ok(CourseSort::TitleAsc),
        Some(other) => Err(ApiError::BadRequest(format!(
            "'{other}' is not a valid sort order"
        ))),
    }
}

//=========================================================================================
// Course Handlers
//=========================================================================================

/// Create a new course owned by the requesting instructor.
#[utoipa::path(
    post,
    path = "/courses",
    request_body = CreateCoursePayload,
    responses(
        (status = 201, description = "Course created"),
        (status = 400, description = "Invalid payload"),
    ),
    params(("x-user-id" = Uuid, Header, description = "The unique ID of the instructor."))
)]
pub async fn create_course_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<CreateCoursePayload>,
) -> Result<impl IntoResponse, ApiError> {
    let principal = principal_from_headers(&headers)?;

    let spec = NewCourse {
        title: payload.title,
        description: payload.description,
        short_description: payload.short_description,
        category: payload.category.parse::<CourseCategory>()?,
        level: payload
            .level
            .as_deref()
            .map(str::parse::<CourseLevel>)
            .transpose()?,
        price: payload.price,
        tags: payload.tags,
        requirements: payload.requirements,
        learning_outcomes: payload.learning_outcomes,
        target_audience: payload.target_audience,
        ai_config: payload.ai_config,
    };

    let course = state.courses.create_course(principal.id, spec).await?;
    Ok((StatusCode::CREATED, Json(course)))
}

/// List published courses with filtering, sorting and pagination.
#[utoipa::path(
    get,
    path = "/courses",
    responses((status = 200, description = "One page of published courses"))
)]
pub async fn list_courses_handler(
    State(state): State<AppState>,
    Query(query): Query<ListCoursesQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let course_query = CourseQuery {
        category: query
            .category
            .as_deref()
            .map(str::parse::<CourseCategory>)
            .transpose()?,
        level: query
            .level
            .as_deref()
            .map(str::parse::<CourseLevel>)
            .transpose()?,
        instructor: query.instructor,
        min_price: query.min_price,
        max_price: query.max_price,
        text: query.search,
        sort: parse_sort(query.sort.as_deref())?,
        page: query.page,
        limit: query.limit,
    };

    let (courses, page) = state.courses.list_published(course_query).await?;
    Ok(Json(CourseListResponse {
        courses,
        pagination: page.into(),
    }))
}

/// Fetch one course. Unpublished courses are only visible to their instructor.
#[utoipa::path(
    get,
    path = "/courses/{id}",
    responses(
        (status = 200, description = "The course"),
        (status = 403, description = "Course is not published"),
        (status = 404, description = "No such course"),
    ),
    params(("id" = Uuid, Path, description = "Course id"))
)]
pub async fn get_course_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let principal = optional_principal(&headers)?;
    let course = state.courses.get_course(id, principal.as_ref()).await?;
    Ok(Json(course))
}

/// Apply a partial update to a course.
#[utoipa::path(
    put,
    path = "/courses/{id}",
    request_body = UpdateCoursePayload,
    responses(
        (status = 200, description = "The updated course"),
        (status = 403, description = "Not the owning instructor"),
    ),
    params(("id" = Uuid, Path, description = "Course id"))
)]
pub async fn update_course_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateCoursePayload>,
) -> Result<impl IntoResponse, ApiError> {
    let principal = principal_from_headers(&headers)?;

    let patch = CoursePatch {
        title: payload.title,
        description: payload.description,
        short_description: payload.short_description,
        category: payload
            .category
            .as_deref()
            .map(str::parse::<CourseCategory>)
            .transpose()?,
        level: payload
            .level
            .as_deref()
            .map(str::parse::<CourseLevel>)
            .transpose()?,
        price: payload.price,
        tags: payload.tags,
        requirements: payload.requirements,
        learning_outcomes: payload.learning_outcomes,
        target_audience: payload.target_audience,
        ai_config: payload.ai_config,
        status: payload
            .status
            .as_deref()
            .map(str::parse::<CourseStatus>)
            .transpose()?,
        is_published: payload.is_published,
        is_featured: payload.is_featured,
    };

    let course = state.courses.update_course(id, &principal, patch).await?;
    Ok(Json(course))
}

/// Delete a course and cascade to its content records.
#[utoipa::path(
    delete,
    path = "/courses/{id}",
    responses(
        (status = 204, description = "Course deleted"),
        (status = 403, description = "Not the owning instructor or an admin"),
    ),
    params(("id" = Uuid, Path, description = "Course id"))
)]
pub async fn delete_course_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let principal = principal_from_headers(&headers)?;
    state.courses.delete_course(id, &principal).await?;
    Ok(StatusCode::NO_CONTENT)
}

//=========================================================================================
// Module and Lesson Handlers
//=========================================================================================

/// Append a module to a course.
#[utoipa::path(
    post,
    path = "/courses/{id}/modules",
    request_body = AddModulePayload,
    responses((status = 201, description = "Module appended")),
    params(("id" = Uuid, Path, description = "Course id"))
)]
pub async fn add_module_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
    Json(payload): Json<AddModulePayload>,
) -> Result<impl IntoResponse, ApiError> {
    let principal = principal_from_headers(&headers)?;
    let module = state
        .courses
        .add_module(
            id,
            &principal,
            NewModule {
                title: payload.title,
                description: payload.description,
            },
        )
        .await?;
    Ok((StatusCode::CREATED, Json(module)))
}

/// Append a lesson to a module.
#[utoipa::path(
    post,
    path = "/courses/{id}/modules/{module_id}/lessons",
    request_body = AddLessonPayload,
    responses((status = 201, description = "Lesson appended")),
    params(
        ("id" = Uuid, Path, description = "Course id"),
        ("module_id" = Uuid, Path, description = "Module id"),
    )
)]
pub async fn add_lesson_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path((id, module_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<AddLessonPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let principal = principal_from_headers(&headers)?;
    let lesson = state
        .courses
        .add_lesson(
            id,
            module_id,
            &principal,
            NewLesson {
                title: payload.title,
                content: payload.content,
                duration: payload.duration,
            },
        )
        .await?;
    Ok((StatusCode::CREATED, Json(lesson)))
}
