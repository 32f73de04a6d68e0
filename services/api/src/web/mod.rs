pub mod ai;
pub mod content;
pub mod courses;
pub mod state;

use utoipa::OpenApi;

pub use state::AppState;

/// The master OpenAPI definition, aggregating every route group.
#[derive(OpenApi)]
#[openapi(
    paths(
        courses::create_course_handler,
        courses::list_courses_handler,
        courses::get_course_handler,
        courses::update_course_handler,
        courses::delete_course_handler,
        courses::add_module_handler,
        courses::add_lesson_handler,
        content::upload_content_handler,
        content::list_course_content_handler,
        content::get_content_handler,
        content::list_ai_content_handler,
        content::content_stats_handler,
        content::update_content_status_handler,
        content::archive_content_handler,
        content::delete_content_handler,
        ai::generate_outline_handler,
        ai::generate_lesson_handler,
        ai::generate_quiz_handler,
        ai::generate_media_handler,
        ai::generate_media_batch_handler,
    ),
    components(
        schemas(
            courses::CreateCoursePayload,
            courses::UpdateCoursePayload,
            courses::AddModulePayload,
            courses::AddLessonPayload,
            content::UpdateStatusPayload,
            ai::OutlinePayload,
            ai::LessonPayload,
            ai::QuizPayload,
            ai::MediaItemPayload,
            ai::MediaPayload,
            ai::MediaBatchPayload,
        )
    ),
    tags(
        (name = "CourseForge API", description = "Course catalog, content pipeline and AI generation endpoints.")
    )
)]
pub struct ApiDoc;
