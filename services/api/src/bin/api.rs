//! services/api/src/bin/api.rs

use api_lib::{
    adapters::{db::DbAdapter, generation::OpenAiGenerationAdapter, storage::LocalMediaStore},
    config::Config,
    error::ApiError,
    web::{ai, content, courses, state::AppState, ApiDoc},
};
use async_openai::{config::OpenAIConfig, types::Voice, Client};
use axum::{
    extract::DefaultBodyLimit,
    http::{
        header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method,
    },
    routing::{delete, get, patch, post, put},
    Router,
};
use courseforge_core::content::ContentService;
use courseforge_core::courses::CourseService;
use courseforge_core::generation::GenerationOrchestrator;
use courseforge_core::ports::{ContentRepository, CourseRepository, MediaStorageService};
use courseforge_core::upload::UploadOrchestrator;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting server...");

    // --- 2. Connect to Database & Run Migrations ---
    info!("Connecting to database...");
    let db_pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await?;
    let db_adapter = Arc::new(DbAdapter::new(db_pool.clone()));
    info!("Running database migrations...");
    db_adapter.run_migrations().await?;
    info!("Database migrations complete.");

    // --- 3. Initialize Service Adapters ---
    let openai_config = OpenAIConfig::new().with_api_key(
        config
            .openai_api_key
            .as_ref()
            .ok_or_else(|| ApiError::Internal("OPENAI_API_KEY is required".to_string()))?,
    );
    let openai_client = Client::with_config(openai_config);

    let tts_voice = match config.tts_voice.to_lowercase().as_str() {
        "alloy" => Voice::Alloy,
        "echo" => Voice::Echo,
        "fable" => Voice::Fable,
        "onyx" => Voice::Onyx,
        "nova" => Voice::Nova,
        "shimmer" => Voice::Shimmer,
        _ => {
            return Err(ApiError::Internal(format!(
                "Invalid TTS voice specified in config: '{}'",
                config.tts_voice
            )))
        }
    };

    let media_store: Arc<dyn MediaStorageService> = Arc::new(LocalMediaStore::new(
        config.media_root.clone(),
        config.media_base_url.clone(),
    ));
    let generation_adapter = Arc::new(OpenAiGenerationAdapter::new(
        openai_client.clone(),
        config.course_model.clone(),
        config.image_model.clone(),
        tts_voice,
        media_store.clone(),
    ));

    // --- 4. Build the Core Services and Shared AppState ---
    let course_repo: Arc<dyn CourseRepository> = db_adapter.clone();
    let content_repo: Arc<dyn ContentRepository> = db_adapter.clone();

    let contents = ContentService::new(content_repo.clone());
    let courses_svc = CourseService::new(course_repo.clone(), content_repo.clone());
    let generator = GenerationOrchestrator::new(
        generation_adapter,
        course_repo.clone(),
        contents.clone(),
        config.course_model.clone(),
    );
    let uploader = UploadOrchestrator::new(course_repo, media_store, contents.clone());

    let app_state = AppState {
        config: config.clone(),
        courses: courses_svc,
        contents,
        generator,
        uploader,
    };

    let cors = CorsLayer::new()
        .allow_origin(
            config
                .cors_origin
                .parse::<HeaderValue>()
                .map_err(|e| ApiError::Internal(format!("Invalid CORS_ORIGIN: {e}")))?,
        )
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE, ACCEPT]);

    // --- 5. Create the Web Router ---
    let api_router = Router::new()
        .route("/courses", post(courses::create_course_handler))
        .route("/courses", get(courses::list_courses_handler))
        .route("/courses/{id}", get(courses::get_course_handler))
        .route("/courses/{id}", put(courses::update_course_handler))
        .route("/courses/{id}", delete(courses::delete_course_handler))
        .route("/courses/{id}/modules", post(courses::add_module_handler))
        .route(
            "/courses/{id}/modules/{module_id}/lessons",
            post(courses::add_lesson_handler),
        )
        .route(
            "/courses/{id}/content",
            get(content::list_course_content_handler),
        )
        .route("/content/upload", post(content::upload_content_handler))
        .route("/content/stats", get(content::content_stats_handler))
        .route(
            "/content/ai-generated",
            get(content::list_ai_content_handler),
        )
        .route("/content/{id}", get(content::get_content_handler))
        .route("/content/{id}", delete(content::delete_content_handler))
        .route(
            "/content/{id}/status",
            patch(content::update_content_status_handler),
        )
        .route(
            "/content/{id}/archive",
            post(content::archive_content_handler),
        )
        .route("/ai/outline", post(ai::generate_outline_handler))
        .route("/ai/lesson", post(ai::generate_lesson_handler))
        .route("/ai/quiz", post(ai::generate_quiz_handler))
        .route("/ai/media", post(ai::generate_media_handler))
        .route("/ai/media/batch", post(ai::generate_media_batch_handler))
        .layer(DefaultBodyLimit::max(100 * 1024 * 1024))
        .layer(cors)
        .with_state(app_state);

    // Merge the API router with the media directory and the Swagger UI.
    let app = Router::new()
        .merge(api_router)
        .nest_service("/media", ServeDir::new(&config.media_root))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));

    // --- 6. Start the Server ---
    info!("Starting server on {}", config.bind_address);
    info!(
        "Swagger UI available at http://{}/swagger-ui",
        config.bind_address
    );
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
