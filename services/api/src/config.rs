//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use std::net::SocketAddr;
use std::path::PathBuf;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub database_url: String,
    pub log_level: Level,
    pub openai_api_key: Option<String>,
    /// Chat model used for outlines, lessons, quizzes and prompt refinement.
    pub course_model: String,
    /// Image generation model.
    pub image_model: String,
    pub tts_voice: String,
    /// Root directory where the local media store keeps binaries.
    pub media_root: PathBuf,
    /// Public URL prefix under which `media_root` is served.
    pub media_base_url: String,
    pub cors_origin: String,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination.
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }

        // --- Load Server and Database Settings ---
        let bind_address_str =
            std::env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
        let bind_address = bind_address_str
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string()))?;

        let database_url = std::env::var("DATABASE_URL")
            .map_err(|_| ConfigError::MissingVar("DATABASE_URL".to_string()))?;

        let log_level_str = std::env::var("RUST_LOG").unwrap_or_else(|_| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        // --- Load API Keys (as optional) ---
        let openai_api_key = std::env::var("OPENAI_API_KEY").ok();

        // --- Load Adapter-specific Settings ---
        let course_model =
            std::env::var("COURSE_MODEL").unwrap_or_else(|_| "gpt-4o".to_string());
        let image_model =
            std::env::var("IMAGE_MODEL").unwrap_or_else(|_| "dall-e-3".to_string());
        let tts_voice = std::env::var("TTS_VOICE").unwrap_or_else(|_| "alloy".to_string());

        let media_root = std::env::var("MEDIA_ROOT")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./media"));
        let media_base_url = std::env::var("MEDIA_BASE_URL")
            .unwrap_or_else(|_| "http://localhost:3000/media".to_string());

        let cors_origin =
            std::env::var("CORS_ORIGIN").unwrap_or_else(|_| "http://localhost:3000".to_string());

        Ok(Self {
            bind_address,
            database_url,
            log_level,
            openai_api_key,
            course_model,
            image_model,
            tts_voice,
            media_root,
            media_base_url,
            cors_origin,
        })
    }
}
