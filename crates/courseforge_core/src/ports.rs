//! crates/courseforge_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the
//! core to be independent of the persistence store, the generative AI
//! provider and the binary media store.

use async_trait::async_trait;
use bytes::Bytes;
use serde::Serialize;
use uuid::Uuid;

use crate::domain::{Content, ContentKind, ContentStatus, Course, CourseCategory, CourseLevel};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services
/// (database driver, OpenAI client, filesystem).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Unparsable collaborator reply: {0}")]
    Parse(String),
    #[error("Unsupported by this collaborator: {0}")]
    Unsupported(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Query and Filter Shapes
//=========================================================================================

/// Sort orders the published-course listing supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CourseSort {
    #[default]
    Newest,
    Oldest,
    PriceAsc,
    PriceDesc,
    TitleAsc,
}

/// Filter and pagination parameters for the published-course listing.
#[derive(Debug, Clone, Default)]
pub struct CourseQuery {
    pub category: Option<CourseCategory>,
    pub level: Option<CourseLevel>,
    pub instructor: Option<Uuid>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    /// Substring match across title, description and tags.
    pub text: Option<String>,
    pub sort: CourseSort,
    /// 1-based.
    pub page: u32,
    pub limit: u32,
}

/// Optional narrowing for `find_by_course`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContentFilter {
    pub kind: Option<ContentKind>,
    pub status: Option<ContentStatus>,
}

/// One row of the per-kind content aggregation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentKindStats {
    pub kind: ContentKind,
    pub count: u64,
    pub total_size: u64,
    pub average_duration: Option<f64>,
}

//=========================================================================================
// Persistence Ports
//=========================================================================================

/// Document-oriented persistence for the Course aggregate. `save` replaces
/// the whole document, nested module tree included; the store needs no
/// knowledge of the aggregate's invariants.
#[async_trait]
pub trait CourseRepository: Send + Sync {
    async fn insert(&self, course: &Course) -> PortResult<()>;

    async fn fetch(&self, id: Uuid) -> PortResult<Option<Course>>;

    async fn save(&self, course: &Course) -> PortResult<()>;

    /// Returns whether a document was actually removed.
    async fn remove(&self, id: Uuid) -> PortResult<bool>;

    /// Published courses matching the query, plus the total match count
    /// before pagination.
    async fn list_published(&self, query: &CourseQuery) -> PortResult<(Vec<Course>, u64)>;
}

/// Document-oriented persistence for standalone Content records.
#[async_trait]
pub trait ContentRepository: Send + Sync {
    async fn insert(&self, content: &Content) -> PortResult<()>;

    async fn fetch(&self, id: Uuid) -> PortResult<Option<Content>>;

    async fn save(&self, content: &Content) -> PortResult<()>;

    /// Returns whether a document was actually removed.
    async fn remove(&self, id: Uuid) -> PortResult<bool>;

    /// Content for a course, newest-created-first.
    async fn find_by_course(
        &self,
        course_id: Uuid,
        filter: &ContentFilter,
    ) -> PortResult<Vec<Content>>;

    /// AI-generated content ordered by generation time descending.
    async fn find_ai_generated(&self, limit: u32) -> PortResult<Vec<Content>>;

    /// Removes every record referencing the course. Returns the number of
    /// records deleted.
    async fn delete_by_course(&self, course_id: Uuid) -> PortResult<u64>;

    /// Aggregation grouped by content kind, optionally scoped to a creator.
    async fn aggregate_stats(&self, created_by: Option<Uuid>)
        -> PortResult<Vec<ContentKindStats>>;
}

//=========================================================================================
// Generation Collaborator Port
//=========================================================================================

/// Sampling options for a text completion.
#[derive(Debug, Clone, Copy)]
pub struct CompletionOptions {
    pub temperature: f32,
    pub max_output_tokens: u32,
}

/// Result of an image generation call.
#[derive(Debug, Clone)]
pub struct GeneratedImage {
    pub url: String,
    pub size: String,
}

/// Result of an audio generation call.
#[derive(Debug, Clone)]
pub struct GeneratedAudio {
    pub url: String,
    pub duration_seconds: u32,
    pub size_bytes: u64,
}

/// Result of a video generation call.
#[derive(Debug, Clone)]
pub struct GeneratedVideo {
    pub url: String,
    pub duration_seconds: u32,
    pub size_bytes: u64,
    pub thumbnail_url: Option<String>,
}

/// The external generative AI provider.
#[async_trait]
pub trait GenerationService: Send + Sync {
    /// Runs a text completion with fully-specified instructions and returns
    /// the raw reply. Parsing is the orchestrator's job.
    async fn complete(&self, instructions: &str, options: CompletionOptions)
        -> PortResult<String>;

    async fn generate_image(&self, prompt: &str, size: &str) -> PortResult<GeneratedImage>;

    async fn generate_audio(&self, text: &str, voice: &str) -> PortResult<GeneratedAudio>;

    async fn generate_video(
        &self,
        prompt: &str,
        duration_seconds: u32,
    ) -> PortResult<GeneratedVideo>;
}

//=========================================================================================
// Media Storage Collaborator Port
//=========================================================================================

/// Storage hint for the external store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageResourceKind {
    Video,
    Image,
}

impl StorageResourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Video => "video",
            Self::Image => "image",
        }
    }
}

/// Options for a store call.
#[derive(Debug, Clone)]
pub struct StoreOptions {
    pub resource_kind: StorageResourceKind,
    pub folder: String,
}

/// What the storage collaborator reports back about a stored object.
#[derive(Debug, Clone)]
pub struct StoredObject {
    pub secure_url: String,
    pub thumbnail_url: Option<String>,
    pub duration_seconds: Option<u32>,
    pub size_bytes: u64,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub format: String,
}

/// A raw file handed to the upload path. Either an in-memory payload (the
/// usual multipart case) or a temporary file on local disk.
#[derive(Debug)]
pub enum UploadSource {
    Bytes { data: Bytes, file_name: String },
    TempFile { path: std::path::PathBuf },
}

/// The external binary object store.
#[async_trait]
pub trait MediaStorageService: Send + Sync {
    /// Persists the source. A `TempFile` source is single-use: the
    /// implementation removes the file once it has been read, whether the
    /// store succeeded or not.
    async fn store(&self, source: &UploadSource, options: &StoreOptions)
        -> PortResult<StoredObject>;

    async fn delete(&self, object_id: &str, kind: StorageResourceKind) -> PortResult<()>;
}
