//! crates/courseforge_core/src/content.rs
//!
//! The Content entity store: owns the processing state machine for
//! standalone Content records and the query surface over them. Persistence
//! is delegated to the `ContentRepository` port.

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::domain::{
    AccessControl, AiProvenance, Content, ContentAnalytics, ContentKind, ContentStatus,
    MediaMetadata,
};
use crate::error::{CoreResult, Error};
use crate::ports::{ContentFilter, ContentKindStats, ContentRepository};

//=========================================================================================
// Creation Spec
//=========================================================================================

/// Everything a caller supplies when creating a Content record. The store
/// fills in identity, status and timestamps.
#[derive(Debug, Clone)]
pub struct NewContent {
    pub title: String,
    pub description: Option<String>,
    pub kind: ContentKind,
    /// Derived from `kind` when absent.
    pub format: Option<String>,
    pub url: String,
    pub thumbnail: Option<String>,
    pub duration: Option<u32>,
    pub size: Option<u64>,
    pub metadata: MediaMetadata,
    pub ai_generated: Option<AiProvenance>,
    pub course: Uuid,
    pub module: Uuid,
    pub lesson: Uuid,
    pub created_by: Uuid,
    pub access_control: AccessControl,
    pub tags: Vec<String>,
}

impl NewContent {
    fn validate(&self) -> CoreResult<()> {
        if self.title.trim().is_empty() {
            return Err(Error::Validation("title is required".to_string()));
        }
        if self.url.trim().is_empty() {
            return Err(Error::Validation("url is required".to_string()));
        }
        if self.course.is_nil() {
            return Err(Error::Validation("course reference is required".to_string()));
        }
        if self.module.is_nil() {
            return Err(Error::Validation("module reference is required".to_string()));
        }
        if self.lesson.is_nil() {
            return Err(Error::Validation("lesson reference is required".to_string()));
        }
        if self.created_by.is_nil() {
            return Err(Error::Validation("createdBy reference is required".to_string()));
        }
        Ok(())
    }
}

//=========================================================================================
// The Content Store
//=========================================================================================

/// Service owning Content records and their state machine.
#[derive(Clone)]
pub struct ContentService {
    repo: Arc<dyn ContentRepository>,
}

impl ContentService {
    pub fn new(repo: Arc<dyn ContentRepository>) -> Self {
        Self { repo }
    }

    /// Creates a Content record.
    ///
    /// Manually authored or uploaded-in-flight content starts in
    /// `processing` with progress 0. Content carrying AI provenance is
    /// complete on creation (generation is synchronous end-to-end), so it
    /// enters `ready` directly.
    pub async fn create(&self, spec: NewContent) -> CoreResult<Content> {
        spec.validate()?;
        if let Some(provenance) = &spec.ai_generated {
            provenance.config.validate()?;
        }

        let now = Utc::now();
        let ai_generated = spec.ai_generated;
        let (status, progress) = if ai_generated.is_some() {
            (ContentStatus::Ready, 100)
        } else {
            (ContentStatus::Processing, 0)
        };

        let content = Content {
            id: Uuid::new_v4(),
            title: spec.title,
            description: spec.description,
            kind: spec.kind,
            format: spec
                .format
                .filter(|f| !f.trim().is_empty())
                .unwrap_or_else(|| spec.kind.default_format().to_string()),
            url: spec.url,
            thumbnail: spec.thumbnail,
            duration: spec.duration,
            size: spec.size,
            metadata: spec.metadata,
            ai_generated,
            course: spec.course,
            module: spec.module,
            lesson: spec.lesson,
            created_by: spec.created_by,
            version: 1,
            status,
            processing_progress: progress,
            access_control: spec.access_control,
            analytics: ContentAnalytics::default(),
            tags: spec.tags,
            created_at: now,
            updated_at: now,
        };

        self.repo.insert(&content).await?;
        Ok(content)
    }

    /// Creates a record that is already complete: `ready` with progress 100.
    /// Used by the upload path once the external store has confirmed success.
    pub async fn create_ready(&self, spec: NewContent) -> CoreResult<Content> {
        let mut content = self.create(spec).await?;
        if content.status != ContentStatus::Ready {
            content.apply_progress(100, None);
            content.updated_at = Utc::now();
            self.repo.save(&content).await?;
        }
        Ok(content)
    }

    /// Applies a progress callback. See `Content::apply_progress` for the
    /// state-machine rules. Idempotent for a given progress value.
    pub async fn update_processing_status(
        &self,
        content_id: Uuid,
        progress: u8,
        status: Option<ContentStatus>,
    ) -> CoreResult<Content> {
        let mut content = self.fetch(content_id).await?;
        content.apply_progress(progress, status);
        content.updated_at = Utc::now();
        self.repo.save(&content).await?;
        Ok(content)
    }

    /// Explicit retirement: `ready` to `archived`. Terminal records are left
    /// untouched; a record still processing cannot be archived.
    pub async fn archive(&self, content_id: Uuid) -> CoreResult<Content> {
        let mut content = self.fetch(content_id).await?;
        match content.status {
            ContentStatus::Ready => {
                content.status = ContentStatus::Archived;
                content.updated_at = Utc::now();
                self.repo.save(&content).await?;
                Ok(content)
            }
            ContentStatus::Archived => Ok(content),
            other => Err(Error::Validation(format!(
                "cannot archive content in '{other}' status"
            ))),
        }
    }

    /// Content for a course, newest-created-first, optionally narrowed by
    /// kind and status.
    pub async fn find_by_course(
        &self,
        course_id: Uuid,
        filter: ContentFilter,
    ) -> CoreResult<Vec<Content>> {
        Ok(self.repo.find_by_course(course_id, &filter).await?)
    }

    /// AI-generated content ordered by generation time descending.
    pub async fn find_ai_generated(&self, limit: u32) -> CoreResult<Vec<Content>> {
        Ok(self.repo.find_ai_generated(limit).await?)
    }

    /// Aggregation by content kind, optionally scoped to a creator.
    pub async fn stats(&self, created_by: Option<Uuid>) -> CoreResult<Vec<ContentKindStats>> {
        Ok(self.repo.aggregate_stats(created_by).await?)
    }

    /// Removes a record. No cascading side effects.
    pub async fn delete(&self, content_id: Uuid) -> CoreResult<()> {
        let removed = self.repo.remove(content_id).await?;
        if removed {
            Ok(())
        } else {
            Err(Error::NotFound(format!("Content {content_id} not found")))
        }
    }

    pub async fn fetch(&self, content_id: Uuid) -> CoreResult<Content> {
        self.repo
            .fetch(content_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("Content {content_id} not found")))
    }
}
