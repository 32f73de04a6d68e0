//! crates/courseforge_core/src/upload.rs
//!
//! The upload orchestrator: pushes an instructor-supplied file into the
//! external media store, then records it as a completed Content record. No
//! record exists until the store has confirmed the binary.

use std::sync::Arc;

use uuid::Uuid;

use crate::authz::{self, CourseAction};
use crate::content::{ContentService, NewContent};
use crate::domain::{AccessControl, Content, ContentKind, MediaMetadata, Principal};
use crate::error::{CoreResult, Error};
use crate::ports::{
    CourseRepository, MediaStorageService, StorageResourceKind, StoreOptions, UploadSource,
};

/// Everything a caller supplies when uploading a file to a lesson.
#[derive(Debug)]
pub struct UploadRequest {
    pub course: Uuid,
    pub module: Uuid,
    pub lesson: Uuid,
    pub kind: ContentKind,
    pub title: String,
    pub description: Option<String>,
    pub tags: Vec<String>,
    pub source: UploadSource,
}

/// Storage hint by content kind: the store treats video as a first-class
/// resource and everything else as a raw object on the image pipeline.
fn resource_hint(kind: ContentKind) -> StorageResourceKind {
    match kind {
        ContentKind::Video => StorageResourceKind::Video,
        _ => StorageResourceKind::Image,
    }
}

/// Coordinates the media store and the Content store for direct uploads.
#[derive(Clone)]
pub struct UploadOrchestrator {
    courses: Arc<dyn CourseRepository>,
    storage: Arc<dyn MediaStorageService>,
    contents: ContentService,
}

impl UploadOrchestrator {
    pub fn new(
        courses: Arc<dyn CourseRepository>,
        storage: Arc<dyn MediaStorageService>,
        contents: ContentService,
    ) -> Self {
        Self {
            courses,
            storage,
            contents,
        }
    }

    /// Stores the file and creates the Content record, already `ready` with
    /// progress 100. A storage failure surfaces as `Error::Upload` and
    /// leaves no record behind.
    pub async fn upload(&self, principal: &Principal, request: UploadRequest) -> CoreResult<Content> {
        if request.title.trim().is_empty() {
            return Err(Error::Validation("title is required".to_string()));
        }

        let course = self
            .courses
            .fetch(request.course)
            .await?
            .ok_or_else(|| Error::NotFound(format!("Course {} not found", request.course)))?;
        authz::require(Some(principal), Some(&course), CourseAction::Modify)?;

        let options = StoreOptions {
            resource_kind: resource_hint(request.kind),
            folder: format!("courses/{}/content", request.course),
        };

        // Temp-file cleanup is the store's responsibility: `store` consumes
        // the source, so the core never touches the filesystem.
        let stored = self
            .storage
            .store(&request.source, &options)
            .await
            .map_err(|e| Error::Upload(e.to_string()))?;

        self.contents
            .create_ready(NewContent {
                title: request.title,
                description: request.description,
                kind: request.kind,
                format: Some(stored.format).filter(|f| !f.trim().is_empty()),
                url: stored.secure_url,
                thumbnail: stored.thumbnail_url,
                duration: stored.duration_seconds,
                size: Some(stored.size_bytes),
                metadata: MediaMetadata {
                    width: stored.width,
                    height: stored.height,
                    pages: None,
                    word_count: None,
                },
                ai_generated: None,
                course: request.course,
                module: request.module,
                lesson: request.lesson,
                created_by: principal.id,
                access_control: AccessControl::default(),
                tags: request.tags,
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn video_routes_to_the_video_pipeline() {
        assert_eq!(resource_hint(ContentKind::Video), StorageResourceKind::Video);
        for kind in [
            ContentKind::Image,
            ContentKind::Audio,
            ContentKind::Document,
            ContentKind::Quiz,
            ContentKind::Interactive,
            ContentKind::Code,
        ] {
            assert_eq!(resource_hint(kind), StorageResourceKind::Image);
        }
    }
}
