//! End-to-end lifecycle tests for the course and content stores, run
//! against in-memory fakes of the persistence and collaborator ports.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use uuid::Uuid;

use courseforge_core::content::{ContentService, NewContent};
use courseforge_core::courses::{CoursePatch, CourseService, NewCourse, NewLesson, NewModule};
use courseforge_core::domain::{
    AccessControl, Content, ContentKind, ContentStatus, Course, CourseCategory, CourseLevel,
    CourseStatus, GenerationConfig, MediaMetadata, Principal, Role,
};
use courseforge_core::error::Error;
use courseforge_core::generation::{
    GenerationOrchestrator, MediaRequest, OutlineRequest, Placement,
};
use courseforge_core::ports::{
    CompletionOptions, ContentFilter, ContentKindStats, ContentRepository, CourseQuery,
    CourseRepository, GeneratedAudio, GeneratedImage, GeneratedVideo, GenerationService,
    MediaStorageService, PortError, PortResult, StorageResourceKind, StoreOptions, StoredObject,
    UploadSource,
};
use courseforge_core::upload::{UploadOrchestrator, UploadRequest};

//=========================================================================================
// In-Memory Fakes
//=========================================================================================

#[derive(Default)]
struct MemCourses {
    items: Mutex<HashMap<Uuid, Course>>,
}

#[async_trait]
impl CourseRepository for MemCourses {
    async fn insert(&self, course: &Course) -> PortResult<()> {
        self.items.lock().unwrap().insert(course.id, course.clone());
        Ok(())
    }

    async fn fetch(&self, id: Uuid) -> PortResult<Option<Course>> {
        Ok(self.items.lock().unwrap().get(&id).cloned())
    }

    async fn save(&self, course: &Course) -> PortResult<()> {
        self.items.lock().unwrap().insert(course.id, course.clone());
        Ok(())
    }

    async fn remove(&self, id: Uuid) -> PortResult<bool> {
        Ok(self.items.lock().unwrap().remove(&id).is_some())
    }

    async fn list_published(&self, query: &CourseQuery) -> PortResult<(Vec<Course>, u64)> {
        let mut matches: Vec<Course> = self
            .items
            .lock()
            .unwrap()
            .values()
            .filter(|c| c.is_published)
            .filter(|c| query.category.is_none_or(|cat| c.category == cat))
            .filter(|c| query.level.is_none_or(|lvl| c.level == lvl))
            .cloned()
            .collect();
        matches.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        let total = matches.len() as u64;
        let start = ((query.page - 1) * query.limit) as usize;
        let page: Vec<Course> = matches
            .into_iter()
            .skip(start)
            .take(query.limit as usize)
            .collect();
        Ok((page, total))
    }
}

#[derive(Default)]
struct MemContents {
    items: Mutex<HashMap<Uuid, Content>>,
    fail_delete_by_course: AtomicBool,
}

#[async_trait]
impl ContentRepository for MemContents {
    async fn insert(&self, content: &Content) -> PortResult<()> {
        self.items
            .lock()
            .unwrap()
            .insert(content.id, content.clone());
        Ok(())
    }

    async fn fetch(&self, id: Uuid) -> PortResult<Option<Content>> {
        Ok(self.items.lock().unwrap().get(&id).cloned())
    }

    async fn save(&self, content: &Content) -> PortResult<()> {
        self.items
            .lock()
            .unwrap()
            .insert(content.id, content.clone());
        Ok(())
    }

    async fn remove(&self, id: Uuid) -> PortResult<bool> {
        Ok(self.items.lock().unwrap().remove(&id).is_some())
    }

    async fn find_by_course(
        &self,
        course_id: Uuid,
        filter: &ContentFilter,
    ) -> PortResult<Vec<Content>> {
        let mut matches: Vec<Content> = self
            .items
            .lock()
            .unwrap()
            .values()
            .filter(|c| c.course == course_id)
            .filter(|c| filter.kind.is_none_or(|k| c.kind == k))
            .filter(|c| filter.status.is_none_or(|s| c.status == s))
            .cloned()
            .collect();
        matches.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(matches)
    }

    async fn find_ai_generated(&self, limit: u32) -> PortResult<Vec<Content>> {
        let mut matches: Vec<Content> = self
            .items
            .lock()
            .unwrap()
            .values()
            .filter(|c| c.ai_generated.is_some())
            .cloned()
            .collect();
        matches.sort_by(|a, b| {
            let at = a.ai_generated.as_ref().map(|p| p.generated_at);
            let bt = b.ai_generated.as_ref().map(|p| p.generated_at);
            bt.cmp(&at)
        });
        matches.truncate(limit as usize);
        Ok(matches)
    }

    async fn delete_by_course(&self, course_id: Uuid) -> PortResult<u64> {
        if self.fail_delete_by_course.load(Ordering::SeqCst) {
            return Err(PortError::Unexpected("store offline".to_string()));
        }
        let mut items = self.items.lock().unwrap();
        let before = items.len();
        items.retain(|_, c| c.course != course_id);
        Ok((before - items.len()) as u64)
    }

    async fn aggregate_stats(
        &self,
        created_by: Option<Uuid>,
    ) -> PortResult<Vec<ContentKindStats>> {
        let mut by_kind: HashMap<ContentKind, (u64, u64, Vec<u32>)> = HashMap::new();
        for content in self.items.lock().unwrap().values() {
            if created_by.is_some_and(|u| content.created_by != u) {
                continue;
            }
            let entry = by_kind.entry(content.kind).or_default();
            entry.0 += 1;
            entry.1 += content.size.unwrap_or(0);
            if let Some(d) = content.duration {
                entry.2.push(d);
            }
        }
        Ok(by_kind
            .into_iter()
            .map(|(kind, (count, total_size, durations))| ContentKindStats {
                kind,
                count,
                total_size,
                average_duration: if durations.is_empty() {
                    None
                } else {
                    Some(durations.iter().map(|d| f64::from(*d)).sum::<f64>()
                        / durations.len() as f64)
                },
            })
            .collect())
    }
}

/// Generator whose text replies come from a fixed script and whose media
/// calls return predictable URLs. Video is unsupported, as with a
/// text-and-image-only provider.
struct ScriptedGenerator {
    reply: String,
}

#[async_trait]
impl GenerationService for ScriptedGenerator {
    async fn complete(&self, _: &str, _: CompletionOptions) -> PortResult<String> {
        Ok(self.reply.clone())
    }

    async fn generate_image(&self, _: &str, size: &str) -> PortResult<GeneratedImage> {
        Ok(GeneratedImage {
            url: "https://cdn.test/image.png".to_string(),
            size: size.to_string(),
        })
    }

    async fn generate_audio(&self, _: &str, _: &str) -> PortResult<GeneratedAudio> {
        Ok(GeneratedAudio {
            url: "https://cdn.test/audio.mp3".to_string(),
            duration_seconds: 42,
            size_bytes: 8_192,
        })
    }

    async fn generate_video(&self, _: &str, _: u32) -> PortResult<GeneratedVideo> {
        Err(PortError::Unsupported(
            "video generation is not available".to_string(),
        ))
    }
}

struct MemStorage {
    fail: bool,
}

#[async_trait]
impl MediaStorageService for MemStorage {
    async fn store(&self, _: &UploadSource, options: &StoreOptions) -> PortResult<StoredObject> {
        if self.fail {
            return Err(PortError::Unexpected("disk full".to_string()));
        }
        Ok(StoredObject {
            secure_url: format!("https://media.test/{}/object", options.folder),
            thumbnail_url: None,
            duration_seconds: Some(90),
            size_bytes: 1_048_576,
            width: Some(1920),
            height: Some(1080),
            format: "mp4".to_string(),
        })
    }

    async fn delete(&self, _: &str, _: StorageResourceKind) -> PortResult<()> {
        Ok(())
    }
}

//=========================================================================================
// Harness
//=========================================================================================

struct Harness {
    courses: Arc<MemCourses>,
    contents: Arc<MemContents>,
    course_service: CourseService,
    content_service: ContentService,
}

fn harness() -> Harness {
    let courses = Arc::new(MemCourses::default());
    let contents = Arc::new(MemContents::default());
    let course_service = CourseService::new(courses.clone(), contents.clone());
    let content_service = ContentService::new(contents.clone());
    Harness {
        courses,
        contents,
        course_service,
        content_service,
    }
}

fn new_course(title: &str) -> NewCourse {
    NewCourse {
        title: title.to_string(),
        description: "A course about things".to_string(),
        short_description: None,
        category: CourseCategory::Web,
        level: None,
        price: None,
        tags: Vec::new(),
        requirements: Vec::new(),
        learning_outcomes: Vec::new(),
        target_audience: Vec::new(),
        ai_config: None,
    }
}

fn new_content(course: Uuid, kind: ContentKind, created_by: Uuid) -> NewContent {
    NewContent {
        title: format!("{kind} item"),
        description: None,
        kind,
        format: None,
        url: "https://media.test/item".to_string(),
        thumbnail: None,
        duration: Some(60),
        size: Some(1_000),
        metadata: MediaMetadata::default(),
        ai_generated: None,
        course,
        module: Uuid::new_v4(),
        lesson: Uuid::new_v4(),
        created_by,
        access_control: AccessControl::default(),
        tags: Vec::new(),
    }
}

fn instructor() -> Principal {
    Principal::new(Uuid::new_v4(), Role::Instructor)
}

//=========================================================================================
// Course Lifecycle
//=========================================================================================

#[tokio::test]
async fn course_creation_applies_defaults() {
    let h = harness();
    let owner = instructor();

    let course = h
        .course_service
        .create_course(owner.id, new_course("Intro to Rust"))
        .await
        .unwrap();

    assert_eq!(course.status, CourseStatus::Draft);
    assert!(!course.is_published);
    assert_eq!(course.price, 0.0);
    assert_eq!(course.currency, "USD");
    assert_eq!(course.level, CourseLevel::AllLevels);
    assert_eq!(course.stats.total_lessons, 0);
    assert_eq!(course.ai_config, GenerationConfig::default());
}

#[tokio::test]
async fn modules_and_lessons_append_in_order() {
    let h = harness();
    let owner = instructor();
    let course = h
        .course_service
        .create_course(owner.id, new_course("Ordered"))
        .await
        .unwrap();

    let m1 = h
        .course_service
        .add_module(
            course.id,
            &owner,
            NewModule {
                title: "First".to_string(),
                description: None,
            },
        )
        .await
        .unwrap();
    let m2 = h
        .course_service
        .add_module(
            course.id,
            &owner,
            NewModule {
                title: "Second".to_string(),
                description: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(m1.order, 1);
    assert_eq!(m2.order, 2);

    for (i, title) in ["a", "b"].iter().enumerate() {
        let lesson = h
            .course_service
            .add_lesson(
                course.id,
                m1.id,
                &owner,
                NewLesson {
                    title: title.to_string(),
                    content: "body".to_string(),
                    duration: Some(30),
                },
            )
            .await
            .unwrap();
        assert_eq!(lesson.order, i as u32 + 1);
    }

    let reloaded = h.course_service.get_course(course.id, Some(&owner)).await.unwrap();
    assert_eq!(reloaded.module_count(), 2);
    assert_eq!(reloaded.stats.total_lessons, 2);
    assert_eq!(reloaded.stats.total_duration, 60);
}

#[tokio::test]
async fn ownership_guard_blocks_strangers_and_scopes_admins() {
    let h = harness();
    let owner = instructor();
    let course = h
        .course_service
        .create_course(owner.id, new_course("Guarded"))
        .await
        .unwrap();

    let stranger = instructor();
    let err = h
        .course_service
        .update_course(course.id, &stranger, CoursePatch::default())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Forbidden(_)));

    let admin = Principal::new(Uuid::new_v4(), Role::Admin);
    let err = h
        .course_service
        .update_course(course.id, &admin, CoursePatch::default())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Forbidden(_)));

    h.course_service.delete_course(course.id, &admin).await.unwrap();
    assert!(h.courses.items.lock().unwrap().is_empty());
}

#[tokio::test]
async fn delete_cascades_to_course_content() {
    let h = harness();
    let owner = instructor();
    let course = h
        .course_service
        .create_course(owner.id, new_course("Doomed"))
        .await
        .unwrap();
    let other = h
        .course_service
        .create_course(owner.id, new_course("Survivor"))
        .await
        .unwrap();

    h.content_service
        .create(new_content(course.id, ContentKind::Video, owner.id))
        .await
        .unwrap();
    h.content_service
        .create(new_content(other.id, ContentKind::Image, owner.id))
        .await
        .unwrap();

    h.course_service.delete_course(course.id, &owner).await.unwrap();

    let remaining = h.contents.items.lock().unwrap();
    assert_eq!(remaining.len(), 1);
    assert!(remaining.values().all(|c| c.course == other.id));
}

#[tokio::test]
async fn cascade_failure_surfaces_after_course_removal() {
    let h = harness();
    let owner = instructor();
    let course = h
        .course_service
        .create_course(owner.id, new_course("Half-deleted"))
        .await
        .unwrap();

    h.contents.fail_delete_by_course.store(true, Ordering::SeqCst);
    let err = h
        .course_service
        .delete_course(course.id, &owner)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Cascade(_)));
    // The course document itself is already gone.
    assert!(h.courses.items.lock().unwrap().is_empty());
}

#[tokio::test]
async fn unpublished_courses_are_instructor_only() {
    let h = harness();
    let owner = instructor();
    let course = h
        .course_service
        .create_course(owner.id, new_course("Hidden"))
        .await
        .unwrap();

    let err = h.course_service.get_course(course.id, None).await.unwrap_err();
    assert!(matches!(err, Error::Forbidden(_)));

    h.course_service
        .update_course(
            course.id,
            &owner,
            CoursePatch {
                is_published: Some(true),
                ..CoursePatch::default()
            },
        )
        .await
        .unwrap();
    assert!(h.course_service.get_course(course.id, None).await.is_ok());
}

#[tokio::test]
async fn published_listing_paginates() {
    let h = harness();
    let owner = instructor();
    for i in 0..3 {
        let course = h
            .course_service
            .create_course(owner.id, new_course(&format!("Course {i}")))
            .await
            .unwrap();
        h.course_service
            .update_course(
                course.id,
                &owner,
                CoursePatch {
                    is_published: Some(true),
                    ..CoursePatch::default()
                },
            )
            .await
            .unwrap();
    }

    let (page, meta) = h
        .course_service
        .list_published(CourseQuery {
            limit: 2,
            page: 1,
            ..CourseQuery::default()
        })
        .await
        .unwrap();
    assert_eq!(page.len(), 2);
    assert_eq!(meta.total, 3);
    assert_eq!(meta.pages, 2);
    assert_eq!(meta.current, 1);
}

//=========================================================================================
// Content Lifecycle
//=========================================================================================

#[tokio::test]
async fn manual_content_processes_then_completes() {
    let h = harness();
    let owner = instructor();
    let course = h
        .course_service
        .create_course(owner.id, new_course("C"))
        .await
        .unwrap();

    let content = h
        .content_service
        .create(new_content(course.id, ContentKind::Video, owner.id))
        .await
        .unwrap();
    assert_eq!(content.status, ContentStatus::Processing);
    assert_eq!(content.processing_progress, 0);
    assert_eq!(content.format, "mp4");

    let done = h
        .content_service
        .update_processing_status(content.id, 100, None)
        .await
        .unwrap();
    assert_eq!(done.status, ContentStatus::Ready);
}

#[tokio::test]
async fn failed_content_is_locked() {
    let h = harness();
    let owner = instructor();
    let course = h
        .course_service
        .create_course(owner.id, new_course("C"))
        .await
        .unwrap();
    let content = h
        .content_service
        .create(new_content(course.id, ContentKind::Document, owner.id))
        .await
        .unwrap();

    let failed = h
        .content_service
        .update_processing_status(content.id, 40, Some(ContentStatus::Failed))
        .await
        .unwrap();
    assert_eq!(failed.status, ContentStatus::Failed);

    // Progress still tracks, the status does not move.
    let after = h
        .content_service
        .update_processing_status(content.id, 100, Some(ContentStatus::Processing))
        .await
        .unwrap();
    assert_eq!(after.status, ContentStatus::Failed);
    assert_eq!(after.processing_progress, 100);
}

#[tokio::test]
async fn created_content_round_trips_through_course_lookup() {
    let h = harness();
    let owner = instructor();
    let course = h
        .course_service
        .create_course(owner.id, new_course("C"))
        .await
        .unwrap();

    let mut spec = new_content(course.id, ContentKind::Audio, owner.id);
    spec.description = Some("Narrated walkthrough".to_string());
    spec.format = Some("ogg".to_string());
    spec.tags = vec!["audio".to_string(), "walkthrough".to_string()];
    let module = spec.module;
    let lesson = spec.lesson;

    let created = h.content_service.create(spec).await.unwrap();

    let found = h
        .content_service
        .find_by_course(course.id, ContentFilter::default())
        .await
        .unwrap();
    assert_eq!(found.len(), 1);
    let record = &found[0];
    assert_eq!(record.id, created.id);
    assert_eq!(record.title, "audio item");
    assert_eq!(record.description.as_deref(), Some("Narrated walkthrough"));
    assert_eq!(record.kind, ContentKind::Audio);
    assert_eq!(record.format, "ogg");
    assert_eq!(record.url, "https://media.test/item");
    assert_eq!(record.duration, Some(60));
    assert_eq!(record.size, Some(1_000));
    assert_eq!(record.tags, vec!["audio", "walkthrough"]);
    assert_eq!(record.course, course.id);
    assert_eq!(record.module, module);
    assert_eq!(record.lesson, lesson);
    assert_eq!(record.created_by, owner.id);
}

#[tokio::test]
async fn status_filter_excludes_archived() {
    let h = harness();
    let owner = instructor();
    let course = h
        .course_service
        .create_course(owner.id, new_course("C"))
        .await
        .unwrap();

    let keep = h
        .content_service
        .create(new_content(course.id, ContentKind::Image, owner.id))
        .await
        .unwrap();
    let keep = h
        .content_service
        .update_processing_status(keep.id, 100, None)
        .await
        .unwrap();
    let gone = h
        .content_service
        .create(new_content(course.id, ContentKind::Image, owner.id))
        .await
        .unwrap();
    h.content_service
        .update_processing_status(gone.id, 100, None)
        .await
        .unwrap();
    h.content_service.archive(gone.id).await.unwrap();

    let ready = h
        .content_service
        .find_by_course(
            course.id,
            ContentFilter {
                status: Some(ContentStatus::Ready),
                ..ContentFilter::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(ready.len(), 1);
    assert_eq!(ready[0].id, keep.id);
}

#[tokio::test]
async fn archive_rejects_in_flight_content() {
    let h = harness();
    let owner = instructor();
    let course = h
        .course_service
        .create_course(owner.id, new_course("C"))
        .await
        .unwrap();
    let content = h
        .content_service
        .create(new_content(course.id, ContentKind::Code, owner.id))
        .await
        .unwrap();

    let err = h.content_service.archive(content.id).await.unwrap_err();
    assert!(matches!(err, Error::Validation(_)));
}

//=========================================================================================
// Upload Path
//=========================================================================================

#[tokio::test]
async fn upload_creates_ready_content() {
    let h = harness();
    let owner = instructor();
    let course = h
        .course_service
        .create_course(owner.id, new_course("Uploads"))
        .await
        .unwrap();

    let uploader = UploadOrchestrator::new(
        h.courses.clone(),
        Arc::new(MemStorage { fail: false }),
        h.content_service.clone(),
    );
    let content = uploader
        .upload(
            &owner,
            UploadRequest {
                course: course.id,
                module: Uuid::new_v4(),
                lesson: Uuid::new_v4(),
                kind: ContentKind::Video,
                title: "Welcome video".to_string(),
                description: None,
                tags: Vec::new(),
                source: UploadSource::Bytes {
                    data: bytes::Bytes::from_static(b"not really a video"),
                    file_name: "welcome.mp4".to_string(),
                },
            },
        )
        .await
        .unwrap();

    assert_eq!(content.status, ContentStatus::Ready);
    assert_eq!(content.processing_progress, 100);
    assert_eq!(content.format, "mp4");
    assert!(content.url.contains(&format!("courses/{}/content", course.id)));
    assert_eq!(content.size, Some(1_048_576));
}

#[tokio::test]
async fn failed_upload_leaves_no_record() {
    let h = harness();
    let owner = instructor();
    let course = h
        .course_service
        .create_course(owner.id, new_course("Uploads"))
        .await
        .unwrap();

    let uploader = UploadOrchestrator::new(
        h.courses.clone(),
        Arc::new(MemStorage { fail: true }),
        h.content_service.clone(),
    );
    let err = uploader
        .upload(
            &owner,
            UploadRequest {
                course: course.id,
                module: Uuid::new_v4(),
                lesson: Uuid::new_v4(),
                kind: ContentKind::Image,
                title: "Diagram".to_string(),
                description: None,
                tags: Vec::new(),
                source: UploadSource::Bytes {
                    data: bytes::Bytes::from_static(b"png"),
                    file_name: "diagram.png".to_string(),
                },
            },
        )
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Upload(_)));
    assert!(h.contents.items.lock().unwrap().is_empty());
}

#[tokio::test]
async fn temp_file_cleanup_belongs_to_the_store() {
    let h = harness();
    let owner = instructor();
    let course = h
        .course_service
        .create_course(owner.id, new_course("Uploads"))
        .await
        .unwrap();

    let path = std::env::temp_dir().join(format!("courseforge-upload-{}", Uuid::new_v4()));
    std::fs::write(&path, b"pdf bytes").unwrap();

    // MemStorage never touches disk, so the file surviving the upload
    // proves the orchestrator leaves temp files to the storage port.
    let uploader = UploadOrchestrator::new(
        h.courses.clone(),
        Arc::new(MemStorage { fail: false }),
        h.content_service.clone(),
    );
    uploader
        .upload(
            &owner,
            UploadRequest {
                course: course.id,
                module: Uuid::new_v4(),
                lesson: Uuid::new_v4(),
                kind: ContentKind::Document,
                title: "Syllabus".to_string(),
                description: None,
                tags: Vec::new(),
                source: UploadSource::TempFile { path: path.clone() },
            },
        )
        .await
        .unwrap();

    assert!(path.exists());
    std::fs::remove_file(&path).unwrap();
}

//=========================================================================================
// Generation Path
//=========================================================================================

fn orchestrator(h: &Harness, reply: &str) -> GenerationOrchestrator {
    GenerationOrchestrator::new(
        Arc::new(ScriptedGenerator {
            reply: reply.to_string(),
        }),
        h.courses.clone(),
        h.content_service.clone(),
        "gpt-4".to_string(),
    )
}

fn media_request(kind: ContentKind) -> MediaRequest {
    MediaRequest {
        prompt: "the water cycle".to_string(),
        kind,
        style: "educational".to_string(),
        size: None,
        title: None,
        description: None,
        placement: Placement {
            module: Uuid::new_v4(),
            lesson: Uuid::new_v4(),
        },
    }
}

#[tokio::test]
async fn outline_generation_parses_structured_reply() {
    let h = harness();
    let owner = instructor();
    let reply = r#"Here you go:
        {"title":"Rust 101","description":"Intro","modules":[
            {"title":"Basics","description":"","order":1,"lessons":[
                {"title":"Hello","description":"","order":1,"duration":25}]}]}"#;
    let generated = orchestrator(&h, reply)
        .generate_outline(
            &owner,
            None,
            &OutlineRequest {
                title: "Rust 101".to_string(),
                description: "Intro".to_string(),
                category: "web".to_string(),
                level: "beginner".to_string(),
                learning_outcomes: Vec::new(),
                target_audience: Vec::new(),
            },
            &GenerationConfig::default(),
        )
        .await
        .unwrap();
    assert_eq!(generated.modules.len(), 1);
    assert_eq!(generated.modules[0].lessons[0].duration, 25);
}

#[tokio::test]
async fn prose_reply_without_json_is_a_parse_error() {
    let h = harness();
    let owner = instructor();
    let err = orchestrator(&h, "I'd be happy to help! What course did you have in mind?")
        .generate_outline(
            &owner,
            None,
            &OutlineRequest {
                title: "T".to_string(),
                description: "D".to_string(),
                category: "web".to_string(),
                level: "beginner".to_string(),
                learning_outcomes: Vec::new(),
                target_audience: Vec::new(),
            },
            &GenerationConfig::default(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, Error::GenerationParse(_)));
}

#[tokio::test]
async fn generated_media_is_ready_with_provenance() {
    let h = harness();
    let owner = instructor();
    let course = h
        .course_service
        .create_course(owner.id, new_course("Media"))
        .await
        .unwrap();

    let content = orchestrator(&h, "A clear labeled diagram of the water cycle.")
        .generate_media(
            &owner,
            course.id,
            &media_request(ContentKind::Image),
            &GenerationConfig::default(),
        )
        .await
        .unwrap();

    assert_eq!(content.status, ContentStatus::Ready);
    assert_eq!(content.processing_progress, 100);
    let provenance = content.ai_generated.unwrap();
    assert_eq!(provenance.model, "gpt-4");
    assert_eq!(provenance.prompt, "the water cycle");
}

#[tokio::test]
async fn generation_rejects_non_media_kinds() {
    let h = harness();
    let owner = instructor();
    let course = h
        .course_service
        .create_course(owner.id, new_course("Media"))
        .await
        .unwrap();

    let err = orchestrator(&h, "refined prompt")
        .generate_media(
            &owner,
            course.id,
            &media_request(ContentKind::Quiz),
            &GenerationConfig::default(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, Error::UnsupportedMediaType(_)));
}

#[tokio::test]
async fn batch_generation_isolates_failures() {
    let h = harness();
    let owner = instructor();
    let course = h
        .course_service
        .create_course(owner.id, new_course("Batch"))
        .await
        .unwrap();

    let requests = vec![
        media_request(ContentKind::Image),
        media_request(ContentKind::Document),
        media_request(ContentKind::Audio),
    ];
    let outcomes = orchestrator(&h, "refined prompt")
        .generate_media_batch(&owner, course.id, &requests, &GenerationConfig::default())
        .await
        .unwrap();

    assert_eq!(outcomes.len(), 3);
    assert!(outcomes[0].succeeded());
    assert!(matches!(
        outcomes[1].outcome,
        Err(Error::UnsupportedMediaType(_))
    ));
    assert!(outcomes[2].succeeded());
    // Only the two successes were recorded.
    assert_eq!(h.contents.items.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn generation_for_someone_elses_course_is_forbidden() {
    let h = harness();
    let owner = instructor();
    let course = h
        .course_service
        .create_course(owner.id, new_course("Private"))
        .await
        .unwrap();

    let stranger = instructor();
    let err = orchestrator(&h, "refined prompt")
        .generate_media(
            &stranger,
            course.id,
            &media_request(ContentKind::Image),
            &GenerationConfig::default(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Forbidden(_)));
}

//=========================================================================================
// Aggregation
//=========================================================================================

#[tokio::test]
async fn stats_group_by_kind() {
    let h = harness();
    let owner = instructor();
    let course = h
        .course_service
        .create_course(owner.id, new_course("Stats"))
        .await
        .unwrap();

    for _ in 0..2 {
        h.content_service
            .create(new_content(course.id, ContentKind::Video, owner.id))
            .await
            .unwrap();
    }
    h.content_service
        .create(new_content(course.id, ContentKind::Document, owner.id))
        .await
        .unwrap();

    let stats = h.content_service.stats(Some(owner.id)).await.unwrap();
    let video = stats.iter().find(|s| s.kind == ContentKind::Video).unwrap();
    assert_eq!(video.count, 2);
    assert_eq!(video.total_size, 2_000);
    assert_eq!(video.average_duration, Some(60.0));

    let nobody = h.content_service.stats(Some(Uuid::new_v4())).await.unwrap();
    assert!(nobody.is_empty());
}
