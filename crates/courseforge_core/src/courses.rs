//! crates/courseforge_core/src/courses.rs
//!
//! The Course aggregate store: owns the nested Course/Module/Lesson tree,
//! enforces ordering and derived-stat consistency, and runs the ownership
//! guard in front of every mutation. Persistence is delegated to the
//! `CourseRepository` port.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::authz::{self, CourseAction};
use crate::domain::{
    Course, CourseCategory, CourseLevel, CourseStats, CourseStatus, GenerationConfig, Lesson,
    Module, Principal,
};
use crate::error::{CoreResult, Error};
use crate::ports::{ContentRepository, CourseQuery, CourseRepository};

//=========================================================================================
// Input Shapes
//=========================================================================================

/// Caller-supplied fields for course creation. Everything else defaults.
#[derive(Debug, Clone)]
pub struct NewCourse {
    pub title: String,
    pub description: String,
    pub short_description: Option<String>,
    pub category: CourseCategory,
    pub level: Option<CourseLevel>,
    pub price: Option<f64>,
    pub tags: Vec<String>,
    pub requirements: Vec<String>,
    pub learning_outcomes: Vec<String>,
    pub target_audience: Vec<String>,
    pub ai_config: Option<GenerationConfig>,
}

/// A partial update. Absent fields are left untouched. The instructor
/// reference deliberately has no slot here: ownership is immutable and any
/// `instructor` key in an incoming payload is stripped by the route layer
/// before this struct is built.
#[derive(Debug, Clone, Default)]
pub struct CoursePatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub short_description: Option<String>,
    pub category: Option<CourseCategory>,
    pub level: Option<CourseLevel>,
    pub price: Option<f64>,
    pub tags: Option<Vec<String>>,
    pub requirements: Option<Vec<String>>,
    pub learning_outcomes: Option<Vec<String>>,
    pub target_audience: Option<Vec<String>>,
    pub ai_config: Option<GenerationConfig>,
    pub status: Option<CourseStatus>,
    pub is_published: Option<bool>,
    pub is_featured: Option<bool>,
}

/// Caller-supplied fields for a module append.
#[derive(Debug, Clone)]
pub struct NewModule {
    pub title: String,
    pub description: Option<String>,
}

/// Caller-supplied fields for a lesson append.
#[derive(Debug, Clone)]
pub struct NewLesson {
    pub title: String,
    pub content: String,
    pub duration: Option<u32>,
}

/// Pagination metadata for the published listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub current: u32,
    pub pages: u32,
    pub total: u64,
}

//=========================================================================================
// The Course Store
//=========================================================================================

/// Service owning the Course aggregate. Holds the content repository as well
/// so a course delete can cascade to the Content records referencing it.
#[derive(Clone)]
pub struct CourseService {
    courses: Arc<dyn CourseRepository>,
    contents: Arc<dyn ContentRepository>,
}

impl CourseService {
    pub fn new(courses: Arc<dyn CourseRepository>, contents: Arc<dyn ContentRepository>) -> Self {
        Self { courses, contents }
    }

    /// Creates a course in `draft` owned by `owner`. The instructor
    /// reference is set here once and never patched afterwards.
    pub async fn create_course(&self, owner: Uuid, spec: NewCourse) -> CoreResult<Course> {
        if spec.title.trim().is_empty() {
            return Err(Error::Validation("title is required".to_string()));
        }
        if spec.description.trim().is_empty() {
            return Err(Error::Validation("description is required".to_string()));
        }
        if owner.is_nil() {
            return Err(Error::Validation("owner is required".to_string()));
        }
        let price = spec.price.unwrap_or(0.0);
        if price < 0.0 {
            return Err(Error::Validation("price must not be negative".to_string()));
        }
        let ai_config = spec.ai_config.unwrap_or_default();
        ai_config.validate()?;

        let now = Utc::now();
        let course = Course {
            id: Uuid::new_v4(),
            instructor: owner,
            title: spec.title,
            description: spec.description,
            short_description: spec.short_description,
            category: spec.category,
            level: spec.level.unwrap_or_default(),
            price,
            currency: "USD".to_string(),
            tags: spec.tags,
            requirements: spec.requirements,
            learning_outcomes: spec.learning_outcomes,
            target_audience: spec.target_audience,
            ai_config,
            module_order: Vec::new(),
            modules: HashMap::new(),
            stats: CourseStats::default(),
            is_published: false,
            is_featured: false,
            status: CourseStatus::Draft,
            created_at: now,
            updated_at: now,
        };

        self.courses.insert(&course).await?;
        Ok(course)
    }

    /// Applies a partial patch, then recomputes the derived stats from the
    /// (possibly unchanged) module tree before persisting.
    pub async fn update_course(
        &self,
        course_id: Uuid,
        principal: &Principal,
        patch: CoursePatch,
    ) -> CoreResult<Course> {
        let mut course = self.fetch(course_id).await?;
        authz::require(Some(principal), Some(&course), CourseAction::Modify)?;

        if let Some(price) = patch.price {
            if price < 0.0 {
                return Err(Error::Validation("price must not be negative".to_string()));
            }
            course.price = price;
        }
        if let Some(ai_config) = patch.ai_config {
            ai_config.validate()?;
            course.ai_config = ai_config;
        }
        if let Some(title) = patch.title {
            course.title = title;
        }
        if let Some(description) = patch.description {
            course.description = description;
        }
        if let Some(short_description) = patch.short_description {
            course.short_description = Some(short_description);
        }
        if let Some(category) = patch.category {
            course.category = category;
        }
        if let Some(level) = patch.level {
            course.level = level;
        }
        if let Some(tags) = patch.tags {
            course.tags = tags;
        }
        if let Some(requirements) = patch.requirements {
            course.requirements = requirements;
        }
        if let Some(learning_outcomes) = patch.learning_outcomes {
            course.learning_outcomes = learning_outcomes;
        }
        if let Some(target_audience) = patch.target_audience {
            course.target_audience = target_audience;
        }
        if let Some(status) = patch.status {
            course.status = status;
        }
        if let Some(is_published) = patch.is_published {
            course.is_published = is_published;
        }
        if let Some(is_featured) = patch.is_featured {
            course.is_featured = is_featured;
        }

        course.recompute_stats();
        course.updated_at = Utc::now();
        self.courses.save(&course).await?;
        Ok(course)
    }

    /// Deletes a course and cascades to every Content record referencing it.
    ///
    /// The cascade is best-effort, not transactional: if the content delete
    /// fails after the course document is gone, the failure surfaces as
    /// `Error::Cascade` so the caller can reconcile the orphans.
    pub async fn delete_course(&self, course_id: Uuid, principal: &Principal) -> CoreResult<()> {
        let course = self.fetch(course_id).await?;
        authz::require(Some(principal), Some(&course), CourseAction::Delete)?;

        let removed = self.courses.remove(course_id).await?;
        if !removed {
            return Err(Error::NotFound(format!("Course {course_id} not found")));
        }

        self.contents
            .delete_by_course(course_id)
            .await
            .map_err(|e| Error::Cascade(e.to_string()))?;
        Ok(())
    }

    /// Appends a module with `order = current module count + 1`.
    ///
    /// Order values are assigned purely by append-time position and are
    /// never renumbered when a sibling is deleted. Racing appends against
    /// the same course can therefore produce duplicate order values; callers
    /// needing strict ordering must serialize mutations per course.
    pub async fn add_module(
        &self,
        course_id: Uuid,
        principal: &Principal,
        spec: NewModule,
    ) -> CoreResult<Module> {
        if spec.title.trim().is_empty() {
            return Err(Error::Validation("module title is required".to_string()));
        }

        let mut course = self.fetch(course_id).await?;
        authz::require(Some(principal), Some(&course), CourseAction::Modify)?;

        let module = Module::new(spec.title, spec.description, course.module_count() + 1);
        let created = module.clone();
        course.push_module(module);
        course.recompute_stats();
        course.updated_at = Utc::now();
        self.courses.save(&course).await?;
        Ok(created)
    }

    /// Appends a lesson to a module with `order = current lesson count + 1`.
    /// The module is looked up by id within this course's module list.
    pub async fn add_lesson(
        &self,
        course_id: Uuid,
        module_id: Uuid,
        principal: &Principal,
        spec: NewLesson,
    ) -> CoreResult<Lesson> {
        if spec.title.trim().is_empty() {
            return Err(Error::Validation("lesson title is required".to_string()));
        }
        if spec.content.trim().is_empty() {
            return Err(Error::Validation("lesson content is required".to_string()));
        }

        let mut course = self.fetch(course_id).await?;
        authz::require(Some(principal), Some(&course), CourseAction::Modify)?;

        let module = course.module_mut(module_id).ok_or_else(|| {
            Error::NotFound(format!("Module {module_id} not found in course {course_id}"))
        })?;

        let lesson = Lesson {
            id: Uuid::new_v4(),
            title: spec.title,
            content: spec.content,
            duration: spec.duration.unwrap_or(0),
            order: module.lesson_count() + 1,
            is_published: false,
            media: Vec::new(),
            resources: Vec::new(),
        };
        let created = lesson.clone();
        module.push_lesson(lesson);

        course.recompute_stats();
        course.updated_at = Utc::now();
        self.courses.save(&course).await?;
        Ok(created)
    }

    /// Published courses matching the query, with pagination metadata.
    pub async fn list_published(&self, mut query: CourseQuery) -> CoreResult<(Vec<Course>, Page)> {
        if query.page == 0 {
            query.page = 1;
        }
        if query.limit == 0 {
            query.limit = 10;
        }
        query.limit = query.limit.min(100);

        let (courses, total) = self.courses.list_published(&query).await?;
        let pages = (total as f64 / f64::from(query.limit)).ceil() as u32;
        Ok((
            courses,
            Page {
                current: query.page,
                pages,
                total,
            },
        ))
    }

    /// Fetches a single course. Unpublished courses are only visible to
    /// their instructor.
    pub async fn get_course(
        &self,
        course_id: Uuid,
        principal: Option<&Principal>,
    ) -> CoreResult<Course> {
        let course = self.fetch(course_id).await?;
        if course.is_published {
            return Ok(course);
        }
        match principal {
            Some(p) if p.id == course.instructor => Ok(course),
            _ => Err(Error::Forbidden(
                "this course is not published".to_string(),
            )),
        }
    }

    pub(crate) async fn fetch(&self, course_id: Uuid) -> CoreResult<Course> {
        self.courses
            .fetch(course_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("Course {course_id} not found")))
    }
}
