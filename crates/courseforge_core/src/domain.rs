//! crates/courseforge_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application: the nested
//! Course/Module/Lesson aggregate and the standalone Content entity.
//! These structs carry serde derives so adapters can persist and expose them
//! as JSON documents, but no storage-specific logic.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Error;

//=========================================================================================
// Closed Enumerations
//=========================================================================================

/// The closed set of course categories. Unknown strings are rejected at the
/// creation boundary instead of being stored raw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CourseCategory {
    Web,
    Web3,
    Python,
    React,
    Wordpress,
    Html5,
    Javascript,
    Nodejs,
    Blockchain,
    AiMl,
    DataScience,
    Mobile,
    Cybersecurity,
    Design,
    Business,
    Other,
}

impl CourseCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Web => "web",
            Self::Web3 => "web3",
            Self::Python => "python",
            Self::React => "react",
            Self::Wordpress => "wordpress",
            Self::Html5 => "html5",
            Self::Javascript => "javascript",
            Self::Nodejs => "nodejs",
            Self::Blockchain => "blockchain",
            Self::AiMl => "ai-ml",
            Self::DataScience => "data-science",
            Self::Mobile => "mobile",
            Self::Cybersecurity => "cybersecurity",
            Self::Design => "design",
            Self::Business => "business",
            Self::Other => "other",
        }
    }
}

impl FromStr for CourseCategory {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "web" => Ok(Self::Web),
            "web3" => Ok(Self::Web3),
            "python" => Ok(Self::Python),
            "react" => Ok(Self::React),
            "wordpress" => Ok(Self::Wordpress),
            "html5" => Ok(Self::Html5),
            "javascript" => Ok(Self::Javascript),
            "nodejs" => Ok(Self::Nodejs),
            "blockchain" => Ok(Self::Blockchain),
            "ai-ml" => Ok(Self::AiMl),
            "data-science" => Ok(Self::DataScience),
            "mobile" => Ok(Self::Mobile),
            "cybersecurity" => Ok(Self::Cybersecurity),
            "design" => Ok(Self::Design),
            "business" => Ok(Self::Business),
            "other" => Ok(Self::Other),
            other => Err(Error::Validation(format!(
                "'{other}' is not a valid course category"
            ))),
        }
    }
}

impl fmt::Display for CourseCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Difficulty level a course is pitched at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CourseLevel {
    Beginner,
    Intermediate,
    Advanced,
    #[default]
    AllLevels,
}

impl CourseLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Beginner => "beginner",
            Self::Intermediate => "intermediate",
            Self::Advanced => "advanced",
            Self::AllLevels => "all-levels",
        }
    }
}

impl FromStr for CourseLevel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "beginner" => Ok(Self::Beginner),
            "intermediate" => Ok(Self::Intermediate),
            "advanced" => Ok(Self::Advanced),
            "all-levels" => Ok(Self::AllLevels),
            other => Err(Error::Validation(format!(
                "'{other}' is not a valid course level"
            ))),
        }
    }
}

impl fmt::Display for CourseLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Authoring lifecycle of a course. Distinct from the publication flag:
/// a course can be `Completed` without being published yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CourseStatus {
    #[default]
    Draft,
    InProgress,
    Completed,
    Published,
    Archived,
}

impl CourseStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::InProgress => "in-progress",
            Self::Completed => "completed",
            Self::Published => "published",
            Self::Archived => "archived",
        }
    }
}

impl FromStr for CourseStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(Self::Draft),
            "in-progress" => Ok(Self::InProgress),
            "completed" => Ok(Self::Completed),
            "published" => Ok(Self::Published),
            "archived" => Ok(Self::Archived),
            other => Err(Error::Validation(format!(
                "'{other}' is not a valid course status"
            ))),
        }
    }
}

impl fmt::Display for CourseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The closed set of content types a Content record can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ContentKind {
    Video,
    Image,
    Audio,
    Document,
    Quiz,
    Interactive,
    Code,
}

impl ContentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Video => "video",
            Self::Image => "image",
            Self::Audio => "audio",
            Self::Document => "document",
            Self::Quiz => "quiz",
            Self::Interactive => "interactive",
            Self::Code => "code",
        }
    }

    /// The deterministic format each kind falls back to when the caller does
    /// not supply one.
    pub fn default_format(&self) -> &'static str {
        match self {
            Self::Video => "mp4",
            Self::Image => "jpg",
            Self::Audio => "mp3",
            Self::Document => "pdf",
            Self::Quiz => "json",
            Self::Interactive => "html",
            Self::Code => "zip",
        }
    }
}

impl FromStr for ContentKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "video" => Ok(Self::Video),
            "image" => Ok(Self::Image),
            "audio" => Ok(Self::Audio),
            "document" => Ok(Self::Document),
            "quiz" => Ok(Self::Quiz),
            "interactive" => Ok(Self::Interactive),
            "code" => Ok(Self::Code),
            other => Err(Error::Validation(format!(
                "'{other}' is not a valid content type"
            ))),
        }
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Processing state of a Content record.
///
/// `Ready`, `Failed` and `Archived` are terminal: no operation in the core
/// transitions a record out of them automatically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ContentStatus {
    #[default]
    Processing,
    Ready,
    Failed,
    Archived,
}

impl ContentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Processing => "processing",
            Self::Ready => "ready",
            Self::Failed => "failed",
            Self::Archived => "archived",
        }
    }

    /// Whether the status pins the record: progress writes are accepted but
    /// the status itself must not move.
    pub fn is_locked(&self) -> bool {
        matches!(self, Self::Failed | Self::Archived)
    }
}

impl FromStr for ContentStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "processing" => Ok(Self::Processing),
            "ready" => Ok(Self::Ready),
            "failed" => Ok(Self::Failed),
            "archived" => Ok(Self::Archived),
            other => Err(Error::Validation(format!(
                "'{other}' is not a valid content status"
            ))),
        }
    }
}

impl fmt::Display for ContentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Role attached to a requesting principal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Role {
    #[default]
    Student,
    Instructor,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Student => "student",
            Self::Instructor => "instructor",
            Self::Admin => "admin",
        }
    }
}

impl FromStr for Role {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "student" => Ok(Self::Student),
            "instructor" => Ok(Self::Instructor),
            "admin" => Ok(Self::Admin),
            other => Err(Error::Validation(format!("'{other}' is not a valid role"))),
        }
    }
}

/// Tone preset for generated course material.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CourseStyle {
    #[default]
    Modern,
    Academic,
    Practical,
    Playful,
}

impl CourseStyle {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Modern => "modern",
            Self::Academic => "academic",
            Self::Practical => "practical",
            Self::Playful => "playful",
        }
    }
}

impl FromStr for CourseStyle {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "modern" => Ok(Self::Modern),
            "academic" => Ok(Self::Academic),
            "practical" => Ok(Self::Practical),
            "playful" => Ok(Self::Playful),
            other => Err(Error::Validation(format!(
                "'{other}' is not a valid course style"
            ))),
        }
    }
}

//=========================================================================================
// Principal
//=========================================================================================

/// The authenticated caller of a mutating operation. Issued by the upstream
/// auth layer; the core only inspects id and role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Principal {
    pub id: Uuid,
    pub role: Role,
}

impl Principal {
    pub fn new(id: Uuid, role: Role) -> Self {
        Self { id, role }
    }
}

//=========================================================================================
// Generation Configuration
//=========================================================================================

/// Constrained configuration for AI generation requests. The recognized
/// options are enumerated explicitly so generation stays reproducible.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    /// 1..=10, drives sampling temperature for prose generation.
    pub creativity_level: u8,
    /// 1..=10, drives module and lesson counts in outlines.
    pub content_depth: u8,
    pub course_style: CourseStyle,
    #[serde(default)]
    pub content_types: Vec<ContentKind>,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            creativity_level: 7,
            content_depth: 8,
            course_style: CourseStyle::Modern,
            content_types: Vec::new(),
        }
    }
}

impl GenerationConfig {
    /// Rejects out-of-range knob values before they reach a collaborator.
    pub fn validate(&self) -> Result<(), Error> {
        if !(1..=10).contains(&self.creativity_level) {
            return Err(Error::Validation(
                "creativity_level must be between 1 and 10".to_string(),
            ));
        }
        if !(1..=10).contains(&self.content_depth) {
            return Err(Error::Validation(
                "content_depth must be between 1 and 10".to_string(),
            ));
        }
        Ok(())
    }

    /// Sampling temperature for prose generation, derived from creativity.
    pub fn temperature(&self) -> f32 {
        f32::from(self.creativity_level) / 10.0
    }
}

//=========================================================================================
// Course Aggregate
//=========================================================================================

/// A lightweight, denormalized pointer to a piece of media embedded in a
/// lesson. Not an owning reference to a Content entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaRef {
    pub kind: ContentKind,
    pub url: String,
    pub thumbnail: Option<String>,
    pub duration: Option<u32>,
    pub size: Option<u64>,
}

/// A named external resource attached to a lesson.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceLink {
    pub title: String,
    pub url: String,
    pub kind: Option<String>,
}

/// An atomic unit of instructional text within a module.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lesson {
    pub id: Uuid,
    pub title: String,
    /// Required text body of the lesson.
    pub content: String,
    /// Duration in minutes, zero when unknown.
    pub duration: u32,
    /// 1-based position assigned at append time. Never renumbered on delete.
    pub order: u32,
    pub is_published: bool,
    pub media: Vec<MediaRef>,
    pub resources: Vec<ResourceLink>,
}

/// A named grouping of lessons within a course.
///
/// Lessons are held as an arena: `lesson_order` carries display order while
/// the map gives stable-id lookup, so deletes never shift positions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Module {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    /// 1-based position assigned at append time. Never renumbered on delete.
    pub order: u32,
    pub is_published: bool,
    pub lesson_order: Vec<Uuid>,
    pub lessons: HashMap<Uuid, Lesson>,
}

impl Module {
    pub fn new(title: String, description: Option<String>, order: u32) -> Self {
        Self {
            id: Uuid::new_v4(),
            title,
            description,
            order,
            is_published: false,
            lesson_order: Vec::new(),
            lessons: HashMap::new(),
        }
    }

    pub fn lesson_count(&self) -> u32 {
        self.lesson_order.len() as u32
    }

    /// Lessons in display order, resolved through the arena map.
    pub fn lessons_in_order(&self) -> impl Iterator<Item = &Lesson> {
        self.lesson_order.iter().filter_map(|id| self.lessons.get(id))
    }

    /// Appends a lesson and records its id in the display order.
    pub fn push_lesson(&mut self, lesson: Lesson) {
        self.lesson_order.push(lesson.id);
        self.lessons.insert(lesson.id, lesson);
    }
}

/// Derived and peripheral counters attached to a course.
///
/// `total_lessons` and `total_duration` are derived from the module tree and
/// recomputed on every save. The rest are event counters with no invariant
/// beyond being non-negative.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseStats {
    pub enrolled_students: u32,
    pub total_lessons: u32,
    /// Total duration of all lessons, in minutes.
    pub total_duration: u32,
    pub average_rating: f32,
    pub rating_count: u32,
    pub views: u64,
}

/// The root aggregate: a teachable unit owned by exactly one instructor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    pub id: Uuid,
    /// Owning instructor. Immutable after creation.
    pub instructor: Uuid,
    pub title: String,
    pub description: String,
    pub short_description: Option<String>,
    pub category: CourseCategory,
    pub level: CourseLevel,
    pub price: f64,
    pub currency: String,
    pub tags: Vec<String>,
    pub requirements: Vec<String>,
    pub learning_outcomes: Vec<String>,
    pub target_audience: Vec<String>,
    pub ai_config: GenerationConfig,
    /// Display order of modules. Order values live on the modules themselves.
    pub module_order: Vec<Uuid>,
    pub modules: HashMap<Uuid, Module>,
    pub stats: CourseStats,
    pub is_published: bool,
    pub is_featured: bool,
    pub status: CourseStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Course {
    pub fn module_count(&self) -> u32 {
        self.module_order.len() as u32
    }

    /// Modules in display order, resolved through the arena map.
    pub fn modules_in_order(&self) -> impl Iterator<Item = &Module> {
        self.module_order.iter().filter_map(|id| self.modules.get(id))
    }

    pub fn module(&self, id: Uuid) -> Option<&Module> {
        self.modules.get(&id)
    }

    pub fn module_mut(&mut self, id: Uuid) -> Option<&mut Module> {
        self.modules.get_mut(&id)
    }

    /// Appends a module and records its id in the display order.
    pub fn push_module(&mut self, module: Module) {
        self.module_order.push(module.id);
        self.modules.insert(module.id, module);
    }

    /// Recomputes the derived stats from the module tree.
    ///
    /// This replaces the implicit pre-save hook of earlier designs: every
    /// mutating path in the course store calls it explicitly before
    /// persisting, so the derived fields never come from client input.
    pub fn recompute_stats(&mut self) {
        let mut lessons = 0u32;
        let mut duration = 0u32;
        for module in self.modules.values() {
            lessons += module.lesson_count();
            for lesson in module.lessons.values() {
                duration += lesson.duration;
            }
        }
        self.stats.total_lessons = lessons;
        self.stats.total_duration = duration;
    }
}

//=========================================================================================
// Content Entity
//=========================================================================================

/// Technical metadata captured for a stored or generated asset.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaMetadata {
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub pages: Option<u32>,
    pub word_count: Option<u32>,
}

/// Provenance block attached to AI-generated content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiProvenance {
    pub model: String,
    pub prompt: String,
    /// Snapshot of the configuration that produced the content.
    pub config: GenerationConfig,
    pub generated_at: DateTime<Utc>,
}

/// Access rules for a Content record.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessControl {
    pub is_public: bool,
    pub allowed_users: Vec<Uuid>,
    pub password: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Event counters adjusted by external reporting. Not part of the core's
/// invariants beyond non-negativity.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentAnalytics {
    pub views: u64,
    pub downloads: u64,
    pub completion_rate: f32,
    pub average_watch_time: f32,
}

/// A standalone media/document/quiz record.
///
/// References its course, module and lesson by id only. The module and
/// lesson references are weak: a dangling id is tolerated so content can
/// outlive a lesson edit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Content {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub kind: ContentKind,
    pub format: String,
    pub url: String,
    pub thumbnail: Option<String>,
    /// Duration in seconds, where the asset has one.
    pub duration: Option<u32>,
    /// Size in bytes, where known.
    pub size: Option<u64>,
    pub metadata: MediaMetadata,
    pub ai_generated: Option<AiProvenance>,
    pub course: Uuid,
    pub module: Uuid,
    pub lesson: Uuid,
    pub created_by: Uuid,
    pub version: u32,
    pub status: ContentStatus,
    /// 0..=100.
    pub processing_progress: u8,
    pub access_control: AccessControl,
    pub analytics: ContentAnalytics,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Content {
    pub fn is_ai_generated(&self) -> bool {
        self.ai_generated.is_some()
    }

    /// Applies a progress callback to the record.
    ///
    /// Progress is clamped to [0, 100]. An explicit status overrides the
    /// current one, but progress reaching 100 is the authoritative terminal
    /// signal and forces `Ready` regardless. Records already in `Failed` or
    /// `Archived` accept the progress write but keep their status.
    pub fn apply_progress(&mut self, progress: u8, status: Option<ContentStatus>) {
        self.processing_progress = progress.min(100);

        if self.status.is_locked() {
            return;
        }
        if let Some(status) = status {
            self.status = status;
        }
        if self.processing_progress >= 100 {
            self.status = ContentStatus::Ready;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_kind_format_mapping_is_fixed() {
        assert_eq!(ContentKind::Video.default_format(), "mp4");
        assert_eq!(ContentKind::Image.default_format(), "jpg");
        assert_eq!(ContentKind::Audio.default_format(), "mp3");
        assert_eq!(ContentKind::Document.default_format(), "pdf");
        assert_eq!(ContentKind::Quiz.default_format(), "json");
        assert_eq!(ContentKind::Interactive.default_format(), "html");
        assert_eq!(ContentKind::Code.default_format(), "zip");
    }

    #[test]
    fn enum_round_trips() {
        for kind in [
            ContentKind::Video,
            ContentKind::Image,
            ContentKind::Audio,
            ContentKind::Document,
            ContentKind::Quiz,
            ContentKind::Interactive,
            ContentKind::Code,
        ] {
            assert_eq!(kind.as_str().parse::<ContentKind>().unwrap(), kind);
        }
        assert!("carousel".parse::<ContentKind>().is_err());
        assert!("ai-ml".parse::<CourseCategory>().is_ok());
        assert!("underwater-basket-weaving".parse::<CourseCategory>().is_err());
    }

    #[test]
    fn generation_config_bounds() {
        assert!(GenerationConfig::default().validate().is_ok());

        let mut config = GenerationConfig::default();
        config.creativity_level = 0;
        assert!(config.validate().is_err());

        config.creativity_level = 5;
        config.content_depth = 11;
        assert!(config.validate().is_err());
    }

    fn blank_content(status: ContentStatus, progress: u8) -> Content {
        let now = Utc::now();
        Content {
            id: Uuid::new_v4(),
            title: "t".to_string(),
            description: None,
            kind: ContentKind::Video,
            format: "mp4".to_string(),
            url: "https://example.com/a.mp4".to_string(),
            thumbnail: None,
            duration: None,
            size: None,
            metadata: MediaMetadata::default(),
            ai_generated: None,
            course: Uuid::new_v4(),
            module: Uuid::new_v4(),
            lesson: Uuid::new_v4(),
            created_by: Uuid::new_v4(),
            version: 1,
            status,
            processing_progress: progress,
            access_control: AccessControl::default(),
            analytics: ContentAnalytics::default(),
            tags: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn full_progress_forces_ready_even_with_explicit_status() {
        let mut content = blank_content(ContentStatus::Processing, 40);
        content.apply_progress(100, Some(ContentStatus::Processing));
        assert_eq!(content.status, ContentStatus::Ready);
        assert_eq!(content.processing_progress, 100);

        // Idempotent: applying again changes nothing.
        content.apply_progress(100, None);
        assert_eq!(content.status, ContentStatus::Ready);
        assert_eq!(content.processing_progress, 100);
    }

    #[test]
    fn progress_is_clamped() {
        let mut content = blank_content(ContentStatus::Processing, 0);
        content.apply_progress(250, None);
        assert_eq!(content.processing_progress, 100);
        assert_eq!(content.status, ContentStatus::Ready);
    }

    #[test]
    fn terminal_states_accept_progress_but_keep_status() {
        let mut failed = blank_content(ContentStatus::Failed, 30);
        failed.apply_progress(100, Some(ContentStatus::Ready));
        assert_eq!(failed.status, ContentStatus::Failed);
        assert_eq!(failed.processing_progress, 100);

        let mut archived = blank_content(ContentStatus::Archived, 100);
        archived.apply_progress(50, Some(ContentStatus::Processing));
        assert_eq!(archived.status, ContentStatus::Archived);
        assert_eq!(archived.processing_progress, 50);
    }

    #[test]
    fn explicit_failed_status_sticks_below_full_progress() {
        let mut content = blank_content(ContentStatus::Processing, 10);
        content.apply_progress(60, Some(ContentStatus::Failed));
        assert_eq!(content.status, ContentStatus::Failed);
    }

    #[test]
    fn recompute_stats_sums_the_tree() {
        let now = Utc::now();
        let mut course = Course {
            id: Uuid::new_v4(),
            instructor: Uuid::new_v4(),
            title: "T".to_string(),
            description: "D".to_string(),
            short_description: None,
            category: CourseCategory::Web,
            level: CourseLevel::AllLevels,
            price: 0.0,
            currency: "USD".to_string(),
            tags: Vec::new(),
            requirements: Vec::new(),
            learning_outcomes: Vec::new(),
            target_audience: Vec::new(),
            ai_config: GenerationConfig::default(),
            module_order: Vec::new(),
            modules: HashMap::new(),
            stats: CourseStats::default(),
            is_published: false,
            is_featured: false,
            status: CourseStatus::Draft,
            created_at: now,
            updated_at: now,
        };

        let mut m1 = Module::new("M1".to_string(), None, 1);
        m1.push_lesson(Lesson {
            id: Uuid::new_v4(),
            title: "L1".to_string(),
            content: "body".to_string(),
            duration: 30,
            order: 1,
            is_published: false,
            media: Vec::new(),
            resources: Vec::new(),
        });
        m1.push_lesson(Lesson {
            id: Uuid::new_v4(),
            title: "L2".to_string(),
            content: "body".to_string(),
            duration: 15,
            order: 2,
            is_published: false,
            media: Vec::new(),
            resources: Vec::new(),
        });
        course.push_module(m1);

        // A client-supplied value must be overwritten, not trusted.
        course.stats.total_lessons = 99;
        course.recompute_stats();
        assert_eq!(course.stats.total_lessons, 2);
        assert_eq!(course.stats.total_duration, 45);

        // Recomputing twice yields the same numbers.
        course.recompute_stats();
        assert_eq!(course.stats.total_lessons, 2);
        assert_eq!(course.stats.total_duration, 45);
    }
}
