//! crates/courseforge_core/src/generation.rs
//!
//! The generation orchestrator: turns instructor prompts into course
//! outlines, lesson drafts, quizzes and finished media Content via the
//! external `GenerationService` collaborator.

use std::str::FromStr;
use std::sync::Arc;

use chrono::Utc;
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::authz::{self, CourseAction};
use crate::content::{ContentService, NewContent};
use crate::domain::{
    AccessControl, AiProvenance, Content, ContentKind, Course, GenerationConfig, MediaMetadata,
    Principal,
};
use crate::error::{CoreResult, Error};
use crate::ports::{CompletionOptions, CourseRepository, GenerationService};

const OUTLINE_SYSTEM_CONTEXT: &str = "You are an expert course designer and educator. \
Create detailed, engaging course outlines that follow modern pedagogical principles.";

const LESSON_SYSTEM_CONTEXT: &str =
    "You are an expert educator who creates engaging, informative lesson content.";

const QUIZ_SYSTEM_CONTEXT: &str =
    "You are an expert educator who creates fair and educational quizzes.";

const MEDIA_PROMPT_SYSTEM_CONTEXT: &str =
    "You create excellent prompts for AI media generation.";

/// Deterministic-leaning sampling for quizzes, biased toward answer
/// consistency rather than creative phrasing.
const QUIZ_TEMPERATURE: f32 = 0.3;

const MEDIA_PROMPT_TEMPERATURE: f32 = 0.7;
/// The focused media prompt is bounded: two sentences at most.
const MEDIA_PROMPT_MAX_TOKENS: u32 = 150;

const OUTLINE_MAX_TOKENS: u32 = 4000;
const LESSON_MAX_TOKENS: u32 = 3000;
const QUIZ_MAX_TOKENS: u32 = 3000;

//=========================================================================================
// Request Shapes
//=========================================================================================

/// Input for a course-outline generation.
#[derive(Debug, Clone)]
pub struct OutlineRequest {
    pub title: String,
    pub description: String,
    pub category: String,
    pub level: String,
    pub learning_outcomes: Vec<String>,
    pub target_audience: Vec<String>,
}

/// Input for a lesson-content generation.
#[derive(Debug, Clone)]
pub struct LessonRequest {
    pub module_title: String,
    pub lesson_title: String,
    pub lesson_description: Option<String>,
    /// Body of the preceding lesson, to keep drafts coherent across a module.
    pub previous_content: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QuizDifficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl QuizDifficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Easy => "easy",
            Self::Medium => "medium",
            Self::Hard => "hard",
        }
    }
}

impl FromStr for QuizDifficulty {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "easy" => Ok(Self::Easy),
            "medium" => Ok(Self::Medium),
            "hard" => Ok(Self::Hard),
            other => Err(Error::Validation(format!(
                "'{other}' is not a valid quiz difficulty"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuestionType {
    MultipleChoice,
    TrueFalse,
    ShortAnswer,
}

impl QuestionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MultipleChoice => "multiple-choice",
            Self::TrueFalse => "true-false",
            Self::ShortAnswer => "short-answer",
        }
    }
}

impl FromStr for QuestionType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "multiple-choice" => Ok(Self::MultipleChoice),
            "true-false" => Ok(Self::TrueFalse),
            "short-answer" => Ok(Self::ShortAnswer),
            other => Err(Error::Validation(format!(
                "'{other}' is not a valid question type"
            ))),
        }
    }
}

/// Input for a quiz generation.
#[derive(Debug, Clone)]
pub struct QuizRequest {
    pub lesson_content: String,
    pub difficulty: QuizDifficulty,
    pub question_count: u8,
    pub question_types: Vec<QuestionType>,
}

/// Where generated media content should be attached.
#[derive(Debug, Clone, Copy)]
pub struct Placement {
    pub module: Uuid,
    pub lesson: Uuid,
}

/// Input for a single media generation.
#[derive(Debug, Clone)]
pub struct MediaRequest {
    pub prompt: String,
    pub kind: ContentKind,
    pub style: String,
    /// Image dimension hint, e.g. "1024x1024".
    pub size: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub placement: Placement,
}

//=========================================================================================
// Structured Results
//=========================================================================================

/// A generated course outline: raw structured text returned to the caller,
/// not itself a Content record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CourseOutline {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub modules: Vec<ModuleOutline>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModuleOutline {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub order: u32,
    #[serde(default)]
    pub lessons: Vec<LessonOutline>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LessonOutline {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub order: u32,
    #[serde(default)]
    pub duration: u32,
}

/// A generated lesson body plus derived reading hints.
#[derive(Debug, Clone, PartialEq)]
pub struct LessonDraft {
    pub content: String,
    pub estimated_reading_minutes: u32,
    pub suggested_media: Vec<String>,
}

/// A generated quiz, parsed from the collaborator's structured reply.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedQuiz {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub questions: Vec<QuizQuestion>,
    #[serde(default)]
    pub passing_score: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct QuizQuestion {
    #[serde(rename = "type")]
    pub question_type: String,
    pub question: String,
    #[serde(default)]
    pub options: Vec<String>,
    #[serde(default)]
    pub correct_answer: serde_json::Value,
    #[serde(default)]
    pub explanation: String,
}

/// Per-item result of a batch media generation. One item failing never
/// aborts the others.
#[derive(Debug)]
pub struct BatchOutcome {
    pub kind: ContentKind,
    pub outcome: CoreResult<Content>,
}

impl BatchOutcome {
    pub fn succeeded(&self) -> bool {
        self.outcome.is_ok()
    }
}

//=========================================================================================
// JSON Extraction
//=========================================================================================

/// Pulls the first JSON-object-shaped substring out of a model reply.
/// Models routinely wrap JSON in prose or code fences.
fn extract_json(reply: &str) -> Option<&str> {
    let start = reply.find('{')?;
    let end = reply.rfind('}')?;
    if end < start {
        return None;
    }
    Some(&reply[start..=end])
}

fn parse_structured<T: serde::de::DeserializeOwned>(reply: &str, what: &str) -> CoreResult<T> {
    let json = extract_json(reply).ok_or_else(|| {
        Error::GenerationParse(format!("no JSON object found in {what} reply"))
    })?;
    serde_json::from_str(json)
        .map_err(|e| Error::GenerationParse(format!("malformed {what} reply: {e}")))
}

//=========================================================================================
// The Orchestrator
//=========================================================================================

/// Coordinates the generation collaborator and the Content store.
#[derive(Clone)]
pub struct GenerationOrchestrator {
    generator: Arc<dyn GenerationService>,
    courses: Arc<dyn CourseRepository>,
    contents: ContentService,
    /// Identifier recorded in the provenance block of generated content.
    model: String,
}

impl GenerationOrchestrator {
    pub fn new(
        generator: Arc<dyn GenerationService>,
        courses: Arc<dyn CourseRepository>,
        contents: ContentService,
        model: String,
    ) -> Self {
        Self {
            generator,
            courses,
            contents,
            model,
        }
    }

    /// Ownership is checked only when the request names a course. Content
    /// not tied to a course yet (outline drafting before the course exists)
    /// may be generated without it.
    async fn check_owner(
        &self,
        principal: &Principal,
        course_id: Option<Uuid>,
    ) -> CoreResult<Option<Course>> {
        let Some(course_id) = course_id else {
            return Ok(None);
        };
        Ok(Some(self.fetch_owned(principal, course_id).await?))
    }

    async fn fetch_owned(&self, principal: &Principal, course_id: Uuid) -> CoreResult<Course> {
        let course = self
            .courses
            .fetch(course_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("Course {course_id} not found")))?;
        authz::require(Some(principal), Some(&course), CourseAction::Modify)?;
        Ok(course)
    }

    /// Generates a structured course outline. Module and lesson counts are
    /// driven by `content_depth`, tone by `creativity_level`.
    pub async fn generate_outline(
        &self,
        principal: &Principal,
        course_id: Option<Uuid>,
        request: &OutlineRequest,
        config: &GenerationConfig,
    ) -> CoreResult<CourseOutline> {
        config.validate()?;
        self.check_owner(principal, course_id).await?;

        let (module_range, lesson_range) = if config.content_depth >= 8 {
            ("6-8", "5-7")
        } else {
            ("4-5", "3-5")
        };

        let instructions = format!(
            "{OUTLINE_SYSTEM_CONTEXT}\n\n\
             Create a comprehensive course outline for the following course:\n\n\
             Title: {title}\n\
             Description: {description}\n\
             Category: {category}\n\
             Level: {level}\n\
             Learning Outcomes: {outcomes}\n\
             Target Audience: {audience}\n\n\
             Requirements:\n\
             - Create {module_range} modules\n\
             - Each module should have {lesson_range} lessons\n\
             - Include practical exercises and projects\n\
             - Style: {style}\n\
             - Creativity level: {creativity}/10\n\n\
             Respond with a single JSON object of this shape:\n\
             {{\"title\": \"...\", \"description\": \"...\", \"modules\": [{{\"title\": \"...\", \
             \"description\": \"...\", \"order\": 1, \"lessons\": [{{\"title\": \"...\", \
             \"description\": \"...\", \"order\": 1, \"duration\": 30}}]}}]}}",
            title = request.title,
            description = request.description,
            category = request.category,
            level = request.level,
            outcomes = join_or_unspecified(&request.learning_outcomes),
            audience = join_or_unspecified(&request.target_audience),
            style = config.course_style.as_str(),
            creativity = config.creativity_level,
        );

        let reply = self
            .generator
            .complete(
                &instructions,
                CompletionOptions {
                    temperature: config.temperature(),
                    max_output_tokens: OUTLINE_MAX_TOKENS,
                },
            )
            .await?;

        parse_structured(&reply, "course outline")
    }

    /// Generates a prose lesson body. Returned to the caller directly; this
    /// is not a Content record.
    pub async fn generate_lesson(
        &self,
        principal: &Principal,
        course_id: Option<Uuid>,
        request: &LessonRequest,
        config: &GenerationConfig,
    ) -> CoreResult<LessonDraft> {
        config.validate()?;
        self.check_owner(principal, course_id).await?;

        let previous = request
            .previous_content
            .as_deref()
            .map(|p| format!("Previous content context: {p}\n\n"))
            .unwrap_or_default();

        let instructions = format!(
            "{LESSON_SYSTEM_CONTEXT}\n\n\
             Create comprehensive lesson content for:\n\n\
             Module: {module}\n\
             Lesson: {lesson}\n\
             Description: {description}\n\n\
             {previous}\
             Requirements:\n\
             - Create engaging, well-structured content\n\
             - Include examples and practical applications\n\
             - Use markdown formatting\n\
             - Include learning objectives\n\
             - Creativity level: {creativity}/10\n\n\
             Structure the content with:\n\
             # Learning Objectives\n\
             ## Main Content\n\
             ### Key Concepts\n\
             ### Examples\n\
             ## Summary\n\
             ## Practice Exercises",
            module = request.module_title,
            lesson = request.lesson_title,
            description = request.lesson_description.as_deref().unwrap_or("Not specified"),
            creativity = config.creativity_level,
        );

        let content = self
            .generator
            .complete(
                &instructions,
                CompletionOptions {
                    temperature: config.temperature(),
                    max_output_tokens: LESSON_MAX_TOKENS,
                },
            )
            .await?;

        if content.trim().is_empty() {
            return Err(Error::GenerationParse(
                "lesson reply contained no text".to_string(),
            ));
        }

        // Rough reading estimate: five minutes per thousand characters.
        let estimated_reading_minutes = (content.len() as u32).div_ceil(1000) * 5;

        Ok(LessonDraft {
            content,
            estimated_reading_minutes,
            suggested_media: vec![
                "diagram".to_string(),
                "example video".to_string(),
                "interactive exercise".to_string(),
            ],
        })
    }

    /// Generates a quiz at a fixed low temperature for answer consistency.
    pub async fn generate_quiz(
        &self,
        principal: &Principal,
        course_id: Option<Uuid>,
        request: &QuizRequest,
    ) -> CoreResult<GeneratedQuiz> {
        if request.question_count == 0 {
            return Err(Error::Validation(
                "question_count must be at least 1".to_string(),
            ));
        }
        if request.question_types.is_empty() {
            return Err(Error::Validation(
                "at least one question type is required".to_string(),
            ));
        }
        if request.lesson_content.trim().is_empty() {
            return Err(Error::Validation("lesson content is required".to_string()));
        }
        self.check_owner(principal, course_id).await?;

        let types = request
            .question_types
            .iter()
            .map(|t| t.as_str())
            .collect::<Vec<_>>()
            .join(", ");

        let instructions = format!(
            "{QUIZ_SYSTEM_CONTEXT}\n\n\
             Create a {difficulty} level quiz based on the following lesson content:\n\n\
             {content}\n\n\
             Requirements:\n\
             - {count} questions\n\
             - Question types: {types}\n\
             - Provide correct answers and explanations\n\n\
             Respond with a single JSON object of this shape:\n\
             {{\"title\": \"...\", \"description\": \"...\", \"questions\": [{{\"type\": \
             \"multiple-choice\", \"question\": \"...\", \"options\": [\"A\", \"B\"], \
             \"correctAnswer\": 0, \"explanation\": \"...\"}}], \"passingScore\": 70}}",
            difficulty = request.difficulty.as_str(),
            content = request.lesson_content,
            count = request.question_count,
        );

        let reply = self
            .generator
            .complete(
                &instructions,
                CompletionOptions {
                    temperature: QUIZ_TEMPERATURE,
                    max_output_tokens: QUIZ_MAX_TOKENS,
                },
            )
            .await?;

        parse_structured(&reply, "quiz")
    }

    /// Generates one piece of media content and attaches it to the lesson as
    /// a ready Content record with full AI provenance.
    pub async fn generate_media(
        &self,
        principal: &Principal,
        course_id: Uuid,
        request: &MediaRequest,
        config: &GenerationConfig,
    ) -> CoreResult<Content> {
        config.validate()?;
        let course = self.fetch_owned(principal, course_id).await?;
        self.generate_media_unchecked(principal, &course, request, config)
            .await
    }

    /// Runs independent media requests concurrently against one course.
    /// Ownership is checked once; each item succeeds or fails on its own.
    pub async fn generate_media_batch(
        &self,
        principal: &Principal,
        course_id: Uuid,
        requests: &[MediaRequest],
        config: &GenerationConfig,
    ) -> CoreResult<Vec<BatchOutcome>> {
        config.validate()?;
        let course = self.fetch_owned(principal, course_id).await?;

        let futures = requests.iter().map(|request| {
            let course = &course;
            async move {
                BatchOutcome {
                    kind: request.kind,
                    outcome: self
                        .generate_media_unchecked(principal, course, request, config)
                        .await,
                }
            }
        });

        Ok(join_all(futures).await)
    }

    /// Two-phase media generation: first distill the description into a
    /// focused prompt, then call the media collaborator keyed by kind.
    async fn generate_media_unchecked(
        &self,
        principal: &Principal,
        course: &Course,
        request: &MediaRequest,
        config: &GenerationConfig,
    ) -> CoreResult<Content> {
        // Reject unsupported kinds before spending a collaborator call.
        match request.kind {
            ContentKind::Image | ContentKind::Audio | ContentKind::Video => {}
            other => {
                return Err(Error::UnsupportedMediaType(other.as_str().to_string()));
            }
        }

        let prompt_instructions = format!(
            "{MEDIA_PROMPT_SYSTEM_CONTEXT}\n\n\
             Create a detailed prompt for {kind} generation based on:\n\
             \"{prompt}\"\n\n\
             Style: {style}\n\
             Media Type: {kind}\n\n\
             Requirements:\n\
             - Be specific and descriptive\n\
             - Include style references\n\
             - Focus on educational clarity\n\
             - Maximum 2 sentences",
            kind = request.kind.as_str(),
            prompt = request.prompt,
            style = request.style,
        );

        let focused_prompt = self
            .generator
            .complete(
                &prompt_instructions,
                CompletionOptions {
                    temperature: MEDIA_PROMPT_TEMPERATURE,
                    max_output_tokens: MEDIA_PROMPT_MAX_TOKENS,
                },
            )
            .await?
            .trim()
            .to_string();

        let size_hint = request.size.as_deref().unwrap_or("1024x1024");
        let (url, thumbnail, duration, size) = match request.kind {
            ContentKind::Image => {
                let image = self.generator.generate_image(&focused_prompt, size_hint).await?;
                (image.url, None, None, None)
            }
            ContentKind::Audio => {
                let audio = self.generator.generate_audio(&focused_prompt, "alloy").await?;
                (
                    audio.url,
                    None,
                    Some(audio.duration_seconds),
                    Some(audio.size_bytes),
                )
            }
            ContentKind::Video => {
                let video = self.generator.generate_video(&focused_prompt, 30).await?;
                (
                    video.url,
                    video.thumbnail_url,
                    Some(video.duration_seconds),
                    Some(video.size_bytes),
                )
            }
            // Filtered above.
            _ => unreachable!(),
        };

        let title = request
            .title
            .clone()
            .unwrap_or_else(|| truncate_title(&request.prompt));

        self.contents
            .create(NewContent {
                title,
                description: request.description.clone(),
                kind: request.kind,
                format: None,
                url,
                thumbnail,
                duration,
                size,
                metadata: MediaMetadata::default(),
                ai_generated: Some(AiProvenance {
                    model: self.model.clone(),
                    prompt: request.prompt.clone(),
                    config: config.clone(),
                    generated_at: Utc::now(),
                }),
                course: course.id,
                module: request.placement.module,
                lesson: request.placement.lesson,
                created_by: principal.id,
                access_control: AccessControl::default(),
                tags: Vec::new(),
            })
            .await
    }
}

fn join_or_unspecified(items: &[String]) -> String {
    if items.is_empty() {
        "Not specified".to_string()
    } else {
        items.join(", ")
    }
}

fn truncate_title(prompt: &str) -> String {
    let trimmed = prompt.trim();
    if trimmed.chars().count() <= 60 {
        trimmed.to_string()
    } else {
        let cut: String = trimmed.chars().take(57).collect();
        format!("{cut}...")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_json_wrapped_in_prose() {
        let reply = "Sure, here is the outline:\n```json\n{\"title\":\"T\",\"modules\":[]}\n```";
        assert_eq!(extract_json(reply), Some("{\"title\":\"T\",\"modules\":[]}"));
    }

    #[test]
    fn rejects_reply_without_json() {
        assert!(extract_json("I cannot help with that.").is_none());
        let err = parse_structured::<CourseOutline>("no json here", "course outline")
            .expect_err("must fail");
        assert!(matches!(err, Error::GenerationParse(_)));
    }

    #[test]
    fn parses_outline_shape() {
        let reply = r#"{"title":"Rust 101","description":"Intro","modules":[
            {"title":"Basics","description":"","order":1,"lessons":[
                {"title":"Hello","description":"","order":1,"duration":20}
            ]}
        ]}"#;
        let outline: CourseOutline = parse_structured(reply, "course outline").unwrap();
        assert_eq!(outline.title, "Rust 101");
        assert_eq!(outline.modules.len(), 1);
        assert_eq!(outline.modules[0].lessons[0].duration, 20);
    }

    #[test]
    fn parses_quiz_shape() {
        let reply = r#"{"title":"Quiz","questions":[
            {"type":"multiple-choice","question":"Q?","options":["a","b"],
             "correctAnswer":0,"explanation":"because"}
        ],"passingScore":70}"#;
        let quiz: GeneratedQuiz = parse_structured(reply, "quiz").unwrap();
        assert_eq!(quiz.passing_score, 70);
        assert_eq!(quiz.questions[0].question_type, "multiple-choice");
    }

    #[test]
    fn title_truncation_is_bounded() {
        let long = "x".repeat(200);
        let title = truncate_title(&long);
        assert!(title.chars().count() <= 60);
        assert!(title.ends_with("..."));
        assert_eq!(truncate_title("short prompt"), "short prompt");
    }
}
