pub mod authz;
pub mod content;
pub mod courses;
pub mod domain;
pub mod error;
pub mod generation;
pub mod ports;
pub mod upload;

pub use authz::{authorize, CourseAction, Decision};
pub use content::{ContentService, NewContent};
pub use courses::{CoursePatch, CourseService, NewCourse, NewLesson, NewModule, Page};
pub use domain::{
    Content, ContentKind, ContentStatus, Course, CourseCategory, CourseLevel, CourseStatus,
    CourseStyle, GenerationConfig, Lesson, Module, Principal, Role,
};
pub use error::{CoreResult, Error};
pub use generation::{
    BatchOutcome, CourseOutline, GeneratedQuiz, GenerationOrchestrator, LessonDraft,
    LessonRequest, MediaRequest, OutlineRequest, Placement, QuestionType, QuizDifficulty,
    QuizRequest,
};
pub use ports::{
    ContentFilter, ContentKindStats, ContentRepository, CourseQuery, CourseRepository, CourseSort,
    GenerationService, MediaStorageService, PortError, PortResult, StorageResourceKind,
    StoreOptions, StoredObject, UploadSource,
};
pub use upload::{UploadOrchestrator, UploadRequest};
