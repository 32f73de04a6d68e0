//! crates/courseforge_core/src/authz.rs
//!
//! The ownership guard: a pure decision function binding a principal to
//! course-mutation rights. Called before every mutating operation in the
//! course and content paths.

use crate::domain::{Course, Principal, Role};
use crate::error::{CoreResult, Error};

/// What the caller is trying to do to the course. Admins are only granted
/// the delete action; everything else is instructor-only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CourseAction {
    Modify,
    Delete,
}

/// The outcome of an authorization check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision {
    pub allowed: bool,
    pub reason: &'static str,
}

impl Decision {
    fn allow() -> Self {
        Self {
            allowed: true,
            reason: "principal owns the course",
        }
    }

    fn deny(reason: &'static str) -> Self {
        Self {
            allowed: false,
            reason,
        }
    }
}

/// Decides whether `principal` may perform `action` on `course`.
///
/// Fails closed: a missing principal or a missing course is always denied.
/// No side effects.
pub fn authorize(
    principal: Option<&Principal>,
    course: Option<&Course>,
    action: CourseAction,
) -> Decision {
    let Some(principal) = principal else {
        return Decision::deny("no authenticated principal");
    };
    let Some(course) = course else {
        return Decision::deny("course does not exist");
    };

    if principal.id == course.instructor {
        return Decision::allow();
    }
    if action == CourseAction::Delete && principal.role == Role::Admin {
        return Decision::allow();
    }

    Decision::deny("principal is not the instructor of this course")
}

/// Convenience wrapper that turns a denial into `Error::Forbidden`.
pub fn require(
    principal: Option<&Principal>,
    course: Option<&Course>,
    action: CourseAction,
) -> CoreResult<()> {
    let decision = authorize(principal, course, action);
    if decision.allowed {
        Ok(())
    } else {
        Err(Error::Forbidden(decision.reason.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        CourseCategory, CourseLevel, CourseStats, CourseStatus, GenerationConfig,
    };
    use chrono::Utc;
    use std::collections::HashMap;
    use uuid::Uuid;

    fn course_owned_by(instructor: Uuid) -> Course {
        let now = Utc::now();
        Course {
            id: Uuid::new_v4(),
            instructor,
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
        }
    }

    #[test]
    fn instructor_may_modify_and_delete() {
        let owner = Uuid::new_v4();
        let course = course_owned_by(owner);
        let principal = Principal::new(owner, Role::Instructor);

        assert!(authorize(Some(&principal), Some(&course), CourseAction::Modify).allowed);
        assert!(authorize(Some(&principal), Some(&course), CourseAction::Delete).allowed);
    }

    #[test]
    fn admin_may_only_delete() {
        let course = course_owned_by(Uuid::new_v4());
        let admin = Principal::new(Uuid::new_v4(), Role::Admin);

        assert!(!authorize(Some(&admin), Some(&course), CourseAction::Modify).allowed);
        assert!(authorize(Some(&admin), Some(&course), CourseAction::Delete).allowed);
    }

    #[test]
    fn strangers_are_denied() {
        let course = course_owned_by(Uuid::new_v4());
        let stranger = Principal::new(Uuid::new_v4(), Role::Instructor);

        assert!(!authorize(Some(&stranger), Some(&course), CourseAction::Modify).allowed);
        assert!(!authorize(Some(&stranger), Some(&course), CourseAction::Delete).allowed);
    }

    #[test]
    fn fails_closed_on_missing_inputs() {
        let course = course_owned_by(Uuid::new_v4());
        let principal = Principal::new(course.instructor, Role::Instructor);

        assert!(!authorize(None, Some(&course), CourseAction::Modify).allowed);
        assert!(!authorize(Some(&principal), None, CourseAction::Modify).allowed);
        assert!(!authorize(None, None, CourseAction::Delete).allowed);
    }
}
