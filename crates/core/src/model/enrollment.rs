use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::model::course::Course;
use crate::model::ids::{CourseId, UserId};
use crate::model::progress::CourseTally;

/// Association of a user with a course they joined.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Enrollment {
    pub id: i64,
    pub user_id: UserId,
    pub course_id: CourseId,
    pub enrolled_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Enrollment {
    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.completed_at.is_some()
    }
}

/// An enrolled course with the user's progress through it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrolledCourse {
    #[serde(flatten)]
    pub course: Course,
    pub category_name: Option<String>,
    pub category_color: Option<String>,
    pub enrolled_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub total_lessons: u32,
    pub completed_lessons: u32,
    pub progress: u8,
}

impl EnrolledCourse {
    #[must_use]
    pub fn new(
        course: Course,
        category_name: Option<String>,
        category_color: Option<String>,
        enrollment: &Enrollment,
        tally: CourseTally,
    ) -> Self {
        Self {
            course,
            category_name,
            category_color,
            enrolled_at: enrollment.enrolled_at,
            completed_at: enrollment.completed_at,
            total_lessons: tally.total_lessons,
            completed_lessons: tally.completed_lessons,
            progress: tally.percentage(),
        }
    }

    #[must_use]
    pub fn tally(&self) -> CourseTally {
        CourseTally::new(self.total_lessons, self.completed_lessons)
    }
}
