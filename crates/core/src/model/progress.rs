use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::model::ids::{CourseId, LessonId, UserId};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ProgressError {
    #[error("user id is required")]
    MissingUserId,

    #[error("lesson id is required")]
    MissingLessonId,

    #[error("course id is required")]
    MissingCourseId,
}

//
// ─── REPORT ────────────────────────────────────────────────────────────────────
//

/// A single progress event for a (user, lesson) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressReport {
    pub user_id: UserId,
    pub lesson_id: LessonId,
    pub watched_minutes: u32,
    pub is_completed: bool,
}

impl ProgressReport {
    #[must_use]
    pub fn new(user_id: UserId, lesson_id: LessonId) -> Self {
        Self {
            user_id,
            lesson_id,
            watched_minutes: 0,
            is_completed: false,
        }
    }

    #[must_use]
    pub fn watched(mut self, minutes: u32) -> Self {
        self.watched_minutes = minutes;
        self
    }

    #[must_use]
    pub fn completed(mut self) -> Self {
        self.is_completed = true;
        self
    }

    /// Build a report from optional request fields.
    ///
    /// Watched minutes default to 0 and completion to `false`.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::MissingUserId` or `ProgressError::MissingLessonId`
    /// when a required identifier is absent.
    pub fn from_parts(
        user_id: Option<UserId>,
        lesson_id: Option<LessonId>,
        watched_minutes: Option<u32>,
        is_completed: Option<bool>,
    ) -> Result<Self, ProgressError> {
        let user_id = user_id.ok_or(ProgressError::MissingUserId)?;
        let lesson_id = lesson_id.ok_or(ProgressError::MissingLessonId)?;
        Ok(Self {
            user_id,
            lesson_id,
            watched_minutes: watched_minutes.unwrap_or(0),
            is_completed: is_completed.unwrap_or(false),
        })
    }
}

//
// ─── LESSON PROGRESS ───────────────────────────────────────────────────────────
//

/// Persisted per-user, per-lesson progress.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonProgress {
    pub id: i64,
    pub user_id: UserId,
    pub lesson_id: LessonId,
    pub watched_duration_minutes: u32,
    pub is_completed: bool,
    pub completed_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

impl LessonProgress {
    /// Fold a report into the previous row (if any).
    ///
    /// Completion is sticky and `completed_at` is stamped only on the first
    /// transition to completed. The SQLite upsert encodes the same rules.
    #[must_use]
    pub fn merge(
        previous: Option<&LessonProgress>,
        id: i64,
        report: &ProgressReport,
        now: DateTime<Utc>,
    ) -> Self {
        let was_completed = previous.is_some_and(|p| p.is_completed);
        let is_completed = was_completed || report.is_completed;
        let completed_at = match previous.and_then(|p| p.completed_at) {
            Some(at) => Some(at),
            None if is_completed => Some(now),
            None => None,
        };
        Self {
            id: previous.map_or(id, |p| p.id),
            user_id: report.user_id,
            lesson_id: report.lesson_id,
            watched_duration_minutes: report.watched_minutes,
            is_completed,
            completed_at,
            updated_at: now,
        }
    }
}

/// Progress row joined with lesson and course metadata for listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressEntry {
    #[serde(flatten)]
    pub progress: LessonProgress,
    pub lesson_title: String,
    pub lesson_duration: u32,
    pub lesson_order: u32,
    pub course_id: CourseId,
    pub course_title: String,
}

//
// ─── COURSE TALLY ──────────────────────────────────────────────────────────────
//

/// Published-lesson count of a course and how many of them a user completed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseTally {
    pub total_lessons: u32,
    pub completed_lessons: u32,
}

impl CourseTally {
    #[must_use]
    pub fn new(total_lessons: u32, completed_lessons: u32) -> Self {
        Self {
            total_lessons,
            completed_lessons,
        }
    }

    /// A course with no lessons is never complete.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.total_lessons > 0 && self.completed_lessons >= self.total_lessons
    }

    /// Completion percentage rounded half up; 0 when the course has no lessons.
    #[must_use]
    pub fn percentage(&self) -> u8 {
        if self.total_lessons == 0 {
            return 0;
        }
        let total = u64::from(self.total_lessons);
        let done = u64::from(self.completed_lessons.min(self.total_lessons));
        let pct = (done * 200 + total) / (total * 2);
        u8::try_from(pct).unwrap_or(100)
    }
}

//
// ─── COMPLETION OUTCOME ────────────────────────────────────────────────────────
//

/// What a cascade run changed for a (user, course) pair.
///
/// The flags report writes made by *this* run; a replay of an already
/// completed course reports `false` for both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionOutcome {
    pub user_id: UserId,
    pub course_id: CourseId,
    pub tally: CourseTally,
    pub enrolled: bool,
    pub enrollment_completed: bool,
    pub certificate_issued: bool,
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;
    use chrono::Duration;

    fn report() -> ProgressReport {
        ProgressReport::new(UserId::new(1), LessonId::new(10))
    }

    #[test]
    fn from_parts_requires_ids_and_applies_defaults() {
        assert_eq!(
            ProgressReport::from_parts(None, Some(LessonId::new(1)), None, None),
            Err(ProgressError::MissingUserId)
        );
        assert_eq!(
            ProgressReport::from_parts(Some(UserId::new(1)), None, Some(5), Some(true)),
            Err(ProgressError::MissingLessonId)
        );
        let r = ProgressReport::from_parts(Some(UserId::new(1)), Some(LessonId::new(2)), None, None)
            .unwrap();
        assert_eq!(r.watched_minutes, 0);
        assert!(!r.is_completed);
    }

    #[test]
    fn first_completed_report_stamps_completion() {
        let now = fixed_now();
        let row = LessonProgress::merge(None, 7, &report().watched(12).completed(), now);
        assert_eq!(row.id, 7);
        assert!(row.is_completed);
        assert_eq!(row.completed_at, Some(now));
        assert_eq!(row.watched_duration_minutes, 12);
    }

    #[test]
    fn repeated_completion_keeps_original_timestamp() {
        let first = fixed_now();
        let later = first + Duration::minutes(30);
        let row = LessonProgress::merge(None, 1, &report().completed(), first);
        let again = LessonProgress::merge(Some(&row), 99, &report().watched(20).completed(), later);
        assert_eq!(again.id, 1);
        assert_eq!(again.completed_at, Some(first));
        assert_eq!(again.updated_at, later);
        assert_eq!(again.watched_duration_minutes, 20);
    }

    #[test]
    fn incomplete_report_does_not_revert_completion() {
        let first = fixed_now();
        let row = LessonProgress::merge(None, 1, &report().completed(), first);
        let after = LessonProgress::merge(Some(&row), 1, &report().watched(3), first + Duration::minutes(1));
        assert!(after.is_completed);
        assert_eq!(after.completed_at, Some(first));
        assert_eq!(after.watched_duration_minutes, 3);
    }

    #[test]
    fn incomplete_report_leaves_timestamp_empty() {
        let row = LessonProgress::merge(None, 1, &report().watched(4), fixed_now());
        assert!(!row.is_completed);
        assert_eq!(row.completed_at, None);
    }

    #[test]
    fn tally_percentage_rounds_to_nearest() {
        assert_eq!(CourseTally::new(3, 2).percentage(), 67);
        assert_eq!(CourseTally::new(3, 1).percentage(), 33);
        assert_eq!(CourseTally::new(8, 1).percentage(), 13);
        assert_eq!(CourseTally::new(4, 4).percentage(), 100);
    }

    #[test]
    fn empty_course_is_never_complete() {
        let tally = CourseTally::new(0, 0);
        assert_eq!(tally.percentage(), 0);
        assert!(!tally.is_complete());
    }

    #[test]
    fn complete_only_when_every_lesson_done() {
        assert!(!CourseTally::new(2, 1).is_complete());
        assert!(CourseTally::new(2, 2).is_complete());
    }
}
