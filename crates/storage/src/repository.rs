use async_trait::async_trait;
use chrono::{DateTime, Utc};
use lms_core::model::{
    Category, Certificate, CompletionOutcome, Course, CourseId, CourseQuery, CourseSummary,
    CourseTally, DashboardStats, EnrolledCourse, Enrollment, Lesson, LessonId, LessonProgress,
    NewCategory, NewCourse, NewLesson, NewWebinar, ProgressEntry, ProgressReport, UserId, Webinar,
    WebinarId,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Catalog writes and reads for courses and categories.
#[async_trait]
pub trait CourseRepository: Send + Sync {
    /// # Errors
    ///
    /// Returns `StorageError::Conflict` if a category with the same name exists.
    async fn insert_category(&self, category: &NewCategory) -> Result<Category, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the referenced category is missing.
    async fn insert_course(
        &self,
        course: &NewCourse,
        now: DateTime<Utc>,
    ) -> Result<Course, StorageError>;

    /// Fetch a course regardless of its publication state.
    async fn get_course(&self, id: CourseId) -> Result<Option<Course>, StorageError>;

    /// Fetch a published course with its catalog counters.
    async fn get_published_course(
        &self,
        id: CourseId,
    ) -> Result<Option<CourseSummary>, StorageError>;

    async fn list_published_courses(
        &self,
        query: &CourseQuery,
    ) -> Result<Vec<CourseSummary>, StorageError>;

    /// Overwrite every mutable column of an existing course.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the course no longer exists.
    async fn update_course(&self, course: &Course) -> Result<(), StorageError>;

    /// Returns `true` when a row was removed.
    async fn delete_course(&self, id: CourseId) -> Result<bool, StorageError>;
}

#[async_trait]
pub trait LessonRepository: Send + Sync {
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the course does not exist.
    async fn insert_lesson(
        &self,
        lesson: &NewLesson,
        now: DateTime<Utc>,
    ) -> Result<Lesson, StorageError>;

    /// Unpublished lessons are reported as absent.
    async fn get_published_lesson(&self, id: LessonId) -> Result<Option<Lesson>, StorageError>;

    /// Published lessons of a course ordered by `lesson_order`.
    async fn list_published_lessons(&self, course_id: CourseId)
    -> Result<Vec<Lesson>, StorageError>;
}

#[async_trait]
pub trait EnrollmentRepository: Send + Sync {
    /// # Errors
    ///
    /// Returns `StorageError::Conflict` if the user is already enrolled.
    async fn insert_enrollment(
        &self,
        user_id: UserId,
        course_id: CourseId,
        now: DateTime<Utc>,
    ) -> Result<Enrollment, StorageError>;

    async fn get_enrollment(
        &self,
        user_id: UserId,
        course_id: CourseId,
    ) -> Result<Option<Enrollment>, StorageError>;
}

#[async_trait]
pub trait ProgressRepository: Send + Sync {
    /// Insert-or-update the progress row for `(user, lesson)` in one atomic step.
    ///
    /// Completion is sticky and `completed_at` is only stamped on the first
    /// completed report (see `LessonProgress::merge`).
    async fn upsert_progress(
        &self,
        report: &ProgressReport,
        now: DateTime<Utc>,
    ) -> Result<LessonProgress, StorageError>;

    async fn get_progress(
        &self,
        user_id: UserId,
        lesson_id: LessonId,
    ) -> Result<Option<LessonProgress>, StorageError>;
}

/// The completion cascade: enrollment completion and certificate issuance.
#[async_trait]
pub trait CompletionRepository: Send + Sync {
    /// Re-evaluate course completion for a user and apply the derived writes.
    ///
    /// Runs as one atomic unit. When every published lesson is completed, the
    /// enrollment's `completed_at` is set if still empty and a certificate is
    /// inserted unless one exists. Safe to call any number of times.
    async fn complete_course(
        &self,
        user_id: UserId,
        course_id: CourseId,
        certificate_url: &str,
        now: DateTime<Utc>,
    ) -> Result<CompletionOutcome, StorageError>;

    async fn course_tally(
        &self,
        user_id: UserId,
        course_id: CourseId,
    ) -> Result<CourseTally, StorageError>;

    async fn get_certificate(
        &self,
        user_id: UserId,
        course_id: CourseId,
    ) -> Result<Option<Certificate>, StorageError>;
}

#[async_trait]
pub trait WebinarRepository: Send + Sync {
    async fn insert_webinar(
        &self,
        webinar: &NewWebinar,
        now: DateTime<Utc>,
    ) -> Result<Webinar, StorageError>;

    async fn get_webinar(&self, id: WebinarId) -> Result<Option<Webinar>, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError::Conflict` if the user already signed up.
    async fn insert_webinar_enrollment(
        &self,
        user_id: UserId,
        webinar_id: WebinarId,
        now: DateTime<Utc>,
    ) -> Result<(), StorageError>;

    /// Webinars the user signed up for, earliest first, with sign-up time.
    async fn list_enrolled_webinars(
        &self,
        user_id: UserId,
        limit: u32,
    ) -> Result<Vec<(Webinar, DateTime<Utc>)>, StorageError>;
}

/// Read-only joins across catalog and learner tables.
#[async_trait]
pub trait ReportRepository: Send + Sync {
    async fn dashboard_stats(&self, user_id: UserId) -> Result<DashboardStats, StorageError>;

    /// Published courses the user is enrolled in, most recent enrollment first.
    /// `None` means no limit.
    async fn enrolled_courses(
        &self,
        user_id: UserId,
        limit: Option<u32>,
    ) -> Result<Vec<EnrolledCourse>, StorageError>;

    /// Progress rows ordered by course, then lesson order.
    async fn progress_entries(
        &self,
        user_id: UserId,
        course_id: Option<CourseId>,
    ) -> Result<Vec<ProgressEntry>, StorageError>;

    async fn certificates(&self, user_id: UserId) -> Result<Vec<Certificate>, StorageError>;
}

//
// ─── IN-MEMORY ─────────────────────────────────────────────────────────────────
//

#[derive(Default)]
struct MemoryState {
    next_id: i64,
    lessons: HashMap<LessonId, Lesson>,
    progress: HashMap<(UserId, LessonId), LessonProgress>,
    enrollments: HashMap<(UserId, CourseId), Enrollment>,
    certificates: HashMap<(UserId, CourseId), Certificate>,
}

impl MemoryState {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn tally(&self, user_id: UserId, course_id: CourseId) -> CourseTally {
        let mut tally = CourseTally::default();
        for lesson in self
            .lessons
            .values()
            .filter(|l| l.course_id == course_id && l.is_published)
        {
            tally.total_lessons += 1;
            if self
                .progress
                .get(&(user_id, lesson.id))
                .is_some_and(|p| p.is_completed)
            {
                tally.completed_lessons += 1;
            }
        }
        tally
    }
}

/// In-memory repository for the progress engine, used by tests and prototypes.
///
/// One mutex guards the whole state, so the completion cascade is atomic here
/// the same way the SQLite transaction makes it atomic.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    state: Arc<Mutex<MemoryState>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, MemoryState>, StorageError> {
        self.state
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))
    }

    /// Number of stored progress rows.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the state lock is poisoned.
    pub fn progress_count(&self) -> Result<usize, StorageError> {
        Ok(self.lock()?.progress.len())
    }

    /// Number of issued certificates.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the state lock is poisoned.
    pub fn certificate_count(&self) -> Result<usize, StorageError> {
        Ok(self.lock()?.certificates.len())
    }
}

#[async_trait]
impl LessonRepository for InMemoryRepository {
    async fn insert_lesson(
        &self,
        lesson: &NewLesson,
        now: DateTime<Utc>,
    ) -> Result<Lesson, StorageError> {
        let mut state = self.lock()?;
        let id = state.next_id();
        let lesson_order = lesson.lesson_order.unwrap_or_else(|| {
            state
                .lessons
                .values()
                .filter(|l| l.course_id == lesson.course_id)
                .map(|l| l.lesson_order)
                .max()
                .unwrap_or(0)
                + 1
        });
        let stored = Lesson {
            id: LessonId::new(u64::try_from(id).unwrap_or_default()),
            course_id: lesson.course_id,
            title: lesson.title.clone(),
            description: lesson.description.clone(),
            video_url: lesson.video_url.clone(),
            duration_minutes: lesson.duration_minutes,
            lesson_order,
            is_published: lesson.is_published,
            created_at: now,
        };
        state.lessons.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn get_published_lesson(&self, id: LessonId) -> Result<Option<Lesson>, StorageError> {
        let state = self.lock()?;
        Ok(state.lessons.get(&id).filter(|l| l.is_published).cloned())
    }

    async fn list_published_lessons(
        &self,
        course_id: CourseId,
    ) -> Result<Vec<Lesson>, StorageError> {
        let state = self.lock()?;
        let mut lessons: Vec<Lesson> = state
            .lessons
            .values()
            .filter(|l| l.course_id == course_id && l.is_published)
            .cloned()
            .collect();
        lessons.sort_by_key(|l| (l.lesson_order, l.id));
        Ok(lessons)
    }
}

#[async_trait]
impl EnrollmentRepository for InMemoryRepository {
    async fn insert_enrollment(
        &self,
        user_id: UserId,
        course_id: CourseId,
        now: DateTime<Utc>,
    ) -> Result<Enrollment, StorageError> {
        let mut state = self.lock()?;
        if state.enrollments.contains_key(&(user_id, course_id)) {
            return Err(StorageError::Conflict);
        }
        let enrollment = Enrollment {
            id: state.next_id(),
            user_id,
            course_id,
            enrolled_at: now,
            completed_at: None,
        };
        state
            .enrollments
            .insert((user_id, course_id), enrollment.clone());
        Ok(enrollment)
    }

    async fn get_enrollment(
        &self,
        user_id: UserId,
        course_id: CourseId,
    ) -> Result<Option<Enrollment>, StorageError> {
        let state = self.lock()?;
        Ok(state.enrollments.get(&(user_id, course_id)).cloned())
    }
}

#[async_trait]
impl ProgressRepository for InMemoryRepository {
    async fn upsert_progress(
        &self,
        report: &ProgressReport,
        now: DateTime<Utc>,
    ) -> Result<LessonProgress, StorageError> {
        let mut state = self.lock()?;
        let key = (report.user_id, report.lesson_id);
        let id = match state.progress.get(&key) {
            Some(existing) => existing.id,
            None => state.next_id(),
        };
        let merged = LessonProgress::merge(state.progress.get(&key), id, report, now);
        state.progress.insert(key, merged.clone());
        Ok(merged)
    }

    async fn get_progress(
        &self,
        user_id: UserId,
        lesson_id: LessonId,
    ) -> Result<Option<LessonProgress>, StorageError> {
        let state = self.lock()?;
        Ok(state.progress.get(&(user_id, lesson_id)).cloned())
    }
}

#[async_trait]
impl CompletionRepository for InMemoryRepository {
    async fn complete_course(
        &self,
        user_id: UserId,
        course_id: CourseId,
        certificate_url: &str,
        now: DateTime<Utc>,
    ) -> Result<CompletionOutcome, StorageError> {
        let mut state = self.lock()?;
        let tally = state.tally(user_id, course_id);
        let mut outcome = CompletionOutcome {
            user_id,
            course_id,
            tally,
            enrolled: false,
            enrollment_completed: false,
            certificate_issued: false,
        };

        let Some(enrollment) = state.enrollments.get_mut(&(user_id, course_id)) else {
            return Ok(outcome);
        };
        outcome.enrolled = true;
        if !tally.is_complete() && enrollment.completed_at.is_none() {
            return Ok(outcome);
        }
        if enrollment.completed_at.is_none() {
            enrollment.completed_at = Some(now);
            outcome.enrollment_completed = true;
        }

        if !state.certificates.contains_key(&(user_id, course_id)) {
            let certificate = Certificate {
                id: state.next_id(),
                user_id,
                course_id,
                certificate_url: certificate_url.to_owned(),
                issued_at: now,
            };
            state.certificates.insert((user_id, course_id), certificate);
            outcome.certificate_issued = true;
        }
        Ok(outcome)
    }

    async fn course_tally(
        &self,
        user_id: UserId,
        course_id: CourseId,
    ) -> Result<CourseTally, StorageError> {
        Ok(self.lock()?.tally(user_id, course_id))
    }

    async fn get_certificate(
        &self,
        user_id: UserId,
        course_id: CourseId,
    ) -> Result<Option<Certificate>, StorageError> {
        let state = self.lock()?;
        Ok(state.certificates.get(&(user_id, course_id)).cloned())
    }
}

/// Aggregates repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub courses: Arc<dyn CourseRepository>,
    pub lessons: Arc<dyn LessonRepository>,
    pub enrollments: Arc<dyn EnrollmentRepository>,
    pub progress: Arc<dyn ProgressRepository>,
    pub completion: Arc<dyn CompletionRepository>,
    pub webinars: Arc<dyn WebinarRepository>,
    pub reports: Arc<dyn ReportRepository>,
}
