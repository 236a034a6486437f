use std::sync::Arc;

use lms_core::model::{
    CertificateTemplate, CompletionOutcome, CourseId, LessonProgress, ProgressError,
    ProgressReport, UserId,
};
use storage::repository::{CompletionRepository, LessonRepository, ProgressRepository};

use crate::Clock;
use crate::error::ProgressServiceError;

/// Records lesson progress and drives the completion cascade.
///
/// A completed report may complete the enrollment and issue the certificate
/// of the lesson's course. Every step is idempotent, so replaying a report or
/// reconciling a course any number of times converges on the same state.
#[derive(Clone)]
pub struct ProgressService {
    clock: Clock,
    certificates: CertificateTemplate,
    lessons: Arc<dyn LessonRepository>,
    progress: Arc<dyn ProgressRepository>,
    completion: Arc<dyn CompletionRepository>,
}

impl ProgressService {
    #[must_use]
    pub fn new(
        clock: Clock,
        certificates: CertificateTemplate,
        lessons: Arc<dyn LessonRepository>,
        progress: Arc<dyn ProgressRepository>,
        completion: Arc<dyn CompletionRepository>,
    ) -> Self {
        Self {
            clock,
            certificates,
            lessons,
            progress,
            completion,
        }
    }

    /// Persist a progress report and, when it completes the lesson, run the
    /// completion cascade for the owning course.
    ///
    /// # Errors
    ///
    /// Returns `ProgressServiceError::LessonNotFound` if the lesson is missing
    /// or unpublished; nothing is written in that case.
    /// Returns `ProgressServiceError::Cascade` if the progress row was saved
    /// but the cascade failed. Reconciling the course later repairs it.
    /// Returns `ProgressServiceError::Storage` if persistence fails.
    pub async fn record_lesson_progress(
        &self,
        report: ProgressReport,
    ) -> Result<LessonProgress, ProgressServiceError> {
        let lesson = self
            .lessons
            .get_published_lesson(report.lesson_id)
            .await?
            .ok_or(ProgressServiceError::LessonNotFound(report.lesson_id))?;

        let now = self.clock.now();
        let progress = self.progress.upsert_progress(&report, now).await?;
        tracing::debug!(
            user_id = %report.user_id,
            lesson_id = %report.lesson_id,
            watched = progress.watched_duration_minutes,
            completed = progress.is_completed,
            "lesson progress saved"
        );

        if report.is_completed {
            self.cascade(report.user_id, lesson.course_id)
                .await
                .map_err(ProgressServiceError::Cascade)?;
        }
        Ok(progress)
    }

    /// Re-run the completion cascade for a user and course without a new
    /// progress event.
    ///
    /// # Errors
    ///
    /// Returns `ProgressServiceError::Invalid` if an id is missing.
    /// Returns `ProgressServiceError::Storage` if the cascade fails.
    pub async fn reconcile_course(
        &self,
        user_id: Option<UserId>,
        course_id: Option<CourseId>,
    ) -> Result<CompletionOutcome, ProgressServiceError> {
        let user_id = user_id.ok_or(ProgressError::MissingUserId)?;
        let course_id = course_id.ok_or(ProgressError::MissingCourseId)?;
        Ok(self.cascade(user_id, course_id).await?)
    }

    async fn cascade(
        &self,
        user_id: UserId,
        course_id: CourseId,
    ) -> Result<CompletionOutcome, storage::repository::StorageError> {
        let url = self.certificates.url_for(user_id, course_id);
        let outcome = self
            .completion
            .complete_course(user_id, course_id, &url, self.clock.now())
            .await
            .inspect_err(|err| {
                tracing::error!(
                    user_id = %user_id,
                    course_id = %course_id,
                    error = %err,
                    "completion cascade failed"
                );
            })?;

        if outcome.enrollment_completed {
            tracing::info!(user_id = %user_id, course_id = %course_id, "enrollment completed");
        }
        if outcome.certificate_issued {
            tracing::info!(
                user_id = %user_id,
                course_id = %course_id,
                url = %url,
                "certificate issued"
            );
        }
        Ok(outcome)
    }
}
