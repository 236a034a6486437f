use std::sync::Arc;

use lms_core::model::{CourseId, EnrolledCourse, Enrollment, ProgressError, UserId};
use storage::repository::{CourseRepository, EnrollmentRepository, ReportRepository, StorageError};

use crate::Clock;
use crate::error::EnrollmentServiceError;

/// Joins users to published courses and lists what they are enrolled in.
#[derive(Clone)]
pub struct EnrollmentService {
    clock: Clock,
    courses: Arc<dyn CourseRepository>,
    enrollments: Arc<dyn EnrollmentRepository>,
    reports: Arc<dyn ReportRepository>,
}

impl EnrollmentService {
    #[must_use]
    pub fn new(
        clock: Clock,
        courses: Arc<dyn CourseRepository>,
        enrollments: Arc<dyn EnrollmentRepository>,
        reports: Arc<dyn ReportRepository>,
    ) -> Self {
        Self {
            clock,
            courses,
            enrollments,
            reports,
        }
    }

    /// # Errors
    ///
    /// Returns `EnrollmentServiceError::Invalid` if an id is missing.
    /// Returns `EnrollmentServiceError::CourseNotFound` for an unknown or
    /// unpublished course.
    /// Returns `EnrollmentServiceError::AlreadyEnrolled` if the pair exists;
    /// the unique constraint decides when two requests race.
    pub async fn enroll(
        &self,
        user_id: Option<UserId>,
        course_id: Option<CourseId>,
    ) -> Result<Enrollment, EnrollmentServiceError> {
        let user_id = user_id.ok_or(ProgressError::MissingUserId)?;
        let course_id = course_id.ok_or(ProgressError::MissingCourseId)?;

        if self.courses.get_published_course(course_id).await?.is_none() {
            return Err(EnrollmentServiceError::CourseNotFound(course_id));
        }

        match self
            .enrollments
            .insert_enrollment(user_id, course_id, self.clock.now())
            .await
        {
            Ok(enrollment) => {
                tracing::info!(user_id = %user_id, course_id = %course_id, "user enrolled");
                Ok(enrollment)
            }
            Err(StorageError::Conflict) => Err(EnrollmentServiceError::AlreadyEnrolled(course_id)),
            Err(StorageError::NotFound) => Err(EnrollmentServiceError::CourseNotFound(course_id)),
            Err(e) => Err(e.into()),
        }
    }

    /// Every enrolled published course with progress, most recent first.
    ///
    /// # Errors
    ///
    /// Returns `EnrollmentServiceError::Invalid` without a user.
    /// Returns `EnrollmentServiceError::Storage` if the read fails.
    pub async fn list_enrollments(
        &self,
        user_id: Option<UserId>,
    ) -> Result<Vec<EnrolledCourse>, EnrollmentServiceError> {
        let user_id = user_id.ok_or(ProgressError::MissingUserId)?;
        Ok(self.reports.enrolled_courses(user_id, None).await?)
    }
}
