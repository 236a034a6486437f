use std::sync::Arc;

use lms_core::model::{
    Certificate, CourseId, Dashboard, EnrolledWebinar, ProgressEntry, UserId,
};
use storage::repository::{ReportRepository, WebinarRepository};

use crate::Clock;
use crate::error::DashboardServiceError;

/// Enrolled courses shown on the dashboard, most recent first.
pub const DASHBOARD_COURSE_LIMIT: u32 = 12;
/// Upcoming webinars shown on the dashboard, earliest first.
pub const DASHBOARD_WEBINAR_LIMIT: u32 = 8;

/// Read-only views over a learner's progress.
#[derive(Clone)]
pub struct DashboardService {
    clock: Clock,
    reports: Arc<dyn ReportRepository>,
    webinars: Arc<dyn WebinarRepository>,
}

impl DashboardService {
    #[must_use]
    pub fn new(
        clock: Clock,
        reports: Arc<dyn ReportRepository>,
        webinars: Arc<dyn WebinarRepository>,
    ) -> Self {
        Self {
            clock,
            reports,
            webinars,
        }
    }

    /// Aggregate stats, enrolled courses with progress, and enrolled webinars.
    ///
    /// # Errors
    ///
    /// Returns `DashboardServiceError::MissingUserId` without a user.
    /// Returns `DashboardServiceError::Storage` if a read fails.
    pub async fn get_user_dashboard(
        &self,
        user_id: Option<UserId>,
    ) -> Result<Dashboard, DashboardServiceError> {
        let user_id = user_id.ok_or(DashboardServiceError::MissingUserId)?;
        let now = self.clock.now();

        let stats = self.reports.dashboard_stats(user_id).await?;
        let enrolled_courses = self
            .reports
            .enrolled_courses(user_id, Some(DASHBOARD_COURSE_LIMIT))
            .await?;
        let enrolled_webinars = self
            .webinars
            .list_enrolled_webinars(user_id, DASHBOARD_WEBINAR_LIMIT)
            .await?
            .into_iter()
            .map(|(webinar, enrolled_at)| EnrolledWebinar::at(webinar, enrolled_at, now))
            .collect();

        Ok(Dashboard {
            stats,
            enrolled_courses,
            enrolled_webinars,
        })
    }

    /// Progress rows joined with lesson and course details, optionally for one
    /// course.
    ///
    /// # Errors
    ///
    /// Returns `DashboardServiceError::MissingUserId` without a user.
    /// Returns `DashboardServiceError::Storage` if the read fails.
    pub async fn list_progress(
        &self,
        user_id: Option<UserId>,
        course_id: Option<CourseId>,
    ) -> Result<Vec<ProgressEntry>, DashboardServiceError> {
        let user_id = user_id.ok_or(DashboardServiceError::MissingUserId)?;
        Ok(self.reports.progress_entries(user_id, course_id).await?)
    }

    /// # Errors
    ///
    /// Returns `DashboardServiceError::MissingUserId` without a user.
    /// Returns `DashboardServiceError::Storage` if the read fails.
    pub async fn certificates(
        &self,
        user_id: Option<UserId>,
    ) -> Result<Vec<Certificate>, DashboardServiceError> {
        let user_id = user_id.ok_or(DashboardServiceError::MissingUserId)?;
        Ok(self.reports.certificates(user_id).await?)
    }
}
