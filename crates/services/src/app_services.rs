use std::sync::Arc;

use lms_core::model::CertificateTemplate;
use storage::repository::Storage;

use crate::Clock;
use crate::course_service::CourseService;
use crate::dashboard_service::DashboardService;
use crate::enrollment_service::EnrollmentService;
use crate::error::AppServicesError;
use crate::progress_service::ProgressService;
use crate::webinar_service::WebinarService;

/// Assembles the services exposed over HTTP from one `Storage`.
#[derive(Clone)]
pub struct AppServices {
    progress: Arc<ProgressService>,
    dashboard: Arc<DashboardService>,
    courses: Arc<CourseService>,
    enrollments: Arc<EnrollmentService>,
    webinars: Arc<WebinarService>,
}

impl AppServices {
    /// Build services backed by `SQLite` storage.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if the certificate base url is invalid or
    /// storage initialization fails.
    pub async fn new_sqlite(
        db_url: &str,
        clock: Clock,
        certificate_base_url: &str,
    ) -> Result<Self, AppServicesError> {
        let certificates = CertificateTemplate::new(certificate_base_url)?;
        let storage = Storage::sqlite(db_url).await?;
        Ok(Self::from_storage(&storage, clock, certificates))
    }

    #[must_use]
    pub fn from_storage(storage: &Storage, clock: Clock, certificates: CertificateTemplate) -> Self {
        let progress = Arc::new(ProgressService::new(
            clock,
            certificates,
            Arc::clone(&storage.lessons),
            Arc::clone(&storage.progress),
            Arc::clone(&storage.completion),
        ));
        let dashboard = Arc::new(DashboardService::new(
            clock,
            Arc::clone(&storage.reports),
            Arc::clone(&storage.webinars),
        ));
        let courses = Arc::new(CourseService::new(
            clock,
            Arc::clone(&storage.courses),
            Arc::clone(&storage.lessons),
        ));
        let enrollments = Arc::new(EnrollmentService::new(
            clock,
            Arc::clone(&storage.courses),
            Arc::clone(&storage.enrollments),
            Arc::clone(&storage.reports),
        ));
        let webinars = Arc::new(WebinarService::new(clock, Arc::clone(&storage.webinars)));

        Self {
            progress,
            dashboard,
            courses,
            enrollments,
            webinars,
        }
    }

    #[must_use]
    pub fn progress(&self) -> Arc<ProgressService> {
        Arc::clone(&self.progress)
    }

    #[must_use]
    pub fn dashboard(&self) -> Arc<DashboardService> {
        Arc::clone(&self.dashboard)
    }

    #[must_use]
    pub fn courses(&self) -> Arc<CourseService> {
        Arc::clone(&self.courses)
    }

    #[must_use]
    pub fn enrollments(&self) -> Arc<EnrollmentService> {
        Arc::clone(&self.enrollments)
    }

    #[must_use]
    pub fn webinars(&self) -> Arc<WebinarService> {
        Arc::clone(&self.webinars)
    }
}
