#![forbid(unsafe_code)]

pub mod app_services;
pub mod course_service;
pub mod dashboard_service;
pub mod enrollment_service;
pub mod error;
pub mod progress_service;
pub mod webinar_service;

pub use lms_core::Clock;

pub use app_services::AppServices;
pub use course_service::CourseService;
pub use dashboard_service::{DASHBOARD_COURSE_LIMIT, DASHBOARD_WEBINAR_LIMIT, DashboardService};
pub use enrollment_service::EnrollmentService;
pub use error::{
    AppServicesError, CourseServiceError, DashboardServiceError, EnrollmentServiceError,
    ErrorKind, ProgressServiceError, WebinarServiceError,
};
pub use progress_service::ProgressService;
pub use webinar_service::WebinarService;
