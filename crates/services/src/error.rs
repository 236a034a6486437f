//! Shared error types for the services crate.

use thiserror::Error;

use lms_core::model::{
    CertificateError, CourseError, CourseId, LessonError, LessonId, ProgressError, WebinarError,
    WebinarId,
};
use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

/// Coarse classification transports use to pick a response status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    NotFound,
    Conflict,
    Internal,
}

fn storage_kind(err: &StorageError) -> ErrorKind {
    match err {
        StorageError::NotFound => ErrorKind::NotFound,
        StorageError::Conflict => ErrorKind::Conflict,
        _ => ErrorKind::Internal,
    }
}

/// Errors emitted by `ProgressService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProgressServiceError {
    #[error(transparent)]
    Invalid(#[from] ProgressError),
    #[error("lesson {0} not found")]
    LessonNotFound(LessonId),
    /// The progress row was saved but the completion cascade failed.
    #[error("failed to update course completion")]
    Cascade(#[source] StorageError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl ProgressServiceError {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Invalid(_) => ErrorKind::Validation,
            Self::LessonNotFound(_) => ErrorKind::NotFound,
            Self::Cascade(_) => ErrorKind::Internal,
            Self::Storage(e) => storage_kind(e),
        }
    }
}

/// Errors emitted by `DashboardService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DashboardServiceError {
    #[error("user id is required")]
    MissingUserId,
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl DashboardServiceError {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MissingUserId => ErrorKind::Validation,
            // Read-only: a storage failure here is never the caller's fault.
            Self::Storage(_) => ErrorKind::Internal,
        }
    }
}

/// Errors emitted by `CourseService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CourseServiceError {
    #[error(transparent)]
    Course(#[from] CourseError),
    #[error(transparent)]
    Lesson(#[from] LessonError),
    #[error("course {0} not found")]
    NotFound(CourseId),
    #[error("category already exists")]
    DuplicateCategory,
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl CourseServiceError {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Course(_) | Self::Lesson(_) => ErrorKind::Validation,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::DuplicateCategory => ErrorKind::Conflict,
            Self::Storage(e) => storage_kind(e),
        }
    }
}

/// Errors emitted by `EnrollmentService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum EnrollmentServiceError {
    #[error(transparent)]
    Invalid(#[from] ProgressError),
    #[error("course {0} not found")]
    CourseNotFound(CourseId),
    #[error("already enrolled in course {0}")]
    AlreadyEnrolled(CourseId),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl EnrollmentServiceError {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Invalid(_) => ErrorKind::Validation,
            Self::CourseNotFound(_) => ErrorKind::NotFound,
            Self::AlreadyEnrolled(_) => ErrorKind::Conflict,
            Self::Storage(e) => storage_kind(e),
        }
    }
}

/// Errors emitted by `WebinarService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum WebinarServiceError {
    #[error(transparent)]
    Webinar(#[from] WebinarError),
    #[error("user id is required")]
    MissingUserId,
    #[error("webinar id is required")]
    MissingWebinarId,
    #[error("webinar {0} not found")]
    NotFound(WebinarId),
    #[error("already registered for webinar {0}")]
    AlreadyEnrolled(WebinarId),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl WebinarServiceError {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Webinar(_) | Self::MissingUserId | Self::MissingWebinarId => {
                ErrorKind::Validation
            }
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::AlreadyEnrolled(_) => ErrorKind::Conflict,
            Self::Storage(e) => storage_kind(e),
        }
    }
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
    #[error(transparent)]
    Certificate(#[from] CertificateError),
}
