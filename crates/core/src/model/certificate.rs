use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::model::ids::{CourseId, UserId};

/// Base URL used when none is configured.
pub const DEFAULT_CERTIFICATE_BASE_URL: &str = "https://certificates.example.com";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CertificateError {
    #[error("invalid certificate base url: {0}")]
    InvalidBaseUrl(String),
}

/// Proof that a user completed a course. At most one per (user, course).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Certificate {
    pub id: i64,
    pub user_id: UserId,
    pub course_id: CourseId,
    pub certificate_url: String,
    pub issued_at: DateTime<Utc>,
}

/// Deterministic certificate location: `<base>/user-<user>-course-<course>.pdf`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificateTemplate {
    base: String,
}

impl CertificateTemplate {
    /// # Errors
    ///
    /// Returns `CertificateError::InvalidBaseUrl` unless `base` is an absolute
    /// http(s) URL.
    pub fn new(base: &str) -> Result<Self, CertificateError> {
        let trimmed = base.trim().trim_end_matches('/');
        let parsed = url::Url::parse(trimmed)
            .map_err(|_| CertificateError::InvalidBaseUrl(base.to_owned()))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(CertificateError::InvalidBaseUrl(base.to_owned()));
        }
        Ok(Self {
            base: trimmed.to_owned(),
        })
    }

    #[must_use]
    pub fn base(&self) -> &str {
        &self.base
    }

    #[must_use]
    pub fn url_for(&self, user_id: UserId, course_id: CourseId) -> String {
        format!("{}/user-{user_id}-course-{course_id}.pdf", self.base)
    }
}

impl Default for CertificateTemplate {
    fn default() -> Self {
        Self {
            base: DEFAULT_CERTIFICATE_BASE_URL.to_owned(),
        }
    }
}
