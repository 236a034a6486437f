use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::model::ids::{CategoryId, CourseId};
use crate::model::lesson::Lesson;

/// Upper bound for a single catalog page.
pub const MAX_PAGE_SIZE: u32 = 100;
/// Page size used when the caller does not ask for one.
pub const DEFAULT_PAGE_SIZE: u32 = 20;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CourseError {
    #[error("course title cannot be empty")]
    EmptyTitle,

    #[error("course instructor cannot be empty")]
    EmptyInstructor,

    #[error("category name cannot be empty")]
    EmptyCategoryName,

    #[error("duration hours must be a finite, non-negative number")]
    InvalidDuration,

    #[error("invalid difficulty level: {0}")]
    InvalidDifficulty(String),

    #[error("invalid thumbnail url: {0}")]
    InvalidThumbnailUrl(String),

    #[error("no fields to update")]
    EmptyPatch,
}

//
// ─── DIFFICULTY ────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Beginner,
    Intermediate,
    Advanced,
}

impl Difficulty {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Difficulty::Beginner => "beginner",
            Difficulty::Intermediate => "intermediate",
            Difficulty::Advanced => "advanced",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Difficulty {
    type Err = CourseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "beginner" => Ok(Self::Beginner),
            "intermediate" => Ok(Self::Intermediate),
            "advanced" => Ok(Self::Advanced),
            _ => Err(CourseError::InvalidDifficulty(s.to_owned())),
        }
    }
}

//
// ─── CATEGORY ──────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub color: Option<String>,
}

/// Validated input for a new category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCategory {
    pub name: String,
    pub color: Option<String>,
}

impl NewCategory {
    /// # Errors
    ///
    /// Returns `CourseError::EmptyCategoryName` if the name is blank.
    pub fn new(name: impl Into<String>, color: Option<String>) -> Result<Self, CourseError> {
        let name = name.into().trim().to_owned();
        if name.is_empty() {
            return Err(CourseError::EmptyCategoryName);
        }
        Ok(Self {
            name,
            color: normalize_optional(color),
        })
    }
}

//
// ─── COURSE ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    pub id: CourseId,
    pub title: String,
    pub description: Option<String>,
    pub instructor: String,
    pub thumbnail_url: Option<String>,
    pub category_id: Option<CategoryId>,
    pub duration_hours: Option<f64>,
    pub difficulty: Option<Difficulty>,
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Course {
    /// Apply a partial update in place and bump `updated_at`.
    ///
    /// Every provided field is validated before anything is written, so a
    /// rejected patch leaves the course untouched.
    ///
    /// # Errors
    ///
    /// Returns `CourseError::EmptyPatch` when the patch carries no field, or the
    /// validation error of the first invalid field.
    pub fn apply_patch(&mut self, patch: CoursePatch, now: DateTime<Utc>) -> Result<(), CourseError> {
        if patch.is_empty() {
            return Err(CourseError::EmptyPatch);
        }

        let title = patch.title.map(|t| required(t, CourseError::EmptyTitle)).transpose()?;
        let instructor = patch
            .instructor
            .map(|i| required(i, CourseError::EmptyInstructor))
            .transpose()?;
        let thumbnail_url = patch
            .thumbnail_url
            .map(validate_thumbnail)
            .transpose()?;
        let duration_hours = patch.duration_hours.map(validate_duration).transpose()?;

        if let Some(title) = title {
            self.title = title;
        }
        if let Some(instructor) = instructor {
            self.instructor = instructor;
        }
        if let Some(description) = patch.description {
            self.description = normalize_optional(description);
        }
        if let Some(thumbnail_url) = thumbnail_url {
            self.thumbnail_url = thumbnail_url;
        }
        if let Some(category_id) = patch.category_id {
            self.category_id = category_id;
        }
        if let Some(duration_hours) = duration_hours {
            self.duration_hours = duration_hours;
        }
        if let Some(difficulty) = patch.difficulty {
            self.difficulty = difficulty;
        }
        if let Some(is_published) = patch.is_published {
            self.is_published = is_published;
        }
        self.updated_at = now;
        Ok(())
    }
}

/// Unvalidated course input as received from callers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CourseDraft {
    pub title: Option<String>,
    pub description: Option<String>,
    pub instructor: Option<String>,
    pub thumbnail_url: Option<String>,
    pub category_id: Option<CategoryId>,
    pub duration_hours: Option<f64>,
    pub difficulty: Option<Difficulty>,
    pub is_published: bool,
}

impl CourseDraft {
    /// Validate the draft into a course ready for insertion.
    ///
    /// # Errors
    ///
    /// Returns `CourseError` if title or instructor are missing, or if an
    /// optional field is malformed.
    pub fn validate(self) -> Result<NewCourse, CourseError> {
        let title = required(self.title.unwrap_or_default(), CourseError::EmptyTitle)?;
        let instructor =
            required(self.instructor.unwrap_or_default(), CourseError::EmptyInstructor)?;
        Ok(NewCourse {
            title,
            description: normalize_optional(self.description),
            instructor,
            thumbnail_url: validate_thumbnail(self.thumbnail_url)?,
            category_id: self.category_id,
            duration_hours: validate_duration(self.duration_hours)?,
            difficulty: self.difficulty,
            is_published: self.is_published,
        })
    }
}

/// Course input that passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct NewCourse {
    pub title: String,
    pub description: Option<String>,
    pub instructor: String,
    pub thumbnail_url: Option<String>,
    pub category_id: Option<CategoryId>,
    pub duration_hours: Option<f64>,
    pub difficulty: Option<Difficulty>,
    pub is_published: bool,
}

/// Declarative partial update: one entry per field.
///
/// `None` leaves the field alone. For nullable columns the inner `Option`
/// carries the new value, so `Some(None)` clears it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CoursePatch {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub instructor: Option<String>,
    pub thumbnail_url: Option<Option<String>>,
    pub category_id: Option<Option<CategoryId>>,
    pub duration_hours: Option<Option<f64>>,
    pub difficulty: Option<Option<Difficulty>>,
    pub is_published: Option<bool>,
}

impl CoursePatch {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.instructor.is_none()
            && self.thumbnail_url.is_none()
            && self.category_id.is_none()
            && self.duration_hours.is_none()
            && self.difficulty.is_none()
            && self.is_published.is_none()
    }
}

//
// ─── READ MODELS ───────────────────────────────────────────────────────────────
//

/// Catalog row: a course with its category label and counters.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseSummary {
    #[serde(flatten)]
    pub course: Course,
    pub category_name: Option<String>,
    pub category_color: Option<String>,
    pub enrolled_count: u32,
    pub lesson_count: u32,
}

/// A published course with its published lessons in order.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseDetail {
    #[serde(flatten)]
    pub summary: CourseSummary,
    pub lessons: Vec<Lesson>,
}

/// Filters for listing the published catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CourseQuery {
    pub category: Option<String>,
    pub search: Option<String>,
    pub limit: u32,
    pub offset: u32,
}

impl CourseQuery {
    /// Build a query, applying the default page size and clamping the limit.
    #[must_use]
    pub fn new(
        category: Option<String>,
        search: Option<String>,
        limit: Option<u32>,
        offset: Option<u32>,
    ) -> Self {
        let limit = match limit {
            None | Some(0) => DEFAULT_PAGE_SIZE,
            Some(n) => n.min(MAX_PAGE_SIZE),
        };
        Self {
            category: normalize_optional(category),
            search: normalize_optional(search),
            limit,
            offset: offset.unwrap_or(0),
        }
    }

    /// `LIKE` pattern for the search term, with wildcard characters escaped.
    #[must_use]
    pub fn search_pattern(&self) -> Option<String> {
        self.search.as_ref().map(|term| {
            let escaped = term
                .to_lowercase()
                .replace('\\', "\\\\")
                .replace('%', "\\%")
                .replace('_', "\\_");
            format!("%{escaped}%")
        })
    }
}

impl Default for CourseQuery {
    fn default() -> Self {
        Self::new(None, None, None, None)
    }
}

//
// ─── HELPERS ───────────────────────────────────────────────────────────────────
//

fn required(value: String, err: CourseError) -> Result<String, CourseError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(err);
    }
    Ok(trimmed.to_owned())
}

pub(crate) fn normalize_optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}

fn validate_thumbnail(value: Option<String>) -> Result<Option<String>, CourseError> {
    match normalize_optional(value) {
        None => Ok(None),
        Some(raw) => match url::Url::parse(&raw) {
            Ok(_) => Ok(Some(raw)),
            Err(_) => Err(CourseError::InvalidThumbnailUrl(raw)),
        },
    }
}

fn validate_duration(value: Option<f64>) -> Result<Option<f64>, CourseError> {
    match value {
        Some(h) if !h.is_finite() || h < 0.0 => Err(CourseError::InvalidDuration),
        other => Ok(other),
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    fn sample_course() -> Course {
        let new = CourseDraft {
            title: Some("Rust Basics".into()),
            instructor: Some("Ferris".into()),
            ..CourseDraft::default()
        }
        .validate()
        .unwrap();
        Course {
            id: CourseId::new(1),
            title: new.title,
            description: new.description,
            instructor: new.instructor,
            thumbnail_url: new.thumbnail_url,
            category_id: new.category_id,
            duration_hours: new.duration_hours,
            difficulty: new.difficulty,
            is_published: new.is_published,
            created_at: fixed_now(),
            updated_at: fixed_now(),
        }
    }

    #[test]
    fn draft_requires_title_and_instructor() {
        let err = CourseDraft {
            instructor: Some("Ferris".into()),
            ..CourseDraft::default()
        }
        .validate()
        .unwrap_err();
        assert_eq!(err, CourseError::EmptyTitle);

        let err = CourseDraft {
            title: Some("Rust".into()),
            instructor: Some("   ".into()),
            ..CourseDraft::default()
        }
        .validate()
        .unwrap_err();
        assert_eq!(err, CourseError::EmptyInstructor);
    }

    #[test]
    fn draft_rejects_bad_thumbnail() {
        let err = CourseDraft {
            title: Some("Rust".into()),
            instructor: Some("Ferris".into()),
            thumbnail_url: Some("not a url".into()),
            ..CourseDraft::default()
        }
        .validate()
        .unwrap_err();
        assert!(matches!(err, CourseError::InvalidThumbnailUrl(_)));
    }

    #[test]
    fn empty_patch_is_rejected() {
        let mut course = sample_course();
        let err = course
            .apply_patch(CoursePatch::default(), fixed_now())
            .unwrap_err();
        assert_eq!(err, CourseError::EmptyPatch);
    }

    #[test]
    fn patch_updates_only_provided_fields() {
        let mut course = sample_course();
        course.description = Some("old".into());
        let later = fixed_now() + chrono::Duration::hours(1);

        course
            .apply_patch(
                CoursePatch {
                    title: Some("Rust Deep Dive".into()),
                    description: Some(None),
                    is_published: Some(true),
                    ..CoursePatch::default()
                },
                later,
            )
            .unwrap();

        assert_eq!(course.title, "Rust Deep Dive");
        assert_eq!(course.instructor, "Ferris");
        assert_eq!(course.description, None);
        assert!(course.is_published);
        assert_eq!(course.updated_at, later);
    }

    #[test]
    fn invalid_patch_leaves_course_untouched() {
        let mut course = sample_course();
        let before = course.clone();
        let err = course
            .apply_patch(
                CoursePatch {
                    title: Some("New".into()),
                    duration_hours: Some(Some(-1.0)),
                    ..CoursePatch::default()
                },
                fixed_now(),
            )
            .unwrap_err();
        assert_eq!(err, CourseError::InvalidDuration);
        assert_eq!(course, before);
    }

    #[test]
    fn query_clamps_limit_and_escapes_search() {
        let q = CourseQuery::new(None, Some(" 100%_Rust ".into()), Some(500), None);
        assert_eq!(q.limit, MAX_PAGE_SIZE);
        assert_eq!(q.offset, 0);
        assert_eq!(q.search_pattern().as_deref(), Some("%100\\%\\_rust%"));

        let q = CourseQuery::new(Some("  ".into()), None, None, Some(40));
        assert_eq!(q.category, None);
        assert_eq!(q.limit, DEFAULT_PAGE_SIZE);
        assert_eq!(q.offset, 40);
    }

    #[test]
    fn difficulty_parses_case_insensitively() {
        assert_eq!("Advanced".parse::<Difficulty>().unwrap(), Difficulty::Advanced);
        assert!("expert".parse::<Difficulty>().is_err());
    }
}
