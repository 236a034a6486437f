use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::model::course::normalize_optional;
use crate::model::ids::{CourseId, LessonId};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum LessonError {
    #[error("lesson title cannot be empty")]
    EmptyTitle,

    #[error("invalid video url: {0}")]
    InvalidVideoUrl(String),
}

/// A lesson inside a course. Read-only for progress tracking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Lesson {
    pub id: LessonId,
    pub course_id: CourseId,
    pub title: String,
    pub description: Option<String>,
    pub video_url: Option<String>,
    pub duration_minutes: u32,
    pub lesson_order: u32,
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
}

/// Unvalidated lesson input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LessonDraft {
    pub title: Option<String>,
    pub description: Option<String>,
    pub video_url: Option<String>,
    pub duration_minutes: Option<u32>,
    pub lesson_order: Option<u32>,
    pub is_published: bool,
}

impl LessonDraft {
    /// Validate the draft for the given course.
    ///
    /// # Errors
    ///
    /// Returns `LessonError` if the title is blank or the video url is malformed.
    pub fn validate(self, course_id: CourseId) -> Result<NewLesson, LessonError> {
        let title = self.title.unwrap_or_default().trim().to_owned();
        if title.is_empty() {
            return Err(LessonError::EmptyTitle);
        }
        let video_url = match normalize_optional(self.video_url) {
            None => None,
            Some(raw) => match url::Url::parse(&raw) {
                Ok(_) => Some(raw),
                Err(_) => return Err(LessonError::InvalidVideoUrl(raw)),
            },
        };
        Ok(NewLesson {
            course_id,
            title,
            description: normalize_optional(self.description),
            video_url,
            duration_minutes: self.duration_minutes.unwrap_or(0),
            lesson_order: self.lesson_order,
            is_published: self.is_published,
        })
    }
}

/// Lesson input that passed validation.
///
/// A missing `lesson_order` means "append after the last lesson of the course".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLesson {
    pub course_id: CourseId,
    pub title: String,
    pub description: Option<String>,
    pub video_url: Option<String>,
    pub duration_minutes: u32,
    pub lesson_order: Option<u32>,
    pub is_published: bool,
}
