use std::sync::Arc;

use lms_core::model::{
    Category, Course, CourseDetail, CourseDraft, CourseId, CoursePatch, CourseQuery,
    CourseSummary, Lesson, LessonDraft, NewCategory,
};
use storage::repository::{CourseRepository, LessonRepository, StorageError};

use crate::Clock;
use crate::error::CourseServiceError;

/// Catalog management: categories, courses and their lessons.
#[derive(Clone)]
pub struct CourseService {
    clock: Clock,
    courses: Arc<dyn CourseRepository>,
    lessons: Arc<dyn LessonRepository>,
}

impl CourseService {
    #[must_use]
    pub fn new(
        clock: Clock,
        courses: Arc<dyn CourseRepository>,
        lessons: Arc<dyn LessonRepository>,
    ) -> Self {
        Self {
            clock,
            courses,
            lessons,
        }
    }

    /// List published courses, newest first.
    ///
    /// # Errors
    ///
    /// Returns `CourseServiceError::Storage` if repository access fails.
    pub async fn list_courses(
        &self,
        query: &CourseQuery,
    ) -> Result<Vec<CourseSummary>, CourseServiceError> {
        Ok(self.courses.list_published_courses(query).await?)
    }

    /// Fetch a published course with its published lessons in order.
    ///
    /// # Errors
    ///
    /// Returns `CourseServiceError::NotFound` if the course is missing or
    /// unpublished.
    pub async fn get_course(&self, id: CourseId) -> Result<CourseDetail, CourseServiceError> {
        let summary = self
            .courses
            .get_published_course(id)
            .await?
            .ok_or(CourseServiceError::NotFound(id))?;
        let lessons = self.lessons.list_published_lessons(id).await?;
        Ok(CourseDetail { summary, lessons })
    }

    /// # Errors
    ///
    /// Returns `CourseServiceError::Course` for validation failures.
    /// Returns `CourseServiceError::Storage` if persistence fails, including a
    /// `NotFound` for an unknown category.
    pub async fn create_course(&self, draft: CourseDraft) -> Result<Course, CourseServiceError> {
        let course = draft.validate()?;
        let created = self.courses.insert_course(&course, self.clock.now()).await?;
        tracing::info!(course_id = %created.id, title = %created.title, "course created");
        Ok(created)
    }

    /// Apply a partial update and return the stored course.
    ///
    /// # Errors
    ///
    /// Returns `CourseServiceError::Course` for an empty or invalid patch,
    /// checked before the course is loaded.
    /// Returns `CourseServiceError::NotFound` if the course does not exist.
    pub async fn update_course(
        &self,
        id: CourseId,
        patch: CoursePatch,
    ) -> Result<Course, CourseServiceError> {
        if patch.is_empty() {
            return Err(lms_core::model::CourseError::EmptyPatch.into());
        }
        let mut course = self
            .courses
            .get_course(id)
            .await?
            .ok_or(CourseServiceError::NotFound(id))?;
        course.apply_patch(patch, self.clock.now())?;
        self.courses.update_course(&course).await?;
        Ok(course)
    }

    /// Delete a course together with its lessons, enrollments, progress and
    /// certificates.
    ///
    /// # Errors
    ///
    /// Returns `CourseServiceError::NotFound` if the course does not exist.
    pub async fn delete_course(&self, id: CourseId) -> Result<(), CourseServiceError> {
        if !self.courses.delete_course(id).await? {
            return Err(CourseServiceError::NotFound(id));
        }
        tracing::info!(course_id = %id, "course deleted");
        Ok(())
    }

    /// Append (or insert at `lesson_order`) a lesson to a course.
    ///
    /// # Errors
    ///
    /// Returns `CourseServiceError::Lesson` for validation failures.
    /// Returns `CourseServiceError::NotFound` if the course does not exist.
    pub async fn add_lesson(
        &self,
        course_id: CourseId,
        draft: LessonDraft,
    ) -> Result<Lesson, CourseServiceError> {
        let lesson = draft.validate(course_id)?;
        if self.courses.get_course(course_id).await?.is_none() {
            return Err(CourseServiceError::NotFound(course_id));
        }
        match self.lessons.insert_lesson(&lesson, self.clock.now()).await {
            Ok(lesson) => Ok(lesson),
            Err(StorageError::NotFound) => Err(CourseServiceError::NotFound(course_id)),
            Err(e) => Err(e.into()),
        }
    }

    /// # Errors
    ///
    /// Returns `CourseServiceError::Course` if the name is blank.
    /// Returns `CourseServiceError::DuplicateCategory` if the name is taken.
    pub async fn create_category(
        &self,
        name: String,
        color: Option<String>,
    ) -> Result<Category, CourseServiceError> {
        let category = NewCategory::new(name, color)?;
        match self.courses.insert_category(&category).await {
            Ok(category) => Ok(category),
            Err(StorageError::Conflict) => Err(CourseServiceError::DuplicateCategory),
            Err(e) => Err(e.into()),
        }
    }
}
