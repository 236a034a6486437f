use chrono::{DateTime, Utc};
use lms_core::model::{CourseId, Lesson, LessonId, NewLesson};

use super::SqliteRepository;
use super::mapping::{conn, id_to_i64, map_lesson_row, write_err};
use crate::repository::{LessonRepository, StorageError};

#[async_trait::async_trait]
impl LessonRepository for SqliteRepository {
    async fn insert_lesson(
        &self,
        lesson: &NewLesson,
        now: DateTime<Utc>,
    ) -> Result<Lesson, StorageError> {
        // A missing position appends after the current last lesson.
        let row = sqlx::query(
            r"
            INSERT INTO lessons (course_id, title, description, video_url, duration_minutes,
                lesson_order, is_published, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5,
                COALESCE(?6, (SELECT COALESCE(MAX(lesson_order), 0) + 1 FROM lessons WHERE course_id = ?1)),
                ?7, ?8)
            RETURNING id, course_id, title, description, video_url, duration_minutes,
                lesson_order, is_published, created_at
            ",
        )
        .bind(id_to_i64("course_id", lesson.course_id.value())?)
        .bind(lesson.title.as_str())
        .bind(lesson.description.as_deref())
        .bind(lesson.video_url.as_deref())
        .bind(i64::from(lesson.duration_minutes))
        .bind(lesson.lesson_order.map(i64::from))
        .bind(lesson.is_published)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(write_err)?;

        map_lesson_row(&row)
    }

    async fn get_published_lesson(&self, id: LessonId) -> Result<Option<Lesson>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT id, course_id, title, description, video_url, duration_minutes,
                lesson_order, is_published, created_at
            FROM lessons
            WHERE id = ?1 AND is_published = 1
            ",
        )
        .bind(id_to_i64("lesson_id", id.value())?)
        .fetch_optional(&self.pool)
        .await
        .map_err(conn)?;

        row.as_ref().map(map_lesson_row).transpose()
    }

    async fn list_published_lessons(
        &self,
        course_id: CourseId,
    ) -> Result<Vec<Lesson>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT id, course_id, title, description, video_url, duration_minutes,
                lesson_order, is_published, created_at
            FROM lessons
            WHERE course_id = ?1 AND is_published = 1
            ORDER BY lesson_order ASC, id ASC
            ",
        )
        .bind(id_to_i64("course_id", course_id.value())?)
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        rows.iter().map(map_lesson_row).collect()
    }
}
