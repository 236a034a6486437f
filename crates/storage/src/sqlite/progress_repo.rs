use chrono::{DateTime, Utc};
use lms_core::model::{LessonId, LessonProgress, ProgressReport, UserId};

use super::SqliteRepository;
use super::mapping::{conn, id_to_i64, map_progress_row, write_err};
use crate::repository::{ProgressRepository, StorageError};

#[async_trait::async_trait]
impl ProgressRepository for SqliteRepository {
    async fn upsert_progress(
        &self,
        report: &ProgressReport,
        now: DateTime<Utc>,
    ) -> Result<LessonProgress, StorageError> {
        // is_completed never goes back to 0 and completed_at keeps its first value.
        let row = sqlx::query(
            r"
            INSERT INTO lesson_progress (user_id, lesson_id, watched_duration_minutes,
                is_completed, completed_at, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)
            ON CONFLICT(user_id, lesson_id) DO UPDATE SET
                watched_duration_minutes = excluded.watched_duration_minutes,
                is_completed = MAX(lesson_progress.is_completed, excluded.is_completed),
                completed_at = COALESCE(lesson_progress.completed_at, excluded.completed_at),
                updated_at = excluded.updated_at
            RETURNING id, user_id, lesson_id, watched_duration_minutes, is_completed,
                completed_at, updated_at
            ",
        )
        .bind(id_to_i64("user_id", report.user_id.value())?)
        .bind(id_to_i64("lesson_id", report.lesson_id.value())?)
        .bind(i64::from(report.watched_minutes))
        .bind(report.is_completed)
        .bind(report.is_completed.then_some(now))
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(write_err)?;

        map_progress_row(&row)
    }

    async fn get_progress(
        &self,
        user_id: UserId,
        lesson_id: LessonId,
    ) -> Result<Option<LessonProgress>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT id, user_id, lesson_id, watched_duration_minutes, is_completed,
                completed_at, updated_at
            FROM lesson_progress
            WHERE user_id = ?1 AND lesson_id = ?2
            ",
        )
        .bind(id_to_i64("user_id", user_id.value())?)
        .bind(id_to_i64("lesson_id", lesson_id.value())?)
        .fetch_optional(&self.pool)
        .await
        .map_err(conn)?;

        row.as_ref().map(map_progress_row).transpose()
    }
}
