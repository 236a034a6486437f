use chrono::{DateTime, Utc};
use lms_core::model::{Certificate, CompletionOutcome, CourseId, CourseTally, UserId};
use sqlx::Row;

use super::SqliteRepository;
use super::mapping::{conn, id_to_i64, map_certificate_row, map_tally_row, ser, write_err};
use crate::repository::{CompletionRepository, StorageError};

/// Published lessons of course `?2` and how many of them user `?1` completed.
const TALLY_SQL: &str = r"
    SELECT
        (SELECT COUNT(*) FROM lessons
            WHERE course_id = ?2 AND is_published = 1) AS total_lessons,
        (SELECT COUNT(*) FROM lesson_progress lp
            JOIN lessons l ON l.id = lp.lesson_id
            WHERE lp.user_id = ?1 AND l.course_id = ?2
              AND l.is_published = 1 AND lp.is_completed = 1) AS completed_lessons,
        EXISTS (SELECT 1 FROM enrollments
            WHERE user_id = ?1 AND course_id = ?2) AS enrolled
";

#[async_trait::async_trait]
impl CompletionRepository for SqliteRepository {
    async fn complete_course(
        &self,
        user_id: UserId,
        course_id: CourseId,
        certificate_url: &str,
        now: DateTime<Utc>,
    ) -> Result<CompletionOutcome, StorageError> {
        let user = id_to_i64("user_id", user_id.value())?;
        let course = id_to_i64("course_id", course_id.value())?;

        let mut tx = self.pool.begin().await.map_err(conn)?;

        // The UPDATE comes first so the transaction holds the write lock before
        // it reads the tally; concurrent cascades for one user run one at a time.
        let completed = sqlx::query(
            r"
            UPDATE enrollments
            SET completed_at = ?3
            WHERE user_id = ?1 AND course_id = ?2
              AND completed_at IS NULL
              AND (SELECT COUNT(*) FROM lessons
                    WHERE course_id = ?2 AND is_published = 1) > 0
              AND (SELECT COUNT(*) FROM lessons
                    WHERE course_id = ?2 AND is_published = 1)
                = (SELECT COUNT(*) FROM lesson_progress lp
                    JOIN lessons l ON l.id = lp.lesson_id
                    WHERE lp.user_id = ?1 AND l.course_id = ?2
                      AND l.is_published = 1 AND lp.is_completed = 1)
            ",
        )
        .bind(user)
        .bind(course)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(write_err)?;

        let row = sqlx::query(TALLY_SQL)
            .bind(user)
            .bind(course)
            .fetch_one(&mut *tx)
            .await
            .map_err(conn)?;
        let tally = map_tally_row(&row)?;
        let enrolled: bool = row.try_get("enrolled").map_err(ser)?;

        let issued = sqlx::query(
            r"
            INSERT INTO certificates (user_id, course_id, certificate_url, issued_at)
            SELECT ?1, ?2, ?3, ?4
            WHERE EXISTS (
                SELECT 1 FROM enrollments
                WHERE user_id = ?1 AND course_id = ?2 AND completed_at IS NOT NULL
            )
            ON CONFLICT(user_id, course_id) DO NOTHING
            ",
        )
        .bind(user)
        .bind(course)
        .bind(certificate_url)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(write_err)?;

        tx.commit().await.map_err(conn)?;

        Ok(CompletionOutcome {
            user_id,
            course_id,
            tally,
            enrolled,
            enrollment_completed: completed.rows_affected() > 0,
            certificate_issued: issued.rows_affected() > 0,
        })
    }

    async fn course_tally(
        &self,
        user_id: UserId,
        course_id: CourseId,
    ) -> Result<CourseTally, StorageError> {
        let row = sqlx::query(TALLY_SQL)
            .bind(id_to_i64("user_id", user_id.value())?)
            .bind(id_to_i64("course_id", course_id.value())?)
            .fetch_one(&self.pool)
            .await
            .map_err(conn)?;

        map_tally_row(&row)
    }

    async fn get_certificate(
        &self,
        user_id: UserId,
        course_id: CourseId,
    ) -> Result<Option<Certificate>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT id, user_id, course_id, certificate_url, issued_at
            FROM certificates
            WHERE user_id = ?1 AND course_id = ?2
            ",
        )
        .bind(id_to_i64("user_id", user_id.value())?)
        .bind(id_to_i64("course_id", course_id.value())?)
        .fetch_optional(&self.pool)
        .await
        .map_err(conn)?;

        row.as_ref().map(map_certificate_row).transpose()
    }
}
