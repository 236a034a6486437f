use chrono::{DateTime, Utc};
use lms_core::model::{CourseId, Enrollment, UserId};

use super::SqliteRepository;
use super::mapping::{conn, id_to_i64, map_enrollment_row, write_err};
use crate::repository::{EnrollmentRepository, StorageError};

#[async_trait::async_trait]
impl EnrollmentRepository for SqliteRepository {
    async fn insert_enrollment(
        &self,
        user_id: UserId,
        course_id: CourseId,
        now: DateTime<Utc>,
    ) -> Result<Enrollment, StorageError> {
        let row = sqlx::query(
            r"
            INSERT INTO enrollments (user_id, course_id, enrolled_at)
            VALUES (?1, ?2, ?3)
            RETURNING id, user_id, course_id, enrolled_at, completed_at
            ",
        )
        .bind(id_to_i64("user_id", user_id.value())?)
        .bind(id_to_i64("course_id", course_id.value())?)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(write_err)?;

        map_enrollment_row(&row)
    }

    async fn get_enrollment(
        &self,
        user_id: UserId,
        course_id: CourseId,
    ) -> Result<Option<Enrollment>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT id, user_id, course_id, enrolled_at, completed_at
            FROM enrollments
            WHERE user_id = ?1 AND course_id = ?2
            ",
        )
        .bind(id_to_i64("user_id", user_id.value())?)
        .bind(id_to_i64("course_id", course_id.value())?)
        .fetch_optional(&self.pool)
        .await
        .map_err(conn)?;

        row.as_ref().map(map_enrollment_row).transpose()
    }
}
