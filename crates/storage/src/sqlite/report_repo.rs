use lms_core::model::{
    Certificate, CourseId, DashboardStats, EnrolledCourse, ProgressEntry, UserId,
};
use sqlx::Row;

use super::SqliteRepository;
use super::mapping::{
    COURSE_COLUMNS, conn, id_to_i64, map_certificate_row, map_enrolled_course_row,
    map_progress_entry_row, ser, u32_from_i64,
};
use crate::repository::{ReportRepository, StorageError};

#[async_trait::async_trait]
impl ReportRepository for SqliteRepository {
    async fn dashboard_stats(&self, user_id: UserId) -> Result<DashboardStats, StorageError> {
        // Course counters cover published courses only, like the enrolled
        // course list. A course counts as completed when it has published
        // lessons and the user finished all of them. Certificates already
        // issued stay counted after a course is unpublished.
        let row = sqlx::query(
            r"
            SELECT
                (SELECT COUNT(*) FROM enrollments e
                    JOIN courses c ON c.id = e.course_id
                    WHERE e.user_id = ?1 AND c.is_published = 1) AS total_courses,
                (SELECT COUNT(*) FROM enrollments e
                    JOIN courses c ON c.id = e.course_id
                    WHERE e.user_id = ?1
                      AND c.is_published = 1
                      AND (SELECT COUNT(*) FROM lessons l
                            WHERE l.course_id = e.course_id AND l.is_published = 1) > 0
                      AND (SELECT COUNT(*) FROM lessons l
                            WHERE l.course_id = e.course_id AND l.is_published = 1)
                        = (SELECT COUNT(*) FROM lesson_progress lp
                            JOIN lessons l ON l.id = lp.lesson_id
                            WHERE lp.user_id = ?1 AND l.course_id = e.course_id
                              AND l.is_published = 1 AND lp.is_completed = 1)
                ) AS completed_courses,
                (SELECT COUNT(*) FROM certificates WHERE user_id = ?1) AS total_certificates
            ",
        )
        .bind(id_to_i64("user_id", user_id.value())?)
        .fetch_one(&self.pool)
        .await
        .map_err(conn)?;

        let count = |column: &'static str| -> Result<u32, StorageError> {
            u32_from_i64(column, row.try_get::<i64, _>(column).map_err(ser)?)
        };
        Ok(DashboardStats {
            total_courses: count("total_courses")?,
            completed_courses: count("completed_courses")?,
            total_certificates: count("total_certificates")?,
        })
    }

    async fn enrolled_courses(
        &self,
        user_id: UserId,
        limit: Option<u32>,
    ) -> Result<Vec<EnrolledCourse>, StorageError> {
        let sql = format!(
            r"
            SELECT {COURSE_COLUMNS},
                cat.name AS category_name,
                cat.color AS category_color,
                e.id AS enrollment_id,
                e.user_id AS user_id,
                e.enrolled_at AS enrolled_at,
                e.completed_at AS enrollment_completed_at,
                (SELECT COUNT(*) FROM lessons l
                    WHERE l.course_id = c.id AND l.is_published = 1) AS total_lessons,
                (SELECT COUNT(*) FROM lesson_progress lp
                    JOIN lessons l ON l.id = lp.lesson_id
                    WHERE lp.user_id = e.user_id AND l.course_id = c.id
                      AND l.is_published = 1 AND lp.is_completed = 1) AS completed_lessons
            FROM enrollments e
            JOIN courses c ON c.id = e.course_id
            LEFT JOIN categories cat ON cat.id = c.category_id
            WHERE e.user_id = ?1 AND c.is_published = 1
            ORDER BY e.enrolled_at DESC, e.id DESC
            LIMIT ?2
            "
        );
        // SQLite treats a negative LIMIT as unbounded.
        let limit = limit.map_or(-1, i64::from);
        let rows = sqlx::query(&sql)
            .bind(id_to_i64("user_id", user_id.value())?)
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .map_err(conn)?;

        rows.iter().map(map_enrolled_course_row).collect()
    }

    async fn progress_entries(
        &self,
        user_id: UserId,
        course_id: Option<CourseId>,
    ) -> Result<Vec<ProgressEntry>, StorageError> {
        let course = course_id
            .map(|id| id_to_i64("course_id", id.value()))
            .transpose()?;
        let rows = sqlx::query(
            r"
            SELECT lp.id AS id,
                lp.user_id AS user_id,
                lp.lesson_id AS lesson_id,
                lp.watched_duration_minutes AS watched_duration_minutes,
                lp.is_completed AS is_completed,
                lp.completed_at AS completed_at,
                lp.updated_at AS updated_at,
                l.title AS lesson_title,
                l.duration_minutes AS lesson_duration,
                l.lesson_order AS lesson_order,
                c.id AS course_id,
                c.title AS course_title
            FROM lesson_progress lp
            JOIN lessons l ON l.id = lp.lesson_id
            JOIN courses c ON c.id = l.course_id
            WHERE lp.user_id = ?1 AND (?2 IS NULL OR l.course_id = ?2)
            ORDER BY c.id ASC, l.lesson_order ASC, l.id ASC
            ",
        )
        .bind(id_to_i64("user_id", user_id.value())?)
        .bind(course)
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        rows.iter().map(map_progress_entry_row).collect()
    }

    async fn certificates(&self, user_id: UserId) -> Result<Vec<Certificate>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT id, user_id, course_id, certificate_url, issued_at
            FROM certificates
            WHERE user_id = ?1
            ORDER BY issued_at DESC, id DESC
            ",
        )
        .bind(id_to_i64("user_id", user_id.value())?)
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        rows.iter().map(map_certificate_row).collect()
    }
}
