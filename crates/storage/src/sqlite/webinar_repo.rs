use chrono::{DateTime, Utc};
use lms_core::model::{NewWebinar, UserId, Webinar, WebinarId};
use sqlx::Row;

use super::SqliteRepository;
use super::mapping::{conn, id_to_i64, map_webinar_row, ser, write_err};
use crate::repository::{StorageError, WebinarRepository};

#[async_trait::async_trait]
impl WebinarRepository for SqliteRepository {
    async fn insert_webinar(
        &self,
        webinar: &NewWebinar,
        now: DateTime<Utc>,
    ) -> Result<Webinar, StorageError> {
        let row = sqlx::query(
            r"
            INSERT INTO webinars (title, description, host, scheduled_date, start_time,
                end_time, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            RETURNING id, title, description, host, scheduled_date, start_time, end_time
            ",
        )
        .bind(webinar.title.as_str())
        .bind(webinar.description.as_deref())
        .bind(webinar.host.as_deref())
        .bind(webinar.scheduled_date)
        .bind(webinar.start_time)
        .bind(webinar.end_time)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(write_err)?;

        map_webinar_row(&row)
    }

    async fn get_webinar(&self, id: WebinarId) -> Result<Option<Webinar>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT id, title, description, host, scheduled_date, start_time, end_time
            FROM webinars
            WHERE id = ?1
            ",
        )
        .bind(id_to_i64("webinar_id", id.value())?)
        .fetch_optional(&self.pool)
        .await
        .map_err(conn)?;

        row.as_ref().map(map_webinar_row).transpose()
    }

    async fn insert_webinar_enrollment(
        &self,
        user_id: UserId,
        webinar_id: WebinarId,
        now: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        sqlx::query(
            r"
            INSERT INTO webinar_enrollments (user_id, webinar_id, enrolled_at)
            VALUES (?1, ?2, ?3)
            ",
        )
        .bind(id_to_i64("user_id", user_id.value())?)
        .bind(id_to_i64("webinar_id", webinar_id.value())?)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(write_err)?;

        Ok(())
    }

    async fn list_enrolled_webinars(
        &self,
        user_id: UserId,
        limit: u32,
    ) -> Result<Vec<(Webinar, DateTime<Utc>)>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT w.id AS id, w.title AS title, w.description AS description, w.host AS host,
                w.scheduled_date AS scheduled_date, w.start_time AS start_time,
                w.end_time AS end_time, we.enrolled_at AS enrolled_at
            FROM webinar_enrollments we
            JOIN webinars w ON w.id = we.webinar_id
            WHERE we.user_id = ?1
            ORDER BY w.scheduled_date ASC, w.start_time ASC, w.id ASC
            LIMIT ?2
            ",
        )
        .bind(id_to_i64("user_id", user_id.value())?)
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        rows.iter()
            .map(|row| {
                let enrolled_at: DateTime<Utc> = row.try_get("enrolled_at").map_err(ser)?;
                Ok((map_webinar_row(row)?, enrolled_at))
            })
            .collect()
    }
}
