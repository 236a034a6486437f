use chrono::{DateTime, Utc};
use lms_core::model::{Category, Course, CourseId, CourseQuery, CourseSummary, NewCategory, NewCourse};

use super::SqliteRepository;
use super::mapping::{
    COURSE_COLUMNS, conn, id_to_i64, map_category_row, map_course_row, map_course_summary_row,
    write_err,
};
use crate::repository::{CourseRepository, StorageError};

fn summary_select() -> String {
    format!(
        r"
        SELECT {COURSE_COLUMNS},
            cat.name AS category_name,
            cat.color AS category_color,
            (SELECT COUNT(*) FROM enrollments e WHERE e.course_id = c.id) AS enrolled_count,
            (SELECT COUNT(*) FROM lessons l WHERE l.course_id = c.id AND l.is_published = 1) AS lesson_count
        FROM courses c
        LEFT JOIN categories cat ON cat.id = c.category_id
        "
    )
}

#[async_trait::async_trait]
impl CourseRepository for SqliteRepository {
    async fn insert_category(&self, category: &NewCategory) -> Result<Category, StorageError> {
        let row = sqlx::query(
            r"
            INSERT INTO categories (name, color)
            VALUES (?1, ?2)
            RETURNING id, name, color
            ",
        )
        .bind(category.name.as_str())
        .bind(category.color.as_deref())
        .fetch_one(&self.pool)
        .await
        .map_err(write_err)?;

        map_category_row(&row)
    }

    async fn insert_course(
        &self,
        course: &NewCourse,
        now: DateTime<Utc>,
    ) -> Result<Course, StorageError> {
        let category_id = course
            .category_id
            .map(|id| id_to_i64("category_id", id.value()))
            .transpose()?;

        let row = sqlx::query(
            r"
            INSERT INTO courses (title, description, instructor, thumbnail_url, category_id,
                duration_hours, difficulty_level, is_published, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?9)
            RETURNING id, title, description, instructor, thumbnail_url, category_id,
                duration_hours, difficulty_level, is_published, created_at, updated_at
            ",
        )
        .bind(course.title.as_str())
        .bind(course.description.as_deref())
        .bind(course.instructor.as_str())
        .bind(course.thumbnail_url.as_deref())
        .bind(category_id)
        .bind(course.duration_hours)
        .bind(course.difficulty.map(|d| d.as_str()))
        .bind(course.is_published)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(write_err)?;

        map_course_row(&row)
    }

    async fn get_course(&self, id: CourseId) -> Result<Option<Course>, StorageError> {
        let sql = format!("SELECT {COURSE_COLUMNS} FROM courses c WHERE c.id = ?1");
        let row = sqlx::query(&sql)
            .bind(id_to_i64("course_id", id.value())?)
            .fetch_optional(&self.pool)
            .await
            .map_err(conn)?;

        row.as_ref().map(map_course_row).transpose()
    }

    async fn get_published_course(
        &self,
        id: CourseId,
    ) -> Result<Option<CourseSummary>, StorageError> {
        let sql = format!("{} WHERE c.id = ?1 AND c.is_published = 1", summary_select());
        let row = sqlx::query(&sql)
            .bind(id_to_i64("course_id", id.value())?)
            .fetch_optional(&self.pool)
            .await
            .map_err(conn)?;

        row.as_ref().map(map_course_summary_row).transpose()
    }

    async fn list_published_courses(
        &self,
        query: &CourseQuery,
    ) -> Result<Vec<CourseSummary>, StorageError> {
        let sql = format!(
            r"
            {}
            WHERE c.is_published = 1
              AND (?1 IS NULL OR cat.name = ?1)
              AND (?2 IS NULL
                   OR LOWER(c.title) LIKE ?2 ESCAPE '\'
                   OR LOWER(COALESCE(c.description, '')) LIKE ?2 ESCAPE '\')
            ORDER BY c.created_at DESC, c.id DESC
            LIMIT ?3 OFFSET ?4
            ",
            summary_select()
        );
        let rows = sqlx::query(&sql)
            .bind(query.category.as_deref())
            .bind(query.search_pattern())
            .bind(i64::from(query.limit))
            .bind(i64::from(query.offset))
            .fetch_all(&self.pool)
            .await
            .map_err(conn)?;

        rows.iter().map(map_course_summary_row).collect()
    }

    async fn update_course(&self, course: &Course) -> Result<(), StorageError> {
        let category_id = course
            .category_id
            .map(|id| id_to_i64("category_id", id.value()))
            .transpose()?;

        let res = sqlx::query(
            r"
            UPDATE courses SET
                title = ?2,
                description = ?3,
                instructor = ?4,
                thumbnail_url = ?5,
                category_id = ?6,
                duration_hours = ?7,
                difficulty_level = ?8,
                is_published = ?9,
                updated_at = ?10
            WHERE id = ?1
            ",
        )
        .bind(id_to_i64("course_id", course.id.value())?)
        .bind(course.title.as_str())
        .bind(course.description.as_deref())
        .bind(course.instructor.as_str())
        .bind(course.thumbnail_url.as_deref())
        .bind(category_id)
        .bind(course.duration_hours)
        .bind(course.difficulty.map(|d| d.as_str()))
        .bind(course.is_published)
        .bind(course.updated_at)
        .execute(&self.pool)
        .await
        .map_err(write_err)?;

        if res.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }

    async fn delete_course(&self, id: CourseId) -> Result<bool, StorageError> {
        let res = sqlx::query("DELETE FROM courses WHERE id = ?1")
            .bind(id_to_i64("course_id", id.value())?)
            .execute(&self.pool)
            .await
            .map_err(conn)?;

        Ok(res.rows_affected() > 0)
    }
}
