use chrono::{DateTime, Utc};
use lms_core::model::{
    Category, CategoryId, Certificate, Course, CourseId, CourseSummary, CourseTally, Difficulty,
    EnrolledCourse, Enrollment, Lesson, LessonId, LessonProgress, ProgressEntry, UserId, Webinar,
    WebinarId,
};
use sqlx::Row;
use sqlx::sqlite::SqliteRow;

use crate::repository::StorageError;

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

/// Classify a driver error from a write.
///
/// Unique violations become `Conflict`, foreign-key violations `NotFound`
/// (the referenced row is missing); anything else is a connection failure.
pub(crate) fn write_err(e: sqlx::Error) -> StorageError {
    if let sqlx::Error::Database(db) = &e {
        if db.is_unique_violation() {
            return StorageError::Conflict;
        }
        if db.is_foreign_key_violation() {
            return StorageError::NotFound;
        }
    }
    StorageError::Connection(e.to_string())
}

pub(crate) fn conn(e: sqlx::Error) -> StorageError {
    StorageError::Connection(e.to_string())
}

//
// ─── NUMERIC CONVERSIONS ───────────────────────────────────────────────────────
//

fn i64_to_u64(field: &'static str, v: i64) -> Result<u64, StorageError> {
    u64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} sign overflow")))
}

pub(crate) fn id_to_i64(field: &'static str, v: u64) -> Result<i64, StorageError> {
    i64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} overflow")))
}

pub(crate) fn u32_from_i64(field: &'static str, v: i64) -> Result<u32, StorageError> {
    u32::try_from(v).map_err(|_| StorageError::Serialization(format!("invalid {field}: {v}")))
}

pub(crate) fn user_id_from_i64(v: i64) -> Result<UserId, StorageError> {
    Ok(UserId::new(i64_to_u64("user_id", v)?))
}

pub(crate) fn course_id_from_i64(v: i64) -> Result<CourseId, StorageError> {
    Ok(CourseId::new(i64_to_u64("course_id", v)?))
}

pub(crate) fn lesson_id_from_i64(v: i64) -> Result<LessonId, StorageError> {
    Ok(LessonId::new(i64_to_u64("lesson_id", v)?))
}

pub(crate) fn category_id_from_i64(v: i64) -> Result<CategoryId, StorageError> {
    Ok(CategoryId::new(i64_to_u64("category_id", v)?))
}

pub(crate) fn webinar_id_from_i64(v: i64) -> Result<WebinarId, StorageError> {
    Ok(WebinarId::new(i64_to_u64("webinar_id", v)?))
}

fn get_u32(row: &SqliteRow, column: &'static str) -> Result<u32, StorageError> {
    u32_from_i64(column, row.try_get::<i64, _>(column).map_err(ser)?)
}

//
// ─── CATALOG ───────────────────────────────────────────────────────────────────
//

/// Course columns, prefixed with the `c` alias used by every catalog query.
pub(crate) const COURSE_COLUMNS: &str = r"
    c.id AS id,
    c.title AS title,
    c.description AS description,
    c.instructor AS instructor,
    c.thumbnail_url AS thumbnail_url,
    c.category_id AS category_id,
    c.duration_hours AS duration_hours,
    c.difficulty_level AS difficulty_level,
    c.is_published AS is_published,
    c.created_at AS created_at,
    c.updated_at AS updated_at";

pub(crate) fn map_category_row(row: &SqliteRow) -> Result<Category, StorageError> {
    Ok(Category {
        id: category_id_from_i64(row.try_get::<i64, _>("id").map_err(ser)?)?,
        name: row.try_get("name").map_err(ser)?,
        color: row.try_get("color").map_err(ser)?,
    })
}

pub(crate) fn map_course_row(row: &SqliteRow) -> Result<Course, StorageError> {
    let difficulty = row
        .try_get::<Option<String>, _>("difficulty_level")
        .map_err(ser)?
        .map(|raw| raw.parse::<Difficulty>().map_err(ser))
        .transpose()?;

    Ok(Course {
        id: course_id_from_i64(row.try_get::<i64, _>("id").map_err(ser)?)?,
        title: row.try_get("title").map_err(ser)?,
        description: row.try_get("description").map_err(ser)?,
        instructor: row.try_get("instructor").map_err(ser)?,
        thumbnail_url: row.try_get("thumbnail_url").map_err(ser)?,
        category_id: row
            .try_get::<Option<i64>, _>("category_id")
            .map_err(ser)?
            .map(category_id_from_i64)
            .transpose()?,
        duration_hours: row.try_get("duration_hours").map_err(ser)?,
        difficulty,
        is_published: row.try_get("is_published").map_err(ser)?,
        created_at: row.try_get("created_at").map_err(ser)?,
        updated_at: row.try_get("updated_at").map_err(ser)?,
    })
}

pub(crate) fn map_course_summary_row(row: &SqliteRow) -> Result<CourseSummary, StorageError> {
    Ok(CourseSummary {
        course: map_course_row(row)?,
        category_name: row.try_get("category_name").map_err(ser)?,
        category_color: row.try_get("category_color").map_err(ser)?,
        enrolled_count: get_u32(row, "enrolled_count")?,
        lesson_count: get_u32(row, "lesson_count")?,
    })
}

pub(crate) fn map_lesson_row(row: &SqliteRow) -> Result<Lesson, StorageError> {
    Ok(Lesson {
        id: lesson_id_from_i64(row.try_get::<i64, _>("id").map_err(ser)?)?,
        course_id: course_id_from_i64(row.try_get::<i64, _>("course_id").map_err(ser)?)?,
        title: row.try_get("title").map_err(ser)?,
        description: row.try_get("description").map_err(ser)?,
        video_url: row.try_get("video_url").map_err(ser)?,
        duration_minutes: get_u32(row, "duration_minutes")?,
        lesson_order: get_u32(row, "lesson_order")?,
        is_published: row.try_get("is_published").map_err(ser)?,
        created_at: row.try_get("created_at").map_err(ser)?,
    })
}

//
// ─── LEARNER STATE ─────────────────────────────────────────────────────────────
//

pub(crate) fn map_enrollment_row(row: &SqliteRow) -> Result<Enrollment, StorageError> {
    Ok(Enrollment {
        id: row.try_get("id").map_err(ser)?,
        user_id: user_id_from_i64(row.try_get::<i64, _>("user_id").map_err(ser)?)?,
        course_id: course_id_from_i64(row.try_get::<i64, _>("course_id").map_err(ser)?)?,
        enrolled_at: row.try_get("enrolled_at").map_err(ser)?,
        completed_at: row.try_get("completed_at").map_err(ser)?,
    })
}

pub(crate) fn map_progress_row(row: &SqliteRow) -> Result<LessonProgress, StorageError> {
    Ok(LessonProgress {
        id: row.try_get("id").map_err(ser)?,
        user_id: user_id_from_i64(row.try_get::<i64, _>("user_id").map_err(ser)?)?,
        lesson_id: lesson_id_from_i64(row.try_get::<i64, _>("lesson_id").map_err(ser)?)?,
        watched_duration_minutes: get_u32(row, "watched_duration_minutes")?,
        is_completed: row.try_get("is_completed").map_err(ser)?,
        completed_at: row.try_get("completed_at").map_err(ser)?,
        updated_at: row.try_get("updated_at").map_err(ser)?,
    })
}

pub(crate) fn map_progress_entry_row(row: &SqliteRow) -> Result<ProgressEntry, StorageError> {
    Ok(ProgressEntry {
        progress: map_progress_row(row)?,
        lesson_title: row.try_get("lesson_title").map_err(ser)?,
        lesson_duration: get_u32(row, "lesson_duration")?,
        lesson_order: get_u32(row, "lesson_order")?,
        course_id: course_id_from_i64(row.try_get::<i64, _>("course_id").map_err(ser)?)?,
        course_title: row.try_get("course_title").map_err(ser)?,
    })
}

pub(crate) fn map_tally_row(row: &SqliteRow) -> Result<CourseTally, StorageError> {
    Ok(CourseTally::new(
        get_u32(row, "total_lessons")?,
        get_u32(row, "completed_lessons")?,
    ))
}

pub(crate) fn map_enrolled_course_row(row: &SqliteRow) -> Result<EnrolledCourse, StorageError> {
    let enrolled_at: DateTime<Utc> = row.try_get("enrolled_at").map_err(ser)?;
    let completed_at: Option<DateTime<Utc>> = row.try_get("enrollment_completed_at").map_err(ser)?;
    let course = map_course_row(row)?;
    let enrollment = Enrollment {
        id: row.try_get("enrollment_id").map_err(ser)?,
        user_id: user_id_from_i64(row.try_get::<i64, _>("user_id").map_err(ser)?)?,
        course_id: course.id,
        enrolled_at,
        completed_at,
    };
    Ok(EnrolledCourse::new(
        course,
        row.try_get("category_name").map_err(ser)?,
        row.try_get("category_color").map_err(ser)?,
        &enrollment,
        map_tally_row(row)?,
    ))
}

pub(crate) fn map_certificate_row(row: &SqliteRow) -> Result<Certificate, StorageError> {
    Ok(Certificate {
        id: row.try_get("id").map_err(ser)?,
        user_id: user_id_from_i64(row.try_get::<i64, _>("user_id").map_err(ser)?)?,
        course_id: course_id_from_i64(row.try_get::<i64, _>("course_id").map_err(ser)?)?,
        certificate_url: row.try_get("certificate_url").map_err(ser)?,
        issued_at: row.try_get("issued_at").map_err(ser)?,
    })
}

pub(crate) fn map_webinar_row(row: &SqliteRow) -> Result<Webinar, StorageError> {
    Ok(Webinar {
        id: webinar_id_from_i64(row.try_get::<i64, _>("id").map_err(ser)?)?,
        title: row.try_get("title").map_err(ser)?,
        description: row.try_get("description").map_err(ser)?,
        host: row.try_get("host").map_err(ser)?,
        scheduled_date: row.try_get("scheduled_date").map_err(ser)?,
        start_time: row.try_get("start_time").map_err(ser)?,
        end_time: row.try_get("end_time").map_err(ser)?,
    })
}
