use chrono::Utc;
use sqlx::SqlitePool;

use super::SqliteInitError;

const SCHEMA_V1: &[&str] = &[
    r"
    CREATE TABLE IF NOT EXISTS categories (
        id INTEGER PRIMARY KEY,
        name TEXT NOT NULL UNIQUE,
        color TEXT
    );
    ",
    r"
    CREATE TABLE IF NOT EXISTS courses (
        id INTEGER PRIMARY KEY,
        title TEXT NOT NULL,
        description TEXT,
        instructor TEXT NOT NULL,
        thumbnail_url TEXT,
        category_id INTEGER,
        duration_hours REAL CHECK (duration_hours IS NULL OR duration_hours >= 0),
        difficulty_level TEXT
            CHECK (difficulty_level IS NULL OR difficulty_level IN ('beginner', 'intermediate', 'advanced')),
        is_published INTEGER NOT NULL DEFAULT 0 CHECK (is_published IN (0, 1)),
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL,
        FOREIGN KEY (category_id) REFERENCES categories(id) ON DELETE SET NULL
    );
    ",
    r"
    CREATE TABLE IF NOT EXISTS lessons (
        id INTEGER PRIMARY KEY,
        course_id INTEGER NOT NULL,
        title TEXT NOT NULL,
        description TEXT,
        video_url TEXT,
        duration_minutes INTEGER NOT NULL DEFAULT 0 CHECK (duration_minutes >= 0),
        lesson_order INTEGER NOT NULL CHECK (lesson_order >= 0),
        is_published INTEGER NOT NULL DEFAULT 0 CHECK (is_published IN (0, 1)),
        created_at TEXT NOT NULL,
        FOREIGN KEY (course_id) REFERENCES courses(id) ON DELETE CASCADE
    );
    ",
    r"
    CREATE TABLE IF NOT EXISTS enrollments (
        id INTEGER PRIMARY KEY,
        user_id INTEGER NOT NULL,
        course_id INTEGER NOT NULL,
        enrolled_at TEXT NOT NULL,
        completed_at TEXT,
        UNIQUE (user_id, course_id),
        FOREIGN KEY (course_id) REFERENCES courses(id) ON DELETE CASCADE
    );
    ",
    r"
    CREATE TABLE IF NOT EXISTS lesson_progress (
        id INTEGER PRIMARY KEY,
        user_id INTEGER NOT NULL,
        lesson_id INTEGER NOT NULL,
        watched_duration_minutes INTEGER NOT NULL DEFAULT 0
            CHECK (watched_duration_minutes >= 0),
        is_completed INTEGER NOT NULL DEFAULT 0 CHECK (is_completed IN (0, 1)),
        completed_at TEXT,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL,
        UNIQUE (user_id, lesson_id),
        FOREIGN KEY (lesson_id) REFERENCES lessons(id) ON DELETE CASCADE
    );
    ",
    r"
    CREATE TABLE IF NOT EXISTS certificates (
        id INTEGER PRIMARY KEY,
        user_id INTEGER NOT NULL,
        course_id INTEGER NOT NULL,
        certificate_url TEXT NOT NULL,
        issued_at TEXT NOT NULL,
        UNIQUE (user_id, course_id),
        FOREIGN KEY (course_id) REFERENCES courses(id) ON DELETE CASCADE
    );
    ",
    r"
    CREATE TABLE IF NOT EXISTS webinars (
        id INTEGER PRIMARY KEY,
        title TEXT NOT NULL,
        description TEXT,
        host TEXT,
        scheduled_date TEXT NOT NULL,
        start_time TEXT NOT NULL,
        end_time TEXT NOT NULL,
        created_at TEXT NOT NULL
    );
    ",
    r"
    CREATE TABLE IF NOT EXISTS webinar_enrollments (
        id INTEGER PRIMARY KEY,
        user_id INTEGER NOT NULL,
        webinar_id INTEGER NOT NULL,
        enrolled_at TEXT NOT NULL,
        UNIQUE (user_id, webinar_id),
        FOREIGN KEY (webinar_id) REFERENCES webinars(id) ON DELETE CASCADE
    );
    ",
    r"
    CREATE INDEX IF NOT EXISTS idx_courses_published_created
        ON courses (is_published, created_at);
    ",
    r"
    CREATE INDEX IF NOT EXISTS idx_lessons_course_order
        ON lessons (course_id, is_published, lesson_order);
    ",
    r"
    CREATE INDEX IF NOT EXISTS idx_enrollments_user_enrolled
        ON enrollments (user_id, enrolled_at);
    ",
    r"
    CREATE INDEX IF NOT EXISTS idx_enrollments_course
        ON enrollments (course_id);
    ",
    r"
    CREATE INDEX IF NOT EXISTS idx_lesson_progress_lesson
        ON lesson_progress (lesson_id, is_completed);
    ",
    r"
    CREATE INDEX IF NOT EXISTS idx_certificates_course
        ON certificates (course_id);
    ",
    r"
    CREATE INDEX IF NOT EXISTS idx_webinar_enrollments_webinar
        ON webinar_enrollments (webinar_id);
    ",
];

/// Runs the versioned migrations for the current schema.
///
/// Version 1 creates the catalog (categories, courses, lessons), learner
/// state (enrollments, lesson progress, certificates), webinars and indexes.
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), SqliteInitError> {
    async fn is_applied(pool: &SqlitePool, version: i64) -> Result<bool, sqlx::Error> {
        let row = sqlx::query("SELECT 1 FROM schema_migrations WHERE version = ?1")
            .bind(version)
            .fetch_optional(pool)
            .await?;
        Ok(row.is_some())
    }

    sqlx::query(
        r"
            CREATE TABLE IF NOT EXISTS schema_migrations (
                version INTEGER PRIMARY KEY,
                applied_at TEXT NOT NULL
            );
            ",
    )
    .execute(pool)
    .await?;

    if !is_applied(pool, 1).await? {
        let mut tx = pool.begin().await?;

        for statement in SCHEMA_V1 {
            sqlx::query(statement).execute(&mut *tx).await?;
        }

        sqlx::query(
            r"
                INSERT INTO schema_migrations (version, applied_at)
                VALUES (?1, ?2)
                ON CONFLICT(version) DO NOTHING
            ",
        )
        .bind(1_i64)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        tracing::debug!(version = 1, "applied schema migration");
    }

    Ok(())
}
