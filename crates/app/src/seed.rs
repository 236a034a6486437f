//! Demo catalog for local development.

use chrono::{Duration, NaiveTime};
use lms_core::model::{CategoryId, CourseDraft, CourseQuery, Difficulty, LessonDraft, WebinarDraft};
use services::{AppServices, Clock, CourseServiceError};

struct SampleCourse {
    title: &'static str,
    description: &'static str,
    instructor: &'static str,
    category: usize,
    difficulty: Difficulty,
    lessons: &'static [(&'static str, u32)],
}

const CATEGORIES: [(&str, &str); 3] = [
    ("Programming", "#3b82f6"),
    ("Design", "#ec4899"),
    ("Data", "#10b981"),
];

const COURSES: [SampleCourse; 3] = [
    SampleCourse {
        title: "Rust Fundamentals",
        description: "Ownership, borrowing and the type system from first principles.",
        instructor: "Ferris Crab",
        category: 0,
        difficulty: Difficulty::Beginner,
        lessons: &[("Getting started", 15), ("Ownership", 25), ("Traits", 30)],
    },
    SampleCourse {
        title: "Interface Sketching",
        description: "Paper prototypes and quick wireframes.",
        instructor: "Dana Grid",
        category: 1,
        difficulty: Difficulty::Intermediate,
        lessons: &[("Tools", 10), ("Layouts", 20)],
    },
    SampleCourse {
        title: "SQL for Analysts",
        description: "Joins, windows and aggregates on real data sets.",
        instructor: "Edgar Codd",
        category: 2,
        difficulty: Difficulty::Advanced,
        lessons: &[("Select", 12), ("Joins", 22), ("Window functions", 28), ("Indexes", 18)],
    },
];

/// What a seed run inserted.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SeedReport {
    pub categories: usize,
    pub courses: usize,
    pub lessons: usize,
    pub webinars: usize,
}

/// Insert the demo catalog unless published courses already exist.
///
/// # Errors
///
/// Returns the first service error encountered.
pub async fn seed_catalog(app: &AppServices, clock: Clock) -> anyhow::Result<SeedReport> {
    let mut report = SeedReport::default();
    let courses = app.courses();

    let existing = courses
        .list_courses(&CourseQuery::new(None, None, Some(1), None))
        .await?;
    if !existing.is_empty() {
        tracing::info!("catalog already has courses, skipping seed");
        return Ok(report);
    }

    let mut category_ids: Vec<Option<CategoryId>> = Vec::with_capacity(CATEGORIES.len());
    for (name, color) in CATEGORIES {
        match courses.create_category(name.into(), Some(color.into())).await {
            Ok(category) => {
                report.categories += 1;
                category_ids.push(Some(category.id));
            }
            Err(CourseServiceError::DuplicateCategory) => {
                tracing::warn!(category = name, "category exists, courses left uncategorized");
                category_ids.push(None);
            }
            Err(err) => return Err(err.into()),
        }
    }

    for sample in &COURSES {
        let course = courses
            .create_course(CourseDraft {
                title: Some(sample.title.into()),
                description: Some(sample.description.into()),
                instructor: Some(sample.instructor.into()),
                category_id: category_ids.get(sample.category).copied().flatten(),
                difficulty: Some(sample.difficulty),
                is_published: true,
                ..CourseDraft::default()
            })
            .await?;
        report.courses += 1;

        for (title, minutes) in sample.lessons {
            courses
                .add_lesson(
                    course.id,
                    LessonDraft {
                        title: Some((*title).into()),
                        duration_minutes: Some(*minutes),
                        is_published: true,
                        ..LessonDraft::default()
                    },
                )
                .await?;
            report.lessons += 1;
        }
    }

    let tomorrow = (clock.now() + Duration::days(1)).date_naive();
    app.webinars()
        .create_webinar(WebinarDraft {
            title: Some("Live Q&A".into()),
            description: Some("Bring your questions about the courses.".into()),
            host: Some("Ferris Crab".into()),
            scheduled_date: Some(tomorrow),
            start_time: NaiveTime::from_hms_opt(17, 0, 0),
            end_time: NaiveTime::from_hms_opt(18, 0, 0),
        })
        .await?;
    report.webinars += 1;

    tracing::info!(
        categories = report.categories,
        courses = report.courses,
        lessons = report.lessons,
        webinars = report.webinars,
        "seeded demo catalog"
    );
    Ok(report)
}
