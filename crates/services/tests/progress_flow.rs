use chrono::{NaiveDate, NaiveTime, TimeZone, Utc};
use lms_core::model::{
    CertificateTemplate, CourseDraft, CourseId, CoursePatch, CourseQuery, LessonDraft,
    LessonId, ProgressReport, UserId, WebinarDraft, WebinarId,
};
use services::{AppServices, Clock, ErrorKind};
use storage::repository::Storage;

async fn app(name: &str, clock: Clock) -> AppServices {
    let url = format!("sqlite:file:{name}?mode=memory&cache=shared");
    let storage = Storage::sqlite(&url).await.expect("storage");
    AppServices::from_storage(&storage, clock, CertificateTemplate::default())
}

async fn course_with_lessons(app: &AppServices, title: &str, lessons: u32) -> (CourseId, Vec<LessonId>) {
    let courses = app.courses();
    let course = courses
        .create_course(CourseDraft {
            title: Some(title.into()),
            instructor: Some("Ada".into()),
            is_published: true,
            ..CourseDraft::default()
        })
        .await
        .unwrap();
    let mut ids = Vec::new();
    for n in 0..lessons {
        let lesson = courses
            .add_lesson(
                course.id,
                LessonDraft {
                    title: Some(format!("Part {n}")),
                    duration_minutes: Some(20),
                    is_published: true,
                    ..LessonDraft::default()
                },
            )
            .await
            .unwrap();
        ids.push(lesson.id);
    }
    (course.id, ids)
}

#[tokio::test]
async fn completing_every_lesson_issues_one_certificate() {
    let app = app("memdb_services_flow", Clock::fixed(lms_core::time::fixed_now())).await;
    let user = UserId::new(42);
    let (course, lessons) = course_with_lessons(&app, "Rust", 3).await;
    app.enrollments().enroll(Some(user), Some(course)).await.unwrap();

    let progress = app.progress();
    for lesson in lessons.iter().rev() {
        progress
            .record_lesson_progress(ProgressReport::new(user, *lesson).watched(20).completed())
            .await
            .unwrap();
    }
    // Replaying the final report changes nothing.
    progress
        .record_lesson_progress(ProgressReport::new(user, lessons[0]).watched(20).completed())
        .await
        .unwrap();

    let certs = app.dashboard().certificates(Some(user)).await.unwrap();
    assert_eq!(certs.len(), 1);
    assert_eq!(
        certs[0].certificate_url,
        format!("https://certificates.example.com/user-42-course-{course}.pdf")
    );

    let dashboard = app.dashboard().get_user_dashboard(Some(user)).await.unwrap();
    assert_eq!(dashboard.stats.total_courses, 1);
    assert_eq!(dashboard.stats.completed_courses, 1);
    assert_eq!(dashboard.stats.total_certificates, 1);
    assert_eq!(dashboard.enrolled_courses[0].progress, 100);
    assert!(dashboard.enrolled_courses[0].completed_at.is_some());
}

#[tokio::test]
async fn dashboard_reports_partial_progress_and_webinars() {
    let start = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
    let app = app("memdb_services_dashboard", Clock::fixed(start)).await;
    let user = UserId::new(3);
    let (course, lessons) = course_with_lessons(&app, "Partial", 3).await;
    course_with_lessons(&app, "Empty", 0).await;
    app.enrollments().enroll(Some(user), Some(course)).await.unwrap();
    for lesson in &lessons[..2] {
        app.progress()
            .record_lesson_progress(ProgressReport::new(user, *lesson).completed())
            .await
            .unwrap();
    }

    let webinar = app
        .webinars()
        .create_webinar(WebinarDraft {
            title: Some("Office hours".into()),
            scheduled_date: NaiveDate::from_ymd_opt(2024, 6, 1),
            start_time: NaiveTime::from_hms_opt(14, 30, 15),
            end_time: NaiveTime::from_hms_opt(15, 30, 0),
            ..WebinarDraft::default()
        })
        .await
        .unwrap();
    app.webinars()
        .enroll(Some(user), Some(webinar.id))
        .await
        .unwrap();

    let dashboard = app.dashboard().get_user_dashboard(Some(user)).await.unwrap();
    assert_eq!(dashboard.stats.completed_courses, 0);
    let enrolled = &dashboard.enrolled_courses[0];
    assert_eq!(enrolled.total_lessons, 3);
    assert_eq!(enrolled.completed_lessons, 2);
    assert_eq!(enrolled.progress, 67);

    let webinar = &dashboard.enrolled_webinars[0];
    assert!(!webinar.can_join_now);
    let countdown = webinar.countdown.unwrap();
    assert_eq!((countdown.hours, countdown.minutes, countdown.seconds), (2, 30, 15));
}

#[tokio::test]
async fn dashboard_requires_a_user() {
    let app = app("memdb_services_no_user", Clock::default()).await;
    let err = app.dashboard().get_user_dashboard(None).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
    let err = app.dashboard().list_progress(None, None).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
}

#[tokio::test]
async fn enrollment_rules() {
    let app = app("memdb_services_enroll", Clock::default()).await;
    let user = UserId::new(8);
    let (course, _) = course_with_lessons(&app, "Enroll", 1).await;
    let enrollments = app.enrollments();

    let err = enrollments.enroll(Some(user), None).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
    let err = enrollments
        .enroll(Some(user), Some(CourseId::new(9_999)))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    enrollments.enroll(Some(user), Some(course)).await.unwrap();
    let err = enrollments.enroll(Some(user), Some(course)).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);

    app.courses()
        .update_course(
            course,
            CoursePatch {
                is_published: Some(false),
                ..CoursePatch::default()
            },
        )
        .await
        .unwrap();
    let err = enrollments
        .enroll(Some(UserId::new(9)), Some(course))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert!(enrollments.list_enrollments(Some(user)).await.unwrap().is_empty());
}

#[tokio::test]
async fn catalog_crud() {
    let app = app("memdb_services_catalog", Clock::fixed(lms_core::time::fixed_now())).await;
    let courses = app.courses();
    let category = courses
        .create_category("Data".into(), Some("#00ff00".into()))
        .await
        .unwrap();
    let err = courses.create_category("Data".into(), None).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);

    let created = courses
        .create_course(CourseDraft {
            title: Some("SQL".into()),
            instructor: Some("Codd".into()),
            category_id: Some(category.id),
            is_published: true,
            ..CourseDraft::default()
        })
        .await
        .unwrap();
    let err = courses.create_course(CourseDraft::default()).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);

    let listed = courses
        .list_courses(&CourseQuery::new(Some("Data".into()), Some("sq".into()), None, None))
        .await
        .unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].category_color.as_deref(), Some("#00ff00"));

    let err = courses
        .update_course(created.id, CoursePatch::default())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
    let err = courses
        .update_course(
            CourseId::new(12_345),
            CoursePatch {
                title: Some("x".into()),
                ..CoursePatch::default()
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    let updated = courses
        .update_course(
            created.id,
            CoursePatch {
                description: Some(Some("Relational algebra".into())),
                ..CoursePatch::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.description.as_deref(), Some("Relational algebra"));

    let lesson = courses
        .add_lesson(
            created.id,
            LessonDraft {
                title: Some("Joins".into()),
                is_published: true,
                ..LessonDraft::default()
            },
        )
        .await
        .unwrap();
    let detail = courses.get_course(created.id).await.unwrap();
    assert_eq!(detail.lessons, vec![lesson]);
    assert_eq!(detail.summary.lesson_count, 1);

    courses.delete_course(created.id).await.unwrap();
    let err = courses.delete_course(created.id).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    let err = courses.get_course(created.id).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn progress_listing_follows_course_and_lesson_order() {
    let app = app("memdb_services_listing", Clock::fixed(lms_core::time::fixed_now())).await;
    let user = UserId::new(11);
    let (course, lessons) = course_with_lessons(&app, "Listing", 2).await;
    app.progress()
        .record_lesson_progress(ProgressReport::new(user, lessons[1]).watched(3))
        .await
        .unwrap();
    app.progress()
        .record_lesson_progress(ProgressReport::new(user, lessons[0]).watched(7))
        .await
        .unwrap();

    let entries = app
        .dashboard()
        .list_progress(Some(user), Some(course))
        .await
        .unwrap();
    let ids: Vec<_> = entries.iter().map(|e| e.progress.lesson_id).collect();
    assert_eq!(ids, lessons);
    assert_eq!(entries[0].lesson_title, "Part 0");
    assert_eq!(entries[0].progress.watched_duration_minutes, 7);
}

#[tokio::test]
async fn webinar_rules() {
    let app = app("memdb_services_webinars", Clock::default()).await;
    let webinars = app.webinars();
    let err = webinars
        .create_webinar(WebinarDraft {
            title: Some("No times".into()),
            ..WebinarDraft::default()
        })
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);

    let err = webinars
        .enroll(Some(UserId::new(1)), Some(WebinarId::new(404)))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}
