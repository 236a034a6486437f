use lms_core::model::{
    CertificateTemplate, CourseDraft, CourseId, LessonDraft, LessonId, ProgressReport, UserId,
};
use services::{AppServices, Clock};
use storage::repository::Storage;

async fn file_backed(dir: &tempfile::TempDir, name: &str) -> AppServices {
    let url = format!("sqlite://{}?mode=rwc", dir.path().join(name).display());
    let storage = Storage::sqlite(&url).await.expect("storage");
    AppServices::from_storage(&storage, Clock::system(), CertificateTemplate::default())
}

async fn published_course(app: &AppServices, lessons: &[&str]) -> (CourseId, Vec<LessonId>) {
    let course = app
        .courses()
        .create_course(CourseDraft {
            title: Some("Concurrency".into()),
            instructor: Some("Hoare".into()),
            is_published: true,
            ..CourseDraft::default()
        })
        .await
        .unwrap();
    let mut ids = Vec::new();
    for title in lessons {
        let lesson = app
            .courses()
            .add_lesson(
                course.id,
                LessonDraft {
                    title: Some((*title).into()),
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

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn racing_final_lessons_issue_exactly_one_certificate() {
    let dir = tempfile::tempdir().expect("tempdir");
    let app = file_backed(&dir, "race.sqlite3").await;
    let (course, lessons) = published_course(&app, &["Locks", "Channels"]).await;

    for n in 1..=20 {
        let user = UserId::new(n);
        app.enrollments().enroll(Some(user), Some(course)).await.unwrap();

        let handles: Vec<_> = lessons
            .iter()
            .map(|lesson| {
                let progress = app.progress();
                let report = ProgressReport::new(user, *lesson).completed();
                tokio::spawn(async move { progress.record_lesson_progress(report).await })
            })
            .collect();
        for handle in handles {
            handle.await.expect("task").unwrap();
        }

        let certificates = app.dashboard().certificates(Some(user)).await.unwrap();
        assert_eq!(certificates.len(), 1, "user {n}");
        let enrolled = app.enrollments().list_enrollments(Some(user)).await.unwrap();
        assert!(enrolled[0].completed_at.is_some(), "user {n}");
        assert_eq!(enrolled[0].progress, 100);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn simultaneous_first_reports_share_one_row() {
    let dir = tempfile::tempdir().expect("tempdir");
    let app = file_backed(&dir, "first_report.sqlite3").await;
    let (course, lessons) = published_course(&app, &["Atomics"]).await;

    for n in 1..=20 {
        let user = UserId::new(n);
        let handles: Vec<_> = [3, 5]
            .into_iter()
            .map(|minutes| {
                let progress = app.progress();
                let report = ProgressReport::new(user, lessons[0]).watched(minutes);
                tokio::spawn(async move { progress.record_lesson_progress(report).await })
            })
            .collect();
        let mut ids = Vec::new();
        for handle in handles {
            ids.push(handle.await.expect("task").unwrap().id);
        }
        assert_eq!(ids[0], ids[1], "user {n}");

        let entries = app
            .dashboard()
            .list_progress(Some(user), Some(course))
            .await
            .unwrap();
        assert_eq!(entries.len(), 1, "user {n}");
        assert!([3, 5].contains(&entries[0].progress.watched_duration_minutes));
    }
}
