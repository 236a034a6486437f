use lms_core::model::CertificateTemplate;
use reqwest::{Client, StatusCode};
use serde_json::{Value, json};
use services::{AppServices, Clock};
use storage::repository::Storage;

struct TestServer {
    base: String,
    client: Client,
}

impl TestServer {
    async fn start(name: &str) -> Self {
        let url = format!("sqlite:file:{name}?mode=memory&cache=shared");
        let storage = Storage::sqlite(&url).await.expect("storage");
        let services =
            AppServices::from_storage(&storage, Clock::system(), CertificateTemplate::default());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app::router(services)).await.unwrap();
        });

        Self {
            base: format!("http://{addr}"),
            client: Client::new(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base)
    }

    async fn get(&self, path: &str) -> (StatusCode, Value) {
        let res = self.client.get(self.url(path)).send().await.unwrap();
        let status = res.status();
        (status, res.json().await.unwrap())
    }

    async fn send(&self, method: reqwest::Method, path: &str, body: Value) -> (StatusCode, Value) {
        let res = self
            .client
            .request(method, self.url(path))
            .json(&body)
            .send()
            .await
            .unwrap();
        let status = res.status();
        (status, res.json().await.unwrap())
    }

    async fn post(&self, path: &str, body: Value) -> (StatusCode, Value) {
        self.send(reqwest::Method::POST, path, body).await
    }

    /// Published course with `lessons` published lessons; returns (course id, lesson ids).
    async fn course(&self, title: &str, lessons: usize) -> (u64, Vec<u64>) {
        let (status, body) = self
            .post(
                "/api/courses",
                json!({"title": title, "instructor": "Ada", "isPublished": true}),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        let course = body["data"]["id"].as_u64().unwrap();

        let mut ids = Vec::new();
        for n in 0..lessons {
            let (status, body) = self
                .post(
                    &format!("/api/courses/{course}/lessons"),
                    json!({"title": format!("Lesson {n}"), "duration_minutes": 10, "is_published": true}),
                )
                .await;
            assert_eq!(status, StatusCode::CREATED, "{body}");
            ids.push(body["data"]["id"].as_u64().unwrap());
        }
        (course, ids)
    }
}

#[tokio::test]
async fn health_and_unknown_routes() {
    let server = TestServer::start("memdb_http_health").await;
    let res = server.client.get(server.url("/health")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.text().await.unwrap(), "OK");

    let (status, body) = server.get("/api/nope").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn progress_updates_drive_the_dashboard() {
    let server = TestServer::start("memdb_http_progress").await;
    let (course, lessons) = server.course("Rust", 3).await;

    let (status, _) = server
        .post("/api/enrollments", json!({"userId": 5, "courseId": course}))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, body) = server
        .post("/api/enrollments", json!({"userId": 5, "courseId": course}))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["success"], false);

    for lesson in &lessons[..2] {
        let (status, body) = server
            .post(
                "/api/lesson-progress",
                json!({"userId": 5, "lessonId": lesson, "watchedDurationMinutes": 10, "isCompleted": true}),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["isCompleted"], true);
        assert_eq!(body["message"], "Progress updated");
    }

    let (status, body) = server.get("/api/user-dashboard?userId=5").await;
    assert_eq!(status, StatusCode::OK);
    let data = &body["data"];
    assert_eq!(data["stats"]["totalCourses"], 1);
    assert_eq!(data["stats"]["completedCourses"], 0);
    assert_eq!(data["enrolledCourses"][0]["progress"], 67);
    assert_eq!(data["enrolledCourses"][0]["totalLessons"], 3);

    let (status, _) = server
        .post(
            "/api/lesson-progress",
            json!({"user_id": 5, "lesson_id": lessons[2], "is_completed": true}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = server.get("/api/certificates?userId=5").await;
    let certificates = body["data"].as_array().unwrap();
    assert_eq!(certificates.len(), 1);
    assert_eq!(certificates[0]["courseId"], course);

    let (_, body) = server.get("/api/user-dashboard?userId=5").await;
    assert_eq!(body["data"]["stats"]["completedCourses"], 1);
    assert_eq!(body["data"]["stats"]["totalCertificates"], 1);
    assert_eq!(body["data"]["enrolledCourses"][0]["progress"], 100);
}

#[tokio::test]
async fn rejected_progress_writes_nothing() {
    let server = TestServer::start("memdb_http_rejects").await;
    let (course, lessons) = server.course("Rejects", 1).await;

    let (status, body) = server
        .post("/api/lesson-progress", json!({"userId": 9, "isCompleted": true}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"success": false, "error": "lesson id is required"}));

    let (status, _) = server
        .post("/api/lesson-progress", json!({"userId": 9, "lessonId": 424_242}))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let res = server
        .client
        .post(server.url("/api/lesson-progress"))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let (status, body) = server
        .get(&format!("/api/lesson-progress?userId=9&courseId={course}"))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"].as_array().unwrap().is_empty());

    let (status, _) = server
        .post("/api/lesson-progress", json!({"userId": 9, "lessonId": lessons[0], "watchedDurationMinutes": 4}))
        .await;
    assert_eq!(status, StatusCode::OK);
    let (_, body) = server.get("/api/lesson-progress?userId=9").await;
    assert_eq!(body["data"][0]["watchedDurationMinutes"], 4);
    assert_eq!(body["data"][0]["lessonTitle"], "Lesson 0");
}

#[tokio::test]
async fn unstorable_ids_are_bad_requests() {
    let server = TestServer::start("memdb_http_huge_ids").await;
    let (course, lessons) = server.course("Huge", 1).await;

    let (status, body) = server
        .post(
            "/api/lesson-progress",
            json!({"userId": 1, "lessonId": 18_446_744_073_709_551_615_u64, "isCompleted": true}),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
    assert_eq!(body["success"], false);

    let (status, _) = server
        .post(
            "/api/lesson-progress",
            json!({"userId": 9_223_372_036_854_775_808_u64, "lessonId": lessons[0], "isCompleted": true}),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = server.get("/api/user-dashboard?userId=18446744073709551615").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = server.get("/api/courses/18446744073709551615").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = server
        .post("/api/enrollments", json!({"userId": 1, "courseId": 18_446_744_073_709_551_615_u64}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Largest storable id is an ordinary miss.
    let (status, _) = server
        .post("/api/lesson-progress", json!({"userId": 1, "lessonId": 9_223_372_036_854_775_807_u64}))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, body) = server.get(&format!("/api/lesson-progress?userId=1&courseId={course}")).await;
    assert_eq!(body["data"], json!([]));
}

#[tokio::test]
async fn dashboard_needs_a_user() {
    let server = TestServer::start("memdb_http_no_user").await;
    let (status, body) = server.get("/api/user-dashboard").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "user id is required");

    let (status, _) = server.get("/api/user-dashboard?userId=abc").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn course_crud_statuses() {
    let server = TestServer::start("memdb_http_courses").await;

    let (status, body) = server
        .post("/api/categories", json!({"name": "Systems", "color": "#111111"}))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let category = body["data"]["id"].as_u64().unwrap();
    let (status, _) = server.post("/api/categories", json!({"name": "Systems"})).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = server.post("/api/courses", json!({"title": "No instructor"})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = server
        .post(
            "/api/courses",
            json!({
                "title": "Kernels",
                "instructor": "Linus",
                "category_id": category,
                "difficulty_level": "advanced",
                "isPublished": true
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = body["data"]["id"].as_u64().unwrap();
    server.course("Compilers", 0).await;

    let (status, body) = server.get("/api/courses?category=Systems").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 1);
    assert_eq!(body["data"][0]["categoryName"], "Systems");
    let (_, body) = server.get("/api/courses").await;
    assert_eq!(body["total"], 2);

    let (status, _) = server
        .send(reqwest::Method::PUT, &format!("/api/courses/{id}"), json!({}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = server
        .send(reqwest::Method::PUT, "/api/courses/999999", json!({"title": "Ghost"}))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, body) = server
        .send(
            reqwest::Method::PUT,
            &format!("/api/courses/{id}"),
            json!({"description": "Schedulers", "categoryId": null}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["description"], "Schedulers");
    assert_eq!(body["data"]["categoryId"], Value::Null);

    let (status, body) = server.get(&format!("/api/courses/{id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["lessons"], json!([]));

    let (status, _) = server
        .send(reqwest::Method::DELETE, &format!("/api/courses/{id}"), json!({}))
        .await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = server
        .send(reqwest::Method::DELETE, &format!("/api/courses/{id}"), json!({}))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = server.get(&format!("/api/courses/{id}")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = server.get("/api/courses/not-a-number").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn webinar_registration() {
    let server = TestServer::start("memdb_http_webinars").await;
    let (status, body) = server
        .post(
            "/api/webinars",
            json!({
                "title": "Release party",
                "scheduledDate": "2099-01-01",
                "startTime": "18:00:00",
                "endTime": "19:00:00"
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    let webinar = body["data"]["id"].as_u64().unwrap();

    let (status, body) = server
        .post("/api/webinar-enrollments", json!({"userId": 1, "webinarId": webinar}))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["canJoinNow"], false);
    let (status, _) = server
        .post("/api/webinar-enrollments", json!({"userId": 1, "webinarId": webinar}))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    let (status, _) = server
        .post("/api/webinar-enrollments", json!({"userId": 1}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn reconcile_converges_after_late_enrollment() {
    let server = TestServer::start("memdb_http_reconcile").await;
    let (course, lessons) = server.course("Late", 1).await;
    let (status, _) = server
        .post(
            "/api/lesson-progress",
            json!({"userId": 2, "lessonId": lessons[0], "isCompleted": true}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let (_, body) = server.get("/api/certificates?userId=2").await;
    assert_eq!(body["data"], json!([]));

    server
        .post("/api/enrollments", json!({"userId": 2, "courseId": course}))
        .await;
    let (status, body) = server
        .post("/api/lesson-progress/reconcile", json!({"userId": 2, "courseId": course}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["enrollmentCompleted"], true);
    assert_eq!(body["data"]["certificateIssued"], true);

    let (_, body) = server
        .post("/api/lesson-progress/reconcile", json!({"userId": 2, "courseId": course}))
        .await;
    assert_eq!(body["data"]["certificateIssued"], false);
    let (_, body) = server.get("/api/certificates?userId=2").await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
}
