//! JSON API over the application services.

mod courses;
mod dashboard;
mod enrollments;
pub mod error;
mod lesson_progress;
mod webinars;

use axum::Router;
use axum::routing::{get, post};
use services::AppServices;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub use error::{ApiError, ApiResponse, ApiResult};

/// Build the full router: `/health` plus everything under `/api`.
pub fn router(services: AppServices) -> Router {
    let api = Router::new()
        // Progress
        .route(
            "/lesson-progress",
            get(lesson_progress::list).post(lesson_progress::record),
        )
        .route("/lesson-progress/reconcile", post(lesson_progress::reconcile))
        .route("/user-dashboard", get(dashboard::user_dashboard))
        .route("/certificates", get(dashboard::certificates))
        // Catalog
        .route("/categories", post(courses::create_category))
        .route("/courses", get(courses::list).post(courses::create))
        .route(
            "/courses/:id",
            get(courses::get_one)
                .put(courses::update)
                .delete(courses::delete),
        )
        .route("/courses/:id/lessons", post(courses::add_lesson))
        // Enrollments
        .route(
            "/enrollments",
            get(enrollments::list).post(enrollments::enroll),
        )
        .route("/webinars", post(webinars::create))
        .route("/webinar-enrollments", post(webinars::enroll));

    Router::new()
        .route("/health", get(health_check))
        .nest("/api", api)
        .fallback(fallback)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(services)
}

async fn health_check() -> &'static str {
    "OK"
}

async fn fallback() -> ApiError {
    ApiError::not_found("route not found")
}
