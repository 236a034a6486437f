use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use lms_core::model::{CourseId, EnrolledCourse, Enrollment, UserId};
use serde::Deserialize;
use services::AppServices;

use super::dashboard::UserQuery;
use super::error::{ApiResponse, ApiResult};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrollBody {
    #[serde(default, alias = "user_id")]
    user_id: Option<UserId>,
    #[serde(default, alias = "course_id")]
    course_id: Option<CourseId>,
}

pub async fn enroll(
    State(app): State<AppServices>,
    payload: Result<Json<EnrollBody>, JsonRejection>,
) -> ApiResult<(StatusCode, ApiResponse<Enrollment>)> {
    let Json(body) = payload?;
    let enrollment = app
        .enrollments()
        .enroll(body.user_id, body.course_id)
        .await?;
    Ok(ApiResponse::ok(enrollment)
        .with_message("Successfully enrolled in course")
        .created())
}

pub async fn list(
    State(app): State<AppServices>,
    query: Result<Query<UserQuery>, QueryRejection>,
) -> ApiResult<ApiResponse<Vec<EnrolledCourse>>> {
    let Query(query) = query?;
    let courses = app.enrollments().list_enrollments(query.user_id).await?;
    Ok(ApiResponse::ok(courses))
}
