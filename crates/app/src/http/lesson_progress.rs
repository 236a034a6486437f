use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use lms_core::model::{
    CompletionOutcome, CourseId, LessonId, LessonProgress, ProgressEntry, ProgressReport, UserId,
};
use serde::Deserialize;
use services::{AppServices, ProgressServiceError};

use super::error::{ApiResponse, ApiResult};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressBody {
    #[serde(default, alias = "user_id")]
    user_id: Option<UserId>,
    #[serde(default, alias = "lesson_id")]
    lesson_id: Option<LessonId>,
    #[serde(default, alias = "watched_duration_minutes", alias = "watchedMinutes")]
    watched_duration_minutes: Option<u32>,
    #[serde(default, alias = "is_completed")]
    is_completed: Option<bool>,
}

pub async fn record(
    State(app): State<AppServices>,
    payload: Result<Json<ProgressBody>, JsonRejection>,
) -> ApiResult<ApiResponse<LessonProgress>> {
    let Json(body) = payload?;
    let report = ProgressReport::from_parts(
        body.user_id,
        body.lesson_id,
        body.watched_duration_minutes,
        body.is_completed,
    )
    .map_err(ProgressServiceError::from)?;

    let progress = app.progress().record_lesson_progress(report).await?;
    Ok(ApiResponse::ok(progress).with_message("Progress updated"))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressQuery {
    #[serde(default, alias = "user_id")]
    user_id: Option<UserId>,
    #[serde(default, alias = "course_id")]
    course_id: Option<CourseId>,
}

pub async fn list(
    State(app): State<AppServices>,
    query: Result<Query<ProgressQuery>, QueryRejection>,
) -> ApiResult<ApiResponse<Vec<ProgressEntry>>> {
    let Query(query) = query?;
    let entries = app
        .dashboard()
        .list_progress(query.user_id, query.course_id)
        .await?;
    Ok(ApiResponse::ok(entries))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconcileBody {
    #[serde(default, alias = "user_id")]
    user_id: Option<UserId>,
    #[serde(default, alias = "course_id")]
    course_id: Option<CourseId>,
}

pub async fn reconcile(
    State(app): State<AppServices>,
    payload: Result<Json<ReconcileBody>, JsonRejection>,
) -> ApiResult<ApiResponse<CompletionOutcome>> {
    let Json(body) = payload?;
    let outcome = app
        .progress()
        .reconcile_course(body.user_id, body.course_id)
        .await?;
    Ok(ApiResponse::ok(outcome))
}
