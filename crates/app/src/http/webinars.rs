use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use chrono::{NaiveDate, NaiveTime};
use lms_core::model::{EnrolledWebinar, UserId, Webinar, WebinarDraft, WebinarId};
use serde::Deserialize;
use services::AppServices;

use super::error::{ApiResponse, ApiResult};

/// Times are `HH:MM:SS`, dates `YYYY-MM-DD`, both UTC.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebinarBody {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    host: Option<String>,
    #[serde(default, alias = "scheduled_date")]
    scheduled_date: Option<NaiveDate>,
    #[serde(default, alias = "start_time")]
    start_time: Option<NaiveTime>,
    #[serde(default, alias = "end_time")]
    end_time: Option<NaiveTime>,
}

pub async fn create(
    State(app): State<AppServices>,
    payload: Result<Json<WebinarBody>, JsonRejection>,
) -> ApiResult<(StatusCode, ApiResponse<Webinar>)> {
    let Json(body) = payload?;
    let draft = WebinarDraft {
        title: body.title,
        description: body.description,
        host: body.host,
        scheduled_date: body.scheduled_date,
        start_time: body.start_time,
        end_time: body.end_time,
    };
    let webinar = app.webinars().create_webinar(draft).await?;
    Ok(ApiResponse::ok(webinar).created())
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebinarEnrollBody {
    #[serde(default, alias = "user_id")]
    user_id: Option<UserId>,
    #[serde(default, alias = "webinar_id")]
    webinar_id: Option<WebinarId>,
}

pub async fn enroll(
    State(app): State<AppServices>,
    payload: Result<Json<WebinarEnrollBody>, JsonRejection>,
) -> ApiResult<(StatusCode, ApiResponse<EnrolledWebinar>)> {
    let Json(body) = payload?;
    let enrolled = app
        .webinars()
        .enroll(body.user_id, body.webinar_id)
        .await?;
    Ok(ApiResponse::ok(enrolled)
        .with_message("Successfully registered for webinar")
        .created())
}
