use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use lms_core::model::{Certificate, Dashboard, UserId};
use serde::Deserialize;
use services::AppServices;

use super::error::{ApiResponse, ApiResult};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserQuery {
    #[serde(default, alias = "user_id")]
    pub user_id: Option<UserId>,
}

pub async fn user_dashboard(
    State(app): State<AppServices>,
    query: Result<Query<UserQuery>, QueryRejection>,
) -> ApiResult<ApiResponse<Dashboard>> {
    let Query(query) = query?;
    let dashboard = app.dashboard().get_user_dashboard(query.user_id).await?;
    Ok(ApiResponse::ok(dashboard))
}

pub async fn certificates(
    State(app): State<AppServices>,
    query: Result<Query<UserQuery>, QueryRejection>,
) -> ApiResult<ApiResponse<Vec<Certificate>>> {
    let Query(query) = query?;
    let certificates = app.dashboard().certificates(query.user_id).await?;
    Ok(ApiResponse::ok(certificates))
}
