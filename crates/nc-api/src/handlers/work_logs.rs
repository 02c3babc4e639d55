//! Work log handlers

use axum::{extract::State, http::StatusCode, Json};
use nc_core::result::Outcome;
use nc_db::WorkLogFilter;
use nc_models::{NewWorkLog, WorkLog};

use crate::error::ApiResult;
use crate::extractors::{ApiJson, ApiQuery, AppState, AuthenticatedUser};

/// POST /api/v1/work-logs
pub async fn submit(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ApiJson(params): ApiJson<NewWorkLog>,
) -> ApiResult<(StatusCode, Json<Outcome<WorkLog>>)> {
    let outcome = state.services.work_logs.submit(&user, params).await?;
    Ok((StatusCode::CREATED, Json(outcome)))
}

/// GET /api/v1/work-logs?date=&user_id=
pub async fn list(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ApiQuery(filter): ApiQuery<WorkLogFilter>,
) -> ApiResult<Json<Vec<WorkLog>>> {
    Ok(Json(state.services.work_logs.list(&user, filter).await?))
}
