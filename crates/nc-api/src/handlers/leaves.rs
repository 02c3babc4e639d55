//! Leave handlers

use axum::{extract::State, http::StatusCode, Json};
use nc_core::result::Outcome;
use nc_core::traits::Id;
use nc_db::LeaveFilter;
use nc_models::{LeaveBalance, LeaveDecision, LeaveRequest, NewLeaveRequest};
use serde::Deserialize;

use crate::error::ApiResult;
use crate::extractors::{ApiJson, ApiPath, ApiQuery, AppState, AuthenticatedUser};

#[derive(Debug, Default, Deserialize)]
pub struct BalanceQuery {
    pub user_id: Option<Id>,
}

/// POST /api/v1/leaves
pub async fn apply(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ApiJson(params): ApiJson<NewLeaveRequest>,
) -> ApiResult<(StatusCode, Json<Outcome<LeaveRequest>>)> {
    let outcome = state.services.leaves.apply(&user, params).await?;
    Ok((StatusCode::CREATED, Json(outcome)))
}

/// GET /api/v1/leaves?status=
pub async fn list(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ApiQuery(filter): ApiQuery<LeaveFilter>,
) -> ApiResult<Json<Vec<LeaveRequest>>> {
    Ok(Json(state.services.leaves.list(&user, filter).await?))
}

/// POST /api/v1/leaves/:id/decision
pub async fn decide(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ApiPath(id): ApiPath<Id>,
    ApiJson(decision): ApiJson<LeaveDecision>,
) -> ApiResult<Json<Outcome<LeaveRequest>>> {
    Ok(Json(state.services.leaves.decide(&user, id, decision).await?))
}

/// GET /api/v1/leaves/balance
pub async fn balance(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ApiQuery(query): ApiQuery<BalanceQuery>,
) -> ApiResult<Json<Vec<LeaveBalance>>> {
    Ok(Json(state.services.leaves.balance(&user, query.user_id).await?))
}
