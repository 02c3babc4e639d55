//! AI summary handlers

use axum::{extract::State, Json};
use chrono::NaiveDate;
use nc_core::result::Outcome;
use nc_services::{TaskReview, UserSummary};
use serde::Deserialize;

use crate::error::ApiResult;
use crate::extractors::{ApiQuery, AppState, AuthenticatedUser};

#[derive(Debug, Default, Deserialize)]
pub struct SummaryQuery {
    /// Defaults to today
    pub date: Option<NaiveDate>,
}

/// POST /api/v1/summaries/daily
pub async fn daily(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ApiQuery(query): ApiQuery<SummaryQuery>,
) -> ApiResult<Json<Outcome<Vec<UserSummary>>>> {
    Ok(Json(state.services.reviews.daily_summaries(&user, query.date).await?))
}

/// POST /api/v1/summaries/task-review
pub async fn task_review(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ApiQuery(query): ApiQuery<SummaryQuery>,
) -> ApiResult<Json<Outcome<Vec<TaskReview>>>> {
    Ok(Json(state.services.reviews.task_reviews(&user, query.date).await?))
}
