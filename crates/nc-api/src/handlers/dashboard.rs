//! Dashboard handler

use axum::{extract::State, Json};
use nc_services::Dashboard;

use crate::error::ApiResult;
use crate::extractors::{AppState, AuthenticatedUser};

/// GET /api/v1/dashboard
pub async fn show(State(state): State<AppState>, user: AuthenticatedUser) -> ApiResult<Json<Dashboard>> {
    Ok(Json(state.services.dashboard.dashboard(&user).await?))
}
