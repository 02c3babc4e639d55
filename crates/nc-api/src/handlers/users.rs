//! User handlers

use axum::{extract::State, Json};
use nc_core::types::Role;
use nc_db::UserFilter;
use nc_models::User;
use serde::Deserialize;

use crate::error::ApiResult;
use crate::extractors::{ApiQuery, AppState, AuthenticatedUser};

#[derive(Debug, Default, Deserialize)]
pub struct UsersQuery {
    pub role: Option<Role>,
    pub active: Option<bool>,
}

/// GET /api/v1/users/me
pub async fn me(user: AuthenticatedUser) -> Json<User> {
    Json(user.0)
}

/// GET /api/v1/users
pub async fn list_users(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ApiQuery(query): ApiQuery<UsersQuery>,
) -> ApiResult<Json<Vec<User>>> {
    let filter = UserFilter {
        role: query.role,
        active: query.active,
    };
    Ok(Json(state.services.users.list(&user, &filter).await?))
}
