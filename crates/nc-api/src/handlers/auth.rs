//! Login, first-login password set and logout

use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use nc_models::User;
use serde::{Deserialize, Serialize};

use crate::error::ApiResult;
use crate::extractors::{request_headers, ApiJson, AppState, AuthenticatedUser};

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    /// Session id; also set as a cookie, usable as a bearer token
    pub token: String,
    /// Idle window in seconds, refreshed by every request
    pub expires_in: i64,
    pub user: User,
}

#[derive(Debug, Deserialize)]
pub struct FirstLoginRequest {
    pub email: String,
    pub password: String,
    pub password_confirmation: String,
}

/// POST /api/v1/auth/login
pub async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
    ApiJson(body): ApiJson<LoginRequest>,
) -> ApiResult<impl IntoResponse> {
    let user = state.services.users.login(&body.email, &body.password).await?;
    let session = state.authenticator.start_session(
        user.id.unwrap_or_default(),
        user.role,
        &request_headers(&headers),
    );
    let cookie = state.authenticator.cookie_config().build_cookie(&session.id);

    Ok((
        [(header::SET_COOKIE, cookie)],
        Json(LoginResponse {
            token: session.id,
            expires_in: session.idle_timeout,
            user,
        }),
    ))
}

/// POST /api/v1/auth/first-login
pub async fn first_login(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<FirstLoginRequest>,
) -> ApiResult<Json<User>> {
    let user = state
        .services
        .users
        .first_login(&body.email, &body.password, &body.password_confirmation)
        .await?;
    Ok(Json(user))
}

/// POST /api/v1/auth/logout
pub async fn logout(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    headers: HeaderMap,
) -> impl IntoResponse {
    state.authenticator.end_session(&request_headers(&headers));
    state.services.users.logout(&user).await;
    (
        StatusCode::NO_CONTENT,
        [(header::SET_COOKIE, state.authenticator.cookie_config().build_clear_cookie())],
    )
}
