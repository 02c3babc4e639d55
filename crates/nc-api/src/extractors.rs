//! Axum extractors for API handlers

use std::sync::Arc;

use axum::{
    async_trait,
    extract::{FromRef, FromRequest, FromRequestParts},
    http::{header, request::Parts, HeaderMap},
};
use nc_auth::{AuthError, Authenticator, RequestHeaders};
use nc_core::config::AppConfig;
use nc_models::User;
use nc_services::Services;

use crate::error::ApiError;

/// Application state
#[derive(Clone)]
pub struct AppState {
    pub services: Services,
    pub authenticator: Authenticator,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(services: Services, authenticator: Authenticator, config: Arc<AppConfig>) -> Self {
        Self {
            services,
            authenticator,
            config,
        }
    }
}

/// The headers authentication looks at
pub fn request_headers(headers: &HeaderMap) -> RequestHeaders {
    let get = |name: header::HeaderName| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };
    RequestHeaders {
        authorization: get(header::AUTHORIZATION),
        cookie: get(header::COOKIE),
        x_forwarded_for: get(header::HeaderName::from_static("x-forwarded-for")),
        user_agent: get(header::USER_AGENT),
    }
}

/// Authenticated user extractor
///
/// Resolves the session from the cookie or bearer token, refreshes its idle
/// window and loads the account, which must still be active.
pub struct AuthenticatedUser(pub User);

#[async_trait]
impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);
        let headers = request_headers(&parts.headers);

        let session = match app_state.authenticator.authenticate(&headers) {
            Ok(session) => session,
            Err(AuthError::SessionExpired) => {
                app_state.services.users.session_expired(headers.client_ip()).await;
                return Err(ApiError::unauthorized("Session expired, please log in again"));
            }
            Err(_) => return Err(ApiError::unauthorized("Authentication required")),
        };

        let user = app_state.services.users.active_user(session.user_id).await?;
        Ok(AuthenticatedUser(user))
    }
}

impl std::ops::Deref for AuthenticatedUser {
    type Target = User;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// JSON body whose rejections use the API error format
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// Query string whose rejections use the API error format
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct ApiQuery<T>(pub T);

/// Path parameters whose rejections use the API error format
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct ApiPath<T>(pub T);

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_request_headers() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc"));
        headers.insert("x-forwarded-for", HeaderValue::from_static("10.0.0.7, 10.0.0.1"));

        let parsed = request_headers(&headers);
        assert_eq!(parsed.authorization.as_deref(), Some("Bearer abc"));
        assert_eq!(parsed.client_ip().as_deref(), Some("10.0.0.7"));
        assert!(parsed.cookie.is_none());
    }
}
