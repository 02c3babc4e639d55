//! Request authentication
//!
//! A request is authenticated by its session id, taken from the session
//! cookie or from an `Authorization: Bearer <session id>` header.

use std::sync::Arc;

use nc_core::config::AuthConfig;
use nc_core::error::NcError;
use nc_core::traits::Id;
use nc_core::types::Role;
use thiserror::Error;

use crate::session::{extract_session_id, CookieConfig, Session, SessionError, SessionStore};

/// Authentication errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("Authentication required")]
    Required,
    #[error("Invalid email or password")]
    InvalidCredentials,
    #[error("Session expired, please log in again")]
    SessionExpired,
    #[error("Insufficient permissions")]
    InsufficientPermissions,
}

impl From<SessionError> for AuthError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::NotFound => AuthError::Required,
            SessionError::Expired => AuthError::SessionExpired,
        }
    }
}

impl From<AuthError> for NcError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InsufficientPermissions => NcError::forbidden(err.to_string()),
            other => NcError::unauthorized(other.to_string()),
        }
    }
}

/// Authenticator for validating requests
#[derive(Clone)]
pub struct Authenticator {
    sessions: Arc<dyn SessionStore>,
    cookie: CookieConfig,
    idle_timeout_seconds: i64,
}

impl Authenticator {
    pub fn new(sessions: Arc<dyn SessionStore>, config: &AuthConfig) -> Self {
        Self {
            sessions,
            cookie: CookieConfig::from(config),
            idle_timeout_seconds: config.session_idle_timeout_minutes as i64 * 60,
        }
    }

    pub fn cookie_config(&self) -> &CookieConfig {
        &self.cookie
    }

    /// Open a session for a user whose credentials were verified
    pub fn start_session(&self, user_id: Id, role: Role, headers: &RequestHeaders) -> Session {
        let mut session = Session::new(user_id, role, self.idle_timeout_seconds);
        if let Some(ip) = headers.client_ip() {
            session = session.with_ip(ip);
        }
        if let Some(agent) = &headers.user_agent {
            session = session.with_user_agent(agent.clone());
        }
        self.sessions.insert(session.clone());
        tracing::debug!(user_id, "Session started");
        session
    }

    /// Resolve and refresh the session carried by a request
    pub fn authenticate(&self, headers: &RequestHeaders) -> Result<Session, AuthError> {
        let session_id = self.session_id(headers).ok_or(AuthError::Required)?;
        self.sessions.touch(&session_id).map_err(AuthError::from)
    }

    /// End the session carried by a request, if any
    pub fn end_session(&self, headers: &RequestHeaders) -> Option<Session> {
        let session_id = self.session_id(headers)?;
        self.sessions.delete(&session_id)
    }

    /// Drop every session of a user (deactivation)
    pub fn end_user_sessions(&self, user_id: Id) -> usize {
        self.sessions.delete_user_sessions(user_id)
    }

    pub fn cleanup_expired(&self) -> usize {
        self.sessions.cleanup_expired()
    }

    fn session_id(&self, headers: &RequestHeaders) -> Option<String> {
        headers
            .cookie
            .as_deref()
            .and_then(|cookie| extract_session_id(cookie, &self.cookie.name))
            .or_else(|| {
                headers
                    .authorization
                    .as_deref()
                    .and_then(extract_bearer_token)
                    .map(str::to_string)
            })
    }
}

/// Extract the token from a `Bearer` authorization header
pub fn extract_bearer_token(header: &str) -> Option<&str> {
    let (scheme, token) = header.trim().split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

/// Request headers relevant for authentication
#[derive(Debug, Default, Clone)]
pub struct RequestHeaders {
    pub authorization: Option<String>,
    pub cookie: Option<String>,
    pub x_forwarded_for: Option<String>,
    pub user_agent: Option<String>,
}

impl RequestHeaders {
    /// Create from a list of header key-value pairs
    pub fn from_pairs(pairs: &[(impl AsRef<str>, impl AsRef<str>)]) -> Self {
        let mut headers = Self::default();

        for (name, value) in pairs {
            let value = value.as_ref().to_string();
            match name.as_ref().to_lowercase().as_str() {
                "authorization" => headers.authorization = Some(value),
                "cookie" => headers.cookie = Some(value),
                "x-forwarded-for" => headers.x_forwarded_for = Some(value),
                "user-agent" => headers.user_agent = Some(value),
                _ => {}
            }
        }

        headers
    }

    /// First address of `X-Forwarded-For`
    pub fn client_ip(&self) -> Option<String> {
        self.x_forwarded_for
            .as_deref()
            .and_then(|v| v.split(',').next())
            .map(|ip| ip.trim().to_string())
            .filter(|ip| !ip.is_empty())
    }
}
