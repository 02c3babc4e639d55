//! Session Authentication
//!
//! Sessions live in memory and expire after an idle window: every
//! authenticated request moves `last_seen_at` forward, and a session not
//! seen for longer than the window is dropped on its next use.

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use nc_core::config::AuthConfig;
use nc_core::traits::Id;
use nc_core::types::Role;
use serde::Serialize;
use thiserror::Error;

/// Session errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("Session not found")]
    NotFound,
    #[error("Session expired")]
    Expired,
}

/// An authenticated session
#[derive(Debug, Clone, Serialize)]
pub struct Session {
    /// 64-character random id, used as cookie value and bearer token
    pub id: String,
    pub user_id: Id,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub last_seen_at: DateTime<Utc>,
    /// Idle window in seconds
    pub idle_timeout: i64,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

impl Session {
    pub fn new(user_id: Id, role: Role, idle_timeout_seconds: i64) -> Self {
        let now = Utc::now();
        Self {
            id: generate_session_id(),
            user_id,
            role,
            created_at: now,
            last_seen_at: now,
            idle_timeout: idle_timeout_seconds,
            ip_address: None,
            user_agent: None,
        }
    }

    /// Moment the session expires unless touched again
    pub fn expires_at(&self) -> DateTime<Utc> {
        self.last_seen_at + Duration::seconds(self.idle_timeout)
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at()
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    pub fn touch(&mut self) {
        self.last_seen_at = Utc::now();
    }

    pub fn with_ip(mut self, ip: impl Into<String>) -> Self {
        self.ip_address = Some(ip.into());
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }
}

/// Generate a secure random session ID
fn generate_session_id() -> String {
    use rand::Rng;
    const CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
    const SESSION_ID_LENGTH: usize = 64;

    let mut rng = rand::rng();
    (0..SESSION_ID_LENGTH)
        .map(|_| CHARSET[rng.random_range(0..CHARSET.len())] as char)
        .collect()
}

/// Session store trait for different backends
pub trait SessionStore: Send + Sync {
    /// Store a session
    fn insert(&self, session: Session);

    /// Look up a live session and refresh its idle window.
    ///
    /// An expired session is removed and reported as `Expired`.
    fn touch(&self, session_id: &str) -> Result<Session, SessionError>;

    /// Delete a session, returning it if it existed
    fn delete(&self, session_id: &str) -> Option<Session>;

    /// Delete all sessions for a user
    fn delete_user_sessions(&self, user_id: Id) -> usize;

    /// Clean up expired sessions
    fn cleanup_expired(&self) -> usize;
}

/// In-memory session store
#[derive(Default)]
pub struct MemorySessionStore {
    sessions: DashMap<String, Session>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

impl SessionStore for MemorySessionStore {
    fn insert(&self, session: Session) {
        self.sessions.insert(session.id.clone(), session);
    }

    fn touch(&self, session_id: &str) -> Result<Session, SessionError> {
        {
            let mut entry = self
                .sessions
                .get_mut(session_id)
                .ok_or(SessionError::NotFound)?;
            if !entry.is_expired() {
                entry.touch();
                return Ok((*entry).clone());
            }
        }

        self.sessions.remove(session_id);
        Err(SessionError::Expired)
    }

    fn delete(&self, session_id: &str) -> Option<Session> {
        self.sessions.remove(session_id).map(|(_, session)| session)
    }

    fn delete_user_sessions(&self, user_id: Id) -> usize {
        let before = self.sessions.len();
        self.sessions.retain(|_, s| s.user_id != user_id);
        before - self.sessions.len()
    }

    fn cleanup_expired(&self) -> usize {
        let now = Utc::now();
        let before = self.sessions.len();
        self.sessions.retain(|_, s| !s.is_expired_at(now));
        let removed = before - self.sessions.len();
        if removed > 0 {
            tracing::debug!(removed, "Removed expired sessions");
        }
        removed
    }
}

/// Cookie configuration for sessions
#[derive(Debug, Clone)]
pub struct CookieConfig {
    pub name: String,
    pub path: String,
    pub secure: bool,
    pub http_only: bool,
    pub same_site: SameSite,
    pub max_age: Option<i64>,
}

#[derive(Debug, Clone, Copy)]
pub enum SameSite {
    Strict,
    Lax,
    None,
}

impl Default for CookieConfig {
    fn default() -> Self {
        Self {
            name: "ncops_session".to_string(),
            path: "/".to_string(),
            secure: false,
            http_only: true,
            same_site: SameSite::Lax,
            max_age: None,
        }
    }
}

impl From<&AuthConfig> for CookieConfig {
    fn from(config: &AuthConfig) -> Self {
        Self {
            name: config.cookie_name.clone(),
            secure: config.secure_cookies,
            max_age: Some(config.session_idle_timeout_minutes as i64 * 60),
            ..Default::default()
        }
    }
}

impl CookieConfig {
    /// Build cookie header value
    pub fn build_cookie(&self, session_id: &str) -> String {
        let mut parts = vec![
            format!("{}={}", self.name, session_id),
            format!("Path={}", self.path),
        ];

        if self.secure {
            parts.push("Secure".to_string());
        }
        if self.http_only {
            parts.push("HttpOnly".to_string());
        }

        parts.push(
            match self.same_site {
                SameSite::Strict => "SameSite=Strict",
                SameSite::Lax => "SameSite=Lax",
                SameSite::None => "SameSite=None",
            }
            .to_string(),
        );

        if let Some(max_age) = self.max_age {
            parts.push(format!("Max-Age={}", max_age));
        }

        parts.join("; ")
    }

    /// Build cookie header to clear the session
    pub fn build_clear_cookie(&self) -> String {
        format!("{}=; Path={}; Max-Age=0; HttpOnly", self.name, self.path)
    }
}

/// Extract session ID from cookie header
pub fn extract_session_id(cookie_header: &str, cookie_name: &str) -> Option<String> {
    cookie_header
        .split(';')
        .filter_map(|part| part.trim().split_once('='))
        .find(|(name, _)| name.trim() == cookie_name)
        .map(|(_, value)| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
