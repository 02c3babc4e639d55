//! Audit event model
//!
//! Table: audit_events

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use nc_core::traits::Id;
use nc_core::types::ParseEnumError;
use serde::{Deserialize, Serialize};

/// What kind of record an event is about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    User,
    Task,
    WorkLog,
    LeaveRequest,
    Session,
    System,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Task => "task",
            Self::WorkLog => "work_log",
            Self::LeaveRequest => "leave_request",
            Self::Session => "session",
            Self::System => "system",
        }
    }
}

impl FromStr for EntityKind {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Self::User),
            "task" => Ok(Self::Task),
            "work_log" => Ok(Self::WorkLog),
            "leave_request" => Ok(Self::LeaveRequest),
            "session" => Ok(Self::Session),
            "system" => Ok(Self::System),
            _ => Err(ParseEnumError {
                kind: "entity kind",
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    Created,
    Updated,
    StatusChanged,
    RolledUp,
    Deleted,
    Approved,
    Rejected,
    Provisioned,
    Deactivated,
    PasswordSet,
    Login,
    LoginFailed,
    Logout,
    SessionExpired,
    EmailFailed,
    AiReview,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Updated => "updated",
            Self::StatusChanged => "status_changed",
            Self::RolledUp => "rolled_up",
            Self::Deleted => "deleted",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Provisioned => "provisioned",
            Self::Deactivated => "deactivated",
            Self::PasswordSet => "password_set",
            Self::Login => "login",
            Self::LoginFailed => "login_failed",
            Self::Logout => "logout",
            Self::SessionExpired => "session_expired",
            Self::EmailFailed => "email_failed",
            Self::AiReview => "ai_review",
        }
    }

    const ALL: [AuditAction; 16] = [
        Self::Created,
        Self::Updated,
        Self::StatusChanged,
        Self::RolledUp,
        Self::Deleted,
        Self::Approved,
        Self::Rejected,
        Self::Provisioned,
        Self::Deactivated,
        Self::PasswordSet,
        Self::Login,
        Self::LoginFailed,
        Self::Logout,
        Self::SessionExpired,
        Self::EmailFailed,
        Self::AiReview,
    ];
}

impl FromStr for AuditAction {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|action| action.as_str() == s)
            .ok_or_else(|| ParseEnumError {
                kind: "audit action",
                value: s.to_string(),
            })
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One audit record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEvent {
    pub id: Option<Id>,
    /// `None` for events raised by the system itself
    pub actor_id: Option<Id>,
    pub action: AuditAction,
    pub entity_kind: EntityKind,
    pub entity_id: Option<Id>,
    pub before: Option<serde_json::Value>,
    pub after: Option<serde_json::Value>,
    pub message: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl AuditEvent {
    pub fn new(action: AuditAction, entity_kind: EntityKind) -> Self {
        Self {
            id: None,
            actor_id: None,
            action,
            entity_kind,
            entity_id: None,
            before: None,
            after: None,
            message: None,
            created_at: Utc::now(),
        }
    }

    /// System event with a free-text message
    pub fn system(action: AuditAction, message: impl Into<String>) -> Self {
        Self::new(action, EntityKind::System).with_message(message)
    }

    pub fn by(mut self, actor_id: Id) -> Self {
        self.actor_id = Some(actor_id);
        self
    }

    pub fn on(mut self, entity_id: Option<Id>) -> Self {
        self.entity_id = entity_id;
        self
    }

    pub fn with_before<T: Serialize>(mut self, before: &T) -> Self {
        self.before = serde_json::to_value(before).ok();
        self
    }

    pub fn with_after<T: Serialize>(mut self, after: &T) -> Self {
        self.after = serde_json::to_value(after).ok();
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Top-level keys whose values differ between the snapshots
    pub fn changed_fields(&self) -> Vec<String> {
        let empty = serde_json::Map::new();
        let before = self.before.as_ref().and_then(|v| v.as_object()).unwrap_or(&empty);
        let after = self.after.as_ref().and_then(|v| v.as_object()).unwrap_or(&empty);

        let mut keys: Vec<String> = before
            .keys()
            .chain(after.keys())
            .filter(|k| before.get(*k) != after.get(*k))
            .cloned()
            .collect();
        keys.sort();
        keys.dedup();
        keys
    }
}

/// Query filters for reading the trail
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuditFilter {
    pub entity_kind: Option<EntityKind>,
    pub entity_id: Option<Id>,
    pub actor_id: Option<Id>,
    pub limit: Option<usize>,
}

impl AuditFilter {
    pub const DEFAULT_LIMIT: usize = 100;

    pub fn matches(&self, event: &AuditEvent) -> bool {
        self.entity_kind.map_or(true, |k| event.entity_kind == k)
            && self.entity_id.map_or(true, |id| event.entity_id == Some(id))
            && self.actor_id.map_or(true, |id| event.actor_id == Some(id))
    }

    pub fn effective_limit(&self) -> usize {
        self.limit.unwrap_or(Self::DEFAULT_LIMIT).min(1000)
    }
}
