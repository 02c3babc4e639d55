//! User model
//!
//! Table: users

use chrono::{DateTime, Utc};
use nc_core::traits::{Entity, Id, Identifiable, Timestamped};
use nc_core::types::Role;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// User account
///
/// Accounts are provisioned out-of-band without a password; the first login
/// sets one and clears `must_set_password`.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct User {
    pub id: Option<Id>,

    /// Login and notification address (unique)
    #[validate(email(message = "is not a valid email address"))]
    pub email: String,

    #[validate(length(max = 255, message = "is too long (maximum is 255 characters)"))]
    pub name: String,

    pub role: Role,

    #[serde(skip_serializing)]
    pub password_hash: Option<String>,

    /// First-login flag
    pub must_set_password: bool,

    pub active: bool,

    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Default for User {
    fn default() -> Self {
        Self {
            id: None,
            email: String::new(),
            name: String::new(),
            role: Role::Management,
            password_hash: None,
            must_set_password: true,
            active: true,
            last_login_at: None,
            created_at: None,
            updated_at: None,
        }
    }
}

impl Identifiable for User {
    fn id(&self) -> Option<Id> {
        self.id
    }
}

impl Timestamped for User {
    fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }

    fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }
}

impl Entity for User {
    const TABLE_NAME: &'static str = "users";
    const TYPE_NAME: &'static str = "User";
}

impl User {
    pub fn new(email: impl Into<String>, name: impl Into<String>, role: Role) -> Self {
        Self {
            email: email.into(),
            name: name.into(),
            role,
            ..Default::default()
        }
    }

    /// Stored name, or one derived from the email local part
    pub fn display_name(&self) -> String {
        if !self.name.trim().is_empty() {
            return self.name.trim().to_string();
        }
        let local = self.email.split('@').next().unwrap_or_default();
        local
            .split(['_', '.'])
            .filter(|part| !part.is_empty())
            .map(capitalize)
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn is_nc(&self) -> bool {
        self.role.is_nc()
    }

    /// Waiting for the first-login password set
    pub fn awaiting_first_login(&self) -> bool {
        self.must_set_password || self.password_hash.is_none()
    }

    pub fn can_login(&self) -> bool {
        self.active && !self.awaiting_first_login()
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Provisioning parameters
#[derive(Debug, Clone, Deserialize)]
pub struct NewUser {
    pub email: String,
    pub name: String,

    pub role: Role,
}

impl From<NewUser> for User {
    fn from(new: NewUser) -> Self {
        User::new(new.email.trim().to_lowercase(), new.name, new.role)
    }
}
