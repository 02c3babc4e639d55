//! User services: login, first-login password set, provisioning

use nc_audit::{AuditAction, AuditEvent, EntityKind};
use nc_auth::{hash_password, verify_password, Permission};
use nc_contracts::users::{PasswordChange, ProvisionUserContract, SetPasswordContract};
use nc_contracts::Contract;
use nc_core::error::NcError;
use nc_core::result::NcResult;
use nc_core::traits::Id;
use nc_db::UserFilter;
use nc_models::{NewUser, User};
use tracing::info;

use crate::base::{require, ServiceContext};

pub const INVALID_CREDENTIALS: &str = "Invalid email or password";
pub const FIRST_LOGIN_REQUIRED: &str = "Set your password through first login before signing in";

#[derive(Clone)]
pub struct UserService {
    ctx: ServiceContext,
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

impl UserService {
    pub fn new(ctx: ServiceContext) -> Self {
        Self { ctx }
    }

    /// Verify credentials; every failure except a pending first login
    /// yields the same error
    pub async fn login(&self, email: &str, password: &str) -> NcResult<User> {
        let email = normalize_email(email);
        let Some(user) = self.ctx.stores.users.find_by_email(&email).await? else {
            return Err(self.login_failed(None, &email).await);
        };

        if user.active && user.awaiting_first_login() {
            return Err(NcError::unauthorized(FIRST_LOGIN_REQUIRED));
        }

        let verified = match (&user.password_hash, user.active) {
            (Some(hash), true) => {
                verify_password(password, hash).map_err(|e| NcError::Internal(e.to_string()))?
            }
            _ => false,
        };
        if !verified {
            return Err(self.login_failed(user.id, &email).await);
        }

        let id = user.id.unwrap_or_default();
        self.ctx.stores.users.record_login(id).await?;
        self.ctx
            .audit
            .log(AuditEvent::new(AuditAction::Login, EntityKind::Session).by(id).on(Some(id)))
            .await;
        info!(user_id = id, "User logged in");
        Ok(user)
    }

    async fn login_failed(&self, user_id: Option<Id>, email: &str) -> NcError {
        self.ctx
            .audit
            .log(
                AuditEvent::new(AuditAction::LoginFailed, EntityKind::Session)
                    .on(user_id)
                    .with_message(format!("Failed login for {email}")),
            )
            .await;
        NcError::unauthorized(INVALID_CREDENTIALS)
    }

    /// One-time password set for a provisioned account
    pub async fn first_login(&self, email: &str, password: &str, confirmation: &str) -> NcResult<User> {
        let email = normalize_email(email);
        let user = self
            .ctx
            .stores
            .users
            .find_by_email(&email)
            .await?
            .ok_or_else(|| NcError::unauthorized(INVALID_CREDENTIALS))?;

        SetPasswordContract::new(&user, self.ctx.config.auth.password_min_length).validate(
            &PasswordChange {
                password,
                confirmation,
            },
        )?;

        let id = user.id.unwrap_or_default();
        let hash = hash_password(password).map_err(|e| NcError::Internal(e.to_string()))?;
        let updated = self.ctx.stores.users.set_initial_password(id, &hash).await?;

        self.ctx
            .audit
            .log(AuditEvent::new(AuditAction::PasswordSet, EntityKind::User).by(id).on(Some(id)))
            .await;
        info!(user_id = id, "Initial password set");
        Ok(updated)
    }

    /// Out-of-band account creation; the account starts in first-login state
    pub async fn provision(&self, new_user: NewUser) -> NcResult<User> {
        let user = User::from(new_user);
        let taken = self.ctx.stores.users.find_by_email(&user.email).await?.is_some();
        ProvisionUserContract::new(taken).validate(&user)?;

        let created = self.ctx.stores.users.create(&user).await?;
        self.ctx
            .audit
            .log(
                AuditEvent::new(AuditAction::Provisioned, EntityKind::User)
                    .on(created.id)
                    .with_after(&created),
            )
            .await;
        info!(email = %created.email, role = %created.role, "User provisioned");
        Ok(created)
    }

    pub async fn deactivate(&self, email: &str) -> NcResult<User> {
        let email = normalize_email(email);
        let user = self
            .ctx
            .stores
            .users
            .find_by_email(&email)
            .await?
            .ok_or_else(|| NcError::not_found("User", "email", &email))?;
        let id = user.id.unwrap_or_default();

        let updated = self.ctx.stores.users.set_active(id, false).await?;
        self.ctx
            .audit
            .log(
                AuditEvent::new(AuditAction::Deactivated, EntityKind::User)
                    .on(Some(id))
                    .with_before(&user)
                    .with_after(&updated),
            )
            .await;
        info!(user_id = id, "User deactivated");
        Ok(updated)
    }

    pub async fn logout(&self, user: &User) {
        let id = user.id.unwrap_or_default();
        self.ctx
            .audit
            .log(AuditEvent::new(AuditAction::Logout, EntityKind::Session).by(id).on(Some(id)))
            .await;
        info!(user_id = id, "User logged out");
    }

    /// Record a request that arrived with an idle-expired session
    pub async fn session_expired(&self, ip_address: Option<String>) {
        let message = match ip_address {
            Some(ip) => format!("Session expired (from {ip})"),
            None => "Session expired".to_string(),
        };
        self.ctx
            .audit
            .log(AuditEvent::new(AuditAction::SessionExpired, EntityKind::Session).with_message(message))
            .await;
    }

    pub async fn find(&self, id: Id) -> NcResult<User> {
        self.ctx.find_user(id).await
    }

    /// The account behind a session; deactivated accounts lose access
    pub async fn active_user(&self, id: Id) -> NcResult<User> {
        let user = self
            .ctx
            .stores
            .users
            .find_by_id(id)
            .await?
            .ok_or_else(|| NcError::unauthorized("Account no longer exists"))?;
        if !user.active {
            return Err(NcError::unauthorized("Account is deactivated"));
        }
        Ok(user)
    }

    pub async fn list(&self, actor: &User, filter: &UserFilter) -> NcResult<Vec<User>> {
        require(actor, Permission::ListUsers)?;
        self.all(filter).await
    }

    /// Unscoped listing for administrative tooling
    pub async fn all(&self, filter: &UserFilter) -> NcResult<Vec<User>> {
        Ok(self.ctx.stores.users.list(filter).await?)
    }
}
