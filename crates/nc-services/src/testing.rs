//! Shared fixtures for service tests

use std::sync::Arc;

use chrono::NaiveDate;
use nc_audit::{AuditAction, AuditEvent, AuditService, MemoryAuditStore};
use nc_auth::hash_password;
use nc_core::config::AppConfig;
use nc_core::types::Role;
use nc_db::memory::{MemoryLeaveStore, MemoryTaskStore, MemoryUserStore, MemoryWorkLogStore};
use nc_db::Stores;
use nc_models::User;
use nc_notifications::{Notifier, RecordingEmailSender};

use crate::base::{Clock, ServiceContext};

pub const PASSWORD: &str = "field-work-2024";

pub fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 5, d).unwrap()
}

pub struct Fixture {
    pub ctx: ServiceContext,
    pub sender: Arc<RecordingEmailSender>,
    pub audit_store: Arc<MemoryAuditStore>,
    pub nc: User,
    pub worker: User,
    pub colleague: User,
}

impl Fixture {
    /// Today is 2024-05-06; one coordinator and two management users
    pub async fn new() -> Self {
        Self::with_sender(RecordingEmailSender::new()).await
    }

    pub async fn with_sender(sender: RecordingEmailSender) -> Self {
        let mut config = AppConfig::default();
        config.email.official_nc_email = Some("office@example.org".into());

        let audit_store = Arc::new(MemoryAuditStore::new());
        let stores = Stores {
            users: Arc::new(MemoryUserStore::new()),
            tasks: Arc::new(MemoryTaskStore::new()),
            work_logs: Arc::new(MemoryWorkLogStore::new()),
            leaves: Arc::new(MemoryLeaveStore::new()),
            audit: audit_store.clone(),
        };
        let audit = Arc::new(AuditService::new(audit_store.clone()));
        let sender = Arc::new(sender);
        let notifier = Notifier::new(sender.clone(), &config.email, audit.clone());
        let ctx = ServiceContext::new(stores, audit, notifier, Arc::new(config))
            .with_clock(Clock::Fixed(day(6)));

        let nc = create_user(&ctx, "asha_rao@example.org", Role::Nc).await;
        let worker = create_user(&ctx, "ravi_kumar@example.org", Role::Management).await;
        let colleague = create_user(&ctx, "meena_iyer@example.org", Role::Management).await;

        Self {
            ctx,
            sender,
            audit_store,
            nc,
            worker,
            colleague,
        }
    }

    pub fn events(&self, action: AuditAction) -> Vec<AuditEvent> {
        self.audit_store
            .all()
            .into_iter()
            .filter(|e| e.action == action)
            .collect()
    }
}

/// An active user with a password already set
pub async fn create_user(ctx: &ServiceContext, email: &str, role: Role) -> User {
    let mut user = User::new(email, "", role);
    user.password_hash = Some(hash_password(PASSWORD).unwrap());
    user.must_set_password = false;
    ctx.stores.users.create(&user).await.unwrap()
}
