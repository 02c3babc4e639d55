//! Shared service plumbing

use std::sync::Arc;

use chrono::{Local, NaiveDate};
use nc_audit::AuditService;
use nc_auth::{CurrentUser, Permission};
use nc_core::config::AppConfig;
use nc_core::error::NcError;
use nc_core::result::NcResult;
use nc_core::traits::Id;
use nc_core::types::Role;
use nc_db::{Stores, UserFilter};
use nc_models::User;
use nc_notifications::Notifier;
use nc_summaries::{LlmClient, Summarizer};

use crate::audit_trail::AuditTrailService;
use crate::dashboard::DashboardService;
use crate::leaves::LeaveService;
use crate::reviews::ReviewService;
use crate::tasks::TaskService;
use crate::users::UserService;
use crate::work_logs::WorkLogService;

/// Source of "today" for date rules
#[derive(Debug, Clone, Copy, Default)]
pub enum Clock {
    #[default]
    System,
    Fixed(NaiveDate),
}

impl Clock {
    pub fn today(&self) -> NaiveDate {
        match self {
            Clock::System => Local::now().date_naive(),
            Clock::Fixed(date) => *date,
        }
    }
}

/// Dependencies shared by every service
#[derive(Clone)]
pub struct ServiceContext {
    pub stores: Stores,
    pub audit: Arc<AuditService>,
    pub notifier: Notifier,
    pub config: Arc<AppConfig>,
    pub clock: Clock,
}

impl ServiceContext {
    pub fn new(stores: Stores, audit: Arc<AuditService>, notifier: Notifier, config: Arc<AppConfig>) -> Self {
        Self {
            stores,
            audit,
            notifier,
            config,
            clock: Clock::System,
        }
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    pub(crate) async fn find_user(&self, id: Id) -> NcResult<User> {
        self.stores
            .users
            .find_by_id(id)
            .await?
            .ok_or_else(|| NcError::not_found("User", "id", id))
    }

    /// Active coordinators, the recipients of workflow notifications
    pub(crate) async fn coordinators(&self) -> NcResult<Vec<User>> {
        Ok(self
            .stores
            .users
            .list(&UserFilter::active_with_role(Role::Nc))
            .await?)
    }
}

/// Forbidden unless the actor's role carries `permission`
pub(crate) fn require(actor: &User, permission: Permission) -> NcResult<()> {
    CurrentUser::from(actor).require(permission)
}

/// All services over one context
#[derive(Clone)]
pub struct Services {
    pub users: UserService,
    pub tasks: TaskService,
    pub work_logs: WorkLogService,
    pub leaves: LeaveService,
    pub dashboard: DashboardService,
    pub reviews: ReviewService,
    pub audit: AuditTrailService,
}

impl Services {
    pub fn new(ctx: ServiceContext, llm: Arc<dyn LlmClient>) -> Self {
        Self {
            users: UserService::new(ctx.clone()),
            tasks: TaskService::new(ctx.clone()),
            work_logs: WorkLogService::new(ctx.clone()),
            leaves: LeaveService::new(ctx.clone()),
            dashboard: DashboardService::new(ctx.clone()),
            reviews: ReviewService::new(ctx.clone(), Summarizer::new(llm)),
            audit: AuditTrailService::new(ctx),
        }
    }
}
