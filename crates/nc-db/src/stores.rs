//! Store traits used by the service layer
//!
//! Every write that the original workflow left racy is a single store call
//! here, so each implementation can make it atomic.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use nc_audit::{AuditStore, MemoryAuditStore};
use nc_core::traits::Id;
use nc_core::types::{LeaveStatus, LeaveType, Role, TaskStatus};
use nc_models::{LeaveRequest, Task, User, WorkLog};
use serde::Deserialize;

use crate::memory::{MemoryLeaveStore, MemoryTaskStore, MemoryUserStore, MemoryWorkLogStore};
use crate::pool::Database;
use crate::repository::RepositoryResult;

#[derive(Debug, Clone, Default)]
pub struct UserFilter {
    pub role: Option<Role>,
    pub active: Option<bool>,
}

impl UserFilter {
    pub fn active_with_role(role: Role) -> Self {
        Self {
            role: Some(role),
            active: Some(true),
        }
    }

    pub fn matches(&self, user: &User) -> bool {
        self.role.map_or(true, |r| user.role == r) && self.active.map_or(true, |a| user.active == a)
    }
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_id(&self, id: Id) -> RepositoryResult<Option<User>>;
    async fn find_by_email(&self, email: &str) -> RepositoryResult<Option<User>>;
    /// Ordered by email
    async fn list(&self, filter: &UserFilter) -> RepositoryResult<Vec<User>>;
    /// Fails with `Conflict` when the email is taken
    async fn create(&self, user: &User) -> RepositoryResult<User>;
    /// One-time password set; `Conflict` if the first-login flag is already cleared
    async fn set_initial_password(&self, id: Id, password_hash: &str) -> RepositoryResult<User>;
    async fn record_login(&self, id: Id) -> RepositoryResult<()>;
    async fn set_active(&self, id: Id, active: bool) -> RepositoryResult<User>;
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskFilter {
    pub assignee_id: Option<Id>,
    pub parent_id: Option<Id>,
    pub status: Option<TaskStatus>,
    /// Only tasks without a parent
    #[serde(default)]
    pub roots_only: bool,
}

impl TaskFilter {
    pub fn assigned_to(user_id: Id) -> Self {
        Self {
            assignee_id: Some(user_id),
            ..Default::default()
        }
    }

    pub fn matches(&self, task: &Task) -> bool {
        self.assignee_id.map_or(true, |a| task.assignee_id == a)
            && self.parent_id.map_or(true, |p| task.parent_id == Some(p))
            && self.status.map_or(true, |s| task.status == s)
            && (!self.roots_only || task.parent_id.is_none())
    }
}

#[async_trait]
pub trait TaskStore: Send + Sync {
    async fn find_by_id(&self, id: Id) -> RepositoryResult<Option<Task>>;
    /// Ordered by id
    async fn list(&self, filter: &TaskFilter) -> RepositoryResult<Vec<Task>>;
    async fn create(&self, task: &Task) -> RepositoryResult<Task>;
    async fn update_status(&self, id: Id, status: TaskStatus) -> RepositoryResult<Task>;
    /// All descendants of `id` (not including it), parents before children
    async fn descendants(&self, id: Id) -> RepositoryResult<Vec<Task>>;
    /// Mark `parent_id` Completed if every child is Completed.
    /// Returns the updated parent, or `None` when nothing changed.
    async fn complete_if_children_completed(&self, parent_id: Id) -> RepositoryResult<Option<Task>>;
    /// Delete `id` and its whole subtree in one operation, returning the deleted ids
    async fn delete_subtree(&self, id: Id) -> RepositoryResult<Vec<Id>>;
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WorkLogFilter {
    pub user_id: Option<Id>,
    pub date: Option<NaiveDate>,
    pub task_id: Option<Id>,
}

impl WorkLogFilter {
    pub fn matches(&self, log: &WorkLog) -> bool {
        self.user_id.map_or(true, |u| log.user_id == u)
            && self.date.map_or(true, |d| log.date == d)
            && self.task_id.map_or(true, |t| log.task_id == Some(t))
    }
}

#[async_trait]
pub trait WorkLogStore: Send + Sync {
    async fn find_by_id(&self, id: Id) -> RepositoryResult<Option<WorkLog>>;
    /// Ordered by date then id
    async fn list(&self, filter: &WorkLogFilter) -> RepositoryResult<Vec<WorkLog>>;
    async fn append(&self, log: &WorkLog) -> RepositoryResult<WorkLog>;
    /// Insert or atomically replace the user's log for that day
    async fn upsert_daily(&self, log: &WorkLog) -> RepositoryResult<WorkLog>;
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LeaveFilter {
    pub user_id: Option<Id>,
    pub status: Option<LeaveStatus>,
}

impl LeaveFilter {
    pub fn for_user(user_id: Id) -> Self {
        Self {
            user_id: Some(user_id),
            status: None,
        }
    }

    pub fn matches(&self, request: &LeaveRequest) -> bool {
        self.user_id.map_or(true, |u| request.user_id == u)
            && self.status.map_or(true, |s| request.status == s)
    }
}

/// A decision as written by [`LeaveStore::decide`]
#[derive(Debug, Clone)]
pub struct LeaveDecisionRecord {
    pub status: LeaveStatus,
    pub rejection_reason: Option<String>,
    pub decided_by: Id,
    pub override_balance: bool,
    /// Quota of the request's leave type, re-checked inside the write
    pub quota: i64,
}

pub const INSUFFICIENT_BALANCE: &str = "Insufficient leave balance";

#[async_trait]
pub trait LeaveStore: Send + Sync {
    async fn find_by_id(&self, id: Id) -> RepositoryResult<Option<LeaveRequest>>;
    /// Newest first
    async fn list(&self, filter: &LeaveFilter) -> RepositoryResult<Vec<LeaveRequest>>;
    async fn create(&self, request: &LeaveRequest) -> RepositoryResult<LeaveRequest>;
    /// Transition a pending request exactly once.
    ///
    /// `Conflict` if it is no longer pending; `Validation` if an approval
    /// without override would exceed `quota`. Decisions for the same user
    /// are serialized so concurrent approvals cannot overspend.
    async fn decide(&self, id: Id, decision: &LeaveDecisionRecord) -> RepositoryResult<LeaveRequest>;
    /// Approved days of one type
    async fn used_days(&self, user_id: Id, leave_type: LeaveType) -> RepositoryResult<i64>;
    /// Whether an approved request covers `date`
    async fn on_leave(&self, user_id: Id, date: NaiveDate) -> RepositoryResult<bool>;
    /// Whether a pending or approved request overlaps the range
    async fn overlapping(&self, user_id: Id, start: NaiveDate, end: NaiveDate) -> RepositoryResult<bool>;
}

/// All stores the services need
#[derive(Clone)]
pub struct Stores {
    pub users: Arc<dyn UserStore>,
    pub tasks: Arc<dyn TaskStore>,
    pub work_logs: Arc<dyn WorkLogStore>,
    pub leaves: Arc<dyn LeaveStore>,
    pub audit: Arc<dyn AuditStore>,
}

impl Stores {
    pub fn postgres(db: &Database) -> Self {
        let pool = db.pool().clone();
        Self {
            users: Arc::new(crate::users::UserRepository::new(pool.clone())),
            tasks: Arc::new(crate::tasks::TaskRepository::new(pool.clone())),
            work_logs: Arc::new(crate::work_logs::WorkLogRepository::new(pool.clone())),
            leaves: Arc::new(crate::leave_requests::LeaveRequestRepository::new(pool.clone())),
            audit: Arc::new(crate::audit_events::AuditEventRepository::new(pool)),
        }
    }

    pub fn memory() -> Self {
        Self {
            users: Arc::new(MemoryUserStore::new()),
            tasks: Arc::new(MemoryTaskStore::new()),
            work_logs: Arc::new(MemoryWorkLogStore::new()),
            leaves: Arc::new(MemoryLeaveStore::new()),
            audit: Arc::new(MemoryAuditStore::new()),
        }
    }
}
