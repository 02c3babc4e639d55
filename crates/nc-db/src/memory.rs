//! In-memory stores
//!
//! Used by tests and when the server starts without a database. Each store
//! holds its rows behind one lock, so every trait method is atomic.

use std::collections::{BTreeMap, HashSet};

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use nc_core::traits::Id;
use nc_core::types::{LeaveStatus, LeaveType, TaskStatus};
use nc_models::leave::used_days;
use nc_models::{LeaveRequest, Task, User, WorkLog};
use parking_lot::RwLock;

use crate::repository::{RepositoryError, RepositoryResult};
use crate::stores::{
    LeaveDecisionRecord, LeaveFilter, LeaveStore, TaskFilter, TaskStore, UserFilter, UserStore,
    WorkLogFilter, WorkLogStore, INSUFFICIENT_BALANCE,
};

/// Rows keyed by id plus the next id to hand out
struct Table<T> {
    rows: BTreeMap<Id, T>,
    next_id: Id,
}

impl<T> Default for Table<T> {
    fn default() -> Self {
        Self {
            rows: BTreeMap::new(),
            next_id: 1,
        }
    }
}

impl<T> Table<T> {
    fn allocate(&mut self) -> Id {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}

#[derive(Default)]
pub struct MemoryUserStore {
    table: RwLock<Table<User>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_id(&self, id: Id) -> RepositoryResult<Option<User>> {
        Ok(self.table.read().rows.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> RepositoryResult<Option<User>> {
        let email = email.trim();
        Ok(self
            .table
            .read()
            .rows
            .values()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn list(&self, filter: &UserFilter) -> RepositoryResult<Vec<User>> {
        let mut users: Vec<User> = self
            .table
            .read()
            .rows
            .values()
            .filter(|u| filter.matches(u))
            .cloned()
            .collect();
        users.sort_by(|a, b| a.email.cmp(&b.email));
        Ok(users)
    }

    async fn create(&self, user: &User) -> RepositoryResult<User> {
        let mut table = self.table.write();
        if table
            .rows
            .values()
            .any(|u| u.email.eq_ignore_ascii_case(&user.email))
        {
            return Err(RepositoryError::Conflict(format!(
                "email {} is already registered",
                user.email
            )));
        }
        let id = table.allocate();
        let now = Utc::now();
        let mut user = user.clone();
        user.id = Some(id);
        user.created_at = Some(now);
        user.updated_at = Some(now);
        table.rows.insert(id, user.clone());
        Ok(user)
    }

    async fn set_initial_password(&self, id: Id, password_hash: &str) -> RepositoryResult<User> {
        let mut table = self.table.write();
        let user = table
            .rows
            .get_mut(&id)
            .ok_or_else(|| RepositoryError::not_found("User", id))?;
        if !user.must_set_password {
            return Err(RepositoryError::Conflict("Password has already been set".into()));
        }
        user.password_hash = Some(password_hash.to_string());
        user.must_set_password = false;
        user.updated_at = Some(Utc::now());
        Ok(user.clone())
    }

    async fn record_login(&self, id: Id) -> RepositoryResult<()> {
        if let Some(user) = self.table.write().rows.get_mut(&id) {
            user.last_login_at = Some(Utc::now());
        }
        Ok(())
    }

    async fn set_active(&self, id: Id, active: bool) -> RepositoryResult<User> {
        let mut table = self.table.write();
        let user = table
            .rows
            .get_mut(&id)
            .ok_or_else(|| RepositoryError::not_found("User", id))?;
        user.active = active;
        user.updated_at = Some(Utc::now());
        Ok(user.clone())
    }
}

#[derive(Default)]
pub struct MemoryTaskStore {
    table: RwLock<Table<Task>>,
}

impl MemoryTaskStore {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Ids of every descendant of `root`, breadth first
fn collect_descendants(rows: &BTreeMap<Id, Task>, root: Id) -> Vec<Id> {
    let mut found = Vec::new();
    let mut frontier = vec![root];
    let mut seen = HashSet::from([root]);
    while !frontier.is_empty() {
        let next: Vec<Id> = rows
            .values()
            .filter(|t| t.parent_id.is_some_and(|p| frontier.contains(&p)))
            .filter_map(|t| t.id)
            .filter(|id| seen.insert(*id))
            .collect();
        found.extend(&next);
        frontier = next;
    }
    found
}

#[async_trait]
impl TaskStore for MemoryTaskStore {
    async fn find_by_id(&self, id: Id) -> RepositoryResult<Option<Task>> {
        Ok(self.table.read().rows.get(&id).cloned())
    }

    async fn list(&self, filter: &TaskFilter) -> RepositoryResult<Vec<Task>> {
        Ok(self
            .table
            .read()
            .rows
            .values()
            .filter(|t| filter.matches(t))
            .cloned()
            .collect())
    }

    async fn create(&self, task: &Task) -> RepositoryResult<Task> {
        let mut table = self.table.write();
        if let Some(parent_id) = task.parent_id {
            if !table.rows.contains_key(&parent_id) {
                return Err(RepositoryError::not_found("Task", parent_id));
            }
        }
        let id = table.allocate();
        let now = Utc::now();
        let mut task = task.clone();
        task.id = Some(id);
        task.created_at = Some(now);
        task.updated_at = Some(now);
        table.rows.insert(id, task.clone());
        Ok(task)
    }

    async fn update_status(&self, id: Id, status: TaskStatus) -> RepositoryResult<Task> {
        let mut table = self.table.write();
        let task = table
            .rows
            .get_mut(&id)
            .ok_or_else(|| RepositoryError::not_found("Task", id))?;
        task.status = status;
        task.updated_at = Some(Utc::now());
        Ok(task.clone())
    }

    async fn descendants(&self, id: Id) -> RepositoryResult<Vec<Task>> {
        let table = self.table.read();
        Ok(collect_descendants(&table.rows, id)
            .into_iter()
            .filter_map(|child| table.rows.get(&child).cloned())
            .collect())
    }

    async fn complete_if_children_completed(&self, parent_id: Id) -> RepositoryResult<Option<Task>> {
        let mut table = self.table.write();
        let mut children = table
            .rows
            .values()
            .filter(|t| t.parent_id == Some(parent_id))
            .peekable();
        if children.peek().is_none() || !children.all(|t| t.status.is_completed()) {
            return Ok(None);
        }
        match table.rows.get_mut(&parent_id) {
            Some(parent) if !parent.status.is_completed() => {
                parent.status = TaskStatus::Completed;
                parent.updated_at = Some(Utc::now());
                Ok(Some(parent.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn delete_subtree(&self, id: Id) -> RepositoryResult<Vec<Id>> {
        let mut table = self.table.write();
        if !table.rows.contains_key(&id) {
            return Err(RepositoryError::not_found("Task", id));
        }
        let mut deleted = vec![id];
        deleted.extend(collect_descendants(&table.rows, id));
        for task_id in &deleted {
            table.rows.remove(task_id);
        }
        Ok(deleted)
    }
}

/// Work logs; deleting tasks does not reach in here, so readers should
/// tolerate task ids that no longer resolve.
#[derive(Default)]
pub struct MemoryWorkLogStore {
    table: RwLock<Table<WorkLog>>,
    /// (user, date) -> id of the log written in daily-upsert mode
    daily_slots: RwLock<BTreeMap<(Id, NaiveDate), Id>>,
}

impl MemoryWorkLogStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl WorkLogStore for MemoryWorkLogStore {
    async fn find_by_id(&self, id: Id) -> RepositoryResult<Option<WorkLog>> {
        Ok(self.table.read().rows.get(&id).cloned())
    }

    async fn list(&self, filter: &WorkLogFilter) -> RepositoryResult<Vec<WorkLog>> {
        let mut logs: Vec<WorkLog> = self
            .table
            .read()
            .rows
            .values()
            .filter(|l| filter.matches(l))
            .cloned()
            .collect();
        logs.sort_by_key(|l| (l.date, l.id));
        Ok(logs)
    }

    async fn append(&self, log: &WorkLog) -> RepositoryResult<WorkLog> {
        let mut table = self.table.write();
        let id = table.allocate();
        let now = Utc::now();
        let mut log = log.clone();
        log.id = Some(id);
        log.created_at = Some(now);
        log.updated_at = Some(now);
        table.rows.insert(id, log.clone());
        Ok(log)
    }

    async fn upsert_daily(&self, log: &WorkLog) -> RepositoryResult<WorkLog> {
        let mut table = self.table.write();
        let mut slots = self.daily_slots.write();
        let now = Utc::now();
        let key = (log.user_id, log.date);

        if let Some(existing) = slots.get(&key).and_then(|id| table.rows.get_mut(id)) {
            existing.task_id = log.task_id;
            existing.detail = log.detail.clone();
            existing.details = log.details.clone();
            existing.status_update = log.status_update;
            existing.updated_at = Some(now);
            return Ok(existing.clone());
        }

        let id = table.allocate();
        let mut log = log.clone();
        log.id = Some(id);
        log.created_at = Some(now);
        log.updated_at = Some(now);
        table.rows.insert(id, log.clone());
        slots.insert(key, id);
        Ok(log)
    }
}

#[derive(Default)]
pub struct MemoryLeaveStore {
    table: RwLock<Table<LeaveRequest>>,
}

impl MemoryLeaveStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LeaveStore for MemoryLeaveStore {
    async fn find_by_id(&self, id: Id) -> RepositoryResult<Option<LeaveRequest>> {
        Ok(self.table.read().rows.get(&id).cloned())
    }

    async fn list(&self, filter: &LeaveFilter) -> RepositoryResult<Vec<LeaveRequest>> {
        Ok(self
            .table
            .read()
            .rows
            .values()
            .rev()
            .filter(|r| filter.matches(r))
            .cloned()
            .collect())
    }

    async fn create(&self, request: &LeaveRequest) -> RepositoryResult<LeaveRequest> {
        let mut table = self.table.write();
        let id = table.allocate();
        let now = Utc::now();
        let mut request = request.clone();
        request.id = Some(id);
        request.created_at = Some(now);
        request.updated_at = Some(now);
        table.rows.insert(id, request.clone());
        Ok(request)
    }

    async fn decide(&self, id: Id, decision: &LeaveDecisionRecord) -> RepositoryResult<LeaveRequest> {
        let mut table = self.table.write();
        let current = table
            .rows
            .get(&id)
            .cloned()
            .ok_or_else(|| RepositoryError::not_found("LeaveRequest", id))?;

        if !current.status.is_pending() {
            return Err(RepositoryError::Conflict(format!(
                "leave request {id} has already been {}",
                current.status.as_str().to_lowercase()
            )));
        }

        let approving = decision.status == LeaveStatus::Approved;
        if approving && !decision.override_balance {
            let same_user: Vec<LeaveRequest> = table
                .rows
                .values()
                .filter(|r| r.user_id == current.user_id)
                .cloned()
                .collect();
            let used = used_days(&same_user, current.leave_type);
            if used + i64::from(current.days) > decision.quota {
                return Err(RepositoryError::Validation(INSUFFICIENT_BALANCE.into()));
            }
        }

        let request = table
            .rows
            .get_mut(&id)
            .ok_or_else(|| RepositoryError::not_found("LeaveRequest", id))?;
        request.status = decision.status;
        request.rejection_reason = decision.rejection_reason.clone();
        request.decided_by = Some(decision.decided_by);
        request.decided_at = Some(Utc::now());
        request.override_balance = approving && decision.override_balance;
        request.updated_at = request.decided_at;
        Ok(request.clone())
    }

    async fn used_days(&self, user_id: Id, leave_type: LeaveType) -> RepositoryResult<i64> {
        let table = self.table.read();
        let requests: Vec<LeaveRequest> = table
            .rows
            .values()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect();
        Ok(used_days(&requests, leave_type))
    }

    async fn on_leave(&self, user_id: Id, date: NaiveDate) -> RepositoryResult<bool> {
        Ok(self
            .table
            .read()
            .rows
            .values()
            .any(|r| r.user_id == user_id && r.covers(date)))
    }

    async fn overlapping(&self, user_id: Id, start: NaiveDate, end: NaiveDate) -> RepositoryResult<bool> {
        let range = nc_core::types::DateRange::new(start, end);
        Ok(self
            .table
            .read()
            .rows
            .values()
            .any(|r| r.user_id == user_id && r.is_blocking() && r.range().overlaps(&range)))
    }
}
