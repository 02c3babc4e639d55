//! Task services
//!
//! Completing a task rolls completion up the tree: each ancestor whose
//! children are all `Completed` is closed too. Deleting a task removes its
//! whole subtree.

use nc_audit::{AuditAction, AuditEvent, EntityKind};
use nc_auth::{CurrentUser, Permission};
use nc_contracts::tasks::{CreateTaskContract, DeleteTaskContract, UpdateTaskStatusContract};
use nc_contracts::Contract;
use nc_core::error::NcError;
use nc_core::result::{NcResult, Outcome};
use nc_core::traits::Id;
use nc_core::types::TaskStatus;
use nc_db::TaskFilter;
use nc_models::{NewTask, Task, TaskNode, User};
use serde::Serialize;
use tracing::info;

use crate::base::{require, ServiceContext};

/// A status update and the ancestors it closed
#[derive(Debug, Clone, Serialize)]
pub struct StatusChange {
    pub task: Task,
    pub rolled_up: Vec<Task>,
}

#[derive(Clone)]
pub struct TaskService {
    ctx: ServiceContext,
}

impl TaskService {
    pub fn new(ctx: ServiceContext) -> Self {
        Self { ctx }
    }

    async fn find(&self, id: Id) -> NcResult<Task> {
        self.ctx
            .stores
            .tasks
            .find_by_id(id)
            .await?
            .ok_or_else(|| NcError::not_found("Task", "id", id))
    }

    /// Task visible to the actor: coordinators see all, others their own
    pub async fn get(&self, actor: &User, id: Id) -> NcResult<Task> {
        let task = self.find(id).await?;
        if !CurrentUser::from(actor).can_view_records_of(task.assignee_id) {
            return Err(NcError::forbidden("You can only view tasks assigned to you"));
        }
        Ok(task)
    }

    pub async fn list(&self, actor: &User, mut filter: TaskFilter) -> NcResult<Vec<Task>> {
        filter.assignee_id = CurrentUser::from(actor).scope_owner(filter.assignee_id)?;
        Ok(self.ctx.stores.tasks.list(&filter).await?)
    }

    /// Subtree under a visible task
    ///
    /// Subtasks assigned to someone the actor may not view are left out
    /// together with everything below them.
    pub async fn tree(&self, actor: &User, id: Id) -> NcResult<TaskNode> {
        let root = self.get(actor, id).await?;
        let viewer = CurrentUser::from(actor);
        let mut descendants = self.ctx.stores.tasks.descendants(id).await?;
        descendants.retain(|t| viewer.can_view_records_of(t.assignee_id));
        Ok(TaskNode::build(root, &descendants))
    }

    pub async fn create(&self, actor: &User, params: NewTask) -> NcResult<Outcome<Task>> {
        let actor_id = actor.id.unwrap_or_default();
        let task = params.into_task(actor_id);

        let assignee = self.ctx.stores.users.find_by_id(task.assignee_id).await?;
        let parent = match task.parent_id {
            Some(parent_id) => self.ctx.stores.tasks.find_by_id(parent_id).await?,
            None => None,
        };
        CreateTaskContract::new(actor, assignee.as_ref(), parent.as_ref()).validate(&task)?;
        let assignee = assignee.ok_or_else(|| NcError::not_found("User", "id", task.assignee_id))?;

        let created = self.ctx.stores.tasks.create(&task).await?;
        self.ctx
            .audit
            .log(
                AuditEvent::new(AuditAction::Created, EntityKind::Task)
                    .by(actor_id)
                    .on(created.id)
                    .with_after(&created),
            )
            .await;
        info!(task_id = ?created.id, assignee_id = created.assignee_id, "Task created");

        let mut outcome = Outcome::new(created);
        if let Some(warning) = self
            .ctx
            .notifier
            .task_assigned(&outcome.value, &assignee, actor)
            .await
        {
            outcome.warn(warning);
        }
        Ok(outcome)
    }

    pub async fn update_status(&self, actor: &User, id: Id, status: TaskStatus) -> NcResult<Outcome<StatusChange>> {
        let task = self.find(id).await?;
        UpdateTaskStatusContract::new(actor, &task).validate(&status)?;
        let change = self.apply_status(actor.id.unwrap_or_default(), task, status).await?;
        Ok(Outcome::new(change))
    }

    /// Write a validated status change, audit it and roll completion up
    pub(crate) async fn apply_status(&self, actor_id: Id, task: Task, status: TaskStatus) -> NcResult<StatusChange> {
        if task.status == status {
            return Ok(StatusChange {
                task,
                rolled_up: Vec::new(),
            });
        }

        let id = task.id.unwrap_or_default();
        let updated = self.ctx.stores.tasks.update_status(id, status).await?;
        self.ctx
            .audit
            .log(
                AuditEvent::new(AuditAction::StatusChanged, EntityKind::Task)
                    .by(actor_id)
                    .on(Some(id))
                    .with_before(&task)
                    .with_after(&updated),
            )
            .await;
        info!(task_id = id, from = %task.status, to = %status, "Task status changed");

        let rolled_up = if updated.status.is_completed() {
            self.roll_up(actor_id, updated.parent_id).await?
        } else {
            Vec::new()
        };
        Ok(StatusChange {
            task: updated,
            rolled_up,
        })
    }

    /// Close ancestors whose children are all completed, nearest first
    async fn roll_up(&self, actor_id: Id, mut parent_id: Option<Id>) -> NcResult<Vec<Task>> {
        let mut closed = Vec::new();
        while let Some(id) = parent_id {
            let Some(parent) = self.ctx.stores.tasks.complete_if_children_completed(id).await? else {
                break;
            };
            self.ctx
                .audit
                .log(
                    AuditEvent::new(AuditAction::RolledUp, EntityKind::Task)
                        .by(actor_id)
                        .on(Some(id))
                        .with_after(&parent)
                        .with_message("All subtasks completed"),
                )
                .await;
            info!(task_id = id, "Parent task completed by rollup");
            parent_id = parent.parent_id;
            closed.push(parent);
        }
        Ok(closed)
    }

    /// Delete a task and all of its descendants
    pub async fn delete(&self, actor: &User, id: Id) -> NcResult<Outcome<Vec<Id>>> {
        require(actor, Permission::DeleteTasks)?;
        let task = self.find(id).await?;
        DeleteTaskContract::new(actor).validate(&task)?;
        let actor_id = actor.id.unwrap_or_default();

        let deleted = self.ctx.stores.tasks.delete_subtree(id).await?;
        self.ctx
            .audit
            .log(
                AuditEvent::new(AuditAction::Deleted, EntityKind::Task)
                    .by(actor_id)
                    .on(Some(id))
                    .with_before(&task)
                    .with_message(format!("Deleted {} task(s): {:?}", deleted.len(), deleted)),
            )
            .await;
        info!(task_id = id, count = deleted.len(), "Task subtree deleted");

        // The removed branch may have been the parent's last open child
        self.roll_up(actor_id, task.parent_id).await?;
        Ok(Outcome::new(deleted))
    }

    /// Tasks assigned to one user, for reviews and dashboards
    pub(crate) async fn assigned_to(&self, user_id: Id) -> NcResult<Vec<Task>> {
        Ok(self.ctx.stores.tasks.list(&TaskFilter::assigned_to(user_id)).await?)
    }
}
