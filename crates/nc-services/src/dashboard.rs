//! Role-based dashboard
//!
//! Coordinators see the whole team; management users see their own
//! records plus their leave balances.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use nc_core::result::NcResult;
use nc_core::types::{LeaveStatus, Role};
use nc_db::{LeaveFilter, TaskFilter, WorkLogFilter};
use nc_models::{LeaveBalance, LeaveRequest, Task, User, WorkLog};
use serde::Serialize;

use crate::base::ServiceContext;
use crate::leaves::LeaveService;

#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    pub role: Role,
    pub today: NaiveDate,
    /// Root tasks in scope; subtasks are reached through the tree endpoint
    pub tasks: Vec<Task>,
    /// Counts over every task in scope, keyed by status name
    pub tasks_by_status: BTreeMap<&'static str, usize>,
    pub overdue_tasks: usize,
    pub todays_logs: Vec<WorkLog>,
    pub pending_leaves: Vec<LeaveRequest>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub leave_balances: Option<Vec<LeaveBalance>>,
}

#[derive(Clone)]
pub struct DashboardService {
    ctx: ServiceContext,
}

impl DashboardService {
    pub fn new(ctx: ServiceContext) -> Self {
        Self { ctx }
    }

    pub async fn dashboard(&self, actor: &User) -> NcResult<Dashboard> {
        let today = self.ctx.today();
        let owner = if actor.is_nc() { None } else { actor.id };

        let all_tasks = self
            .ctx
            .stores
            .tasks
            .list(&TaskFilter {
                assignee_id: owner,
                ..Default::default()
            })
            .await?;
        let mut tasks_by_status = BTreeMap::new();
        for task in &all_tasks {
            *tasks_by_status.entry(task.status.as_str()).or_insert(0) += 1;
        }
        let overdue_tasks = all_tasks.iter().filter(|t| t.is_overdue(today)).count();

        let todays_logs = self
            .ctx
            .stores
            .work_logs
            .list(&WorkLogFilter {
                user_id: owner,
                date: Some(today),
                task_id: None,
            })
            .await?;
        let pending_leaves = self
            .ctx
            .stores
            .leaves
            .list(&LeaveFilter {
                user_id: owner,
                status: Some(LeaveStatus::Pending),
            })
            .await?;

        let leave_balances = match owner {
            Some(user_id) => Some(LeaveService::new(self.ctx.clone()).balance_of(user_id).await?),
            None => None,
        };

        let tasks = all_tasks.into_iter().filter(|t| t.parent_id.is_none()).collect();

        Ok(Dashboard {
            role: actor.role,
            today,
            tasks,
            tasks_by_status,
            overdue_tasks,
            todays_logs,
            pending_leaves,
            leave_balances,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{day, Fixture};
    use crate::{LeaveService, TaskService, WorkLogService};
    use nc_core::types::{LeaveType, TaskStatus};
    use nc_models::{NewLeaveRequest, NewTask, NewWorkLog, WorkLogDetails};

    fn new_task(title: &str, parent_id: Option<i64>, end: Option<NaiveDate>) -> NewTask {
        NewTask {
            title: title.into(),
            description: String::new(),
            assignee_id: None,
            parent_id,
            start_date: None,
            end_date: end,
            stakeholders: Vec::new(),
        }
    }

    async fn seed(fx: &Fixture) {
        let tasks = TaskService::new(fx.ctx.clone());
        let root = tasks
            .create(&fx.worker, new_task("Quarterly report", None, Some(day(3))))
            .await
            .unwrap()
            .value;
        tasks
            .create(&fx.worker, new_task("Collect data", root.id, None))
            .await
            .unwrap();
        tasks
            .create(&fx.colleague, new_task("Other report", None, None))
            .await
            .unwrap();

        WorkLogService::new(fx.ctx.clone())
            .submit(
                &fx.worker,
                NewWorkLog {
                    date: None,
                    task_id: root.id,
                    detail: "Drafted the outline".into(),
                    details: WorkLogDetails::General,
                    status_update: Some(TaskStatus::Running),
                },
            )
            .await
            .unwrap();
        LeaveService::new(fx.ctx.clone())
            .apply(
                &fx.worker,
                NewLeaveRequest {
                    leave_type: LeaveType::Casual,
                    start_date: day(20),
                    end_date: day(21),
                    reason: "travel".into(),
                },
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_management_dashboard() {
        let fx = Fixture::new().await;
        seed(&fx).await;

        let dash = DashboardService::new(fx.ctx.clone()).dashboard(&fx.worker).await.unwrap();
        assert_eq!(dash.role, Role::Management);
        assert_eq!(dash.tasks.len(), 1);
        assert_eq!(dash.tasks_by_status.get("Running"), Some(&1));
        assert_eq!(dash.tasks_by_status.get("To Do"), Some(&1));
        assert_eq!(dash.overdue_tasks, 1);
        assert_eq!(dash.todays_logs.len(), 1);
        assert_eq!(dash.pending_leaves.len(), 1);

        let balances = dash.leave_balances.unwrap();
        assert_eq!(balances.len(), 3);
        assert!(balances.iter().all(|b| b.used == 0));
    }

    #[tokio::test]
    async fn test_coordinator_dashboard() {
        let fx = Fixture::new().await;
        seed(&fx).await;

        let dash = DashboardService::new(fx.ctx.clone()).dashboard(&fx.nc).await.unwrap();
        assert_eq!(dash.tasks.len(), 2);
        assert_eq!(dash.tasks_by_status.values().sum::<usize>(), 3);
        assert!(dash.leave_balances.is_none());
        assert_eq!(dash.today, day(6));
    }
}
