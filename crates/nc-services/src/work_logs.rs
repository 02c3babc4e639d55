//! Work log services

use chrono::NaiveDate;
use nc_audit::{AuditAction, AuditEvent, EntityKind};
use nc_auth::{CurrentUser, Permission};
use nc_contracts::work_logs::SubmitWorkLogContract;
use nc_contracts::Contract;
use nc_core::config::WorkLogMode;
use nc_core::result::{NcResult, Outcome};
use nc_core::traits::Id;
use nc_db::WorkLogFilter;
use nc_models::{NewWorkLog, User, WorkLog};
use tracing::info;

use crate::base::{require, ServiceContext};
use crate::tasks::TaskService;

#[derive(Clone)]
pub struct WorkLogService {
    ctx: ServiceContext,
}

impl WorkLogService {
    pub fn new(ctx: ServiceContext) -> Self {
        Self { ctx }
    }

    /// Submit a log for today or an earlier day
    ///
    /// In daily-upsert mode a second submission for the same day replaces
    /// the first. A status update is applied to the referenced task.
    pub async fn submit(&self, actor: &User, params: NewWorkLog) -> NcResult<Outcome<WorkLog>> {
        require(actor, Permission::SubmitWorkLogs)?;
        let actor_id = actor.id.unwrap_or_default();
        let log = params.into_work_log(actor_id, self.ctx.today());

        let on_leave = self.ctx.stores.leaves.on_leave(actor_id, log.date).await?;
        let task = match log.task_id {
            Some(task_id) => self.ctx.stores.tasks.find_by_id(task_id).await?,
            None => None,
        };
        SubmitWorkLogContract::new(actor, self.ctx.today(), on_leave, task.as_ref()).validate(&log)?;

        let (saved, replaced) = match self.ctx.config.work_log.mode {
            WorkLogMode::DailyUpsert => {
                let earlier = self.for_user_on(actor_id, log.date).await?;
                let saved = self.ctx.stores.work_logs.upsert_daily(&log).await?;
                let replaced = earlier.into_iter().find(|l| l.id.is_some() && l.id == saved.id);
                (saved, replaced)
            }
            WorkLogMode::Append => (self.ctx.stores.work_logs.append(&log).await?, None),
        };
        let event = match &replaced {
            Some(previous) => AuditEvent::new(AuditAction::Updated, EntityKind::WorkLog).with_before(previous),
            None => AuditEvent::new(AuditAction::Created, EntityKind::WorkLog),
        };
        self.ctx
            .audit
            .log(event.by(actor_id).on(saved.id).with_after(&saved))
            .await;
        info!(log_id = ?saved.id, user_id = actor_id, date = %saved.date, "Work log submitted");

        let task = match (task, saved.status_update) {
            (Some(task), Some(status)) => {
                let change = TaskService::new(self.ctx.clone())
                    .apply_status(actor_id, task, status)
                    .await?;
                Some(change.task)
            }
            (task, _) => task,
        };

        let mut outcome = Outcome::new(saved);
        let coordinators = self.ctx.coordinators().await?;
        if let Some(warning) = self
            .ctx
            .notifier
            .work_log_submitted(actor, &outcome.value, task.as_ref(), &coordinators)
            .await
        {
            outcome.warn(warning);
        }
        Ok(outcome)
    }

    pub async fn list(&self, actor: &User, mut filter: WorkLogFilter) -> NcResult<Vec<WorkLog>> {
        filter.user_id = CurrentUser::from(actor).scope_owner(filter.user_id)?;
        Ok(self.ctx.stores.work_logs.list(&filter).await?)
    }

    /// Logs of one user on one day, unscoped; callers check visibility
    pub(crate) async fn for_user_on(&self, user_id: Id, date: NaiveDate) -> NcResult<Vec<WorkLog>> {
        let filter = WorkLogFilter {
            user_id: Some(user_id),
            date: Some(date),
            task_id: None,
        };
        Ok(self.ctx.stores.work_logs.list(&filter).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::leaves::LeaveService;
    use crate::testing::{day, Fixture};
    use nc_core::types::{LeaveStatus, LeaveType, TaskStatus};
    use nc_models::{CallDetails, LeaveDecision, NewLeaveRequest, NewTask, WorkLogDetails};

    fn new_log(detail: &str, task_id: Option<i64>, status: Option<TaskStatus>) -> NewWorkLog {
        NewWorkLog {
            date: None,
            task_id,
            detail: detail.into(),
            details: WorkLogDetails::General,
            status_update: status,
        }
    }

    #[tokio::test]
    async fn test_daily_upsert_keeps_one_log() {
        let fx = Fixture::new().await;
        let service = WorkLogService::new(fx.ctx.clone());

        let first = service.submit(&fx.worker, new_log("Morning visit", None, None)).await.unwrap();
        let second = service
            .submit(&fx.worker, new_log("Revised: school visit", None, None))
            .await
            .unwrap();
        assert_eq!(first.value.id, second.value.id);

        let logs = service.list(&fx.worker, WorkLogFilter::default()).await.unwrap();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].detail, "Revised: school visit");
        assert_eq!(logs[0].date, day(6));

        let mail = fx.sender.find_by_subject("Daily log").unwrap();
        assert_eq!(mail.to[0].email, "asha_rao@example.org");
    }

    #[tokio::test]
    async fn test_daily_resubmission_audited_as_update() {
        let fx = Fixture::new().await;
        let service = WorkLogService::new(fx.ctx.clone());

        service.submit(&fx.worker, new_log("Morning visit", None, None)).await.unwrap();
        service
            .submit(&fx.worker, new_log("Revised: school visit", None, None))
            .await
            .unwrap();

        let created: Vec<_> = fx
            .events(AuditAction::Created)
            .into_iter()
            .filter(|e| e.entity_kind == EntityKind::WorkLog)
            .collect();
        assert_eq!(created.len(), 1);
        assert!(created[0].before.is_none());

        let updated = fx.events(AuditAction::Updated);
        assert_eq!(updated.len(), 1);
        assert_eq!(updated[0].entity_kind, EntityKind::WorkLog);
        assert_eq!(updated[0].entity_id, created[0].entity_id);
        let before = updated[0].before.as_ref().unwrap();
        let after = updated[0].after.as_ref().unwrap();
        assert_eq!(before["detail"], "Morning visit");
        assert_eq!(after["detail"], "Revised: school visit");
    }

    #[tokio::test]
    async fn test_status_update_moves_task() {
        let fx = Fixture::new().await;
        let tasks = TaskService::new(fx.ctx.clone());
        let task = tasks
            .create(
                &fx.nc,
                NewTask {
                    title: "Block survey".into(),
                    description: String::new(),
                    assignee_id: fx.worker.id,
                    parent_id: None,
                    start_date: None,
                    end_date: None,
                    stakeholders: Vec::new(),
                },
            )
            .await
            .unwrap()
            .value;

        let service = WorkLogService::new(fx.ctx.clone());
        let mut params = new_log("Called the block office", task.id, Some(TaskStatus::Running));
        params.details = WorkLogDetails::Call(CallDetails {
            contact: "Block officer".into(),
            organisation: "District office".into(),
            outcome: "Data shared".into(),
        });
        service.submit(&fx.worker, params).await.unwrap();

        let task = tasks.get(&fx.nc, task.id.unwrap()).await.unwrap();
        assert_eq!(task.status, TaskStatus::Running);
        assert_eq!(fx.events(AuditAction::StatusChanged).len(), 1);

        let err = service
            .submit(&fx.worker, new_log("Done!", task.id, Some(TaskStatus::Completed)))
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 422);
    }

    #[tokio::test]
    async fn test_rejected_submissions() {
        let fx = Fixture::new().await;
        let service = WorkLogService::new(fx.ctx.clone());

        let nc = service.submit(&fx.nc, new_log("Coordinating", None, None)).await.unwrap_err();
        assert_eq!(nc.status_code(), 403);

        let mut future = new_log("Tomorrow", None, None);
        future.date = Some(day(7));
        let err = service.submit(&fx.worker, future).await.unwrap_err();
        assert!(err.to_string().contains("date can't be in the future"));

        let blank = service.submit(&fx.worker, new_log("   ", None, None)).await.unwrap_err();
        assert_eq!(blank.status_code(), 422);
    }

    #[tokio::test]
    async fn test_no_logs_on_approved_leave() {
        let fx = Fixture::new().await;
        let leaves = LeaveService::new(fx.ctx.clone());
        let request = leaves
            .apply(
                &fx.worker,
                NewLeaveRequest {
                    leave_type: LeaveType::Sick,
                    start_date: day(6),
                    end_date: day(6),
                    reason: "fever".into(),
                },
            )
            .await
            .unwrap()
            .value;
        leaves
            .decide(
                &fx.nc,
                request.id.unwrap(),
                LeaveDecision {
                    status: LeaveStatus::Approved,
                    rejection_reason: None,
                    override_balance: false,
                },
            )
            .await
            .unwrap();

        let service = WorkLogService::new(fx.ctx.clone());
        let err = service.submit(&fx.worker, new_log("Working anyway", None, None)).await.unwrap_err();
        assert!(err.to_string().contains("approved leave"));
    }

    #[tokio::test]
    async fn test_list_scoping() {
        let fx = Fixture::new().await;
        let service = WorkLogService::new(fx.ctx.clone());
        service.submit(&fx.worker, new_log("Visit", None, None)).await.unwrap();

        assert_eq!(service.list(&fx.nc, WorkLogFilter::default()).await.unwrap().len(), 1);
        assert!(service.list(&fx.colleague, WorkLogFilter::default()).await.unwrap().is_empty());

        let other = WorkLogFilter {
            user_id: fx.worker.id,
            ..Default::default()
        };
        assert_eq!(service.list(&fx.colleague, other).await.unwrap_err().status_code(), 403);
    }
}
