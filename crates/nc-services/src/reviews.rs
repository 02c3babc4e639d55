//! AI summaries and task-aware reviews over the day's work logs

use chrono::NaiveDate;
use nc_audit::{AuditAction, AuditEvent, EntityKind};
use nc_auth::Permission;
use nc_core::result::{NcResult, Outcome};
use nc_core::types::Role;
use nc_db::{TaskFilter, UserFilter};
use nc_models::User;
use nc_summaries::{Summarizer, TaskReview, UserSummary};
use tracing::info;

use crate::base::{require, ServiceContext};
use crate::work_logs::WorkLogService;

pub const NO_LOGS: &str = "No logs";
pub const NO_TASKS_OR_LOGS: &str = "No tasks or logs";

#[derive(Clone)]
pub struct ReviewService {
    ctx: ServiceContext,
    summarizer: Summarizer,
}

impl ReviewService {
    pub fn new(ctx: ServiceContext, summarizer: Summarizer) -> Self {
        Self { ctx, summarizer }
    }

    async fn management_users(&self) -> NcResult<Vec<User>> {
        Ok(self
            .ctx
            .stores
            .users
            .list(&UserFilter::active_with_role(Role::Management))
            .await?)
    }

    async fn record_run(&self, actor: &User, kind: &str, date: NaiveDate, count: usize) {
        self.ctx
            .audit
            .log(
                AuditEvent::new(AuditAction::AiReview, EntityKind::System)
                    .by(actor.id.unwrap_or_default())
                    .with_message(format!("{kind} for {date}: {count} user(s)")),
            )
            .await;
        info!(kind, %date, count, "AI review generated");
    }

    /// One summary per management user who logged work on `date`
    pub async fn daily_summaries(&self, actor: &User, date: Option<NaiveDate>) -> NcResult<Outcome<Vec<UserSummary>>> {
        require(actor, Permission::GenerateSummaries)?;
        let date = date.unwrap_or_else(|| self.ctx.today());
        let logs = WorkLogService::new(self.ctx.clone());

        let mut summaries = Vec::new();
        for user in self.management_users().await? {
            let user_id = user.id.unwrap_or_default();
            let user_logs = logs.for_user_on(user_id, date).await?;
            if user_logs.is_empty() {
                continue;
            }
            let tasks = self.ctx.stores.tasks.list(&TaskFilter::assigned_to(user_id)).await?;
            summaries.push(self.summarizer.daily_summary(&user, &user_logs, &tasks).await?);
        }

        if summaries.is_empty() {
            return Ok(Outcome::with_warnings(summaries, vec![NO_LOGS.to_string()]));
        }
        self.record_run(actor, "Daily summary", date, summaries.len()).await;
        Ok(Outcome::new(summaries))
    }

    /// Review each management user's tasks against their logs and email it
    pub async fn task_reviews(&self, actor: &User, date: Option<NaiveDate>) -> NcResult<Outcome<Vec<TaskReview>>> {
        require(actor, Permission::GenerateSummaries)?;
        let date = date.unwrap_or_else(|| self.ctx.today());
        let logs = WorkLogService::new(self.ctx.clone());

        let mut outcome = Outcome::new(Vec::new());
        for user in self.management_users().await? {
            let user_id = user.id.unwrap_or_default();
            let tasks = self.ctx.stores.tasks.list(&TaskFilter::assigned_to(user_id)).await?;
            let user_logs = logs.for_user_on(user_id, date).await?;
            if tasks.is_empty() && user_logs.is_empty() {
                continue;
            }

            let mut review = self.summarizer.task_review(&user, &tasks, &user_logs).await?;
            match self.ctx.notifier.ai_task_review(&user, date, &review.review).await {
                Some(warning) => outcome.warn(warning),
                None => review.emailed = self.ctx.notifier.is_enabled(),
            }
            outcome.value.push(review);
        }

        if outcome.value.is_empty() {
            outcome.warn(NO_TASKS_OR_LOGS);
        } else {
            self.record_run(actor, "Task review", date, outcome.value.len()).await;
        }
        Ok(outcome)
    }
}
