//! Leave services
//!
//! Balances are all-time: quota minus approved days of the same type.
//! Approval re-checks the balance inside the store write, so concurrent
//! approvals cannot overdraw it unless a coordinator overrides.

use nc_audit::{AuditAction, AuditEvent, EntityKind};
use nc_auth::{CurrentUser, Permission};
use nc_contracts::leaves::{ApplyLeaveContract, DecideLeaveContract};
use nc_contracts::Contract;
use nc_core::error::NcError;
use nc_core::result::{NcResult, Outcome};
use nc_core::traits::Id;
use nc_core::types::{LeaveStatus, LeaveType};
use nc_db::{LeaveDecisionRecord, LeaveFilter};
use nc_models::{LeaveBalance, LeaveDecision, LeaveRequest, NewLeaveRequest, User};
use tracing::info;

use crate::base::{require, ServiceContext};

#[derive(Clone)]
pub struct LeaveService {
    ctx: ServiceContext,
}

impl LeaveService {
    pub fn new(ctx: ServiceContext) -> Self {
        Self { ctx }
    }

    async fn remaining(&self, user_id: Id, leave_type: LeaveType) -> NcResult<i64> {
        let used = self.ctx.stores.leaves.used_days(user_id, leave_type).await?;
        Ok(self.quota(leave_type) - used)
    }

    fn quota(&self, leave_type: LeaveType) -> i64 {
        i64::from(self.ctx.config.leave.quota(leave_type))
    }

    pub async fn apply(&self, actor: &User, params: NewLeaveRequest) -> NcResult<Outcome<LeaveRequest>> {
        require(actor, Permission::ApplyLeave)?;
        let actor_id = actor.id.unwrap_or_default();
        let request = params.into_request(actor_id);

        let remaining = self.remaining(actor_id, request.leave_type).await?;
        let overlapping = self
            .ctx
            .stores
            .leaves
            .overlapping(actor_id, request.start_date, request.end_date)
            .await?;
        ApplyLeaveContract::new(actor, remaining, overlapping).validate(&request)?;

        let created = self.ctx.stores.leaves.create(&request).await?;
        self.ctx
            .audit
            .log(
                AuditEvent::new(AuditAction::Created, EntityKind::LeaveRequest)
                    .by(actor_id)
                    .on(created.id)
                    .with_after(&created),
            )
            .await;
        info!(request_id = ?created.id, user_id = actor_id, days = created.days, "Leave requested");

        let mut outcome = Outcome::new(created);
        let coordinators = self.ctx.coordinators().await?;
        if let Some(warning) = self
            .ctx
            .notifier
            .leave_applied(actor, &outcome.value, &coordinators)
            .await
        {
            outcome.warn(warning);
        }
        Ok(outcome)
    }

    /// Approve or reject a pending request
    pub async fn decide(&self, actor: &User, id: Id, decision: LeaveDecision) -> NcResult<Outcome<LeaveRequest>> {
        require(actor, Permission::DecideLeave)?;
        let actor_id = actor.id.unwrap_or_default();
        let request = self
            .ctx
            .stores
            .leaves
            .find_by_id(id)
            .await?
            .ok_or_else(|| NcError::not_found("LeaveRequest", "id", id))?;
        if !request.status.is_pending() {
            return Err(NcError::conflict(format!(
                "Leave request has already been {}",
                request.status.as_str().to_lowercase()
            )));
        }

        let remaining = self.remaining(request.user_id, request.leave_type).await?;
        DecideLeaveContract::new(actor, &request, remaining).validate(&decision)?;

        let approving = decision.status == LeaveStatus::Approved;
        let record = LeaveDecisionRecord {
            status: decision.status,
            rejection_reason: if approving {
                None
            } else {
                decision.rejection_reason.map(|r| r.trim().to_string())
            },
            decided_by: actor_id,
            override_balance: approving && decision.override_balance,
            quota: self.quota(request.leave_type),
        };
        let decided = self.ctx.stores.leaves.decide(id, &record).await?;

        let action = if approving {
            AuditAction::Approved
        } else {
            AuditAction::Rejected
        };
        let mut event = AuditEvent::new(action, EntityKind::LeaveRequest)
            .by(actor_id)
            .on(Some(id))
            .with_before(&request)
            .with_after(&decided);
        if decided.override_balance {
            event = event.with_message(format!(
                "Balance override: {} day(s) approved with {} remaining",
                decided.days, remaining
            ));
        }
        self.ctx.audit.log(event).await;
        info!(request_id = id, status = %decided.status, override_balance = decided.override_balance, "Leave decided");

        let mut outcome = Outcome::new(decided);
        let applicant = self.ctx.find_user(request.user_id).await?;
        if let Some(warning) = self
            .ctx
            .notifier
            .leave_decided(&applicant, &outcome.value, actor)
            .await
        {
            outcome.warn(warning);
        }
        Ok(outcome)
    }

    /// Balances for the actor, or for `user_id` when the actor may see it
    pub async fn balance(&self, actor: &User, user_id: Option<Id>) -> NcResult<Vec<LeaveBalance>> {
        let current = CurrentUser::from(actor);
        let owner = match user_id {
            Some(id) if current.can_view_records_of(id) => id,
            Some(_) => return Err(NcError::forbidden("You can only view your own records")),
            None => current.id,
        };
        self.balance_of(owner).await
    }

    pub(crate) async fn balance_of(&self, user_id: Id) -> NcResult<Vec<LeaveBalance>> {
        let requests = self.ctx.stores.leaves.list(&LeaveFilter::for_user(user_id)).await?;
        Ok(LeaveBalance::compute(&self.ctx.config.leave, &requests))
    }

    pub async fn list(&self, actor: &User, mut filter: LeaveFilter) -> NcResult<Vec<LeaveRequest>> {
        filter.user_id = CurrentUser::from(actor).scope_owner(filter.user_id)?;
        Ok(self.ctx.stores.leaves.list(&filter).await?)
    }
}
