//! Leave contracts
//!
//! Balance figures come from the service; contracts only compare them.

use nc_core::error::ValidationErrors;
use nc_core::types::LeaveStatus;
use nc_models::{LeaveDecision, LeaveRequest};

use crate::base::{Contract, UserContext, ValidationResult};

pub const INSUFFICIENT_BALANCE: &str = "Insufficient leave balance";

/// Contract for applying for leave
pub struct ApplyLeaveContract<'a, U: UserContext> {
    user: &'a U,
    /// Remaining days of the requested type
    remaining: i64,
    /// An existing pending/approved request overlaps the range
    overlapping: bool,
}

impl<'a, U: UserContext> ApplyLeaveContract<'a, U> {
    pub fn new(user: &'a U, remaining: i64, overlapping: bool) -> Self {
        Self {
            user,
            remaining,
            overlapping,
        }
    }
}

impl<'a, U: UserContext> Contract<LeaveRequest> for ApplyLeaveContract<'a, U> {
    fn validate(&self, request: &LeaveRequest) -> ValidationResult {
        let mut errors = ValidationErrors::new();

        if self.user.is_nc() {
            errors.add_base("Only management users apply for leave");
        }
        if !request.range().is_valid() {
            errors.add("end_date", "must not precede the start date");
            return errors.into_result();
        }
        if request.reason.chars().count() > 1000 {
            errors.add("reason", "is too long (maximum is 1000 characters)");
        }
        if self.overlapping {
            errors.add_base("Overlaps an existing leave request");
        }
        if i64::from(request.days) > self.remaining {
            errors.add_base(INSUFFICIENT_BALANCE);
        }

        errors.into_result()
    }
}

/// Contract for approving or rejecting a request
pub struct DecideLeaveContract<'a, U: UserContext> {
    user: &'a U,
    request: &'a LeaveRequest,
    remaining: i64,
}

impl<'a, U: UserContext> DecideLeaveContract<'a, U> {
    pub fn new(user: &'a U, request: &'a LeaveRequest, remaining: i64) -> Self {
        Self {
            user,
            request,
            remaining,
        }
    }
}

impl<'a, U: UserContext> Contract<LeaveDecision> for DecideLeaveContract<'a, U> {
    fn validate(&self, decision: &LeaveDecision) -> ValidationResult {
        let mut errors = ValidationErrors::new();

        if !self.user.is_nc() {
            errors.add_base("Only a coordinator can decide leave requests");
            return errors.into_result();
        }

        match decision.status {
            LeaveStatus::Pending => errors.add("status", "must be Approved or Rejected"),
            LeaveStatus::Rejected => {
                let reason = decision.rejection_reason.as_deref().unwrap_or_default();
                if reason.trim().is_empty() {
                    errors.add("rejection_reason", "can't be blank");
                }
            }
            LeaveStatus::Approved => {
                if !decision.override_balance && i64::from(self.request.days) > self.remaining {
                    errors.add_base(INSUFFICIENT_BALANCE);
                }
            }
        }

        errors.into_result()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::testing::MockUser;
    use chrono::NaiveDate;
    use nc_core::types::LeaveType;
    use nc_models::NewLeaveRequest;

    fn request(start: u32, end: u32) -> LeaveRequest {
        NewLeaveRequest {
            leave_type: LeaveType::Casual,
            start_date: NaiveDate::from_ymd_opt(2024, 8, start).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2024, 8, end).unwrap(),
            reason: "wedding".into(),
        }
        .into_request(2)
    }

    fn decision(status: LeaveStatus, reason: Option<&str>, override_balance: bool) -> LeaveDecision {
        LeaveDecision {
            status,
            rejection_reason: reason.map(str::to_string),
            override_balance,
        }
    }

    #[test]
    fn test_apply_within_balance() {
        let user = MockUser::management(2);
        assert!(ApplyLeaveContract::new(&user, 3, false)
            .validate(&request(1, 3))
            .is_ok());
    }

    #[test]
    fn test_apply_insufficient_balance() {
        let user = MockUser::management(2);
        let errors = ApplyLeaveContract::new(&user, 2, false)
            .validate(&request(1, 3))
            .unwrap_err();
        assert_eq!(errors.base_errors, vec![INSUFFICIENT_BALANCE]);
    }

    #[test]
    fn test_apply_inverted_range_and_overlap() {
        let user = MockUser::management(2);
        let mut inverted = request(5, 5);
        inverted.end_date = NaiveDate::from_ymd_opt(2024, 8, 4).unwrap();
        assert!(ApplyLeaveContract::new(&user, 10, false)
            .validate(&inverted)
            .unwrap_err()
            .has_error("end_date"));

        let errors = ApplyLeaveContract::new(&user, 10, true)
            .validate(&request(1, 2))
            .unwrap_err();
        assert_eq!(errors.base_errors, vec!["Overlaps an existing leave request"]);
    }

    #[test]
    fn test_decide_requires_nc() {
        let r = request(1, 2);
        let worker = MockUser::management(3);
        assert!(DecideLeaveContract::new(&worker, &r, 10)
            .validate(&decision(LeaveStatus::Approved, None, false))
            .is_err());
    }

    #[test]
    fn test_rejection_needs_reason() {
        let r = request(1, 2);
        let nc = MockUser::nc(1);
        let contract = DecideLeaveContract::new(&nc, &r, 10);
        assert!(contract
            .validate(&decision(LeaveStatus::Rejected, Some(" "), false))
            .unwrap_err()
            .has_error("rejection_reason"));
        assert!(contract
            .validate(&decision(LeaveStatus::Rejected, Some("Audit week"), false))
            .is_ok());
    }

    #[test]
    fn test_approval_over_balance_needs_override() {
        let r = request(1, 5);
        let nc = MockUser::nc(1);
        let contract = DecideLeaveContract::new(&nc, &r, 2);
        assert!(contract
            .validate(&decision(LeaveStatus::Approved, None, false))
            .is_err());
        assert!(contract
            .validate(&decision(LeaveStatus::Approved, None, true))
            .is_ok());
    }
}
