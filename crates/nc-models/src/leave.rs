//! Leave request model and balances
//!
//! Table: leave_requests
//!
//! Balances are derived, never stored: quota minus the day counts of the
//! user's approved requests of that type.

use chrono::{DateTime, NaiveDate, Utc};
use nc_core::config::LeaveConfig;
use nc_core::traits::{Entity, Id, Identifiable, Timestamped};
use nc_core::types::{days_between, DateRange, LeaveStatus, LeaveType};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeaveRequest {
    pub id: Option<Id>,
    pub user_id: Id,
    pub leave_type: LeaveType,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// Inclusive day count
    pub days: i32,
    pub reason: String,
    pub status: LeaveStatus,
    pub rejection_reason: Option<String>,
    pub decided_by: Option<Id>,
    pub decided_at: Option<DateTime<Utc>>,
    /// Approved beyond the remaining balance
    pub override_balance: bool,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Identifiable for LeaveRequest {
    fn id(&self) -> Option<Id> {
        self.id
    }
}

impl Timestamped for LeaveRequest {
    fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }

    fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }
}

impl Entity for LeaveRequest {
    const TABLE_NAME: &'static str = "leave_requests";
    const TYPE_NAME: &'static str = "LeaveRequest";
}

impl LeaveRequest {
    pub fn range(&self) -> DateRange {
        DateRange::new(self.start_date, self.end_date)
    }

    /// Pending and approved requests block overlapping applications
    pub fn is_blocking(&self) -> bool {
        matches!(self.status, LeaveStatus::Pending | LeaveStatus::Approved)
    }

    pub fn covers(&self, date: NaiveDate) -> bool {
        self.status == LeaveStatus::Approved && self.range().contains(date)
    }
}

/// Application parameters
#[derive(Debug, Clone, Deserialize)]
pub struct NewLeaveRequest {
    pub leave_type: LeaveType,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default)]
    pub reason: String,
}

impl NewLeaveRequest {
    pub fn range(&self) -> DateRange {
        DateRange::new(self.start_date, self.end_date)
    }

    pub fn into_request(self, user_id: Id) -> LeaveRequest {
        let days = days_between(self.start_date, self.end_date).max(0) as i32;
        LeaveRequest {
            id: None,
            user_id,
            leave_type: self.leave_type,
            start_date: self.start_date,
            end_date: self.end_date,
            days,
            reason: self.reason.trim().to_string(),
            status: LeaveStatus::Pending,
            rejection_reason: None,
            decided_by: None,
            decided_at: None,
            override_balance: false,
            created_at: None,
            updated_at: None,
        }
    }
}

/// Approver decision
#[derive(Debug, Clone, Deserialize)]
pub struct LeaveDecision {
    /// `Approved` or `Rejected`
    pub status: LeaveStatus,
    pub rejection_reason: Option<String>,
    /// Allow approval beyond the remaining balance
    #[serde(default)]
    pub override_balance: bool,
}

/// Remaining days per leave type
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct LeaveBalance {
    pub leave_type: LeaveType,
    pub name: &'static str,
    pub quota: i64,
    pub used: i64,
    /// Negative only after an override approval
    pub remaining: i64,
}

impl LeaveBalance {
    /// Balances for every leave type from the user's requests
    pub fn compute(quotas: &LeaveConfig, requests: &[LeaveRequest]) -> Vec<LeaveBalance> {
        LeaveType::ALL
            .iter()
            .map(|&leave_type| Self::for_type(quotas, requests, leave_type))
            .collect()
    }

    pub fn for_type(
        quotas: &LeaveConfig,
        requests: &[LeaveRequest],
        leave_type: LeaveType,
    ) -> LeaveBalance {
        let used = used_days(requests, leave_type);
        let quota = i64::from(quotas.quota(leave_type));
        LeaveBalance {
            leave_type,
            name: leave_type.display_name(),
            quota,
            used,
            remaining: quota - used,
        }
    }
}

/// Sum of approved day counts of one type
pub fn used_days(requests: &[LeaveRequest], leave_type: LeaveType) -> i64 {
    requests
        .iter()
        .filter(|r| r.leave_type == leave_type && r.status == LeaveStatus::Approved)
        .map(|r| i64::from(r.days))
        .sum()
}
