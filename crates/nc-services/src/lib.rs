//! # nc-services
//!
//! Business logic services for NC Ops.
//!
//! Each service validates through a contract, writes through the store
//! traits, records audit events and sends notifications. Results come back
//! as [`Outcome`](nc_core::Outcome) so email failures can ride along as
//! warnings.

pub mod audit_trail;
pub mod base;
pub mod dashboard;
pub mod leaves;
pub mod reviews;
pub mod tasks;
pub mod users;
pub mod work_logs;

#[cfg(test)]
pub(crate) mod testing;

pub use audit_trail::AuditTrailService;
pub use base::{Clock, ServiceContext, Services};
pub use dashboard::{Dashboard, DashboardService};
pub use leaves::LeaveService;
pub use reviews::ReviewService;
pub use tasks::{StatusChange, TaskService};
pub use users::UserService;
pub use work_logs::WorkLogService;

pub use nc_summaries::{TaskReview, UserSummary};
