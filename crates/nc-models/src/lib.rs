//! # nc-models
//!
//! Domain entities for NC Ops: users, tasks, work logs and leave requests.
//! Each model implements the core traits from `nc-core`.

pub use nc_core::traits::{Entity, Id, Identifiable, Timestamped};

pub mod leave;
pub mod task;
pub mod user;
pub mod work_log;

pub use leave::{LeaveBalance, LeaveDecision, LeaveRequest, NewLeaveRequest};
pub use task::{NewTask, Task, TaskNode};
pub use user::{NewUser, User};
pub use work_log::{CallDetails, MeetingDetails, NewWorkLog, WorkLog, WorkLogDetails};
