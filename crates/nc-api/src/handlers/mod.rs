//! API handlers, one module per resource

pub mod audit;
pub mod auth;
pub mod dashboard;
pub mod leaves;
pub mod summaries;
pub mod tasks;
pub mod users;
pub mod work_logs;
