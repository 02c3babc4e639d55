//! # nc-db
//!
//! PostgreSQL persistence for NC Ops.
//!
//! Services talk to the store traits in [`stores`]; this crate provides the
//! PostgreSQL repositories behind them plus in-memory stores for tests and
//! database-less startup.

pub mod audit_events;
pub mod leave_requests;
pub mod memory;
pub mod pool;
pub mod repository;
pub mod stores;
pub mod tasks;
pub mod users;
pub mod work_logs;

pub use pool::{Database, DatabaseConfig, PoolStats};
pub use repository::{RepositoryError, RepositoryResult};
pub use stores::{
    LeaveDecisionRecord, LeaveFilter, LeaveStore, Stores, TaskFilter, TaskStore, UserFilter,
    UserStore, WorkLogFilter, WorkLogStore,
};
