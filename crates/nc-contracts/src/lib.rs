//! # nc-contracts
//!
//! Contracts validate an entity against the acting user's role and the
//! field rules of one operation before the service touches a store.

pub mod base;
pub mod leaves;
pub mod tasks;
pub mod users;
pub mod work_logs;

pub use base::*;
