//! # nc-core
//!
//! Core types, traits, and utilities for NC Ops.
//!
//! This crate provides the foundational building blocks used across all other crates:
//! - Common error types
//! - Result type aliases and the warning-carrying `Outcome`
//! - Core traits (Entity, Identifiable, Timestamped)
//! - Shared enumerations (roles, statuses, leave types, date ranges)
//! - Configuration types

pub mod config;
pub mod error;
pub mod result;
pub mod traits;
pub mod types;

pub use error::*;
pub use result::*;
pub use traits::*;
pub use types::*;
