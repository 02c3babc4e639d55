//! # nc-audit
//!
//! Append-only audit trail. Entity changes carry before/after snapshots;
//! system events (logins, session expiry, email failures, AI reviews) share
//! the same log under the `session` and `system` entity kinds.

pub mod event;
pub mod service;

pub use event::{AuditAction, AuditEvent, AuditFilter, EntityKind};
pub use service::{AuditError, AuditResult, AuditService, AuditStore, MemoryAuditStore};
