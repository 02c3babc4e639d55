//! # nc-notifications
//!
//! Email notifications for NC Ops.
//!
//! ## Features
//!
//! - Email message model with to/cc recipients
//! - SMTP delivery (lettre), console delivery for development, recording sender for tests
//! - Templates for task, work-log, leave and AI review notifications
//! - `Notifier`: delivery failures become warnings and audit events, never errors

pub mod email;
pub mod notifier;
pub mod smtp;
pub mod templates;

pub use email::{
    ConsoleEmailSender, DisabledEmailSender, EmailAddress, EmailError, EmailMessage, EmailResult,
    EmailSender, RecordingEmailSender,
};
pub use notifier::Notifier;
pub use smtp::{build_sender, SmtpEmailSender};
