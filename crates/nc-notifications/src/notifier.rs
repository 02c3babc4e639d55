//! Notifier
//!
//! Builds and sends the notification emails of each business event.
//! Delivery is synchronous; a failed send is logged, recorded as a system
//! audit event and handed back as a warning for the caller's response.

use std::sync::Arc;

use chrono::NaiveDate;
use nc_audit::{AuditAction, AuditEvent, AuditService};
use nc_core::config::EmailConfig;
use nc_models::{LeaveRequest, Task, User, WorkLog};
use tracing::{debug, warn};

use crate::email::{EmailAddress, EmailMessage, EmailSender};
use crate::templates::{self, Rendered};

#[derive(Clone)]
pub struct Notifier {
    sender: Arc<dyn EmailSender>,
    official_nc: Option<EmailAddress>,
    audit: Arc<AuditService>,
}

fn address_of(user: &User) -> EmailAddress {
    EmailAddress::new(&user.email).with_name(user.display_name())
}

impl Notifier {
    pub fn new(sender: Arc<dyn EmailSender>, config: &EmailConfig, audit: Arc<AuditService>) -> Self {
        Self {
            sender,
            official_nc: config
                .official_nc_email
                .as_deref()
                .filter(|e| !e.trim().is_empty())
                .map(EmailAddress::new),
            audit,
        }
    }

    /// Whether messages leave the process at all
    pub fn is_enabled(&self) -> bool {
        self.sender.is_configured()
    }

    /// Send a message; `Some(warning)` when delivery failed
    pub async fn deliver(&self, message: EmailMessage) -> Option<String> {
        if !self.sender.is_configured() {
            debug!(subject = %message.subject, "Email delivery disabled, message dropped");
            return None;
        }
        if !message.has_recipients() {
            debug!(subject = %message.subject, "No recipients, message dropped");
            return None;
        }

        match self.sender.send(&message).await {
            Ok(_) => None,
            Err(err) => {
                warn!(
                    to = %message.recipient_list(),
                    subject = %message.subject,
                    error = %err,
                    "Email sending failed"
                );
                self.audit
                    .log(AuditEvent::system(
                        AuditAction::EmailFailed,
                        format!("{} to {}: {}", message.subject, message.recipient_list(), err),
                    ))
                    .await;
                Some(format!("Email sending failed: {}", message.subject))
            }
        }
    }

    fn message(&self, to: Vec<EmailAddress>, rendered: Rendered, cc_official: bool) -> EmailMessage {
        let message = EmailMessage::new(to, rendered.subject, rendered.body);
        if cc_official {
            message.cc(self.official_nc.clone())
        } else {
            message
        }
    }

    /// Assignee, with stakeholders and the official NC address in cc
    pub async fn task_assigned(&self, task: &Task, assignee: &User, assigned_by: &User) -> Option<String> {
        let stakeholders = task
            .stakeholders
            .iter()
            .filter(|s| !s.trim().is_empty())
            .map(|s| EmailAddress::new(s.trim()));
        let message = self
            .message(
                vec![address_of(assignee)],
                templates::task_assigned(task, assignee, assigned_by),
                true,
            )
            .cc(stakeholders);
        self.deliver(message).await
    }

    /// All active NC users, official NC address in cc
    pub async fn work_log_submitted(
        &self,
        author: &User,
        log: &WorkLog,
        task: Option<&Task>,
        coordinators: &[User],
    ) -> Option<String> {
        let to = coordinators.iter().map(address_of).collect();
        let message = self.message(to, templates::work_log_submitted(author, log, task), true);
        self.deliver(message).await
    }

    /// All active NC users
    pub async fn leave_applied(
        &self,
        applicant: &User,
        request: &LeaveRequest,
        coordinators: &[User],
    ) -> Option<String> {
        let to = coordinators.iter().map(address_of).collect();
        let message = self.message(to, templates::leave_applied(applicant, request), false);
        self.deliver(message).await
    }

    /// Applicant, official NC address in cc
    pub async fn leave_decided(
        &self,
        applicant: &User,
        request: &LeaveRequest,
        decided_by: &User,
    ) -> Option<String> {
        let message = self.message(
            vec![address_of(applicant)],
            templates::leave_decided(applicant, request, decided_by),
            true,
        );
        self.deliver(message).await
    }

    /// Reviewed user, official NC address in cc
    pub async fn ai_task_review(&self, user: &User, date: NaiveDate, review: &str) -> Option<String> {
        let message = self.message(
            vec![address_of(user)],
            templates::ai_task_review(&user.display_name(), date, review),
            true,
        );
        self.deliver(message).await
    }
}
