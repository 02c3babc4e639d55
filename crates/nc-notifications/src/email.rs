//! Email Delivery

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Email errors
#[derive(Debug, Error)]
pub enum EmailError {
    #[error("Send failed: {0}")]
    SendFailed(String),
    #[error("Invalid recipient: {0}")]
    InvalidRecipient(String),
    #[error("SMTP error: {0}")]
    SmtpError(String),
    #[error("Email delivery is not configured")]
    NotConfigured,
}

pub type EmailResult<T> = Result<T, EmailError>;

/// Email address with optional name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailAddress {
    pub email: String,
    pub name: Option<String>,
}

impl EmailAddress {
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            name: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Format as RFC 5322
    pub fn to_rfc5322(&self) -> String {
        match &self.name {
            Some(name) => format!("{} <{}>", name, self.email),
            None => self.email.clone(),
        }
    }
}

/// Plain-text email message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailMessage {
    pub id: String,
    pub to: Vec<EmailAddress>,
    pub cc: Vec<EmailAddress>,
    pub subject: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

impl EmailMessage {
    pub fn new(to: Vec<EmailAddress>, subject: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            to,
            cc: Vec::new(),
            subject: subject.into(),
            body: body.into(),
            created_at: Utc::now(),
        }
    }

    /// Add CC recipients, skipping addresses already in `to` or `cc`
    pub fn cc(mut self, addresses: impl IntoIterator<Item = EmailAddress>) -> Self {
        for address in addresses {
            let known = self
                .to
                .iter()
                .chain(self.cc.iter())
                .any(|a| a.email.eq_ignore_ascii_case(&address.email));
            if !known {
                self.cc.push(address);
            }
        }
        self
    }

    pub fn has_recipients(&self) -> bool {
        !self.to.is_empty()
    }

    pub fn recipient_list(&self) -> String {
        join_addresses(&self.to)
    }
}

pub(crate) fn join_addresses(addresses: &[EmailAddress]) -> String {
    addresses
        .iter()
        .map(EmailAddress::to_rfc5322)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Email sender trait
#[async_trait]
pub trait EmailSender: Send + Sync {
    /// Send an email, returning the message id
    async fn send(&self, message: &EmailMessage) -> EmailResult<String>;

    /// Check if the sender actually delivers mail
    fn is_configured(&self) -> bool;
}

/// Logs messages instead of sending them
#[derive(Debug, Default)]
pub struct ConsoleEmailSender;

impl ConsoleEmailSender {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl EmailSender for ConsoleEmailSender {
    async fn send(&self, message: &EmailMessage) -> EmailResult<String> {
        tracing::info!(
            to = %message.recipient_list(),
            cc = %join_addresses(&message.cc),
            subject = %message.subject,
            "Email (console delivery)\n{}",
            message.body
        );
        Ok(message.id.clone())
    }

    fn is_configured(&self) -> bool {
        true
    }
}

/// Drops every message
#[derive(Debug, Default)]
pub struct DisabledEmailSender;

#[async_trait]
impl EmailSender for DisabledEmailSender {
    async fn send(&self, _message: &EmailMessage) -> EmailResult<String> {
        Err(EmailError::NotConfigured)
    }

    fn is_configured(&self) -> bool {
        false
    }
}

/// Keeps sent messages in memory; can be switched to fail every send
#[derive(Debug, Default)]
pub struct RecordingEmailSender {
    sent: Mutex<Vec<EmailMessage>>,
    fail: bool,
}

impl RecordingEmailSender {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn sent(&self) -> Vec<EmailMessage> {
        self.sent.lock().clone()
    }

    pub fn find_by_subject(&self, fragment: &str) -> Option<EmailMessage> {
        self.sent
            .lock()
            .iter()
            .find(|m| m.subject.contains(fragment))
            .cloned()
    }
}

#[async_trait]
impl EmailSender for RecordingEmailSender {
    async fn send(&self, message: &EmailMessage) -> EmailResult<String> {
        if self.fail {
            return Err(EmailError::SendFailed("connection refused".into()));
        }
        self.sent.lock().push(message.clone());
        Ok(message.id.clone())
    }

    fn is_configured(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_address_format() {
        let addr = EmailAddress::new("asha@example.org").with_name("Asha Rao");
        assert_eq!(addr.to_rfc5322(), "Asha Rao <asha@example.org>");
        assert_eq!(EmailAddress::new("x@example.org").to_rfc5322(), "x@example.org");
    }

    #[test]
    fn test_cc_deduplicates() {
        let message = EmailMessage::new(vec![EmailAddress::new("a@example.org")], "S", "B").cc(vec![
            EmailAddress::new("A@example.org"),
            EmailAddress::new("office@example.org"),
            EmailAddress::new("office@example.org"),
        ]);

        assert_eq!(message.cc, vec![EmailAddress::new("office@example.org")]);
    }

    #[tokio::test]
    async fn test_recording_sender() {
        let sender = RecordingEmailSender::new();
        let message = EmailMessage::new(vec![EmailAddress::new("a@example.org")], "Hello", "Body");
        let id = sender.send(&message).await.unwrap();

        assert_eq!(id, message.id);
        assert_eq!(sender.sent().len(), 1);
        assert!(sender.find_by_subject("Hell").is_some());

        let failing = RecordingEmailSender::failing();
        assert!(failing.send(&message).await.is_err());
        assert!(failing.sent().is_empty());
    }

    #[tokio::test]
    async fn test_console_sender() {
        let sender = ConsoleEmailSender::new();
        let message = EmailMessage::new(vec![EmailAddress::new("a@example.org")], "Test", "Body");
        assert!(sender.send(&message).await.is_ok());
        assert!(!DisabledEmailSender.is_configured());
    }
}
