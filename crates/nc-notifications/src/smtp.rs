//! SMTP delivery through lettre

use std::sync::Arc;

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use nc_core::config::{EmailConfig, EmailDeliveryMethod, SmtpConfig};

use crate::email::{
    ConsoleEmailSender, DisabledEmailSender, EmailAddress, EmailError, EmailMessage, EmailResult,
    EmailSender,
};

pub struct SmtpEmailSender {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpEmailSender {
    pub fn new(smtp: &SmtpConfig, from: &EmailAddress) -> EmailResult<Self> {
        let builder = if smtp.enable_starttls {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&smtp.host)
                .map_err(|e| EmailError::SmtpError(e.to_string()))?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&smtp.host)
        };
        let mut builder = builder.port(smtp.port);

        if let (Some(username), Some(password)) = (&smtp.username, &smtp.password) {
            builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
        }

        Ok(Self {
            transport: builder.build(),
            from: mailbox(from)?,
        })
    }

    fn build_message(&self, message: &EmailMessage) -> EmailResult<Message> {
        let mut builder = Message::builder()
            .from(self.from.clone())
            .subject(message.subject.clone())
            .header(ContentType::TEXT_PLAIN);

        for to in &message.to {
            builder = builder.to(mailbox(to)?);
        }
        for cc in &message.cc {
            builder = builder.cc(mailbox(cc)?);
        }

        builder
            .body(message.body.clone())
            .map_err(|e| EmailError::SendFailed(e.to_string()))
    }
}

#[async_trait]
impl EmailSender for SmtpEmailSender {
    async fn send(&self, message: &EmailMessage) -> EmailResult<String> {
        let email = self.build_message(message)?;
        self.transport
            .send(email)
            .await
            .map_err(|e| EmailError::SmtpError(e.to_string()))?;

        tracing::debug!(id = %message.id, subject = %message.subject, "Email sent");
        Ok(message.id.clone())
    }

    fn is_configured(&self) -> bool {
        true
    }
}

fn mailbox(address: &EmailAddress) -> EmailResult<Mailbox> {
    let email = address
        .email
        .parse()
        .map_err(|_| EmailError::InvalidRecipient(address.email.clone()))?;
    Ok(Mailbox::new(address.name.clone(), email))
}

/// Sender for the configured delivery method
pub fn build_sender(config: &EmailConfig) -> EmailResult<Arc<dyn EmailSender>> {
    let from = EmailAddress::new(&config.from_address).with_name(&config.from_name);

    Ok(match config.delivery_method {
        EmailDeliveryMethod::Smtp => {
            let smtp = config.smtp.as_ref().ok_or(EmailError::NotConfigured)?;
            Arc::new(SmtpEmailSender::new(smtp, &from)?)
        }
        EmailDeliveryMethod::Console => Arc::new(ConsoleEmailSender::new()),
        EmailDeliveryMethod::Disabled => Arc::new(DisabledEmailSender),
    })
}
