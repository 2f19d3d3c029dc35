//! SMTP delivery through lettre's async transport.

use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials,
    Address, AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};

use crate::config::TransportConfig;

use super::transport::{MessageTransport, TransportError};
use super::types::OutgoingMessage;

pub struct SmtpTransport {
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpTransport {
    pub fn from_config(config: &TransportConfig) -> Result<Self, TransportError> {
        let builder = if config.smtp_starttls {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)
                .map_err(|e| TransportError::Config(e.to_string()))?
        } else {
            // Plain connection for local relays
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.smtp_host)
        };

        let builder = builder.port(config.smtp_port);
        let builder = match (&config.smtp_username, &config.smtp_password) {
            (Some(username), Some(password)) => {
                builder.credentials(Credentials::new(username.clone(), password.clone()))
            }
            _ => builder,
        };

        tracing::info!(
            host = %config.smtp_host,
            port = config.smtp_port,
            starttls = config.smtp_starttls,
            "SMTP transport configured"
        );

        Ok(Self {
            transport: builder.build(),
        })
    }
}

fn mailbox(name: &str, email: &str) -> Result<Mailbox, TransportError> {
    let address: Address = email.parse().map_err(|e: lettre::address::AddressError| {
        TransportError::InvalidAddress {
            address: email.to_string(),
            reason: e.to_string(),
        }
    })?;
    let name = (!name.trim().is_empty()).then(|| name.to_string());
    Ok(Mailbox::new(name, address))
}

/// Build the MIME message for an envelope
fn build_message(message: &OutgoingMessage) -> Result<Message, TransportError> {
    Message::builder()
        .from(mailbox(&message.sender.name, &message.sender.email)?)
        .to(mailbox(&message.recipient_name, &message.recipient_email)?)
        .subject(message.subject.as_str())
        .header(ContentType::TEXT_HTML)
        .body(message.body_html.clone())
        .map_err(|e| TransportError::Build(e.to_string()))
}

#[async_trait]
impl MessageTransport for SmtpTransport {
    fn name(&self) -> &'static str {
        "smtp"
    }

    async fn send(&self, message: &OutgoingMessage) -> Result<(), TransportError> {
        let email = build_message(message)?;

        self.transport
            .send(email)
            .await
            .map_err(|e| TransportError::Send(e.to_string()))?;

        Ok(())
    }
}
