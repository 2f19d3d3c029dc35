//! Message transports.
//!
//! A transport takes a fully built [`OutgoingMessage`] and reports whether
//! it was accepted. Nothing is retried or queued.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::config::TransportConfig;

use super::memory::MemoryTransport;
use super::smtp::SmtpTransport;
use super::types::OutgoingMessage;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Invalid address '{address}': {reason}")]
    InvalidAddress { address: String, reason: String },

    #[error("Failed to build message: {0}")]
    Build(String),

    #[error("Send failed: {0}")]
    Send(String),

    #[error("Transport configuration error: {0}")]
    Config(String),
}

#[async_trait]
pub trait MessageTransport: Send + Sync {
    /// Short name for health reporting
    fn name(&self) -> &'static str;

    async fn send(&self, message: &OutgoingMessage) -> Result<(), TransportError>;
}

/// Logs the envelope and reports success
#[derive(Debug, Default)]
pub struct LogTransport;

#[async_trait]
impl MessageTransport for LogTransport {
    fn name(&self) -> &'static str {
        "log"
    }

    async fn send(&self, message: &OutgoingMessage) -> Result<(), TransportError> {
        tracing::info!(
            message_id = %message.id,
            course_id = message.course_id,
            recipient_id = message.recipient_id,
            recipient = %message.recipient_email,
            subject = %message.subject,
            body_len = message.body_html.len(),
            "Notification delivered to log transport"
        );
        Ok(())
    }
}

/// Build the transport named by configuration.
///
/// Unknown backends fall back to the log transport.
pub fn create_transport(config: &TransportConfig) -> Result<Arc<dyn MessageTransport>, TransportError> {
    match config.backend.as_str() {
        "smtp" => Ok(Arc::new(SmtpTransport::from_config(config)?)),
        "memory" => Ok(Arc::new(MemoryTransport::new())),
        "log" => Ok(Arc::new(LogTransport)),
        other => {
            tracing::warn!(backend = %other, "Unknown transport backend, using log transport");
            Ok(Arc::new(LogTransport))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_transport_by_name() {
        let mut config = TransportConfig::default();
        assert_eq!(create_transport(&config).unwrap().name(), "log");

        config.backend = "memory".into();
        assert_eq!(create_transport(&config).unwrap().name(), "memory");

        config.backend = "pigeon".into();
        assert_eq!(create_transport(&config).unwrap().name(), "log");
    }

    #[tokio::test]
    async fn test_smtp_transport_from_config() {
        let config = TransportConfig {
            backend: "smtp".into(),
            ..Default::default()
        };
        assert_eq!(create_transport(&config).unwrap().name(), "smtp");
    }
}
