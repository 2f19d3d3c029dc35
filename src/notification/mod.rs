//! Notification delivery.
//!
//! The dispatcher renders the message for an event and hands the envelope to
//! a [`MessageTransport`]: SMTP for real delivery, log or memory otherwise.

mod dispatcher;
mod memory;
mod smtp;
mod transport;
mod types;

pub use dispatcher::{DispatcherStats, DispatcherStatsSnapshot, NotificationDispatcher};
pub use memory::MemoryTransport;
pub use smtp::SmtpTransport;
pub use transport::{create_transport, LogTransport, MessageTransport, TransportError};
pub use types::{
    MessageFormat, OutgoingMessage, SendResult, SenderIdentity, MESSAGE_COMPONENT, MESSAGE_NAME,
};
