use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Host component the messages are filed under
pub const MESSAGE_COMPONENT: &str = "enrol_notification";

/// Message provider name within the component
pub const MESSAGE_NAME: &str = "notification_enrolment";

/// Sending identity (the site's support contact)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SenderIdentity {
    pub name: String,
    pub email: String,
}

impl SenderIdentity {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageFormat {
    #[default]
    Html,
}

/// Envelope handed to a message transport
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutgoingMessage {
    pub id: Uuid,
    pub course_id: i64,
    pub recipient_id: i64,
    pub recipient_email: String,
    pub recipient_name: String,
    pub sender: SenderIdentity,
    pub subject: String,
    pub body_html: String,
    pub format: MessageFormat,
    pub component: String,
    pub name: String,
}

/// Outcome of one dispatch attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SendResult {
    pub success: bool,
    /// Set when a message was handed to the transport
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_id: Option<Uuid>,
    /// Localized outcome line; absent when nothing was sent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log: Option<String>,
}

impl SendResult {
    /// Nothing to send, transport never called
    pub fn empty() -> Self {
        Self {
            success: false,
            message_id: None,
            log: None,
        }
    }
}
