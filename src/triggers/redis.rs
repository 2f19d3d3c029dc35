use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use tokio::sync::broadcast;

use crate::config::RedisConfig;
use crate::enrolment::{HostEventPayload, NotificationEvent};
use crate::handler::{EnrolmentEventHandler, HandleOutcome};
use crate::metrics::RedisMetrics;

/// Channel used when none are configured
pub const DEFAULT_CHANNEL: &str = "enrol:events";

/// Redis Pub/Sub subscriber feeding host events into the event handler
pub struct RedisSubscriber {
    config: RedisConfig,
    handler: Arc<EnrolmentEventHandler>,
    shutdown: broadcast::Sender<()>,
}

impl RedisSubscriber {
    pub fn new(config: RedisConfig, handler: Arc<EnrolmentEventHandler>) -> Self {
        let (shutdown, _) = broadcast::channel(1);
        Self {
            config,
            handler,
            shutdown,
        }
    }

    /// Get a shutdown signal sender
    pub fn shutdown_signal(&self) -> broadcast::Sender<()> {
        self.shutdown.clone()
    }

    /// Start the Redis subscriber loop
    pub async fn start(&self) -> anyhow::Result<()> {
        let channels = self.channels();
        tracing::info!(channels = ?channels, "Starting Redis subscriber");

        let mut shutdown_rx = self.shutdown.subscribe();

        loop {
            match self.run_subscription_loop(&channels).await {
                Ok(()) => {
                    tracing::info!("Redis subscriber stopped gracefully");
                    break;
                }
                Err(e) => {
                    RedisMetrics::set_connected(false);
                    tracing::error!(error = %e, "Redis subscription error, reconnecting in 5 seconds...");
                    tokio::select! {
                        _ = shutdown_rx.recv() => break,
                        _ = tokio::time::sleep(Duration::from_secs(5)) => {
                            RedisMetrics::record_reconnection();
                        }
                    }
                }
            }
        }

        RedisMetrics::set_connected(false);
        Ok(())
    }

    fn channels(&self) -> Vec<String> {
        if self.config.channels.is_empty() {
            vec![DEFAULT_CHANNEL.to_string()]
        } else {
            self.config.channels.clone()
        }
    }

    async fn run_subscription_loop(&self, channels: &[String]) -> anyhow::Result<()> {
        let client = redis::Client::open(self.config.url.as_str())?;
        let mut pubsub = client.get_async_pubsub().await?;

        // Subscribe to channels (with pattern support)
        for channel in channels {
            if channel.contains('*') || channel.contains('?') || channel.contains('[') {
                pubsub.psubscribe(channel).await?;
                tracing::debug!(pattern = %channel, "Subscribed to pattern");
            } else {
                pubsub.subscribe(channel).await?;
                tracing::debug!(channel = %channel, "Subscribed to channel");
            }
        }

        RedisMetrics::set_connected(true);
        tracing::info!("Redis subscription established");

        let mut message_stream = pubsub.on_message();
        let mut shutdown_rx = self.shutdown.subscribe();

        loop {
            tokio::select! {
                _ = shutdown_rx.recv() => {
                    tracing::info!("Received shutdown signal");
                    return Ok(());
                }
                msg = message_stream.next() => {
                    let Some(msg) = msg else {
                        anyhow::bail!("Redis message stream ended");
                    };

                    let channel = msg.get_channel_name().to_string();
                    let payload: String = match msg.get_payload() {
                        Ok(p) => p,
                        Err(e) => {
                            tracing::warn!(error = %e, "Failed to get message payload");
                            continue;
                        }
                    };

                    RedisMetrics::record_message();
                    self.handle_message(&channel, &payload).await;
                }
            }
        }
    }

    /// Parse and handle one published event. Bad payloads are logged and dropped.
    async fn handle_message(&self, channel: &str, payload: &str) -> Option<HandleOutcome> {
        tracing::debug!(channel = %channel, "Received Redis message");

        let event = match parse_event(payload) {
            Ok(event) => event,
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    channel = %channel,
                    payload = %payload,
                    "Failed to parse Redis message"
                );
                return None;
            }
        };

        match self.handler.handle(&event).await {
            Ok(outcome) => {
                tracing::debug!(channel = %channel, outcome = ?outcome, "Handled event from Redis");
                Some(outcome)
            }
            Err(e) => {
                tracing::error!(error = %e, channel = %channel, "Failed to handle event from Redis");
                None
            }
        }
    }
}

fn parse_event(payload: &str) -> anyhow::Result<NotificationEvent> {
    let raw: HostEventPayload = serde_json::from_str(payload)?;
    Ok(NotificationEvent::try_from(raw)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enrolment::EventKind;
    use crate::host::MemoryDirectory;
    use crate::notification::{MemoryTransport, NotificationDispatcher, SenderIdentity};
    use crate::policy::PolicySettings;
    use crate::template::TemplateRenderer;

    fn subscriber(channels: Vec<String>) -> RedisSubscriber {
        let dispatcher = Arc::new(NotificationDispatcher::new(
            TemplateRenderer::default(),
            Arc::new(MemoryTransport::new()),
            SenderIdentity::new("Support", "support@lms.test"),
        ));
        let handler = Arc::new(EnrolmentEventHandler::new(
            Arc::new(MemoryDirectory::default()),
            dispatcher,
            PolicySettings::default(),
        ));
        RedisSubscriber::new(
            RedisConfig {
                channels,
                ..Default::default()
            },
            handler,
        )
    }

    #[test]
    fn test_parse_host_event_name() {
        let event = parse_event(
            r#"{"eventname": "\\core\\event\\user_enrolment_deleted", "courseid": 2, "relateduserid": 7, "objectid": 30}"#,
        )
        .unwrap();
        assert_eq!(event.kind, EventKind::Unenrolled);
        assert_eq!(event.course_id, 2);
        assert_eq!(event.user_id, 7);
        assert_eq!(event.enrolment_id, 30);
    }

    #[test]
    fn test_parse_explicit_kind() {
        let event = parse_event(r#"{"kind": "updated", "courseid": 2, "relateduserid": 7}"#).unwrap();
        assert_eq!(event.kind, EventKind::Updated);
        assert_eq!(event.enrolment_id, 0);
    }

    #[test]
    fn test_parse_rejects_unknown_event() {
        assert!(parse_event(r#"{"eventname": "\\core\\event\\course_viewed", "courseid": 2, "relateduserid": 7}"#).is_err());
        assert!(parse_event("not json").is_err());
    }

    #[test]
    fn test_default_channel() {
        assert_eq!(subscriber(vec![]).channels(), vec!["enrol:events"]);
        assert_eq!(subscriber(vec!["lms:*".into()]).channels(), vec!["lms:*"]);
    }

    #[tokio::test]
    async fn test_handle_message_with_missing_course() {
        let subscriber = subscriber(vec![]);
        let outcome = subscriber
            .handle_message("enrol:events", r#"{"kind": "enrolled", "courseid": 2, "relateduserid": 7}"#)
            .await;
        assert!(matches!(outcome, Some(HandleOutcome::Skipped { .. })));
        assert!(subscriber.handle_message("enrol:events", "{}").await.is_none());
    }
}
