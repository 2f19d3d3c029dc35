use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use uuid::Uuid;

use crate::enrolment::{CourseContext, EnrolmentContext, EventKind, UserContext};
use crate::i18n::{self, Locale, StringKey};
use crate::metrics::DeliveryMetrics;
use crate::policy::TemplateSource;
use crate::template::TemplateRenderer;

use super::transport::MessageTransport;
use super::types::{
    MessageFormat, OutgoingMessage, SendResult, SenderIdentity, MESSAGE_COMPONENT, MESSAGE_NAME,
};

/// Statistics for the notification dispatcher
#[derive(Debug, Default)]
pub struct DispatcherStats {
    /// Calls to `notify`
    pub total_attempted: AtomicU64,
    /// Messages accepted by the transport
    pub total_sent: AtomicU64,
    /// Messages the transport rejected
    pub total_failed: AtomicU64,
    /// Calls that rendered to an empty message
    pub total_empty: AtomicU64,
}

impl DispatcherStats {
    pub fn snapshot(&self) -> DispatcherStatsSnapshot {
        DispatcherStatsSnapshot {
            total_attempted: self.total_attempted.load(Ordering::Relaxed),
            total_sent: self.total_sent.load(Ordering::Relaxed),
            total_failed: self.total_failed.load(Ordering::Relaxed),
            total_empty: self.total_empty.load(Ordering::Relaxed),
        }
    }
}

/// Snapshot of dispatcher statistics
#[derive(Debug, Clone, Serialize)]
pub struct DispatcherStatsSnapshot {
    pub total_attempted: u64,
    pub total_sent: u64,
    pub total_failed: u64,
    pub total_empty: u64,
}

/// Renders and sends enrolment notifications
pub struct NotificationDispatcher {
    renderer: TemplateRenderer,
    transport: Arc<dyn MessageTransport>,
    sender: SenderIdentity,
    locale: Locale,
    stats: DispatcherStats,
}

impl NotificationDispatcher {
    pub fn new(
        renderer: TemplateRenderer,
        transport: Arc<dyn MessageTransport>,
        sender: SenderIdentity,
    ) -> Self {
        let locale = renderer.dates().locale();
        Self {
            renderer,
            transport,
            sender,
            locale,
            stats: DispatcherStats::default(),
        }
    }

    pub fn stats(&self) -> DispatcherStatsSnapshot {
        self.stats.snapshot()
    }

    pub fn renderer(&self) -> &TemplateRenderer {
        &self.renderer
    }

    pub fn transport_name(&self) -> &'static str {
        self.transport.name()
    }

    /// Render the template chosen by the policy and hand the result to the
    /// transport.
    ///
    /// An empty rendering is reported as a failure without calling the
    /// transport. Every call is an independent send; nothing is deduplicated.
    #[tracing::instrument(
        name = "dispatcher.notify",
        skip_all,
        fields(kind = %kind, course_id = course.id, user_id = user.id)
    )]
    pub async fn notify(
        &self,
        kind: EventKind,
        template: &str,
        source: TemplateSource,
        user: &UserContext,
        course: &CourseContext,
        enrolment: Option<&EnrolmentContext>,
    ) -> SendResult {
        let started = Instant::now();
        self.stats.total_attempted.fetch_add(1, Ordering::Relaxed);

        let body = self.renderer.render(template, user, course, enrolment);

        if body.is_empty() {
            self.stats.total_empty.fetch_add(1, Ordering::Relaxed);
            DeliveryMetrics::record_failed(kind.as_str());
            tracing::debug!(source = ?source, "Rendered message is empty, nothing sent");
            return SendResult::empty();
        }

        let message = OutgoingMessage {
            id: Uuid::new_v4(),
            course_id: course.id,
            recipient_id: user.id,
            recipient_email: user.email.clone(),
            recipient_name: user.full_name(),
            sender: self.sender.clone(),
            subject: i18n::text(self.locale, StringKey::Subject).to_string(),
            body_html: body,
            format: MessageFormat::Html,
            component: MESSAGE_COMPONENT.to_string(),
            name: MESSAGE_NAME.to_string(),
        };

        let outcome = self.transport.send(&message).await;
        DeliveryMetrics::observe_latency(started.elapsed().as_secs_f64());

        let args = [
            ("username", user.username.as_str()),
            ("coursename", course.full_name.as_str()),
        ];

        match outcome {
            Ok(()) => {
                self.stats.total_sent.fetch_add(1, Ordering::Relaxed);
                DeliveryMetrics::record_sent(kind.as_str());
                tracing::info!(
                    message_id = %message.id,
                    source = ?source,
                    transport = self.transport.name(),
                    "Notification sent"
                );
                SendResult {
                    success: true,
                    message_id: Some(message.id),
                    log: Some(i18n::format(self.locale, StringKey::SendSucceeded, &args)),
                }
            }
            Err(e) => {
                self.stats.total_failed.fetch_add(1, Ordering::Relaxed);
                DeliveryMetrics::record_failed(kind.as_str());
                tracing::warn!(
                    message_id = %message.id,
                    transport = self.transport.name(),
                    error = %e,
                    "Notification send failed"
                );
                SendResult {
                    success: false,
                    message_id: Some(message.id),
                    log: Some(i18n::format(self.locale, StringKey::SendFailed, &args)),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enrolment::SiteConfig;
    use crate::notification::MemoryTransport;
    use crate::policy::select_template;

    const WELCOME: &str = "Welcome {FIRSTNAME} to {COURSEFULLNAME}";

    fn fixture() -> (UserContext, CourseContext) {
        let user = UserContext {
            id: 7,
            username: "ana".into(),
            first_name: "Ana".into(),
            last_name: "Diaz".into(),
            email: "ana@example.org".into(),
            ..Default::default()
        };
        let course = CourseContext {
            id: 2,
            full_name: "Biology 101".into(),
            short_name: "BIO101".into(),
            visible: true,
            url: "http://lms.test/course/view.php?id=2".into(),
            ..Default::default()
        };
        (user, course)
    }

    fn dispatcher(transport: Arc<MemoryTransport>) -> NotificationDispatcher {
        NotificationDispatcher::new(
            TemplateRenderer::default(),
            transport,
            SenderIdentity::new("Support", "support@lms.test"),
        )
    }

    #[tokio::test]
    async fn test_notify_builds_envelope() {
        let transport = Arc::new(MemoryTransport::new());
        let dispatcher = dispatcher(transport.clone());
        let (user, course) = fixture();

        let result = dispatcher
            .notify(EventKind::Enrolled, WELCOME, TemplateSource::SiteCustom, &user, &course, None)
            .await;

        assert!(result.success);
        assert_eq!(
            result.log.as_deref(),
            Some("The user ana has been notified about the enrolment in the Biology 101 course")
        );

        let sent = transport.sent();
        assert_eq!(sent.len(), 1);
        let message = &sent[0];
        assert_eq!(Some(message.id), result.message_id);
        assert_eq!(message.body_html, "Welcome Ana to Biology 101");
        assert_eq!(message.subject, "Enrolment email notification");
        assert_eq!(message.recipient_email, "ana@example.org");
        assert_eq!(message.recipient_name, "Ana Diaz");
        assert_eq!(message.sender.email, "support@lms.test");
        assert_eq!(message.component, "enrol_notification");
        assert_eq!(message.format, MessageFormat::Html);
    }

    #[tokio::test]
    async fn test_empty_instance_template_skips_transport() {
        let transport = Arc::new(MemoryTransport::new());
        let dispatcher = dispatcher(transport.clone());
        let (user, course) = fixture();

        let result = dispatcher
            .notify(EventKind::Enrolled, "", TemplateSource::Instance, &user, &course, None)
            .await;

        assert_eq!(result, SendResult::empty());
        assert_eq!(transport.sent_count(), 0);
        let stats = dispatcher.stats();
        assert_eq!(stats.total_attempted, 1);
        assert_eq!(stats.total_empty, 1);
        assert_eq!(stats.total_sent, 0);
    }

    #[tokio::test]
    async fn test_transport_failure_reported() {
        let transport = Arc::new(MemoryTransport::new());
        transport.set_failing(true);
        let dispatcher = dispatcher(transport.clone());
        let (user, course) = fixture();

        let result = dispatcher
            .notify(EventKind::Unenrolled, WELCOME, TemplateSource::SiteCustom, &user, &course, None)
            .await;

        assert!(!result.success);
        assert!(result.message_id.is_some());
        assert!(result.log.unwrap().starts_with("WARNING: the user ana"));
        assert_eq!(dispatcher.stats().total_failed, 1);
    }

    #[tokio::test]
    async fn test_canned_default_used_without_site_text() {
        let transport = Arc::new(MemoryTransport::new());
        let dispatcher = dispatcher(transport.clone());
        let (user, course) = fixture();
        let (template, source) = select_template(
            EventKind::Updated,
            &SiteConfig::default(),
            None,
            &course,
            Locale::En,
        );

        dispatcher
            .notify(EventKind::Updated, &template, source, &user, &course, None)
            .await;

        assert_eq!(
            transport.sent()[0].body_html,
            "Your enrolment to Biology 101 has been updated (http://lms.test/course/view.php?id=2)"
        );
    }
}
