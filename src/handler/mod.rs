//! Enrolment event handling.
//!
//! One entry point covers the three lifecycle events. Each call takes a
//! fresh snapshot of the site settings and the records the event refers
//! to, runs the eligibility rules and dispatches at most one message.

use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;

use crate::enrolment::{NotificationEvent, PluginInstanceConfig};
use crate::host::{DirectoryError, HostDirectory};
use crate::metrics::EventMetrics;
use crate::notification::{NotificationDispatcher, SendResult};
use crate::policy::{should_notify, Decision, PolicyInput, PolicySettings, SkipReason};

#[derive(Debug, Error)]
pub enum HandlerError {
    #[error(transparent)]
    Directory(#[from] DirectoryError),
}

/// A record the event refers to that the host no longer has
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingRecord {
    Course,
    User,
}

/// Why an event produced no message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "skip", content = "detail", rename_all = "snake_case")]
pub enum SkipCause {
    Policy(SkipReason),
    MissingRecord(MissingRecord),
}

impl SkipCause {
    pub fn as_str(&self) -> &'static str {
        match self {
            SkipCause::Policy(reason) => reason.as_str(),
            SkipCause::MissingRecord(MissingRecord::Course) => "missing_course",
            SkipCause::MissingRecord(MissingRecord::User) => "missing_user",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum HandleOutcome {
    Sent { result: SendResult },
    Failed { result: SendResult },
    Skipped { cause: SkipCause },
}

impl HandleOutcome {
    fn skipped(cause: SkipCause) -> Self {
        HandleOutcome::Skipped { cause }
    }
}

pub struct EnrolmentEventHandler {
    directory: Arc<dyn HostDirectory>,
    dispatcher: Arc<NotificationDispatcher>,
    policy: PolicySettings,
}

impl EnrolmentEventHandler {
    pub fn new(
        directory: Arc<dyn HostDirectory>,
        dispatcher: Arc<NotificationDispatcher>,
        policy: PolicySettings,
    ) -> Self {
        Self {
            directory,
            dispatcher,
            policy,
        }
    }

    pub fn policy(&self) -> &PolicySettings {
        &self.policy
    }

    /// Handle one enrolment lifecycle event.
    ///
    /// Identical events are not deduplicated; each call may send.
    #[tracing::instrument(
        name = "handler.handle",
        skip_all,
        fields(kind = %event.kind, course_id = event.course_id, user_id = event.user_id)
    )]
    pub async fn handle(&self, event: &NotificationEvent) -> Result<HandleOutcome, HandlerError> {
        EventMetrics::record_received(event.kind.as_str());

        let site = self.directory.site_config().await?;
        if !event.kind.site_alert(&site) {
            return Ok(self.skip(SkipCause::Policy(SkipReason::SiteAlertDisabled)));
        }

        let Some(course) = self.directory.course(event.course_id).await? else {
            return Ok(self.skip(SkipCause::MissingRecord(MissingRecord::Course)));
        };
        let Some(user) = self.directory.user(event.user_id).await? else {
            return Ok(self.skip(SkipCause::MissingRecord(MissingRecord::User)));
        };

        let instance: Option<PluginInstanceConfig> = self
            .directory
            .instance_for_course(course.id)
            .await?
            .map(|record| record.config());

        let input = PolicyInput {
            kind: event.kind,
            site: &site,
            course: &course,
            user: &user,
            instance: instance.as_ref(),
        };

        let (template, source) = match should_notify(&input, &self.policy) {
            Decision::Skip(reason) => return Ok(self.skip(SkipCause::Policy(reason))),
            Decision::Notify { template, source } => {
                tracing::debug!(source = ?source, "Event eligible for notification");
                (template, source)
            }
        };

        let enrolment = if event.kind.loads_enrolment() {
            let enrolment = self.directory.enrolment(event.enrolment_id).await?;
            if enrolment.is_none() {
                tracing::debug!(enrolment_id = event.enrolment_id, "Enrolment record not found");
            }
            enrolment
        } else {
            None
        };

        let result = self
            .dispatcher
            .notify(event.kind, &template, source, &user, &course, enrolment.as_ref())
            .await;

        if let Some(log) = &result.log {
            tracing::info!(success = result.success, "{}", log);
        }

        Ok(if result.success {
            HandleOutcome::Sent { result }
        } else {
            HandleOutcome::Failed { result }
        })
    }

    fn skip(&self, cause: SkipCause) -> HandleOutcome {
        EventMetrics::record_skipped(cause.as_str());
        tracing::debug!(reason = cause.as_str(), "Event skipped");
        HandleOutcome::skipped(cause)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enrolment::{CourseContext, EnrolmentContext, EventKind, SiteConfig, UserContext};
    use crate::host::MemoryDirectory;
    use crate::instance::InstanceRecord;
    use crate::notification::{MemoryTransport, SenderIdentity};
    use crate::template::TemplateRenderer;

    fn site() -> SiteConfig {
        SiteConfig {
            enrol_alert: true,
            unenrol_alert: true,
            enrol_update_alert: true,
            global_enrol_alert: true,
            enrol_message: Some("Welcome {FIRSTNAME}, starts {ENROLTIMESTART}".into()),
            enabled_plugins: vec!["manual".into(), "notificationeabc".into()],
            ..Default::default()
        }
    }

    fn setup() -> (Arc<MemoryDirectory>, Arc<MemoryTransport>, EnrolmentEventHandler) {
        let directory = Arc::new(MemoryDirectory::new(site()));
        directory.insert_course(CourseContext {
            id: 2,
            full_name: "Biology 101".into(),
            visible: true,
            ..Default::default()
        });
        directory.insert_user(UserContext {
            id: 7,
            username: "ana".into(),
            first_name: "Ana".into(),
            email: "ana@example.org".into(),
            ..Default::default()
        });
        directory.insert_enrolment(EnrolmentContext {
            id: 30,
            ..Default::default()
        });

        let transport = Arc::new(MemoryTransport::new());
        let dispatcher = Arc::new(NotificationDispatcher::new(
            TemplateRenderer::default(),
            transport.clone(),
            SenderIdentity::new("Support", "support@lms.test"),
        ));
        let handler =
            EnrolmentEventHandler::new(directory.clone(), dispatcher, PolicySettings::default());
        (directory, transport, handler)
    }

    fn event(kind: EventKind) -> NotificationEvent {
        NotificationEvent {
            kind,
            course_id: 2,
            user_id: 7,
            enrolment_id: 30,
        }
    }

    #[tokio::test]
    async fn test_enrolled_event_sends_with_enrolment() {
        let (_, transport, handler) = setup();

        let outcome = handler.handle(&event(EventKind::Enrolled)).await.unwrap();

        assert!(matches!(outcome, HandleOutcome::Sent { .. }));
        assert_eq!(transport.sent()[0].body_html, "Welcome Ana, starts Never");
    }

    #[tokio::test]
    async fn test_unenrolled_event_does_not_load_enrolment() {
        let (directory, transport, handler) = setup();
        directory.set_site_config(SiteConfig {
            unenrol_message: Some("Bye {FIRSTNAME} {ENROLTIMESTART}".into()),
            ..site()
        });

        handler.handle(&event(EventKind::Unenrolled)).await.unwrap();

        assert_eq!(transport.sent()[0].body_html, "Bye Ana {ENROLTIMESTART}");
    }

    #[tokio::test]
    async fn test_missing_records_skip() {
        let (_, transport, handler) = setup();

        let mut missing_course = event(EventKind::Enrolled);
        missing_course.course_id = 99;
        assert_eq!(
            handler.handle(&missing_course).await.unwrap(),
            HandleOutcome::Skipped {
                cause: SkipCause::MissingRecord(MissingRecord::Course)
            }
        );

        let mut missing_user = event(EventKind::Enrolled);
        missing_user.user_id = 99;
        assert_eq!(
            handler.handle(&missing_user).await.unwrap(),
            HandleOutcome::Skipped {
                cause: SkipCause::MissingRecord(MissingRecord::User)
            }
        );
        assert_eq!(transport.sent_count(), 0);
    }

    #[tokio::test]
    async fn test_site_flag_checked_before_records_load() {
        let (directory, transport, handler) = setup();
        directory.set_site_config(SiteConfig {
            enrol_alert: false,
            ..site()
        });

        let mut missing_course = event(EventKind::Enrolled);
        missing_course.course_id = 99;
        assert_eq!(
            handler.handle(&missing_course).await.unwrap(),
            HandleOutcome::Skipped {
                cause: SkipCause::Policy(SkipReason::SiteAlertDisabled)
            }
        );
        assert_eq!(transport.sent_count(), 0);
    }

    #[tokio::test]
    async fn test_instance_template_reaches_transport() {
        let (directory, transport, handler) = setup();
        directory.put_instance(InstanceRecord {
            course_id: 2,
            customint3: true,
            customtext3: "Updated for {FIRSTNAME}".into(),
            ..Default::default()
        });

        handler.handle(&event(EventKind::Updated)).await.unwrap();

        assert_eq!(transport.sent()[0].body_html, "Updated for Ana");
    }

    #[tokio::test]
    async fn test_instance_kind_disabled_skips() {
        let (directory, transport, handler) = setup();
        directory.put_instance(InstanceRecord {
            course_id: 2,
            customint1: false,
            customtext1: "Instance text".into(),
            ..Default::default()
        });

        let outcome = handler.handle(&event(EventKind::Enrolled)).await.unwrap();

        assert_eq!(
            outcome,
            HandleOutcome::Skipped {
                cause: SkipCause::Policy(SkipReason::InstanceKindDisabled)
            }
        );
        assert_eq!(transport.sent_count(), 0);
    }

    #[tokio::test]
    async fn test_transport_failure_is_failed_outcome() {
        let (_, transport, handler) = setup();
        transport.set_failing(true);

        let outcome = handler.handle(&event(EventKind::Enrolled)).await.unwrap();

        match outcome {
            HandleOutcome::Failed { result } => assert!(!result.success),
            other => panic!("unexpected outcome {:?}", other),
        }
    }

    #[test]
    fn test_outcome_serialization() {
        let outcome = HandleOutcome::Skipped {
            cause: SkipCause::Policy(SkipReason::UserSuspended),
        };
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["status"], "skipped");
        assert_eq!(json["cause"]["skip"], "policy");
        assert_eq!(json["cause"]["detail"], "user_suspended");
    }
}
