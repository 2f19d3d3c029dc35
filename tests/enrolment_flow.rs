//! End-to-end enrolment notification flow
//!
//! Events go through the handler with an in-memory host directory and an
//! in-memory transport, so every envelope can be inspected.

use std::sync::Arc;

use enrol_notification_service::config::Settings;
use enrol_notification_service::enrolment::{
    CourseContext, EnrolmentContext, EventKind, NotificationEvent, ProfileField, SiteConfig,
    UserContext,
};
use enrol_notification_service::handler::{HandleOutcome, SkipCause};
use enrol_notification_service::host::MemoryDirectory;
use enrol_notification_service::instance::InstanceRecord;
use enrol_notification_service::notification::MemoryTransport;
use enrol_notification_service::policy::{GlobalFlagWiring, SkipReason};
use enrol_notification_service::server::AppState;

const COURSE_ID: i64 = 2;
const USER_ID: i64 = 7;
const ENROLMENT_ID: i64 = 30;

struct TestEnvironment {
    directory: Arc<MemoryDirectory>,
    transport: Arc<MemoryTransport>,
    state: AppState,
}

fn site_config() -> SiteConfig {
    SiteConfig {
        enrol_alert: true,
        unenrol_alert: true,
        enrol_update_alert: true,
        global_enrol_alert: true,
        enrol_message: Some("Welcome {FIRSTNAME} to {COURSEFULLNAME}".into()),
        enabled_plugins: vec!["manual".into(), "self".into(), "notificationeabc".into()],
        ..Default::default()
    }
}

fn create_environment(settings: Settings) -> TestEnvironment {
    let directory = Arc::new(MemoryDirectory::new(site_config()));
    directory.insert_course(CourseContext {
        id: COURSE_ID,
        full_name: "Biology 101".into(),
        short_name: "BIO101".into(),
        visible: true,
        url: CourseContext::view_url(&settings.site.wwwroot, COURSE_ID),
        ..Default::default()
    });

    let mut user = UserContext {
        id: USER_ID,
        username: "adiaz".into(),
        first_name: "Ana".into(),
        last_name: "Diaz".into(),
        email: "ana@example.org".into(),
        city: "Rosario".into(),
        ..Default::default()
    };
    user.profile_fields
        .insert("office".into(), ProfileField::text("B-204"));
    directory.insert_user(user);

    directory.insert_enrolment(EnrolmentContext {
        id: ENROLMENT_ID,
        time_start: 0,
        ..Default::default()
    });

    let transport = Arc::new(MemoryTransport::new());
    let state = AppState::new(settings, directory.clone(), transport.clone()).unwrap();

    TestEnvironment {
        directory,
        transport,
        state,
    }
}

fn event(kind: EventKind) -> NotificationEvent {
    NotificationEvent {
        kind,
        course_id: COURSE_ID,
        user_id: USER_ID,
        enrolment_id: ENROLMENT_ID,
    }
}

#[tokio::test]
async fn test_enrolled_with_site_template() {
    let env = create_environment(Settings::default());

    let outcome = env.state.handler.handle(&event(EventKind::Enrolled)).await.unwrap();

    let HandleOutcome::Sent { result } = outcome else {
        panic!("expected a sent outcome, got {:?}", outcome);
    };
    assert!(result.success);

    let sent = env.transport.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].body_html, "Welcome Ana to Biology 101");
    assert_eq!(sent[0].recipient_id, USER_ID);
    assert_eq!(sent[0].course_id, COURSE_ID);
    assert_eq!(sent[0].sender.email, "noreply@localhost");
}

#[tokio::test]
async fn test_identical_events_send_twice() {
    let env = create_environment(Settings::default());

    env.state.handler.handle(&event(EventKind::Enrolled)).await.unwrap();
    env.state.handler.handle(&event(EventKind::Enrolled)).await.unwrap();

    let sent = env.transport.sent();
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[0].body_html, sent[1].body_html);
    assert_ne!(sent[0].id, sent[1].id);
    assert_eq!(env.state.dispatcher.stats().total_sent, 2);
}

#[tokio::test]
async fn test_suspended_user_never_notified() {
    let env = create_environment(Settings::default());
    env.directory.insert_user(UserContext {
        id: USER_ID,
        username: "adiaz".into(),
        first_name: "Ana".into(),
        suspended: true,
        ..Default::default()
    });

    for kind in EventKind::ALL {
        let outcome = env.state.handler.handle(&event(kind)).await.unwrap();
        assert_eq!(
            outcome,
            HandleOutcome::Skipped {
                cause: SkipCause::Policy(SkipReason::UserSuspended)
            }
        );
    }
    assert_eq!(env.transport.sent_count(), 0);
}

#[tokio::test]
async fn test_course_instance_overrides_site_defaults() {
    let env = create_environment(Settings::default());
    env.directory.put_instance(InstanceRecord {
        course_id: COURSE_ID,
        customint1: true,
        customtext1: "Course {COURSESHORTNAME} welcomes {FIRSTNAME} ({PROFILEFIELD_OFFICE})".into(),
        ..Default::default()
    });

    env.state.handler.handle(&event(EventKind::Enrolled)).await.unwrap();

    assert_eq!(
        env.transport.sent()[0].body_html,
        "Course BIO101 welcomes Ana (B-204)"
    );
}

#[tokio::test]
async fn test_site_global_flag_off_without_instance() {
    let env = create_environment(Settings::default());
    env.directory.set_site_config(SiteConfig {
        global_enrol_alert: false,
        ..site_config()
    });

    let outcome = env.state.handler.handle(&event(EventKind::Enrolled)).await.unwrap();

    assert_eq!(
        outcome,
        HandleOutcome::Skipped {
            cause: SkipCause::Policy(SkipReason::GlobalAlertDisabled)
        }
    );
}

#[tokio::test]
async fn test_unenrol_follows_configured_global_wiring() {
    // Only the enrol global flag is on
    let shared = create_environment(Settings::default());
    let outcome = shared
        .state
        .handler
        .handle(&event(EventKind::Unenrolled))
        .await
        .unwrap();
    assert!(matches!(outcome, HandleOutcome::Sent { .. }));
    assert_eq!(
        shared.transport.sent()[0].body_html,
        "You have been unenrolled from Biology 101 (http://localhost/course/view.php?id=2)"
    );

    let mut settings = Settings::default();
    settings.site.global_flag_wiring = GlobalFlagWiring::PerKind;
    let per_kind = create_environment(settings);
    let outcome = per_kind
        .state
        .handler
        .handle(&event(EventKind::Unenrolled))
        .await
        .unwrap();
    assert_eq!(
        outcome,
        HandleOutcome::Skipped {
            cause: SkipCause::Policy(SkipReason::GlobalAlertDisabled)
        }
    );
}

#[tokio::test]
async fn test_spanish_locale_dates_and_subject() {
    let mut settings = Settings::default();
    settings.site.locale = "es".into();
    let env = create_environment(settings);
    env.directory.set_site_config(SiteConfig {
        enrol_update_message: Some("{FIRSTNAME}: comienza {ENROLTIMESTART}".into()),
        ..site_config()
    });

    let outcome = env.state.handler.handle(&event(EventKind::Updated)).await.unwrap();

    let HandleOutcome::Sent { result } = outcome else {
        panic!("expected a sent outcome, got {:?}", outcome);
    };
    assert_eq!(
        result.log.as_deref(),
        Some("Se notificó al usuario adiaz sobre su matriculación en el curso Biology 101")
    );
    let sent = env.transport.sent();
    assert_eq!(sent[0].body_html, "Ana: comienza Nunca");
    assert_eq!(sent[0].subject, "Notificación de Matriculación");
}

#[tokio::test]
async fn test_transport_failure_surfaces_as_failed() {
    let env = create_environment(Settings::default());
    env.transport.set_failing(true);

    let outcome = env.state.handler.handle(&event(EventKind::Enrolled)).await.unwrap();

    let HandleOutcome::Failed { result } = outcome else {
        panic!("expected a failed outcome, got {:?}", outcome);
    };
    assert!(!result.success);
    assert_eq!(
        result.log.as_deref(),
        Some("WARNING: the user adiaz could not be notified about the enrolment in the Biology 101 course")
    );
    assert_eq!(env.state.dispatcher.stats().total_failed, 1);
}
