//! Enrolment lifecycle domain types.
//!
//! Snapshots of the host's course, user, enrolment and plugin configuration
//! records, read fresh for every handled event and never cached here.

mod types;

pub use types::{
    CourseContext, EnrolmentContext, EventKind, EventPayloadError, HostEventPayload,
    InstanceStatus, NotificationEvent, PluginInstanceConfig, ProfileDatatype, ProfileField,
    SiteConfig, UserContext, HOST_EVENT_ENROLLED, HOST_EVENT_UNENROLLED, HOST_EVENT_UPDATED,
};
