use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Raw event names emitted by the host for enrolment lifecycle changes
pub const HOST_EVENT_ENROLLED: &str = "\\core\\event\\user_enrolment_created";
pub const HOST_EVENT_UNENROLLED: &str = "\\core\\event\\user_enrolment_deleted";
pub const HOST_EVENT_UPDATED: &str = "\\core\\event\\user_enrolment_updated";

/// Enrolment lifecycle change that may trigger a notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Enrolled,
    Unenrolled,
    Updated,
}

impl EventKind {
    pub const ALL: [EventKind; 3] = [EventKind::Enrolled, EventKind::Unenrolled, EventKind::Updated];

    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Enrolled => "enrolled",
            EventKind::Unenrolled => "unenrolled",
            EventKind::Updated => "updated",
        }
    }

    /// Map a host event name to its kind
    pub fn from_host_event(name: &str) -> Option<Self> {
        match name.trim_start_matches('\\') {
            n if n == &HOST_EVENT_ENROLLED[1..] => Some(EventKind::Enrolled),
            n if n == &HOST_EVENT_UNENROLLED[1..] => Some(EventKind::Unenrolled),
            n if n == &HOST_EVENT_UPDATED[1..] => Some(EventKind::Updated),
            _ => None,
        }
    }

    /// Whether the user enrolment record is loaded for this kind.
    /// A deleted enrolment no longer exists, so unenrol messages never see one.
    pub fn loads_enrolment(&self) -> bool {
        !matches!(self, EventKind::Unenrolled)
    }

    /// Site-level feature flag gating this kind
    pub fn site_alert(&self, site: &SiteConfig) -> bool {
        match self {
            EventKind::Enrolled => site.enrol_alert,
            EventKind::Unenrolled => site.unenrol_alert,
            EventKind::Updated => site.enrol_update_alert,
        }
    }

    /// Site-wide "global" flag for this kind, used when no course instance exists
    pub fn global_alert(&self, site: &SiteConfig) -> bool {
        match self {
            EventKind::Enrolled => site.global_enrol_alert,
            EventKind::Unenrolled => site.global_unenrol_alert,
            EventKind::Updated => site.global_enrol_update_alert,
        }
    }

    /// Site-level customized template, if the administrator set one
    pub fn site_template<'a>(&self, site: &'a SiteConfig) -> Option<&'a str> {
        let message = match self {
            EventKind::Enrolled => site.enrol_message.as_deref(),
            EventKind::Unenrolled => site.unenrol_message.as_deref(),
            EventKind::Updated => site.enrol_update_message.as_deref(),
        };
        message.filter(|m| !m.is_empty())
    }

    /// Per-kind flag on a course instance
    pub fn instance_alert(&self, instance: &PluginInstanceConfig) -> bool {
        match self {
            EventKind::Enrolled => instance.on_enrol_enabled,
            EventKind::Unenrolled => instance.on_unenrol_enabled,
            EventKind::Updated => instance.on_update_enabled,
        }
    }

    /// Course instance template for this kind
    pub fn instance_template<'a>(&self, instance: &'a PluginInstanceConfig) -> &'a str {
        match self {
            EventKind::Enrolled => &instance.template_enrol,
            EventKind::Unenrolled => &instance.template_unenrol,
            EventKind::Updated => &instance.template_update,
        }
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Transient notification trigger built from a host event payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationEvent {
    pub kind: EventKind,
    pub course_id: i64,
    pub user_id: i64,
    pub enrolment_id: i64,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EventPayloadError {
    #[error("Unknown event name: {0}")]
    UnknownEvent(String),

    #[error("Event payload carries neither an event name nor a kind")]
    MissingKind,
}

/// Event payload as posted by the host (webhook or pub/sub)
#[derive(Debug, Clone, Deserialize)]
pub struct HostEventPayload {
    /// Fully qualified host event name
    #[serde(default)]
    pub eventname: Option<String>,
    /// Explicit kind, takes precedence over `eventname`
    #[serde(default)]
    pub kind: Option<EventKind>,
    pub courseid: i64,
    pub relateduserid: i64,
    #[serde(default)]
    pub objectid: i64,
}

impl TryFrom<HostEventPayload> for NotificationEvent {
    type Error = EventPayloadError;

    fn try_from(payload: HostEventPayload) -> Result<Self, Self::Error> {
        let kind = match (payload.kind, payload.eventname) {
            (Some(kind), _) => kind,
            (None, Some(name)) => {
                EventKind::from_host_event(&name).ok_or(EventPayloadError::UnknownEvent(name))?
            }
            (None, None) => return Err(EventPayloadError::MissingKind),
        };

        Ok(NotificationEvent {
            kind,
            course_id: payload.courseid,
            user_id: payload.relateduserid,
            enrolment_id: payload.objectid,
        })
    }
}

/// Read-only course snapshot
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CourseContext {
    pub id: i64,
    pub full_name: String,
    pub short_name: String,
    #[serde(default)]
    pub id_number: String,
    #[serde(default)]
    pub start_date: i64,
    #[serde(default)]
    pub end_date: i64,
    #[serde(default = "default_visible")]
    pub visible: bool,
    #[serde(default)]
    pub url: String,
}

fn default_visible() -> bool {
    true
}

impl CourseContext {
    /// Absolute course view URL as the host builds it
    pub fn view_url(wwwroot: &str, course_id: i64) -> String {
        format!("{}/course/view.php?id={}", wwwroot.trim_end_matches('/'), course_id)
    }
}

/// Storage type of a custom profile field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProfileDatatype {
    #[default]
    Text,
    Textarea,
    Menu,
    Checkbox,
    Datetime,
    #[serde(other)]
    Other,
}

impl ProfileDatatype {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "text" => ProfileDatatype::Text,
            "textarea" => ProfileDatatype::Textarea,
            "menu" => ProfileDatatype::Menu,
            "checkbox" => ProfileDatatype::Checkbox,
            "datetime" => ProfileDatatype::Datetime,
            _ => ProfileDatatype::Other,
        }
    }
}

/// A user's value for one custom profile field
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfileField {
    #[serde(default)]
    pub datatype: ProfileDatatype,
    #[serde(default)]
    pub value: String,
}

impl ProfileField {
    pub fn text(value: impl Into<String>) -> Self {
        Self {
            datatype: ProfileDatatype::Text,
            value: value.into(),
        }
    }

    pub fn datetime(timestamp: i64) -> Self {
        Self {
            datatype: ProfileDatatype::Datetime,
            value: timestamp.to_string(),
        }
    }
}

/// Read-only user snapshot, including custom profile fields keyed by shortname
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserContext {
    pub id: i64,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub id_number: String,
    #[serde(default)]
    pub deleted: bool,
    #[serde(default)]
    pub suspended: bool,
    #[serde(default)]
    pub profile_fields: BTreeMap<String, ProfileField>,
}

impl UserContext {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name).trim().to_string()
    }
}

/// Timestamps of a single user enrolment
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrolmentContext {
    pub id: i64,
    #[serde(default)]
    pub time_created: i64,
    #[serde(default)]
    pub time_modified: i64,
    #[serde(default)]
    pub time_start: i64,
    #[serde(default)]
    pub time_end: i64,
}

/// Administrative status of a course instance. The host stores 0 for enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum InstanceStatus {
    #[default]
    Enabled,
    Disabled,
}

impl InstanceStatus {
    pub fn as_i64(&self) -> i64 {
        match self {
            InstanceStatus::Enabled => 0,
            InstanceStatus::Disabled => 1,
        }
    }
}

impl TryFrom<i64> for InstanceStatus {
    type Error = String;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(InstanceStatus::Enabled),
            1 => Ok(InstanceStatus::Disabled),
            other => Err(format!("invalid instance status {}", other)),
        }
    }
}

impl From<InstanceStatus> for i64 {
    fn from(status: InstanceStatus) -> Self {
        status.as_i64()
    }
}

/// Course-scoped notifier settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PluginInstanceConfig {
    pub id: i64,
    pub course_id: i64,
    pub status: InstanceStatus,
    pub on_enrol_enabled: bool,
    pub on_unenrol_enabled: bool,
    pub on_update_enabled: bool,
    pub template_enrol: String,
    pub template_unenrol: String,
    pub template_update: String,
}

impl PluginInstanceConfig {
    pub fn enabled(&self) -> bool {
        self.status == InstanceStatus::Enabled
    }
}

/// Snapshot of the site-wide plugin settings, taken once per handled event
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SiteConfig {
    #[serde(default)]
    pub enrol_alert: bool,
    #[serde(default)]
    pub unenrol_alert: bool,
    #[serde(default)]
    pub enrol_update_alert: bool,
    #[serde(default)]
    pub global_enrol_alert: bool,
    #[serde(default)]
    pub global_unenrol_alert: bool,
    #[serde(default)]
    pub global_enrol_update_alert: bool,
    #[serde(default)]
    pub include_hidden_courses: bool,
    #[serde(default)]
    pub enrol_message: Option<String>,
    #[serde(default)]
    pub unenrol_message: Option<String>,
    #[serde(default)]
    pub enrol_update_message: Option<String>,
    /// Names of the enrolment plugins enabled on the site
    #[serde(default)]
    pub enabled_plugins: Vec<String>,
}

impl SiteConfig {
    /// Build a snapshot from the host's plugin key/value settings and its
    /// comma separated list of enabled enrolment plugins.
    pub fn from_host_settings(settings: &HashMap<String, String>, enabled_plugins: &str) -> Self {
        let flag = |key: &str| {
            settings
                .get(key)
                .map(|v| matches!(v.trim(), "1" | "true" | "yes" | "on"))
                .unwrap_or(false)
        };
        let text = |key: &str| settings.get(key).filter(|v| !v.is_empty()).cloned();

        Self {
            enrol_alert: flag("enrolalert"),
            unenrol_alert: flag("unenrolalert"),
            enrol_update_alert: flag("enrolupdatealert"),
            global_enrol_alert: flag("globalenrolalert"),
            global_unenrol_alert: flag("globalunenrolalert"),
            global_enrol_update_alert: flag("globalenrolupdatealert"),
            include_hidden_courses: flag("includehiddencourses"),
            enrol_message: text("enrolmessage"),
            unenrol_message: text("unenrolmessage"),
            enrol_update_message: text("enrolupdatemessage"),
            enabled_plugins: enabled_plugins
                .split(',')
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(str::to_string)
                .collect(),
        }
    }

    pub fn plugin_enabled(&self, plugin_name: &str) -> bool {
        self.enabled_plugins.iter().any(|p| p == plugin_name)
    }
}
