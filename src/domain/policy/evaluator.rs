//! Notification eligibility rules

use serde::{Deserialize, Serialize};

use crate::enrolment::{CourseContext, EventKind, PluginInstanceConfig, SiteConfig, UserContext};
use crate::i18n::{self, Locale, StringKey};

/// Which site-wide "global" flag gates a kind when no course instance exists
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GlobalFlagWiring {
    /// Every kind consults the global enrol flag (historical behavior)
    #[default]
    SharedEnrol,
    /// Each kind consults its own global flag
    PerKind,
}

impl GlobalFlagWiring {
    pub fn global_alert(&self, kind: EventKind, site: &SiteConfig) -> bool {
        match self {
            GlobalFlagWiring::SharedEnrol => site.global_enrol_alert,
            GlobalFlagWiring::PerKind => kind.global_alert(site),
        }
    }
}

/// Evaluator settings that come from this service rather than the host
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicySettings {
    /// Name under which this notifier is registered with the host
    pub plugin_name: String,
    pub wiring: GlobalFlagWiring,
    pub locale: Locale,
}

impl Default for PolicySettings {
    fn default() -> Self {
        Self {
            plugin_name: "notificationeabc".to_string(),
            wiring: GlobalFlagWiring::default(),
            locale: Locale::default(),
        }
    }
}

/// Everything the evaluator looks at for one event
#[derive(Debug, Clone, Copy)]
pub struct PolicyInput<'a> {
    pub kind: EventKind,
    pub site: &'a SiteConfig,
    pub course: &'a CourseContext,
    pub user: &'a UserContext,
    pub instance: Option<&'a PluginInstanceConfig>,
}

/// Where the chosen template text came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TemplateSource {
    Instance,
    SiteCustom,
    CannedDefault,
}

/// Why an event does not produce a notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    SiteAlertDisabled,
    HiddenCourse,
    UserDeleted,
    UserSuspended,
    PluginNotEnabled,
    InstanceDisabled,
    InstanceKindDisabled,
    GlobalAlertDisabled,
}

impl SkipReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            SkipReason::SiteAlertDisabled => "site_alert_disabled",
            SkipReason::HiddenCourse => "hidden_course",
            SkipReason::UserDeleted => "user_deleted",
            SkipReason::UserSuspended => "user_suspended",
            SkipReason::PluginNotEnabled => "plugin_not_enabled",
            SkipReason::InstanceDisabled => "instance_disabled",
            SkipReason::InstanceKindDisabled => "instance_kind_disabled",
            SkipReason::GlobalAlertDisabled => "global_alert_disabled",
        }
    }
}

/// Evaluator verdict
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Notify {
        template: String,
        source: TemplateSource,
    },
    Skip(SkipReason),
}

impl Decision {
    pub fn should_notify(&self) -> bool {
        matches!(self, Decision::Notify { .. })
    }
}

fn canned_default_key(kind: EventKind) -> StringKey {
    match kind {
        EventKind::Enrolled => StringKey::EnrolMessageDefault,
        EventKind::Unenrolled => StringKey::UnenrolMessageDefault,
        EventKind::Updated => StringKey::EnrolUpdateMessageDefault,
    }
}

/// Pick the template for a kind: the course instance text when an instance
/// exists (even if empty), else the site customization, else the canned
/// default with the course name and URL filled in.
pub fn select_template(
    kind: EventKind,
    site: &SiteConfig,
    instance: Option<&PluginInstanceConfig>,
    course: &CourseContext,
    locale: Locale,
) -> (String, TemplateSource) {
    if let Some(instance) = instance {
        return (kind.instance_template(instance).to_string(), TemplateSource::Instance);
    }

    match kind.site_template(site) {
        Some(custom) => (custom.to_string(), TemplateSource::SiteCustom),
        None => (
            i18n::format(
                locale,
                canned_default_key(kind),
                &[("fullname", course.full_name.as_str()), ("url", course.url.as_str())],
            ),
            TemplateSource::CannedDefault,
        ),
    }
}

/// Decide whether an event produces a notification. Rules are checked in
/// order and the first failing rule is reported.
pub fn should_notify(input: &PolicyInput<'_>, settings: &PolicySettings) -> Decision {
    let PolicyInput {
        kind,
        site,
        course,
        user,
        instance,
    } = *input;

    if !kind.site_alert(site) {
        return Decision::Skip(SkipReason::SiteAlertDisabled);
    }

    if !course.visible && !site.include_hidden_courses {
        return Decision::Skip(SkipReason::HiddenCourse);
    }

    if user.deleted {
        return Decision::Skip(SkipReason::UserDeleted);
    }
    if user.suspended {
        return Decision::Skip(SkipReason::UserSuspended);
    }

    if !site.plugin_enabled(&settings.plugin_name) {
        return Decision::Skip(SkipReason::PluginNotEnabled);
    }

    match instance {
        Some(instance) => {
            if !instance.enabled() {
                return Decision::Skip(SkipReason::InstanceDisabled);
            }
            if !kind.instance_alert(instance) {
                return Decision::Skip(SkipReason::InstanceKindDisabled);
            }
        }
        None => {
            if !settings.wiring.global_alert(kind, site) {
                return Decision::Skip(SkipReason::GlobalAlertDisabled);
            }
        }
    }

    let (template, source) = select_template(kind, site, instance, course, settings.locale);
    Decision::Notify { template, source }
}
