//! Persisted course instance record

use serde::{Deserialize, Serialize};

use crate::enrolment::{InstanceStatus, PluginInstanceConfig, SiteConfig};

use super::form::InstanceForm;

/// Course instance as the host stores it. The generic `customint*` slots
/// hold the per-kind enable flags and `customtext*` the per-kind templates,
/// in enrol / unenrol / update order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InstanceRecord {
    pub id: i64,
    pub course_id: i64,
    #[serde(default)]
    pub name: Option<String>,
    pub status: InstanceStatus,
    pub customint1: bool,
    pub customint2: bool,
    pub customint3: bool,
    pub customtext1: String,
    pub customtext2: String,
    pub customtext3: String,
    #[serde(default)]
    pub time_created: i64,
    #[serde(default)]
    pub time_modified: i64,
}

impl InstanceRecord {
    /// Build a new, not yet persisted record for a course from a validated form
    pub fn from_form(course_id: i64, form: &InstanceForm, now: i64) -> Self {
        let mut record = Self {
            id: 0,
            course_id,
            time_created: now,
            ..Default::default()
        };
        record.apply_form(form, now);
        record
    }

    /// Copy submitted form values onto the record
    pub fn apply_form(&mut self, form: &InstanceForm, now: i64) {
        self.name = form.name.clone().filter(|n| !n.trim().is_empty());
        if let Ok(status) = InstanceStatus::try_from(form.status) {
            self.status = status;
        }
        self.customint1 = form.customint1;
        self.customint2 = form.customint2;
        self.customint3 = form.customint3;
        self.customtext1 = form.customtext1.text.clone();
        self.customtext2 = form.customtext2.text.clone();
        self.customtext3 = form.customtext3.text.clone();
        self.time_modified = now;
    }

    pub fn config(&self) -> PluginInstanceConfig {
        PluginInstanceConfig::from(self)
    }
}

impl From<&InstanceRecord> for PluginInstanceConfig {
    fn from(record: &InstanceRecord) -> Self {
        PluginInstanceConfig {
            id: record.id,
            course_id: record.course_id,
            status: record.status,
            on_enrol_enabled: record.customint1,
            on_unenrol_enabled: record.customint2,
            on_update_enabled: record.customint3,
            template_enrol: record.customtext1.clone(),
            template_unenrol: record.customtext2.clone(),
            template_update: record.customtext3.clone(),
        }
    }
}

/// Values a new instance starts with, seeded from the site settings
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InstanceDefaults {
    pub status: InstanceStatus,
    pub enrol_alert: bool,
    pub unenrol_alert: bool,
    pub enrol_update_alert: bool,
    pub enrol_message: String,
    pub unenrol_message: String,
    pub enrol_update_message: String,
}

pub fn instance_defaults(site: &SiteConfig) -> InstanceDefaults {
    InstanceDefaults {
        status: InstanceStatus::Enabled,
        enrol_alert: site.enrol_alert,
        unenrol_alert: site.unenrol_alert,
        enrol_update_alert: site.enrol_update_alert,
        enrol_message: site.enrol_message.clone().unwrap_or_default(),
        unenrol_message: site.unenrol_message.clone().unwrap_or_default(),
        enrol_update_message: site.enrol_update_message.clone().unwrap_or_default(),
    }
}

/// A course may carry at most one instance, never on the site front page,
/// and only a manager may add it.
pub fn can_add_instance(
    course_id: i64,
    site_course_id: i64,
    existing_instances: usize,
    has_manage_capability: bool,
) -> bool {
    course_id != site_course_id && existing_instances == 0 && has_manage_capability
}
