//! Course instance configuration form: schema and validation

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::enrolment::InstanceStatus;
use crate::i18n::{self, Locale, StringKey};

use super::record::InstanceDefaults;

/// HTML format code used by the host's rich text editor
pub const FORMAT_HTML: u8 = 1;

/// Rich text editor value. Accepts either `{"text": .., "format": ..}` or a
/// bare string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "EditorInput")]
pub struct EditorValue {
    pub text: String,
    pub format: u8,
}

impl EditorValue {
    pub fn html(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            format: FORMAT_HTML,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum EditorInput {
    Plain(String),
    Editor {
        #[serde(default)]
        text: String,
        #[serde(default = "default_format")]
        format: u8,
    },
}

fn default_format() -> u8 {
    FORMAT_HTML
}

impl From<EditorInput> for EditorValue {
    fn from(input: EditorInput) -> Self {
        match input {
            EditorInput::Plain(text) => EditorValue::html(text),
            EditorInput::Editor { text, format } => EditorValue { text, format },
        }
    }
}

/// Submitted course instance form
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstanceForm {
    #[serde(default)]
    pub name: Option<String>,
    pub status: i64,
    #[serde(default)]
    pub customint1: bool,
    #[serde(default)]
    pub customint2: bool,
    #[serde(default)]
    pub customint3: bool,
    #[serde(default)]
    pub customtext1: EditorValue,
    #[serde(default)]
    pub customtext2: EditorValue,
    #[serde(default)]
    pub customtext3: EditorValue,
}

/// Field-level validation errors, keyed by form field name
#[derive(Debug, Clone, Default, PartialEq, Eq, Error, Serialize)]
#[error("Invalid form fields: {}", .0.keys().cloned().collect::<Vec<_>>().join(", "))]
pub struct FieldErrors(pub BTreeMap<String, String>);

impl FieldErrors {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn insert(&mut self, field: &str, message: impl Into<String>) {
        self.0.insert(field.to_string(), message.into());
    }
}

impl InstanceForm {
    /// Status must be one of the two allowed values
    pub fn validate(&self, locale: Locale) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::default();

        if InstanceStatus::try_from(self.status).is_err() {
            errors.insert("status", i18n::text(locale, StringKey::InvalidStatus));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum FieldKind {
    Text,
    Select { options: Vec<SelectOption> },
    Checkbox,
    Editor { rows: u16, cols: u16 },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SelectOption {
    pub value: i64,
    pub label: String,
}

/// One field of the configuration form as the host UI should render it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormField {
    pub name: &'static str,
    #[serde(flatten)]
    pub kind: FieldKind,
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub help: Option<String>,
    pub default: serde_json::Value,
}

const EDITOR_ROWS: u16 = 12;
const EDITOR_COLS: u16 = 60;

/// Field definitions of the course instance form
pub fn form_schema(locale: Locale, defaults: &InstanceDefaults) -> Vec<FormField> {
    let t = |key| i18n::text(locale, key).to_string();
    let editor = FieldKind::Editor {
        rows: EDITOR_ROWS,
        cols: EDITOR_COLS,
    };

    let mut fields = vec![
        FormField {
            name: "name",
            kind: FieldKind::Text,
            label: t(StringKey::InstanceName),
            help: None,
            default: serde_json::Value::String(t(StringKey::PluginName)),
        },
        FormField {
            name: "status",
            kind: FieldKind::Select {
                options: vec![
                    SelectOption {
                        value: InstanceStatus::Enabled.as_i64(),
                        label: t(StringKey::Yes),
                    },
                    SelectOption {
                        value: InstanceStatus::Disabled.as_i64(),
                        label: t(StringKey::No),
                    },
                ],
            },
            label: t(StringKey::Status),
            help: None,
            default: defaults.status.as_i64().into(),
        },
    ];

    let per_kind = [
        (
            ("customint1", StringKey::EnrolAlert, StringKey::EnrolAlertHelp, defaults.enrol_alert),
            ("customtext1", StringKey::EnrolMessage, StringKey::EnrolMessageHelp, &defaults.enrol_message),
        ),
        (
            ("customint2", StringKey::UnenrolAlert, StringKey::UnenrolAlertHelp, defaults.unenrol_alert),
            ("customtext2", StringKey::UnenrolMessage, StringKey::UnenrolMessageHelp, &defaults.unenrol_message),
        ),
        (
            (
                "customint3",
                StringKey::EnrolUpdateAlert,
                StringKey::EnrolUpdateAlertHelp,
                defaults.enrol_update_alert,
            ),
            (
                "customtext3",
                StringKey::EnrolUpdateMessage,
                StringKey::EnrolUpdateMessageHelp,
                &defaults.enrol_update_message,
            ),
        ),
    ];

    for ((flag, flag_label, flag_help, flag_default), (text, text_label, text_help, text_default)) in
        per_kind
    {
        fields.push(FormField {
            name: flag,
            kind: FieldKind::Checkbox,
            label: t(flag_label),
            help: Some(t(flag_help)),
            default: flag_default.into(),
        });
        fields.push(FormField {
            name: text,
            kind: editor.clone(),
            label: t(text_label),
            help: Some(t(text_help)),
            default: text_default.clone().into(),
        });
    }

    fields
}
