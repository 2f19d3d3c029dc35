//! Course-level notifier instances.
//!
//! The host renders the configuration form from [`form_schema`], posts the
//! submitted values back, and persists an [`InstanceRecord`] per course.

mod form;
mod record;

pub use form::{
    form_schema, EditorValue, FieldErrors, FieldKind, FormField, InstanceForm, SelectOption,
    FORMAT_HTML,
};
pub use record::{can_add_instance, instance_defaults, InstanceDefaults, InstanceRecord};
