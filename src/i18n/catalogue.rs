//! Localized string catalogue

use serde::{Deserialize, Serialize};

/// Supported interface languages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    En,
    Es,
}

impl Locale {
    /// Parse a language code; anything unrecognized falls back to English
    pub fn parse(code: &str) -> Self {
        let lang = code.split(['_', '-']).next().unwrap_or_default();
        match lang.to_ascii_lowercase().as_str() {
            "es" => Locale::Es,
            _ => Locale::En,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Locale::En => "en",
            Locale::Es => "es",
        }
    }

    pub(crate) fn chrono_locale(&self) -> chrono::Locale {
        match self {
            Locale::En => chrono::Locale::en_US,
            Locale::Es => chrono::Locale::es_ES,
        }
    }
}

/// Keys of every user-facing or log-facing string
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StringKey {
    PluginName,
    Subject,
    Never,
    Yes,
    No,
    InstanceName,
    Status,
    EnrolAlert,
    EnrolAlertHelp,
    EnrolMessage,
    EnrolMessageHelp,
    EnrolMessageDefault,
    UnenrolAlert,
    UnenrolAlertHelp,
    UnenrolMessage,
    UnenrolMessageHelp,
    UnenrolMessageDefault,
    EnrolUpdateAlert,
    EnrolUpdateAlertHelp,
    EnrolUpdateMessage,
    EnrolUpdateMessageHelp,
    EnrolUpdateMessageDefault,
    SendSucceeded,
    SendFailed,
    InvalidStatus,
}

const TOKEN_HELP_EN: &str = "Placeholders are replaced when the message is sent: \
{COURSEFULLNAME}, {USERNAME}, {FIRSTNAME}, {LASTNAME}, {URL}. \
Enrolment fields: {ENROLTIMECREATED}, {ENROLTIMEMODIFIED}, {ENROLTIMESTART}, {ENROLTIMEEND}. \
Other course fields: {COURSESHORTNAME}, {COURSEIDNUMBER}, {COURSESTARTDATE}, {COURSEENDDATE}. \
Other user fields: {IDNUMBER}, {EMAIL}, {COUNTRY}, {CITY}. \
Legacy fields: {COURSENAME}, {NOMBRE}, {APELLIDO}. \
Custom profile fields use {PROFILEFIELD_SHORTNAME}, e.g. {PROFILEFIELD_OFFICE}.";

const TOKEN_HELP_ES: &str = "Los marcadores se reemplazan al enviar el mensaje: \
{COURSEFULLNAME}, {USERNAME}, {FIRSTNAME}, {LASTNAME}, {URL}. \
Campos de matriculación: {ENROLTIMECREATED}, {ENROLTIMEMODIFIED}, {ENROLTIMESTART}, {ENROLTIMEEND}. \
Otros campos del curso: {COURSESHORTNAME}, {COURSEIDNUMBER}, {COURSESTARTDATE}, {COURSEENDDATE}. \
Otros campos del usuario: {IDNUMBER}, {EMAIL}, {COUNTRY}, {CITY}. \
Campos heredados: {COURSENAME}, {NOMBRE}, {APELLIDO}. \
Los campos de perfil usan {PROFILEFIELD_NOMBRECORTO}, por ejemplo {PROFILEFIELD_OFFICE}.";

/// Raw catalogue text for a key
pub fn text(locale: Locale, key: StringKey) -> &'static str {
    use StringKey::*;

    match locale {
        Locale::En => match key {
            PluginName => "Enrol notification",
            Subject => "Enrolment email notification",
            Never => "Never",
            Yes => "Yes",
            No => "No",
            InstanceName => "Custom instance name",
            Status => "Active email notification",
            EnrolAlert => "Enable enrol message",
            EnrolAlertHelp => "Send a message when a user is enrolled in this course",
            EnrolMessage => "Custom enrol message",
            EnrolMessageHelp => TOKEN_HELP_EN,
            EnrolMessageDefault => "You have been enrolled in {fullname} ({url})",
            UnenrolAlert => "Enable unenrol message",
            UnenrolAlertHelp => "Send a message when a user is unenrolled from this course",
            UnenrolMessage => "Custom unenrol message",
            UnenrolMessageHelp => TOKEN_HELP_EN,
            UnenrolMessageDefault => "You have been unenrolled from {fullname} ({url})",
            EnrolUpdateAlert => "Enable enrol update message",
            EnrolUpdateAlertHelp => "Send a message when a user's enrolment in this course changes",
            EnrolUpdateMessage => "Custom enrol update message",
            EnrolUpdateMessageHelp => TOKEN_HELP_EN,
            EnrolUpdateMessageDefault => "Your enrolment to {fullname} has been updated ({url})",
            SendSucceeded => "The user {username} has been notified about the enrolment in the {coursename} course",
            SendFailed => "WARNING: the user {username} could not be notified about the enrolment in the {coursename} course",
            InvalidStatus => "Invalid status value",
        },
        Locale::Es => match key {
            PluginName => "Notificación de Matriculación",
            Subject => "Notificación de Matriculación",
            Never => "Nunca",
            Yes => "Sí",
            No => "No",
            InstanceName => "Nombre personalizado de la instancia",
            Status => "Activar notificación de matriculación",
            EnrolAlert => "Activar aviso de matriculación",
            EnrolAlertHelp => "Enviar un mensaje cuando un usuario es matriculado en este curso",
            EnrolMessage => "Mensaje personalizado de matriculación",
            EnrolMessageHelp => TOKEN_HELP_ES,
            EnrolMessageDefault => "Ud ha sido matriculado en el curso {fullname} ({url})",
            UnenrolAlert => "Activar aviso de desmatriculación",
            UnenrolAlertHelp => "Enviar un mensaje cuando un usuario es desmatriculado de este curso",
            UnenrolMessage => "Mensaje personalizado de desmatriculación",
            UnenrolMessageHelp => TOKEN_HELP_ES,
            UnenrolMessageDefault => "Ud ha sido desmatriculado del curso {fullname} ({url})",
            EnrolUpdateAlert => "Activar aviso de actualización de matriculación",
            EnrolUpdateAlertHelp => "Enviar un mensaje cuando cambia la matriculación de un usuario en este curso",
            EnrolUpdateMessage => "Mensaje personalizado de actualización",
            EnrolUpdateMessageHelp => TOKEN_HELP_ES,
            EnrolUpdateMessageDefault => "Su matriculación en el curso {fullname} ha sido actualizada ({url})",
            SendSucceeded => "Se notificó al usuario {username} sobre su matriculación en el curso {coursename}",
            SendFailed => "ATENCIÓN: no se pudo notificar al usuario {username} sobre su matriculación en el curso {coursename}",
            InvalidStatus => "Valor de estado no válido",
        },
    }
}

/// Catalogue text with `{name}` arguments substituted.
///
/// Argument names are lowercase, so they never collide with the uppercase
/// placeholders of user-authored message templates.
pub fn format(locale: Locale, key: StringKey, args: &[(&str, &str)]) -> String {
    args.iter()
        .fold(text(locale, key).to_string(), |acc, (name, value)| {
            acc.replace(&format!("{{{}}}", name), value)
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_locale_parse() {
        assert_eq!(Locale::parse("es"), Locale::Es);
        assert_eq!(Locale::parse("es_mx"), Locale::Es);
        assert_eq!(Locale::parse("ES-ar"), Locale::Es);
        assert_eq!(Locale::parse("en"), Locale::En);
        assert_eq!(Locale::parse("fr"), Locale::En);
        assert_eq!(Locale::parse(""), Locale::En);
    }

    #[test]
    fn test_format_arguments() {
        let line = format(
            Locale::En,
            StringKey::SendSucceeded,
            &[("username", "ana"), ("coursename", "Biology 101")],
        );
        assert_eq!(
            line,
            "The user ana has been notified about the enrolment in the Biology 101 course"
        );
    }

    #[test]
    fn test_canned_default_leaves_template_tokens() {
        let line = format(
            Locale::Es,
            StringKey::EnrolMessageDefault,
            &[("fullname", "Biología"), ("url", "https://lms/course/view.php?id=3")],
        );
        assert_eq!(
            line,
            "Ud ha sido matriculado en el curso Biología (https://lms/course/view.php?id=3)"
        );
        assert!(text(Locale::En, StringKey::EnrolMessageHelp).contains("{FIRSTNAME}"));
    }
}
