//! Message template rendering

use crate::enrolment::{CourseContext, EnrolmentContext, UserContext};
use crate::i18n::DateFormatter;

use super::tokens::{resolve_token, RenderScope};

/// Renders user-authored message templates
#[derive(Debug, Clone, Default)]
pub struct TemplateRenderer {
    dates: DateFormatter,
}

impl TemplateRenderer {
    pub fn new(dates: DateFormatter) -> Self {
        Self { dates }
    }

    pub fn dates(&self) -> &DateFormatter {
        &self.dates
    }

    /// Replace every recognized `{TOKEN}` in `template`.
    ///
    /// The template is scanned once from left to right, so text inserted for
    /// one placeholder is never expanded again. Unrecognized placeholders
    /// are copied through unchanged.
    pub fn render(
        &self,
        template: &str,
        user: &UserContext,
        course: &CourseContext,
        enrolment: Option<&EnrolmentContext>,
    ) -> String {
        let scope = RenderScope {
            user,
            course,
            enrolment,
            dates: &self.dates,
        };

        let mut out = String::with_capacity(template.len());
        let mut rest = template;

        while let Some(open) = rest.find('{') {
            out.push_str(&rest[..open]);
            let candidate = &rest[open..];

            let Some(close) = candidate.find('}') else {
                out.push_str(candidate);
                return out;
            };

            let name = &candidate[1..close];
            let resolved = if name.contains('{') {
                None
            } else {
                resolve_token(name, &scope)
            };

            match resolved {
                Some(value) => {
                    out.push_str(&value);
                    rest = &candidate[close + 1..];
                }
                None => {
                    out.push('{');
                    rest = &candidate[1..];
                }
            }
        }

        out.push_str(rest);
        out
    }
}
