//! Localization: string catalogue and date rendering.
//!
//! Catalogue strings are used for message subjects, canned default messages,
//! form labels and the per-send log lines. Their `{name}` arguments are a
//! separate mechanism from the uppercase message template placeholders.

mod catalogue;
mod dates;

pub use catalogue::{format, text, Locale, StringKey};
pub use dates::{DateFormatError, DateFormatter, DEFAULT_DATE_FORMAT};
