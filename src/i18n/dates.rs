//! Localized rendering of Unix timestamps

use std::fmt::Write;

use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, FixedOffset, Offset, Utc};
use thiserror::Error;

use super::catalogue::{text, Locale, StringKey};

/// Default pattern, matching the host's long day/date/time format
pub const DEFAULT_DATE_FORMAT: &str = "%A, %-d %B %Y, %-I:%M %p";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DateFormatError {
    #[error("Invalid date format pattern: {0}")]
    InvalidPattern(String),

    #[error("UTC offset out of range: {0} minutes")]
    InvalidOffset(i32),
}

/// Formats timestamps for one locale, pattern and UTC offset
#[derive(Debug, Clone)]
pub struct DateFormatter {
    locale: Locale,
    pattern: String,
    offset: FixedOffset,
}

impl Default for DateFormatter {
    fn default() -> Self {
        Self {
            locale: Locale::En,
            pattern: DEFAULT_DATE_FORMAT.to_string(),
            offset: Utc.fix(),
        }
    }
}

impl DateFormatter {
    pub fn new(
        locale: Locale,
        pattern: &str,
        utc_offset_minutes: i32,
    ) -> Result<Self, DateFormatError> {
        if StrftimeItems::new(pattern).any(|item| matches!(item, Item::Error)) {
            return Err(DateFormatError::InvalidPattern(pattern.to_string()));
        }

        let offset = utc_offset_minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .ok_or(DateFormatError::InvalidOffset(utc_offset_minutes))?;

        Ok(Self {
            locale,
            pattern: pattern.to_string(),
            offset,
        })
    }

    pub fn locale(&self) -> Locale {
        self.locale
    }

    /// Format a timestamp; `None` when it is outside chrono's range
    pub fn format(&self, timestamp: i64) -> Option<String> {
        let datetime = DateTime::from_timestamp(timestamp, 0)?.with_timezone(&self.offset);
        let mut out = String::new();
        write!(
            out,
            "{}",
            datetime.format_localized(&self.pattern, self.locale.chrono_locale())
        )
        .ok()?;
        Some(out)
    }

    /// Positive timestamps become dates; zero or negative means "Never"
    pub fn date_or_never(&self, timestamp: i64) -> String {
        if timestamp > 0 {
            self.format(timestamp)
                .unwrap_or_else(|| timestamp.to_string())
        } else {
            self.never()
        }
    }

    pub fn never(&self) -> String {
        text(self.locale, StringKey::Never).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // 2024-03-05 14:30:00 UTC
    const TS: i64 = 1_709_649_000;

    #[test]
    fn test_default_format_english() {
        let dates = DateFormatter::default();
        assert_eq!(dates.format(TS).unwrap(), "Tuesday, 5 March 2024, 2:30 PM");
    }

    #[test]
    fn test_spanish_month_names() {
        let dates = DateFormatter::new(Locale::Es, "%-d %B %Y", 0).unwrap();
        assert_eq!(dates.format(TS).unwrap(), "5 marzo 2024");
    }

    #[test]
    fn test_offset_applied() {
        let dates = DateFormatter::new(Locale::En, "%Y-%m-%d %H:%M", -300).unwrap();
        assert_eq!(dates.format(TS).unwrap(), "2024-03-05 09:30");
    }

    #[test]
    fn test_never_for_non_positive() {
        let dates = DateFormatter::default();
        assert_eq!(dates.date_or_never(0), "Never");
        assert_eq!(dates.date_or_never(-5), "Never");

        let dates = DateFormatter::new(Locale::Es, DEFAULT_DATE_FORMAT, 0).unwrap();
        assert_eq!(dates.date_or_never(0), "Nunca");
    }

    #[test]
    fn test_rejects_bad_pattern_and_offset() {
        assert!(matches!(
            DateFormatter::new(Locale::En, "%Q", 0),
            Err(DateFormatError::InvalidPattern(_))
        ));
        assert_eq!(
            DateFormatter::new(Locale::En, "%Y", 24 * 60).unwrap_err(),
            DateFormatError::InvalidOffset(24 * 60)
        );
    }
}
