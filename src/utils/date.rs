//! Date parsing and formatting for record timestamps and date fields.
//!
//! Accepted inputs, tried in order:
//!
//! | Input | Example |
//! |-------|---------|
//! | RFC 3339 | `2024-03-01T10:30:00Z`, `2024-03-01T10:30:00+02:00` |
//! | ISO date-time (no zone) | `2024-03-01T10:30:00`, `2024-03-01 10:30:00` |
//! | ISO date-time, minutes | `2024-03-01T10:30`, `2024-03-01 10:30` |
//! | ISO date | `2024-03-01` |
//!
//! Values without a zone are taken as UTC.

use chrono::{
    DateTime, NaiveDate, NaiveDateTime, Utc,
    format::{Item, StrftimeItems},
};
use std::fmt::Write;

const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Parse a date-like string into a UTC datetime.
///
/// Returns `None` for anything that is not a calendar date, so callers can
/// fall through to their next rule.
pub fn parse(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    // Minimum: "YYYY-MM-DD"
    if s.len() < 10 || !s.as_bytes()[0].is_ascii_digit() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in NAIVE_DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.and_utc());
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

/// Parse a date-like string into a UNIX timestamp (seconds).
#[inline]
pub fn timestamp(s: &str) -> Option<i64> {
    parse(s).map(|dt| dt.timestamp())
}

/// Format a date-like string with a strftime pattern.
///
/// Returns `None` when the input is not a date or the pattern is invalid.
pub fn format(s: &str, pattern: &str) -> Option<String> {
    let dt = parse(s)?;
    let items: Vec<Item<'_>> = StrftimeItems::new(pattern).collect();
    if items.iter().any(|item| matches!(item, Item::Error)) {
        return None;
    }

    let mut out = String::new();
    write!(out, "{}", dt.format_with_items(items.into_iter())).ok()?;
    Some(out)
}

/// Whether a `date_format` argument is really a list separator.
///
/// A separator carries no format directives: it is non-empty and made only of
/// punctuation and whitespace (e.g. `", "`, `" / "`, `"-"`).
pub fn is_separator_like(s: &str) -> bool {
    !s.is_empty() && !s.contains('%') && !s.chars().any(char::is_alphanumeric)
}
