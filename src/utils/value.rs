//! Helpers over JSON record values.

use crate::storage::Record;
use serde_json::Value;
use std::borrow::Cow;

/// Prefix marking reserved (non-content) record keys such as `_status`.
pub const RESERVED_PREFIX: char = '_';

/// Whether a dotted key refers to a reserved field.
///
/// Only the first path segment is checked: `_meta.updated` is reserved,
/// `gallery._x` is not.
#[inline]
pub fn is_reserved(key: &str) -> bool {
    key.starts_with(RESERVED_PREFIX)
}

/// Resolve a dotted path (`seo.title`, `gallery.0.src`) against a record.
///
/// Object segments are looked up by key, list segments by numeric index.
pub fn lookup_path<'a>(record: &'a Record, path: &str) -> Option<&'a Value> {
    let mut segments = path.split('.');
    let first = segments.next()?;
    let mut current = record.get(first)?;

    for segment in segments {
        current = match current {
            Value::Object(map) => map.get(segment)?,
            Value::Array(list) => list.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(current)
}

/// String form of a scalar value.
///
/// Booleans use the canonical truthiness strings (`"1"` / `""`); lists join
/// their scalar elements with `", "`; objects and null render empty.
pub fn scalar_to_string(value: &Value) -> Cow<'_, str> {
    match value {
        Value::String(s) => Cow::Borrowed(s),
        Value::Number(n) => Cow::Owned(n.to_string()),
        Value::Bool(true) => Cow::Borrowed("1"),
        Value::Bool(false) | Value::Null | Value::Object(_) => Cow::Borrowed(""),
        Value::Array(list) => Cow::Owned(
            list.iter()
                .map(scalar_to_string)
                .filter(|s| !s.is_empty())
                .collect::<Vec<_>>()
                .join(", "),
        ),
    }
}

/// Boolean coercion used by `switch`/`toggle` fields and `_featured`.
///
/// `true`, `"1"`, `"true"`, `"on"` (and the number 1) are true.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64() == Some(1.0),
        Value::String(s) => matches!(s.trim().to_ascii_lowercase().as_str(), "1" | "true" | "on"),
        _ => false,
    }
}

/// Read a string field, treating empty strings as absent.
#[inline]
pub fn non_empty_str<'a>(record: &'a Record, key: &str) -> Option<&'a str> {
    record
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}
