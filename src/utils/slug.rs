//! Slug derivation and item URL construction.

use crate::storage::Record;
use crate::utils::value::non_empty_str;
use regex::Regex;
use std::{path::Path, sync::LazyLock};

/// Trailing numeric suffix added to de-duplicate file names (`post-2.json`).
static RE_NUMERIC_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"-[0-9]+$").unwrap());

// ============================================================================
// Slugs
// ============================================================================

/// Derive a record's slug.
///
/// Uses the explicit `_slug` field when present, otherwise the file stem with
/// a trailing `-<digits>` de-duplication suffix removed.
///
/// | File | `_slug` | Slug |
/// |------|---------|------|
/// | `hello-world.json` | - | `hello-world` |
/// | `hello-world-2.json` | - | `hello-world` |
/// | `x-1.json` | `custom` | `custom` |
pub fn derive_slug(record: &Record, path: &Path) -> String {
    if let Some(slug) = non_empty_str(record, "_slug") {
        return slug.to_owned();
    }
    let stem = file_stem(path);
    let stripped = RE_NUMERIC_SUFFIX.replace(stem, "");
    // A stem made only of the suffix pattern keeps its full name
    if stripped.is_empty() { stem.to_owned() } else { stripped.into_owned() }
}

/// File stem of a record path, or an empty string.
#[inline]
pub fn file_stem(path: &Path) -> &str {
    path.file_stem().and_then(|s| s.to_str()).unwrap_or_default()
}

// ============================================================================
// URLs
// ============================================================================

/// Join a base path and URL segments into a pretty URL (`/base/a/b/`).
///
/// Segments are percent-encoded; empty segments are skipped.
pub fn join_url(base_path: &str, segments: &[&str]) -> String {
    let mut url = String::from("/");
    let base = base_path.trim_matches('/');
    if !base.is_empty() {
        url.push_str(base);
        url.push('/');
    }
    for segment in segments.iter().map(|s| s.trim_matches('/')).filter(|s| !s.is_empty()) {
        url.push_str(&urlencoding::encode(segment));
        url.push('/');
    }
    url
}
