//! Default values for configuration fields.
//!
//! These functions are used by serde for default deserialization.

// ============================================================================
// [base] Section Defaults
// ============================================================================

pub mod base {
    pub fn title() -> String {
        "Untitled".into()
    }

    pub fn url() -> Option<String> {
        None
    }

    pub fn base_path() -> String {
        "/".into()
    }
}

// ============================================================================
// [content] Section Defaults
// ============================================================================

pub mod content {
    use std::path::PathBuf;

    pub fn root() -> PathBuf {
        "content".into()
    }

    pub fn pages() -> PathBuf {
        "pages".into()
    }

    pub fn collections() -> PathBuf {
        "collections".into()
    }

    pub fn blueprints() -> PathBuf {
        "blueprints".into()
    }

    pub fn media() -> PathBuf {
        "media/_meta".into()
    }

    pub fn site() -> PathBuf {
        "site.json".into()
    }
}

// ============================================================================
// [pagination] Section Defaults
// ============================================================================

pub mod pagination {
    pub fn per_page() -> usize {
        10
    }

    pub fn max_visible() -> usize {
        7
    }

    pub fn param() -> String {
        "page".into()
    }

    pub fn prev_label() -> String {
        "« Previous".into()
    }

    pub fn next_label() -> String {
        "Next »".into()
    }
}
