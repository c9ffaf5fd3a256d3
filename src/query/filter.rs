//! Query filters.

use crate::storage::Record;
use crate::utils::value::is_truthy;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Publication status of a record (`_status`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    #[default]
    Draft,
    Published,
    Unlisted,
}

impl Status {
    /// Parse a stored status; anything unknown is a draft.
    pub fn parse(s: &str) -> Self {
        s.parse().unwrap_or_default()
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Published => "published",
            Self::Unlisted => "unlisted",
        }
    }
}

impl FromStr for Status {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "draft" => Ok(Self::Draft),
            "published" => Ok(Self::Published),
            "unlisted" => Ok(Self::Unlisted),
            other => Err(format!("unknown status `{other}` (expected draft, published or unlisted)")),
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Order {
    Asc,
    #[default]
    Desc,
}

impl FromStr for Order {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" => Ok(Self::Asc),
            "desc" => Ok(Self::Desc),
            other => Err(format!("unknown order `{other}` (expected asc or desc)")),
        }
    }
}

/// Filter, sort and slice options of a collection query.
///
/// ```toml
/// status = "published"
/// featured = true
/// sort = "title"
/// order = "asc"
/// limit = 10
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Filter {
    pub status: Option<Status>,
    pub featured: Option<bool>,
    /// Sort field; `date`/`updated_at` when unset.
    pub sort: Option<String>,
    pub order: Option<Order>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

impl Filter {
    pub fn published() -> Self {
        Self { status: Some(Status::Published), ..Self::default() }
    }

    /// Whether an annotated record passes the status and featured checks.
    pub fn matches(&self, item: &Record) -> bool {
        if let Some(status) = self.status {
            let item_status = item.get("status").and_then(|v| v.as_str()).map_or(Status::Draft, Status::parse);
            if item_status != status {
                return false;
            }
        }
        if let Some(featured) = self.featured {
            let item_featured = item.get("featured").is_some_and(is_truthy);
            if item_featured != featured {
                return false;
            }
        }
        true
    }

    /// Offset to apply, defaulting to the start of `current_page` when a
    /// limit is set.
    pub fn effective_offset(&self, current_page: usize) -> usize {
        match (self.offset, self.limit) {
            (Some(offset), _) => offset,
            (None, Some(limit)) => current_page.saturating_sub(1).saturating_mul(limit),
            (None, None) => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn item(status: &str, featured: bool) -> Record {
        json!({"status": status, "featured": featured}).as_object().cloned().unwrap()
    }

    #[test]
    fn test_status_parse() {
        assert_eq!(Status::parse("Published"), Status::Published);
        assert_eq!(Status::parse("unlisted"), Status::Unlisted);
        assert_eq!(Status::parse("bogus"), Status::Draft);
        assert!("bogus".parse::<Status>().is_err());
    }

    #[test]
    fn test_matches_status_and_featured() {
        let filter = Filter { status: Some(Status::Published), featured: Some(true), ..Filter::default() };
        assert!(filter.matches(&item("published", true)));
        assert!(!filter.matches(&item("published", false)));
        assert!(!filter.matches(&item("draft", true)));
        assert!(Filter::default().matches(&item("draft", false)));
    }

    #[test]
    fn test_effective_offset() {
        let filter = Filter { limit: Some(10), ..Filter::default() };
        assert_eq!(filter.effective_offset(1), 0);
        assert_eq!(filter.effective_offset(3), 20);
        assert_eq!(filter.effective_offset(0), 0);
        let filter = Filter { limit: Some(10), offset: Some(5), ..Filter::default() };
        assert_eq!(filter.effective_offset(3), 5);
        assert_eq!(Filter::default().effective_offset(4), 0);
    }

    #[test]
    fn test_deserialize_filter() {
        let filter: Filter = serde_json::from_value(json!({"status": "published", "order": "asc", "limit": 5})).unwrap();
        assert_eq!(filter.status, Some(Status::Published));
        assert_eq!(filter.order, Some(Order::Asc));
        assert_eq!(filter.limit, Some(5));
        assert!(serde_json::from_value::<Filter>(json!({"bogus": 1})).is_err());
    }
}
