//! Collection query engine.
//!
//! # Pipeline
//!
//! ```text
//! collections/<name>/*.json
//!     │ Collections::load()      read in listing order, annotate derived fields
//!     ▼
//! Vec<Record>
//!     │ Filter::matches()        status, featured
//!     │ sort::sort_items()       stable, updated_at desc by default
//!     │ paging                   offset/limit (skipped during static generation)
//!     ▼
//! ScopedIter (collection item scope)
//! ```
//!
//! # Derived Fields
//!
//! | Field | Source |
//! |-------|--------|
//! | `slug` | `_slug`, else file stem without `-<digits>` |
//! | `title` | `title`, else the slug |
//! | `url` | base path + collection + slug |
//! | `status` | `_status`, default `draft` |
//! | `featured` | truthiness of `_featured` |
//! | `created_at` | `_meta.created` |
//! | `updated_at` | `_meta.updated`, else `_meta.created` |
//!
//! Derived fields replace record fields of the same name.

pub mod filter;
pub mod pages;
pub mod sort;

pub use filter::{Filter, Order, Status};
pub use pages::Pages;
pub use sort::DEFAULT_SORT;

use crate::storage::{Record, Storage};
use crate::utils::{
    slug::{derive_slug, join_url},
    value::{is_truthy, lookup_path, non_empty_str},
};
use serde_json::Value;
use std::path::{Component, Path};

/// How a query selects from a collection.
#[derive(Debug, Clone, Default)]
pub enum Lookup<'q> {
    /// Every item, default sort.
    #[default]
    All,
    /// Filtered, sorted and sliced items.
    Filter(Filter),
    /// The single item with this slug.
    Slug(&'q str),
}

/// Pagination state of the current render pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Paging {
    /// 1-based page number requested by the visitor.
    pub current_page: usize,
    /// `false` during static generation, where every item is emitted and a
    /// client-side component slices at view time.
    pub enabled: bool,
}

impl Paging {
    pub const fn page(current_page: usize) -> Self {
        Self { current_page, enabled: true }
    }

    pub const fn disabled() -> Self {
        Self { current_page: 1, enabled: false }
    }
}

impl Default for Paging {
    fn default() -> Self {
        Self::page(1)
    }
}

// ============================================================================
// Collections
// ============================================================================

/// Read access to the collections directory.
pub struct Collections<'a> {
    storage: &'a dyn Storage,
    dir: &'a Path,
    base_path: &'a str,
}

impl<'a> Collections<'a> {
    pub fn new(storage: &'a dyn Storage, dir: &'a Path, base_path: &'a str) -> Self {
        Self { storage, dir, base_path }
    }

    /// All items of a collection, annotated, in listing order.
    ///
    /// Unknown collections and unreadable items are simply absent.
    pub fn load(&self, name: &str) -> Vec<Record> {
        if !is_plain_name(name) {
            return Vec::new();
        }
        self.storage
            .list_records(&self.dir.join(name))
            .iter()
            .filter_map(|path| {
                let record = self.storage.read_record(path)?;
                let slug = derive_slug(&record, path);
                let url = join_url(self.base_path, &[name, &slug]);
                Some(annotate(record, slug, url))
            })
            .collect()
    }

    /// The item with `slug`, if any.
    pub fn find(&self, name: &str, slug: &str) -> Option<Record> {
        let slug = slug.trim();
        self.load(name)
            .into_iter()
            .find(|item| item.get("slug").and_then(Value::as_str) == Some(slug))
    }

    /// Filtered, sorted and paged items.
    pub fn select(&self, name: &str, filter: Option<&Filter>, paging: Paging) -> Vec<Record> {
        select(self.load(name), filter, paging)
    }

    /// Number of items passing `filter`, ignoring limit and offset.
    pub fn count(&self, name: &str, filter: Option<&Filter>) -> usize {
        let items = self.load(name);
        match filter {
            Some(filter) => items.iter().filter(|item| filter.matches(item)).count(),
            None => items.len(),
        }
    }
}

/// Apply filter, sort and paging to annotated records.
pub fn select(items: Vec<Record>, filter: Option<&Filter>, paging: Paging) -> Vec<Record> {
    let mut items = match filter {
        Some(filter) => items.into_iter().filter(|item| filter.matches(item)).collect(),
        None => items,
    };

    let sort_field = filter.and_then(|f| f.sort.as_deref()).unwrap_or(DEFAULT_SORT);
    let order = filter.and_then(|f| f.order).unwrap_or_default();
    sort::sort_items(&mut items, sort_field, order);

    let Some(filter) = filter else {
        return items;
    };
    if !paging.enabled {
        return items;
    }

    let rest = items.into_iter().skip(filter.effective_offset(paging.current_page));
    match filter.limit {
        Some(limit) => rest.take(limit).collect(),
        None => rest.collect(),
    }
}

/// Merge derived fields into a record.
pub(crate) fn annotate(mut record: Record, slug: String, url: String) -> Record {
    let meta = |key: &str| {
        lookup_path(&record, key)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_owned)
    };
    let created = meta("_meta.created").unwrap_or_default();
    let updated = meta("_meta.updated").unwrap_or_else(|| created.clone());
    let title = non_empty_str(&record, "title").unwrap_or(slug.as_str()).to_owned();
    let status = record
        .get("_status")
        .and_then(Value::as_str)
        .map_or(Status::Draft, Status::parse);
    let featured = record.get("_featured").is_some_and(is_truthy);

    record.insert("slug".into(), Value::String(slug));
    record.insert("title".into(), Value::String(title));
    record.insert("url".into(), Value::String(url));
    record.insert("status".into(), Value::String(status.name().to_owned()));
    record.insert("featured".into(), Value::Bool(featured));
    record.insert("created_at".into(), Value::String(created));
    record.insert("updated_at".into(), Value::String(updated));
    record
}

/// A single normal path component: no separators, `.` or `..`.
pub(crate) fn is_plain_name(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!(components.next(), Some(Component::Normal(_))) && components.next().is_none()
}
