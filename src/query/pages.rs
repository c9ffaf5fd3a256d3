//! Singleton page records, for navigation.

use super::{Filter, Paging, annotate, is_plain_name, select};
use crate::storage::{RECORD_EXT, Record, Storage};
use crate::utils::slug::{derive_slug, join_url};
use std::path::Path;

/// Page whose URL is the base path itself.
pub const INDEX_PAGE: &str = "index";

/// Read access to the pages directory.
pub struct Pages<'a> {
    storage: &'a dyn Storage,
    dir: &'a Path,
    base_path: &'a str,
}

impl<'a> Pages<'a> {
    pub fn new(storage: &'a dyn Storage, dir: &'a Path, base_path: &'a str) -> Self {
        Self { storage, dir, base_path }
    }

    /// Raw content of page `name`.
    pub fn get(&self, name: &str) -> Option<Record> {
        if !is_plain_name(name) {
            return None;
        }
        self.storage
            .read_record(&self.dir.join(format!("{name}.{RECORD_EXT}")))
    }

    /// All pages, annotated, in listing order.
    pub fn load(&self) -> Vec<Record> {
        self.storage
            .list_records(self.dir)
            .iter()
            .filter_map(|path| {
                let record = self.storage.read_record(path)?;
                let slug = derive_slug(&record, path);
                let url = match slug.as_str() {
                    INDEX_PAGE => join_url(self.base_path, &[]),
                    slug => join_url(self.base_path, &[slug]),
                };
                Some(annotate(record, slug, url))
            })
            .collect()
    }

    /// Navigation items.
    ///
    /// Without a filter: published pages in listing order. With one: the same
    /// status/featured/sort/limit rules as a collection query.
    pub fn select(&self, filter: Option<&Filter>) -> Vec<Record> {
        let pages = self.load();
        match filter {
            Some(filter) => select(pages, Some(filter), Paging::default()),
            None => {
                let published = Filter::published();
                pages.into_iter().filter(|page| published.matches(page)).collect()
            }
        }
    }
}
