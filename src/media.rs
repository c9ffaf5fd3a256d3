//! Media metadata resolution.
//!
//! Alt text, captions and tags for uploaded files are stored as one record per
//! file, addressed by the hash of the file's normalized path:
//!
//! ```text
//! "/uploads/My%20Photo.jpg?v=2"
//!     │ normalize_path()
//!     ▼
//! "uploads/My Photo.jpg"
//!     │ blake3 + hex
//!     ▼
//! <media dir>/3f1c…9a.json  { "path": "uploads/My Photo.jpg", "alt": "...", ... }
//! ```
//!
//! Any spelling of the same file (absolute URL, query string, percent
//! encoding, `./` segments) resolves to the same record.

use crate::log;
use crate::storage::{RECORD_EXT, Record, Storage};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};

/// Stored metadata for one media file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MediaMeta {
    pub alt: String,
    pub caption: String,
    pub tags: Vec<String>,
}

/// Normalize a file URL or path so equivalent spellings compare equal.
pub fn normalize_path(url: &str) -> String {
    let url = url.trim();
    // Drop scheme and host from absolute URLs
    let path = match url.find("://") {
        Some(pos) => {
            let rest = &url[pos + 3..];
            rest.find('/').map_or("", |slash| &rest[slash..])
        }
        None => url,
    };
    let path = path.split(['?', '#']).next().unwrap_or_default();
    let decoded = urlencoding::decode(path).map_or_else(|_| path.to_owned(), |d| d.into_owned());

    let mut segments: Vec<&str> = Vec::new();
    for segment in decoded.split(['/', '\\']) {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            s => segments.push(s),
        }
    }
    segments.join("/")
}

/// Content-addressed key of a file: hex blake3 of its normalized path.
pub fn media_key(url: &str) -> String {
    let hash = blake3::hash(normalize_path(url).as_bytes());
    hex::encode(hash.as_bytes())
}

/// Media metadata store on top of the storage collaborator.
pub struct MediaLibrary<'a> {
    storage: &'a dyn Storage,
    dir: &'a Path,
}

impl<'a> MediaLibrary<'a> {
    pub fn new(storage: &'a dyn Storage, dir: &'a Path) -> Self {
        Self { storage, dir }
    }

    /// Storage path of the metadata record for `url`.
    pub fn record_path(&self, url: &str) -> PathBuf {
        self.dir.join(format!("{}.{RECORD_EXT}", media_key(url)))
    }

    /// Look up metadata for a file URL or path.
    pub fn lookup(&self, url: &str) -> Option<MediaMeta> {
        if normalize_path(url).is_empty() {
            return None;
        }
        let record = self.storage.read_record(&self.record_path(url))?;
        serde_json::from_value(Value::Object(record)).ok()
    }

    /// Persist metadata for a file, stamping its normalized path and the
    /// update time.
    pub fn save(&self, url: &str, meta: &MediaMeta) -> bool {
        let path = normalize_path(url);
        if path.is_empty() {
            return false;
        }

        let mut record = match serde_json::to_value(meta) {
            Ok(Value::Object(record)) => record,
            _ => Record::new(),
        };
        record.insert("path".into(), Value::String(path.clone()));
        record.insert("updated".into(), Value::String(chrono::Utc::now().to_rfc3339()));

        let saved = self.storage.write_record(&self.record_path(url), &record);
        if saved {
            log!("media"; "saved metadata for `{path}`");
        }
        saved
    }

    /// All stored metadata records, in listing order.
    pub fn list(&self) -> Vec<Record> {
        self.storage
            .list_records(self.dir)
            .iter()
            .filter_map(|path| self.storage.read_record(path))
            .collect()
    }
}
