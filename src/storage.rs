//! Record storage collaborator.
//!
//! The render core never touches the filesystem directly: it reads, lists and
//! (for media metadata only) writes JSON records through [`Storage`]. Paths are
//! relative to the storage root, e.g. `collections/posts/hello.json`.
//!
//! Failures never cross this boundary. An unreadable or malformed record is
//! logged and reported as absent, so one bad file cannot abort a render pass.

use crate::log;
use parking_lot::RwLock;
use serde_json::Value;
use std::{
    collections::BTreeMap,
    fs, io,
    path::{Path, PathBuf},
};
use thiserror::Error;
use walkdir::WalkDir;

/// One JSON-structured content item.
pub type Record = serde_json::Map<String, Value>;

/// File extension of stored records.
pub const RECORD_EXT: &str = "json";

/// Errors raised inside storage implementations.
///
/// Only used internally and for logging; the [`Storage`] trait maps them to
/// "absent".
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error when accessing `{0}`")]
    Io(PathBuf, #[source] io::Error),

    #[error("malformed JSON record `{0}`")]
    Json(PathBuf, #[source] serde_json::Error),

    #[error("record `{0}` is not a JSON object")]
    NotAnObject(PathBuf),
}

/// Key/value-by-path access to JSON records.
pub trait Storage {
    /// Read one record. Missing, unreadable or malformed records are `None`.
    fn read_record(&self, path: &Path) -> Option<Record>;

    /// Write one record, returning whether it was persisted.
    fn write_record(&self, path: &Path, record: &Record) -> bool;

    /// List record paths directly inside `dir`, in stable (name) order.
    fn list_records(&self, dir: &Path) -> Vec<PathBuf>;
}

// ============================================================================
// Filesystem Storage
// ============================================================================

/// JSON records stored as `*.json` files under a root directory.
#[derive(Debug, Clone)]
pub struct FsStorage {
    root: PathBuf,
}

impl FsStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn try_read(&self, path: &Path) -> Result<Option<Record>, StorageError> {
        let full = self.root.join(path);
        let content = match fs::read_to_string(&full) {
            Ok(content) => content,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(StorageError::Io(full, err)),
        };
        match serde_json::from_str::<Value>(&content) {
            Ok(Value::Object(record)) => Ok(Some(record)),
            Ok(_) => Err(StorageError::NotAnObject(full)),
            Err(err) => Err(StorageError::Json(full, err)),
        }
    }

    fn try_write(&self, path: &Path, record: &Record) -> Result<(), StorageError> {
        let full = self.root.join(path);
        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent).map_err(|err| StorageError::Io(parent.to_path_buf(), err))?;
        }
        let json = serde_json::to_string_pretty(record)
            .map_err(|err| StorageError::Json(full.clone(), err))?;
        fs::write(&full, json).map_err(|err| StorageError::Io(full, err))
    }
}

impl Storage for FsStorage {
    fn read_record(&self, path: &Path) -> Option<Record> {
        self.try_read(path).unwrap_or_else(|err| {
            log!("storage"; "{err}");
            None
        })
    }

    fn write_record(&self, path: &Path, record: &Record) -> bool {
        match self.try_write(path, record) {
            Ok(()) => true,
            Err(err) => {
                log!("storage"; "{err}");
                false
            }
        }
    }

    fn list_records(&self, dir: &Path) -> Vec<PathBuf> {
        let full = self.root.join(dir);
        if !full.is_dir() {
            return Vec::new();
        }

        WalkDir::new(&full)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
            .into_iter()
            .filter_map(Result::ok)
            .filter(|entry| entry.file_type().is_file())
            .filter(|entry| entry.path().extension().is_some_and(|ext| ext == RECORD_EXT))
            .filter_map(|entry| entry.path().strip_prefix(&self.root).ok().map(Path::to_path_buf))
            .collect()
    }
}

// ============================================================================
// In-Memory Storage
// ============================================================================

/// Records held in memory, keyed by path.
///
/// Useful for embedding the engine over a non-file backend and for tests.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    records: RwLock<BTreeMap<PathBuf, Record>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a record, replacing any previous one at `path`.
    pub fn insert(&self, path: impl Into<PathBuf>, record: Record) {
        self.records.write().insert(path.into(), record);
    }

    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }
}

impl Storage for MemoryStorage {
    fn read_record(&self, path: &Path) -> Option<Record> {
        self.records.read().get(path).cloned()
    }

    fn write_record(&self, path: &Path, record: &Record) -> bool {
        self.insert(path, record.clone());
        true
    }

    fn list_records(&self, dir: &Path) -> Vec<PathBuf> {
        self.records
            .read()
            .keys()
            .filter(|path| path.parent() == Some(dir))
            .filter(|path| path.extension().is_some_and(|ext| ext == RECORD_EXT))
            .cloned()
            .collect()
    }
}
