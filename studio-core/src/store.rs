//! Content gallery store
//!
//! Persists [`ContentRecord`]s as a single pretty-printed JSON array on disk.
//! Every operation reads the whole file; every mutation rewrites it. There is no
//! index, so lookups, filters and searches are linear scans in insertion order.
//!
//! Mutations (`save`, `delete`) hold an in-process write lock for the whole
//! read-modify-write cycle, and replace the file by renaming a fully written
//! sibling temp file, so readers never observe a partial document. Nothing
//! coordinates *other processes* writing the same file: two such writers race
//! and the later rename wins.
//!
//! A file that is not a JSON array is read as an empty gallery (and a warning
//! is logged). The next `save` then overwrites the unreadable contents. Inside
//! a valid array, entries that do not parse as records are skipped on read but
//! written back untouched, as are unknown fields of readable entries.

use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::Value;
use tempfile::NamedTempFile;
use thiserror::Error;

use crate::models::{ContentRecord, Metadata};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Handle to the content file. Clones share the same write lock.
#[derive(Debug, Clone)]
pub struct ContentStore {
    path: PathBuf,
    write_lock: Arc<Mutex<()>>,
}

impl ContentStore {
    /// Open the store at `path`, creating the parent directory and an empty
    /// `[]` file when they are missing.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let store = Self {
            path: path.into(),
            write_lock: Arc::new(Mutex::new(())),
        };
        store.ensure_ready()?;
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Idempotent: never truncates an existing file.
    pub fn ensure_ready(&self) -> Result<(), StoreError> {
        fs::create_dir_all(self.dir())?;

        match OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&self.path)
        {
            Ok(mut file) => {
                file.write_all(b"[]")?;
                tracing::info!(path = %self.path.display(), "Created empty content store");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Append a new record and return its id.
    pub fn save(
        &self,
        content_type: &str,
        title: &str,
        content: &str,
        metadata: Option<Metadata>,
    ) -> Result<String, StoreError> {
        let _guard = self.write_lock.lock();

        let mut entries = self.load_entries()?;
        let record = ContentRecord::new(content_type, title, content, metadata);
        let id = record.id.clone();
        entries.push(serde_json::to_value(&record)?);
        self.persist(&entries)?;

        tracing::debug!(id = %id, content_type, total = entries.len(), "Saved content record");
        Ok(id)
    }

    pub fn get(&self, id: &str) -> Result<Option<ContentRecord>, StoreError> {
        Ok(self.load()?.into_iter().find(|r| r.id == id))
    }

    /// All records, or only those whose type equals `content_type`. An empty
    /// filter is treated as no filter.
    pub fn list(&self, content_type: Option<&str>) -> Result<Vec<ContentRecord>, StoreError> {
        let records = self.load()?;
        match content_type.filter(|t| !t.is_empty()) {
            Some(t) => Ok(records.into_iter().filter(|r| r.content_type == t).collect()),
            None => Ok(records),
        }
    }

    /// Returns `false` (and leaves the file untouched) when no record has `id`.
    pub fn delete(&self, id: &str) -> Result<bool, StoreError> {
        let _guard = self.write_lock.lock();

        let mut entries = self.load_entries()?;
        let before = entries.len();
        entries.retain(|e| e.get("id").and_then(Value::as_str) != Some(id));

        if entries.len() == before {
            return Ok(false);
        }

        self.persist(&entries)?;
        tracing::debug!(id = %id, remaining = entries.len(), "Deleted content record");
        Ok(true)
    }

    /// Case-insensitive substring match against title or content.
    pub fn search(&self, query: &str) -> Result<Vec<ContentRecord>, StoreError> {
        let query_lower = query.to_lowercase();
        Ok(self
            .load()?
            .into_iter()
            .filter(|r| r.matches(&query_lower))
            .collect())
    }

    fn dir(&self) -> &Path {
        match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        }
    }

    fn load(&self) -> Result<Vec<ContentRecord>, StoreError> {
        Ok(self
            .load_entries()?
            .into_iter()
            .filter_map(|entry| match serde_json::from_value::<ContentRecord>(entry) {
                Ok(record) => Some(record),
                Err(e) => {
                    tracing::warn!(
                        path = %self.path.display(),
                        error = %e,
                        "Skipping unreadable content record"
                    );
                    None
                }
            })
            .collect())
    }

    /// The stored array as raw JSON values, readable or not.
    fn load_entries(&self) -> Result<Vec<Value>, StoreError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        match serde_json::from_str(&raw) {
            Ok(entries) => Ok(entries),
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "Content store is not a JSON array; reading it as empty"
                );
                Ok(Vec::new())
            }
        }
    }

    fn persist(&self, entries: &[Value]) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec_pretty(entries)?;

        let mut tmp = NamedTempFile::new_in(self.dir())?;
        tmp.write_all(&bytes)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| e.error)?;
        Ok(())
    }
}
