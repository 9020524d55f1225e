//! # Schema Store
//!
//! Reads schema fragments from disk behind a modification-time cache.
//!
//! A path is re-read only when its on-disk modification time is strictly
//! newer than the cached timestamp. The cache can be written to and
//! restored from a CSV record store with the columns `Path`, `Content`
//! (the fragment serialized as YAML) and `Timestamp` (seconds since the
//! Unix epoch).
//!
//! ## Concurrency
//!
//! The whole check-read-update sequence for a path runs under one lock, so
//! a stale read can never overwrite a concurrent refresh. Hosting processes
//! that run several validation contexts may share a store through `Arc`.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use guardian_core::{load_document, parse_document, to_yaml_string, DocumentFormat};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::SchemaError;
use crate::rule::{fragment_name, SchemaFragment};

/// A cached fragment.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    /// Cache key.
    pub path: PathBuf,
    /// Parsed content at the time of the last read.
    pub content: Value,
    /// Modification time of the file at the last read, in epoch seconds.
    pub timestamp: f64,
}

/// Row of the cache record store.
#[derive(Debug, Serialize, Deserialize)]
struct CacheRecord {
    #[serde(rename = "Path")]
    path: String,
    #[serde(rename = "Content")]
    content: String,
    #[serde(rename = "Timestamp")]
    timestamp: f64,
}

/// Fragment loader with a modification-time cache.
#[derive(Debug, Default)]
pub struct SchemaStore {
    entries: Mutex<HashMap<PathBuf, CacheEntry>>,
}

impl SchemaStore {
    /// An empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load `path` as a named fragment, going through the cache.
    pub fn load(&self, path: &Path) -> Result<SchemaFragment, SchemaError> {
        let (entry, _) = self.refresh(path)?;
        let modified = UNIX_EPOCH + Duration::from_secs_f64(entry.timestamp.max(0.0));
        Ok(SchemaFragment::from_tree(fragment_name(path), entry.content)?.with_source(path, modified))
    }

    /// Load the content of `path`, reporting whether it was (re)read from
    /// disk.
    ///
    /// # Errors
    ///
    /// [`SchemaError::NotFound`] for a missing path and
    /// [`SchemaError::Parse`] for malformed content. A failed read leaves
    /// any existing cache entry untouched.
    pub fn load_cached(&self, path: &Path) -> Result<(Value, bool), SchemaError> {
        let (entry, changed) = self.refresh(path)?;
        Ok((entry.content, changed))
    }

    fn refresh(&self, path: &Path) -> Result<(CacheEntry, bool), SchemaError> {
        let mut entries = self.entries.lock();
        let current = modified_secs(path)?;

        if let Some(entry) = entries.get(path) {
            if current <= entry.timestamp {
                tracing::debug!(path = %path.display(), "schema cache hit");
                return Ok((entry.clone(), false));
            }
        }

        let content = load_document(path).map_err(|e| SchemaError::from_document(path, e))?;
        let entry = CacheEntry {
            path: path.to_path_buf(),
            content,
            timestamp: current,
        };
        tracing::debug!(path = %path.display(), timestamp = current, "schema cache refreshed");
        entries.insert(path.to_path_buf(), entry.clone());
        Ok((entry, true))
    }

    /// The cached timestamp of `path`, if cached.
    pub fn timestamp(&self, path: &Path) -> Option<f64> {
        self.entries.lock().get(path).map(|e| e.timestamp)
    }

    /// Every cached entry, ordered by path.
    pub fn cached_set(&self) -> Vec<CacheEntry> {
        let mut entries: Vec<CacheEntry> = self.entries.lock().values().cloned().collect();
        entries.sort_by(|a, b| a.path.cmp(&b.path));
        entries
    }

    /// Drop the entry for `path`.
    pub fn invalidate(&self, path: &Path) -> bool {
        self.entries.lock().remove(path).is_some()
    }

    /// Number of cached entries.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// True when nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Write every entry to the CSV record store at `path`.
    pub fn persist(&self, path: &Path) -> Result<usize, SchemaError> {
        let entries = self.cached_set();
        let mut writer = csv::Writer::from_path(path).map_err(|e| store_err(path, e))?;
        for entry in &entries {
            let content = to_yaml_string(&entry.content).map_err(|e| SchemaError::RecordStore {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;
            writer
                .serialize(CacheRecord {
                    path: entry.path.display().to_string(),
                    content,
                    timestamp: entry.timestamp,
                })
                .map_err(|e| store_err(path, e))?;
        }
        writer.flush()?;
        tracing::info!(path = %path.display(), count = entries.len(), "schema cache persisted");
        Ok(entries.len())
    }

    /// Load entries from the CSV record store at `path`, replacing cached
    /// entries with the same key. A missing record store restores nothing.
    pub fn restore(&self, path: &Path) -> Result<usize, SchemaError> {
        if !path.exists() {
            return Ok(0);
        }
        let mut reader = csv::Reader::from_path(path).map_err(|e| store_err(path, e))?;
        let mut restored = Vec::new();
        for record in reader.deserialize::<CacheRecord>() {
            let record = record.map_err(|e| store_err(path, e))?;
            let content = parse_document(&record.content, DocumentFormat::Yaml).map_err(|e| {
                SchemaError::RecordStore {
                    path: path.to_path_buf(),
                    reason: format!("cached content for {}: {e}", record.path),
                }
            })?;
            restored.push(CacheEntry {
                path: PathBuf::from(record.path),
                content,
                timestamp: record.timestamp,
            });
        }

        let count = restored.len();
        let mut entries = self.entries.lock();
        for entry in restored {
            entries.insert(entry.path.clone(), entry);
        }
        tracing::debug!(path = %path.display(), count, "schema cache restored");
        Ok(count)
    }
}

fn modified_secs(path: &Path) -> Result<f64, SchemaError> {
    let metadata = match std::fs::metadata(path) {
        Ok(m) => m,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(SchemaError::NotFound {
                path: path.to_path_buf(),
            })
        }
        Err(e) => return Err(e.into()),
    };
    Ok(epoch_secs(metadata.modified()?))
}

/// Seconds since the Unix epoch; times before the epoch clamp to zero.
pub fn epoch_secs(time: SystemTime) -> f64 {
    time.duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}

fn store_err(path: &Path, err: csv::Error) -> SchemaError {
    SchemaError::RecordStore {
        path: path.to_path_buf(),
        reason: err.to_string(),
    }
}
