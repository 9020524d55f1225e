//! # Directory Analyzer
//!
//! Walks a schema directory, loads every fragment through the
//! [`SchemaStore`], and reports what changed since the store last saw each
//! file.
//!
//! A changed file yields a `File` change and, once per scan, a `Directory`
//! change for its parent. When nothing changed, the effective schema set is
//! the full cached set for the root, so callers always get a usable set.
//! Files that fail to load are logged and left out; they never abort the
//! scan.

use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use walkdir::WalkDir;

use crate::error::SchemaError;
use crate::rule::{fragment_name, SchemaFragment};
use crate::store::{CacheEntry, SchemaStore};

/// What kind of path changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChangeKind {
    /// A fragment file was added or modified.
    File,
    /// A directory contains at least one changed fragment.
    Directory,
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File => f.write_str("File"),
            Self::Directory => f.write_str("Directory"),
        }
    }
}

/// One change-log row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Change {
    /// Change kind.
    #[serde(rename = "Type")]
    pub kind: ChangeKind,
    /// Absolute path.
    #[serde(rename = "Path")]
    pub path: PathBuf,
}

/// True when `path` ends in one of `extensions` (compared without the dot,
/// ignoring ASCII case).
pub fn has_extension(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| {
            extensions
                .iter()
                .any(|allowed| allowed.trim_start_matches('.').eq_ignore_ascii_case(ext))
        })
}

/// Change detector over a schema directory.
#[derive(Debug)]
pub struct DirectoryAnalyzer<'a> {
    store: &'a SchemaStore,
    extensions: Vec<String>,
    effective: Vec<CacheEntry>,
}

impl<'a> DirectoryAnalyzer<'a> {
    /// An analyzer loading `.yaml` fragments through `store`.
    pub fn new(store: &'a SchemaStore) -> Self {
        Self {
            store,
            extensions: vec!["yaml".to_string()],
            effective: Vec::new(),
        }
    }

    /// Replace the fragment file extensions.
    pub fn with_extensions(mut self, extensions: Vec<String>) -> Self {
        self.extensions = extensions;
        self
    }

    /// Scan `root` recursively and return the changes found.
    ///
    /// # Errors
    ///
    /// [`SchemaError::NotFound`] if `root` does not exist. Per-file
    /// failures are logged and skipped.
    pub fn scan(&mut self, root: &Path) -> Result<Vec<Change>, SchemaError> {
        let root = root.canonicalize().map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => SchemaError::NotFound {
                path: root.to_path_buf(),
            },
            _ => SchemaError::Io(e),
        })?;

        let mut changes = Vec::new();
        let mut changed_dirs = HashSet::new();
        let mut loaded = Vec::new();
        let mut failed = HashSet::new();

        for entry in WalkDir::new(&root).follow_links(true).sort_by_file_name() {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    tracing::warn!(error = %e, "walk error, skipping entry");
                    continue;
                }
            };
            if !entry.file_type().is_file() || !has_extension(entry.path(), &self.extensions) {
                continue;
            }

            let path = entry.into_path();
            let (content, changed) = match self.store.load_cached(&path) {
                Ok(loaded) => loaded,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "failed to load schema fragment");
                    self.store.invalidate(&path);
                    failed.insert(path);
                    continue;
                }
            };

            if changed {
                if let Some(dir) = path.parent() {
                    changes.push(Change {
                        kind: ChangeKind::File,
                        path: path.clone(),
                    });
                    if changed_dirs.insert(dir.to_path_buf()) {
                        changes.push(Change {
                            kind: ChangeKind::Directory,
                            path: dir.to_path_buf(),
                        });
                    }
                }
            }

            if content.is_null() {
                tracing::warn!(path = %path.display(), "schema fragment is empty");
                continue;
            }
            let timestamp = self.store.timestamp(&path).unwrap_or_default();
            loaded.push(CacheEntry {
                path,
                content,
                timestamp,
            });
        }

        self.effective = if changes.is_empty() {
            self.store
                .cached_set()
                .into_iter()
                .filter(|e| {
                    e.path.starts_with(&root)
                        && !failed.contains(&e.path)
                        && e.path.is_file()
                        && !e.content.is_null()
                })
                .collect()
        } else {
            loaded
        };
        self.effective.sort_by(|a, b| {
            a.path
                .components()
                .count()
                .cmp(&b.path.components().count())
                .then_with(|| a.path.cmp(&b.path))
        });

        tracing::info!(
            root = %root.display(),
            changes = changes.len(),
            fragments = self.effective.len(),
            "directory scan complete"
        );
        Ok(changes)
    }

    /// The schema set from the last scan, ordered shallow to deep, then by
    /// path.
    pub fn effective_schema_set(&self) -> &[CacheEntry] {
        &self.effective
    }

    /// The effective schema set as named fragments, in the same order.
    pub fn effective_fragments(&self) -> Result<Vec<SchemaFragment>, SchemaError> {
        self.effective
            .iter()
            .map(|entry| {
                let fragment = SchemaFragment::from_tree(fragment_name(&entry.path), entry.content.clone())?;
                let modified = std::time::UNIX_EPOCH
                    + std::time::Duration::from_secs_f64(entry.timestamp.max(0.0));
                Ok(fragment.with_source(entry.path.clone(), modified))
            })
            .collect()
    }

    /// Write `changes` as a `Type,Path` CSV table to `sink`.
    pub fn save_changes(changes: &[Change], sink: &Path) -> Result<(), SchemaError> {
        let to_err = |e: csv::Error| SchemaError::RecordStore {
            path: sink.to_path_buf(),
            reason: e.to_string(),
        };
        let mut writer = csv::Writer::from_path(sink).map_err(to_err)?;
        if changes.is_empty() {
            writer.write_record(["Type", "Path"]).map_err(to_err)?;
        }
        for change in changes {
            writer.serialize(change).map_err(to_err)?;
        }
        writer.flush()?;
        tracing::debug!(path = %sink.display(), count = changes.len(), "change log written");
        Ok(())
    }

    /// Flush the store's cache to the record store at `path`.
    pub fn persist_cache(&self, path: &Path) -> Result<usize, SchemaError> {
        self.store.persist(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::time::{Duration, UNIX_EPOCH};

    fn write(path: &Path, text: &str, secs: u64) {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(path, text).unwrap();
        File::options()
            .write(true)
            .open(path)
            .unwrap()
            .set_modified(UNIX_EPOCH + Duration::from_secs(secs))
            .unwrap();
    }

    fn fixture() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        write(&dir.path().join("base.yaml"), "root_element:\n  - name: a\n", 100);
        write(&dir.path().join("page1/p.yaml"), "root_element:\n  - name: b\n", 100);
        write(&dir.path().join("page1/q.yaml"), "root_element:\n  - name: c\n", 100);
        write(&dir.path().join("page1/notes.txt"), "ignored", 100);
        dir
    }

    #[test]
    fn first_scan_reports_files_and_parents_once() {
        let dir = fixture();
        let store = SchemaStore::new();
        let mut analyzer = DirectoryAnalyzer::new(&store);
        let changes = analyzer.scan(dir.path()).unwrap();

        let files = changes.iter().filter(|c| c.kind == ChangeKind::File).count();
        let dirs: Vec<&Change> = changes.iter().filter(|c| c.kind == ChangeKind::Directory).collect();
        assert_eq!(files, 3);
        assert_eq!(dirs.len(), 2);
        assert_eq!(analyzer.effective_schema_set().len(), 3);
    }

    #[test]
    fn unchanged_rescan_returns_full_cached_set() {
        let dir = fixture();
        let store = SchemaStore::new();
        let mut analyzer = DirectoryAnalyzer::new(&store);
        analyzer.scan(dir.path()).unwrap();

        let changes = analyzer.scan(dir.path()).unwrap();
        assert!(changes.is_empty());
        assert_eq!(analyzer.effective_schema_set().len(), 3);
    }

    #[test]
    fn modified_file_is_the_only_change() {
        let dir = fixture();
        let store = SchemaStore::new();
        let mut analyzer = DirectoryAnalyzer::new(&store);
        analyzer.scan(dir.path()).unwrap();

        let target = dir.path().join("page1/q.yaml");
        write(&target, "root_element:\n  - name: d\n", 200);
        let changes = analyzer.scan(dir.path()).unwrap();
        assert_eq!(changes.len(), 2);
        assert_eq!(changes[0].kind, ChangeKind::File);
        assert!(changes[0].path.ends_with("page1/q.yaml"));
        assert_eq!(changes[1].kind, ChangeKind::Directory);
        assert!(changes[1].path.ends_with("page1"));
        assert_eq!(analyzer.effective_schema_set().len(), 3);
    }

    #[test]
    fn broken_file_is_skipped() {
        let dir = fixture();
        write(&dir.path().join("page1/broken.yaml"), "a: [1,\n", 100);
        let store = SchemaStore::new();
        let mut analyzer = DirectoryAnalyzer::new(&store);
        analyzer.scan(dir.path()).unwrap();
        assert_eq!(analyzer.effective_schema_set().len(), 3);
    }

    #[test]
    fn fragment_broken_after_caching_leaves_the_set() {
        let dir = fixture();
        let store = SchemaStore::new();
        let mut analyzer = DirectoryAnalyzer::new(&store);
        analyzer.scan(dir.path()).unwrap();
        assert_eq!(analyzer.effective_schema_set().len(), 3);

        let broken = dir.path().join("base.yaml").canonicalize().unwrap();
        write(&broken, "root_element: [\n", 500);
        let changes = analyzer.scan(dir.path()).unwrap();
        assert!(changes.is_empty());
        let paths: Vec<&Path> = analyzer.effective_schema_set().iter().map(|e| e.path.as_path()).collect();
        assert_eq!(paths.len(), 2);
        assert!(!paths.contains(&broken.as_path()));
        assert!(store.timestamp(&broken).is_none());

        write(&broken, "root_element: []\n", 600);
        let changes = analyzer.scan(dir.path()).unwrap();
        assert!(changes.iter().any(|c| c.kind == ChangeKind::File && c.path == broken));
        assert_eq!(analyzer.effective_schema_set().len(), 3);
    }

    #[test]
    fn effective_set_orders_shallow_to_deep() {
        let dir = fixture();
        let store = SchemaStore::new();
        let mut analyzer = DirectoryAnalyzer::new(&store);
        analyzer.scan(dir.path()).unwrap();
        let names: Vec<String> = analyzer
            .effective_fragments()
            .unwrap()
            .into_iter()
            .map(|f| f.name)
            .collect();
        assert_eq!(names, vec!["base", "p", "q"]);
    }

    #[test]
    fn extensions_are_configurable() {
        let dir = fixture();
        write(&dir.path().join("extra.yml"), "root_element: []\n", 100);
        let store = SchemaStore::new();
        let mut analyzer =
            DirectoryAnalyzer::new(&store).with_extensions(vec!["yaml".into(), "yml".into()]);
        analyzer.scan(dir.path()).unwrap();
        assert_eq!(analyzer.effective_schema_set().len(), 4);
    }

    #[test]
    fn missing_root_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = SchemaStore::new();
        let err = DirectoryAnalyzer::new(&store)
            .scan(&dir.path().join("nope"))
            .unwrap_err();
        assert!(matches!(err, SchemaError::NotFound { .. }));
    }

    #[test]
    fn change_log_csv_layout() {
        let dir = tempfile::tempdir().unwrap();
        let sink = dir.path().join("changes.csv");
        let changes = vec![
            Change {
                kind: ChangeKind::File,
                path: PathBuf::from("/r/a.yaml"),
            },
            Change {
                kind: ChangeKind::Directory,
                path: PathBuf::from("/r"),
            },
        ];
        DirectoryAnalyzer::save_changes(&changes, &sink).unwrap();
        let text = std::fs::read_to_string(&sink).unwrap();
        assert_eq!(text, "Type,Path\nFile,/r/a.yaml\nDirectory,/r\n");

        DirectoryAnalyzer::save_changes(&[], &sink).unwrap();
        assert_eq!(std::fs::read_to_string(&sink).unwrap(), "Type,Path\n");
    }

    #[test]
    fn cache_persists_across_analyzers() {
        let dir = fixture();
        let cache = dir.path().join("cache.csv");
        {
            let store = SchemaStore::new();
            let mut analyzer = DirectoryAnalyzer::new(&store);
            analyzer.scan(dir.path()).unwrap();
            assert_eq!(analyzer.persist_cache(&cache).unwrap(), 3);
        }
        let store = SchemaStore::new();
        store.restore(&cache).unwrap();
        let mut analyzer = DirectoryAnalyzer::new(&store);
        assert!(analyzer.scan(dir.path()).unwrap().is_empty());
        assert_eq!(analyzer.effective_schema_set().len(), 3);
    }
}
