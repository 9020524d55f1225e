//! # Scan Subcommand
//!
//! Restores the schema cache, scans a schema directory for changes, writes
//! the change log and persists the refreshed cache. Running `scan` twice in
//! a row with no edits in between reports no changes the second time.

use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use guardian_schema::{ChangeKind, DirectoryAnalyzer, GuardianConfig, SchemaStore};

/// Arguments for `guardian scan`.
#[derive(Args, Debug)]
pub struct ScanArgs {
    /// Schema directory root.
    pub root: PathBuf,

    /// Change-log file (default: the configured `changes_file`).
    #[arg(long)]
    pub changes: Option<PathBuf>,

    /// Cache record store (default: the configured `cache_file`).
    #[arg(long)]
    pub cache: Option<PathBuf>,
}

/// Execute the scan subcommand, printing the summary to stdout.
pub fn run_scan(args: &ScanArgs, config: &GuardianConfig) -> Result<u8> {
    let mut stdout = std::io::stdout().lock();
    scan_to(args, config, &mut stdout)
}

/// Execute the scan subcommand, writing the summary to `out`.
pub fn scan_to(args: &ScanArgs, config: &GuardianConfig, out: &mut dyn Write) -> Result<u8> {
    let cache = args.cache.as_ref().unwrap_or(&config.cache_file);
    let changes_file = args.changes.as_ref().unwrap_or(&config.changes_file);

    let store = SchemaStore::new();
    let restored = store
        .restore(cache)
        .with_context(|| format!("failed to restore cache {}", cache.display()))?;
    tracing::debug!(cache = %cache.display(), restored, "cache restored");

    let mut analyzer = DirectoryAnalyzer::new(&store).with_extensions(config.schema_extensions.clone());
    let changes = analyzer
        .scan(&args.root)
        .with_context(|| format!("failed to scan {}", args.root.display()))?;
    DirectoryAnalyzer::save_changes(&changes, changes_file)
        .with_context(|| format!("failed to write change log {}", changes_file.display()))?;
    let persisted = analyzer
        .persist_cache(cache)
        .with_context(|| format!("failed to persist cache {}", cache.display()))?;

    let files = changes.iter().filter(|c| c.kind == ChangeKind::File).count();
    let dirs = changes.len() - files;
    tracing::info!(root = %args.root.display(), files, dirs, "scan complete");

    writeln!(out, "Scanned {}", args.root.display())?;
    writeln!(out, "Changed files: {files}, changed directories: {dirs}")?;
    writeln!(out, "Effective schema set: {} fragment(s)", analyzer.effective_schema_set().len())?;
    writeln!(out, "Changes saved to {}", changes_file.display())?;
    writeln!(out, "Cache saved to {} ({persisted} entries)", cache.display())?;
    writeln!(out, "Timestamp: {}", chrono::Local::now().format("%Y-%m-%d %H:%M:%S"))?;
    Ok(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_scan_reports_no_changes() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("rule_config");
        std::fs::create_dir_all(root.join("page1")).unwrap();
        std::fs::write(root.join("base.yaml"), "root_element: []\n").unwrap();
        std::fs::write(root.join("page1/page.yaml"), "root_element: []\n").unwrap();

        let args = ScanArgs {
            root,
            changes: Some(dir.path().join("changes.csv")),
            cache: Some(dir.path().join("cache.csv")),
        };
        let mut out = Vec::new();
        assert_eq!(scan_to(&args, &GuardianConfig::default(), &mut out).unwrap(), 0);
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Changed files: 2, changed directories: 2"), "{text}");
        assert!(text.lines().any(|l| l.starts_with("Timestamp: ")));
        let log = std::fs::read_to_string(dir.path().join("changes.csv")).unwrap();
        assert_eq!(log.lines().count(), 5);

        let mut out = Vec::new();
        scan_to(&args, &GuardianConfig::default(), &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Changed files: 0, changed directories: 0"), "{text}");
        assert!(text.contains("Effective schema set: 2 fragment(s)"));
        let log = std::fs::read_to_string(dir.path().join("changes.csv")).unwrap();
        assert_eq!(log, "Type,Path\n");
    }

    #[test]
    fn missing_root_fails() {
        let dir = tempfile::tempdir().unwrap();
        let args = ScanArgs {
            root: dir.path().join("absent"),
            changes: Some(dir.path().join("changes.csv")),
            cache: Some(dir.path().join("cache.csv")),
        };
        let mut out = Vec::new();
        assert!(scan_to(&args, &GuardianConfig::default(), &mut out).is_err());
    }
}
