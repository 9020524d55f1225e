//! # guardian-cli: Command-Line Interface
//!
//! Provides the `guardian` command-line interface over the schema engine.
//!
//! ## Subcommands
//!
//! - `guardian validate`: Validate data documents against a schema file or
//!   schema directory.
//! - `guardian convert`: Infer a constraint schema from rule fragments.
//! - `guardian merge`: Deep-merge fragments in argument order.
//! - `guardian scan`: Detect schema directory changes and persist the cache.
//! - `guardian transcode`: YAML to JSON and back.
//!
//! ```bash
//! guardian validate sample_data/applicant.yaml rule_config
//! guardian validate sample_data --mode constraint
//! guardian convert rule_config --out schema/schema.json
//! guardian scan rule_config --changes changes.csv
//! ```

pub mod convert;
pub mod merge;
pub mod scan;
pub mod transcode;
pub mod validate;

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use guardian_core::{to_json_string, to_yaml_string, write_document, DocumentFormat};
use guardian_schema::GuardianConfig;
use serde_json::Value;

/// Extensions recognised as data documents when a directory is validated.
pub const DATA_EXTENSIONS: &[&str] = &["yaml", "yml", "json"];

/// Load the configuration named by `--config`, or the defaults.
pub fn load_config(path: Option<&Path>) -> Result<GuardianConfig> {
    match path {
        Some(path) => GuardianConfig::from_file(path)
            .with_context(|| format!("failed to load configuration {}", path.display())),
        None => Ok(GuardianConfig::default()),
    }
}

/// Expand a data path into the documents to validate.
///
/// A file is returned as-is; a directory yields its data documents (not
/// recursive), sorted by path.
pub fn data_files(path: &Path) -> Result<Vec<PathBuf>> {
    if !path.exists() {
        anyhow::bail!("data path not found: {}", path.display());
    }
    if !path.is_dir() {
        return Ok(vec![path.to_path_buf()]);
    }
    let mut files = Vec::new();
    let entries = std::fs::read_dir(path)
        .with_context(|| format!("failed to read directory {}", path.display()))?;
    for entry in entries {
        let file = entry?.path();
        let is_data = file.is_file()
            && file
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|ext| DATA_EXTENSIONS.iter().any(|d| ext.eq_ignore_ascii_case(d)));
        if is_data {
            files.push(file);
        }
    }
    if files.is_empty() {
        anyhow::bail!("no data documents found in {}", path.display());
    }
    files.sort();
    Ok(files)
}

/// Render `value` in `format` to `out`, or to stdout when no path is given.
pub fn emit_document(value: &Value, format: DocumentFormat, out: Option<&Path>) -> Result<()> {
    match out {
        Some(path) => {
            write_document(path, value, format)
                .with_context(|| format!("failed to write {}", path.display()))?;
            tracing::info!(path = %path.display(), "wrote output");
        }
        None => {
            let text = match format {
                DocumentFormat::Json => to_json_string(value)?,
                DocumentFormat::Yaml => to_yaml_string(value)?,
            };
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(text.as_bytes())?;
            if !text.ends_with('\n') {
                stdout.write_all(b"\n")?;
            }
        }
    }
    Ok(())
}
