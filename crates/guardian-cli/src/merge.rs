//! # Merge Subcommand
//!
//! Deep-merges schema fragments in argument order (later files override
//! earlier ones, sequences concatenate) and renders the result as YAML.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use guardian_core::DocumentFormat;
use guardian_schema::merge::merge;
use guardian_schema::GuardianConfig;

/// Arguments for `guardian merge`.
#[derive(Args, Debug)]
pub struct MergeArgs {
    /// Fragments to merge, shallowest first.
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Output file (default: stdout).
    #[arg(long)]
    pub out: Option<PathBuf>,
}

/// Execute the merge subcommand.
pub fn run_merge(args: &MergeArgs, _config: &GuardianConfig) -> Result<u8> {
    let trees = args
        .files
        .iter()
        .map(|file| {
            guardian_core::load_document(file)
                .with_context(|| format!("failed to load {}", file.display()))
        })
        .collect::<Result<Vec<_>>>()?;
    let merged = merge(&trees);
    crate::emit_document(&merged, DocumentFormat::Yaml, args.out.as_deref())?;
    tracing::debug!(files = trees.len(), "merged fragments");
    Ok(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn later_files_override_and_lists_concatenate() {
        let dir = tempfile::tempdir().unwrap();
        let parent = dir.path().join("parent.yaml");
        let child = dir.path().join("child.yaml");
        std::fs::write(&parent, "a: 1\nnested: {x: 1, y: 1}\nlist: [p]\n").unwrap();
        std::fs::write(&child, "nested: {y: 2}\nlist: [c]\n").unwrap();
        let out = dir.path().join("merged.yaml");

        let args = MergeArgs {
            files: vec![parent, child],
            out: Some(out.clone()),
        };
        assert_eq!(run_merge(&args, &GuardianConfig::default()).unwrap(), 0);
        let merged = guardian_core::load_document(&out).unwrap();
        assert_eq!(
            merged,
            json!({"a": 1, "nested": {"x": 1, "y": 2}, "list": ["p", "c"]})
        );
    }

    #[test]
    fn missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let args = MergeArgs {
            files: vec![dir.path().join("absent.yaml")],
            out: None,
        };
        let err = run_merge(&args, &GuardianConfig::default()).unwrap_err();
        assert!(format!("{err:#}").contains("absent.yaml"));
    }
}
