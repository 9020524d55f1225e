//! # Convert Subcommand
//!
//! Converts a schema fragment, or every fragment under a schema directory,
//! into a single dereferenced constraint schema. Each fragment becomes one
//! top-level property named after its file stem.

use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use guardian_core::DocumentFormat;
use guardian_schema::rule::fragment_name;
use guardian_schema::{merge_and_resolve, DirectoryAnalyzer, GuardianConfig, InferOptions, SchemaStore};
use serde_json::Value;

/// Arguments for `guardian convert`.
#[derive(Args, Debug)]
pub struct ConvertArgs {
    /// Schema fragment file or schema directory.
    pub schema: PathBuf,

    /// Output file (default: stdout).
    #[arg(long)]
    pub out: Option<PathBuf>,
}

/// Execute the convert subcommand.
pub fn run_convert(args: &ConvertArgs, config: &GuardianConfig) -> Result<u8> {
    let store = SchemaStore::new();
    let fragments = collect_fragments(&store, args, config)?;
    let options = InferOptions {
        require_all: config.require_all_inferred,
    };
    let title = fragment_name(&args.schema);
    let schema = merge_and_resolve(&title, &fragments, options)
        .with_context(|| format!("failed to convert {}", args.schema.display()))?;

    crate::emit_document(schema.as_value(), DocumentFormat::Json, args.out.as_deref())?;
    tracing::info!(schema = %title, fragments = fragments.len(), "converted schema");
    Ok(0)
}

fn collect_fragments(
    store: &SchemaStore,
    args: &ConvertArgs,
    config: &GuardianConfig,
) -> Result<BTreeMap<String, Value>> {
    let mut fragments = BTreeMap::new();
    if !args.schema.is_dir() {
        let fragment = store
            .load(&args.schema)
            .with_context(|| format!("failed to load {}", args.schema.display()))?;
        fragments.insert(fragment.name, fragment.tree);
        return Ok(fragments);
    }

    let mut analyzer = DirectoryAnalyzer::new(store)
        .with_extensions(config.schema_extensions.clone());
    analyzer
        .scan(&args.schema)
        .with_context(|| format!("failed to scan {}", args.schema.display()))?;
    for fragment in analyzer.effective_fragments()? {
        if fragments.contains_key(&fragment.name) {
            tracing::warn!(name = %fragment.name, "duplicate fragment name; deeper fragment replaces earlier one");
        }
        fragments.insert(fragment.name, fragment.tree);
    }
    Ok(fragments)
}
