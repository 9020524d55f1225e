//! # Transcode Subcommand
//!
//! Converts a YAML document to JSON, or a JSON document to YAML, choosing
//! the direction from the input file extension.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use guardian_core::DocumentFormat;
use guardian_schema::GuardianConfig;

/// Arguments for `guardian transcode`.
#[derive(Args, Debug)]
pub struct TranscodeArgs {
    /// Input document (`.json` becomes YAML, anything else becomes JSON).
    pub input: PathBuf,

    /// Output file (default: stdout). Parent directories are created.
    #[arg(long)]
    pub out: Option<PathBuf>,
}

/// Execute the transcode subcommand.
pub fn run_transcode(args: &TranscodeArgs, _config: &GuardianConfig) -> Result<u8> {
    let value = guardian_core::load_document(&args.input)
        .with_context(|| format!("failed to load {}", args.input.display()))?;
    let target = DocumentFormat::from_path(&args.input).opposite();
    crate::emit_document(&value, target, args.out.as_deref())?;
    tracing::debug!(input = %args.input.display(), ?target, "transcoded document");
    Ok(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn yaml_to_json_keeps_unicode() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("doc.yaml");
        std::fs::write(&input, "name: 山田\ntags: [a, b]\n").unwrap();
        let out = dir.path().join("json/doc.json");
        run_transcode(
            &TranscodeArgs {
                input,
                out: Some(out.clone()),
            },
            &GuardianConfig::default(),
        )
        .unwrap();
        let text = std::fs::read_to_string(&out).unwrap();
        assert!(text.contains("山田"));
        assert_eq!(
            serde_json::from_str::<serde_json::Value>(&text).unwrap(),
            json!({"name": "山田", "tags": ["a", "b"]})
        );
    }

    #[test]
    fn json_to_yaml() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("doc.json");
        std::fs::write(&input, r#"{"a": {"b": 1}}"#).unwrap();
        let out = dir.path().join("doc.yaml");
        run_transcode(
            &TranscodeArgs {
                input,
                out: Some(out.clone()),
            },
            &GuardianConfig::default(),
        )
        .unwrap();
        assert_eq!(guardian_core::load_document(&out).unwrap(), json!({"a": {"b": 1}}));
    }
}
