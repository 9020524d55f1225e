//! # Validate Subcommand
//!
//! Validates one data document, or every data document in a directory,
//! against a schema file or schema directory.
//!
//! Output is `Validation succeeded.` or `Validation failed with the
//! following errors:` followed by one `path: message` line per error. When
//! several documents are validated, each line is prefixed with the document.

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use guardian_schema::{GuardianConfig, ValidationContext, ValidationMode, ValidationOutcome};

/// Success line.
pub const SUCCESS_MESSAGE: &str = "Validation succeeded.";
/// Header printed before the error lines.
pub const FAILURE_HEADER: &str = "Validation failed with the following errors:";

/// Arguments for `guardian validate`.
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Data document, or a directory of data documents.
    pub data: PathBuf,

    /// Schema fragment file or schema directory.
    #[arg(default_value = "rule_config")]
    pub schema: PathBuf,

    /// Common-definitions document (overrides the configured one).
    #[arg(long)]
    pub common: Option<PathBuf>,

    /// Validation mode; repeat to run several in order.
    #[arg(long = "mode", value_enum)]
    pub modes: Vec<ModeArg>,
}

/// Command-line spelling of a validation mode.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeArg {
    Rules,
    Constraint,
}

impl From<ModeArg> for ValidationMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Rules => ValidationMode::Rules,
            ModeArg::Constraint => ValidationMode::Constraint,
        }
    }
}

/// Execute the validate subcommand, printing to stdout.
///
/// Returns 0 when every document passes and 1 when any fails.
pub fn run_validate(args: &ValidateArgs, config: &GuardianConfig) -> Result<u8> {
    let mut stdout = std::io::stdout().lock();
    validate_to(args, config, &mut stdout)
}

/// Execute the validate subcommand, writing the report to `out`.
pub fn validate_to(args: &ValidateArgs, config: &GuardianConfig, out: &mut dyn Write) -> Result<u8> {
    let modes: Vec<ValidationMode> = args.modes.iter().map(|&m| m.into()).collect();
    let mut ctx = ValidationContext::from_config(config.clone())
        .context("failed to build validation context")?
        .with_modes(modes);
    if let Some(common) = &args.common {
        ctx.load_common_definitions(common)
            .with_context(|| format!("failed to load common definitions {}", common.display()))?;
    }

    let schema = ctx
        .load_schema(&args.schema)
        .with_context(|| format!("failed to load schema {}", args.schema.display()))?;
    let files = crate::data_files(&args.data)?;
    let prefixed = files.len() > 1;

    let mut lines = Vec::new();
    for file in &files {
        let data = guardian_core::load_document(file)
            .with_context(|| format!("failed to load data {}", file.display()))?;
        let outcome = ctx
            .validate(&schema, &data)
            .with_context(|| format!("failed to validate {}", file.display()))?;
        if let ValidationOutcome::Failed { mode, report } = outcome {
            tracing::info!(file = %file.display(), %mode, errors = report.len(), "document failed validation");
            lines.extend(report.errors().iter().map(|e| error_line(file, &e.to_string(), prefixed)));
        } else {
            tracing::info!(file = %file.display(), "document passed validation");
        }
    }

    if lines.is_empty() {
        writeln!(out, "{SUCCESS_MESSAGE}")?;
        Ok(0)
    } else {
        writeln!(out, "{FAILURE_HEADER}")?;
        writeln!(out, "{}", lines.join("\n"))?;
        Ok(1)
    }
}

fn error_line(file: &Path, line: &str, prefixed: bool) -> String {
    if prefixed {
        format!("{}: {line}", file.display())
    } else {
        line.to_string()
    }
}
