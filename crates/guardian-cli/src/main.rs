//! # guardian CLI entry point
//!
//! Parses command-line arguments and dispatches to subcommand handlers.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use guardian_cli::convert::{run_convert, ConvertArgs};
use guardian_cli::merge::{run_merge, MergeArgs};
use guardian_cli::scan::{run_scan, ScanArgs};
use guardian_cli::transcode::{run_transcode, TranscodeArgs};
use guardian_cli::validate::{run_validate, ValidateArgs};

/// Exit code for operational failures (unreadable input, bad schema,
/// unwritable output), distinct from a validation failure.
const EXIT_ERROR: u8 = 2;

/// Schema composition and validation toolkit.
///
/// Validates YAML/JSON documents against rule-form schemas assembled from a
/// directory hierarchy, converts them to JSON Schema, and tracks schema
/// directory changes.
#[derive(Parser, Debug)]
#[command(name = "guardian", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to configuration file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Validate data documents against a schema file or directory.
    Validate(ValidateArgs),

    /// Convert schema fragments into one dereferenced JSON Schema.
    Convert(ConvertArgs),

    /// Deep-merge schema fragments in argument order.
    Merge(MergeArgs),

    /// Detect schema directory changes and persist the schema cache.
    Scan(ScanArgs),

    /// Convert a document between YAML and JSON.
    Transcode(TranscodeArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    tracing::debug!("guardian CLI starting");

    let config = match guardian_cli::load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("{e:#}");
            return ExitCode::from(EXIT_ERROR);
        }
    };

    let result = match cli.command {
        Commands::Validate(args) => run_validate(&args, &config),
        Commands::Convert(args) => run_convert(&args, &config),
        Commands::Merge(args) => run_merge(&args, &config),
        Commands::Scan(args) => run_scan(&args, &config),
        Commands::Transcode(args) => run_transcode(&args, &config),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(EXIT_ERROR)
        }
    }
}
