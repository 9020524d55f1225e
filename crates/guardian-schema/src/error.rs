//! # Schema Errors
//!
//! Structural and configuration failures of the schema engine. Data that
//! fails validation is not an error: it produces a
//! [`ValidationReport`](crate::report::ValidationReport). Everything here
//! describes a schema, cache, or file that the engine could not work with.

use std::path::PathBuf;

use guardian_core::DocumentError;
use thiserror::Error;

/// Errors raised by the schema engine.
#[derive(Error, Debug)]
pub enum SchemaError {
    /// A schema, data, or common-definitions file does not exist.
    #[error("file not found: {}", path.display())]
    NotFound {
        /// The missing path.
        path: PathBuf,
    },

    /// A document could not be parsed.
    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        /// The document path (or `<inline>`).
        path: PathBuf,
        /// The underlying document error.
        #[source]
        source: DocumentError,
    },

    /// A fragment parsed, but its structure is not a valid rule schema.
    #[error("invalid schema fragment '{name}': {reason}")]
    InvalidFragment {
        /// Fragment name or field path.
        name: String,
        /// What is wrong with it.
        reason: String,
    },

    /// A field rule is marked both required and prohibited.
    #[error("field '{field}' is marked both required and prohibited")]
    ConflictingRule {
        /// Dot-delimited path of the offending rule.
        field: String,
    },

    /// A field rule names a predicate that is not registered.
    #[error("field '{field}' references unknown predicate '{predicate}'")]
    UnknownPredicate {
        /// Dot-delimited path of the offending rule.
        field: String,
        /// The unregistered predicate identifier.
        predicate: String,
    },

    /// Dereferencing found a reference cycle.
    #[error("circular reference: {}", chain.join(" -> "))]
    CircularReference {
        /// The references on the cycle, in visiting order, ending with the
        /// reference that closed the loop.
        chain: Vec<String>,
    },

    /// A `$ref` pointer does not resolve within the document.
    #[error("unresolved reference: {reference}")]
    UnresolvedReference {
        /// The pointer that could not be resolved.
        reference: String,
    },

    /// A constraint schema could not be compiled into a validator.
    #[error("failed to compile constraint schema '{name}': {reason}")]
    ConstraintCompile {
        /// Schema title.
        name: String,
        /// Compiler message.
        reason: String,
    },

    /// A record store (cache or change log) could not be read or written.
    #[error("record store {} failed: {reason}", path.display())]
    RecordStore {
        /// Path of the record store file.
        path: PathBuf,
        /// Human-readable reason.
        reason: String,
    },

    /// A configuration file is malformed.
    #[error("invalid configuration {}: {reason}", path.display())]
    Config {
        /// Path of the configuration file.
        path: PathBuf,
        /// What is wrong with it.
        reason: String,
    },

    /// I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl SchemaError {
    /// Wrap a document error raised while handling `path`.
    ///
    /// Missing files surface as [`SchemaError::NotFound`]; everything else
    /// keeps the document error as its source.
    pub fn from_document(path: impl Into<PathBuf>, err: DocumentError) -> Self {
        match err {
            DocumentError::NotFound { path } => Self::NotFound { path },
            source => Self::Parse {
                path: path.into(),
                source,
            },
        }
    }

    /// True for errors caused by the submitted document rather than by the
    /// schema or the environment.
    pub fn is_document_error(&self) -> bool {
        matches!(self, Self::Parse { source, .. } if source.is_parse_error())
    }
}
