//! # Document Errors
//!
//! Failures raised while reading, parsing, or writing tree documents.
//! Each variant names the document it concerns; parser failures wrap the
//! underlying syntax error so callers can surface line/column details.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by document loading and transcoding.
#[derive(Error, Debug)]
pub enum DocumentError {
    /// The document path does not exist.
    #[error("file not found: {}", path.display())]
    NotFound {
        /// The missing path.
        path: PathBuf,
    },

    /// The document is not valid YAML.
    #[error("invalid YAML in {origin}: {source}")]
    Yaml {
        /// File path or `<inline>` for in-memory text.
        origin: String,
        /// Underlying parser error.
        #[source]
        source: serde_yaml::Error,
    },

    /// The document is not valid JSON.
    #[error("invalid JSON in {origin}: {source}")]
    Json {
        /// File path or `<inline>` for in-memory text.
        origin: String,
        /// Underlying parser error.
        #[source]
        source: serde_json::Error,
    },

    /// The YAML tree uses a construct with no JSON equivalent.
    #[error("unsupported YAML content in {origin}: {reason}")]
    Unsupported {
        /// File path or `<inline>` for in-memory text.
        origin: String,
        /// What could not be represented.
        reason: String,
    },

    /// The tree could not be rendered as text.
    #[error("serialization failed: {0}")]
    Serialize(String),

    /// I/O failure other than a missing file.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        /// The path being read or written.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

impl DocumentError {
    /// True when the error is a syntax or representation problem in the
    /// document content, as opposed to a missing file or I/O failure.
    pub fn is_parse_error(&self) -> bool {
        matches!(
            self,
            Self::Yaml { .. } | Self::Json { .. } | Self::Unsupported { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_names_the_path() {
        let err = DocumentError::NotFound {
            path: PathBuf::from("rules/missing.yaml"),
        };
        assert!(err.to_string().contains("rules/missing.yaml"));
        assert!(!err.is_parse_error());
    }

    #[test]
    fn yaml_error_is_parse_error() {
        let source = serde_yaml::from_str::<serde_yaml::Value>("a: [1, 2").unwrap_err();
        let err = DocumentError::Yaml {
            origin: "<inline>".to_string(),
            source,
        };
        assert!(err.is_parse_error());
        assert!(err.to_string().starts_with("invalid YAML in <inline>"));
    }
}
