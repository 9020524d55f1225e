//! # Configuration
//!
//! [`GuardianConfig`] collects the settings a validation context is built
//! from. Every field has a default, so an empty file (or no file) is a
//! valid configuration:
//!
//! ```yaml
//! schema_extensions: [yaml, yml]
//! cache_file: cache.csv
//! changes_file: directory_structure_changes.csv
//! common_definitions: rule_config/common_definitions.yaml
//! modes: [rules, constraint]
//! require_all_inferred: true
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::context::ValidationMode;
use crate::error::SchemaError;

/// Validation context settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GuardianConfig {
    /// File extensions (without the dot) treated as schema fragments.
    pub schema_extensions: Vec<String>,
    /// Cache record store path.
    pub cache_file: PathBuf,
    /// Change-log record store path.
    pub changes_file: PathBuf,
    /// Common-definitions document loaded into every context.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub common_definitions: Option<PathBuf>,
    /// Validation modes, run in order until one fails.
    pub modes: Vec<ValidationMode>,
    /// Mark every observed field required when inferring constraint schemas.
    pub require_all_inferred: bool,
}

impl Default for GuardianConfig {
    fn default() -> Self {
        Self {
            schema_extensions: vec!["yaml".to_string()],
            cache_file: PathBuf::from("cache.csv"),
            changes_file: PathBuf::from("directory_structure_changes.csv"),
            common_definitions: None,
            modes: vec![ValidationMode::Rules, ValidationMode::Constraint],
            require_all_inferred: true,
        }
    }
}

impl GuardianConfig {
    /// Load a YAML or JSON configuration file.
    ///
    /// # Errors
    ///
    /// [`SchemaError::NotFound`] for a missing file, [`SchemaError::Parse`]
    /// for malformed text and [`SchemaError::Config`] for unknown keys or
    /// wrongly typed values.
    pub fn from_file(path: &Path) -> Result<Self, SchemaError> {
        let tree = guardian_core::load_document(path)
            .map_err(|e| SchemaError::from_document(path, e))?;
        if tree.is_null() {
            return Ok(Self::default());
        }
        let config: Self = serde_json::from_value(tree).map_err(|e| SchemaError::Config {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        if config.modes.is_empty() {
            return Err(SchemaError::Config {
                path: path.to_path_buf(),
                reason: "at least one validation mode is required".to_string(),
            });
        }
        tracing::debug!(path = %path.display(), "loaded configuration");
        Ok(config)
    }
}
