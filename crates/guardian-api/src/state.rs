//! # Application State
//!
//! The validation context and the active schema, loaded once at start-up
//! and shared read-only by every handler.

use std::path::PathBuf;
use std::sync::Arc;

use guardian_schema::{GuardianConfig, LogicalSchema, SchemaError, ValidationContext};

/// Start-up settings, read from the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Listen port (`PORT`, default 8080).
    pub port: u16,
    /// Schema file or directory (`GUARDIAN_SCHEMA`, default `schema.yaml`).
    pub schema_path: PathBuf,
    /// Common-definitions document (`GUARDIAN_COMMON`).
    pub common_path: Option<PathBuf>,
    /// Configuration file (`GUARDIAN_CONFIG`).
    pub config_path: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            schema_path: PathBuf::from("schema.yaml"),
            common_path: None,
            config_path: None,
        }
    }
}

impl AppConfig {
    /// Read settings from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read settings through `lookup`; unset or empty values keep defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();
        Self {
            port: get("PORT").and_then(|p| p.parse().ok()).unwrap_or(defaults.port),
            schema_path: get("GUARDIAN_SCHEMA").map(PathBuf::from).unwrap_or(defaults.schema_path),
            common_path: get("GUARDIAN_COMMON").map(PathBuf::from),
            config_path: get("GUARDIAN_CONFIG").map(PathBuf::from),
        }
    }
}

/// Shared application state passed to all route handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    pub ctx: Arc<ValidationContext>,
    pub schema: Arc<LogicalSchema>,
}

impl AppState {
    /// Wrap an already-built context and schema.
    pub fn new(ctx: ValidationContext, schema: LogicalSchema) -> Self {
        Self {
            ctx: Arc::new(ctx),
            schema: Arc::new(schema),
        }
    }

    /// Build the context and load the active schema described by `config`.
    pub fn load(config: &AppConfig) -> Result<Self, SchemaError> {
        let settings = match &config.config_path {
            Some(path) => GuardianConfig::from_file(path)?,
            None => GuardianConfig::default(),
        };
        let mut ctx = ValidationContext::from_config(settings)?;
        if let Some(common) = &config.common_path {
            ctx.load_common_definitions(common)?;
        }
        let schema = ctx.load_schema(&config.schema_path)?;
        tracing::info!(
            schema = schema.name(),
            path = %config.schema_path.display(),
            rules = schema.rules().len(),
            "active schema loaded"
        );
        Ok(Self::new(ctx, schema))
    }
}
