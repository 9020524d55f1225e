//! # Validation Context
//!
//! A [`ValidationContext`] owns everything one validation run needs: the
//! configuration, the fragment cache, the common definitions, the predicate
//! registry, and the ordered validation modes. Nothing is process-wide;
//! hosts that need several independent contexts simply build several.
//!
//! [`ValidationContext::validate`] runs the configured modes in order and
//! stops at the first one that reports errors.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::analyzer::DirectoryAnalyzer;
use crate::config::GuardianConfig;
use crate::engine::RuleEngine;
use crate::error::SchemaError;
use crate::logical::LogicalSchema;
use crate::predicate::PredicateRegistry;
use crate::report::ValidationReport;
use crate::rule::{fragment_name, CommonDefinitions};
use crate::store::SchemaStore;

/// A validation mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationMode {
    /// The rule engine.
    Rules,
    /// The constraint (JSON Schema) validator.
    Constraint,
}

impl fmt::Display for ValidationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rules => f.write_str("rules"),
            Self::Constraint => f.write_str("constraint"),
        }
    }
}

impl FromStr for ValidationMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "rules" => Ok(Self::Rules),
            "constraint" => Ok(Self::Constraint),
            other => Err(format!("unknown validation mode '{other}' (expected rules or constraint)")),
        }
    }
}

/// Result of running the configured modes.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationOutcome {
    /// Every mode passed.
    Passed,
    /// A mode reported errors; later modes were not run.
    Failed {
        /// The failing mode.
        mode: ValidationMode,
        /// Its report.
        report: ValidationReport,
    },
}

impl ValidationOutcome {
    /// True when every mode passed.
    pub fn is_passed(&self) -> bool {
        matches!(self, Self::Passed)
    }

    /// The failing report, if any.
    pub fn report(&self) -> Option<&ValidationReport> {
        match self {
            Self::Passed => None,
            Self::Failed { report, .. } => Some(report),
        }
    }
}

/// Owner of the store, common definitions, predicates and modes used by one
/// validation workflow.
#[derive(Debug)]
pub struct ValidationContext {
    config: GuardianConfig,
    store: SchemaStore,
    common: CommonDefinitions,
    predicates: PredicateRegistry,
}

impl ValidationContext {
    /// A context with built-in predicates and no common definitions.
    pub fn new(config: GuardianConfig) -> Self {
        Self {
            config,
            store: SchemaStore::new(),
            common: CommonDefinitions::new(),
            predicates: PredicateRegistry::with_builtins(),
        }
    }

    /// A context built from `config`, loading its common definitions file
    /// when one is configured.
    pub fn from_config(config: GuardianConfig) -> Result<Self, SchemaError> {
        let common_path = config.common_definitions.clone();
        let mut ctx = Self::new(config);
        if let Some(path) = common_path {
            ctx.load_common_definitions(&path)?;
        }
        Ok(ctx)
    }

    /// Replace the predicate registry.
    pub fn with_predicates(mut self, predicates: PredicateRegistry) -> Self {
        self.predicates = predicates;
        self
    }

    /// Replace the common definitions.
    pub fn with_common_definitions(mut self, common: CommonDefinitions) -> Self {
        self.common = common;
        self
    }

    /// Replace the validation modes. An empty list keeps the current modes.
    pub fn with_modes(mut self, modes: Vec<ValidationMode>) -> Self {
        if !modes.is_empty() {
            self.config.modes = modes;
        }
        self
    }

    /// Load a `common_elements` document, replacing the current definitions.
    pub fn load_common_definitions(&mut self, path: &Path) -> Result<(), SchemaError> {
        self.common = CommonDefinitions::load(path)?;
        Ok(())
    }

    /// Configuration.
    pub fn config(&self) -> &GuardianConfig {
        &self.config
    }

    /// The fragment cache.
    pub fn store(&self) -> &SchemaStore {
        &self.store
    }

    /// Common definitions.
    pub fn common_definitions(&self) -> &CommonDefinitions {
        &self.common
    }

    /// Predicate registry, for registering custom predicates.
    pub fn predicates_mut(&mut self) -> &mut PredicateRegistry {
        &mut self.predicates
    }

    /// Configured modes, in run order.
    pub fn modes(&self) -> &[ValidationMode] {
        &self.config.modes
    }

    /// An analyzer over this context's store.
    pub fn analyzer(&self) -> DirectoryAnalyzer<'_> {
        DirectoryAnalyzer::new(&self.store).with_extensions(self.config.schema_extensions.clone())
    }

    /// A rule engine over this context's predicates and common definitions.
    pub fn rule_engine(&self) -> RuleEngine<'_> {
        RuleEngine::new(&self.predicates, &self.common)
    }

    /// Load a schema from a fragment file or a fragment directory.
    ///
    /// A directory is scanned and its effective schema set merged shallow to
    /// deep, so deeper fragments take precedence.
    pub fn load_schema(&self, path: &Path) -> Result<LogicalSchema, SchemaError> {
        if path.is_dir() {
            let mut analyzer = self.analyzer();
            analyzer.scan(path)?;
            let fragments = analyzer.effective_fragments()?;
            tracing::debug!(path = %path.display(), fragments = fragments.len(), "merging schema directory");
            LogicalSchema::from_fragments(fragment_name(path), &fragments)
        } else {
            let fragment = self.store.load(path)?;
            let name = fragment.name.clone();
            LogicalSchema::from_fragments(name, &[fragment])
        }
    }

    /// Run the configured modes against `data`, stopping at the first
    /// failing mode.
    ///
    /// # Errors
    ///
    /// Only schema configuration errors; data problems are reported in the
    /// outcome.
    pub fn validate(&self, schema: &LogicalSchema, data: &Value) -> Result<ValidationOutcome, SchemaError> {
        for &mode in self.modes() {
            let report = self.run_mode(mode, schema, data)?;
            if !report.is_success() {
                tracing::debug!(schema = schema.name(), %mode, errors = report.len(), "validation failed");
                return Ok(ValidationOutcome::Failed { mode, report });
            }
        }
        Ok(ValidationOutcome::Passed)
    }

    /// Run a single mode.
    pub fn run_mode(
        &self,
        mode: ValidationMode,
        schema: &LogicalSchema,
        data: &Value,
    ) -> Result<ValidationReport, SchemaError> {
        match mode {
            ValidationMode::Rules => self.rule_engine().validate(schema, data),
            ValidationMode::Constraint => Ok(schema.validator().validate(data)),
        }
    }
}

impl Default for ValidationContext {
    fn default() -> Self {
        Self::new(GuardianConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::{FieldKind, FieldRule};
    use serde_json::json;

    fn age_schema() -> LogicalSchema {
        LogicalSchema::from_rules(
            "person",
            vec![FieldRule::new("age", FieldKind::Integer).required().describe("Age")],
        )
        .unwrap()
    }

    #[test]
    fn passing_document_passes_every_mode() {
        let ctx = ValidationContext::default();
        assert!(ctx.validate(&age_schema(), &json!({"age": 30})).unwrap().is_passed());
    }

    #[test]
    fn first_failing_mode_is_reported() {
        let ctx = ValidationContext::default();
        match ctx.validate(&age_schema(), &json!({"age": "30"})).unwrap() {
            ValidationOutcome::Failed { mode, report } => {
                assert_eq!(mode, ValidationMode::Rules);
                assert_eq!(report.len(), 1);
                assert!(report.errors()[0].message.contains("Age"));
            }
            ValidationOutcome::Passed => panic!("expected failure"),
        }
    }

    #[test]
    fn constraint_only_mode() {
        let ctx = ValidationContext::default().with_modes(vec![ValidationMode::Constraint]);
        let outcome = ctx.validate(&age_schema(), &json!({})).unwrap();
        assert!(matches!(
            outcome,
            ValidationOutcome::Failed { mode: ValidationMode::Constraint, .. }
        ));
    }

    #[test]
    fn custom_predicates_can_be_registered() {
        let mut ctx = ValidationContext::default().with_modes(vec![ValidationMode::Rules]);
        ctx.predicates_mut()
            .register("even", |v: &Value| v.as_i64().is_some_and(|n| n % 2 == 0));
        let schema = LogicalSchema::from_rules(
            "n",
            vec![FieldRule::new("n", FieldKind::Integer).with_predicate("even")],
        )
        .unwrap();
        assert!(ctx.validate(&schema, &json!({"n": 2})).unwrap().is_passed());
        assert!(!ctx.validate(&schema, &json!({"n": 3})).unwrap().is_passed());
    }

    #[test]
    fn mode_parsing() {
        assert_eq!("rules".parse::<ValidationMode>().unwrap(), ValidationMode::Rules);
        assert!("strict".parse::<ValidationMode>().is_err());
        assert_eq!(ValidationMode::Constraint.to_string(), "constraint");
    }

    #[test]
    fn load_schema_from_file_and_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("base.yaml"),
            "root_element:\n  - name: age\n    type: integer\n    required: true\n",
        )
        .unwrap();
        std::fs::create_dir(dir.path().join("page1")).unwrap();
        std::fs::write(
            dir.path().join("page1/page.yaml"),
            "root_element:\n  - name: title\n    type: string\n",
        )
        .unwrap();

        let ctx = ValidationContext::default();
        let single = ctx.load_schema(&dir.path().join("base.yaml")).unwrap();
        assert_eq!(single.name(), "base");
        assert_eq!(single.rules().len(), 1);

        let merged = ctx.load_schema(dir.path()).unwrap();
        let names: Vec<&str> = merged.rules().iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["age", "title"]);
    }

    #[test]
    fn from_config_loads_common_definitions() {
        let dir = tempfile::tempdir().unwrap();
        let common = dir.path().join("common.yaml");
        std::fs::write(&common, "common_elements:\n  - name: commonLabel\n    type: label\n").unwrap();
        let config = GuardianConfig {
            common_definitions: Some(common),
            ..GuardianConfig::default()
        };
        let ctx = ValidationContext::from_config(config).unwrap();
        assert!(ctx.common_definitions().get("commonLabel").is_some());
    }
}
