//! # Logical Schema
//!
//! The schema a validator consumes: the rule set produced by merging
//! fragments, together with its constraint form and a compiled constraint
//! validator. Both validation modes can run against any logical schema,
//! whichever form it was built from.

use std::sync::Arc;

use serde_json::Value;

use crate::constraint::{ConstraintSchema, ConstraintValidator};
use crate::convert::{constraint_to_rules, resolve_references, rules_to_constraint};
use crate::error::SchemaError;
use crate::merge::merge;
use crate::rule::{root_elements, FieldRule, SchemaFragment};

/// A merged, resolved schema ready for validation.
#[derive(Debug, Clone)]
pub struct LogicalSchema {
    name: String,
    rules: Vec<FieldRule>,
    constraint: ConstraintSchema,
    validator: Arc<ConstraintValidator>,
}

impl LogicalSchema {
    /// Build from a rule set.
    pub fn from_rules(name: impl Into<String>, rules: Vec<FieldRule>) -> Result<Self, SchemaError> {
        let name = name.into();
        let constraint = rules_to_constraint(&name, &rules)?;
        let validator = Arc::new(constraint.compile()?);
        Ok(Self {
            name,
            rules,
            constraint,
            validator,
        })
    }

    /// Build from a rule-form tree (a fragment or a merge of fragments).
    pub fn from_tree(name: impl Into<String>, tree: &Value) -> Result<Self, SchemaError> {
        let name = name.into();
        let rules = root_elements(tree, &name)?;
        Self::from_rules(name, rules)
    }

    /// Merge fragments in order (later fragments take precedence) and build
    /// the result.
    pub fn from_fragments(name: impl Into<String>, fragments: &[SchemaFragment]) -> Result<Self, SchemaError> {
        let merged = merge(fragments.iter().map(|f| &f.tree));
        Self::from_tree(name, &merged)
    }

    /// Build from a constraint schema. Remaining references are resolved
    /// first.
    pub fn from_constraint(constraint: ConstraintSchema) -> Result<Self, SchemaError> {
        let constraint = if constraint.has_references() {
            ConstraintSchema::new(resolve_references(constraint.as_value())?)
        } else {
            constraint
        };
        let name = constraint.title().unwrap_or("constraint").to_string();
        let rules = constraint_to_rules(&constraint)?;
        let validator = Arc::new(constraint.compile()?);
        Ok(Self {
            name,
            rules,
            constraint,
            validator,
        })
    }

    /// Schema name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Top-level field rules.
    pub fn rules(&self) -> &[FieldRule] {
        &self.rules
    }

    /// Constraint form.
    pub fn constraint(&self) -> &ConstraintSchema {
        &self.constraint
    }

    /// Compiled constraint validator.
    pub fn validator(&self) -> &ConstraintValidator {
        &self.validator
    }
}
