//! # guardian-schema: Schema Composition & Validation
//!
//! Discovers schema fragments in a directory hierarchy, caches them by
//! modification time, merges them into one logical schema, converts between
//! the rule form and the constraint (JSON Schema) form, and validates
//! documents into structured reports.
//!
//! ## Data Flow
//!
//! ```text
//! DirectoryAnalyzer ─► SchemaStore ─► merge / convert ─► LogicalSchema
//!                                                            │
//!                      data document ─► RuleEngine / ConstraintValidator
//!                                                            │
//!                                                    ValidationReport
//! ```
//!
//! ## Modules
//!
//! - [`store`]: fragment loading behind a modification-time cache, with
//!   CSV persistence.
//! - [`merge`]: left-to-right deep merge of fragment trees.
//! - [`analyzer`]: directory walk, change detection, change log.
//! - [`convert`]: constraint inference, lossless rule/constraint
//!   translation, `$defs` composition and in-memory dereferencing.
//! - [`engine`]: the rule engine.
//! - [`constraint`]: the draft-07 constraint validator.
//! - [`context`]: [`ValidationContext`], which owns all of the above for
//!   one workflow and runs the configured validation modes.
//!
//! ## Crate Policy
//!
//! - Depends only on `guardian-core` internally.
//! - Failed validation is a [`ValidationReport`], never an `Err`. Errors are
//!   reserved for unreadable files and unusable schemas.
//! - No process-wide state: every cache and table lives in a context.

pub mod analyzer;
pub mod config;
pub mod constraint;
pub mod context;
pub mod convert;
pub mod engine;
pub mod error;
pub mod logical;
pub mod merge;
pub mod predicate;
pub mod report;
pub mod rule;
pub mod store;

pub use analyzer::{Change, ChangeKind, DirectoryAnalyzer};
pub use config::GuardianConfig;
pub use constraint::{ConstraintSchema, ConstraintValidator};
pub use context::{ValidationContext, ValidationMode, ValidationOutcome};
pub use convert::{
    constraint_to_rules, merge_and_resolve, resolve_references, rules_to_constraint,
    to_constraint_form, InferOptions,
};
pub use engine::RuleEngine;
pub use error::SchemaError;
pub use logical::LogicalSchema;
pub use predicate::{Predicate, PredicateRegistry};
pub use report::{ErrorEntry, ErrorKind, ValidationReport};
pub use rule::{CommonDefinitions, FieldKind, FieldRule, SchemaFragment};
pub use store::{CacheEntry, SchemaStore};
