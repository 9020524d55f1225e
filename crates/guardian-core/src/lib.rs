//! # guardian-core: Documents and Field Paths
//!
//! Foundational types shared by the schema engine, the CLI, and the
//! validation service.
//!
//! ## Documents (`document`)
//!
//! Every schema fragment and every data document is a tree. The
//! [`document`] module reads YAML or JSON from disk or from memory and
//! normalizes both into [`serde_json::Value`], the single tree model the
//! rest of the workspace operates on. It also transcodes trees back to
//! YAML or JSON text.
//!
//! ## Field Paths (`path`)
//!
//! [`FieldPath`] renders the location of a field as a dot-delimited
//! path (`address.city`, `tags.0.name`). Both validation modes report
//! paths in this notation.
//!
//! ## Crate Policy
//!
//! - No internal dependencies.
//! - No `unwrap()` outside tests; failures carry the offending path.

pub mod document;
pub mod error;
pub mod path;

pub use document::{
    load_document, parse_document, to_json_string, to_yaml_string, write_document,
    yaml_to_json_value, DocumentFormat,
};
pub use error::DocumentError;
pub use path::FieldPath;
