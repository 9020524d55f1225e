//! # API Route Modules
//!
//! - `validate`: validate a YAML payload against the active schema.
//! - `schema`: expose the active schema's constraint form.

pub mod schema;
pub mod validate;
