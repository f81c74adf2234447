//! DDL schema extraction
//!
//! This crate handles:
//! - Tokenizing DDL text (comments, literals, quoted identifiers)
//! - Depth-aware statement and entry splitting
//! - Classifying `CREATE TABLE` entries into columns and constraints
//! - Applying `CREATE INDEX` statements and the index heuristic
//!
//! Problems never abort extraction: malformed statements are skipped and
//! reported as parse-stage findings.

pub mod scanner;
pub mod error;
pub mod extract;

pub use error::ExtractError;
pub use extract::{extract, DdlExtractor, ExtractOptions, Extraction};
