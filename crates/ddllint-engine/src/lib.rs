//! ddllint engine - structural rules over extracted schemas
//!
//! This crate turns a [`Schema`](ddllint_core::Schema) into findings:
//! - Primary and foreign key checks
//! - Index coverage of key columns
//! - Relationship heuristics (implicit references, junction tables)
//! - Config-driven rule selection and severity overrides

pub mod engine;
pub mod rules;

pub use engine::{analyze, validate, RuleEngine};
pub use rules::{singular, Rule, RuleFn, RULES};
