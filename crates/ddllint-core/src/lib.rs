//! ddllint core
//!
//! Domain model shared by the extractor, the rule engine and the renderers.
//! Finding codes are part of the public API: never rename them.

pub mod finding;
pub mod schema;
pub mod report;
pub mod config;

pub use finding::{Finding, FindingCode, Severity};
pub use schema::{Column, ForeignKey, Schema, Table};
pub use report::{Report, ReportSummary, ReportVersion};
pub use config::{Config, ConfigError, IndexPolicy, OutputConfig, OutputMode, RuleSelection, SeverityThreshold};
