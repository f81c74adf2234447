//! Analysis report (report.json v1)
//!
//! The JSON layout is versioned: renamed or removed fields need a major
//! version bump, new optional fields a minor one.

use serde::{Deserialize, Serialize};
use crate::finding::{Finding, Severity};

/// Report schema version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportVersion {
    /// Major version (breaking changes)
    pub major: u32,

    /// Minor version (backward-compatible additions)
    pub minor: u32,
}

impl ReportVersion {
    /// Current report schema version
    pub const CURRENT: ReportVersion = ReportVersion { major: 1, minor: 0 };
}

impl std::fmt::Display for ReportVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// Summary statistics for a report
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportSummary {
    /// Total number of findings
    pub total: usize,

    /// Number of errors
    pub errors: usize,

    /// Number of warnings
    pub warnings: usize,

    /// Number of info notes
    pub info: usize,

    /// Number of tables extracted from the input
    pub tables_checked: usize,
}

/// Analysis report (report.json v1)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    /// Schema version
    pub version: ReportVersion,

    /// Timestamp (ISO 8601)
    pub timestamp: String,

    /// Source file the DDL was read from
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,

    /// Summary statistics
    pub summary: ReportSummary,

    /// All findings, parse stage first, then rules in evaluation order
    pub findings: Vec<Finding>,
}

impl Report {
    /// Create a report from findings
    pub fn from_findings(findings: Vec<Finding>, tables_checked: usize) -> Self {
        let summary = ReportSummary {
            total: findings.len(),
            errors: count(&findings, Severity::Error),
            warnings: count(&findings, Severity::Warning),
            info: count(&findings, Severity::Info),
            tables_checked,
        };

        Self {
            version: ReportVersion::CURRENT,
            timestamp: chrono::Utc::now().to_rfc3339(),
            source: None,
            summary,
            findings,
        }
    }

    /// Record the input file name
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Check if the report has any errors
    pub fn has_errors(&self) -> bool {
        self.summary.errors > 0
    }

    /// Serialize to JSON string
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Save to file
    pub fn save_to_file(&self, path: &std::path::Path) -> Result<(), std::io::Error> {
        let json = self.to_json().map_err(std::io::Error::other)?;
        std::fs::write(path, json)
    }
}

fn count(findings: &[Finding], severity: Severity) -> usize {
    findings.iter().filter(|f| f.severity == severity).count()
}
