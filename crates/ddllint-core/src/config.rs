//! Configuration schema (ddllint.toml)

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use crate::finding::{Finding, FindingCode, Severity};

/// Default report file for HTML output
pub const DEFAULT_HTML_REPORT: &str = "ddl_analysis_report.html";

/// Default report file for JSON output
pub const DEFAULT_JSON_REPORT: &str = "ddl_analysis_report.json";

/// Which columns count as indexed besides keys, uniques and explicit indexes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexPolicy {
    /// Treat every declared foreign-key column as indexed.
    ///
    /// Many engines do not index the referencing side automatically; turn
    /// this off and feed `CREATE INDEX` statements for a stricter check.
    #[serde(default = "default_true")]
    pub foreign_keys_indexed: bool,
}

impl Default for IndexPolicy {
    fn default() -> Self {
        Self {
            foreign_keys_indexed: true,
        }
    }
}

fn default_true() -> bool {
    true
}

/// Severity overrides for specific finding codes
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SeverityThreshold {
    /// Map of finding code to severity override
    #[serde(default)]
    pub overrides: HashMap<String, Severity>,
}

impl SeverityThreshold {
    /// Get severity for a finding code, or default
    pub fn get_severity(&self, code: FindingCode, default: Severity) -> Severity {
        self.overrides
            .get(code.as_str())
            .copied()
            .unwrap_or(default)
    }

    /// Set severity override for a code
    pub fn set_override(&mut self, code: FindingCode, severity: Severity) {
        self.overrides.insert(code.as_str().to_string(), severity);
    }

    /// Apply any override to a finding
    pub fn apply(&self, finding: Finding) -> Finding {
        let severity = self.get_severity(finding.code, finding.severity);
        finding.with_severity(severity)
    }

    /// Override keys that do not name a registered code
    pub fn unknown_codes(&self) -> Vec<&str> {
        let mut unknown: Vec<&str> = self
            .overrides
            .keys()
            .map(String::as_str)
            .filter(|k| FindingCode::parse(k).is_none())
            .collect();
        unknown.sort_unstable();
        unknown
    }
}

/// Rule selection
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleSelection {
    /// Finding codes whose rules are switched off
    #[serde(default)]
    pub disabled: Vec<String>,
}

impl RuleSelection {
    pub fn is_enabled(&self, code: FindingCode) -> bool {
        !self.disabled.iter().any(|d| d == code.as_str())
    }

    pub fn disable(&mut self, code: FindingCode) {
        if self.is_enabled(code) {
            self.disabled.push(code.as_str().to_string());
        }
    }
}

/// Report rendering mode
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputMode {
    /// Colored plain text on stdout
    #[default]
    Text,

    /// HTML file with color-coded severities
    Html,

    /// report.json v1
    Json,
}

impl OutputMode {
    /// Report file used when no path is configured; text goes to stdout
    pub fn default_path(&self) -> Option<PathBuf> {
        match self {
            Self::Text => None,
            Self::Html => Some(PathBuf::from(DEFAULT_HTML_REPORT)),
            Self::Json => Some(PathBuf::from(DEFAULT_JSON_REPORT)),
        }
    }
}

/// Renderer configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Rendering mode
    #[serde(default)]
    pub mode: OutputMode,

    /// Output file; defaults depend on the mode
    #[serde(default)]
    pub path: Option<PathBuf>,
}

impl OutputConfig {
    /// Resolved output file, `None` meaning stdout
    pub fn resolved_path(&self) -> Option<PathBuf> {
        match self.mode {
            OutputMode::Text => self.path.clone(),
            _ => self.path.clone().or_else(|| self.mode.default_path()),
        }
    }
}

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Index heuristic
    #[serde(default)]
    pub index: IndexPolicy,

    /// Rule selection
    #[serde(default)]
    pub rules: RuleSelection,

    /// Severity overrides
    #[serde(default)]
    pub severity: SeverityThreshold,

    /// Renderer settings
    #[serde(default)]
    pub output: OutputConfig,
}

impl Config {
    /// Load config from TOML file
    pub fn from_file(path: &std::path::Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::IoError(e.to_string()))?;

        Self::from_toml(&contents)
    }

    /// Load config from TOML string
    pub fn from_toml(toml: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(toml)
            .map_err(|e| ConfigError::ParseError(e.to_string()))?;

        if let Some(code) = config.rules.disabled.iter().find(|c| FindingCode::parse(c).is_none()) {
            return Err(ConfigError::UnknownCode(code.clone()));
        }
        if let Some(code) = config.severity.unknown_codes().first() {
            return Err(ConfigError::UnknownCode((*code).to_string()));
        }

        Ok(config)
    }
}

/// Config error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Unknown finding code: {0}")]
    UnknownCode(String),
}
