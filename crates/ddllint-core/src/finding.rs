//! Finding codes and severities
//!
//! IMPORTANT: Finding codes are versioned and stable.
//! NEVER rename or remove codes - they are part of the public API.
//! Add new codes with new names only.

use serde::{Deserialize, Serialize};

/// Finding code registry (v1)
///
/// Parse-stage codes are produced by the extractor, the rest by the rule
/// engine. Rule codes are listed in evaluation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FindingCode {
    // Parse stage
    /// Statement could not be classified (bad keyword, missing column list)
    ParseMalformedStatement,

    /// Statement body never closed, or closed twice
    ParseUnbalancedParentheses,

    /// A table with the same name was already declared
    ParseDuplicateTable,

    /// A key constraint names a column the table does not declare
    ParseUnknownKeyColumn,

    /// CREATE INDEX targets an unknown table or column
    ParseUnknownIndexTarget,

    // Structural rules
    /// Table has no primary key
    MissingPrimaryKey,

    /// Foreign key references an undeclared table or column
    DanglingForeignKey,

    /// Key column is not covered by an index
    UnindexedKeyColumn,

    /// Column name suggests a reference that is not declared
    ImplicitRelationship,

    /// Table looks like a many-to-many junction table
    ManyToManyJunction,

    /// Junction table key is not the composite of both foreign keys
    JunctionKeyNotComposite,

    /// Foreign key lists a local column the table does not declare
    ForeignKeyUnknownLocalColumn,

    /// Foreign key targets a column that is neither primary key nor unique
    ForeignKeyNonKeyTarget,

    /// Foreign key column does not follow the `<table>_id` convention
    ForeignKeyNaming,

    /// Declared one-to-many relationship
    OneToManyRelationship,
}

impl FindingCode {
    /// Get the finding code as a stable string identifier
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ParseMalformedStatement => "PARSE_MALFORMED_STATEMENT",
            Self::ParseUnbalancedParentheses => "PARSE_UNBALANCED_PARENTHESES",
            Self::ParseDuplicateTable => "PARSE_DUPLICATE_TABLE",
            Self::ParseUnknownKeyColumn => "PARSE_UNKNOWN_KEY_COLUMN",
            Self::ParseUnknownIndexTarget => "PARSE_UNKNOWN_INDEX_TARGET",
            Self::MissingPrimaryKey => "MISSING_PRIMARY_KEY",
            Self::DanglingForeignKey => "DANGLING_FOREIGN_KEY",
            Self::UnindexedKeyColumn => "UNINDEXED_KEY_COLUMN",
            Self::ImplicitRelationship => "IMPLICIT_RELATIONSHIP",
            Self::ManyToManyJunction => "MANY_TO_MANY_JUNCTION",
            Self::JunctionKeyNotComposite => "JUNCTION_KEY_NOT_COMPOSITE",
            Self::ForeignKeyUnknownLocalColumn => "FOREIGN_KEY_UNKNOWN_LOCAL_COLUMN",
            Self::ForeignKeyNonKeyTarget => "FOREIGN_KEY_NON_KEY_TARGET",
            Self::ForeignKeyNaming => "FOREIGN_KEY_NAMING",
            Self::OneToManyRelationship => "ONE_TO_MANY_RELATIONSHIP",
        }
    }

    /// Look a code up by its stable string identifier
    pub fn parse(code: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|c| c.as_str() == code)
    }

    /// True for codes produced by the extractor
    pub fn is_parse_stage(&self) -> bool {
        self.as_str().starts_with("PARSE_")
    }

    /// Every registered code
    pub const ALL: [FindingCode; 15] = [
        Self::ParseMalformedStatement,
        Self::ParseUnbalancedParentheses,
        Self::ParseDuplicateTable,
        Self::ParseUnknownKeyColumn,
        Self::ParseUnknownIndexTarget,
        Self::MissingPrimaryKey,
        Self::DanglingForeignKey,
        Self::UnindexedKeyColumn,
        Self::ImplicitRelationship,
        Self::ManyToManyJunction,
        Self::JunctionKeyNotComposite,
        Self::ForeignKeyUnknownLocalColumn,
        Self::ForeignKeyNonKeyTarget,
        Self::ForeignKeyNaming,
        Self::OneToManyRelationship,
    ];
}

impl std::fmt::Display for FindingCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Finding severity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Heuristic note, never blocking
    Info,

    /// Should be reviewed but not blocking
    Warning,

    /// Structural problem that should fail CI
    Error,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Info => write!(f, "info"),
            Self::Warning => write!(f, "warning"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// One reported issue
///
/// Serializes as `{code, severity, message, table, column}` with `null` for
/// absent references.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    /// Stable finding code
    pub code: FindingCode,

    /// Severity level
    pub severity: Severity,

    /// Human-readable message
    pub message: String,

    /// Table the finding is about, if any
    pub table: Option<String>,

    /// Column the finding is about, if any
    pub column: Option<String>,
}

impl Finding {
    pub fn new(code: FindingCode, severity: Severity, message: impl Into<String>) -> Self {
        Self {
            code,
            severity,
            message: message.into(),
            table: None,
            column: None,
        }
    }

    pub fn error(code: FindingCode, message: impl Into<String>) -> Self {
        Self::new(code, Severity::Error, message)
    }

    pub fn warning(code: FindingCode, message: impl Into<String>) -> Self {
        Self::new(code, Severity::Warning, message)
    }

    pub fn info(code: FindingCode, message: impl Into<String>) -> Self {
        Self::new(code, Severity::Info, message)
    }

    /// Set the table reference
    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        self.table = Some(table.into());
        self
    }

    /// Set the column reference
    pub fn with_column(mut self, column: impl Into<String>) -> Self {
        self.column = Some(column.into());
        self
    }

    /// Replace the severity, keeping everything else
    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finding_code_stability() {
        assert_eq!(FindingCode::MissingPrimaryKey.as_str(), "MISSING_PRIMARY_KEY");
        assert_eq!(FindingCode::JunctionKeyNotComposite.as_str(), "JUNCTION_KEY_NOT_COMPOSITE");
        for code in FindingCode::ALL {
            assert_eq!(FindingCode::parse(code.as_str()), Some(code));
        }
        assert_eq!(FindingCode::parse("NOPE"), None);
    }

    #[test]
    fn parse_stage_codes() {
        assert!(FindingCode::ParseDuplicateTable.is_parse_stage());
        assert!(!FindingCode::DanglingForeignKey.is_parse_stage());
    }

    #[test]
    fn finding_serialization() {
        let finding = Finding::error(FindingCode::MissingPrimaryKey, "Table 'logs' has no primary key")
            .with_table("logs");

        let json = serde_json::to_value(&finding).unwrap();
        assert_eq!(json["severity"], "error");
        assert_eq!(json["code"], "MISSING_PRIMARY_KEY");
        assert_eq!(json["table"], "logs");
        assert!(json["column"].is_null());
    }

    #[test]
    fn warning_serializes_in_full() {
        let json = serde_json::to_string(&Severity::Warning).unwrap();
        assert_eq!(json, "\"warning\"");
    }
}
