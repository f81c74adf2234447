//! Recoverable extraction errors
//!
//! None of these abort extraction: each one is turned into a parse-stage
//! [`Finding`] and the extractor moves on to the next statement.

use ddllint_core::{Finding, FindingCode, Severity};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractError {
    #[error("CREATE TABLE statement without a table name")]
    MissingTableName,

    #[error("Table '{table}' has no column list")]
    MissingColumnList { table: String },

    #[error("{}unbalanced parentheses", table_prefix(.table))]
    UnbalancedParentheses { table: Option<String> },

    #[error("{}unterminated string literal", table_prefix(.table))]
    UnterminatedLiteral { table: Option<String> },

    #[error("Table '{table}': malformed entry '{entry}': {reason}")]
    MalformedEntry {
        table: String,
        entry: String,
        reason: String,
    },

    #[error("Statement{} is missing its ';' before the next CREATE", statement_subject(.table))]
    MissingTerminator { table: Option<String> },

    #[error("Unterminated block comment; the rest of the input is ignored")]
    UnterminatedComment,

    #[error("Table '{table}' is declared more than once; later declaration ignored")]
    DuplicateTable { table: String },

    #[error("Table '{table}': {constraint} names undeclared column '{column}'")]
    UnknownKeyColumn {
        table: String,
        column: String,
        constraint: &'static str,
    },

    #[error("Index '{}' targets unknown {}", .index, index_target(.table, .column))]
    UnknownIndexTarget {
        index: String,
        table: String,
        column: Option<String>,
    },
}

fn table_prefix(table: &Option<String>) -> String {
    match table {
        Some(name) => format!("Table '{}': ", name),
        None => "CREATE TABLE statement: ".to_string(),
    }
}

fn statement_subject(table: &Option<String>) -> String {
    match table {
        Some(name) => format!(" for table '{}'", name),
        None => String::new(),
    }
}

fn index_target(table: &str, column: &Option<String>) -> String {
    match column {
        Some(column) => format!("column '{}.{}'", table, column),
        None => format!("table '{}'", table),
    }
}

impl ExtractError {
    /// Stable finding code for this error
    pub fn code(&self) -> FindingCode {
        match self {
            Self::MissingTableName
            | Self::MissingColumnList { .. }
            | Self::MalformedEntry { .. }
            | Self::MissingTerminator { .. }
            | Self::UnterminatedComment => FindingCode::ParseMalformedStatement,
            Self::UnbalancedParentheses { .. } | Self::UnterminatedLiteral { .. } => {
                FindingCode::ParseUnbalancedParentheses
            }
            Self::DuplicateTable { .. } => FindingCode::ParseDuplicateTable,
            Self::UnknownKeyColumn { .. } => FindingCode::ParseUnknownKeyColumn,
            Self::UnknownIndexTarget { .. } => FindingCode::ParseUnknownIndexTarget,
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            Self::UnknownIndexTarget { .. } => Severity::Warning,
            _ => Severity::Error,
        }
    }

    /// Table the error is about, when it could be recovered
    pub fn table(&self) -> Option<&str> {
        match self {
            Self::MissingTableName | Self::UnterminatedComment => None,
            Self::UnbalancedParentheses { table }
            | Self::UnterminatedLiteral { table }
            | Self::MissingTerminator { table } => table.as_deref(),
            Self::MissingColumnList { table }
            | Self::MalformedEntry { table, .. }
            | Self::DuplicateTable { table }
            | Self::UnknownKeyColumn { table, .. }
            | Self::UnknownIndexTarget { table, .. } => Some(table),
        }
    }

    pub fn column(&self) -> Option<&str> {
        match self {
            Self::UnknownKeyColumn { column, .. } => Some(column),
            Self::UnknownIndexTarget { column, .. } => column.as_deref(),
            _ => None,
        }
    }

    /// Convert to a parse-stage finding
    pub fn to_finding(&self) -> Finding {
        let mut finding = Finding::new(self.code(), self.severity(), self.to_string());
        if let Some(table) = self.table() {
            finding = finding.with_table(table);
        }
        if let Some(column) = self.column() {
            finding = finding.with_column(column);
        }
        finding
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unbalanced_names_table_when_known() {
        let err = ExtractError::UnbalancedParentheses { table: Some("orders".to_string()) };
        let finding = err.to_finding();
        assert_eq!(finding.code, FindingCode::ParseUnbalancedParentheses);
        assert_eq!(finding.severity, Severity::Error);
        assert_eq!(finding.table.as_deref(), Some("orders"));
        assert_eq!(finding.message, "Table 'orders': unbalanced parentheses");
    }

    #[test]
    fn unbalanced_without_table() {
        let err = ExtractError::UnbalancedParentheses { table: None };
        assert_eq!(err.to_finding().table, None);
        assert!(err.to_string().starts_with("CREATE TABLE statement"));
    }

    #[test]
    fn missing_terminator_names_table() {
        let err = ExtractError::MissingTerminator { table: Some("a".to_string()) };
        let finding = err.to_finding();
        assert_eq!(finding.code, FindingCode::ParseMalformedStatement);
        assert_eq!(finding.severity, Severity::Error);
        assert_eq!(finding.table.as_deref(), Some("a"));
        assert_eq!(finding.message, "Statement for table 'a' is missing its ';' before the next CREATE");
    }

    #[test]
    fn unknown_index_target_is_a_warning() {
        let err = ExtractError::UnknownIndexTarget {
            index: "idx_email".to_string(),
            table: "users".to_string(),
            column: Some("mail".to_string()),
        };
        let finding = err.to_finding();
        assert_eq!(finding.severity, Severity::Warning);
        assert_eq!(finding.column.as_deref(), Some("mail"));
        assert_eq!(finding.message, "Index 'idx_email' targets unknown column 'users.mail'");
    }
}
