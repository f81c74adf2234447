//! DDL to schema extraction
//!
//! Statements are located with the scanner, then each `CREATE TABLE` body is
//! split into entries and every entry is classified as a column, a key
//! constraint, a unique constraint or an inline index. `CREATE INDEX`
//! statements are collected and applied once every table is known.
//!
//! Malformed statements are skipped and reported as parse findings; the rest
//! of the script is still extracted.

use crate::error::ExtractError;
use crate::scanner::{self, RawStatement, Token, TokenKind};
use ddllint_core::{Column, Config, Finding, ForeignKey, Schema, Severity, Table};

/// Knobs for the index heuristic
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtractOptions {
    /// Treat declared foreign-key columns as indexed. This is a policy, not
    /// SQL semantics.
    pub foreign_keys_indexed: bool,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            foreign_keys_indexed: true,
        }
    }
}

impl ExtractOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            foreign_keys_indexed: config.index.foreign_keys_indexed,
        }
    }
}

/// Extracted schema plus parse-stage findings
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Extraction {
    pub schema: Schema,
    pub findings: Vec<Finding>,
}

impl Extraction {
    pub fn has_parse_errors(&self) -> bool {
        self.findings.iter().any(|f| f.severity == Severity::Error)
    }
}

/// Extract with default options
pub fn extract(ddl: &str) -> Extraction {
    DdlExtractor::new().extract(ddl)
}

/// Schema extractor with configurable index heuristic
#[derive(Debug, Clone, Default)]
pub struct DdlExtractor {
    options: ExtractOptions,
}

impl DdlExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: ExtractOptions) -> Self {
        Self { options }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::with_options(ExtractOptions::from_config(config))
    }

    /// Extract a schema from DDL text. Never fails: problems become findings.
    pub fn extract(&self, ddl: &str) -> Extraction {
        let tokens = scanner::tokenize(ddl);
        let mut schema = Schema::new();
        let mut errors: Vec<ExtractError> = Vec::new();
        let mut indexes: Vec<PendingIndex> = Vec::new();

        for statement in scanner::split_statements(&tokens) {
            if statement.has_unterminated_comment() {
                tracing::warn!("block comment runs to end of input");
                errors.push(ExtractError::UnterminatedComment);
            }

            // table the statement is about, for DDL statements only
            let subject = match classify_statement(statement.tokens) {
                StatementKind::CreateTable(head) => {
                    match parse_create_table(ddl, &statement, head) {
                        Ok(parsed) => {
                            let name = parsed.table.name.clone();
                            tracing::debug!(
                                table = %name,
                                columns = parsed.table.columns.len(),
                                "extracted table"
                            );
                            match schema.insert(parsed.table) {
                                Ok(()) => errors.extend(parsed.warnings),
                                Err(duplicate) => {
                                    tracing::warn!(table = %duplicate.name, "duplicate table declaration");
                                    errors.push(ExtractError::DuplicateTable { table: duplicate.name });
                                }
                            }
                            Some(Some(name))
                        }
                        Err(err) => {
                            tracing::warn!(error = %err, "skipping malformed CREATE TABLE");
                            let name = err.table().map(String::from);
                            errors.push(err);
                            Some(name)
                        }
                    }
                }
                StatementKind::CreateIndex { unique, head } => {
                    match parse_create_index(statement.tokens, head, unique) {
                        Some(index) => {
                            let table = index.table.clone();
                            indexes.push(index);
                            Some(Some(table))
                        }
                        None => {
                            tracing::debug!("ignoring unparseable CREATE INDEX");
                            Some(None)
                        }
                    }
                }
                StatementKind::Other => None,
            };

            if let (false, Some(table)) = (statement.terminated, subject) {
                tracing::warn!(table = ?table, "statement not terminated by ';'");
                errors.push(ExtractError::MissingTerminator { table });
            }
        }

        resolve_implicit_references(&mut schema);
        for index in indexes {
            if let Err(err) = apply_index(&mut schema, index) {
                errors.push(err);
            }
        }
        if self.options.foreign_keys_indexed {
            index_foreign_keys(&mut schema);
        }

        Extraction {
            schema,
            findings: errors.iter().map(ExtractError::to_finding).collect(),
        }
    }
}

enum StatementKind {
    /// Position just past `TABLE`
    CreateTable(usize),
    /// Position just past `INDEX`
    CreateIndex { unique: bool, head: usize },
    Other,
}

/// Words allowed between CREATE and TABLE/INDEX
const CREATE_MODIFIERS: &[&str] = &[
    "OR", "REPLACE", "TEMP", "TEMPORARY", "GLOBAL", "LOCAL", "UNLOGGED",
];

fn classify_statement(tokens: &[Token]) -> StatementKind {
    if !tokens.first().is_some_and(|t| t.is_keyword("CREATE")) {
        return StatementKind::Other;
    }
    let mut i = 1;
    while tokens.get(i).is_some_and(|t| CREATE_MODIFIERS.iter().any(|m| t.is_keyword(m))) {
        i += 1;
    }
    let unique = tokens.get(i).is_some_and(|t| t.is_keyword("UNIQUE"));
    if unique {
        i += 1;
    }
    match tokens.get(i) {
        Some(t) if t.is_keyword("TABLE") && !unique => StatementKind::CreateTable(i + 1),
        Some(t) if t.is_keyword("INDEX") => StatementKind::CreateIndex { unique, head: i + 1 },
        _ => StatementKind::Other,
    }
}

/// Skip `IF NOT EXISTS` / `IF EXISTS`
fn skip_if_exists(tokens: &[Token], mut i: usize) -> usize {
    if tokens.get(i).is_some_and(|t| t.is_keyword("IF")) {
        i += 1;
        if tokens.get(i).is_some_and(|t| t.is_keyword("NOT")) {
            i += 1;
        }
        if tokens.get(i).is_some_and(|t| t.is_keyword("EXISTS")) {
            i += 1;
        }
    }
    i
}

/// Read `a.b.c`, keeping only the last part. Returns the name and the next
/// position.
fn qualified_name(tokens: &[Token], mut i: usize) -> Option<(String, usize)> {
    let mut name = tokens.get(i)?.ident()?;
    i += 1;
    while tokens.get(i).is_some_and(|t| t.is(&TokenKind::Dot)) {
        match tokens.get(i + 1).and_then(Token::ident) {
            Some(part) => {
                name = part;
                i += 2;
            }
            None => break,
        }
    }
    Some((name, i))
}

/// Read a parenthesized list of column names starting at `open`.
///
/// Each entry contributes its first identifier, so `name(20)` prefixes and
/// `ASC`/`DESC` suffixes are tolerated. Returns `None` when there is no list
/// or an entry does not start with an identifier.
fn column_list(tokens: &[Token], open: usize) -> Option<(Vec<String>, usize)> {
    let close = scanner::matching_paren(tokens, open)?;
    let mut names = Vec::new();
    for entry in scanner::split_top_level(&tokens[open + 1..close]) {
        names.push(entry.first()?.ident()?);
    }
    if names.is_empty() {
        return None;
    }
    Some((names, close + 1))
}

struct ParsedTable {
    table: Table,
    /// Non-fatal problems found while building the table
    warnings: Vec<ExtractError>,
}

fn parse_create_table(
    src: &str,
    statement: &RawStatement<'_>,
    head: usize,
) -> Result<ParsedTable, ExtractError> {
    let tokens = statement.tokens;
    let i = skip_if_exists(tokens, head);
    let name = qualified_name(tokens, i);

    let recovered = name.as_ref().map(|(n, _)| n.clone());

    if !statement.literals_closed {
        return Err(ExtractError::UnterminatedLiteral { table: recovered });
    }
    if !statement.balanced {
        return Err(ExtractError::UnbalancedParentheses { table: recovered });
    }
    let (name, open) = name.ok_or(ExtractError::MissingTableName)?;

    if !tokens.get(open).is_some_and(|t| t.is(&TokenKind::LParen)) {
        return Err(ExtractError::MissingColumnList { table: name });
    }
    let close = scanner::matching_paren(tokens, open)
        .ok_or_else(|| ExtractError::UnbalancedParentheses { table: Some(name.clone()) })?;

    let mut builder = TableBuilder::new(src, name);
    for entry in scanner::split_top_level(&tokens[open + 1..close]) {
        builder.entry(entry)?;
    }
    Ok(builder.finish())
}

/// Accumulates one table while its entries are classified
struct TableBuilder<'s> {
    src: &'s str,
    table: Table,
    uniques: Vec<Vec<String>>,
    inline_indexes: Vec<Vec<String>>,
}

impl<'s> TableBuilder<'s> {
    fn new(src: &'s str, name: String) -> Self {
        Self {
            src,
            table: Table::new(name),
            uniques: Vec::new(),
            inline_indexes: Vec::new(),
        }
    }

    fn malformed(&self, entry: &[Token], reason: &str) -> ExtractError {
        ExtractError::MalformedEntry {
            table: self.table.name.clone(),
            entry: scanner::source_text(self.src, entry).to_string(),
            reason: reason.to_string(),
        }
    }

    fn entry(&mut self, entry: &[Token]) -> Result<(), ExtractError> {
        let mut i = 0;
        let named_constraint = entry[0].is_keyword("CONSTRAINT");
        if named_constraint {
            // CONSTRAINT <name> <constraint>
            if !entry.get(1).is_some_and(Token::is_ident) {
                return Err(self.malformed(entry, "CONSTRAINT without a name"));
            }
            i = 2;
        }

        let Some(first) = entry.get(i) else {
            return Err(self.malformed(entry, "CONSTRAINT without a body"));
        };

        if first.is_keyword("PRIMARY") {
            return self.primary_key(entry, i + 1);
        }
        if first.is_keyword("FOREIGN") {
            return self.foreign_key(entry, i + 1);
        }
        if first.is_keyword("UNIQUE") {
            return self.unique(entry, i + 1);
        }
        if first.is_keyword("CHECK") || first.is_keyword("EXCLUDE") {
            return Ok(());
        }
        if named_constraint {
            return Err(self.malformed(entry, "unknown constraint type"));
        }
        if (first.is_keyword("INDEX") || first.is_keyword("KEY")) && self.inline_index(entry) {
            return Ok(());
        }
        self.column(entry)
    }

    fn primary_key(&mut self, entry: &[Token], i: usize) -> Result<(), ExtractError> {
        if !entry.get(i).is_some_and(|t| t.is_keyword("KEY")) {
            return Err(self.malformed(entry, "expected KEY after PRIMARY"));
        }
        let open = skip_index_method(entry, i + 1);
        let (columns, _) = column_list(entry, open)
            .ok_or_else(|| self.malformed(entry, "PRIMARY KEY needs a column list"))?;
        for column in columns {
            self.table.add_primary_key_column(column);
        }
        Ok(())
    }

    fn foreign_key(&mut self, entry: &[Token], i: usize) -> Result<(), ExtractError> {
        if !entry.get(i).is_some_and(|t| t.is_keyword("KEY")) {
            return Err(self.malformed(entry, "expected KEY after FOREIGN"));
        }
        let mut open = i + 1;
        // MySQL allows an index name here
        if entry.get(open).is_some_and(Token::is_ident) {
            open += 1;
        }
        let (columns, next) = column_list(entry, open)
            .ok_or_else(|| self.malformed(entry, "FOREIGN KEY needs a column list"))?;
        if !entry.get(next).is_some_and(|t| t.is_keyword("REFERENCES")) {
            return Err(self.malformed(entry, "FOREIGN KEY without REFERENCES"));
        }
        let fk = self
            .references(entry, next + 1, columns)
            .ok_or_else(|| self.malformed(entry, "REFERENCES needs a table name"))?;
        if !fk.referenced_columns.is_empty() && fk.referenced_columns.len() != fk.columns.len() {
            return Err(self.malformed(entry, "column counts differ between FOREIGN KEY and REFERENCES"));
        }
        self.table.foreign_keys.push(fk);
        Ok(())
    }

    /// Parse `<table> [(cols)]` after REFERENCES. An omitted column list
    /// means the referenced table's primary key and is filled in later.
    fn references(&self, entry: &[Token], i: usize, columns: Vec<String>) -> Option<ForeignKey> {
        let (table, next) = qualified_name(entry, i)?;
        let referenced = column_list(entry, next).map(|(c, _)| c).unwrap_or_default();
        Some(ForeignKey::new(columns, table, referenced))
    }

    fn unique(&mut self, entry: &[Token], mut i: usize) -> Result<(), ExtractError> {
        if entry.get(i).is_some_and(|t| t.is_keyword("KEY") || t.is_keyword("INDEX")) {
            i += 1;
        }
        if entry.get(i).is_some_and(Token::is_ident) && !entry[i].is_keyword("USING") {
            i += 1;
        }
        let open = skip_index_method(entry, i);
        let (columns, _) = column_list(entry, open)
            .ok_or_else(|| self.malformed(entry, "UNIQUE needs a column list"))?;
        self.uniques.push(columns);
        Ok(())
    }

    /// MySQL `INDEX [name] (cols)` / `KEY [name] (cols)`. Returns false when
    /// the entry is really a column called `key` or `index`.
    fn inline_index(&mut self, entry: &[Token]) -> bool {
        let mut i = 1;
        if entry.get(i).is_some_and(Token::is_ident) && entry.get(i + 1).is_some_and(|t| t.is(&TokenKind::LParen)) {
            i += 1;
        }
        match column_list(entry, i) {
            Some((columns, _)) => {
                self.inline_indexes.push(columns);
                true
            }
            None => false,
        }
    }

    fn column(&mut self, entry: &[Token]) -> Result<(), ExtractError> {
        let name = entry[0]
            .ident()
            .ok_or_else(|| self.malformed(entry, "expected a column name"))?;

        // type runs until the first inline constraint keyword at depth 0
        let mut i = 1;
        let mut depth = 0usize;
        while let Some(token) = entry.get(i) {
            match token.kind {
                TokenKind::LParen => depth += 1,
                TokenKind::RParen => depth = depth.saturating_sub(1),
                _ if depth == 0 && is_column_constraint(token) => break,
                _ => {}
            }
            i += 1;
        }
        let data_type = scanner::source_text(self.src, &entry[1..i]).to_string();
        let mut column = Column::new(name.clone(), data_type);
        let mut primary = false;

        while let Some(token) = entry.get(i) {
            i += 1;
            if token.is_keyword("NOT") {
                if entry.get(i).is_some_and(|t| t.is_keyword("NULL")) {
                    column.not_null = true;
                    i += 1;
                }
            } else if token.is_keyword("UNIQUE") {
                column.unique = true;
                if entry.get(i).is_some_and(|t| t.is_keyword("KEY")) {
                    i += 1;
                }
            } else if token.is_keyword("PRIMARY") {
                if !entry.get(i).is_some_and(|t| t.is_keyword("KEY")) {
                    return Err(self.malformed(entry, "expected KEY after PRIMARY"));
                }
                primary = true;
                i += 1;
            } else if token.is_keyword("DEFAULT") {
                column.has_default = true;
                i = skip_expression(entry, i);
            } else if token.is_keyword("CHECK") {
                i = skip_group(entry, i);
            } else if token.is_keyword("CONSTRAINT") {
                i += 1;
            } else if token.is_keyword("REFERENCES") {
                let fk = self
                    .references(entry, i, vec![name.clone()])
                    .ok_or_else(|| self.malformed(entry, "REFERENCES needs a table name"))?;
                if fk.referenced_columns.len() > 1 {
                    return Err(self.malformed(entry, "inline REFERENCES lists several columns"));
                }
                i = skip_references(entry, i);
                self.table.foreign_keys.push(fk);
            } else if token.is(&TokenKind::LParen) {
                i = skip_group(entry, i - 1);
            }
        }

        self.table.columns.push(column);
        if primary {
            self.table.add_primary_key_column(name.clone());
        }
        if self.table.columns.last().is_some_and(|c| c.unique) {
            self.uniques.push(vec![name]);
        }
        Ok(())
    }

    /// Validate key and index columns against the declared columns, then
    /// mark indexed columns
    fn finish(mut self) -> ParsedTable {
        let mut warnings = Vec::new();
        let table_name = self.table.name.clone();
        let unknown = |column: &str, constraint: &'static str| ExtractError::UnknownKeyColumn {
            table: table_name.clone(),
            column: column.to_string(),
            constraint,
        };

        let declared: Vec<String> = self.table.columns.iter().map(|c| c.name.clone()).collect();
        let is_declared = |c: &str| declared.iter().any(|d| d == c);

        let primary_key = std::mem::take(&mut self.table.primary_key);
        for column in primary_key {
            if is_declared(column.as_str()) {
                self.table.add_primary_key_column(column);
            } else {
                warnings.push(unknown(column.as_str(), "PRIMARY KEY"));
            }
        }
        for column in self.table.primary_key.clone() {
            self.table.mark_indexed(column);
        }

        for unique in std::mem::take(&mut self.uniques) {
            match unique.iter().find(|c| !is_declared(c.as_str())) {
                Some(missing) => warnings.push(unknown(missing.as_str(), "UNIQUE")),
                None => self.table.add_unique_constraint(unique),
            }
        }

        for index in std::mem::take(&mut self.inline_indexes) {
            match index.iter().find(|c| !is_declared(c.as_str())) {
                Some(missing) => warnings.push(unknown(missing.as_str(), "INDEX")),
                None => index.into_iter().for_each(|c| self.table.mark_indexed(c)),
            }
        }

        ParsedTable {
            table: self.table,
            warnings,
        }
    }
}

/// Keywords that end a column's type
const COLUMN_CONSTRAINTS: &[&str] = &[
    "NOT",
    "NULL",
    "UNIQUE",
    "PRIMARY",
    "DEFAULT",
    "CHECK",
    "REFERENCES",
    "CONSTRAINT",
    "COLLATE",
    "GENERATED",
    "AUTO_INCREMENT",
    "AUTOINCREMENT",
    "IDENTITY",
    "COMMENT",
];

fn is_column_constraint(token: &Token) -> bool {
    COLUMN_CONSTRAINTS.iter().any(|k| token.is_keyword(k))
}

/// Skip a parenthesized group starting at `i` if there is one
fn skip_group(tokens: &[Token], i: usize) -> usize {
    match scanner::matching_paren(tokens, i) {
        Some(close) => close + 1,
        None => i,
    }
}

/// Skip `USING <method>` before a key column list
fn skip_index_method(tokens: &[Token], i: usize) -> usize {
    if tokens.get(i).is_some_and(|t| t.is_keyword("USING")) {
        i + 2
    } else {
        i
    }
}

/// Skip a DEFAULT expression: a term, optionally followed by operator/term
/// pairs (`0`, `now()`, `'x'::text`, `-1`, `(a + b)`)
fn skip_expression(tokens: &[Token], mut i: usize) -> usize {
    loop {
        while tokens.get(i).is_some_and(|t| matches!(t.kind, TokenKind::Other(_))) {
            i += 1;
        }
        match tokens.get(i) {
            Some(t) if t.is(&TokenKind::LParen) => i = skip_group(tokens, i),
            Some(t) if is_column_constraint(t) && !t.is_keyword("NULL") => return i,
            Some(_) => {
                i += 1;
                if tokens.get(i).is_some_and(|t| t.is(&TokenKind::LParen)) {
                    i = skip_group(tokens, i);
                }
            }
            None => return i,
        }
        if !tokens.get(i).is_some_and(|t| matches!(t.kind, TokenKind::Other(_))) {
            return i;
        }
    }
}

/// Skip `<table> [(cols)] [ON DELETE ...] [MATCH ...]` after REFERENCES
fn skip_references(tokens: &[Token], i: usize) -> usize {
    let mut i = match qualified_name(tokens, i) {
        Some((_, next)) => next,
        None => return i,
    };
    i = skip_group(tokens, i);
    while let Some(token) = tokens.get(i) {
        let set_action = i > 0 && tokens[i - 1].is_keyword("SET");
        if is_column_constraint(token) && !token.is_keyword("NULL") && !set_action {
            break;
        }
        i += 1;
    }
    i
}

/// Fill in omitted REFERENCES column lists with the target's primary key
fn resolve_implicit_references(schema: &mut Schema) {
    let mut resolved: Vec<(String, usize, Vec<String>)> = Vec::new();
    for table in schema.tables() {
        for (idx, fk) in table.foreign_keys.iter().enumerate() {
            if !fk.referenced_columns.is_empty() {
                continue;
            }
            if let Some(target) = schema.table(&fk.referenced_table) {
                if target.primary_key.len() == fk.columns.len() {
                    resolved.push((table.name.clone(), idx, target.primary_key.clone()));
                }
            }
        }
    }
    for (table, idx, columns) in resolved {
        if let Some(fk) = schema.table_mut(&table).and_then(|t| t.foreign_keys.get_mut(idx)) {
            fk.referenced_columns = columns;
        }
    }
}

fn index_foreign_keys(schema: &mut Schema) {
    let names: Vec<String> = schema.table_names().into_iter().map(String::from).collect();
    for name in names {
        if let Some(table) = schema.table_mut(&name) {
            let fk_columns: Vec<String> = table
                .foreign_keys
                .iter()
                .flat_map(|fk| fk.columns.iter().cloned())
                .filter(|c| table.has_column(c))
                .collect();
            fk_columns.into_iter().for_each(|c| table.mark_indexed(c));
        }
    }
}

/// A `CREATE INDEX` waiting for its table
#[derive(Debug, Clone)]
struct PendingIndex {
    name: String,
    table: String,
    columns: Vec<String>,
    unique: bool,
}

fn parse_create_index(tokens: &[Token], head: usize, unique: bool) -> Option<PendingIndex> {
    let mut i = head;
    if tokens.get(i).is_some_and(|t| t.is_keyword("CONCURRENTLY")) {
        i += 1;
    }
    i = skip_if_exists(tokens, i);
    let mut name = String::from("<unnamed>");
    if !tokens.get(i).is_some_and(|t| t.is_keyword("ON")) {
        let (index_name, next) = qualified_name(tokens, i)?;
        name = index_name;
        i = next;
    }
    if !tokens.get(i).is_some_and(|t| t.is_keyword("ON")) {
        return None;
    }
    i += 1;
    if tokens.get(i).is_some_and(|t| t.is_keyword("ONLY")) {
        i += 1;
    }
    let (table, next) = qualified_name(tokens, i)?;
    let open = skip_index_method(tokens, next);
    let close = scanner::matching_paren(tokens, open)?;

    // expression entries such as lower(email) are not plain columns
    let columns: Vec<String> = scanner::split_top_level(&tokens[open + 1..close])
        .into_iter()
        .filter(|entry| !entry.get(1).is_some_and(|t| t.is(&TokenKind::LParen)))
        .filter_map(|entry| entry.first().and_then(Token::ident))
        .collect();

    Some(PendingIndex {
        name,
        table,
        columns,
        unique,
    })
}

fn apply_index(schema: &mut Schema, index: PendingIndex) -> Result<(), ExtractError> {
    let Some(table) = schema.table_mut(&index.table) else {
        return Err(ExtractError::UnknownIndexTarget {
            index: index.name,
            table: index.table,
            column: None,
        });
    };
    if let Some(missing) = index.columns.iter().find(|c| !table.has_column(c)) {
        return Err(ExtractError::UnknownIndexTarget {
            index: index.name,
            table: index.table.clone(),
            column: Some(missing.clone()),
        });
    }
    tracing::debug!(index = %index.name, table = %index.table, "applying index");
    if index.unique && !index.columns.is_empty() {
        table.add_unique_constraint(index.columns);
    } else {
        index.columns.into_iter().for_each(|c| table.mark_indexed(c));
    }
    Ok(())
}
