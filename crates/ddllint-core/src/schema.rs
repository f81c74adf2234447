//! Schema model extracted from DDL

use serde::{Deserialize, Serialize};

/// A column declaration
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Column {
    /// Column name
    pub name: String,

    /// Declared type, verbatim (e.g. `DECIMAL(10,2)`)
    pub data_type: String,

    /// Declared `NOT NULL`
    pub not_null: bool,

    /// Declared `UNIQUE`, inline or as a single-column table constraint
    pub unique: bool,

    /// Has a `DEFAULT` clause
    pub has_default: bool,
}

impl Column {
    /// Create a nullable column without constraints
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
            not_null: false,
            unique: false,
            has_default: false,
        }
    }
}

/// A declared foreign key
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ForeignKey {
    /// Local column names, in declaration order
    pub columns: Vec<String>,

    /// Referenced table name
    pub referenced_table: String,

    /// Referenced column names, in declaration order
    pub referenced_columns: Vec<String>,
}

impl ForeignKey {
    pub fn new(
        columns: Vec<String>,
        referenced_table: impl Into<String>,
        referenced_columns: Vec<String>,
    ) -> Self {
        Self {
            columns,
            referenced_table: referenced_table.into(),
            referenced_columns,
        }
    }

    /// True when exactly one local column is involved
    pub fn is_single_column(&self) -> bool {
        self.columns.len() == 1
    }

    /// Whether `column` is one of the local columns
    pub fn covers(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
    }

    /// `table(col, ...)` rendering of the target
    pub fn target_display(&self) -> String {
        format!("{}({})", self.referenced_table, self.referenced_columns.join(", "))
    }
}

/// A table declaration
///
/// `indexed` is a heuristic: primary-key columns, unique columns, columns of
/// explicit indexes and (by policy) foreign-key columns. It does not mean the
/// database actually has an index there.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    /// Table name, unique within the schema
    pub name: String,

    /// Columns in declaration order
    pub columns: Vec<Column>,

    /// Primary-key column names, in key order
    pub primary_key: Vec<String>,

    /// Declared foreign keys, in declaration order
    pub foreign_keys: Vec<ForeignKey>,

    /// Unique constraints (single or composite)
    pub unique_constraints: Vec<Vec<String>>,

    /// Columns considered indexed
    pub indexed: Vec<String>,
}

impl Table {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
            primary_key: Vec::new(),
            foreign_keys: Vec::new(),
            unique_constraints: Vec::new(),
            indexed: Vec::new(),
        }
    }

    /// Find a column by name
    pub fn find_column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.find_column(name).is_some()
    }

    /// Get column names
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn has_primary_key(&self) -> bool {
        !self.primary_key.is_empty()
    }

    pub fn is_primary_key_column(&self, name: &str) -> bool {
        self.primary_key.iter().any(|c| c == name)
    }

    pub fn is_indexed(&self, name: &str) -> bool {
        self.indexed.iter().any(|c| c == name)
    }

    /// Whether `name` alone identifies a row: a single-column primary key or
    /// a single-column unique constraint
    pub fn is_unique_column(&self, name: &str) -> bool {
        if self.primary_key.len() == 1 && self.primary_key[0] == name {
            return true;
        }
        self.find_column(name).is_some_and(|c| c.unique)
            || self
                .unique_constraints
                .iter()
                .any(|u| u.len() == 1 && u[0] == name)
    }

    /// Whether any declared foreign key lists `name` as a local column
    pub fn has_foreign_key_on(&self, name: &str) -> bool {
        self.foreign_keys.iter().any(|fk| fk.covers(name))
    }

    /// Primary-key columns followed by foreign-key local columns, without
    /// duplicates
    pub fn key_columns(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = Vec::new();
        let fk_columns = self.foreign_keys.iter().flat_map(|fk| fk.columns.iter());
        for name in self.primary_key.iter().chain(fk_columns) {
            if !keys.contains(&name.as_str()) {
                keys.push(name);
            }
        }
        keys
    }

    /// Add a primary-key column, ignoring repeats
    pub fn add_primary_key_column(&mut self, name: impl Into<String>) {
        push_unique(&mut self.primary_key, name.into());
    }

    /// Mark a column as indexed, ignoring repeats
    pub fn mark_indexed(&mut self, name: impl Into<String>) {
        push_unique(&mut self.indexed, name.into());
    }

    /// Record a unique constraint and index its columns
    pub fn add_unique_constraint(&mut self, columns: Vec<String>) {
        if columns.len() == 1 {
            if let Some(col) = self.columns.iter_mut().find(|c| c.name == columns[0]) {
                col.unique = true;
            }
        }
        for name in &columns {
            self.mark_indexed(name.clone());
        }
        if !self.unique_constraints.contains(&columns) {
            self.unique_constraints.push(columns);
        }
    }
}

fn push_unique(names: &mut Vec<String>, name: String) {
    if !names.contains(&name) {
        names.push(name);
    }
}

/// Ordered collection of tables, in declaration order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    tables: Vec<Table>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a table. A table whose name is already taken is handed back.
    pub fn insert(&mut self, table: Table) -> Result<(), Table> {
        if self.contains_table(&table.name) {
            return Err(table);
        }
        self.tables.push(table);
        Ok(())
    }

    /// Find a table by name
    pub fn table(&self, name: &str) -> Option<&Table> {
        self.tables.iter().find(|t| t.name == name)
    }

    /// Mutable lookup, used while the extractor is still building the schema
    pub fn table_mut(&mut self, name: &str) -> Option<&mut Table> {
        self.tables.iter_mut().find(|t| t.name == name)
    }

    pub fn contains_table(&self, name: &str) -> bool {
        self.table(name).is_some()
    }

    /// Tables in declaration order
    pub fn tables(&self) -> &[Table] {
        &self.tables
    }

    pub fn table_names(&self) -> Vec<&str> {
        self.tables.iter().map(|t| t.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}
