//! Structural rules over an extracted schema
//!
//! Every rule is a pure function of the [`Schema`]: it reads tables in
//! declaration order and returns its findings without touching shared state.
//! [`RULES`] lists them in evaluation order.

use ddllint_core::{Finding, FindingCode, ForeignKey, Schema, Table};

/// Signature shared by all rules
pub type RuleFn = fn(&Schema) -> Vec<Finding>;

/// A named rule and the finding codes it can emit
#[derive(Clone, Copy)]
pub struct Rule {
    pub name: &'static str,
    pub codes: &'static [FindingCode],
    pub check: RuleFn,
}

impl Rule {
    /// Run the rule against a schema
    pub fn run(&self, schema: &Schema) -> Vec<Finding> {
        (self.check)(schema)
    }
}

/// All rules, in evaluation order
pub static RULES: [Rule; 9] = [
    Rule {
        name: "missing-primary-key",
        codes: &[FindingCode::MissingPrimaryKey],
        check: missing_primary_key,
    },
    Rule {
        name: "dangling-foreign-key",
        codes: &[FindingCode::DanglingForeignKey],
        check: dangling_foreign_key,
    },
    Rule {
        name: "unindexed-key-column",
        codes: &[FindingCode::UnindexedKeyColumn],
        check: unindexed_key_column,
    },
    Rule {
        name: "implicit-relationship",
        codes: &[FindingCode::ImplicitRelationship],
        check: implicit_relationship,
    },
    Rule {
        name: "many-to-many-shape",
        codes: &[FindingCode::ManyToManyJunction, FindingCode::JunctionKeyNotComposite],
        check: many_to_many_shape,
    },
    Rule {
        name: "foreign-key-unknown-local-column",
        codes: &[FindingCode::ForeignKeyUnknownLocalColumn],
        check: foreign_key_unknown_local_column,
    },
    Rule {
        name: "foreign-key-non-key-target",
        codes: &[FindingCode::ForeignKeyNonKeyTarget],
        check: foreign_key_non_key_target,
    },
    Rule {
        name: "foreign-key-naming",
        codes: &[FindingCode::ForeignKeyNaming],
        check: foreign_key_naming,
    },
    Rule {
        name: "one-to-many-relationship",
        codes: &[FindingCode::OneToManyRelationship],
        check: one_to_many_relationship,
    },
];

/// Tables without a primary key
pub fn missing_primary_key(schema: &Schema) -> Vec<Finding> {
    schema
        .tables()
        .iter()
        .filter(|table| !table.has_primary_key())
        .map(|table| {
            Finding::error(
                FindingCode::MissingPrimaryKey,
                format!("Table '{}' has no primary key defined", table.name),
            )
            .with_table(&table.name)
        })
        .collect()
}

/// Foreign keys whose target table or column is not declared
pub fn dangling_foreign_key(schema: &Schema) -> Vec<Finding> {
    let mut findings = Vec::new();

    for table in schema.tables() {
        for fk in &table.foreign_keys {
            let local = fk.columns.join(", ");

            let Some(target) = schema.table(&fk.referenced_table) else {
                findings.push(
                    Finding::error(
                        FindingCode::DanglingForeignKey,
                        format!(
                            "Foreign key '{}' in table '{}' references non-existent table '{}'",
                            local, table.name, fk.referenced_table
                        ),
                    )
                    .with_table(&table.name)
                    .with_column(&local),
                );
                continue;
            };

            if fk.referenced_columns.is_empty() {
                findings.push(
                    Finding::error(
                        FindingCode::DanglingForeignKey,
                        format!(
                            "Foreign key '{}' in table '{}' references table '{}' without a matching primary key",
                            local, table.name, target.name
                        ),
                    )
                    .with_table(&table.name)
                    .with_column(&local),
                );
                continue;
            }

            for (column, referenced) in fk.columns.iter().zip(&fk.referenced_columns) {
                if !target.has_column(referenced) {
                    findings.push(
                        Finding::error(
                            FindingCode::DanglingForeignKey,
                            format!(
                                "Foreign key '{}' in table '{}' references non-existent column '{}' in table '{}'",
                                column, table.name, referenced, target.name
                            ),
                        )
                        .with_table(&table.name)
                        .with_column(column),
                    );
                }
            }
        }
    }

    findings
}

/// Primary-key and foreign-key columns that are not indexed
///
/// Foreign-key columns the table does not declare are left to
/// [`foreign_key_unknown_local_column`].
pub fn unindexed_key_column(schema: &Schema) -> Vec<Finding> {
    let mut findings = Vec::new();

    for table in schema.tables() {
        for column in table.key_columns() {
            if table.has_column(column) && !table.is_indexed(column) {
                findings.push(
                    Finding::warning(
                        FindingCode::UnindexedKeyColumn,
                        format!("Key column '{}' in table '{}' is not indexed", column, table.name),
                    )
                    .with_table(&table.name)
                    .with_column(column),
                );
            }
        }
    }

    findings
}

/// Columns named after another table with no foreign key behind them
///
/// A column `user` or `user_id` matches a table `users`.
pub fn implicit_relationship(schema: &Schema) -> Vec<Finding> {
    let mut findings = Vec::new();

    for table in schema.tables() {
        for column in &table.columns {
            if table.has_foreign_key_on(&column.name) {
                continue;
            }

            let referenced = schema
                .tables()
                .iter()
                .filter(|other| other.name != table.name)
                .find(|other| names_table(&column.name, &other.name));

            if let Some(referenced) = referenced {
                findings.push(
                    Finding::info(
                        FindingCode::ImplicitRelationship,
                        format!(
                            "Column '{}' in table '{}' looks like a reference to table '{}' but no foreign key is declared; \
                             likely a one-to-many relationship from '{}' to '{}'",
                            column.name, table.name, referenced.name, referenced.name, table.name
                        ),
                    )
                    .with_table(&table.name)
                    .with_column(&column.name),
                );
            }
        }
    }

    findings
}

/// Two-column tables made of two foreign keys to distinct tables
pub fn many_to_many_shape(schema: &Schema) -> Vec<Finding> {
    let mut findings = Vec::new();

    for table in schema.tables() {
        let Some((left, right)) = junction_keys(table) else {
            continue;
        };

        findings.push(
            Finding::info(
                FindingCode::ManyToManyJunction,
                format!(
                    "Table '{}' is a many-to-many junction between '{}' and '{}'",
                    table.name, left.referenced_table, right.referenced_table
                ),
            )
            .with_table(&table.name),
        );

        let pair = [left.columns[0].as_str(), right.columns[0].as_str()];
        let strict_subset = table.has_primary_key()
            && table.primary_key.len() < pair.len()
            && table.primary_key.iter().all(|c| pair.contains(&c.as_str()));

        if strict_subset {
            findings.push(
                Finding::error(
                    FindingCode::JunctionKeyNotComposite,
                    format!(
                        "Table '{}' primary key ({}) should be the composite of both foreign key columns ({}, {})",
                        table.name,
                        table.primary_key.join(", "),
                        pair[0],
                        pair[1]
                    ),
                )
                .with_table(&table.name),
            );
        }
    }

    findings
}

/// Foreign keys listing a local column the table does not declare
pub fn foreign_key_unknown_local_column(schema: &Schema) -> Vec<Finding> {
    let mut findings = Vec::new();

    for table in schema.tables() {
        for fk in &table.foreign_keys {
            for column in fk.columns.iter().filter(|c| !table.has_column(c)) {
                findings.push(
                    Finding::error(
                        FindingCode::ForeignKeyUnknownLocalColumn,
                        format!(
                            "Foreign key in table '{}' names undeclared column '{}'",
                            table.name, column
                        ),
                    )
                    .with_table(&table.name)
                    .with_column(column),
                );
            }
        }
    }

    findings
}

/// Foreign keys pointing at columns that are neither primary nor unique key
pub fn foreign_key_non_key_target(schema: &Schema) -> Vec<Finding> {
    let mut findings = Vec::new();

    for table in schema.tables() {
        for fk in &table.foreign_keys {
            let Some(target) = schema.table(&fk.referenced_table) else {
                continue;
            };
            if fk.referenced_columns.is_empty()
                || !fk.referenced_columns.iter().all(|c| target.has_column(c))
            {
                continue;
            }

            if !is_key_of(target, &fk.referenced_columns) {
                findings.push(
                    Finding::warning(
                        FindingCode::ForeignKeyNonKeyTarget,
                        format!(
                            "Foreign key '{}' in table '{}' references {} which is not a primary or unique key",
                            fk.columns.join(", "),
                            table.name,
                            fk.target_display()
                        ),
                    )
                    .with_table(&table.name)
                    .with_column(fk.columns.join(", ")),
                );
            }
        }
    }

    findings
}

/// Single-column foreign keys not named `<something>_id`
pub fn foreign_key_naming(schema: &Schema) -> Vec<Finding> {
    let mut findings = Vec::new();

    for table in schema.tables() {
        for fk in table.foreign_keys.iter().filter(|fk| fk.is_single_column()) {
            let column = &fk.columns[0];
            if column.ends_with("_id") {
                continue;
            }
            findings.push(
                Finding::info(
                    FindingCode::ForeignKeyNaming,
                    format!(
                        "Foreign key column '{}' in table '{}' does not follow the naming convention; consider '{}_id'",
                        column,
                        table.name,
                        singular(&fk.referenced_table)
                    ),
                )
                .with_table(&table.name)
                .with_column(column),
            );
        }
    }

    findings
}

/// Declared foreign keys of non-junction tables, as relationship notes
pub fn one_to_many_relationship(schema: &Schema) -> Vec<Finding> {
    let mut findings = Vec::new();

    for table in schema.tables() {
        if junction_keys(table).is_some() {
            continue;
        }
        for fk in &table.foreign_keys {
            findings.push(
                Finding::info(
                    FindingCode::OneToManyRelationship,
                    format!(
                        "One-to-many relationship: each '{}' row can have many '{}' rows via {}",
                        fk.referenced_table,
                        table.name,
                        fk.columns.join(", ")
                    ),
                )
                .with_table(&table.name)
                .with_column(fk.columns.join(", ")),
            );
        }
    }

    findings
}

/// The two foreign keys of a junction-shaped table, in column order
///
/// The table must have exactly two columns, each the sole local column of a
/// foreign key, pointing at two distinct tables other than itself.
pub fn junction_keys(table: &Table) -> Option<(&ForeignKey, &ForeignKey)> {
    if table.columns.len() != 2 {
        return None;
    }

    let key_for = |column: &str| {
        table
            .foreign_keys
            .iter()
            .find(|fk| fk.is_single_column() && fk.covers(column))
    };
    let left = key_for(&table.columns[0].name)?;
    let right = key_for(&table.columns[1].name)?;

    let distinct = left.referenced_table != right.referenced_table;
    let external = left.referenced_table != table.name && right.referenced_table != table.name;
    (distinct && external).then_some((left, right))
}

fn is_key_of(table: &Table, columns: &[String]) -> bool {
    if let [column] = columns {
        return table.is_unique_column(column);
    }
    same_set(&table.primary_key, columns)
        || table.unique_constraints.iter().any(|u| same_set(u, columns))
}

fn same_set(a: &[String], b: &[String]) -> bool {
    a.len() == b.len() && a.iter().all(|c| b.contains(c))
}

fn names_table(column: &str, table: &str) -> bool {
    let stem = singular(table);
    column == stem || column.strip_suffix("_id") == Some(stem.as_str())
}

/// Naive English singular of a table name
///
/// `categories` → `category`, `addresses` → `address`, `boxes` → `box`,
/// `users` → `user`. Names not ending in `s`, or ending in `ss`, are
/// returned unchanged.
pub fn singular(name: &str) -> String {
    if let Some(stem) = name.strip_suffix("ies") {
        if !stem.is_empty() {
            return format!("{}y", stem);
        }
    }
    for suffix in ["sses", "xes", "ches", "shes"] {
        if name.len() > suffix.len() && name.ends_with(suffix) {
            return name[..name.len() - 2].to_string();
        }
    }
    match name.strip_suffix('s') {
        Some(stem) if !stem.is_empty() && !stem.ends_with('s') => stem.to_string(),
        _ => name.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ddllint_core::{Column, Severity};

    fn table(name: &str, columns: &[&str], pk: &[&str]) -> Table {
        let mut table = Table::new(name);
        for column in columns {
            table.columns.push(Column::new(*column, "INT"));
        }
        for column in pk {
            table.add_primary_key_column(*column);
            table.mark_indexed(*column);
        }
        table
    }

    fn with_fk(mut table: Table, column: &str, target: &str, target_column: &str) -> Table {
        table.foreign_keys.push(ForeignKey::new(
            vec![column.to_string()],
            target,
            vec![target_column.to_string()],
        ));
        table.mark_indexed(column);
        table
    }

    fn schema(tables: Vec<Table>) -> Schema {
        let mut schema = Schema::new();
        for table in tables {
            schema.insert(table).unwrap();
        }
        schema
    }

    fn codes(findings: &[Finding]) -> Vec<FindingCode> {
        findings.iter().map(|f| f.code).collect()
    }

    #[test]
    fn singular_forms() {
        assert_eq!(singular("users"), "user");
        assert_eq!(singular("categories"), "category");
        assert_eq!(singular("addresses"), "address");
        assert_eq!(singular("boxes"), "box");
        assert_eq!(singular("branches"), "branch");
        assert_eq!(singular("wishes"), "wish");
        assert_eq!(singular("glass"), "glass");
        assert_eq!(singular("staff"), "staff");
        assert_eq!(singular("s"), "s");
    }

    #[test]
    fn missing_primary_key_names_table() {
        let schema = schema(vec![table("logs", &["entry"], &[]), table("t", &["id"], &["id"])]);
        let findings = missing_primary_key(&schema);

        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].severity, Severity::Error);
        assert_eq!(findings[0].table.as_deref(), Some("logs"));
    }

    #[test]
    fn dangling_table_and_column() {
        let schema = schema(vec![
            table("users", &["user_id"], &["user_id"]),
            with_fk(table("orders", &["order_id", "user_id"], &["order_id"]), "user_id", "users", "id"),
            with_fk(table("payments", &["payment_id", "invoice_id"], &["payment_id"]), "invoice_id", "invoices", "invoice_id"),
        ]);

        let findings = dangling_foreign_key(&schema);
        assert_eq!(findings.len(), 2);
        assert!(findings[0].message.contains("non-existent column 'id'"));
        assert_eq!(findings[0].column.as_deref(), Some("user_id"));
        assert!(findings[1].message.contains("non-existent table 'invoices'"));
        assert_eq!(findings[1].table.as_deref(), Some("payments"));
    }

    #[test]
    fn unresolved_implicit_reference_is_dangling() {
        let mut orders = table("orders", &["order_id", "note_id"], &["order_id"]);
        orders
            .foreign_keys
            .push(ForeignKey::new(vec!["note_id".to_string()], "notes", Vec::new()));
        let schema = schema(vec![table("notes", &["body"], &[]), orders]);

        let findings = dangling_foreign_key(&schema);
        assert_eq!(findings.len(), 1);
        assert!(findings[0].message.contains("without a matching primary key"));
    }

    #[test]
    fn unindexed_foreign_key_column() {
        let mut orders = table("orders", &["order_id", "user_id"], &["order_id"]);
        orders
            .foreign_keys
            .push(ForeignKey::new(vec!["user_id".to_string()], "users", vec!["user_id".to_string()]));
        let schema = schema(vec![table("users", &["user_id"], &["user_id"]), orders]);

        let findings = unindexed_key_column(&schema);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].severity, Severity::Warning);
        assert_eq!(findings[0].column.as_deref(), Some("user_id"));
    }

    #[test]
    fn implicit_relationship_by_name() {
        let schema = schema(vec![
            table("users", &["user_id"], &["user_id"]),
            table("orders", &["order_id", "user"], &["order_id"]),
            table("reviews", &["review_id", "user_id"], &["review_id"]),
        ]);

        let findings = implicit_relationship(&schema);
        assert_eq!(findings.len(), 2);
        assert_eq!(findings[0].table.as_deref(), Some("orders"));
        assert_eq!(findings[0].column.as_deref(), Some("user"));
        assert!(findings[0].message.contains("'users'"));
        assert_eq!(findings[1].table.as_deref(), Some("reviews"));
    }

    #[test]
    fn declared_foreign_key_suppresses_implicit_note() {
        let schema = schema(vec![
            table("users", &["user_id"], &["user_id"]),
            with_fk(table("orders", &["order_id", "user_id"], &["order_id"]), "user_id", "users", "user_id"),
        ]);

        assert!(implicit_relationship(&schema).is_empty());
    }

    #[test]
    fn junction_with_single_column_key() {
        let junction = table("product_categories", &["product_id", "category_id"], &["product_id"]);
        let junction = with_fk(junction, "product_id", "products", "product_id");
        let junction = with_fk(junction, "category_id", "categories", "category_id");
        let schema = schema(vec![
            table("products", &["product_id"], &["product_id"]),
            table("categories", &["category_id"], &["category_id"]),
            junction,
        ]);

        let findings = many_to_many_shape(&schema);
        assert_eq!(
            codes(&findings),
            vec![FindingCode::ManyToManyJunction, FindingCode::JunctionKeyNotComposite]
        );
        assert_eq!(findings[0].severity, Severity::Info);
        assert_eq!(findings[1].severity, Severity::Error);
    }

    #[test]
    fn composite_junction_key_is_fine() {
        let junction = table("tags_posts", &["tag_id", "post_id"], &["tag_id", "post_id"]);
        let junction = with_fk(junction, "tag_id", "tags", "tag_id");
        let junction = with_fk(junction, "post_id", "posts", "post_id");
        let schema = schema(vec![junction]);

        assert_eq!(codes(&many_to_many_shape(&schema)), vec![FindingCode::ManyToManyJunction]);
    }

    #[test]
    fn junction_needs_distinct_targets() {
        let links = table("links", &["from_id", "to_id"], &[]);
        let links = with_fk(links, "from_id", "pages", "page_id");
        let links = with_fk(links, "to_id", "pages", "page_id");

        assert!(junction_keys(&links).is_none());
    }

    #[test]
    fn unknown_local_column() {
        let orders = with_fk(table("orders", &["order_id"], &["order_id"]), "customer_id", "customers", "customer_id");
        let findings = foreign_key_unknown_local_column(&schema(vec![orders]));

        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].column.as_deref(), Some("customer_id"));
    }

    #[test]
    fn non_key_target() {
        let users = table("users", &["user_id", "email"], &["user_id"]);
        let orders = with_fk(table("orders", &["order_id", "email"], &["order_id"]), "email", "users", "email");
        let findings = foreign_key_non_key_target(&schema(vec![users, orders]));

        assert_eq!(findings.len(), 1);
        assert!(findings[0].message.contains("users(email)"));
    }

    #[test]
    fn unique_target_is_a_key() {
        let mut users = table("users", &["user_id", "email"], &["user_id"]);
        users.add_unique_constraint(vec!["email".to_string()]);
        let orders = with_fk(table("orders", &["order_id", "email"], &["order_id"]), "email", "users", "email");

        assert!(foreign_key_non_key_target(&schema(vec![users, orders])).is_empty());
    }

    #[test]
    fn naming_suggests_singular_target() {
        let schema = schema(vec![
            table("categories", &["category_id"], &["category_id"]),
            with_fk(table("products", &["product_id", "category"], &["product_id"]), "category", "categories", "category_id"),
        ]);

        let findings = foreign_key_naming(&schema);
        assert_eq!(findings.len(), 1);
        assert!(findings[0].message.contains("'category_id'"));
    }

    #[test]
    fn one_to_many_skips_junctions() {
        let junction = table("product_categories", &["product_id", "category_id"], &["product_id"]);
        let junction = with_fk(junction, "product_id", "products", "product_id");
        let junction = with_fk(junction, "category_id", "categories", "category_id");
        let orders = with_fk(table("orders", &["order_id", "user_id"], &["order_id"]), "user_id", "users", "user_id");

        let findings = one_to_many_relationship(&schema(vec![junction, orders]));
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].table.as_deref(), Some("orders"));
    }

    #[test]
    fn rule_codes_follow_registry_order() {
        let codes: Vec<FindingCode> = RULES.iter().flat_map(|r| r.codes.iter().copied()).collect();
        let rule_codes: Vec<FindingCode> = FindingCode::ALL
            .iter()
            .copied()
            .filter(|c| !c.is_parse_stage())
            .collect();
        assert_eq!(codes, rule_codes);
    }
}
