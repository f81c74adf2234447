//! End-to-end tests: DDL text through extraction and every rule

use ddllint_core::{Config, Finding, FindingCode, Severity};
use ddllint_engine::{analyze, validate, RuleEngine};
use ddllint_sql::{extract, DdlExtractor, ExtractOptions};
use pretty_assertions::assert_eq;

const SHOP: &str = include_str!("../../../fixtures/shop.sql");

fn codes(findings: &[Finding]) -> Vec<(FindingCode, Option<&str>)> {
    findings.iter().map(|f| (f.code, f.table.as_deref())).collect()
}

#[test]
fn primary_key_table_has_no_findings() {
    let extraction = extract("CREATE TABLE t (id INT, PRIMARY KEY (id));");

    assert_eq!(extraction.schema.table("t").unwrap().primary_key, vec!["id"]);
    assert_eq!(validate(&extraction.schema), Vec::<Finding>::new());
}

#[test]
fn implicit_user_reference() {
    let schema = extract(
        "CREATE TABLE users (user_id INT NOT NULL, PRIMARY KEY (user_id));
         CREATE TABLE orders (order_id INT NOT NULL, user INT NOT NULL, PRIMARY KEY (order_id));",
    )
    .schema;

    let findings = validate(&schema);
    assert_eq!(findings.len(), 1);
    assert_eq!(findings[0].code, FindingCode::ImplicitRelationship);
    assert_eq!(findings[0].severity, Severity::Info);
    assert_eq!(findings[0].table.as_deref(), Some("orders"));
    assert_eq!(findings[0].column.as_deref(), Some("user"));
    assert!(findings[0].message.contains("'users'"));
}

#[test]
fn fixture_findings_in_rule_then_table_order() {
    let findings = validate(&extract(SHOP).schema);

    assert_eq!(
        codes(&findings),
        vec![
            (FindingCode::MissingPrimaryKey, Some("audit_log")),
            (FindingCode::ImplicitRelationship, Some("orders")),
            (FindingCode::ManyToManyJunction, Some("product_categories")),
            (FindingCode::JunctionKeyNotComposite, Some("product_categories")),
        ]
    );
}

#[test]
fn junction_scenario_severities() {
    let findings = validate(&extract(SHOP).schema);
    let junction: Vec<&Finding> = findings
        .iter()
        .filter(|f| f.table.as_deref() == Some("product_categories"))
        .collect();

    assert_eq!(junction.len(), 2);
    assert_eq!(junction[0].severity, Severity::Info);
    assert_eq!(junction[1].severity, Severity::Error);
    assert!(junction[1].message.contains("composite"));
}

#[test]
fn every_table_without_key_reported_once() {
    let schema = extract(
        "CREATE TABLE a (x INT);
         CREATE TABLE b (y INT PRIMARY KEY);
         CREATE TABLE c (z INT, w INT);",
    )
    .schema;

    let tables: Vec<String> = validate(&schema)
        .into_iter()
        .filter(|f| f.code == FindingCode::MissingPrimaryKey)
        .filter_map(|f| f.table)
        .collect();
    assert_eq!(tables, vec!["a", "c"]);
}

#[test]
fn dangling_reference_to_undeclared_table() {
    let findings = validate(
        &extract(
            "CREATE TABLE orders (
                 order_id INT PRIMARY KEY,
                 customer_id INT,
                 FOREIGN KEY (customer_id) REFERENCES customers(customer_id)
             );",
        )
        .schema,
    );

    assert_eq!(findings[0].code, FindingCode::DanglingForeignKey);
    assert_eq!(findings[0].severity, Severity::Error);
    assert_eq!(findings[0].column.as_deref(), Some("customer_id"));
    assert!(findings[0].message.contains("customers"));
}

#[test]
fn declared_relationships_and_naming() {
    let findings = validate(
        &extract(
            "CREATE TABLE users (user_id INT PRIMARY KEY, email TEXT);
             CREATE TABLE orders (
                 order_id INT PRIMARY KEY,
                 buyer INT REFERENCES users (user_id),
                 contact TEXT REFERENCES users (email)
             );",
        )
        .schema,
    );

    assert_eq!(
        findings.iter().map(|f| f.code).collect::<Vec<_>>(),
        vec![
            FindingCode::ForeignKeyNonKeyTarget,
            FindingCode::ForeignKeyNaming,
            FindingCode::ForeignKeyNaming,
            FindingCode::OneToManyRelationship,
            FindingCode::OneToManyRelationship,
        ]
    );
    assert!(findings[1].message.contains("'user_id'"));
}

#[test]
fn strict_index_policy_flags_foreign_key_columns() {
    let ddl = "CREATE TABLE users (user_id INT PRIMARY KEY);
               CREATE TABLE orders (order_id INT PRIMARY KEY, user_id INT REFERENCES users (user_id));";

    let strict = DdlExtractor::with_options(ExtractOptions { foreign_keys_indexed: false });
    let findings = validate(&strict.extract(ddl).schema);
    assert_eq!(findings[0].code, FindingCode::UnindexedKeyColumn);
    assert_eq!(findings[0].column.as_deref(), Some("user_id"));

    let indexed = format!("{ddl}\nCREATE INDEX idx_orders_user ON orders (user_id);");
    let findings = validate(&strict.extract(&indexed).schema);
    assert!(findings.iter().all(|f| f.code != FindingCode::UnindexedKeyColumn));
}

#[test]
fn validate_is_idempotent() {
    let schema = extract(SHOP).schema;
    assert_eq!(validate(&schema), validate(&schema));
}

#[test]
fn concurrent_evaluation_matches() {
    let schema = extract(SHOP).schema;
    let engine = RuleEngine::new(&Config::default());
    assert_eq!(engine.validate_concurrent(&schema), engine.validate(&schema));
}

#[test]
fn empty_input_yields_nothing() {
    assert_eq!(analyze("", &Config::default()), Vec::<Finding>::new());
}

#[test]
fn analyze_with_config() {
    let config = Config::from_toml(
        r#"
        [rules]
        disabled = ["IMPLICIT_RELATIONSHIP"]

        [severity.overrides]
        JUNCTION_KEY_NOT_COMPOSITE = "warning"
        "#,
    )
    .unwrap();

    let findings = analyze(SHOP, &config);
    assert!(findings.iter().all(|f| f.code != FindingCode::ImplicitRelationship));

    let junction = findings
        .iter()
        .find(|f| f.code == FindingCode::JunctionKeyNotComposite)
        .unwrap();
    assert_eq!(junction.severity, Severity::Warning);
}

#[test]
fn finding_json_shape() {
    let findings = validate(&extract("CREATE TABLE logs (entry TEXT);").schema);
    let json = serde_json::to_value(&findings[0]).unwrap();

    assert_eq!(json["code"], "MISSING_PRIMARY_KEY");
    assert_eq!(json["severity"], "error");
    assert_eq!(json["table"], "logs");
    assert!(json["column"].is_null());
}
