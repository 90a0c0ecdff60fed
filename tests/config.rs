use binlog_filter::{FilterConfig, SchemaTracker};
use event_filter::EventType;
use filter_core::{RowValue, TableRef};
use std::io::Write;
use std::sync::Arc;
use tempfile::NamedTempFile;

fn write_config(suffix: &str, content: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

const TOML_CONFIG: &str = r#"
[block_allow_list]
do_dbs = ["shop", "foo*"]

[[block_allow_list.ignore_tables]]
db_name = "shop"
tbl_name = "tmp_*"

[[event_rules]]
schema_pattern = "*"
events = ["drop table"]
sql_patterns = ['^drop\s+table']
action = "ignore"

[[expression_filters]]
schema = "shop"
table = "orders"
insert_value_expr = "state != 1"
update_old_value_expr = "state = 1"
update_new_value_expr = "state = 2"
"#;

#[test]
fn test_load_toml_and_build() {
    let file = write_config(".toml", TOML_CONFIG);
    let config = FilterConfig::from_file(file.path()).unwrap();
    config.validate().unwrap();

    let tracker = Arc::new(SchemaTracker::new());
    tracker
        .exec_ddl("shop", "CREATE TABLE orders (id INT, state TINYINT UNSIGNED)")
        .unwrap();
    let (classifier, row_filter) = config.build(tracker).unwrap();

    let skip = |tables: &[TableRef], sql: &str| {
        let stmt = mysql_statement::parse(sql).unwrap();
        classifier.skip_query(tables, &stmt, sql).unwrap()
    };
    let orders = [TableRef::new("shop", "orders")];
    assert!(!skip(&orders, "ALTER TABLE orders ADD COLUMN note TEXT"));
    assert!(skip(&orders, "DROP TABLE orders"));
    assert!(skip(&[TableRef::new("shop", "tmp_1")], "CREATE TABLE tmp_1 (id INT)"));
    assert!(skip(&[TableRef::new("crm", "users")], "CREATE TABLE users (id INT)"));

    let table = TableRef::new("shop", "orders");
    assert!(!classifier.skip_row_event(&table, EventType::Insert).unwrap());
    assert!(classifier
        .skip_row_event(&TableRef::new("crm", "users"), EventType::Insert)
        .unwrap());

    let row = |state: i8| vec![RowValue::Int32(1), RowValue::Int8(state)];
    assert!(row_filter.skip_insert(&table, &row(3)).unwrap());
    assert!(!row_filter.skip_insert(&table, &row(1)).unwrap());
    assert!(row_filter.skip_update(&table, &row(1), &row(2)).unwrap());
    assert!(!row_filter.skip_update(&table, &row(2), &row(2)).unwrap());
    assert!(!row_filter.skip_delete(&table, &row(3)).unwrap());
}

#[test]
fn test_yaml_and_json_files() {
    let yaml = write_config(
        ".yml",
        r#"
case_sensitive: true
event_rules:
  - schema_pattern: "Shop"
    events: ["all dml"]
    action: ignore
"#,
    );
    let config = FilterConfig::from_file(yaml.path()).unwrap();
    assert!(config.case_sensitive);

    let json = write_config(".json", &serde_json::to_string(&config).unwrap());
    assert_eq!(FilterConfig::from_file(json.path()).unwrap(), config);

    let classifier = config.build_classifier().unwrap();
    assert!(classifier
        .skip_row_event(&TableRef::new("Shop", "t"), EventType::Update)
        .unwrap());
    assert!(!classifier
        .skip_row_event(&TableRef::new("shop", "t"), EventType::Update)
        .unwrap());
}

#[test]
fn test_load_errors() {
    let unknown = write_config(".ini", "case_sensitive = true");
    assert!(FilterConfig::from_file(unknown.path()).is_err());

    let broken = write_config(".toml", "[[event_rules]\n");
    let err = FilterConfig::from_file(broken.path()).unwrap_err();
    assert!(format!("{err:#}").contains("Failed to parse config file"));

    let bad_rule = write_config(
        ".yaml",
        r#"
event_rules:
  - schema_pattern: "db"
    action: do
"#,
    );
    let config = FilterConfig::from_file(bad_rule.path()).unwrap();
    assert!(config.validate().is_err());
    assert!(config.build_classifier().is_err());

    assert!(FilterConfig::from_file("/nonexistent/filter.toml").is_err());
}
