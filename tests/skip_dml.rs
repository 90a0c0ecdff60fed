use binlog_filter::{ExpressionBinder, SchemaTracker};
use filter_core::RowValue;
use mysql_async::Value;
use row_expr::skip_dml_by_expression;

const DB: &str = "test";
const TABLE: &str = "t";

fn tracker(ddl: &str) -> SchemaTracker {
    let tracker = SchemaTracker::new();
    tracker
        .exec_ddl(DB, ddl)
        .unwrap_or_else(|e| panic!("{ddl}: {e}"));
    tracker
}

struct Case {
    expr: &'static str,
    ddl: &'static str,
    skipped: Vec<RowValue>,
    passed: Vec<RowValue>,
}

#[test]
fn test_skip_dml_by_expression() {
    let cases = vec![
        Case {
            expr: "state != 1",
            ddl: "
create table t (
    primary_id bigint(20) unsigned NOT NULL AUTO_INCREMENT,
    id bigint(20) unsigned NOT NULL,
    state tinyint(3) unsigned NOT NULL,
    PRIMARY KEY (primary_id),
    UNIQUE KEY uniq_id (id),
    KEY idx_state (state)
);",
            skipped: vec![RowValue::UInt64(100), RowValue::UInt64(100), RowValue::Int8(3)],
            passed: vec![RowValue::UInt64(100), RowValue::UInt64(100), RowValue::Int8(1)],
        },
        Case {
            expr: "f > 1.23",
            ddl: "create table t (f float);",
            skipped: vec![RowValue::Float32(2.0)],
            passed: vec![RowValue::Float32(1.0)],
        },
        Case {
            expr: "f > a + b",
            ddl: "create table t (f float, a int, b int);",
            skipped: vec![RowValue::Float32(123.45), RowValue::Int32(1), RowValue::Int32(2)],
            passed: vec![RowValue::Float32(0.01), RowValue::Int32(23), RowValue::Int32(45)],
        },
        Case {
            expr: "id = 30",
            ddl: "
create table t (
    id int(11) NOT NULL AUTO_INCREMENT,
    name varchar(20) COLLATE utf8mb4_bin DEFAULT NULL,
    dt datetime DEFAULT NULL,
    ts timestamp NOT NULL DEFAULT CURRENT_TIMESTAMP ON UPDATE CURRENT_TIMESTAMP,
    PRIMARY KEY (id)
);",
            skipped: vec![
                RowValue::Int32(30),
                RowValue::String("30".to_string()),
                RowValue::Null,
                RowValue::String("2021-06-17 10:13:05".to_string()),
            ],
            passed: vec![
                RowValue::Int32(20),
                RowValue::String("20".to_string()),
                RowValue::Null,
                RowValue::String("2021-06-17 10:13:05".to_string()),
            ],
        },
    ];

    for case in cases {
        let tracker = tracker(case.ddl);
        let expr = tracker.bind(DB, TABLE, case.expr).unwrap();
        assert!(
            skip_dml_by_expression(&case.skipped, &expr).unwrap(),
            "{} should skip {:?}",
            case.expr,
            case.skipped
        );
        assert!(
            !skip_dml_by_expression(&case.passed, &expr).unwrap(),
            "{} should pass {:?}",
            case.expr,
            case.passed
        );
    }
}

/// Row images as the binary replication protocol hands them out, decoded
/// against the tracked definition.
#[test]
fn test_all_binary_protocol_types() {
    let cases: Vec<(&str, &str, Value, Value)> = vec![
        ("c IS NULL", "create table t (c int)", Value::NULL, Value::Int(100)),
        ("c = 1", "create table t (c int)", Value::Int(1), Value::Int(100)),
        ("c = 2", "create table t (c tinyint)", Value::Int(2), Value::Int(-1)),
        ("c < 10", "create table t (c smallint)", Value::Int(8), Value::Int(18)),
        ("c < 0", "create table t (c mediumint)", Value::Int(-8), Value::Int(1)),
        (
            "c = 100000000",
            "create table t (c bigint)",
            Value::Int(100_000_000),
            Value::Int(200_000_000),
        ),
        (
            "c = 10.1",
            "create table t (c decimal(5,2))",
            Value::Bytes(b"10.10".to_vec()),
            Value::Bytes(b"10.11".to_vec()),
        ),
        ("c < 0.1", "create table t (c float)", Value::Float(0.08), Value::Float(0.18)),
        ("c < 0.1", "create table t (c double)", Value::Double(0.08), Value::Double(0.18)),
        ("c = b'1'", "create table t (c bit(4))", Value::Int(1), Value::Int(2)),
        (
            "c = '2021-06-21 12:34:56'",
            "create table t (c timestamp)",
            Value::Bytes(b"2021-06-21 12:34:56".to_vec()),
            Value::Bytes(b"1970-02-01 00:00:01".to_vec()),
        ),
        (
            "c = '2021-06-21 00:00:12'",
            "create table t (c datetime)",
            Value::Date(2021, 6, 21, 0, 0, 12, 0),
            Value::Date(1970, 1, 1, 0, 0, 1, 0),
        ),
        (
            "c = '00:00:12'",
            "create table t (c time(6))",
            Value::Bytes(b"00:00:12".to_vec()),
            Value::Bytes(b"00:00:01".to_vec()),
        ),
        (
            "c = '2021-06-21'",
            "create table t (c date)",
            Value::Date(2021, 6, 21, 0, 0, 0, 0),
            Value::Date(1970, 1, 1, 0, 0, 0, 0),
        ),
        ("c = '2021'", "create table t (c year)", Value::Int(2021), Value::Int(2020)),
        (
            "c = 'x-small'",
            "create table t (c ENUM('x-small', 'small', 'medium', 'large', 'x-large'))",
            Value::Int(1),
            Value::Int(2),
        ),
        (
            "find_in_set('c', c) > 0",
            "create table t (c SET('a', 'b', 'c', 'd'))",
            Value::Int(0b1100),
            Value::Int(0b1000),
        ),
        (
            "c = x'1234'",
            "create table t (c blob)",
            Value::Bytes(b"\x124".to_vec()),
            Value::Bytes(b"Vx".to_vec()),
        ),
        (
            "c = 'abc'",
            "create table t (c varchar(20))",
            Value::Bytes(b"abc".to_vec()),
            Value::Bytes(b"def".to_vec()),
        ),
        (
            r#"c->"$.id" = 1"#,
            "create table t (c json)",
            Value::Bytes(br#"{"id": 1}"#.to_vec()),
            Value::Bytes(br#"{"id": 2}"#.to_vec()),
        ),
    ];

    for (expr_text, ddl, skipped, passed) in cases {
        let tracker = tracker(ddl);
        let definition = tracker.table(DB, TABLE).unwrap();
        let expr = tracker.bind(DB, TABLE, expr_text).unwrap();

        let skipped = mysql_types::decode_row(vec![skipped], &definition).unwrap();
        assert!(
            skip_dml_by_expression(&skipped, &expr).unwrap(),
            "{ddl}: {expr_text} should skip {skipped:?}"
        );
        let passed = mysql_types::decode_row(vec![passed], &definition).unwrap();
        assert!(
            !skip_dml_by_expression(&passed, &expr).unwrap(),
            "{ddl}: {expr_text} should pass {passed:?}"
        );
    }
}

#[test]
fn test_expression_contains_nonexistent_column() {
    let tracker = tracker("create table t (c varchar(20));");
    let expr = tracker.bind(DB, TABLE, "d > 1").unwrap();
    assert_eq!(expr.to_string(), "0");

    // skip nothing
    for row in [vec![RowValue::Int32(0)], vec![RowValue::Int32(2)]] {
        assert!(!skip_dml_by_expression(&row, &expr).unwrap());
    }
}

#[test]
fn test_rebind_after_alter() {
    let tracker = tracker("create table t (c varchar(20));");
    let before = tracker.bind(DB, TABLE, "d > 1").unwrap();
    assert!(before.is_constant());

    tracker.exec_ddl(DB, "alter table t add column d int").unwrap();
    let after = tracker.bind(DB, TABLE, "d > 1").unwrap();
    let row = vec![RowValue::String("x".to_string()), RowValue::Int32(2)];
    assert!(skip_dml_by_expression(&row, &after).unwrap());
}
