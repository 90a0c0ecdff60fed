use binlog_filter::{SkipCounters, SkipReason, StatementClassifier};
use event_filter::{
    Action, BinlogEventRules, BlockAllowList, BlockAllowListConfig, EventRule, EventType,
};
use filter_core::TableRef;
use std::sync::Arc;

fn skip(classifier: &StatementClassifier, tables: &[TableRef], sql: &str) -> bool {
    let stmt = mysql_statement::parse(sql).unwrap_or_else(|e| panic!("{sql}: {e}"));
    classifier
        .skip_query(tables, &stmt, sql)
        .unwrap_or_else(|e| panic!("{sql}: {e}"))
}

const STATEMENTS: &[(&str, bool)] = &[
    ("SAVEPOINT `a1`", true),
    // flush
    ("flush privileges", true),
    ("flush logs", true),
    ("FLUSH TABLES WITH READ LOCK", true),
    // table maintenance
    ("OPTIMIZE TABLE foo", true),
    ("ANALYZE TABLE foo", true),
    ("REPAIR TABLE foo", true),
    // temporary table
    ("DROP /*!40005 TEMPORARY */ TABLE IF EXISTS `h2`", true),
    ("DROP TEMPORARY TABLE IF EXISTS `foo`.`bar` /* generated by server */", true),
    ("DROP TABLE foo.bar", false),
    ("DROP TABLE `TEMPORARY TABLE`", false),
    ("DROP TABLE `TEMPORARY TABLE` /* generated by server */", false),
    // trigger
    (
        "CREATE DEFINER=`root`@`%` TRIGGER ins_sum BEFORE INSERT ON bar FOR EACH ROW SET @sum = @sum + NEW.id",
        true,
    ),
    (
        "CREATE TRIGGER ins_sum BEFORE INSERT ON bar FOR EACH ROW SET @sum = @sum + NEW.id",
        true,
    ),
    ("DROP TRIGGER ins_sum", true),
    ("create table `trigger`(id int)", false),
    // procedure
    ("drop procedure if exists prepare_data", true),
    (
        "CREATE DEFINER=`root`@`%` PROCEDURE `simpleproc`(OUT param1 INT) BEGIN  select count(*) into param1 from shard_0001; END",
        true,
    ),
    (
        "CREATE PROCEDURE simpleproc(OUT param1 INT) BEGIN  select count(*) into param1 from shard_0001; END",
        true,
    ),
    ("alter procedure prepare_data comment 'i am a comment'", true),
    ("create table `procedure`(id int)", false),
    (
        "CREATE DEFINER=root@localhost PROCEDURE simpleproc(OUT param1 INT)
BEGIN
    SELECT COUNT(*) INTO param1 FROM t;
END",
        true,
    ),
    // view
    (
        "CREATE ALGORITHM=UNDEFINED DEFINER=`root`@`%` SQL SECURITY DEFINER VIEW `v` AS SELECT qty, price, qty*price AS value FROM t",
        true,
    ),
    (
        "CREATE OR REPLACE ALGORITHM=UNDEFINED DEFINER=`root`@`%` SQL SECURITY DEFINER VIEW `v` AS SELECT qty, price, qty*price AS value FROM t",
        true,
    ),
    (
        "ALTER ALGORITHM=UNDEFINED DEFINER=`root`@`%` SQL SECURITY DEFINER VIEW `v` AS SELECT qty, price, qty*price AS value FROM t",
        true,
    ),
    ("DROP VIEW v", true),
    ("CREATE TABLE `VIEW`(id int)", false),
    ("ALTER TABLE `VIEW`(id int)", false),
    // function
    ("CREATE FUNCTION metaphon RETURNS STRING SONAME 'udf_example.so'", true),
    ("CREATE AGGREGATE FUNCTION avgcost RETURNS REAL SONAME 'udf_example.so'", true),
    ("DROP FUNCTION metaphon", true),
    ("DROP FUNCTION IF EXISTS `rand_string`", true),
    ("ALTER FUNCTION metaphon COMMENT 'hh'", true),
    ("CREATE TABLE `function` (id int)", false),
    (
        "CREATE DEFINER=root@localhost FUNCTION rand_string(n INT) RETURNS varchar(255) CHARSET utf8
BEGIN
          DECLARE chars_str VARCHAR(100) DEFAULT 'abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ';
          DECLARE return_str VARCHAR(255) DEFAULT '';
          DECLARE i INT DEFAULT 0;
          WHILE i<n DO
              SET return_str = CONCAT(return_str,SUBSTRING(chars_str,FLOOR(1+RAND()*52),1));
              SET i = i+1;
          END WHILE;
    RETURN return_str;
END",
        true,
    ),
    // tablespace
    ("CREATE TABLESPACE `ts1` ADD DATAFILE 'ts1.ibd' ENGINE=INNODB", true),
    ("ALTER TABLESPACE `ts1` DROP DATAFILE 'ts1.idb' ENGIEN=NDB", true),
    ("DROP TABLESPACE ts1", true),
    // event
    (
        "CREATE DEFINER=CURRENT_USER EVENT myevent ON SCHEDULE AT CURRENT_TIMESTAMP + INTERVAL 1 HOUR DO UPDATE myschema.mytable SET mycol = mycol + 1;",
        true,
    ),
    (
        "ALTER DEFINER = CURRENT_USER EVENT myevent ON SCHEDULE EVERY 12 HOUR STARTS CURRENT_TIMESTAMP + INTERVAL 4 HOUR;",
        true,
    ),
    ("DROP EVENT myevent;", true),
    // account management
    (
        "CREATE USER 't'@'%' IDENTIFIED WITH 'mysql_native_password' AS '*93E34F4B81FEC9E8271655EA87646ED01AF377CC'",
        true,
    ),
    (
        "ALTER USER 't'@'%' IDENTIFIED WITH 'mysql_native_password' AS '*1114744159A0EF13B12FC371C94877763F9512D0'",
        true,
    ),
    ("rename user t to 1", true),
    ("drop user t1", true),
    (
        "GRANT ALL PRIVILEGES ON *.* TO 't2'@'%' IDENTIFIED WITH 'mysql_native_password' AS '*12033B78389744F3F39AC4CE4CCFCAD6960D8EA0'",
        true,
    ),
    ("revoke reload on *.* from 't2'@'%'", true),
];

#[test]
fn test_never_replicated_statements() {
    let classifier = StatementClassifier::new();
    for (sql, expected) in STATEMENTS {
        assert_eq!(skip(&classifier, &[], sql), *expected, "{sql}");
    }
}

#[test]
fn test_system_table() {
    let classifier = StatementClassifier::new();
    assert!(skip(
        &classifier,
        &[TableRef::new("mysql", "test")],
        "create table mysql.test (id int)"
    ));
    assert!(skip(
        &classifier,
        &[TableRef::new("sys", "x"), TableRef::new("performance_schema", "y")],
        "drop table sys.x, performance_schema.y"
    ));
    // one user table is enough to keep it
    assert!(!skip(
        &classifier,
        &[TableRef::new("mysql", "test"), TableRef::new("shop", "orders")],
        "drop table mysql.test, shop.orders"
    ));
    // unqualified names resolved by the caller
    assert!(skip(
        &classifier,
        &[TableRef::new("mysql", "t"), TableRef::new("mysql", "u")],
        "rename table t to u"
    ));
}

#[test]
fn test_resolved_rename_tables_are_used_as_given() {
    let config = BlockAllowListConfig {
        do_dbs: vec!["db".to_string()],
        ..Default::default()
    };
    let classifier = StatementClassifier::new()
        .with_table_filter(Arc::new(BlockAllowList::new(&config, false).unwrap()));

    let tables = [TableRef::new("db", "t"), TableRef::new("db", "u")];
    assert!(!skip(&classifier, &tables, "rename table t to u"));
    assert!(!skip(&classifier, &tables, "ALTER TABLE t RENAME TO u"));
    // without resolved tables the unqualified names have no schema
    assert!(skip(&classifier, &[], "rename table t to u"));
    assert!(!skip(&classifier, &[], "rename table db.t to db.u"));
}

fn rule(schema: &str, table: &str, event: EventType, sql: &str, action: Action) -> EventRule {
    EventRule {
        schema_pattern: schema.to_string(),
        table_pattern: table.to_string(),
        events: vec![event],
        sql_patterns: vec![sql.to_string()],
        action,
    }
}

fn rule_classifier() -> StatementClassifier {
    let rules = BinlogEventRules::new(
        vec![
            rule("*", "", EventType::DropTable, "^drop\\s+table", Action::Ignore),
            rule("foo*", "", EventType::CreateTable, "^create\\s+table", Action::Do),
            rule("foo*", "bar*", EventType::CreateTable, "^create\\s+table", Action::Ignore),
        ],
        false,
    )
    .unwrap();
    StatementClassifier::new().with_rules(Arc::new(rules))
}

#[test]
fn test_event_rules() {
    let classifier = rule_classifier();
    let cases = [
        // global rule
        ("drop table tx.test", ("tx", "test"), true),
        ("create table tx.test (id int)", ("tx", "test"), false),
        // schema rule
        ("create table foo.test(id int)", ("foo", "test"), false),
        ("rename table foo.test to foo.test1", ("foo", "test"), true),
        // table rule
        ("create table foo.bar(id int)", ("foo", "bar"), true),
    ];
    for (sql, (schema, table), expected) in cases {
        assert_eq!(
            skip(&classifier, &[TableRef::new(schema, table)], sql),
            expected,
            "{sql}"
        );
    }
}

fn sql_rule(schema: &str, sql: &str, action: Action) -> EventRule {
    EventRule {
        schema_pattern: schema.to_string(),
        table_pattern: String::new(),
        events: Vec::new(),
        sql_patterns: vec![sql.to_string()],
        action,
    }
}

#[test]
fn test_global_rules_apply_without_tables() {
    let rules = BinlogEventRules::new(
        vec![sql_rule("", "^alter\\s+server", Action::Ignore)],
        false,
    )
    .unwrap();
    let classifier = StatementClassifier::new().with_rules(Arc::new(rules));

    let sql = "ALTER SERVER s OPTIONS (USER 'x')";
    assert!(matches!(
        mysql_statement::parse(sql).unwrap().kind(),
        mysql_statement::StatementKind::Other { .. }
    ));
    assert!(skip(&classifier, &[], sql));
    assert!(!skip(&classifier, &[], "CREATE SERVER s FOREIGN DATA WRAPPER mysql OPTIONS (USER 'x')"));
    assert!(!skip(&classifier, &[], "BEGIN"));

    let stmt = mysql_statement::parse(sql).unwrap();
    assert_eq!(
        classifier.classify(&[], &stmt, sql).unwrap(),
        Some(SkipReason::Rule)
    );
}

#[test]
fn test_global_event_rule_without_tables() {
    let rules = BinlogEventRules::new(
        vec![
            rule("*", "", EventType::AllDdl, "^create\\s+database", Action::Ignore),
            // schema rules never see an empty schema
            sql_rule("shop", "^alter\\s+server", Action::Ignore),
        ],
        false,
    )
    .unwrap();
    let classifier = StatementClassifier::new().with_rules(Arc::new(rules));

    assert!(!skip(&classifier, &[], "BEGIN"));
    assert!(skip(&classifier, &[], "CREATE DATABASE shop"));
    assert!(!skip(&classifier, &[], "ALTER SERVER s OPTIONS (USER 'x')"));
}

#[test]
fn test_rules_do_not_override_categories() {
    let classifier = rule_classifier();
    assert!(skip(&classifier, &[], "DROP VIEW foo.v"));
    // no tables to ask the rules about
    assert!(!skip(&classifier, &[], "BEGIN"));
}

#[test]
fn test_skip_reasons_are_counted() {
    let counters = Arc::new(SkipCounters::new());
    let classifier = rule_classifier().with_observer("sync-1", counters.clone());

    let tx = [TableRef::new("tx", "test")];
    assert!(skip(&classifier, &tx, "drop table tx.test"));
    assert!(skip(&classifier, &tx, "drop temporary table tx.test"));
    assert!(skip(&classifier, &[], "flush logs"));
    assert!(!skip(&classifier, &tx, "create table tx.test (id int)"));

    let stmt = mysql_statement::parse("drop table tx.test").unwrap();
    assert_eq!(
        classifier.classify(&tx, &stmt, "drop table tx.test").unwrap(),
        Some(SkipReason::Rule)
    );

    let snapshot = counters.snapshot("sync-1").unwrap();
    assert_eq!(snapshot.rule, 1);
    assert_eq!(snapshot.category, 2);
    assert_eq!(snapshot.total(), 3);

    classifier.close();
    assert!(counters.snapshot("sync-1").is_none());
}
