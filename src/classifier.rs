//! Statement skip classification.
//!
//! [`StatementClassifier::skip_query`] decides whether a query event should
//! be replicated. The checks run in a fixed order and the first one that
//! asks for a skip wins:
//!
//! 1. never-replicated statement categories, including temporary tables
//! 2. statements touching only system schemas
//! 3. the table block/allow list
//! 4. user event rules, consulted once per table, or once with an empty
//!    schema and table when the statement names none

use crate::category::{event_type, Category};
use crate::error::FilterError;
use crate::observer::{SkipObserver, SkipReason};
use event_filter::{EventRuleEngine, EventType, RuleOutcome, TableFilter};
use filter_core::{is_system_schema, TableRef};
use mysql_statement::ParsedStatement;
use std::sync::Arc;
use tracing::{debug, trace};

/// Decides which statements and row events are skipped.
#[derive(Clone, Default)]
pub struct StatementClassifier {
    table_filter: Option<Arc<dyn TableFilter>>,
    rules: Option<Arc<dyn EventRuleEngine>>,
    observer: Option<Arc<dyn SkipObserver>>,
    task: String,
}

impl StatementClassifier {
    /// A classifier with only the built-in checks.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_table_filter(mut self, filter: Arc<dyn TableFilter>) -> Self {
        self.table_filter = Some(filter);
        self
    }

    pub fn with_rules(mut self, rules: Arc<dyn EventRuleEngine>) -> Self {
        self.rules = Some(rules);
        self
    }

    /// Report skips of `task` to `observer`.
    pub fn with_observer(mut self, task: impl Into<String>, observer: Arc<dyn SkipObserver>) -> Self {
        self.task = task.into();
        observer.task_started(&self.task);
        self.observer = Some(observer);
        self
    }

    /// Whether the query event `sql`, parsed as `stmt`, must not be
    /// replicated.
    ///
    /// `tables` are the tables the caller resolved for the statement; when
    /// empty, the tables named in the statement are used.
    pub fn skip_query(
        &self,
        tables: &[TableRef],
        stmt: &ParsedStatement,
        sql: &str,
    ) -> Result<bool, FilterError> {
        let reason = self.classify(tables, stmt, sql)?;
        if let Some(reason) = reason {
            debug!(task = %self.task, %reason, sql, "Skipping query event");
            self.report(reason);
        }
        Ok(reason.is_some())
    }

    /// Like [`skip_query`](Self::skip_query), but says why.
    pub fn classify(
        &self,
        tables: &[TableRef],
        stmt: &ParsedStatement,
        sql: &str,
    ) -> Result<Option<SkipReason>, FilterError> {
        let category = Category::of(stmt.kind());
        if category.is_never_replicated() {
            return Ok(Some(SkipReason::Category(category)));
        }

        let tables = effective_tables(tables, stmt);
        trace!(?tables, "Effective tables");

        if !tables.is_empty() && tables.iter().all(|t| is_system_schema(&t.schema)) {
            return Ok(Some(SkipReason::SystemSchema));
        }

        if let Some(filter) = &self.table_filter {
            if let Some(blocked) = tables.iter().find(|t| !filter.is_allowed(t)) {
                trace!(table = %blocked, "Table blocked");
                return Ok(Some(SkipReason::TableFilter));
            }
        }

        if let Some(rules) = &self.rules {
            let event = event_type(stmt.kind());
            if tables.is_empty() && rules.match_action("", "", event, sql)? == RuleOutcome::Ignore {
                trace!(%event, "Ignored by global rule");
                return Ok(Some(SkipReason::Rule));
            }
            for table in &tables {
                if rules.match_action(&table.schema, &table.name, event, sql)? == RuleOutcome::Ignore {
                    trace!(%table, %event, "Ignored by rule");
                    return Ok(Some(SkipReason::Rule));
                }
            }
        }

        Ok(None)
    }

    /// Whether a row event of kind `event` on `table` is skipped by the
    /// table filter or the event rules.
    pub fn skip_row_event(&self, table: &TableRef, event: EventType) -> Result<bool, FilterError> {
        let reason = if self
            .table_filter
            .as_ref()
            .is_some_and(|f| !f.is_allowed(table))
        {
            Some(SkipReason::TableFilter)
        } else {
            match &self.rules {
                Some(rules) if rules.match_action(&table.schema, &table.name, event, "")?
                    == RuleOutcome::Ignore =>
                {
                    Some(SkipReason::Rule)
                }
                _ => None,
            }
        };
        if let Some(reason) = reason {
            debug!(task = %self.task, %table, %event, %reason, "Skipping row event");
            self.report(reason);
        }
        Ok(reason.is_some())
    }

    pub(crate) fn report(&self, reason: SkipReason) {
        if let Some(observer) = &self.observer {
            observer.skipped(&self.task, reason);
        }
    }

    /// Tell the observer the task is over.
    pub fn close(&self) {
        if let Some(observer) = &self.observer {
            observer.task_stopped(&self.task);
        }
    }
}

/// The caller's tables as given, or the statement's own when none were
/// given. The caller resolves unqualified names against the session schema,
/// which the statement text alone cannot.
fn effective_tables(tables: &[TableRef], stmt: &ParsedStatement) -> Vec<TableRef> {
    if tables.is_empty() {
        stmt.table_refs("")
    } else {
        tables.to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observer::SkipCounters;
    use event_filter::{BlockAllowList, BlockAllowListConfig, TablePattern};
    use mysql_statement::parse;

    fn skip(classifier: &StatementClassifier, tables: &[TableRef], sql: &str) -> bool {
        classifier.skip_query(tables, &parse(sql).unwrap(), sql).unwrap()
    }

    #[test]
    fn test_effective_tables_for_rename() {
        let given = [TableRef::new("foo", "test"), TableRef::new("foo", "test1")];
        let stmt = parse("rename table test to test1").unwrap();
        assert_eq!(effective_tables(&given, &stmt), given.to_vec());

        // unqualified names are never added next to the resolved ones
        let stmt = parse("rename table t to u").unwrap();
        assert_eq!(
            effective_tables(&[TableRef::new("db", "t"), TableRef::new("db", "u")], &stmt),
            vec![TableRef::new("db", "t"), TableRef::new("db", "u")]
        );

        let stmt = parse("alter table t rename to u").unwrap();
        assert_eq!(
            effective_tables(&[], &stmt),
            vec![TableRef::new("", "t"), TableRef::new("", "u")]
        );
    }

    #[test]
    fn test_table_filter() {
        let config = BlockAllowListConfig {
            ignore_tables: vec![TablePattern {
                db_name: "db".to_string(),
                tbl_name: "tmp_*".to_string(),
            }],
            ..Default::default()
        };
        let classifier = StatementClassifier::new()
            .with_table_filter(Arc::new(BlockAllowList::new(&config, false).unwrap()));

        assert!(skip(&classifier, &[], "create table db.tmp_1 (id int)"));
        assert!(!skip(&classifier, &[], "create table db.t (id int)"));
        // the new name of a rename is checked too
        assert!(skip(
            &classifier,
            &[TableRef::new("db", "t"), TableRef::new("db", "tmp_t")],
            "rename table t to tmp_t"
        ));
        assert!(skip(&classifier, &[], "rename table db.t to db.tmp_t"));
    }

    #[test]
    fn test_resolved_rename_is_kept_by_schema_allow_list() {
        let config = BlockAllowListConfig {
            do_dbs: vec!["db".to_string()],
            ..Default::default()
        };
        let classifier = StatementClassifier::new()
            .with_table_filter(Arc::new(BlockAllowList::new(&config, false).unwrap()));
        let tables = [TableRef::new("db", "t"), TableRef::new("db", "u")];
        assert!(!skip(&classifier, &tables, "rename table t to u"));
        assert!(!skip(&classifier, &tables, "alter table t rename to u"));
    }

    #[test]
    fn test_system_schema_needs_every_table() {
        let classifier = StatementClassifier::new();
        assert!(skip(&classifier, &[], "create table MySQL.t (id int)"));
        assert!(!skip(&classifier, &[], "rename table mysql.t to db.t"));
        assert!(!skip(&classifier, &[], "BEGIN"));
        let system = [TableRef::new("mysql", "t"), TableRef::new("mysql", "u")];
        assert!(skip(&classifier, &system, "rename table t to u"));
    }

    #[test]
    fn test_observer_counts_skips() {
        let counters = Arc::new(SkipCounters::new());
        let classifier = StatementClassifier::new().with_observer("task-1", counters.clone());

        assert!(skip(&classifier, &[], "DROP VIEW v"));
        assert!(skip(&classifier, &[], "create table mysql.t (id int)"));
        assert!(!skip(&classifier, &[], "create table db.t (id int)"));

        let snapshot = counters.snapshot("task-1").unwrap();
        assert_eq!(snapshot.category, 1);
        assert_eq!(snapshot.system_schema, 1);

        classifier.close();
        assert_eq!(counters.snapshot("task-1"), None);
    }
}
