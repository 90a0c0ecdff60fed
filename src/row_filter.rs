//! Row event filtering by expression.
//!
//! Each [`ExpressionFilter`] names a table and up to four predicates, one
//! per row image kind. A row is skipped when a predicate for its kind is
//! true on the row. An UPDATE is skipped when every update predicate the
//! filter configures is true: the old-image predicate on the old row and
//! the new-image predicate on the new row.

use crate::error::FilterError;
use crate::observer::{SkipObserver, SkipReason};
use crate::schema_tracker::ExpressionBinder;
use filter_core::{RowValue, TableRef};
use row_expr::skip_dml_by_expression;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Row predicates for one table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExpressionFilter {
    pub schema: String,
    pub table: String,
    pub insert_value_expr: Option<String>,
    pub update_old_value_expr: Option<String>,
    pub update_new_value_expr: Option<String>,
    pub delete_value_expr: Option<String>,
}

impl ExpressionFilter {
    /// Every configured predicate.
    pub fn predicates(&self) -> impl Iterator<Item = &str> {
        [
            &self.insert_value_expr,
            &self.update_old_value_expr,
            &self.update_new_value_expr,
            &self.delete_value_expr,
        ]
        .into_iter()
        .filter_map(|e| e.as_deref())
    }

    fn has_update(&self) -> bool {
        self.update_old_value_expr.is_some() || self.update_new_value_expr.is_some()
    }
}

/// Applies [`ExpressionFilter`]s to decoded row images.
pub struct RowEventFilter {
    filters: HashMap<(String, String), Vec<ExpressionFilter>>,
    binder: Arc<dyn ExpressionBinder>,
    case_sensitive: bool,
    observer: Option<(String, Arc<dyn SkipObserver>)>,
}

impl RowEventFilter {
    pub fn new(
        filters: Vec<ExpressionFilter>,
        binder: Arc<dyn ExpressionBinder>,
        case_sensitive: bool,
    ) -> Self {
        let mut by_table: HashMap<(String, String), Vec<ExpressionFilter>> = HashMap::new();
        for filter in filters {
            let key = table_key(&filter.schema, &filter.table, case_sensitive);
            by_table.entry(key).or_default().push(filter);
        }
        Self {
            filters: by_table,
            binder,
            case_sensitive,
            observer: None,
        }
    }

    pub fn with_observer(mut self, task: impl Into<String>, observer: Arc<dyn SkipObserver>) -> Self {
        self.observer = Some((task.into(), observer));
        self
    }

    /// Whether any filter is configured for `table`.
    pub fn has_filters(&self, table: &TableRef) -> bool {
        self.filters_for(table).is_some()
    }

    fn filters_for(&self, table: &TableRef) -> Option<&Vec<ExpressionFilter>> {
        self.filters
            .get(&table_key(&table.schema, &table.name, self.case_sensitive))
    }

    fn matches(&self, table: &TableRef, predicate: &str, row: &[RowValue]) -> Result<bool, FilterError> {
        let expr = self.binder.bind(&table.schema, &table.name, predicate)?;
        Ok(skip_dml_by_expression(row, &expr)?)
    }

    fn report(&self, table: &TableRef, predicate: &str) {
        debug!(%table, predicate, "Skipping row");
        if let Some((task, observer)) = &self.observer {
            observer.skipped(task, SkipReason::Expression);
        }
    }

    pub fn skip_insert(&self, table: &TableRef, row: &[RowValue]) -> Result<bool, FilterError> {
        for filter in self.filters_for(table).into_iter().flatten() {
            if let Some(predicate) = &filter.insert_value_expr {
                if self.matches(table, predicate, row)? {
                    self.report(table, predicate);
                    return Ok(true);
                }
            }
        }
        Ok(false)
    }

    pub fn skip_delete(&self, table: &TableRef, row: &[RowValue]) -> Result<bool, FilterError> {
        for filter in self.filters_for(table).into_iter().flatten() {
            if let Some(predicate) = &filter.delete_value_expr {
                if self.matches(table, predicate, row)? {
                    self.report(table, predicate);
                    return Ok(true);
                }
            }
        }
        Ok(false)
    }

    pub fn skip_update(
        &self,
        table: &TableRef,
        old: &[RowValue],
        new: &[RowValue],
    ) -> Result<bool, FilterError> {
        for filter in self.filters_for(table).into_iter().flatten() {
            if !filter.has_update() {
                continue;
            }
            let old_matches = match &filter.update_old_value_expr {
                Some(predicate) => self.matches(table, predicate, old)?,
                None => true,
            };
            if !old_matches {
                continue;
            }
            let new_matches = match &filter.update_new_value_expr {
                Some(predicate) => self.matches(table, predicate, new)?,
                None => true,
            };
            if new_matches {
                let predicate = filter
                    .update_new_value_expr
                    .as_deref()
                    .or(filter.update_old_value_expr.as_deref())
                    .unwrap_or_default();
                self.report(table, predicate);
                return Ok(true);
            }
        }
        Ok(false)
    }
}

fn table_key(schema: &str, table: &str, case_sensitive: bool) -> (String, String) {
    if case_sensitive {
        (schema.to_string(), table.to_string())
    } else {
        (schema.to_lowercase(), table.to_lowercase())
    }
}
