//! In-memory table definitions and bound expression cache.
//!
//! Row filter predicates are bound to the definition a table has when the
//! row was written. [`SchemaTracker`] follows DDL from the binlog so the
//! definitions stay current, and caches bound expressions per
//! `(schema, table, predicate)`. Definitions and cache share one lock:
//! a DDL drops the table's cached expressions in the same write section
//! that changes its definition.

use crate::error::FilterError;
use filter_core::{SchemaError, TableDefinition, TableRef};
use mysql_statement::{parse, StatementKind, TableName};
use mysql_types::{parse_alter_table, parse_create_table, CreateTableBody};
use row_expr::{bind, BoundExpr};
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, info};

/// Binds predicates to the current definition of a table.
pub trait ExpressionBinder: Send + Sync {
    fn bind(&self, schema: &str, table: &str, predicate: &str) -> Result<Arc<BoundExpr>, FilterError>;
}

type TableKey = (String, String);

#[derive(Debug, Default)]
struct TrackerState {
    tables: HashMap<TableKey, TableDefinition>,
    exprs: HashMap<(String, String, String), Arc<BoundExpr>>,
}

impl TrackerState {
    fn invalidate(&mut self, key: &TableKey) {
        self.exprs
            .retain(|(schema, table, _), _| !(schema == &key.0 && table == &key.1));
    }

    fn take(&mut self, key: &TableKey) -> Result<TableDefinition, SchemaError> {
        self.invalidate(key);
        self.tables
            .remove(key)
            .ok_or_else(|| SchemaError::TableNotFound(TableRef::new(&key.0, &key.1)))
    }

    fn put(&mut self, key: TableKey, mut table: TableDefinition) {
        self.invalidate(&key);
        table.name = key.1.clone();
        self.tables.insert(key, table);
    }
}

/// Tracks table definitions by following DDL statements.
#[derive(Debug, Default)]
pub struct SchemaTracker {
    state: RwLock<TrackerState>,
}

fn table_key(name: &TableName, current_schema: &str) -> TableKey {
    let table = name.resolve(current_schema);
    (table.schema, table.name)
}

impl SchemaTracker {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, TrackerState> {
        self.state.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, TrackerState> {
        self.state.write().unwrap_or_else(|e| e.into_inner())
    }

    /// Register a table definition, replacing any previous one.
    pub fn add_table(&self, schema: &str, table: TableDefinition) {
        let key = (schema.to_string(), table.name.clone());
        self.write().put(key, table);
    }

    pub fn table(&self, schema: &str, table: &str) -> Option<TableDefinition> {
        self.read()
            .tables
            .get(&(schema.to_string(), table.to_string()))
            .cloned()
    }

    /// Number of tracked tables.
    pub fn len(&self) -> usize {
        self.read().tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Apply a DDL statement executed in `current_schema`.
    ///
    /// Table DDL (CREATE, ALTER, DROP, RENAME) and DROP DATABASE update the
    /// tracked definitions; every other statement is ignored. Temporary
    /// tables are never tracked.
    pub fn exec_ddl(&self, current_schema: &str, sql: &str) -> Result<(), FilterError> {
        let stmt = parse(sql)?;
        match stmt.kind() {
            StatementKind::CreateTable {
                temporary: false, ..
            } => {
                let create = parse_create_table(sql)?;
                let key = table_key(&create.table, current_schema);
                let mut state = self.write();
                if state.tables.contains_key(&key) {
                    if create.if_not_exists {
                        return Ok(());
                    }
                    return Err(SchemaError::TableExists(TableRef::new(&key.0, &key.1)).into());
                }
                let table = match &create.body {
                    CreateTableBody::Columns(columns) => {
                        TableDefinition::new(key.1.clone(), columns.clone())
                    }
                    CreateTableBody::Like(source) => {
                        let source = table_key(source, current_schema);
                        state
                            .tables
                            .get(&source)
                            .cloned()
                            .ok_or_else(|| SchemaError::TableNotFound(TableRef::new(&source.0, &source.1)))?
                    }
                };
                info!(schema = %key.0, table = %key.1, columns = table.len(), "Tracking table");
                state.put(key, table);
            }
            StatementKind::AlterTable { .. } => {
                let alter = parse_alter_table(sql)?;
                let from = table_key(&alter.table, current_schema);
                let mut state = self.write();
                let mut table = state
                    .tables
                    .get(&from)
                    .cloned()
                    .ok_or_else(|| SchemaError::TableNotFound(TableRef::new(&from.0, &from.1)))?;
                for op in &alter.ops {
                    op.apply(&mut table)?;
                }
                let to = alter
                    .rename_to()
                    .map_or_else(|| from.clone(), |to| table_key(to, current_schema));
                state.take(&from)?;
                debug!(schema = %to.0, table = %to.1, "Table altered");
                state.put(to, table);
            }
            StatementKind::DropTable {
                tables,
                temporary: false,
            } => {
                let mut state = self.write();
                for name in tables {
                    let key = table_key(name, current_schema);
                    if state.take(&key).is_ok() {
                        debug!(schema = %key.0, table = %key.1, "Table dropped");
                    }
                }
            }
            StatementKind::RenameTable { pairs } => {
                let mut state = self.write();
                for (from, to) in pairs {
                    let table = state.take(&table_key(from, current_schema))?;
                    state.put(table_key(to, current_schema), table);
                }
            }
            StatementKind::DropDatabase { name } => {
                let mut state = self.write();
                let dropped: Vec<TableKey> = state
                    .tables
                    .keys()
                    .filter(|(schema, _)| schema == name)
                    .cloned()
                    .collect();
                for key in &dropped {
                    state.take(key)?;
                }
                debug!(schema = %name, tables = dropped.len(), "Database dropped");
            }
            _ => {}
        }
        Ok(())
    }
}

impl ExpressionBinder for SchemaTracker {
    fn bind(&self, schema: &str, table: &str, predicate: &str) -> Result<Arc<BoundExpr>, FilterError> {
        let cache_key = (schema.to_string(), table.to_string(), predicate.to_string());
        if let Some(expr) = self.read().exprs.get(&cache_key) {
            return Ok(expr.clone());
        }

        let mut state = self.write();
        if let Some(expr) = state.exprs.get(&cache_key) {
            return Ok(expr.clone());
        }
        let definition = state
            .tables
            .get(&(schema.to_string(), table.to_string()))
            .ok_or_else(|| SchemaError::TableNotFound(TableRef::new(schema, table)))?;
        let expr = Arc::new(bind(predicate, definition)?);
        debug!(schema, table, predicate, bound = %expr, "Bound row filter expression");
        state.exprs.insert(cache_key, expr.clone());
        Ok(expr)
    }
}
