//! Table definitions and table references.
//!
//! ## Type Hierarchy
//!
//! - `ColumnDefinition` - Single column metadata
//! - `TableDefinition` - Ordered columns of one table, in decode order
//! - `TableRef` - A (schema, table) pair a statement touches

use crate::types::ColumnType;
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Error Types
// ============================================================================

/// Error type for schema operations.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    /// Table not found
    #[error("Table not found: {0}")]
    TableNotFound(TableRef),

    /// Table already exists
    #[error("Table already exists: {0}")]
    TableExists(TableRef),

    /// Column not found in table
    #[error("Column '{column}' not found in table '{table}'")]
    ColumnNotFound { table: String, column: String },

    /// Column already exists in table
    #[error("Column '{column}' already exists in table '{table}'")]
    DuplicateColumn { table: String, column: String },
}

// ============================================================================
// Table References
// ============================================================================

/// A schema-qualified table name.
///
/// Both parts keep the case they were written with. A reference to a whole
/// database (e.g. from `CREATE DATABASE`) has an empty `name`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TableRef {
    pub schema: String,
    pub name: String,
}

impl TableRef {
    pub fn new(schema: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            name: name.into(),
        }
    }

    /// A reference to a whole database.
    pub fn database(schema: impl Into<String>) -> Self {
        Self::new(schema, "")
    }

    /// Whether this refers to a database rather than a table.
    pub fn is_database(&self) -> bool {
        self.name.is_empty()
    }
}

impl fmt::Display for TableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.name.is_empty() {
            write!(f, "`{}`", self.schema)
        } else {
            write!(f, "`{}`.`{}`", self.schema, self.name)
        }
    }
}

// ============================================================================
// Table Definitions
// ============================================================================

/// Column definition.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ColumnDefinition {
    /// Column name
    pub name: String,

    /// Column type
    #[serde(rename = "type")]
    pub column_type: ColumnType,

    /// Whether this column is nullable
    #[serde(default = "default_nullable")]
    pub nullable: bool,
}

fn default_nullable() -> bool {
    true
}

impl ColumnDefinition {
    /// Create a new nullable column definition.
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
            nullable: true,
        }
    }

    /// Create a new NOT NULL column definition.
    pub fn not_null(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
            nullable: false,
        }
    }
}

/// Table definition: columns in the order a row event decodes them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TableDefinition {
    /// Table name
    pub name: String,

    /// Column definitions in decode order
    pub columns: Vec<ColumnDefinition>,
}

impl TableDefinition {
    /// Create a new table definition.
    pub fn new(name: impl Into<String>, columns: Vec<ColumnDefinition>) -> Self {
        Self {
            name: name.into(),
            columns,
        }
    }

    /// Position of a column, matched case-insensitively like MySQL does.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|c| c.name.eq_ignore_ascii_case(name))
    }

    /// Get a column definition by name.
    pub fn get_column(&self, name: &str) -> Option<&ColumnDefinition> {
        self.column_index(name).map(|i| &self.columns[i])
    }

    /// Get all column names in order.
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Number of columns.
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Insert a column at `position` (appends when `None`).
    pub fn add_column(
        &mut self,
        column: ColumnDefinition,
        position: Option<usize>,
    ) -> Result<(), SchemaError> {
        if self.column_index(&column.name).is_some() {
            return Err(SchemaError::DuplicateColumn {
                table: self.name.clone(),
                column: column.name,
            });
        }
        match position {
            Some(pos) if pos <= self.columns.len() => self.columns.insert(pos, column),
            _ => self.columns.push(column),
        }
        Ok(())
    }

    /// Remove a column by name.
    pub fn drop_column(&mut self, name: &str) -> Result<ColumnDefinition, SchemaError> {
        match self.column_index(name) {
            Some(i) => Ok(self.columns.remove(i)),
            None => Err(SchemaError::ColumnNotFound {
                table: self.name.clone(),
                column: name.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> TableDefinition {
        TableDefinition::new(
            "t",
            vec![
                ColumnDefinition::not_null("id", ColumnType::BigInt { unsigned: true }),
                ColumnDefinition::new("name", ColumnType::VarChar { length: 20 }),
            ],
        )
    }

    #[test]
    fn test_column_lookup_is_case_insensitive() {
        let t = table();
        assert_eq!(t.column_index("ID"), Some(0));
        assert_eq!(t.column_index("Name"), Some(1));
        assert_eq!(t.column_index("missing"), None);
        assert_eq!(t.column_names(), vec!["id", "name"]);
    }

    #[test]
    fn test_add_and_drop_column() {
        let mut t = table();
        t.add_column(ColumnDefinition::new("state", ColumnType::Int { unsigned: false }), Some(1))
            .unwrap();
        assert_eq!(t.column_names(), vec!["id", "state", "name"]);

        let err = t
            .add_column(ColumnDefinition::new("STATE", ColumnType::Text), None)
            .unwrap_err();
        assert!(matches!(err, SchemaError::DuplicateColumn { .. }));

        t.drop_column("id").unwrap();
        assert_eq!(t.column_names(), vec!["state", "name"]);
        assert!(t.drop_column("id").is_err());
    }

    #[test]
    fn test_table_ref_display() {
        assert_eq!(TableRef::new("foo", "bar").to_string(), "`foo`.`bar`");
        assert_eq!(TableRef::database("foo").to_string(), "`foo`");
        assert!(TableRef::database("foo").is_database());
    }
}
