//! Core types for the binlog-filter framework.
//!
//! This crate provides the foundational types shared by every part of the
//! filter, including:
//!
//! - [`ColumnType`] - Wire-protocol column kinds a predicate binds against
//! - [`RowValue`] - Decoded column values of a binlog row event
//! - [`TableDefinition`] - Ordered columns of a table snapshot
//! - [`TableRef`] - A (schema, table) pair touched by a statement
//!
//! # Architecture
//!
//! ```text
//! filter-core (this crate)
//!    │
//!    ├─── mysql-types      (column type strings, CREATE TABLE, driver values)
//!    ├─── event-filter     (block/allow lists and event pattern rules)
//!    └─── row-expr         (predicate binding and evaluation)
//! ```
//!
//! # Example
//!
//! ```rust
//! use filter_core::{ColumnDefinition, ColumnType, RowValue, TableDefinition};
//!
//! let table = TableDefinition::new(
//!     "t",
//!     vec![ColumnDefinition::new("state", ColumnType::TinyInt { unsigned: true })],
//! );
//! assert_eq!(table.column_index("STATE"), Some(0));
//!
//! let row = vec![RowValue::from(3i8)];
//! assert_eq!(row[0].as_i64(), Some(3));
//! ```

pub mod schema;
pub mod types;
pub mod values;

// Re-exports for convenience
pub use schema::{ColumnDefinition, SchemaError, TableDefinition, TableRef};
pub use types::ColumnType;
pub use values::RowValue;

/// Schemas that belong to the server itself and are never replicated.
pub const SYSTEM_SCHEMAS: &[&str] = &["mysql", "information_schema", "performance_schema", "sys"];

/// Whether `schema` is one of [`SYSTEM_SCHEMAS`] (case-insensitive).
pub fn is_system_schema(schema: &str) -> bool {
    SYSTEM_SCHEMAS.iter().any(|s| s.eq_ignore_ascii_case(schema))
}
