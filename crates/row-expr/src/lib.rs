//! Row filter predicates.
//!
//! A predicate is a MySQL boolean expression over one table's columns, such
//! as `state != 1` or `c->"$.id" = 1`. It is parsed once into a `sqlparser`
//! expression, bound to the table's current
//! [`TableDefinition`](filter_core::TableDefinition) and then evaluated
//! against every decoded row of that table:
//!
//! ```rust
//! use filter_core::{ColumnDefinition, ColumnType, RowValue, TableDefinition};
//! use row_expr::{bind, skip_dml_by_expression};
//!
//! let table = TableDefinition::new(
//!     "t",
//!     vec![
//!         ColumnDefinition::new("f", ColumnType::Float),
//!         ColumnDefinition::new("a", ColumnType::Int { unsigned: false }),
//!         ColumnDefinition::new("b", ColumnType::Int { unsigned: false }),
//!     ],
//! );
//! let expr = bind("f > a + b", &table).unwrap();
//!
//! let row = [RowValue::Float32(123.45), RowValue::Int32(1), RowValue::Int32(2)];
//! assert!(skip_dml_by_expression(&row, &expr).unwrap());
//! ```
//!
//! Evaluation follows SQL three-valued logic; a row is skipped only when the
//! predicate is true.

mod binder;
pub mod datum;
pub mod error;
mod eval;
pub mod json_path;
pub mod ops;
mod parser;

pub use binder::{bind, BoundExpr};
pub use datum::Datum;
pub use error::{BindError, EvalError};
pub use eval::{column_datum, skip_dml_by_expression};
pub use parser::parse_predicate;
