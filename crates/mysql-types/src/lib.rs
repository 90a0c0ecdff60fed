//! MySQL type handling for row filtering.
//!
//! This crate maps MySQL column declarations onto filter-core's
//! `ColumnType` and decodes row event values into `RowValue`.
//!
//! # Structure
//!
//! - `schema`: MySQL column type to `ColumnType` conversion
//! - `ddl`: CREATE TABLE / ALTER TABLE column list parsing
//! - `reverse`: Convert MySQL row values → `RowValue`
//!
//! # Example
//!
//! ```rust
//! use filter_core::{ColumnType, RowValue};
//! use mysql_async::Value;
//! use mysql_types::{decode_row, mysql_column_to_column_type, parse_create_table};
//!
//! // Column type conversion
//! let ty = mysql_column_to_column_type("INT", "int(11)");
//! assert_eq!(ty, ColumnType::Int { unsigned: false });
//!
//! // Schema from DDL, then a row decoded against it
//! let table = parse_create_table("CREATE TABLE t (id INT, name VARCHAR(10))")
//!     .unwrap()
//!     .definition()
//!     .unwrap();
//! let row = decode_row(vec![Value::Int(1), Value::Bytes(b"a".to_vec())], &table).unwrap();
//! assert_eq!(row[1], RowValue::String("a".to_string()));
//! ```

pub mod ddl;
pub mod reverse;
pub mod schema;

pub use ddl::{
    parse_alter_table, parse_create_table, AlterOp, AlterTable, ColumnPosition, CreateTable,
    CreateTableBody, DdlError,
};
pub use reverse::{decode_row, decode_value, ConversionError};
pub use schema::{extract_set_or_enum_values, mysql_column_to_column_type};
