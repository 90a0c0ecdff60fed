//! Binlog Filter Library
//!
//! The filtering core of a MySQL binlog replication engine: decides, per
//! binlog event, whether it is replicated downstream.
//!
//! # Features
//!
//! - Statement skip classification: never-replicated statement categories,
//!   system schemas, block/allow lists and user event rules
//! - Row filtering: SQL predicates evaluated against decoded row images
//! - Schema tracking: table definitions followed through DDL, with bound
//!   predicates cached per table
//! - Configuration from TOML, YAML or JSON files
//!
//! # Crates
//!
//! - `filter_core` - column types, row values, table definitions
//! - `mysql_statement` - statement lexer and statement-kind parser
//! - `mysql_types` - MySQL column types, DDL column lists, driver value decoding
//! - `event_filter` - block/allow lists and event rules
//! - `row_expr` - predicate parsing, binding and evaluation
//!
//! # Example
//!
//! ```rust
//! use binlog_filter::StatementClassifier;
//! use filter_core::TableRef;
//!
//! let classifier = StatementClassifier::new();
//! let sql = "DROP TEMPORARY TABLE IF EXISTS `h2`";
//! let stmt = mysql_statement::parse(sql).unwrap();
//! assert!(classifier.skip_query(&[], &stmt, sql).unwrap());
//!
//! let sql = "CREATE TABLE shop.orders (id INT)";
//! let stmt = mysql_statement::parse(sql).unwrap();
//! assert!(!classifier
//!     .skip_query(&[TableRef::new("shop", "orders")], &stmt, sql)
//!     .unwrap());
//! ```
//!
//! # CLI Usage
//!
//! ```bash
//! # Would this statement be replicated?
//! binlog-filter check-query --config filter.toml "DROP TABLE shop.orders"
//!
//! # Would this row be replicated?
//! binlog-filter check-row --config filter.toml \
//!   --ddl "CREATE TABLE orders (id INT, state TINYINT UNSIGNED)" \
//!   --schema shop --event insert --row '[1, 3]'
//!
//! # Check a config file
//! binlog-filter validate --config filter.yaml
//! ```

pub mod category;
pub mod classifier;
pub mod config;
pub mod error;
pub mod observer;
pub mod row_filter;
pub mod schema_tracker;

pub use category::{event_type, Category};
pub use classifier::StatementClassifier;
pub use config::{ConfigFormat, FilterConfig};
pub use error::FilterError;
pub use observer::{SkipCounters, SkipObserver, SkipReason, SkipSnapshot};
pub use row_filter::{ExpressionFilter, RowEventFilter};
pub use schema_tracker::{ExpressionBinder, SchemaTracker};
