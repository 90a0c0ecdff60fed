//! MySQL statement parsing for binlog query events.
//!
//! This crate turns the text of a query event into a [`ParsedStatement`]:
//! a closed [`StatementKind`] plus the original text. Only statement heads
//! are parsed, which is all the skip classifier needs. Tokens come from
//! `sqlparser`'s MySQL tokenizer, which the column-type helpers in
//! `mysql-types` reuse through [`tokenize`].
//!
//! # Structure
//!
//! - `lexer`: comment-aware token stream (version-gated comments are code)
//! - `cursor`: token cursor with keyword/identifier helpers
//! - `statement`: node kinds and table reference extraction
//! - `parser`: statement head parser
//!
//! # Example
//!
//! ```rust
//! use mysql_statement::{parse, StatementKind};
//!
//! let stmt = parse("DROP /*!40005 TEMPORARY */ TABLE IF EXISTS `h2`").unwrap();
//! assert!(stmt.is_temporary());
//!
//! let stmt = parse("CREATE TABLE `view` (id int)").unwrap();
//! assert!(matches!(stmt.kind(), StatementKind::CreateTable { .. }));
//! ```

pub mod cursor;
pub mod error;
pub mod lexer;
pub mod parser;
pub mod statement;

pub use cursor::Cursor;
pub use error::ParseError;
pub use lexer::{tokenize, Spanned, TokenExt};
pub use parser::parse;
pub use sqlparser::tokenizer::Token;
pub use statement::{
    AccountOp, MaintenanceOp, ObjectAction, ParsedStatement, StatementKind, TableName,
};
