//! Errors produced while tokenizing or parsing a statement.

use thiserror::Error;

/// Error during statement tokenizing or parsing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("Empty statement")]
    Empty,

    #[error("Failed to tokenize statement: {0}")]
    Tokenize(String),

    #[error("Expected {expected} at line {line}, column {column}, found {found}")]
    Expected {
        expected: String,
        found: String,
        line: u64,
        column: u64,
    },
}
