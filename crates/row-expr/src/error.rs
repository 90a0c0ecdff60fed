//! Bind and evaluation errors.

use thiserror::Error;

/// Error while parsing a predicate or binding it to a table.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BindError {
    #[error("Invalid predicate: {0}")]
    Parse(String),

    #[error("Unsupported in a predicate: {0}")]
    Unsupported(String),

    #[error("Invalid number literal: {0}")]
    InvalidNumber(String),

    #[error("Unknown function: {0}")]
    UnknownFunction(String),

    #[error("Function {function} expects {expected} argument(s), got {found}")]
    Arity {
        function: &'static str,
        expected: &'static str,
        found: usize,
    },

    #[error("Invalid JSON path '{path}': {reason}")]
    InvalidJsonPath { path: String, reason: &'static str },
}

/// Error while evaluating a bound predicate against a row.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    #[error("Row has {actual} values but the expression was bound to {expected} columns")]
    ColumnCount { expected: usize, actual: usize },

    #[error("Column {column} of type {column_type} cannot hold a {found} value")]
    TypeMismatch {
        column: String,
        column_type: String,
        found: &'static str,
    },

    #[error("Invalid JSON document: {0}")]
    InvalidJson(String),

    #[error("Value is out of range in '{0}'")]
    Overflow(String),
}
