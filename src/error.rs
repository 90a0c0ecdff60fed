//! Top-level error type.

use event_filter::{PatternError, RuleError};
use filter_core::SchemaError;
use mysql_statement::ParseError;
use mysql_types::{ConversionError, DdlError};
use row_expr::{BindError, EvalError};
use thiserror::Error;

/// Any error raised while deciding whether to skip an event.
///
/// Collaborator errors pass through unchanged.
#[derive(Debug, Error)]
pub enum FilterError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Ddl(#[from] DdlError),

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Pattern(#[from] PatternError),

    #[error(transparent)]
    Rule(#[from] RuleError),

    #[error(transparent)]
    Bind(#[from] BindError),

    #[error(transparent)]
    Eval(#[from] EvalError),

    #[error(transparent)]
    Conversion(#[from] ConversionError),
}
