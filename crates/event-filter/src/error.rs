//! Errors raised while building or evaluating filter rules.

use thiserror::Error;

/// Error type for glob pattern compilation.
#[derive(Debug, Error)]
pub enum PatternError {
    #[error("Invalid pattern '{pattern}': {source}")]
    InvalidRegex {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("Empty pattern")]
    EmptyPattern,
}

/// Error type for event rule configuration and matching.
#[derive(Debug, Error)]
pub enum RuleError {
    #[error(transparent)]
    Pattern(#[from] PatternError),

    #[error("Invalid SQL pattern '{pattern}' in rule #{index}: {source}")]
    InvalidSqlPattern {
        index: usize,
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("Invalid rule #{index}: {reason}")]
    InvalidRule { index: usize, reason: String },

    /// A rule engine implementation failed while matching.
    #[error("Rule engine failure: {0}")]
    Engine(String),
}
