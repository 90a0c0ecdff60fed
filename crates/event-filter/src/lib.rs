//! Statement-level filtering for binlog replication.
//!
//! - [`BlockAllowList`]: glob allow/block lists over schemas and tables,
//!   behind the [`TableFilter`] trait
//! - [`BinlogEventRules`]: user event rules with table > schema > global
//!   precedence, behind the [`EventRuleEngine`] trait
//! - [`EventType`]: event kinds as rules name them

pub mod error;
pub mod event;
pub mod pattern;
pub mod rules;
pub mod table_filter;

pub use error::{PatternError, RuleError};
pub use event::EventType;
pub use pattern::{PatternMatcher, PatternSet};
pub use rules::{Action, BinlogEventRules, EventRule, EventRuleEngine, RuleOutcome};
pub use table_filter::{BlockAllowList, BlockAllowListConfig, TableFilter, TablePattern};
