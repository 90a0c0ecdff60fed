//! Table allow/block lists.

use crate::error::PatternError;
use crate::pattern::{PatternMatcher, PatternSet};
use filter_core::TableRef;
use serde::{Deserialize, Serialize};

/// Decides whether a table takes part in replication.
pub trait TableFilter: Send + Sync {
    fn is_allowed(&self, table: &TableRef) -> bool;
}

/// A schema/table glob pair in a block/allow list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TablePattern {
    pub db_name: String,
    pub tbl_name: String,
}

/// Serialized form of a [`BlockAllowList`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlockAllowListConfig {
    pub do_dbs: Vec<String>,
    pub ignore_dbs: Vec<String>,
    pub do_tables: Vec<TablePattern>,
    pub ignore_tables: Vec<TablePattern>,
}

impl BlockAllowListConfig {
    pub fn is_empty(&self) -> bool {
        self.do_dbs.is_empty()
            && self.ignore_dbs.is_empty()
            && self.do_tables.is_empty()
            && self.ignore_tables.is_empty()
    }
}

#[derive(Debug, Clone)]
struct CompiledTablePattern {
    db: PatternMatcher,
    table: PatternMatcher,
}

impl CompiledTablePattern {
    fn compile(pattern: &TablePattern, case_sensitive: bool) -> Result<Self, PatternError> {
        Ok(Self {
            db: PatternMatcher::new(&pattern.db_name, case_sensitive)?,
            table: PatternMatcher::new(&pattern.tbl_name, case_sensitive)?,
        })
    }

    fn matches(&self, table: &TableRef) -> bool {
        self.db.matches(&table.schema) && self.table.matches(&table.name)
    }
}

/// Glob-based block/allow list.
///
/// A table is blocked when it matches `ignore_tables` or its schema matches
/// `ignore_dbs`. Otherwise it is allowed when no `do_*` list is configured,
/// or when it matches `do_tables` / its schema matches `do_dbs`.
///
/// A database-level reference (empty table name) is tested on its schema:
/// it is allowed when the schema is not ignored and some `do_*` entry
/// names it.
///
/// ```rust
/// use event_filter::{BlockAllowList, BlockAllowListConfig, TableFilter};
/// use filter_core::TableRef;
///
/// let config = BlockAllowListConfig {
///     do_dbs: vec!["shop*".to_string()],
///     ..Default::default()
/// };
/// let filter = BlockAllowList::new(&config, false).unwrap();
/// assert!(filter.is_allowed(&TableRef::new("shop_eu", "orders")));
/// assert!(!filter.is_allowed(&TableRef::new("crm", "orders")));
/// ```
#[derive(Debug, Clone)]
pub struct BlockAllowList {
    do_dbs: PatternSet,
    ignore_dbs: PatternSet,
    do_tables: Vec<CompiledTablePattern>,
    ignore_tables: Vec<CompiledTablePattern>,
}

impl BlockAllowList {
    pub fn new(config: &BlockAllowListConfig, case_sensitive: bool) -> Result<Self, PatternError> {
        let compile = |patterns: &[TablePattern]| {
            patterns
                .iter()
                .map(|p| CompiledTablePattern::compile(p, case_sensitive))
                .collect::<Result<Vec<_>, _>>()
        };
        Ok(Self {
            do_dbs: PatternSet::from_patterns(&config.do_dbs, case_sensitive)?,
            ignore_dbs: PatternSet::from_patterns(&config.ignore_dbs, case_sensitive)?,
            do_tables: compile(&config.do_tables)?,
            ignore_tables: compile(&config.ignore_tables)?,
        })
    }

    fn has_allow_list(&self) -> bool {
        !self.do_dbs.is_empty() || !self.do_tables.is_empty()
    }

    fn is_db_allowed(&self, schema: &str) -> bool {
        if self.ignore_dbs.matches(schema) {
            return false;
        }
        !self.has_allow_list()
            || self.do_dbs.matches(schema)
            || self.do_tables.iter().any(|p| p.db.matches(schema))
    }
}

impl TableFilter for BlockAllowList {
    fn is_allowed(&self, table: &TableRef) -> bool {
        if table.is_database() {
            return self.is_db_allowed(&table.schema);
        }
        if self.ignore_dbs.matches(&table.schema)
            || self.ignore_tables.iter().any(|p| p.matches(table))
        {
            return false;
        }
        !self.has_allow_list()
            || self.do_dbs.matches(&table.schema)
            || self.do_tables.iter().any(|p| p.matches(table))
    }
}
