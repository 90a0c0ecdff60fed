//! Parsed statement node kinds.

use filter_core::TableRef;
use std::fmt;

/// A table name as written in a statement, schema optional.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TableName {
    pub schema: Option<String>,
    pub name: String,
}

impl TableName {
    pub fn qualified(schema: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            schema: Some(schema.into()),
            name: name.into(),
        }
    }

    pub fn unqualified(name: impl Into<String>) -> Self {
        Self {
            schema: None,
            name: name.into(),
        }
    }

    /// Resolve against the session's current schema.
    pub fn resolve(&self, current_schema: &str) -> TableRef {
        TableRef::new(
            self.schema.as_deref().unwrap_or(current_schema),
            self.name.clone(),
        )
    }
}

impl fmt::Display for TableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.schema {
            Some(schema) => write!(f, "`{}`.`{}`", schema, self.name),
            None => write!(f, "`{}`", self.name),
        }
    }
}

/// CREATE / ALTER / DROP of a schema object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectAction {
    Create,
    Alter,
    Drop,
}

/// Table maintenance statements.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaintenanceOp {
    Optimize,
    Analyze,
    Repair,
}

/// Account-management statements.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountOp {
    CreateUser,
    AlterUser,
    DropUser,
    RenameUser,
    Grant,
    Revoke,
    CreateRole,
    DropRole,
    SetPassword,
}

/// The node kind of a parsed statement.
///
/// Only the statement head is parsed: enough to know what the statement is
/// and which tables it touches. Anything the parser does not recognise is
/// `Other`, carrying its leading keyword.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatementKind {
    Savepoint,
    ReleaseSavepoint,
    RollbackToSavepoint,
    Flush,
    TableMaintenance {
        op: MaintenanceOp,
        tables: Vec<TableName>,
    },
    CreateDatabase {
        name: String,
    },
    AlterDatabase {
        name: Option<String>,
    },
    DropDatabase {
        name: String,
    },
    CreateTable {
        table: TableName,
        temporary: bool,
        like: Option<TableName>,
    },
    AlterTable {
        table: TableName,
        rename_to: Option<TableName>,
    },
    DropTable {
        tables: Vec<TableName>,
        temporary: bool,
    },
    RenameTable {
        pairs: Vec<(TableName, TableName)>,
    },
    TruncateTable {
        table: TableName,
    },
    CreateIndex {
        table: TableName,
    },
    DropIndex {
        table: TableName,
    },
    Trigger(ObjectAction),
    Procedure(ObjectAction),
    View(ObjectAction),
    Function(ObjectAction),
    Tablespace(ObjectAction),
    Event(ObjectAction),
    Account(AccountOp),
    Other {
        keyword: String,
    },
}

/// A statement parsed from a binlog query event, with its source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedStatement {
    kind: StatementKind,
    text: String,
}

impl ParsedStatement {
    pub fn new(kind: StatementKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }

    pub fn kind(&self) -> &StatementKind {
        &self.kind
    }

    /// The original statement text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Whether the statement carries the TEMPORARY flag.
    pub fn is_temporary(&self) -> bool {
        matches!(
            self.kind,
            StatementKind::CreateTable {
                temporary: true,
                ..
            } | StatementKind::DropTable {
                temporary: true,
                ..
            }
        )
    }

    /// Whether the statement renames a table.
    pub fn is_rename(&self) -> bool {
        matches!(
            self.kind,
            StatementKind::RenameTable { .. }
                | StatementKind::AlterTable {
                    rename_to: Some(_),
                    ..
                }
        )
    }

    /// Tables the statement affects, as written.
    ///
    /// Rename statements yield source then target for every pair.
    pub fn table_names(&self) -> Vec<&TableName> {
        match &self.kind {
            StatementKind::TableMaintenance { tables, .. }
            | StatementKind::DropTable { tables, .. } => tables.iter().collect(),
            StatementKind::CreateTable { table, like, .. } => {
                std::iter::once(table).chain(like.as_ref()).collect()
            }
            StatementKind::AlterTable { table, rename_to } => {
                std::iter::once(table).chain(rename_to.as_ref()).collect()
            }
            StatementKind::RenameTable { pairs } => {
                pairs.iter().flat_map(|(from, to)| [from, to]).collect()
            }
            StatementKind::TruncateTable { table }
            | StatementKind::CreateIndex { table }
            | StatementKind::DropIndex { table } => vec![table],
            _ => Vec::new(),
        }
    }

    /// Schema/table pairs the statement affects, resolved against
    /// `current_schema`, without duplicates.
    ///
    /// Database statements yield a database-level reference (empty table
    /// name).
    pub fn table_refs(&self, current_schema: &str) -> Vec<TableRef> {
        let mut refs: Vec<TableRef> = match &self.kind {
            StatementKind::CreateDatabase { name } | StatementKind::DropDatabase { name } => {
                vec![TableRef::database(name.clone())]
            }
            StatementKind::AlterDatabase { name } => {
                vec![TableRef::database(
                    name.clone().unwrap_or_else(|| current_schema.to_string()),
                )]
            }
            _ => self
                .table_names()
                .into_iter()
                .map(|t| t.resolve(current_schema))
                .collect(),
        };
        let mut seen = std::collections::HashSet::new();
        refs.retain(|r| seen.insert(r.clone()));
        refs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rename_refs_include_both_sides() {
        let stmt = ParsedStatement::new(
            StatementKind::RenameTable {
                pairs: vec![(
                    TableName::qualified("foo", "test"),
                    TableName::unqualified("test1"),
                )],
            },
            "rename table foo.test to test1",
        );
        assert!(stmt.is_rename());
        assert_eq!(
            stmt.table_refs("cur"),
            vec![TableRef::new("foo", "test"), TableRef::new("cur", "test1")]
        );
    }

    #[test]
    fn test_refs_are_deduplicated() {
        let stmt = ParsedStatement::new(
            StatementKind::DropTable {
                tables: vec![
                    TableName::qualified("db", "a"),
                    TableName::unqualified("a"),
                ],
                temporary: false,
            },
            "drop table db.a, a",
        );
        assert_eq!(stmt.table_refs("db"), vec![TableRef::new("db", "a")]);
        assert!(!stmt.is_temporary());
    }

    #[test]
    fn test_database_refs() {
        let stmt = ParsedStatement::new(
            StatementKind::CreateDatabase {
                name: "shop".to_string(),
            },
            "create database shop",
        );
        assert_eq!(stmt.table_refs(""), vec![TableRef::database("shop")]);
    }
}
