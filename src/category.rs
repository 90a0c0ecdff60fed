//! Statement categories and event kinds.
//!
//! Every [`StatementKind`] maps to exactly one [`Category`]. All categories
//! except [`Category::Ordinary`] are never replicated, whatever the user
//! rules say.

use event_filter::EventType;
use mysql_statement::StatementKind;
use std::fmt;

/// Closed set of statement categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    /// SAVEPOINT and friends
    SessionHousekeeping,
    /// FLUSH
    CacheMaintenance,
    /// OPTIMIZE / ANALYZE / REPAIR TABLE
    TableMaintenance,
    Trigger,
    Procedure,
    View,
    /// Stored and loadable functions
    Function,
    Tablespace,
    ScheduledEvent,
    AccountManagement,
    /// CREATE / DROP TEMPORARY TABLE
    TemporaryTable,
    Ordinary,
}

impl Category {
    pub fn of(kind: &StatementKind) -> Self {
        match kind {
            StatementKind::Savepoint
            | StatementKind::ReleaseSavepoint
            | StatementKind::RollbackToSavepoint => Category::SessionHousekeeping,
            StatementKind::Flush => Category::CacheMaintenance,
            StatementKind::TableMaintenance { .. } => Category::TableMaintenance,
            StatementKind::Trigger(_) => Category::Trigger,
            StatementKind::Procedure(_) => Category::Procedure,
            StatementKind::View(_) => Category::View,
            StatementKind::Function(_) => Category::Function,
            StatementKind::Tablespace(_) => Category::Tablespace,
            StatementKind::Event(_) => Category::ScheduledEvent,
            StatementKind::Account(_) => Category::AccountManagement,
            StatementKind::CreateTable { temporary: true, .. }
            | StatementKind::DropTable { temporary: true, .. } => Category::TemporaryTable,
            StatementKind::CreateDatabase { .. }
            | StatementKind::AlterDatabase { .. }
            | StatementKind::DropDatabase { .. }
            | StatementKind::CreateTable { .. }
            | StatementKind::AlterTable { .. }
            | StatementKind::DropTable { .. }
            | StatementKind::RenameTable { .. }
            | StatementKind::TruncateTable { .. }
            | StatementKind::CreateIndex { .. }
            | StatementKind::DropIndex { .. }
            | StatementKind::Other { .. } => Category::Ordinary,
        }
    }

    /// Whether statements of this category are always skipped.
    pub fn is_never_replicated(self) -> bool {
        self != Category::Ordinary
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Category::SessionHousekeeping => "session housekeeping",
            Category::CacheMaintenance => "cache maintenance",
            Category::TableMaintenance => "table maintenance",
            Category::Trigger => "trigger",
            Category::Procedure => "procedure",
            Category::View => "view",
            Category::Function => "function",
            Category::Tablespace => "tablespace",
            Category::ScheduledEvent => "event",
            Category::AccountManagement => "account management",
            Category::TemporaryTable => "temporary table",
            Category::Ordinary => "ordinary",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The event kind user rules see for a statement.
pub fn event_type(kind: &StatementKind) -> EventType {
    match kind {
        StatementKind::CreateDatabase { .. } => EventType::CreateDatabase,
        StatementKind::AlterDatabase { .. } => EventType::AlterDatabase,
        StatementKind::DropDatabase { .. } => EventType::DropDatabase,
        StatementKind::CreateTable { .. } => EventType::CreateTable,
        StatementKind::AlterTable { .. } => EventType::AlterTable,
        StatementKind::DropTable { .. } => EventType::DropTable,
        StatementKind::RenameTable { .. } => EventType::RenameTable,
        StatementKind::TruncateTable { .. } => EventType::TruncateTable,
        StatementKind::CreateIndex { .. } => EventType::CreateIndex,
        StatementKind::DropIndex { .. } => EventType::DropIndex,
        _ => EventType::None,
    }
}
