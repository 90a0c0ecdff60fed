//! Binlog event kinds as rules name them.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The kind of a binlog event.
///
/// `All`, `AllDdl` and `AllDml` only appear in rule event sets; every
/// concrete event is one of the other variants. Statements with no event
/// mapping are `None` and can only be matched by a rule's SQL patterns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventType {
    #[serde(rename = "all")]
    All,
    #[serde(rename = "all ddl")]
    AllDdl,
    #[serde(rename = "all dml")]
    AllDml,

    #[serde(rename = "create database")]
    CreateDatabase,
    #[serde(rename = "drop database")]
    DropDatabase,
    #[serde(rename = "alter database")]
    AlterDatabase,
    #[serde(rename = "create table")]
    CreateTable,
    #[serde(rename = "drop table")]
    DropTable,
    #[serde(rename = "truncate table")]
    TruncateTable,
    #[serde(rename = "rename table")]
    RenameTable,
    #[serde(rename = "alter table")]
    AlterTable,
    #[serde(rename = "create index")]
    CreateIndex,
    #[serde(rename = "drop index")]
    DropIndex,

    #[serde(rename = "insert")]
    Insert,
    #[serde(rename = "update")]
    Update,
    #[serde(rename = "delete")]
    Delete,

    #[serde(rename = "none")]
    None,
}

impl EventType {
    const ALL: [EventType; 17] = [
        EventType::All,
        EventType::AllDdl,
        EventType::AllDml,
        EventType::CreateDatabase,
        EventType::DropDatabase,
        EventType::AlterDatabase,
        EventType::CreateTable,
        EventType::DropTable,
        EventType::TruncateTable,
        EventType::RenameTable,
        EventType::AlterTable,
        EventType::CreateIndex,
        EventType::DropIndex,
        EventType::Insert,
        EventType::Update,
        EventType::Delete,
        EventType::None,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            EventType::All => "all",
            EventType::AllDdl => "all ddl",
            EventType::AllDml => "all dml",
            EventType::CreateDatabase => "create database",
            EventType::DropDatabase => "drop database",
            EventType::AlterDatabase => "alter database",
            EventType::CreateTable => "create table",
            EventType::DropTable => "drop table",
            EventType::TruncateTable => "truncate table",
            EventType::RenameTable => "rename table",
            EventType::AlterTable => "alter table",
            EventType::CreateIndex => "create index",
            EventType::DropIndex => "drop index",
            EventType::Insert => "insert",
            EventType::Update => "update",
            EventType::Delete => "delete",
            EventType::None => "none",
        }
    }

    pub fn is_ddl(self) -> bool {
        matches!(
            self,
            EventType::CreateDatabase
                | EventType::DropDatabase
                | EventType::AlterDatabase
                | EventType::CreateTable
                | EventType::DropTable
                | EventType::TruncateTable
                | EventType::RenameTable
                | EventType::AlterTable
                | EventType::CreateIndex
                | EventType::DropIndex
        )
    }

    pub fn is_dml(self) -> bool {
        matches!(
            self,
            EventType::Insert | EventType::Update | EventType::Delete
        )
    }

    /// Whether a rule listing `self` covers the concrete event `event`.
    pub fn covers(self, event: EventType) -> bool {
        match self {
            EventType::All => event != EventType::None,
            EventType::AllDdl => event.is_ddl(),
            EventType::AllDml => event.is_dml(),
            EventType::None => false,
            _ => self == event,
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.split_whitespace().collect::<Vec<_>>().join(" ");
        Self::ALL
            .into_iter()
            .find(|e| e.as_str().eq_ignore_ascii_case(&normalized))
            .ok_or_else(|| format!("unknown event type: {s}"))
    }
}
