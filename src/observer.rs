//! Skip metrics.
//!
//! The classifier reports every skip to an injected [`SkipObserver`]. The
//! observer is told when a task starts and stops so per-task state can be
//! dropped with the task.

use crate::category::Category;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

/// Why an event was skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SkipReason {
    /// The statement belongs to a never-replicated category
    Category(Category),
    /// Every table is in a system schema
    SystemSchema,
    /// A table is blocked by the block/allow list
    TableFilter,
    /// An event rule ignored it
    Rule,
    /// A row expression filter matched
    Expression,
}

impl SkipReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            SkipReason::Category(_) => "category",
            SkipReason::SystemSchema => "system_schema",
            SkipReason::TableFilter => "table_filter",
            SkipReason::Rule => "rule",
            SkipReason::Expression => "expression",
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::Category(category) => write!(f, "{category} statement"),
            SkipReason::SystemSchema => f.write_str("system schema"),
            SkipReason::TableFilter => f.write_str("blocked by table filter"),
            SkipReason::Rule => f.write_str("ignored by event rule"),
            SkipReason::Expression => f.write_str("matched row expression"),
        }
    }
}

/// Receives skip decisions.
pub trait SkipObserver: Send + Sync {
    fn task_started(&self, task: &str);

    fn skipped(&self, task: &str, reason: SkipReason);

    /// Forget everything recorded for `task`.
    fn task_stopped(&self, task: &str);
}

#[derive(Debug, Default)]
struct TaskCounters {
    category: AtomicU64,
    system_schema: AtomicU64,
    table_filter: AtomicU64,
    rule: AtomicU64,
    expression: AtomicU64,
}

impl TaskCounters {
    fn counter(&self, reason: SkipReason) -> &AtomicU64 {
        match reason {
            SkipReason::Category(_) => &self.category,
            SkipReason::SystemSchema => &self.system_schema,
            SkipReason::TableFilter => &self.table_filter,
            SkipReason::Rule => &self.rule,
            SkipReason::Expression => &self.expression,
        }
    }

    fn snapshot(&self) -> SkipSnapshot {
        let load = |c: &AtomicU64| c.load(Ordering::Relaxed);
        SkipSnapshot {
            category: load(&self.category),
            system_schema: load(&self.system_schema),
            table_filter: load(&self.table_filter),
            rule: load(&self.rule),
            expression: load(&self.expression),
        }
    }
}

/// Skip counts of one task.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SkipSnapshot {
    pub category: u64,
    pub system_schema: u64,
    pub table_filter: u64,
    pub rule: u64,
    pub expression: u64,
}

impl SkipSnapshot {
    pub fn total(&self) -> u64 {
        self.category + self.system_schema + self.table_filter + self.rule + self.expression
    }
}

/// In-memory per-task skip counters.
#[derive(Debug, Default)]
pub struct SkipCounters {
    tasks: RwLock<HashMap<String, Arc<TaskCounters>>>,
}

impl SkipCounters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts for `task`, or `None` if the task is not running.
    pub fn snapshot(&self, task: &str) -> Option<SkipSnapshot> {
        let tasks = self.tasks.read().unwrap_or_else(|e| e.into_inner());
        tasks.get(task).map(|c| c.snapshot())
    }

    pub fn tasks(&self) -> Vec<String> {
        let tasks = self.tasks.read().unwrap_or_else(|e| e.into_inner());
        let mut names: Vec<String> = tasks.keys().cloned().collect();
        names.sort();
        names
    }

    fn task(&self, task: &str) -> Arc<TaskCounters> {
        if let Some(counters) = self
            .tasks
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(task)
        {
            return counters.clone();
        }
        self.tasks
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .entry(task.to_string())
            .or_default()
            .clone()
    }
}

impl SkipObserver for SkipCounters {
    fn task_started(&self, task: &str) {
        self.task(task);
    }

    fn skipped(&self, task: &str, reason: SkipReason) {
        self.task(task).counter(reason).fetch_add(1, Ordering::Relaxed);
    }

    fn task_stopped(&self, task: &str) {
        self.tasks
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .remove(task);
    }
}
