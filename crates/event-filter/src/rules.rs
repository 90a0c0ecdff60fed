//! Binlog event pattern rules.
//!
//! Rules are sorted into three tiers when the engine is built:
//!
//! - table tier: rules with a table pattern
//! - schema tier: rules with only a schema pattern (other than `*`)
//! - global tier: rules with no pattern, or schema pattern `*`
//!
//! Tiers are consulted most specific first. Inside a tier, the rules whose
//! patterns match the table are tried in definition order and the first
//! rule whose events or SQL patterns match decides. When none does but the
//! tier holds a matching `Do` rule, the event is ignored: a `Do` rule
//! limits its tables to the events it lists.

use crate::error::{PatternError, RuleError};
use crate::event::EventType;
use crate::pattern::PatternMatcher;
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use tracing::trace;

/// What to do with events a rule matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Do,
    Ignore,
}

/// Result of consulting an [`EventRuleEngine`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleOutcome {
    Do,
    Ignore,
    NoMatch,
}

impl From<Action> for RuleOutcome {
    fn from(action: Action) -> Self {
        match action {
            Action::Do => RuleOutcome::Do,
            Action::Ignore => RuleOutcome::Ignore,
        }
    }
}

/// A user-defined event rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRule {
    #[serde(default)]
    pub schema_pattern: String,
    #[serde(default)]
    pub table_pattern: String,
    #[serde(default)]
    pub events: Vec<EventType>,
    /// Regexes over the statement text, matched case-insensitively
    #[serde(default)]
    pub sql_patterns: Vec<String>,
    pub action: Action,
}

/// Decides what to do with an event on a table.
///
/// `table` is empty for database-level events.
pub trait EventRuleEngine: Send + Sync {
    fn match_action(
        &self,
        schema: &str,
        table: &str,
        event: EventType,
        sql: &str,
    ) -> Result<RuleOutcome, RuleError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tier {
    Table,
    Schema,
    Global,
}

#[derive(Debug, Clone)]
struct CompiledRule {
    index: usize,
    schema: Option<PatternMatcher>,
    table: Option<PatternMatcher>,
    events: Vec<EventType>,
    sql: Vec<Regex>,
    action: Action,
}

impl CompiledRule {
    fn compile(index: usize, rule: &EventRule, case_sensitive: bool) -> Result<Self, RuleError> {
        if rule.events.is_empty() && rule.sql_patterns.is_empty() {
            return Err(RuleError::InvalidRule {
                index,
                reason: "rule needs events or SQL patterns".to_string(),
            });
        }
        if !rule.table_pattern.is_empty() && rule.schema_pattern.is_empty() {
            return Err(RuleError::InvalidRule {
                index,
                reason: "table pattern requires a schema pattern".to_string(),
            });
        }

        let compile = |p: &str| -> Result<Option<PatternMatcher>, PatternError> {
            if p.is_empty() {
                Ok(None)
            } else {
                PatternMatcher::new(p, case_sensitive).map(Some)
            }
        };
        let sql = rule
            .sql_patterns
            .iter()
            .map(|p| {
                RegexBuilder::new(p)
                    .case_insensitive(true)
                    .build()
                    .map_err(|source| RuleError::InvalidSqlPattern {
                        index,
                        pattern: p.clone(),
                        source,
                    })
            })
            .collect::<Result<_, _>>()?;

        Ok(Self {
            index,
            schema: compile(&rule.schema_pattern)?,
            table: compile(&rule.table_pattern)?,
            events: rule.events.clone(),
            sql,
            action: rule.action,
        })
    }

    fn tier(&self) -> Tier {
        match (&self.schema, &self.table) {
            (_, Some(_)) => Tier::Table,
            (Some(schema), None) if !schema.is_wildcard() => Tier::Schema,
            _ => Tier::Global,
        }
    }

    fn matches_name(&self, schema: &str, table: &str) -> bool {
        self.schema.as_ref().map_or(true, |p| p.matches(schema))
            && self.table.as_ref().map_or(true, |p| p.matches(table))
    }

    fn matches_event(&self, event: EventType, sql: &str) -> bool {
        self.events.iter().any(|e| e.covers(event))
            || (!sql.is_empty() && self.sql.iter().any(|re| re.is_match(sql)))
    }
}

/// The built-in [`EventRuleEngine`].
///
/// ```rust
/// use event_filter::{Action, BinlogEventRules, EventRule, EventRuleEngine, EventType, RuleOutcome};
///
/// let rules = BinlogEventRules::new(
///     vec![EventRule {
///         schema_pattern: "*".to_string(),
///         table_pattern: String::new(),
///         events: vec![EventType::DropTable],
///         sql_patterns: vec![],
///         action: Action::Ignore,
///     }],
///     false,
/// )
/// .unwrap();
/// let outcome = rules
///     .match_action("tx", "test", EventType::DropTable, "drop table tx.test")
///     .unwrap();
/// assert_eq!(outcome, RuleOutcome::Ignore);
/// ```
#[derive(Debug, Clone, Default)]
pub struct BinlogEventRules {
    table_rules: Vec<CompiledRule>,
    schema_rules: Vec<CompiledRule>,
    global_rules: Vec<CompiledRule>,
}

impl BinlogEventRules {
    pub fn new(rules: Vec<EventRule>, case_sensitive: bool) -> Result<Self, RuleError> {
        let mut engine = Self::default();
        for (index, rule) in rules.iter().enumerate() {
            let compiled = CompiledRule::compile(index, rule, case_sensitive)?;
            match compiled.tier() {
                Tier::Table => engine.table_rules.push(compiled),
                Tier::Schema => engine.schema_rules.push(compiled),
                Tier::Global => engine.global_rules.push(compiled),
            }
        }
        Ok(engine)
    }

    pub fn len(&self) -> usize {
        self.table_rules.len() + self.schema_rules.len() + self.global_rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Evaluate one tier.
    fn match_tier(
        rules: &[CompiledRule],
        tier: Tier,
        schema: &str,
        table: &str,
        event: EventType,
        sql: &str,
    ) -> Option<RuleOutcome> {
        let mut has_do = false;
        for rule in rules.iter().filter(|r| r.matches_name(schema, table)) {
            if rule.matches_event(event, sql) {
                trace!(
                    rule = rule.index,
                    ?tier,
                    schema,
                    table,
                    %event,
                    action = ?rule.action,
                    "event rule matched"
                );
                return Some(rule.action.into());
            }
            has_do |= rule.action == Action::Do;
        }
        if has_do {
            trace!(?tier, schema, table, %event, "event not listed by do rule");
            Some(RuleOutcome::Ignore)
        } else {
            None
        }
    }
}

impl EventRuleEngine for BinlogEventRules {
    fn match_action(
        &self,
        schema: &str,
        table: &str,
        event: EventType,
        sql: &str,
    ) -> Result<RuleOutcome, RuleError> {
        let tiers = [
            (&self.table_rules, Tier::Table),
            (&self.schema_rules, Tier::Schema),
            (&self.global_rules, Tier::Global),
        ];
        Ok(tiers
            .into_iter()
            .find_map(|(rules, tier)| Self::match_tier(rules, tier, schema, table, event, sql))
            .unwrap_or(RuleOutcome::NoMatch))
    }
}
