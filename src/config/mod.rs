//! Filter configuration.
//!
//! A [`FilterConfig`] is read from a TOML, YAML or JSON file, chosen by
//! the file extension:
//!
//! ```toml
//! case_sensitive = false
//!
//! [block_allow_list]
//! ignore_dbs = ["test_*"]
//!
//! [[event_rules]]
//! schema_pattern = "*"
//! events = ["drop table"]
//! sql_patterns = ["^drop\\s+table"]
//! action = "ignore"
//!
//! [[expression_filters]]
//! schema = "shop"
//! table = "orders"
//! insert_value_expr = "state != 1"
//! ```

use crate::classifier::StatementClassifier;
use crate::error::FilterError;
use crate::row_filter::{ExpressionFilter, RowEventFilter};
use crate::schema_tracker::ExpressionBinder;
use anyhow::Context;
use event_filter::{BinlogEventRules, BlockAllowList, BlockAllowListConfig, EventRule};
use row_expr::parse_predicate;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Supported configuration file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Toml,
    Yaml,
    Json,
}

impl ConfigFormat {
    /// Format for a file path, by extension.
    pub fn from_path(path: &Path) -> anyhow::Result<Self> {
        let ext = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase());
        match ext.as_deref() {
            Some("toml") => Ok(Self::Toml),
            Some("yaml" | "yml") => Ok(Self::Yaml),
            Some("json") => Ok(Self::Json),
            _ => anyhow::bail!(
                "Unsupported config file extension: {} (expected .toml, .yaml, .yml or .json)",
                path.display()
            ),
        }
    }
}

/// Statement and row filter settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Match schema and table patterns case-sensitively
    pub case_sensitive: bool,
    pub block_allow_list: BlockAllowListConfig,
    pub event_rules: Vec<EventRule>,
    pub expression_filters: Vec<ExpressionFilter>,
}

impl FilterConfig {
    /// Load a configuration file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let format = ConfigFormat::from_path(path)?;
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config = Self::parse(&content, format)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        info!(
            path = %path.display(),
            rules = config.event_rules.len(),
            expression_filters = config.expression_filters.len(),
            "Loaded filter config"
        );
        Ok(config)
    }

    pub fn parse(content: &str, format: ConfigFormat) -> anyhow::Result<Self> {
        Ok(match format {
            ConfigFormat::Toml => toml::from_str(content).context("Invalid TOML")?,
            ConfigFormat::Yaml => serde_yaml::from_str(content).context("Invalid YAML")?,
            ConfigFormat::Json => serde_json::from_str(content).context("Invalid JSON")?,
        })
    }

    /// Build the statement classifier: the block/allow list when one is
    /// configured and the event rules when there are any.
    pub fn build_classifier(&self) -> Result<StatementClassifier, FilterError> {
        let mut classifier = StatementClassifier::new();
        if !self.block_allow_list.is_empty() {
            let filter = BlockAllowList::new(&self.block_allow_list, self.case_sensitive)?;
            classifier = classifier.with_table_filter(Arc::new(filter));
        }
        if !self.event_rules.is_empty() {
            let rules = BinlogEventRules::new(self.event_rules.clone(), self.case_sensitive)?;
            classifier = classifier.with_rules(Arc::new(rules));
        }
        Ok(classifier)
    }

    pub fn build_row_filter(&self, binder: Arc<dyn ExpressionBinder>) -> RowEventFilter {
        RowEventFilter::new(self.expression_filters.clone(), binder, self.case_sensitive)
    }

    /// Build both filters.
    pub fn build(
        &self,
        binder: Arc<dyn ExpressionBinder>,
    ) -> Result<(StatementClassifier, RowEventFilter), FilterError> {
        Ok((self.build_classifier()?, self.build_row_filter(binder)))
    }

    /// Check that every pattern, rule and predicate is well formed.
    ///
    /// Predicates are only parsed here; binding needs table definitions.
    pub fn validate(&self) -> anyhow::Result<()> {
        self.build_classifier()
            .context("Invalid block/allow list or event rules")?;
        for filter in &self.expression_filters {
            if filter.table.is_empty() {
                anyhow::bail!("Expression filter for schema '{}' has no table", filter.schema);
            }
            for predicate in filter.predicates() {
                parse_predicate(predicate).with_context(|| {
                    format!(
                        "Invalid expression for {}.{}: {predicate}",
                        filter.schema, filter.table
                    )
                })?;
            }
        }
        Ok(())
    }
}
