//! Command-line interface for binlog-filter
//!
//! # Usage Examples
//!
//! ## Statements
//! ```bash
//! # Classify a query event, with the tables the replicator resolved for it
//! binlog-filter check-query --config filter.toml \
//!   --table shop.orders \
//!   "ALTER TABLE orders ADD COLUMN note TEXT"
//! ```
//!
//! ## Rows
//! ```bash
//! # Insert image
//! binlog-filter check-row --config filter.toml \
//!   --ddl "CREATE TABLE orders (id INT, state TINYINT UNSIGNED)" \
//!   --schema shop --event insert --row '[1, 3]'
//!
//! # Update images
//! binlog-filter check-row --config filter.toml \
//!   --ddl "CREATE TABLE orders (id INT, state TINYINT UNSIGNED)" \
//!   --schema shop --event update --old-row '[1, 1]' --row '[1, 2]'
//! ```
//!
//! Set `RUST_LOG=debug` to see why an event is skipped.

use anyhow::Context;
use binlog_filter::{FilterConfig, SchemaTracker};
use clap::{Parser, Subcommand, ValueEnum};
use event_filter::EventType;
use filter_core::{ColumnDefinition, ColumnType, RowValue, TableDefinition, TableRef};
use rust_decimal::Decimal;
use serde_json::Value as JsonValue;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "binlog-filter")]
#[command(about = "Check which MySQL binlog events a filter configuration skips")]
#[command(long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Decide whether a query event is replicated
    CheckQuery {
        /// Filter configuration file (.toml, .yaml, .yml or .json)
        #[arg(long, env = "BINLOG_FILTER_CONFIG")]
        config: Option<PathBuf>,

        /// Table the statement touches, as schema.table (repeatable)
        #[arg(long = "table", value_name = "SCHEMA.TABLE")]
        tables: Vec<String>,

        /// Statement text
        sql: String,
    },

    /// Decide whether a row event is replicated
    CheckRow {
        /// Filter configuration file (.toml, .yaml, .yml or .json)
        #[arg(long, env = "BINLOG_FILTER_CONFIG")]
        config: PathBuf,

        /// CREATE TABLE statement of the row's table
        #[arg(long)]
        ddl: String,

        /// Schema the table lives in
        #[arg(long, default_value = "")]
        schema: String,

        /// Row event kind
        #[arg(long, value_enum)]
        event: RowEvent,

        /// Row image as a JSON array, in column order (new image for updates)
        #[arg(long)]
        row: String,

        /// Old row image of an update, as a JSON array
        #[arg(long)]
        old_row: Option<String>,
    },

    /// Check that a configuration file is well formed
    Validate {
        /// Filter configuration file (.toml, .yaml, .yml or .json)
        #[arg(long, env = "BINLOG_FILTER_CONFIG")]
        config: PathBuf,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum RowEvent {
    Insert,
    Update,
    Delete,
}

impl From<RowEvent> for EventType {
    fn from(event: RowEvent) -> Self {
        match event {
            RowEvent::Insert => EventType::Insert,
            RowEvent::Update => EventType::Update,
            RowEvent::Delete => EventType::Delete,
        }
    }
}

fn main() -> anyhow::Result<()> {
    if let Err(e) = run() {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}

fn run() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::CheckQuery {
            config,
            tables,
            sql,
        } => {
            let config = match config {
                Some(path) => FilterConfig::from_file(path)?,
                None => FilterConfig::default(),
            };
            let classifier = config.build_classifier()?;
            let tables = tables
                .iter()
                .map(|t| parse_table_arg(t))
                .collect::<anyhow::Result<Vec<_>>>()?;
            let stmt = mysql_statement::parse(&sql).context("Failed to parse statement")?;
            match classifier.classify(&tables, &stmt, &sql)? {
                Some(reason) => println!("skip ({reason})"),
                None => println!("keep"),
            }
        }
        Commands::CheckRow {
            config,
            ddl,
            schema,
            event,
            row,
            old_row,
        } => {
            let config = FilterConfig::from_file(config)?;
            let tracker = Arc::new(SchemaTracker::new());
            tracker
                .exec_ddl(&schema, &ddl)
                .context("Failed to apply table DDL")?;
            let created = mysql_types::parse_create_table(&ddl)?;
            let table = created.table.resolve(&schema);
            let definition = tracker
                .table(&table.schema, &table.name)
                .with_context(|| format!("{table} is not a table definition"))?;

            let (classifier, row_filter) = config.build(tracker.clone())?;
            if classifier.skip_row_event(&table, event.into())? {
                println!("skip (table filter or event rule)");
                return Ok(());
            }

            let new_row = parse_row_arg(&row, &definition)?;
            let skipped = match event {
                RowEvent::Insert => row_filter.skip_insert(&table, &new_row)?,
                RowEvent::Delete => row_filter.skip_delete(&table, &new_row)?,
                RowEvent::Update => {
                    let old_row = old_row.context("--old-row is required for update events")?;
                    let old_row = parse_row_arg(&old_row, &definition)?;
                    row_filter.skip_update(&table, &old_row, &new_row)?
                }
            };
            println!("{}", if skipped { "skip (row expression)" } else { "keep" });
        }
        Commands::Validate { config } => {
            let config = FilterConfig::from_file(&config)?;
            config.validate()?;
            println!(
                "ok: {} event rule(s), {} expression filter(s)",
                config.event_rules.len(),
                config.expression_filters.len()
            );
        }
    }

    Ok(())
}

/// Parse `schema.table`; a bare name has an empty schema.
fn parse_table_arg(arg: &str) -> anyhow::Result<TableRef> {
    match arg.split_once('.') {
        Some((schema, table)) if !table.is_empty() => Ok(TableRef::new(schema, table)),
        Some(_) => anyhow::bail!("Invalid table: {arg}"),
        None => Ok(TableRef::new("", arg)),
    }
}

/// Parse a JSON array row image against the table's columns.
fn parse_row_arg(arg: &str, table: &TableDefinition) -> anyhow::Result<Vec<RowValue>> {
    let values: Vec<JsonValue> =
        serde_json::from_str(arg).with_context(|| format!("Row must be a JSON array: {arg}"))?;
    if values.len() != table.len() {
        anyhow::bail!(
            "Row has {} values but table {} has {} columns",
            values.len(),
            table.name,
            table.len()
        );
    }
    values
        .iter()
        .zip(&table.columns)
        .map(|(value, column)| json_to_row_value(value, column))
        .collect()
}

fn json_to_row_value(value: &JsonValue, column: &ColumnDefinition) -> anyhow::Result<RowValue> {
    Ok(match value {
        JsonValue::Null => RowValue::Null,
        JsonValue::Bool(b) => RowValue::Int64(*b as i64),
        JsonValue::Number(n) => match column.column_type {
            ColumnType::Decimal { .. } => RowValue::Decimal(
                n.to_string()
                    .parse::<Decimal>()
                    .with_context(|| format!("Invalid decimal for column {}: {n}", column.name))?,
            ),
            ColumnType::Float | ColumnType::Double => RowValue::Float64(n.as_f64().unwrap_or_default()),
            _ => match (n.as_i64(), n.as_u64()) {
                (Some(i), _) => RowValue::Int64(i),
                (None, Some(u)) => RowValue::UInt64(u),
                _ => RowValue::Float64(n.as_f64().unwrap_or_default()),
            },
        },
        JsonValue::String(s) => RowValue::String(s.clone()),
        // JSON column documents
        other => RowValue::String(other.to_string()),
    })
}
