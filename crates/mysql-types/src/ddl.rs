//! CREATE TABLE / ALTER TABLE column parsing.
//!
//! Statements are parsed with `sqlparser`'s MySQL dialect. Only the column
//! list matters for row filtering, so index, key, check and partition
//! clauses are ignored and every column is reduced to its name,
//! [`ColumnType`](filter_core::ColumnType) and nullability.
//!
//! ALTER TABLE clauses are parsed one at a time, so a clause the parser does
//! not know (`ALGORITHM=`, `RENAME INDEX`, ...) is skipped when it cannot
//! change the columns or the table name.

use crate::schema::mysql_column_to_column_type;
use filter_core::{ColumnDefinition, SchemaError, TableDefinition};
use mysql_statement::{TableName, TokenExt};
use sqlparser::ast::{
    AlterTableOperation, ColumnDef, ColumnOption, DataType, Ident, MySQLColumnPosition,
    ObjectName, Statement,
};
use sqlparser::dialect::MySqlDialect;
use sqlparser::parser::{Parser, ParserError};
use sqlparser::tokenizer::{Token, Tokenizer, Whitespace};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum DdlError {
    #[error("Invalid DDL: {0}")]
    Parse(#[from] ParserError),
    #[error(transparent)]
    Schema(#[from] SchemaError),
    #[error("Unsupported DDL: {0}")]
    Unsupported(&'static str),
}

/// Second words of ADD / DROP clauses that touch indexes and constraints
/// rather than columns.
const NON_COLUMN_KEYWORDS: &[&str] = &[
    "PRIMARY",
    "KEY",
    "INDEX",
    "UNIQUE",
    "FULLTEXT",
    "SPATIAL",
    "CONSTRAINT",
    "FOREIGN",
    "CHECK",
    "PARTITION",
];

/// Body of a CREATE TABLE statement.
#[derive(Debug, Clone, PartialEq)]
pub enum CreateTableBody {
    Columns(Vec<ColumnDefinition>),
    /// `CREATE TABLE t LIKE source`
    Like(TableName),
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreateTable {
    pub table: TableName,
    pub temporary: bool,
    pub if_not_exists: bool,
    pub body: CreateTableBody,
}

impl CreateTable {
    /// Table definition for a column-list body.
    pub fn definition(&self) -> Option<TableDefinition> {
        match &self.body {
            CreateTableBody::Columns(columns) => {
                Some(TableDefinition::new(self.table.name.clone(), columns.clone()))
            }
            CreateTableBody::Like(_) => None,
        }
    }
}

/// Where ADD / MODIFY / CHANGE places a column.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ColumnPosition {
    #[default]
    Unchanged,
    First,
    After(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum AlterOp {
    AddColumn {
        column: ColumnDefinition,
        position: ColumnPosition,
    },
    DropColumn(String),
    /// `MODIFY col def` is `ChangeColumn` with `old == column.name`
    ChangeColumn {
        old: String,
        column: ColumnDefinition,
        position: ColumnPosition,
    },
    RenameColumn {
        old: String,
        new: String,
    },
    RenameTable(TableName),
}

impl AlterOp {
    /// Apply a column operation to a table definition.
    ///
    /// `RenameTable` does not touch the columns; the caller moves the
    /// definition.
    pub fn apply(&self, table: &mut TableDefinition) -> Result<(), SchemaError> {
        match self {
            AlterOp::AddColumn { column, position } => {
                let pos = resolve_position(table, position, table.len())?;
                table.add_column(column.clone(), Some(pos))
            }
            AlterOp::DropColumn(name) => table.drop_column(name).map(|_| ()),
            AlterOp::ChangeColumn {
                old,
                column,
                position,
            } => {
                let current = table.column_index(old).ok_or_else(|| {
                    SchemaError::ColumnNotFound {
                        table: table.name.clone(),
                        column: old.clone(),
                    }
                })?;
                if !column.name.eq_ignore_ascii_case(old) && table.column_index(&column.name).is_some()
                {
                    return Err(SchemaError::DuplicateColumn {
                        table: table.name.clone(),
                        column: column.name.clone(),
                    });
                }
                table.drop_column(old)?;
                let pos = resolve_position(table, position, current)?;
                table.add_column(column.clone(), Some(pos))
            }
            AlterOp::RenameColumn { old, new } => {
                if !new.eq_ignore_ascii_case(old) && table.column_index(new).is_some() {
                    return Err(SchemaError::DuplicateColumn {
                        table: table.name.clone(),
                        column: new.clone(),
                    });
                }
                let idx = table
                    .column_index(old)
                    .ok_or_else(|| SchemaError::ColumnNotFound {
                        table: table.name.clone(),
                        column: old.clone(),
                    })?;
                table.columns[idx].name = new.clone();
                Ok(())
            }
            AlterOp::RenameTable(_) => Ok(()),
        }
    }
}

fn resolve_position(
    table: &TableDefinition,
    position: &ColumnPosition,
    default: usize,
) -> Result<usize, SchemaError> {
    match position {
        ColumnPosition::Unchanged => Ok(default),
        ColumnPosition::First => Ok(0),
        ColumnPosition::After(name) => table
            .column_index(name)
            .map(|i| i + 1)
            .ok_or_else(|| SchemaError::ColumnNotFound {
                table: table.name.clone(),
                column: name.clone(),
            }),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AlterTable {
    pub table: TableName,
    pub ops: Vec<AlterOp>,
}

impl AlterTable {
    /// The final name when the statement renames the table.
    pub fn rename_to(&self) -> Option<&TableName> {
        self.ops.iter().rev().find_map(|op| match op {
            AlterOp::RenameTable(to) => Some(to),
            _ => None,
        })
    }
}

/// Parse a CREATE TABLE statement.
///
/// # Example
///
/// ```
/// use mysql_types::ddl::{parse_create_table, CreateTableBody};
///
/// let ct = parse_create_table(
///     "CREATE TABLE t (id INT UNSIGNED NOT NULL, c ENUM('a','b'), PRIMARY KEY (id))",
/// ).unwrap();
/// let def = ct.definition().unwrap();
/// assert_eq!(def.column_names(), vec!["id", "c"]);
/// assert!(!def.columns[0].nullable);
/// ```
pub fn parse_create_table(sql: &str) -> Result<CreateTable, DdlError> {
    let Statement::CreateTable(create) = parse_statement(sql)? else {
        return Err(DdlError::Unsupported("not a CREATE TABLE statement"));
    };
    let body = match (&create.like, &create.query) {
        (Some(source), _) => CreateTableBody::Like(table_name(source)?),
        (None, Some(_)) => return Err(DdlError::Unsupported("CREATE TABLE ... SELECT")),
        (None, None) => {
            CreateTableBody::Columns(create.columns.iter().map(column_definition).collect())
        }
    };
    Ok(CreateTable {
        table: table_name(&create.name)?,
        temporary: create.temporary,
        if_not_exists: create.if_not_exists,
        body,
    })
}

/// Parse the column-affecting clauses of an ALTER TABLE statement.
///
/// Clauses that do not change the column list are dropped.
pub fn parse_alter_table(sql: &str) -> Result<AlterTable, DdlError> {
    let dialect = MySqlDialect {};
    let tokens = Tokenizer::new(&dialect, sql)
        .tokenize()
        .map_err(ParserError::from)?;
    let alter =
        split_alter(&tokens).ok_or(DdlError::Unsupported("not an ALTER TABLE statement"))?;

    let mut ops = Vec::new();
    for spec in alter.specs {
        let clause = render(&rename_with_to(spec));
        let statement = match parse_statement(&format!("{} {clause}", alter.header)) {
            Ok(statement) => statement,
            Err(err) if !changes_columns(spec) => {
                debug!(clause = clause.trim(), %err, "Skipping ALTER TABLE clause");
                continue;
            }
            Err(err) => return Err(err),
        };
        if let Statement::AlterTable { operations, .. } = statement {
            for operation in &operations {
                ops.extend(alter_op(operation)?);
            }
        }
    }
    Ok(AlterTable {
        table: alter.table,
        ops,
    })
}

fn parse_statement(sql: &str) -> Result<Statement, DdlError> {
    let mut statements = Parser::parse_sql(&MySqlDialect {}, sql)?;
    if statements.len() != 1 {
        return Err(DdlError::Unsupported("expected exactly one statement"));
    }
    Ok(statements.remove(0))
}

fn alter_op(operation: &AlterTableOperation) -> Result<Option<AlterOp>, DdlError> {
    let op = match operation {
        AlterTableOperation::AddColumn {
            column_def,
            column_position,
            ..
        } => AlterOp::AddColumn {
            column: column_definition(column_def),
            position: position(column_position.as_ref()),
        },
        AlterTableOperation::DropColumn { column_name, .. } => {
            AlterOp::DropColumn(column_name.value.clone())
        }
        AlterTableOperation::ModifyColumn {
            col_name,
            data_type,
            options,
            column_position,
            ..
        } => AlterOp::ChangeColumn {
            old: col_name.value.clone(),
            column: column_from_parts(col_name, data_type, options),
            position: position(column_position.as_ref()),
        },
        AlterTableOperation::ChangeColumn {
            old_name,
            new_name,
            data_type,
            options,
            column_position,
            ..
        } => AlterOp::ChangeColumn {
            old: old_name.value.clone(),
            column: column_from_parts(new_name, data_type, options),
            position: position(column_position.as_ref()),
        },
        AlterTableOperation::RenameColumn {
            old_column_name,
            new_column_name,
        } => AlterOp::RenameColumn {
            old: old_column_name.value.clone(),
            new: new_column_name.value.clone(),
        },
        AlterTableOperation::RenameTable { table_name: to } => {
            AlterOp::RenameTable(table_name(to)?)
        }
        _ => return Ok(None),
    };
    Ok(Some(op))
}

fn position(position: Option<&MySQLColumnPosition>) -> ColumnPosition {
    match position {
        None => ColumnPosition::Unchanged,
        Some(MySQLColumnPosition::First) => ColumnPosition::First,
        Some(MySQLColumnPosition::After(column)) => ColumnPosition::After(column.value.clone()),
    }
}

/// `name` or `schema.name`, unquoted.
fn table_name(name: &ObjectName) -> Result<TableName, DdlError> {
    let parts: Vec<String> = name.0.iter().map(|part| unquote(&part.to_string())).collect();
    match parts.as_slice() {
        [table] => Ok(TableName::unqualified(table.clone())),
        [schema, table] => Ok(TableName::qualified(schema.clone(), table.clone())),
        _ => Err(DdlError::Unsupported("table name with more than two parts")),
    }
}

fn unquote(ident: &str) -> String {
    match ident.strip_prefix('`').and_then(|s| s.strip_suffix('`')) {
        Some(inner) => inner.replace("``", "`"),
        None => ident.to_string(),
    }
}

fn column_definition(column: &ColumnDef) -> ColumnDefinition {
    column_from_parts(
        &column.name,
        &column.data_type,
        column.options.iter().map(|o| &o.option),
    )
}

fn column_from_parts<'a>(
    name: &Ident,
    data_type: &DataType,
    options: impl IntoIterator<Item = &'a ColumnOption>,
) -> ColumnDefinition {
    let column_type = data_type.to_string();
    let nullable = options.into_iter().fold(true, |nullable, option| match option {
        ColumnOption::NotNull | ColumnOption::Unique { is_primary: true, .. } => false,
        ColumnOption::Null => true,
        _ => nullable,
    });
    ColumnDefinition {
        name: name.value.clone(),
        column_type: mysql_column_to_column_type(&type_name(&column_type), &column_type),
        nullable,
    }
}

/// The type name without arguments or sign modifiers:
/// `BIGINT(20) UNSIGNED` is `BIGINT`, `DOUBLE PRECISION` stays whole.
fn type_name(column_type: &str) -> String {
    let head = column_type.split('(').next().unwrap_or(column_type);
    head.split_whitespace()
        .filter(|word| {
            !["UNSIGNED", "SIGNED", "ZEROFILL"]
                .iter()
                .any(|m| word.eq_ignore_ascii_case(m))
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// An ALTER TABLE statement cut at its top-level commas.
struct AlterSpecs<'a> {
    table: TableName,
    /// `ALTER TABLE name`
    header: String,
    specs: Vec<&'a [Token]>,
}

fn split_alter(tokens: &[Token]) -> Option<AlterSpecs<'_>> {
    let is_keyword = |pos: usize, kw: &str| tokens.get(pos).is_some_and(|t| t.is_keyword(kw));

    let mut pos = skip_whitespace(tokens, 0);
    if !is_keyword(pos, "ALTER") {
        return None;
    }
    pos = skip_whitespace(tokens, pos + 1);
    while ["ONLINE", "OFFLINE", "IGNORE"].iter().any(|kw| is_keyword(pos, kw)) {
        pos = skip_whitespace(tokens, pos + 1);
    }
    if !is_keyword(pos, "TABLE") {
        return None;
    }
    pos = skip_whitespace(tokens, pos + 1);

    let name_start = pos;
    let first = tokens.get(pos)?.as_ident()?.to_string();
    pos += 1;
    let table = if tokens.get(pos) == Some(&Token::Period) {
        let name = tokens.get(pos + 1)?.as_ident()?.to_string();
        pos += 2;
        TableName::qualified(first, name)
    } else {
        TableName::unqualified(first)
    };
    let header = format!("ALTER TABLE {}", render(&tokens[name_start..pos]));

    let mut specs = Vec::new();
    let mut depth = 0usize;
    let mut start = pos;
    for (i, token) in tokens.iter().enumerate().skip(pos) {
        match token {
            Token::LParen => depth += 1,
            Token::RParen => depth = depth.saturating_sub(1),
            Token::Comma | Token::SemiColon if depth == 0 => {
                specs.push(&tokens[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    specs.push(&tokens[start..]);
    specs.retain(|spec| spec.iter().any(|t| !matches!(t, Token::Whitespace(_))));

    Some(AlterSpecs {
        table,
        header,
        specs,
    })
}

fn skip_whitespace(tokens: &[Token], mut pos: usize) -> usize {
    while matches!(tokens.get(pos), Some(Token::Whitespace(_))) {
        pos += 1;
    }
    pos
}

fn render(tokens: &[Token]) -> String {
    tokens.iter().map(ToString::to_string).collect()
}

/// Spell a table rename as `RENAME TO new_name`; MySQL also accepts
/// `RENAME AS new_name` and `RENAME new_name`.
fn rename_with_to(spec: &[Token]) -> Vec<Token> {
    let significant: Vec<usize> = spec
        .iter()
        .enumerate()
        .filter(|(_, t)| !matches!(t, Token::Whitespace(_)))
        .map(|(i, _)| i)
        .collect();
    let mut out = spec.to_vec();
    if let [rename, second, ..] = significant[..] {
        if spec[rename].is_keyword("RENAME") {
            if spec[second].is_keyword("AS") {
                out[second] = Token::make_keyword("TO");
            } else if !["TO", "COLUMN", "INDEX", "KEY", "CONSTRAINT"]
                .iter()
                .any(|kw| spec[second].is_keyword(kw))
            {
                out.insert(second, Token::Whitespace(Whitespace::Space));
                out.insert(second, Token::make_keyword("TO"));
            }
        }
    }
    out
}

/// Whether an ALTER TABLE clause can change the columns or the table name.
fn changes_columns(spec: &[Token]) -> bool {
    let mut words = spec.iter().filter(|t| !matches!(t, Token::Whitespace(_)));
    let Some(head) = words.next() else {
        return false;
    };
    let second = words.next();
    ["ADD", "DROP", "MODIFY", "CHANGE", "RENAME"]
        .iter()
        .any(|kw| head.is_keyword(kw))
        && !second.is_some_and(|t| NON_COLUMN_KEYWORDS.iter().any(|kw| t.is_keyword(kw)))
}
