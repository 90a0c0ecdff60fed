//! Statement head parser.
//!
//! Reads just enough of a statement to decide its [`StatementKind`]: the
//! leading keywords, the optional clauses MySQL allows between them
//! (`OR REPLACE`, `ALGORITHM=`, `DEFINER=`, `SQL SECURITY`, `AGGREGATE`,
//! `TEMPORARY`, ...) and the table names that follow. Bodies of views,
//! routines, triggers and events are never looked at.

use crate::cursor::Cursor;
use crate::error::ParseError;
use crate::lexer::{tokenize, TokenExt};
use crate::statement::{
    AccountOp, MaintenanceOp, ObjectAction, ParsedStatement, StatementKind, TableName,
};
use sqlparser::tokenizer::Token;

/// Parse one statement.
pub fn parse(sql: &str) -> Result<ParsedStatement, ParseError> {
    let tokens = tokenize(sql)?;
    let mut cur = Cursor::new(&tokens);
    while cur.eat_token(&Token::SemiColon) {}
    if cur.at_end() {
        return Err(ParseError::Empty);
    }
    let kind = parse_kind(&mut cur)?;
    Ok(ParsedStatement::new(kind, sql))
}

fn parse_kind(cur: &mut Cursor<'_>) -> Result<StatementKind, ParseError> {
    let Some(first) = cur.next_keyword() else {
        return Ok(StatementKind::Other {
            keyword: String::new(),
        });
    };
    let keyword = first.to_uppercase();

    let kind = match keyword.as_str() {
        "SAVEPOINT" => StatementKind::Savepoint,
        "RELEASE" if cur.is_keyword("SAVEPOINT") => StatementKind::ReleaseSavepoint,
        "ROLLBACK" if rollback_to_savepoint(cur) => StatementKind::RollbackToSavepoint,
        "FLUSH" => StatementKind::Flush,
        "OPTIMIZE" => parse_maintenance(cur, MaintenanceOp::Optimize)?,
        "ANALYZE" => parse_maintenance(cur, MaintenanceOp::Analyze)?,
        "REPAIR" => parse_maintenance(cur, MaintenanceOp::Repair)?,
        "CREATE" => parse_create(cur)?,
        "ALTER" => parse_alter(cur)?,
        "DROP" => parse_drop(cur)?,
        "RENAME" => parse_rename(cur)?,
        "TRUNCATE" => {
            cur.eat_keyword("TABLE");
            StatementKind::TruncateTable {
                table: cur.parse_table_name()?,
            }
        }
        "GRANT" => StatementKind::Account(AccountOp::Grant),
        "REVOKE" => StatementKind::Account(AccountOp::Revoke),
        "SET" if cur.is_keyword("PASSWORD") => StatementKind::Account(AccountOp::SetPassword),
        _ => StatementKind::Other { keyword },
    };
    Ok(kind)
}

fn rollback_to_savepoint(cur: &Cursor<'_>) -> bool {
    let mut n = 0;
    if cur.is_keyword_at(n, "WORK") {
        n += 1;
    }
    cur.is_keyword_at(n, "TO")
}

fn parse_maintenance(
    cur: &mut Cursor<'_>,
    op: MaintenanceOp,
) -> Result<StatementKind, ParseError> {
    cur.eat_any_keyword(&["NO_WRITE_TO_BINLOG", "LOCAL"]);
    let tables = if cur.eat_any_keyword(&["TABLE", "TABLES"]).is_some() {
        cur.parse_table_list()?
    } else {
        Vec::new()
    };
    Ok(StatementKind::TableMaintenance { op, tables })
}

/// Clauses that may sit between CREATE/ALTER and the object keyword.
#[derive(Default)]
struct ObjectPrefix {
    temporary: bool,
}

fn parse_object_prefix(cur: &mut Cursor<'_>) -> Result<ObjectPrefix, ParseError> {
    let mut prefix = ObjectPrefix::default();
    loop {
        if cur.eat_keywords(&["OR", "REPLACE"]) {
            continue;
        }
        if cur.eat_keyword("ALGORITHM") {
            cur.eat_token(&Token::Eq);
            cur.parse_ident()?;
            continue;
        }
        if cur.eat_keyword("DEFINER") {
            cur.eat_token(&Token::Eq);
            skip_user(cur)?;
            continue;
        }
        if cur.eat_keywords(&["SQL", "SECURITY"]) {
            cur.parse_ident()?;
            continue;
        }
        if cur.eat_keyword("TEMPORARY") {
            prefix.temporary = true;
            continue;
        }
        if cur
            .eat_any_keyword(&[
                "AGGREGATE",
                "UNDO",
                "UNIQUE",
                "FULLTEXT",
                "SPATIAL",
                "ONLINE",
                "OFFLINE",
                "IGNORE",
            ])
            .is_some()
        {
            continue;
        }
        return Ok(prefix);
    }
}

/// `user`, `'user'@'host'`, `` `user`@`host` ``, `user@host`,
/// `CURRENT_USER[()]`.
///
/// An unquoted `user@host` is a single word; an unquoted host after a
/// quoted user is a word starting with `@`.
fn skip_user(cur: &mut Cursor<'_>) -> Result<(), ParseError> {
    if cur.eat_keyword("CURRENT_USER") {
        if cur.eat_token(&Token::LParen) {
            cur.expect_token(&Token::RParen)?;
        }
        return Ok(());
    }
    skip_account_part(cur)?;
    if cur.eat_token(&Token::AtSign) {
        skip_account_part(cur)?;
    } else if matches!(cur.peek(), Some(Token::Word(w)) if w.quote_style.is_none() && w.value.starts_with('@'))
    {
        cur.next_token();
    }
    // unquoted IP hosts continue as numbers and dots
    while matches!(cur.peek(), Some(Token::Period | Token::Number(..))) {
        cur.next_token();
    }
    Ok(())
}

fn skip_account_part(cur: &mut Cursor<'_>) -> Result<(), ParseError> {
    match cur.peek() {
        Some(
            Token::Word(_)
            | Token::SingleQuotedString(_)
            | Token::DoubleQuotedString(_)
            | Token::Number(..),
        ) => {
            cur.next_token();
            Ok(())
        }
        _ => Err(cur.expected("user name")),
    }
}

fn parse_create(cur: &mut Cursor<'_>) -> Result<StatementKind, ParseError> {
    let prefix = parse_object_prefix(cur)?;
    let Some(object) = cur.next_keyword() else {
        return Ok(StatementKind::Other {
            keyword: "CREATE".to_string(),
        });
    };
    let kind = match object.to_uppercase().as_str() {
        "TABLE" => {
            cur.eat_keywords(&["IF", "NOT", "EXISTS"]);
            let table = cur.parse_table_name()?;
            let like = if cur.eat_keyword("LIKE") {
                Some(cur.parse_table_name()?)
            } else if cur.is_token(&Token::LParen) && cur.is_keyword_at(1, "LIKE") {
                cur.next_token();
                cur.next_token();
                let like = cur.parse_table_name()?;
                cur.expect_token(&Token::RParen)?;
                Some(like)
            } else {
                None
            };
            StatementKind::CreateTable {
                table,
                temporary: prefix.temporary,
                like,
            }
        }
        "DATABASE" | "SCHEMA" => {
            cur.eat_keywords(&["IF", "NOT", "EXISTS"]);
            StatementKind::CreateDatabase {
                name: cur.parse_ident()?,
            }
        }
        "INDEX" => StatementKind::CreateIndex {
            table: parse_index_table(cur)?,
        },
        "TRIGGER" => StatementKind::Trigger(ObjectAction::Create),
        "PROCEDURE" => StatementKind::Procedure(ObjectAction::Create),
        "VIEW" => StatementKind::View(ObjectAction::Create),
        "FUNCTION" => StatementKind::Function(ObjectAction::Create),
        "TABLESPACE" => StatementKind::Tablespace(ObjectAction::Create),
        "EVENT" => StatementKind::Event(ObjectAction::Create),
        "USER" => StatementKind::Account(AccountOp::CreateUser),
        "ROLE" => StatementKind::Account(AccountOp::CreateRole),
        other => StatementKind::Other {
            keyword: format!("CREATE {other}"),
        },
    };
    Ok(kind)
}

/// `index_name [USING type] ON tbl` for CREATE/DROP INDEX.
fn parse_index_table(cur: &mut Cursor<'_>) -> Result<TableName, ParseError> {
    cur.parse_ident()?;
    while !cur.at_end() && !cur.is_keyword("ON") {
        cur.next_token();
    }
    cur.expect_keyword("ON")?;
    cur.parse_table_name()
}

fn parse_alter(cur: &mut Cursor<'_>) -> Result<StatementKind, ParseError> {
    parse_object_prefix(cur)?;
    let Some(object) = cur.next_keyword() else {
        return Ok(StatementKind::Other {
            keyword: "ALTER".to_string(),
        });
    };
    let kind = match object.to_uppercase().as_str() {
        "TABLE" => {
            let table = cur.parse_table_name()?;
            let rename_to = find_alter_rename(cur)?;
            StatementKind::AlterTable { table, rename_to }
        }
        "DATABASE" | "SCHEMA" => {
            let named = match cur.peek() {
                Some(Token::Word(w)) => w.quote_style.is_some() || !is_database_option(&w.value),
                _ => false,
            };
            let name = if named { Some(cur.parse_ident()?) } else { None };
            StatementKind::AlterDatabase { name }
        }
        "PROCEDURE" => StatementKind::Procedure(ObjectAction::Alter),
        "VIEW" => StatementKind::View(ObjectAction::Alter),
        "FUNCTION" => StatementKind::Function(ObjectAction::Alter),
        "TABLESPACE" => StatementKind::Tablespace(ObjectAction::Alter),
        "EVENT" => StatementKind::Event(ObjectAction::Alter),
        "USER" => StatementKind::Account(AccountOp::AlterUser),
        other => StatementKind::Other {
            keyword: format!("ALTER {other}"),
        },
    };
    Ok(kind)
}

fn is_database_option(word: &str) -> bool {
    [
        "CHARACTER",
        "CHARSET",
        "DEFAULT",
        "COLLATE",
        "ENCRYPTION",
        "READ",
    ]
    .iter()
    .any(|kw| word.eq_ignore_ascii_case(kw))
}

/// Find a top-level `RENAME [TO|AS] new_name` among ALTER TABLE specs.
fn find_alter_rename(cur: &mut Cursor<'_>) -> Result<Option<TableName>, ParseError> {
    let mut rename_to = None;
    while let Some(token) = cur.peek() {
        match token {
            Token::LParen => cur.skip_parens()?,
            t if t.is_keyword("RENAME") => {
                cur.next_token();
                if cur.is_keyword("COLUMN") || cur.is_keyword("INDEX") || cur.is_keyword("KEY")
                {
                    continue;
                }
                cur.eat_any_keyword(&["TO", "AS"]);
                rename_to = Some(cur.parse_table_name()?);
            }
            _ => {
                cur.next_token();
            }
        }
    }
    Ok(rename_to)
}

fn parse_drop(cur: &mut Cursor<'_>) -> Result<StatementKind, ParseError> {
    let temporary = cur.eat_keyword("TEMPORARY");
    cur.eat_keyword("UNDO");
    let Some(object) = cur.next_keyword() else {
        return Ok(StatementKind::Other {
            keyword: "DROP".to_string(),
        });
    };
    let kind = match object.to_uppercase().as_str() {
        "TABLE" | "TABLES" => {
            cur.eat_keywords(&["IF", "EXISTS"]);
            StatementKind::DropTable {
                tables: cur.parse_table_list()?,
                temporary,
            }
        }
        "DATABASE" | "SCHEMA" => {
            cur.eat_keywords(&["IF", "EXISTS"]);
            StatementKind::DropDatabase {
                name: cur.parse_ident()?,
            }
        }
        "INDEX" => StatementKind::DropIndex {
            table: parse_index_table(cur)?,
        },
        "TRIGGER" => StatementKind::Trigger(ObjectAction::Drop),
        "PROCEDURE" => StatementKind::Procedure(ObjectAction::Drop),
        "VIEW" => StatementKind::View(ObjectAction::Drop),
        "FUNCTION" => StatementKind::Function(ObjectAction::Drop),
        "TABLESPACE" => StatementKind::Tablespace(ObjectAction::Drop),
        "EVENT" => StatementKind::Event(ObjectAction::Drop),
        "USER" => StatementKind::Account(AccountOp::DropUser),
        "ROLE" => StatementKind::Account(AccountOp::DropRole),
        other => StatementKind::Other {
            keyword: format!("DROP {other}"),
        },
    };
    Ok(kind)
}

fn parse_rename(cur: &mut Cursor<'_>) -> Result<StatementKind, ParseError> {
    if cur.eat_keyword("USER") {
        return Ok(StatementKind::Account(AccountOp::RenameUser));
    }
    if cur.eat_any_keyword(&["TABLE", "TABLES"]).is_none() {
        return Ok(StatementKind::Other {
            keyword: "RENAME".to_string(),
        });
    }
    let mut pairs = Vec::new();
    loop {
        let from = cur.parse_table_name()?;
        cur.expect_keyword("TO")?;
        let to = cur.parse_table_name()?;
        pairs.push((from, to));
        if !cur.eat_token(&Token::Comma) {
            break;
        }
    }
    Ok(StatementKind::RenameTable { pairs })
}
