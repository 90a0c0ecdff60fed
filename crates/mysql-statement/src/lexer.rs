//! MySQL token stream.
//!
//! Tokens come from the `sqlparser` tokenizer with the MySQL dialect.
//! Whitespace and comments never reach the stream, except that the body of
//! a version-gated comment (`/*!40005 TEMPORARY */`) is tokenized as
//! ordinary code, which is what the server does for any version it
//! supports.
//!
//! Backtick-quoted identifiers keep their quote style so that a table
//! called `` `view` `` can never be mistaken for the VIEW keyword.

use crate::error::ParseError;
use sqlparser::dialect::MySqlDialect;
use sqlparser::tokenizer::{Location, Token, Tokenizer, Whitespace, Word};

/// A token and the line/column it starts at.
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned {
    pub token: Token,
    pub location: Location,
}

/// Keyword and identifier views of a token.
pub trait TokenExt {
    /// Whether this is the unquoted keyword `kw` (case-insensitive).
    fn is_keyword(&self, kw: &str) -> bool;

    /// The name this token spells when used as an identifier: an unquoted
    /// word or a backtick-quoted name.
    fn as_ident(&self) -> Option<&str>;
}

impl TokenExt for Token {
    fn is_keyword(&self, kw: &str) -> bool {
        matches!(self, Token::Word(Word { value, quote_style: None, .. }) if value.eq_ignore_ascii_case(kw))
    }

    fn as_ident(&self) -> Option<&str> {
        match self {
            Token::Word(Word {
                value,
                quote_style: None | Some('`'),
                ..
            }) => Some(value),
            _ => None,
        }
    }
}

/// Split `sql` into tokens, dropping whitespace and comments.
pub fn tokenize(sql: &str) -> Result<Vec<Spanned>, ParseError> {
    let dialect = MySqlDialect {};
    let raw = Tokenizer::new(&dialect, sql)
        .tokenize_with_location()
        .map_err(|e| ParseError::Tokenize(e.to_string()))?;

    let mut tokens = Vec::with_capacity(raw.len());
    for spanned in raw {
        let location = spanned.span.start;
        match spanned.token {
            Token::Whitespace(Whitespace::MultiLineComment(body)) => {
                if let Some(code) = version_comment_code(&body) {
                    // inner positions are relative to the comment
                    tokens.extend(
                        tokenize(code)?
                            .into_iter()
                            .map(|inner| Spanned { token: inner.token, location }),
                    );
                }
            }
            Token::Whitespace(_) | Token::EOF => {}
            token => tokens.push(Spanned { token, location }),
        }
    }
    Ok(tokens)
}

/// The code inside `/*!NNNNN code */` or `/*M!NNNNN code */`, given the
/// comment body between the delimiters.
fn version_comment_code(body: &str) -> Option<&str> {
    let rest = body.strip_prefix('!').or_else(|| body.strip_prefix("M!"))?;
    Some(rest.trim_start_matches(|c: char| c.is_ascii_digit()))
}
