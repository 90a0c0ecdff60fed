//! Token cursor shared by the statement parser and the column-type helpers.

use crate::error::ParseError;
use crate::lexer::{Spanned, TokenExt};
use crate::statement::TableName;
use sqlparser::tokenizer::{Location, Token};

/// A forward-only cursor over a token slice.
#[derive(Debug, Clone)]
pub struct Cursor<'a> {
    tokens: &'a [Spanned],
    pos: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(tokens: &'a [Spanned]) -> Self {
        Self { tokens, pos: 0 }
    }

    pub fn peek(&self) -> Option<&'a Token> {
        self.peek_nth(0)
    }

    pub fn peek_nth(&self, n: usize) -> Option<&'a Token> {
        self.tokens.get(self.pos + n).map(|s| &s.token)
    }

    pub fn next_token(&mut self) -> Option<&'a Token> {
        let token = self.tokens.get(self.pos).map(|s| &s.token);
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    pub fn at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    /// Where the current token starts; the last token's position at end of
    /// input.
    pub fn location(&self) -> Location {
        self.tokens
            .get(self.pos)
            .or_else(|| self.tokens.last())
            .map(|s| s.location)
            .unwrap_or(Location { line: 0, column: 0 })
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn is_keyword(&self, kw: &str) -> bool {
        self.peek().is_some_and(|t| t.is_keyword(kw))
    }

    pub fn is_keyword_at(&self, n: usize, kw: &str) -> bool {
        self.peek_nth(n).is_some_and(|t| t.is_keyword(kw))
    }

    pub fn is_token(&self, token: &Token) -> bool {
        self.peek() == Some(token)
    }

    /// Consume the keyword if it is next.
    pub fn eat_keyword(&mut self, kw: &str) -> bool {
        if self.is_keyword(kw) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    /// Consume a whole keyword sequence, or nothing.
    pub fn eat_keywords(&mut self, kws: &[&str]) -> bool {
        let all = kws.iter().enumerate().all(|(i, kw)| self.is_keyword_at(i, kw));
        if all {
            self.pos += kws.len();
        }
        all
    }

    /// Consume the first keyword of `kws` that is next, returning it.
    pub fn eat_any_keyword(&mut self, kws: &[&'static str]) -> Option<&'static str> {
        let found = kws.iter().copied().find(|kw| self.is_keyword(kw))?;
        self.pos += 1;
        Some(found)
    }

    /// Consume the next token if it is an unquoted word, returning its text.
    pub fn next_keyword(&mut self) -> Option<&'a str> {
        match self.peek() {
            Some(Token::Word(w)) if w.quote_style.is_none() => {
                self.pos += 1;
                Some(w.value.as_str())
            }
            _ => None,
        }
    }

    pub fn eat_token(&mut self, token: &Token) -> bool {
        if self.is_token(token) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    pub fn expect_token(&mut self, token: &Token) -> Result<(), ParseError> {
        if self.eat_token(token) {
            Ok(())
        } else {
            Err(self.expected(format!("'{token}'")))
        }
    }

    pub fn expect_keyword(&mut self, kw: &str) -> Result<(), ParseError> {
        if self.eat_keyword(kw) {
            Ok(())
        } else {
            Err(self.expected(kw.to_uppercase()))
        }
    }

    /// Build an "expected X, found Y" error at the current token.
    pub fn expected(&self, expected: impl Into<String>) -> ParseError {
        let location = self.location();
        ParseError::Expected {
            expected: expected.into(),
            found: self
                .peek()
                .map(|t| format!("'{t}'"))
                .unwrap_or_else(|| "end of statement".to_string()),
            line: location.line,
            column: location.column,
        }
    }

    /// An identifier: unquoted word or backtick-quoted name.
    pub fn parse_ident(&mut self) -> Result<String, ParseError> {
        match self.peek().and_then(TokenExt::as_ident) {
            Some(name) => {
                self.pos += 1;
                Ok(name.to_string())
            }
            None => Err(self.expected("identifier")),
        }
    }

    /// `name` or `schema.name`.
    pub fn parse_table_name(&mut self) -> Result<TableName, ParseError> {
        let first = self.parse_ident()?;
        if self.eat_token(&Token::Period) {
            let name = self.parse_ident()?;
            Ok(TableName::qualified(first, name))
        } else {
            Ok(TableName::unqualified(first))
        }
    }

    /// Comma-separated table names.
    pub fn parse_table_list(&mut self) -> Result<Vec<TableName>, ParseError> {
        let mut tables = vec![self.parse_table_name()?];
        while self.eat_token(&Token::Comma) {
            tables.push(self.parse_table_name()?);
        }
        Ok(tables)
    }

    /// Skip a parenthesised group; the cursor must be on `(`.
    pub fn skip_parens(&mut self) -> Result<(), ParseError> {
        self.expect_token(&Token::LParen)?;
        let mut depth = 1usize;
        while let Some(token) = self.next_token() {
            match token {
                Token::LParen => depth += 1,
                Token::RParen => {
                    depth -= 1;
                    if depth == 0 {
                        return Ok(());
                    }
                }
                _ => {}
            }
        }
        Err(self.expected("')'"))
    }
}
