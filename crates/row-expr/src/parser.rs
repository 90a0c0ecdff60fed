//! Predicate parser.
//!
//! Predicates are tokenized with the MySQL dialect of `sqlparser` and parsed
//! into its expression tree. A few MySQL spellings are rewritten at the
//! token level first:
//!
//! ```text
//! ||  OR          b'101', 0b101   bit literal, folded to a number
//! &&  AND         a MOD b         a % b
//! !   NOT
//! ```
//!
//! `DIV` is parsed by `PredicateDialect` at the precedence of `*`.

use crate::error::BindError;
use sqlparser::ast::{BinaryOperator, Expr};
use sqlparser::dialect::{Dialect, MySqlDialect, Precedence};
use sqlparser::keywords::Keyword;
use sqlparser::parser::{Parser, ParserError};
use sqlparser::tokenizer::{Token, Tokenizer, Word};
use std::iter::Peekable;

/// MySQL expressions with `DIV` bound as tightly as `*`.
#[derive(Debug)]
struct PredicateDialect(MySqlDialect);

impl Dialect for PredicateDialect {
    fn is_identifier_start(&self, ch: char) -> bool {
        self.0.is_identifier_start(ch)
    }

    fn is_identifier_part(&self, ch: char) -> bool {
        self.0.is_identifier_part(ch)
    }

    fn is_delimited_identifier_start(&self, ch: char) -> bool {
        self.0.is_delimited_identifier_start(ch)
    }

    fn get_next_precedence(&self, parser: &Parser) -> Option<Result<u8, ParserError>> {
        is_div(&parser.peek_token().token).then(|| Ok(self.prec_value(Precedence::MulDivModOp)))
    }

    fn parse_infix(
        &self,
        parser: &mut Parser,
        expr: &Expr,
        _precedence: u8,
    ) -> Option<Result<Expr, ParserError>> {
        if !parser.parse_keyword(Keyword::DIV) {
            return None;
        }
        let right = parser.parse_subexpr(self.prec_value(Precedence::MulDivModOp));
        Some(right.map(|right| Expr::BinaryOp {
            left: Box::new(expr.clone()),
            op: BinaryOperator::MyIntegerDivide,
            right: Box::new(right),
        }))
    }
}

fn is_div(token: &Token) -> bool {
    matches!(token, Token::Word(w) if w.keyword == Keyword::DIV && w.quote_style.is_none())
}

/// Parse a predicate.
///
/// ```rust
/// use row_expr::parse_predicate;
/// use sqlparser::ast::{BinaryOperator, Expr};
///
/// let expr = parse_predicate("state != 1 AND name LIKE 'a%'").unwrap();
/// assert!(matches!(expr, Expr::BinaryOp { op: BinaryOperator::And, .. }));
/// assert!(parse_predicate("state !=").is_err());
/// ```
pub fn parse_predicate(text: &str) -> Result<Expr, BindError> {
    let dialect = PredicateDialect(MySqlDialect {});
    let tokens = Tokenizer::new(&MySqlDialect {}, text)
        .tokenize()
        .map_err(|e| BindError::Parse(e.to_string()))?;
    let mut parser = Parser::new(&dialect).with_tokens(fold_mysql_tokens(tokens)?);
    let expr = parser
        .parse_expr()
        .map_err(|e| BindError::Parse(e.to_string()))?;

    let rest = parser.peek_token();
    if rest.token != Token::EOF {
        return Err(BindError::Parse(format!(
            "Expected end of expression, found: {}{}",
            rest.token, rest.span.start
        )));
    }
    Ok(expr)
}

/// Rewrite the MySQL operator spellings the expression parser does not
/// know into ones it does.
fn fold_mysql_tokens(tokens: Vec<Token>) -> Result<Vec<Token>, BindError> {
    let mut folded = Vec::with_capacity(tokens.len());
    let mut tokens = tokens.into_iter().peekable();
    while let Some(token) = tokens.next() {
        let token = match token {
            Token::StringConcat => Token::make_keyword("OR"),
            Token::Overlap => Token::make_keyword("AND"),
            Token::ExclamationMark => Token::make_keyword("NOT"),
            Token::SingleQuotedByteStringLiteral(bits) => bit_literal(&bits)?,
            Token::Word(w) if w.quote_style.is_none() => fold_word(w, &mut tokens)?,
            // `0b101` may arrive as `0` followed by `b101`
            Token::Number(n, false) if n == "0" => match tokens.next_if(is_binary_word) {
                Some(Token::Word(w)) => bit_literal(&w.value[1..])?,
                _ => Token::Number(n, false),
            },
            other => other,
        };
        folded.push(token);
    }
    Ok(folded)
}

fn fold_word(
    w: Word,
    tokens: &mut Peekable<impl Iterator<Item = Token>>,
) -> Result<Token, BindError> {
    let upper = w.value.to_ascii_uppercase();
    if upper == "B" {
        if let Some(Token::SingleQuotedString(bits)) =
            tokens.next_if(|t| matches!(t, Token::SingleQuotedString(_)))
        {
            return bit_literal(&bits);
        }
    }
    if upper == "MOD" && tokens.peek() != Some(&Token::LParen) {
        return Ok(Token::Mod);
    }
    match upper.strip_prefix("0B") {
        Some(digits) if is_binary(digits) => bit_literal(digits),
        _ => Ok(Token::Word(w)),
    }
}

fn is_binary(digits: &str) -> bool {
    !digits.is_empty() && digits.bytes().all(|b| b == b'0' || b == b'1')
}

fn is_binary_word(token: &Token) -> bool {
    matches!(token, Token::Word(w) if w.quote_style.is_none()
        && w.value.starts_with(['b', 'B'])
        && is_binary(&w.value[1..]))
}

/// A bit-value literal as the unsigned number it denotes; `b''` is 0.
fn bit_literal(bits: &str) -> Result<Token, BindError> {
    let invalid = || BindError::InvalidNumber(format!("b'{bits}'"));
    if !bits.bytes().all(|b| b == b'0' || b == b'1') {
        return Err(invalid());
    }
    let significant = bits.trim_start_matches('0');
    let value = if significant.is_empty() {
        0
    } else {
        u64::from_str_radix(significant, 2).map_err(|_| invalid())?
    };
    Ok(Token::Number(value.to_string(), false))
}
