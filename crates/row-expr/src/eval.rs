//! Evaluating bound predicates against decoded rows.

use crate::ops::{BinaryOp, UnaryOp};
use crate::binder::{BoundExpr, Func, Node};
use crate::datum::{compare, Datum, Number};
use crate::error::EvalError;
use filter_core::{ColumnType, RowValue};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde_json::Value as JsonValue;
use std::cmp::Ordering;

/// Whether a row event should be skipped: true iff `expr` evaluates to a
/// truthy value on `row`. NULL and false keep the row.
///
/// ```rust
/// use filter_core::{ColumnDefinition, ColumnType, RowValue, TableDefinition};
/// use row_expr::{bind, skip_dml_by_expression};
///
/// let table = TableDefinition::new(
///     "t",
///     vec![ColumnDefinition::new("state", ColumnType::TinyInt { unsigned: true })],
/// );
/// let expr = bind("state != 1", &table).unwrap();
/// assert!(skip_dml_by_expression(&[RowValue::Int8(3)], &expr).unwrap());
/// assert!(!skip_dml_by_expression(&[RowValue::Int8(1)], &expr).unwrap());
/// assert!(!skip_dml_by_expression(&[RowValue::Null], &expr).unwrap());
/// ```
pub fn skip_dml_by_expression(row: &[RowValue], expr: &BoundExpr) -> Result<bool, EvalError> {
    Ok(expr.evaluate(row)?.truth().unwrap_or(false))
}

impl Node {
    pub(crate) fn eval(&self, row: &[RowValue]) -> Result<Datum, EvalError> {
        match self {
            Node::Const(d) => Ok(d.clone()),
            Node::Column {
                index,
                name,
                column_type,
            } => {
                let value = row.get(*index).ok_or(EvalError::ColumnCount {
                    expected: index + 1,
                    actual: row.len(),
                })?;
                column_datum(value, name, column_type)
            }
            Node::Unary { op, expr } => unary(*op, expr.eval(row)?, self),
            Node::Binary { op, left, right } => match op {
                BinaryOp::And => {
                    let l = left.eval(row)?.truth();
                    if l == Some(false) {
                        return Ok(Datum::bool(false));
                    }
                    Ok(match (l, right.eval(row)?.truth()) {
                        (_, Some(false)) => Datum::bool(false),
                        (Some(true), Some(true)) => Datum::bool(true),
                        _ => Datum::Null,
                    })
                }
                BinaryOp::Or => {
                    let l = left.eval(row)?.truth();
                    if l == Some(true) {
                        return Ok(Datum::bool(true));
                    }
                    Ok(match (l, right.eval(row)?.truth()) {
                        (_, Some(true)) => Datum::bool(true),
                        (Some(false), Some(false)) => Datum::bool(false),
                        _ => Datum::Null,
                    })
                }
                BinaryOp::Xor => {
                    let (l, r) = (left.eval(row)?.truth(), right.eval(row)?.truth());
                    Ok(match (l, r) {
                        (Some(l), Some(r)) => Datum::bool(l ^ r),
                        _ => Datum::Null,
                    })
                }
                op if op.is_comparison() => Ok(comparison(*op, &left.eval(row)?, &right.eval(row)?)),
                op => arithmetic(*op, left.eval(row)?, right.eval(row)?, self),
            },
            Node::IsNull { expr, negated } => Ok(Datum::bool(expr.eval(row)?.is_null() != *negated)),
            Node::IsBool {
                expr,
                value,
                negated,
            } => {
                let matched = expr.eval(row)?.truth() == Some(*value);
                Ok(Datum::bool(matched != *negated))
            }
            Node::InList {
                expr,
                list,
                negated,
            } => {
                let needle = expr.eval(row)?;
                if needle.is_null() {
                    return Ok(Datum::Null);
                }
                let mut saw_null = false;
                for item in list {
                    let item = item.eval(row)?;
                    if item.is_null() {
                        saw_null = true;
                    } else if compare(&needle, &item) == Some(Ordering::Equal) {
                        return Ok(Datum::bool(!*negated));
                    }
                }
                Ok(if saw_null {
                    Datum::Null
                } else {
                    Datum::bool(*negated)
                })
            }
            Node::Between {
                expr,
                low,
                high,
                negated,
            } => {
                let value = expr.eval(row)?;
                let above = compare(&value, &low.eval(row)?).map(|o| o != Ordering::Less);
                let below = compare(&value, &high.eval(row)?).map(|o| o != Ordering::Greater);
                let inside = match (above, below) {
                    (Some(false), _) | (_, Some(false)) => Some(false),
                    (Some(true), Some(true)) => Some(true),
                    _ => None,
                };
                Ok(inside.map_or(Datum::Null, |b| Datum::bool(b != *negated)))
            }
            Node::Like {
                expr,
                pattern,
                negated,
            } => {
                let (value, pattern) = (expr.eval(row)?, pattern.eval(row)?);
                let (Some(text), Some(pat)) = (value.to_text(), pattern.to_text()) else {
                    return Ok(Datum::Null);
                };
                // byte-exact, like `=`
                Ok(Datum::bool(like_match(&text, &pat) != *negated))
            }
            Node::Call { func, args } => call(*func, args, row),
            Node::JsonExtract {
                expr,
                paths,
                unquote,
            } => {
                let doc = match expr.eval(row)? {
                    Datum::Null => return Ok(Datum::Null),
                    Datum::Json(v) => v,
                    Datum::Str(s) => parse_json(s.as_bytes())?,
                    Datum::Bytes(b) => parse_json(&b)?,
                    other => {
                        return Err(EvalError::InvalidJson(format!(
                            "{other} is not a JSON document"
                        )))
                    }
                };
                let mut found: Vec<JsonValue> = paths
                    .iter()
                    .filter_map(|p| p.extract(&doc).cloned())
                    .collect();
                let result = match (paths.len(), found.len()) {
                    (_, 0) => return Ok(Datum::Null),
                    (1, _) => found.remove(0),
                    _ => JsonValue::Array(found),
                };
                Ok(if *unquote {
                    json_unquote(Datum::Json(result))
                } else {
                    Datum::Json(result)
                })
            }
        }
    }
}

/// Convert a decoded column value into a datum, following the column's
/// declared type.
///
/// Unsigned columns reinterpret the decoder's signed value at the column's
/// width, enum ordinals become their label and set bitmasks become the
/// comma-separated member list.
pub fn column_datum(value: &RowValue, column: &str, column_type: &ColumnType) -> Result<Datum, EvalError> {
    let mismatch = || EvalError::TypeMismatch {
        column: column.to_string(),
        column_type: column_type.to_string(),
        found: value.kind(),
    };
    if value.is_null() {
        return Ok(Datum::Null);
    }

    let datum = match column_type {
        ColumnType::TinyInt { .. }
        | ColumnType::SmallInt { .. }
        | ColumnType::MediumInt { .. }
        | ColumnType::Int { .. }
        | ColumnType::BigInt { .. }
            if column_type.is_unsigned() =>
        {
            Datum::UInt(as_unsigned(value, column_type).ok_or_else(mismatch)?)
        }
        ColumnType::TinyInt { .. }
        | ColumnType::SmallInt { .. }
        | ColumnType::MediumInt { .. }
        | ColumnType::Int { .. }
        | ColumnType::BigInt { .. }
        | ColumnType::Year => match value {
            RowValue::UInt64(u) => Datum::UInt(*u),
            RowValue::String(s) if matches!(column_type, ColumnType::Year) => Datum::Str(s.clone()),
            other => Datum::Int(other.as_i64().ok_or_else(mismatch)?),
        },
        ColumnType::Bit { .. } => match value {
            RowValue::Bytes(bytes) => {
                Datum::UInt(bytes.iter().fold(0u64, |acc, b| (acc << 8) | u64::from(*b)))
            }
            other => Datum::UInt(as_unsigned(other, column_type).ok_or_else(mismatch)?),
        },
        ColumnType::Decimal { .. } => match value {
            RowValue::Decimal(d) => Datum::Decimal(*d),
            RowValue::String(s) => Datum::Decimal(s.trim().parse().map_err(|_| mismatch())?),
            RowValue::UInt64(u) => Datum::Decimal(Decimal::from(*u)),
            other => Datum::Decimal(Decimal::from(other.as_i64().ok_or_else(mismatch)?)),
        },
        ColumnType::Float | ColumnType::Double => match value {
            RowValue::Float32(f) => Datum::Float(f64::from(*f)),
            RowValue::Float64(f) => Datum::Float(*f),
            RowValue::Decimal(d) => Datum::Float(d.to_f64().ok_or_else(mismatch)?),
            RowValue::UInt64(u) => Datum::Float(*u as f64),
            other => Datum::Float(other.as_i64().ok_or_else(mismatch)? as f64),
        },
        ColumnType::Date | ColumnType::Time | ColumnType::DateTime | ColumnType::Timestamp => match value {
            RowValue::String(s) => Datum::Str(s.clone()),
            RowValue::Bytes(b) => match std::str::from_utf8(b) {
                Ok(s) => Datum::Str(s.to_string()),
                Err(_) => return Err(mismatch()),
            },
            RowValue::UInt64(u) => Datum::UInt(*u),
            RowValue::Decimal(d) => Datum::Decimal(*d),
            RowValue::Float32(_) | RowValue::Float64(_) => Datum::Float(value.as_f64().ok_or_else(mismatch)?),
            other => Datum::Int(other.as_i64().ok_or_else(mismatch)?),
        },
        ColumnType::Enum { values } => match value {
            RowValue::String(s) => Datum::Str(s.clone()),
            other => {
                let ordinal = as_u64(other).ok_or_else(mismatch)?;
                let label = usize::try_from(ordinal)
                    .ok()
                    .and_then(|n| n.checked_sub(1))
                    .and_then(|i| values.get(i));
                Datum::Str(label.cloned().unwrap_or_default())
            }
        },
        ColumnType::Set { values } => match value {
            RowValue::String(s) => Datum::Str(s.clone()),
            other => {
                let mask = as_u64(other).ok_or_else(mismatch)?;
                let members: Vec<&str> = values
                    .iter()
                    .enumerate()
                    .filter(|(i, _)| *i < 64 && mask & (1u64 << i) != 0)
                    .map(|(_, v)| v.as_str())
                    .collect();
                Datum::Str(members.join(","))
            }
        },
        ColumnType::Char { .. } | ColumnType::VarChar { .. } | ColumnType::Text => match value {
            RowValue::String(s) => Datum::Str(s.clone()),
            RowValue::Bytes(b) => Datum::Bytes(b.clone()),
            _ => return Err(mismatch()),
        },
        ColumnType::Binary { .. } | ColumnType::VarBinary { .. } | ColumnType::Blob | ColumnType::Geometry => {
            match value {
                RowValue::Bytes(b) => Datum::Bytes(b.clone()),
                RowValue::String(s) => Datum::Bytes(s.as_bytes().to_vec()),
                _ => return Err(mismatch()),
            }
        }
        ColumnType::Json => match value {
            RowValue::Bytes(b) => Datum::Json(parse_json(b).map_err(|e| in_column(e, column))?),
            RowValue::String(s) => Datum::Json(parse_json(s.as_bytes()).map_err(|e| in_column(e, column))?),
            _ => return Err(mismatch()),
        },
    };
    Ok(datum)
}

/// Reinterpret an integer at the column's storage width.
fn as_unsigned(value: &RowValue, column_type: &ColumnType) -> Option<u64> {
    Some(match value {
        RowValue::Int8(i) => u64::from(*i as u8),
        RowValue::Int16(i) => u64::from(*i as u16),
        RowValue::Int32(i) if matches!(column_type, ColumnType::MediumInt { .. }) => {
            u64::from(*i as u32 & 0x00FF_FFFF)
        }
        RowValue::Int32(i) => u64::from(*i as u32),
        RowValue::Int64(i) => *i as u64,
        RowValue::UInt64(u) => *u,
        _ => return None,
    })
}

fn as_u64(value: &RowValue) -> Option<u64> {
    match value {
        RowValue::UInt64(u) => Some(*u),
        other => other.as_i64().map(|i| i as u64),
    }
}

fn parse_json(bytes: &[u8]) -> Result<JsonValue, EvalError> {
    serde_json::from_slice(bytes).map_err(|e| EvalError::InvalidJson(e.to_string()))
}

fn in_column(err: EvalError, column: &str) -> EvalError {
    match err {
        EvalError::InvalidJson(msg) => EvalError::InvalidJson(format!("column {column}: {msg}")),
        other => other,
    }
}

fn comparison(op: BinaryOp, left: &Datum, right: &Datum) -> Datum {
    if op == BinaryOp::NullSafeEq {
        return Datum::bool(match (left.is_null(), right.is_null()) {
            (true, true) => true,
            (false, false) => compare(left, right) == Some(Ordering::Equal),
            _ => false,
        });
    }
    let Some(ord) = compare(left, right) else {
        return Datum::Null;
    };
    Datum::bool(match op {
        BinaryOp::Eq => ord == Ordering::Equal,
        BinaryOp::NotEq => ord != Ordering::Equal,
        BinaryOp::Lt => ord == Ordering::Less,
        BinaryOp::LtEq => ord != Ordering::Greater,
        BinaryOp::Gt => ord == Ordering::Greater,
        BinaryOp::GtEq => ord != Ordering::Less,
        _ => false,
    })
}

fn is_zero(n: Number) -> bool {
    match n {
        Number::Int(i) => i == 0,
        Number::UInt(u) => u == 0,
        Number::Decimal(d) => d.is_zero(),
        Number::Float(f) => f == 0.0,
    }
}

fn fit_integer(v: i128, node: &Node) -> Result<Datum, EvalError> {
    if let Ok(i) = i64::try_from(v) {
        Ok(Datum::Int(i))
    } else if let Ok(u) = u64::try_from(v) {
        Ok(Datum::UInt(u))
    } else {
        Err(EvalError::Overflow(node.to_string()))
    }
}

fn to_bits(n: Number) -> u64 {
    match n {
        Number::Int(i) => i as u64,
        Number::UInt(u) => u,
        Number::Decimal(d) => d.round().to_i128().map_or(u64::MAX, |i| i as u64),
        Number::Float(f) => f.round() as i128 as u64,
    }
}

fn arithmetic(op: BinaryOp, left: Datum, right: Datum, node: &Node) -> Result<Datum, EvalError> {
    let (Some(x), Some(y)) = (left.to_number(), right.to_number()) else {
        return Ok(Datum::Null);
    };
    let overflow = || EvalError::Overflow(node.to_string());

    match op {
        BinaryOp::BitAnd => return Ok(Datum::UInt(to_bits(x) & to_bits(y))),
        BinaryOp::BitOr => return Ok(Datum::UInt(to_bits(x) | to_bits(y))),
        BinaryOp::Div | BinaryOp::IntDiv | BinaryOp::Mod if is_zero(y) => return Ok(Datum::Null),
        _ => {}
    }

    if x.is_float() || y.is_float() {
        let (a, b) = (x.to_f64(), y.to_f64());
        let result = match op {
            BinaryOp::Add => a + b,
            BinaryOp::Sub => a - b,
            BinaryOp::Mul => a * b,
            BinaryOp::Div => a / b,
            BinaryOp::Mod => a % b,
            BinaryOp::IntDiv => {
                let q = (a / b).trunc();
                if !q.is_finite() {
                    return Err(overflow());
                }
                return fit_integer(q as i128, node);
            }
            _ => return Err(overflow()),
        };
        if !result.is_finite() {
            return Err(overflow());
        }
        return Ok(Datum::Float(result));
    }

    if x.is_decimal() || y.is_decimal() || op == BinaryOp::Div {
        let (a, b) = (x.to_decimal().ok_or_else(overflow)?, y.to_decimal().ok_or_else(overflow)?);
        let result = match op {
            BinaryOp::Add => a.checked_add(b),
            BinaryOp::Sub => a.checked_sub(b),
            BinaryOp::Mul => a.checked_mul(b),
            BinaryOp::Div => a.checked_div(b),
            BinaryOp::Mod => a.checked_rem(b),
            BinaryOp::IntDiv => {
                let q = a.checked_div(b).ok_or_else(overflow)?.trunc();
                return fit_integer(q.to_i128().ok_or_else(overflow)?, node);
            }
            _ => None,
        };
        return result.map(Datum::Decimal).ok_or_else(overflow);
    }

    let (a, b) = (x.to_i128().ok_or_else(overflow)?, y.to_i128().ok_or_else(overflow)?);
    let result = match op {
        BinaryOp::Add => a.checked_add(b),
        BinaryOp::Sub => a.checked_sub(b),
        BinaryOp::Mul => a.checked_mul(b),
        BinaryOp::IntDiv => a.checked_div(b),
        BinaryOp::Mod => a.checked_rem(b),
        _ => None,
    };
    fit_integer(result.ok_or_else(overflow)?, node)
}

fn unary(op: UnaryOp, value: Datum, node: &Node) -> Result<Datum, EvalError> {
    if op == UnaryOp::Not {
        return Ok(value.truth().map_or(Datum::Null, |b| Datum::bool(!b)));
    }
    let Some(n) = value.to_number() else {
        return Ok(Datum::Null);
    };
    Ok(match op {
        UnaryOp::BitNot => Datum::UInt(!to_bits(n)),
        _ => match n {
            Number::Int(i) => match i.checked_neg() {
                Some(v) => Datum::Int(v),
                None => Datum::Decimal(-Decimal::from(i)),
            },
            Number::UInt(u) => fit_integer(-(u as i128), node)?,
            Number::Decimal(d) => Datum::Decimal(-d),
            Number::Float(f) => Datum::Float(-f),
        },
    })
}

fn json_unquote(value: Datum) -> Datum {
    match value {
        Datum::Json(JsonValue::String(s)) => Datum::Str(s),
        Datum::Json(JsonValue::Null) => Datum::Str("null".to_string()),
        Datum::Json(other) => Datum::Str(other.to_string()),
        Datum::Str(s) if s.len() >= 2 && s.starts_with('"') && s.ends_with('"') => {
            match serde_json::from_str::<String>(&s) {
                Ok(unquoted) => Datum::Str(unquoted),
                Err(_) => Datum::Str(s),
            }
        }
        other => other.to_text().map_or(Datum::Null, Datum::Str),
    }
}

fn call(func: Func, args: &[Node], row: &[RowValue]) -> Result<Datum, EvalError> {
    // IFNULL and COALESCE evaluate lazily
    match func {
        Func::IfNull | Func::Coalesce => {
            for arg in args {
                let value = arg.eval(row)?;
                if !value.is_null() {
                    return Ok(value);
                }
            }
            return Ok(Datum::Null);
        }
        Func::IsNull => return Ok(Datum::bool(eval_arg(args, 0, row)?.is_null())),
        _ => {}
    }

    let values = args.iter().map(|a| a.eval(row)).collect::<Result<Vec<_>, _>>()?;
    if func != Func::JsonUnquote && values.iter().any(Datum::is_null) {
        return Ok(Datum::Null);
    }
    let first = values.first().cloned().unwrap_or(Datum::Null);

    Ok(match func {
        Func::FindInSet => {
            let needle = first.to_text().unwrap_or_default();
            let list = values.get(1).and_then(Datum::to_text).unwrap_or_default();
            if needle.contains(',') || list.is_empty() {
                return Ok(Datum::Int(0));
            }
            let position = list
                .split(',')
                .position(|item| item == needle)
                .map_or(0, |i| i as i64 + 1);
            Datum::Int(position)
        }
        Func::JsonUnquote => json_unquote(first),
        Func::Length => Datum::Int(match &first {
            Datum::Bytes(b) => b.len(),
            other => other.to_text().unwrap_or_default().len(),
        } as i64),
        Func::CharLength => Datum::Int(match &first {
            Datum::Bytes(b) => b.len(),
            other => other.to_text().unwrap_or_default().chars().count(),
        } as i64),
        Func::Lower | Func::Upper => match first {
            Datum::Bytes(b) => Datum::Bytes(b),
            other => {
                let text = other.to_text().unwrap_or_default();
                Datum::Str(if func == Func::Lower {
                    text.to_lowercase()
                } else {
                    text.to_uppercase()
                })
            }
        },
        Func::Concat => {
            if values.iter().any(|v| matches!(v, Datum::Bytes(_))) {
                let mut out = Vec::new();
                for v in &values {
                    match v {
                        Datum::Bytes(b) => out.extend_from_slice(b),
                        other => out.extend_from_slice(other.to_text().unwrap_or_default().as_bytes()),
                    }
                }
                Datum::Bytes(out)
            } else {
                Datum::Str(values.iter().filter_map(Datum::to_text).collect())
            }
        }
        Func::Abs => match first.to_number() {
            Some(Number::Int(i)) => match i.checked_abs() {
                Some(v) => Datum::Int(v),
                None => Datum::UInt(i.unsigned_abs()),
            },
            Some(Number::UInt(u)) => Datum::UInt(u),
            Some(Number::Decimal(d)) => Datum::Decimal(d.abs()),
            Some(Number::Float(f)) => Datum::Float(f.abs()),
            None => Datum::Null,
        },
        Func::IfNull | Func::Coalesce | Func::IsNull => unreachable!("evaluated lazily above"),
    })
}

fn eval_arg(args: &[Node], index: usize, row: &[RowValue]) -> Result<Datum, EvalError> {
    args.get(index).map_or(Ok(Datum::Null), |a| a.eval(row))
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum LikeToken {
    Any,
    One,
    Char(char),
}

/// SQL LIKE with `%`, `_` and backslash escapes.
fn like_match(text: &str, pattern: &str) -> bool {
    let mut tokens = Vec::new();
    let mut chars = pattern.chars();
    while let Some(c) = chars.next() {
        let token = match c {
            '%' => LikeToken::Any,
            '_' => LikeToken::One,
            '\\' => LikeToken::Char(chars.next().unwrap_or('\\')),
            c => LikeToken::Char(c),
        };
        if !(token == LikeToken::Any && tokens.last() == Some(&LikeToken::Any)) {
            tokens.push(token);
        }
    }

    let text: Vec<char> = text.chars().collect();
    let (mut t, mut p) = (0, 0);
    let mut backtrack: Option<(usize, usize)> = None;
    while t < text.len() {
        match tokens.get(p) {
            Some(LikeToken::One) => {
                t += 1;
                p += 1;
            }
            Some(LikeToken::Char(c)) if *c == text[t] => {
                t += 1;
                p += 1;
            }
            Some(LikeToken::Any) => {
                backtrack = Some((p + 1, t));
                p += 1;
            }
            _ => match backtrack {
                Some((bp, bt)) => {
                    p = bp;
                    t = bt + 1;
                    backtrack = Some((bp, bt + 1));
                }
                None => return false,
            },
        }
    }
    tokens[p..].iter().all(|t| *t == LikeToken::Any)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binder::bind;
    use filter_core::{ColumnDefinition, TableDefinition};
    use std::str::FromStr;

    fn table(columns: &[(&str, ColumnType)]) -> TableDefinition {
        TableDefinition::new(
            "t",
            columns
                .iter()
                .map(|(n, ty)| ColumnDefinition::new(*n, ty.clone()))
                .collect(),
        )
    }

    fn eval(predicate: &str, table: &TableDefinition, row: Vec<RowValue>) -> Datum {
        bind(predicate, table).unwrap().evaluate(&row).unwrap()
    }

    fn int_table() -> TableDefinition {
        table(&[
            ("a", ColumnType::Int { unsigned: false }),
            ("b", ColumnType::Int { unsigned: false }),
        ])
    }

    #[test]
    fn test_three_valued_logic() {
        let t = int_table();
        let row = || vec![RowValue::Int32(1), RowValue::Null];
        assert_eq!(eval("a = 1 AND b = 1", &t, row()), Datum::Null);
        assert_eq!(eval("a = 2 AND b = 1", &t, row()), Datum::Int(0));
        assert_eq!(eval("a = 1 OR b = 1", &t, row()), Datum::Int(1));
        assert_eq!(eval("a = 2 OR b = 1", &t, row()), Datum::Null);
        assert_eq!(eval("NOT b = 1", &t, row()), Datum::Null);
        assert_eq!(eval("a XOR 0", &t, row()), Datum::Int(1));
        assert_eq!(eval("b <=> NULL", &t, row()), Datum::Int(1));
        assert_eq!(eval("a <=> NULL", &t, row()), Datum::Int(0));
        assert_eq!(eval("b IS NOT TRUE", &t, row()), Datum::Int(1));
        assert_eq!(eval("b IN (1, 2)", &t, row()), Datum::Null);
        assert_eq!(eval("a IN (2, NULL)", &t, row()), Datum::Null);
        assert_eq!(eval("a NOT IN (2, 3)", &t, row()), Datum::Int(1));
        assert_eq!(eval("a BETWEEN 0 AND b", &t, row()), Datum::Null);
        assert_eq!(eval("a BETWEEN 2 AND b", &t, row()), Datum::Int(0));
    }

    #[test]
    fn test_arithmetic() {
        let t = int_table();
        let row = || vec![RowValue::Int32(7), RowValue::Int32(2)];
        assert_eq!(eval("a + b", &t, row()), Datum::Int(9));
        assert_eq!(eval("a / b", &t, row()), Datum::Decimal(Decimal::from_str("3.5").unwrap()));
        assert_eq!(eval("a DIV b", &t, row()), Datum::Int(3));
        assert_eq!(eval("a % b", &t, row()), Datum::Int(1));
        assert_eq!(eval("a / 0", &t, row()), Datum::Null);
        assert_eq!(eval("a & 3", &t, row()), Datum::UInt(3));
        assert_eq!(eval("-a", &t, row()), Datum::Int(-7));
        assert_eq!(eval("a * 1.5", &t, row()), Datum::Decimal(Decimal::from_str("10.5").unwrap()));

        let err = bind("a + 18446744073709551615 * 2", &t)
            .unwrap()
            .evaluate(&row())
            .unwrap_err();
        assert!(matches!(err, EvalError::Overflow(_)));
    }

    #[test]
    fn test_unsigned_reinterpretation() {
        let t = table(&[
            ("a", ColumnType::TinyInt { unsigned: true }),
            ("b", ColumnType::MediumInt { unsigned: true }),
            ("c", ColumnType::BigInt { unsigned: true }),
        ]);
        let row = vec![RowValue::Int8(-1), RowValue::Int32(-1), RowValue::Int64(-1)];
        assert_eq!(eval("a = 255", &t, row.clone()), Datum::Int(1));
        assert_eq!(eval("b = 16777215", &t, row.clone()), Datum::Int(1));
        assert_eq!(eval("c = 18446744073709551615", &t, row), Datum::Int(1));
    }

    #[test]
    fn test_enum_and_set() {
        let t = table(&[
            (
                "e",
                ColumnType::Enum {
                    values: vec!["a".to_string(), "b".to_string()],
                },
            ),
            (
                "s",
                ColumnType::Set {
                    values: vec!["x".to_string(), "y".to_string(), "z".to_string()],
                },
            ),
        ]);
        let row = || vec![RowValue::Int64(2), RowValue::Int64(0b101)];
        assert_eq!(eval("e = 'b'", &t, row()), Datum::Int(1));
        assert_eq!(eval("s = 'x,z'", &t, row()), Datum::Int(1));
        assert_eq!(eval("find_in_set('z', s)", &t, row()), Datum::Int(2));
        assert_eq!(eval("find_in_set('y', s)", &t, row()), Datum::Int(0));
        assert_eq!(
            eval("e = ''", &t, vec![RowValue::Int64(9), RowValue::Int64(0)]),
            Datum::Int(1)
        );
    }

    #[test]
    fn test_json() {
        let t = table(&[("j", ColumnType::Json)]);
        let row = || vec![RowValue::Bytes(br#"{"id": 1, "name": "Bob", "tags": ["a"]}"#.to_vec())];
        assert_eq!(eval("j->'$.id' = 1", &t, row()), Datum::Int(1));
        assert_eq!(eval("j->>'$.name' = 'Bob'", &t, row()), Datum::Int(1));
        assert_eq!(eval("json_extract(j, '$.tags[0]') = 'a'", &t, row()), Datum::Int(1));
        assert_eq!(eval("j->'$.missing' IS NULL", &t, row()), Datum::Int(1));
        assert_eq!(eval("json_unquote(j->'$.name')", &t, row()), Datum::Str("Bob".to_string()));

        let err = bind("j->'$.id' = 1", &t)
            .unwrap()
            .evaluate(&[RowValue::Bytes(b"{oops".to_vec())])
            .unwrap_err();
        assert!(matches!(err, EvalError::InvalidJson(_)));
    }

    #[test]
    fn test_like_and_strings() {
        let t = table(&[("s", ColumnType::VarChar { length: 20 })]);
        let row = || vec![RowValue::String("Hello_World".to_string())];
        assert_eq!(eval("s LIKE 'hello%'", &t, row()), Datum::Int(0));
        assert_eq!(eval("s LIKE 'Hello%'", &t, row()), Datum::Int(1));
        assert_eq!(eval("s LIKE 'H_llo\\_W%d'", &t, row()), Datum::Int(1));
        assert_eq!(eval("s LIKE '%x%'", &t, row()), Datum::Int(0));
        assert_eq!(eval("s NOT LIKE '%World'", &t, row()), Datum::Int(0));
        assert_eq!(eval("length(s)", &t, row()), Datum::Int(11));
        assert_eq!(eval("upper(s) = 'HELLO_WORLD'", &t, row()), Datum::Int(1));
        assert_eq!(eval("concat(s, '!', 1)", &t, row()), Datum::Str("Hello_World!1".to_string()));
        assert_eq!(eval("ifnull(NULL, s)", &t, row()), Datum::Str("Hello_World".to_string()));
        assert_eq!(eval("coalesce(NULL, NULL)", &t, row()), Datum::Null);
        assert_eq!(eval("isnull(s)", &t, row()), Datum::Int(0));
    }

    #[test]
    fn test_like_agrees_with_equality_on_case() {
        let t = table(&[("s", ColumnType::VarChar { length: 20 })]);
        for value in ["A", "a"] {
            let row = || vec![RowValue::String(value.to_string())];
            assert_eq!(
                eval("s = 'a'", &t, row()),
                eval("s LIKE 'a'", &t, row()),
                "{value}"
            );
            assert_eq!(
                eval("s != 'a'", &t, row()),
                eval("s NOT LIKE 'a'", &t, row()),
                "{value}"
            );
        }
        let row = || vec![RowValue::String("A".to_string())];
        assert_eq!(eval("s LIKE 'a'", &t, row()), Datum::Int(0));
        assert_eq!(eval("find_in_set('a', 'A,b')", &t, row()), Datum::Int(0));
        assert_eq!(eval("find_in_set('b', 'A,b')", &t, row()), Datum::Int(2));
    }

    #[test]
    fn test_like_matcher() {
        assert!(like_match("abc", "a%"));
        assert!(like_match("abc", "%%c"));
        assert!(like_match("abc", "a_c"));
        assert!(like_match("a%c", "a\\%c"));
        assert!(!like_match("abc", "a\\%c"));
        assert!(like_match("", "%"));
        assert!(!like_match("", "_"));
        assert!(like_match("aXbXc", "a%b%c"));
    }

    #[test]
    fn test_errors() {
        let t = table(&[("s", ColumnType::VarChar { length: 20 })]);
        let expr = bind("s = 'a'", &t).unwrap();
        assert_eq!(
            expr.evaluate(&[]).unwrap_err(),
            EvalError::ColumnCount {
                expected: 1,
                actual: 0
            }
        );
        assert!(matches!(
            expr.evaluate(&[RowValue::Int32(1)]).unwrap_err(),
            EvalError::TypeMismatch { found: "int32", .. }
        ));
    }

    #[test]
    fn test_skip_decision() {
        let t = int_table();
        let expr = bind("a > b", &t).unwrap();
        assert!(skip_dml_by_expression(&[RowValue::Int32(2), RowValue::Int32(1)], &expr).unwrap());
        assert!(!skip_dml_by_expression(&[RowValue::Int32(1), RowValue::Int32(2)], &expr).unwrap());
        assert!(!skip_dml_by_expression(&[RowValue::Int32(1), RowValue::Null], &expr).unwrap());
    }
}
