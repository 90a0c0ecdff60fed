//! Binding predicates to a table definition.
//!
//! Column references resolve to positions in row decode order. A predicate
//! naming a column the table does not have binds to the constant `0`, so it
//! never skips a row until it is rebound against a schema that has the
//! column.

use crate::datum::Datum;
use crate::error::{BindError, EvalError};
use crate::json_path::JsonPath;
use crate::ops::{BinaryOp, UnaryOp};
use crate::parser::parse_predicate;
use filter_core::{ColumnType, RowValue, TableDefinition};
use rust_decimal::Decimal;
use sqlparser::ast::{
    BinaryOperator, Expr, Function, FunctionArg, FunctionArgExpr, FunctionArguments, Ident,
    UnaryOperator, Value, ValueWithSpan,
};
use std::fmt;
use std::str::FromStr;
use tracing::warn;

/// Built-in functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Func {
    FindInSet,
    JsonUnquote,
    Length,
    CharLength,
    Lower,
    Upper,
    Concat,
    Abs,
    IfNull,
    Coalesce,
    IsNull,
}

impl Func {
    fn lookup(name: &str) -> Option<Self> {
        Some(match name {
            "find_in_set" => Func::FindInSet,
            "json_unquote" => Func::JsonUnquote,
            "length" | "octet_length" => Func::Length,
            "char_length" | "character_length" => Func::CharLength,
            "lower" | "lcase" => Func::Lower,
            "upper" | "ucase" => Func::Upper,
            "concat" => Func::Concat,
            "abs" => Func::Abs,
            "ifnull" => Func::IfNull,
            "coalesce" => Func::Coalesce,
            "isnull" => Func::IsNull,
            _ => return None,
        })
    }

    pub(crate) fn name(self) -> &'static str {
        match self {
            Func::FindInSet => "FIND_IN_SET",
            Func::JsonUnquote => "JSON_UNQUOTE",
            Func::Length => "LENGTH",
            Func::CharLength => "CHAR_LENGTH",
            Func::Lower => "LOWER",
            Func::Upper => "UPPER",
            Func::Concat => "CONCAT",
            Func::Abs => "ABS",
            Func::IfNull => "IFNULL",
            Func::Coalesce => "COALESCE",
            Func::IsNull => "ISNULL",
        }
    }

    /// (min, max, description) argument counts.
    fn arity(self) -> (usize, Option<usize>, &'static str) {
        match self {
            Func::FindInSet | Func::IfNull => (2, Some(2), "2"),
            Func::Concat | Func::Coalesce => (1, None, "at least 1"),
            _ => (1, Some(1), "1"),
        }
    }
}

/// A bound expression node.
#[derive(Debug, Clone)]
pub(crate) enum Node {
    Const(Datum),
    Column {
        index: usize,
        name: String,
        column_type: ColumnType,
    },
    Unary {
        op: UnaryOp,
        expr: Box<Node>,
    },
    Binary {
        op: BinaryOp,
        left: Box<Node>,
        right: Box<Node>,
    },
    IsNull {
        expr: Box<Node>,
        negated: bool,
    },
    IsBool {
        expr: Box<Node>,
        value: bool,
        negated: bool,
    },
    InList {
        expr: Box<Node>,
        list: Vec<Node>,
        negated: bool,
    },
    Between {
        expr: Box<Node>,
        low: Box<Node>,
        high: Box<Node>,
        negated: bool,
    },
    Like {
        expr: Box<Node>,
        pattern: Box<Node>,
        negated: bool,
    },
    Call {
        func: Func,
        args: Vec<Node>,
    },
    JsonExtract {
        expr: Box<Node>,
        paths: Vec<JsonPath>,
        unquote: bool,
    },
}

/// A predicate bound to one table's column layout.
///
/// Immutable once built, so it can be shared between threads and reused
/// for every row of the table until the table's definition changes.
#[derive(Debug, Clone)]
pub struct BoundExpr {
    root: Node,
    width: usize,
    source: String,
}

impl BoundExpr {
    /// The predicate text this expression was bound from.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Number of columns in the table it was bound to.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Whether the expression does not depend on the row.
    pub fn is_constant(&self) -> bool {
        matches!(self.root, Node::Const(_))
    }

    /// Evaluate against one decoded row.
    pub fn evaluate(&self, row: &[RowValue]) -> Result<Datum, EvalError> {
        if row.len() != self.width {
            return Err(EvalError::ColumnCount {
                expected: self.width,
                actual: row.len(),
            });
        }
        self.root.eval(row)
    }
}

impl fmt::Display for BoundExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.root)
    }
}

/// Parse `predicate` and bind it to `table`.
///
/// ```rust
/// use filter_core::{ColumnDefinition, ColumnType, TableDefinition};
/// use row_expr::bind;
///
/// let table = TableDefinition::new("t", vec![ColumnDefinition::new("c", ColumnType::Text)]);
/// assert_eq!(bind("c = 'a'", &table).unwrap().to_string(), "`c` = 'a'");
///
/// // unknown column
/// let expr = bind("d > 1", &table).unwrap();
/// assert!(expr.is_constant());
/// assert_eq!(expr.to_string(), "0");
/// ```
pub fn bind(predicate: &str, table: &TableDefinition) -> Result<BoundExpr, BindError> {
    let expr = parse_predicate(predicate)?;
    let mut binder = Binder {
        table,
        missing: None,
    };
    let root = binder.bind(&expr)?;

    let root = match binder.missing {
        Some(column) => {
            warn!(
                table = %table.name,
                %column,
                predicate,
                "predicate references an unknown column, no row will be skipped"
            );
            Node::Const(Datum::Int(0))
        }
        None => root,
    };

    Ok(BoundExpr {
        root,
        width: table.len(),
        source: predicate.to_string(),
    })
}

struct Binder<'a> {
    table: &'a TableDefinition,
    missing: Option<String>,
}

impl Binder<'_> {
    fn bind(&mut self, expr: &Expr) -> Result<Node, BindError> {
        Ok(match expr {
            Expr::Value(v) => Node::Const(value_datum(&v.value)?),
            Expr::Identifier(ident) => match bool_word(ident) {
                Some(b) => Node::Const(Datum::bool(b)),
                None => self.bind_column(None, &ident.value),
            },
            Expr::CompoundIdentifier(parts) => match parts.as_slice() {
                [.., qualifier, name] => self.bind_column(Some(&qualifier.value), &name.value),
                _ => return Err(BindError::Unsupported(expr.to_string())),
            },
            Expr::Nested(inner) => self.bind(inner)?,
            Expr::UnaryOp { op, expr } => self.bind_unary(op, expr)?,
            Expr::BinaryOp { left, op, right } => self.bind_binary(left, op, right)?,
            Expr::IsNull(expr) | Expr::IsUnknown(expr) => Node::IsNull {
                expr: Box::new(self.bind(expr)?),
                negated: false,
            },
            Expr::IsNotNull(expr) | Expr::IsNotUnknown(expr) => Node::IsNull {
                expr: Box::new(self.bind(expr)?),
                negated: true,
            },
            Expr::IsTrue(expr) => self.bind_is_bool(expr, true, false)?,
            Expr::IsNotTrue(expr) => self.bind_is_bool(expr, true, true)?,
            Expr::IsFalse(expr) => self.bind_is_bool(expr, false, false)?,
            Expr::IsNotFalse(expr) => self.bind_is_bool(expr, false, true)?,
            Expr::InList {
                expr,
                list,
                negated,
            } => Node::InList {
                expr: Box::new(self.bind(expr)?),
                list: list.iter().map(|e| self.bind(e)).collect::<Result<_, _>>()?,
                negated: *negated,
            },
            Expr::Between {
                expr,
                negated,
                low,
                high,
            } => Node::Between {
                expr: Box::new(self.bind(expr)?),
                low: Box::new(self.bind(low)?),
                high: Box::new(self.bind(high)?),
                negated: *negated,
            },
            Expr::Like {
                negated,
                expr,
                pattern,
                ..
            } => Node::Like {
                expr: Box::new(self.bind(expr)?),
                pattern: Box::new(self.bind(pattern)?),
                negated: *negated,
            },
            Expr::Function(function) => self.bind_function(function)?,
            other => return Err(BindError::Unsupported(other.to_string())),
        })
    }

    fn bind_is_bool(&mut self, expr: &Expr, value: bool, negated: bool) -> Result<Node, BindError> {
        Ok(Node::IsBool {
            expr: Box::new(self.bind(expr)?),
            value,
            negated,
        })
    }

    fn bind_unary(&mut self, op: &UnaryOperator, expr: &Expr) -> Result<Node, BindError> {
        let op = match op {
            UnaryOperator::Plus => return self.bind(expr),
            UnaryOperator::Minus => {
                // fold into numeric literals so that -9223372036854775808 fits
                if let Expr::Value(ValueWithSpan {
                    value: Value::Number(n, _),
                    ..
                }) = expr
                {
                    return Ok(Node::Const(number_datum(&format!("-{n}"))?));
                }
                UnaryOp::Neg
            }
            UnaryOperator::Not => UnaryOp::Not,
            UnaryOperator::PGBitwiseNot => UnaryOp::BitNot,
            other => return Err(BindError::Unsupported(format!("unary operator {other}"))),
        };
        Ok(Node::Unary {
            op,
            expr: Box::new(self.bind(expr)?),
        })
    }

    fn bind_binary(
        &mut self,
        left: &Expr,
        op: &BinaryOperator,
        right: &Expr,
    ) -> Result<Node, BindError> {
        let op = match op {
            BinaryOperator::Arrow | BinaryOperator::LongArrow => {
                return Ok(Node::JsonExtract {
                    expr: Box::new(self.bind(left)?),
                    paths: vec![json_path(right)?],
                    unquote: *op == BinaryOperator::LongArrow,
                });
            }
            BinaryOperator::Or => BinaryOp::Or,
            BinaryOperator::Xor => BinaryOp::Xor,
            BinaryOperator::And => BinaryOp::And,
            BinaryOperator::Eq => BinaryOp::Eq,
            BinaryOperator::Spaceship => BinaryOp::NullSafeEq,
            BinaryOperator::NotEq => BinaryOp::NotEq,
            BinaryOperator::Lt => BinaryOp::Lt,
            BinaryOperator::LtEq => BinaryOp::LtEq,
            BinaryOperator::Gt => BinaryOp::Gt,
            BinaryOperator::GtEq => BinaryOp::GtEq,
            BinaryOperator::BitwiseOr => BinaryOp::BitOr,
            BinaryOperator::BitwiseAnd => BinaryOp::BitAnd,
            BinaryOperator::Plus => BinaryOp::Add,
            BinaryOperator::Minus => BinaryOp::Sub,
            BinaryOperator::Multiply => BinaryOp::Mul,
            BinaryOperator::Divide => BinaryOp::Div,
            BinaryOperator::MyIntegerDivide => BinaryOp::IntDiv,
            BinaryOperator::Modulo => BinaryOp::Mod,
            other => return Err(BindError::Unsupported(format!("operator {other}"))),
        };
        Ok(Node::Binary {
            op,
            left: Box::new(self.bind(left)?),
            right: Box::new(self.bind(right)?),
        })
    }

    fn bind_column(&mut self, qualifier: Option<&str>, name: &str) -> Node {
        let qualified_ok = qualifier.map_or(true, |q| q.eq_ignore_ascii_case(&self.table.name));
        let index = self.table.column_index(name).filter(|_| qualified_ok);
        match index {
            Some(index) => {
                let column = &self.table.columns[index];
                Node::Column {
                    index,
                    name: column.name.clone(),
                    column_type: column.column_type.clone(),
                }
            }
            None => {
                self.missing.get_or_insert_with(|| match qualifier {
                    Some(q) => format!("{q}.{name}"),
                    None => name.to_string(),
                });
                Node::Const(Datum::Null)
            }
        }
    }

    fn bind_function(&mut self, function: &Function) -> Result<Node, BindError> {
        let name = function.name.to_string().to_lowercase();
        let args = match &function.args {
            FunctionArguments::None => Vec::new(),
            FunctionArguments::List(list) => list
                .args
                .iter()
                .map(|arg| match arg {
                    FunctionArg::Unnamed(FunctionArgExpr::Expr(expr)) => Ok(expr),
                    other => Err(BindError::Unsupported(format!("argument {other} of {name}"))),
                })
                .collect::<Result<Vec<_>, _>>()?,
            FunctionArguments::Subquery(_) => {
                return Err(BindError::Unsupported(function.to_string()))
            }
        };

        if name == "json_extract" {
            if args.len() < 2 {
                return Err(BindError::Arity {
                    function: "JSON_EXTRACT",
                    expected: "at least 2",
                    found: args.len(),
                });
            }
            let paths = args[1..]
                .iter()
                .copied()
                .map(json_path)
                .collect::<Result<_, _>>()?;
            return Ok(Node::JsonExtract {
                expr: Box::new(self.bind(args[0])?),
                paths,
                unquote: false,
            });
        }

        let func = Func::lookup(&name).ok_or_else(|| BindError::UnknownFunction(name.clone()))?;
        let (min, max, expected) = func.arity();
        if args.len() < min || max.is_some_and(|max| args.len() > max) {
            return Err(BindError::Arity {
                function: func.name(),
                expected,
                found: args.len(),
            });
        }
        Ok(Node::Call {
            func,
            args: args.into_iter().map(|a| self.bind(a)).collect::<Result<_, _>>()?,
        })
    }
}

/// Unquoted `TRUE`/`FALSE` when the parser left them as identifiers.
fn bool_word(ident: &Ident) -> Option<bool> {
    if ident.quote_style.is_some() {
        None
    } else if ident.value.eq_ignore_ascii_case("true") {
        Some(true)
    } else if ident.value.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

fn json_path(expr: &Expr) -> Result<JsonPath, BindError> {
    match expr {
        Expr::Value(ValueWithSpan {
            value: Value::SingleQuotedString(path) | Value::DoubleQuotedString(path),
            ..
        }) => JsonPath::parse(path),
        other => Err(BindError::InvalidJsonPath {
            path: other.to_string(),
            reason: "path must be a string literal",
        }),
    }
}

fn value_datum(value: &Value) -> Result<Datum, BindError> {
    Ok(match value {
        Value::Null => Datum::Null,
        Value::Boolean(b) => Datum::bool(*b),
        Value::Number(n, _) => number_datum(n)?,
        Value::SingleQuotedString(s) | Value::DoubleQuotedString(s) => Datum::Str(s.clone()),
        Value::HexStringLiteral(hex) => Datum::Bytes(hex_bytes(hex)?),
        other => return Err(BindError::Unsupported(other.to_string())),
    })
}

/// Integer literals that fit stay integers, `1.5` is exact, `1e3` is a
/// float.
fn number_datum(text: &str) -> Result<Datum, BindError> {
    let invalid = || BindError::InvalidNumber(text.to_string());
    Ok(if text.contains(['e', 'E']) {
        Datum::Float(text.parse().map_err(|_| invalid())?)
    } else if text.contains('.') {
        Datum::Decimal(Decimal::from_str(text).map_err(|_| invalid())?)
    } else if let Ok(i) = text.parse::<i64>() {
        Datum::Int(i)
    } else if let Ok(u) = text.parse::<u64>() {
        Datum::UInt(u)
    } else {
        Datum::Decimal(Decimal::from_str(text).map_err(|_| invalid())?)
    })
}

/// `x'0a1b'` and `0xa1b` digits; an odd count is padded on the left.
fn hex_bytes(hex: &str) -> Result<Vec<u8>, BindError> {
    let padded = if hex.len() % 2 == 1 {
        format!("0{hex}")
    } else {
        hex.to_string()
    };
    (0..padded.len())
        .step_by(2)
        .map(|i| {
            padded
                .get(i..i + 2)
                .and_then(|pair| u8::from_str_radix(pair, 16).ok())
                .ok_or_else(|| BindError::InvalidNumber(format!("x'{hex}'")))
        })
        .collect()
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // nested operators are parenthesised
        let wrap = |node: &Node| match node {
            Node::Binary { .. } | Node::Between { .. } | Node::Like { .. } | Node::InList { .. } => {
                format!("({node})")
            }
            _ => node.to_string(),
        };
        let not = |negated: bool| if negated { "NOT " } else { "" };
        match self {
            Node::Const(Datum::Str(s)) => write!(f, "'{}'", s.replace('\'', "''")),
            Node::Const(Datum::Bytes(bytes)) => {
                f.write_str("x'")?;
                for b in bytes {
                    write!(f, "{b:02x}")?;
                }
                f.write_str("'")
            }
            Node::Const(d) => write!(f, "{d}"),
            Node::Column { name, .. } => write!(f, "`{name}`"),
            Node::Unary { op, expr } => match op {
                UnaryOp::Neg => write!(f, "-{}", wrap(expr)),
                UnaryOp::Not => write!(f, "NOT {}", wrap(expr)),
                UnaryOp::BitNot => write!(f, "~{}", wrap(expr)),
            },
            Node::Binary { op, left, right } => {
                write!(f, "{} {} {}", wrap(left), op.as_str(), wrap(right))
            }
            Node::IsNull { expr, negated } => write!(f, "{} IS {}NULL", wrap(expr), not(*negated)),
            Node::IsBool {
                expr,
                value,
                negated,
            } => write!(
                f,
                "{} IS {}{}",
                wrap(expr),
                not(*negated),
                if *value { "TRUE" } else { "FALSE" }
            ),
            Node::InList {
                expr,
                list,
                negated,
            } => {
                let items: Vec<String> = list.iter().map(|n| n.to_string()).collect();
                write!(f, "{} {}IN ({})", wrap(expr), not(*negated), items.join(", "))
            }
            Node::Between {
                expr,
                low,
                high,
                negated,
            } => write!(
                f,
                "{} {}BETWEEN {} AND {}",
                wrap(expr),
                not(*negated),
                wrap(low),
                wrap(high)
            ),
            Node::Like {
                expr,
                pattern,
                negated,
            } => write!(f, "{} {}LIKE {}", wrap(expr), not(*negated), wrap(pattern)),
            Node::Call { func, args } => {
                let args: Vec<String> = args.iter().map(|n| n.to_string()).collect();
                write!(f, "{}({})", func.name(), args.join(", "))
            }
            Node::JsonExtract {
                expr,
                paths,
                unquote,
            } => {
                let paths: Vec<String> = paths
                    .iter()
                    .map(|p| format!("'{}'", p.to_string().replace('\'', "''")))
                    .collect();
                if *unquote {
                    write!(f, "JSON_UNQUOTE(JSON_EXTRACT({}, {}))", expr, paths.join(", "))
                } else {
                    write!(f, "JSON_EXTRACT({}, {})", expr, paths.join(", "))
                }
            }
        }
    }
}
