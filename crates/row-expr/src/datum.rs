//! Runtime values and MySQL comparison rules.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde_json::Value as JsonValue;
use std::cmp::Ordering;
use std::fmt;

/// A value during evaluation.
#[derive(Debug, Clone, PartialEq)]
pub enum Datum {
    Null,
    Int(i64),
    UInt(u64),
    Decimal(Decimal),
    Float(f64),
    Str(String),
    Bytes(Vec<u8>),
    Json(JsonValue),
}

impl Datum {
    pub fn bool(b: bool) -> Self {
        Datum::Int(b as i64)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Datum::Null)
    }

    fn is_stringish(&self) -> bool {
        matches!(self, Datum::Str(_) | Datum::Bytes(_))
    }

    /// Truth value; `None` is SQL unknown.
    pub fn truth(&self) -> Option<bool> {
        match self.to_number()? {
            Number::Int(i) => Some(i != 0),
            Number::UInt(u) => Some(u != 0),
            Number::Decimal(d) => Some(!d.is_zero()),
            Number::Float(f) => Some(f != 0.0),
        }
    }

    /// Text form, as CONCAT or LIKE see it.
    pub fn to_text(&self) -> Option<String> {
        match self {
            Datum::Null => None,
            Datum::Str(s) => Some(s.clone()),
            Datum::Bytes(b) => Some(String::from_utf8_lossy(b).into_owned()),
            Datum::Json(JsonValue::String(s)) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Byte form for byte-exact string comparison.
    fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Datum::Str(s) => Some(s.as_bytes()),
            Datum::Bytes(b) => Some(b),
            _ => None,
        }
    }

    /// Numeric form. Strings use MySQL prefix conversion (`'12abc'` is 12,
    /// `'abc'` is 0).
    pub fn to_number(&self) -> Option<Number> {
        match self {
            Datum::Null => None,
            Datum::Int(i) => Some(Number::Int(*i)),
            Datum::UInt(u) => Some(Number::UInt(*u)),
            Datum::Decimal(d) => Some(Number::Decimal(*d)),
            Datum::Float(f) => Some(Number::Float(*f)),
            Datum::Str(s) => Some(Number::Float(prefix_to_f64(s))),
            Datum::Bytes(b) => Some(Number::Float(prefix_to_f64(&String::from_utf8_lossy(b)))),
            Datum::Json(v) => json_scalar(v).and_then(|d| d.to_number()),
        }
    }
}

impl fmt::Display for Datum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Datum::Null => f.write_str("NULL"),
            Datum::Int(i) => write!(f, "{i}"),
            Datum::UInt(u) => write!(f, "{u}"),
            Datum::Decimal(d) => write!(f, "{d}"),
            Datum::Float(x) => write!(f, "{x}"),
            Datum::Str(s) => f.write_str(s),
            Datum::Bytes(b) => f.write_str(&String::from_utf8_lossy(b)),
            Datum::Json(v) => write!(f, "{v}"),
        }
    }
}

/// A numeric operand.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    Int(i64),
    UInt(u64),
    Decimal(Decimal),
    Float(f64),
}

impl Number {
    pub fn to_f64(self) -> f64 {
        match self {
            Number::Int(i) => i as f64,
            Number::UInt(u) => u as f64,
            Number::Decimal(d) => d.to_f64().unwrap_or(f64::NAN),
            Number::Float(f) => f,
        }
    }

    pub fn to_decimal(self) -> Option<Decimal> {
        match self {
            Number::Int(i) => Some(Decimal::from(i)),
            Number::UInt(u) => Some(Decimal::from(u)),
            Number::Decimal(d) => Some(d),
            Number::Float(f) => Decimal::try_from(f).ok(),
        }
    }

    pub fn to_i128(self) -> Option<i128> {
        match self {
            Number::Int(i) => Some(i as i128),
            Number::UInt(u) => Some(u as i128),
            Number::Decimal(d) => d.trunc().to_i128(),
            Number::Float(f) if f.is_finite() => Some(f.trunc() as i128),
            Number::Float(_) => None,
        }
    }

    pub fn is_float(self) -> bool {
        matches!(self, Number::Float(_))
    }

    pub fn is_decimal(self) -> bool {
        matches!(self, Number::Decimal(_))
    }

    pub fn into_datum(self) -> Datum {
        match self {
            Number::Int(i) => Datum::Int(i),
            Number::UInt(u) => Datum::UInt(u),
            Number::Decimal(d) => Datum::Decimal(d),
            Number::Float(f) => Datum::Float(f),
        }
    }
}

/// Compare two numbers: floats as `f64`, decimals exactly, integers as
/// `i128`.
pub fn compare_numbers(a: Number, b: Number) -> Option<Ordering> {
    if a.is_float() || b.is_float() {
        return a.to_f64().partial_cmp(&b.to_f64());
    }
    if a.is_decimal() || b.is_decimal() {
        return Some(a.to_decimal()?.cmp(&b.to_decimal()?));
    }
    Some(a.to_i128()?.cmp(&b.to_i128()?))
}

/// Compare two values. `None` when either side is NULL or the values are
/// unordered (NaN).
///
/// Two strings compare byte-wise. A number and a string compare
/// numerically: exactly when the string is a plain decimal and the number
/// is not a float, otherwise through the string's numeric prefix as `f64`.
/// A JSON scalar compares as the equivalent SQL value.
pub fn compare(a: &Datum, b: &Datum) -> Option<Ordering> {
    match (a, b) {
        (Datum::Null, _) | (_, Datum::Null) => None,
        (Datum::Json(x), Datum::Json(y)) => compare_json(x, y),
        (Datum::Json(x), other) => compare(&json_scalar(x)?, other),
        (other, Datum::Json(y)) => compare(other, &json_scalar(y)?),
        _ if a.is_stringish() && b.is_stringish() => a.as_bytes()?.partial_cmp(b.as_bytes()?),
        _ if a.is_stringish() => compare_string_number(a, b.to_number()?).map(Ordering::reverse),
        _ if b.is_stringish() => compare_string_number(b, a.to_number()?),
        _ => compare_numbers(a.to_number()?, b.to_number()?),
    }
}

/// Compare number `n` with the numeric value of string `s`.
fn compare_string_number(s: &Datum, n: Number) -> Option<Ordering> {
    let text = s.to_text()?;
    let exact = if n.is_float() {
        None
    } else {
        text.trim().parse::<Decimal>().ok()
    };
    match exact {
        Some(d) => compare_numbers(n, Number::Decimal(d)),
        None => compare_numbers(n, Number::Float(prefix_to_f64(&text))),
    }
}

fn compare_json(a: &JsonValue, b: &JsonValue) -> Option<Ordering> {
    match (json_scalar(a), json_scalar(b)) {
        (Some(x), Some(y)) => compare(&x, &y),
        _ if a == b => Some(Ordering::Equal),
        // containers and nulls order by their serialized text
        _ => Some(a.to_string().cmp(&b.to_string())),
    }
}

/// SQL equivalent of a JSON scalar. JSON null and containers have none.
pub fn json_scalar(v: &JsonValue) -> Option<Datum> {
    match v {
        JsonValue::Bool(b) => Some(Datum::bool(*b)),
        JsonValue::Number(n) => Some(if let Some(i) = n.as_i64() {
            Datum::Int(i)
        } else if let Some(u) = n.as_u64() {
            Datum::UInt(u)
        } else {
            Datum::Float(n.as_f64().unwrap_or(f64::NAN))
        }),
        JsonValue::String(s) => Some(Datum::Str(s.clone())),
        JsonValue::Null | JsonValue::Array(_) | JsonValue::Object(_) => None,
    }
}

/// MySQL string-to-number conversion: the longest numeric prefix after
/// leading whitespace, 0 when there is none.
pub fn prefix_to_f64(s: &str) -> f64 {
    let s = s.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0;
    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end = 1;
    }
    let digits_start = end;
    while bytes.get(end).is_some_and(u8::is_ascii_digit) {
        end += 1;
    }
    if bytes.get(end) == Some(&b'.') {
        end += 1;
        while bytes.get(end).is_some_and(u8::is_ascii_digit) {
            end += 1;
        }
    }
    if end == digits_start || (end == digits_start + 1 && bytes[digits_start] == b'.') {
        return 0.0;
    }
    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut exp_end = end + 1;
        if matches!(bytes.get(exp_end), Some(b'+' | b'-')) {
            exp_end += 1;
        }
        if bytes.get(exp_end).is_some_and(u8::is_ascii_digit) {
            while bytes.get(exp_end).is_some_and(u8::is_ascii_digit) {
                exp_end += 1;
            }
            end = exp_end;
        }
    }
    s[..end].parse().unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::str::FromStr;

    fn dec(s: &str) -> Datum {
        Datum::Decimal(Decimal::from_str(s).unwrap())
    }

    #[test]
    fn test_prefix_to_f64() {
        assert_eq!(prefix_to_f64("12abc"), 12.0);
        assert_eq!(prefix_to_f64("  -1.5e2x"), -150.0);
        assert_eq!(prefix_to_f64("abc"), 0.0);
        assert_eq!(prefix_to_f64("."), 0.0);
        assert_eq!(prefix_to_f64("3e"), 3.0);
        assert_eq!(prefix_to_f64(".5"), 0.5);
    }

    #[test]
    fn test_numeric_comparison() {
        assert_eq!(compare(&Datum::Int(-1), &Datum::UInt(u64::MAX)), Some(Ordering::Less));
        assert_eq!(compare(&dec("10.10"), &dec("10.1")), Some(Ordering::Equal));
        assert_eq!(compare(&dec("10.11"), &dec("10.1")), Some(Ordering::Greater));
        assert_eq!(compare(&Datum::Int(10), &dec("10.0")), Some(Ordering::Equal));
        assert_eq!(
            compare(&Datum::Float(0.08f32 as f64), &dec("0.1")),
            Some(Ordering::Less)
        );
        assert_eq!(compare(&Datum::Float(f64::NAN), &Datum::Int(1)), None);
    }

    #[test]
    fn test_string_number_comparison() {
        assert_eq!(
            compare(&Datum::Int(2021), &Datum::Str("2021".to_string())),
            Some(Ordering::Equal)
        );
        assert_eq!(
            compare(&Datum::Str("2020".to_string()), &Datum::Int(2021)),
            Some(Ordering::Less)
        );
        assert_eq!(
            compare(&Datum::Str("12abc".to_string()), &Datum::Int(12)),
            Some(Ordering::Equal)
        );
        assert_eq!(
            compare(&Datum::Str("abc".to_string()), &Datum::Str("abd".to_string())),
            Some(Ordering::Less)
        );
        assert_eq!(
            compare(&Datum::Bytes(vec![0x12, 0x34]), &Datum::Str("\u{12}4".to_string())),
            Some(Ordering::Equal)
        );
    }

    #[test]
    fn test_null_and_json() {
        assert_eq!(compare(&Datum::Null, &Datum::Int(1)), None);
        assert_eq!(compare(&Datum::Json(json!(1)), &Datum::Int(1)), Some(Ordering::Equal));
        assert_eq!(
            compare(&Datum::Json(json!("a")), &Datum::Str("a".to_string())),
            Some(Ordering::Equal)
        );
        assert_eq!(compare(&Datum::Json(json!(null)), &Datum::Int(0)), None);
        assert_eq!(
            compare(&Datum::Json(json!([1, 2])), &Datum::Json(json!([1, 2]))),
            Some(Ordering::Equal)
        );
        assert_ne!(
            compare(&Datum::Json(json!({"a": 1})), &Datum::Json(json!({"a": 2}))),
            Some(Ordering::Equal)
        );
    }

    #[test]
    fn test_json_container_order_is_consistent() {
        let values = [json!(null), json!([1, 2]), json!([2]), json!({"a": 1}), json!({"b": [1]})];
        for x in &values {
            assert_eq!(compare_json(x, x), Some(Ordering::Equal), "{x}");
            assert_eq!(compare_json(x, &x.clone()), Some(Ordering::Equal), "{x}");
            for y in &values {
                let forward = compare_json(x, y).unwrap();
                let backward = compare_json(y, x).unwrap();
                assert_eq!(forward, backward.reverse(), "{x} vs {y}");
                assert_eq!(forward == Ordering::Equal, x == y, "{x} vs {y}");
            }
        }
    }

    #[test]
    fn test_truth() {
        assert_eq!(Datum::Int(0).truth(), Some(false));
        assert_eq!(Datum::Float(0.5).truth(), Some(true));
        assert_eq!(Datum::Str("1x".to_string()).truth(), Some(true));
        assert_eq!(Datum::Str("x".to_string()).truth(), Some(false));
        assert_eq!(Datum::Null.truth(), None);
    }
}
