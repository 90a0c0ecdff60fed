//! Reverse conversion: MySQL row event values to [`RowValue`].
//!
//! Row images arrive as driver [`Value`]s with the column metadata living
//! separately in the table schema. [`decode_value`] combines the two into
//! the value shape the row expression evaluator consumes:
//!
//! - integers keep the column's storage width (unsigned columns are stored
//!   in the signed variant of the same width, the evaluator reinterprets)
//! - temporal values become their canonical text form
//! - ENUM and SET keep their ordinal / bitmask when the image is binary
//! - BIT becomes an integer

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use filter_core::{ColumnDefinition, ColumnType, RowValue, TableDefinition};
use mysql_async::Value;
use rust_decimal::Decimal;
use std::str::FromStr;
use thiserror::Error;

/// Errors that can occur during value conversion.
#[derive(Debug, Error)]
pub enum ConversionError {
    #[error("Type mismatch for column {column}: expected {expected}, got {actual:?}")]
    TypeMismatch {
        column: String,
        expected: String,
        actual: Value,
    },
    #[error("Invalid UTF-8 in string: {0}")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),
    #[error("Invalid decimal value: {0}")]
    InvalidDecimal(String),
    #[error("Row has {actual} values but table {table} has {expected} columns")]
    ColumnCount {
        table: String,
        expected: usize,
        actual: usize,
    },
}

/// Decode one row image against its table definition.
pub fn decode_row(
    values: Vec<Value>,
    table: &TableDefinition,
) -> Result<Vec<RowValue>, ConversionError> {
    if values.len() != table.len() {
        return Err(ConversionError::ColumnCount {
            table: table.name.clone(),
            expected: table.len(),
            actual: values.len(),
        });
    }
    values
        .into_iter()
        .zip(&table.columns)
        .map(|(value, column)| decode_value(value, column))
        .collect()
}

/// Decode a single column value.
///
/// # Example
///
/// ```
/// use filter_core::{ColumnDefinition, ColumnType, RowValue};
/// use mysql_async::Value;
/// use mysql_types::decode_value;
///
/// let col = ColumnDefinition::new("c", ColumnType::Date);
/// let v = decode_value(Value::Date(2021, 3, 9, 0, 0, 0, 0), &col).unwrap();
/// assert_eq!(v, RowValue::String("2021-03-09".to_string()));
/// ```
pub fn decode_value(value: Value, column: &ColumnDefinition) -> Result<RowValue, ConversionError> {
    use ColumnType::*;

    if matches!(value, Value::NULL) {
        return Ok(RowValue::Null);
    }

    let mismatch = |expected: &str, value: &Value| ConversionError::TypeMismatch {
        column: column.name.clone(),
        expected: expected.to_string(),
        actual: value.clone(),
    };

    match &column.column_type {
        // Unsigned values wrap into the signed variant of the same width
        TinyInt { .. } => Ok(RowValue::Int8(extract_int(&value, &mismatch)? as i8)),
        SmallInt { .. } => Ok(RowValue::Int16(extract_int(&value, &mismatch)? as i16)),
        MediumInt { .. } | Int { .. } => {
            Ok(RowValue::Int32(extract_int(&value, &mismatch)? as i32))
        }
        BigInt { unsigned: true } => match value {
            Value::UInt(u) => Ok(RowValue::UInt64(u)),
            Value::Int(i) => Ok(RowValue::UInt64(i as u64)),
            other => Ok(RowValue::UInt64(extract_int(&other, &mismatch)? as u64)),
        },
        BigInt { unsigned: false } => Ok(RowValue::Int64(extract_int(&value, &mismatch)?)),
        Year => Ok(RowValue::Int64(extract_int(&value, &mismatch)?)),

        Decimal { .. } => extract_decimal(&value, &mismatch).map(RowValue::Decimal),
        Float => Ok(RowValue::Float32(extract_float(&value, &mismatch)? as f32)),
        Double => Ok(RowValue::Float64(extract_float(&value, &mismatch)?)),
        Bit { .. } => match &value {
            Value::Bytes(b) => Ok(RowValue::Int64(bits_to_i64(b))),
            other => Ok(RowValue::Int64(extract_int(other, &mismatch)?)),
        },

        Date => match value {
            Value::Date(y, m, d, ..) => Ok(RowValue::String(format_date(y, m, d))),
            other => extract_string(&other, &mismatch).map(RowValue::String),
        },
        DateTime | Timestamp => match value {
            Value::Date(y, m, d, h, mi, s, us) => {
                Ok(RowValue::String(format_datetime(y, m, d, h, mi, s, us)))
            }
            other => extract_string(&other, &mismatch).map(RowValue::String),
        },
        Time => match value {
            Value::Time(neg, days, h, m, s, us) => {
                Ok(RowValue::String(format_time(neg, days, h, m, s, us)))
            }
            other => extract_string(&other, &mismatch).map(RowValue::String),
        },

        // Binary images carry the ordinal / bitmask, text images the label
        Enum { .. } | Set { .. } => match value {
            Value::Int(i) => Ok(RowValue::Int64(i)),
            Value::UInt(u) => Ok(RowValue::Int64(u as i64)),
            other => extract_string(&other, &mismatch).map(RowValue::String),
        },

        Char { .. } | VarChar { .. } | Text => match value {
            Value::Bytes(b) => Ok(match String::from_utf8(b) {
                Ok(s) => RowValue::String(s),
                Err(e) => RowValue::Bytes(e.into_bytes()),
            }),
            other => extract_string(&other, &mismatch).map(RowValue::String),
        },

        Binary { .. } | VarBinary { .. } | Blob | Json | Geometry => match value {
            Value::Bytes(b) => Ok(RowValue::Bytes(b)),
            other => Err(mismatch("bytes", &other)),
        },
    }
}

/// Extract integer from MySQL Value.
fn extract_int(
    value: &Value,
    mismatch: &impl Fn(&str, &Value) -> ConversionError,
) -> Result<i64, ConversionError> {
    match value {
        Value::Int(i) => Ok(*i),
        Value::UInt(u) => Ok(*u as i64),
        Value::Bytes(b) => std::str::from_utf8(b)
            .ok()
            .and_then(|s| s.trim().parse().ok())
            .ok_or_else(|| mismatch("integer", value)),
        _ => Err(mismatch("integer", value)),
    }
}

/// Extract float from MySQL Value.
fn extract_float(
    value: &Value,
    mismatch: &impl Fn(&str, &Value) -> ConversionError,
) -> Result<f64, ConversionError> {
    match value {
        Value::Float(f) => Ok(*f as f64),
        Value::Double(d) => Ok(*d),
        Value::Int(i) => Ok(*i as f64),
        Value::UInt(u) => Ok(*u as f64),
        Value::Bytes(b) => std::str::from_utf8(b)
            .ok()
            .and_then(|s| s.trim().parse().ok())
            .ok_or_else(|| mismatch("float", value)),
        _ => Err(mismatch("float", value)),
    }
}

/// Extract decimal from MySQL Value.
fn extract_decimal(
    value: &Value,
    mismatch: &impl Fn(&str, &Value) -> ConversionError,
) -> Result<Decimal, ConversionError> {
    match value {
        Value::Bytes(b) => {
            let s = String::from_utf8(b.clone())?;
            Decimal::from_str(s.trim()).map_err(|_| ConversionError::InvalidDecimal(s))
        }
        Value::Int(i) => Ok(Decimal::from(*i)),
        Value::UInt(u) => Ok(Decimal::from(*u)),
        Value::Double(d) => {
            Decimal::try_from(*d).map_err(|_| ConversionError::InvalidDecimal(d.to_string()))
        }
        Value::Float(f) => {
            Decimal::try_from(*f).map_err(|_| ConversionError::InvalidDecimal(f.to_string()))
        }
        _ => Err(mismatch("decimal", value)),
    }
}

/// Extract string from MySQL Value.
fn extract_string(
    value: &Value,
    mismatch: &impl Fn(&str, &Value) -> ConversionError,
) -> Result<String, ConversionError> {
    match value {
        Value::Bytes(b) => Ok(String::from_utf8(b.clone())?),
        Value::Int(i) => Ok(i.to_string()),
        Value::UInt(u) => Ok(u.to_string()),
        Value::Float(f) => Ok(f.to_string()),
        Value::Double(d) => Ok(d.to_string()),
        _ => Err(mismatch("string", value)),
    }
}

/// Big-endian BIT payload to integer.
fn bits_to_i64(bytes: &[u8]) -> i64 {
    bytes.iter().fold(0u64, |acc, b| (acc << 8) | *b as u64) as i64
}

/// `YYYY-MM-DD`. Zero dates have no chrono form and are printed as-is.
fn format_date(year: u16, month: u8, day: u8) -> String {
    match NaiveDate::from_ymd_opt(year as i32, month as u32, day as u32) {
        Some(date) => date.format("%Y-%m-%d").to_string(),
        None => format!("{year:04}-{month:02}-{day:02}"),
    }
}

/// `YYYY-MM-DD HH:MM:SS[.ffffff]`
fn format_datetime(
    year: u16,
    month: u8,
    day: u8,
    hour: u8,
    min: u8,
    sec: u8,
    micro: u32,
) -> String {
    let date = NaiveDate::from_ymd_opt(year as i32, month as u32, day as u32);
    let time = NaiveTime::from_hms_micro_opt(hour as u32, min as u32, sec as u32, micro);
    let mut out = match (date, time) {
        (Some(date), Some(time)) => NaiveDateTime::new(date, time)
            .format("%Y-%m-%d %H:%M:%S")
            .to_string(),
        _ => format!("{year:04}-{month:02}-{day:02} {hour:02}:{min:02}:{sec:02}"),
    };
    if micro > 0 {
        out.push_str(&format!(".{micro:06}"));
    }
    out
}

/// `[-]HH:MM:SS[.ffffff]`, hours may exceed 24.
fn format_time(negative: bool, days: u32, hour: u8, min: u8, sec: u8, micro: u32) -> String {
    let hours = days * 24 + hour as u32;
    let mut out = format!(
        "{}{hours:02}:{min:02}:{sec:02}",
        if negative { "-" } else { "" }
    );
    if micro > 0 {
        out.push_str(&format!(".{micro:06}"));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn col(ty: ColumnType) -> ColumnDefinition {
        ColumnDefinition::new("c", ty)
    }

    #[test]
    fn test_integer_widths() {
        let v = decode_value(Value::Int(-8), &col(ColumnType::MediumInt { unsigned: false }));
        assert_eq!(v.unwrap(), RowValue::Int32(-8));

        let v = decode_value(Value::Int(2), &col(ColumnType::TinyInt { unsigned: false }));
        assert_eq!(v.unwrap(), RowValue::Int8(2));

        // 200 in a TINYINT UNSIGNED keeps its bit pattern
        let v = decode_value(Value::UInt(200), &col(ColumnType::TinyInt { unsigned: true }));
        assert_eq!(v.unwrap(), RowValue::Int8(200u8 as i8));

        let v = decode_value(
            Value::UInt(u64::MAX),
            &col(ColumnType::BigInt { unsigned: true }),
        );
        assert_eq!(v.unwrap(), RowValue::UInt64(u64::MAX));

        let v = decode_value(Value::Bytes(b"42".to_vec()), &col(ColumnType::Int { unsigned: false }));
        assert_eq!(v.unwrap(), RowValue::Int32(42));
    }

    #[test]
    fn test_null() {
        let v = decode_value(Value::NULL, &col(ColumnType::Json)).unwrap();
        assert!(v.is_null());
    }

    #[test]
    fn test_decimal_and_float() {
        let v = decode_value(
            Value::Bytes(b"10.10".to_vec()),
            &col(ColumnType::Decimal {
                precision: 5,
                scale: 2,
            }),
        )
        .unwrap();
        assert_eq!(v, RowValue::Decimal(Decimal::from_str("10.10").unwrap()));

        let v = decode_value(Value::Float(0.5), &col(ColumnType::Float)).unwrap();
        assert_eq!(v, RowValue::Float32(0.5));

        let v = decode_value(Value::Double(0.08), &col(ColumnType::Double)).unwrap();
        assert_eq!(v, RowValue::Float64(0.08));

        let err = decode_value(
            Value::Bytes(b"abc".to_vec()),
            &col(ColumnType::Decimal {
                precision: 5,
                scale: 2,
            }),
        );
        assert!(matches!(err, Err(ConversionError::InvalidDecimal(_))));
    }

    #[test]
    fn test_temporal_text() {
        let v = decode_value(
            Value::Date(2021, 1, 2, 3, 4, 5, 0),
            &col(ColumnType::DateTime),
        )
        .unwrap();
        assert_eq!(v, RowValue::String("2021-01-02 03:04:05".to_string()));

        let v = decode_value(
            Value::Date(2021, 1, 2, 3, 4, 5, 120),
            &col(ColumnType::Timestamp),
        )
        .unwrap();
        assert_eq!(v, RowValue::String("2021-01-02 03:04:05.000120".to_string()));

        let v = decode_value(Value::Date(0, 0, 0, 0, 0, 0, 0), &col(ColumnType::Date)).unwrap();
        assert_eq!(v, RowValue::String("0000-00-00".to_string()));

        let v = decode_value(Value::Time(true, 1, 2, 3, 4, 0), &col(ColumnType::Time)).unwrap();
        assert_eq!(v, RowValue::String("-26:03:04".to_string()));
    }

    #[test]
    fn test_bit_enum_set() {
        let v = decode_value(Value::Bytes(vec![0x01, 0x02]), &col(ColumnType::Bit { width: 16 }));
        assert_eq!(v.unwrap(), RowValue::Int64(0x0102));

        let enum_col = col(ColumnType::Enum {
            values: vec!["x-small".to_string(), "small".to_string()],
        });
        assert_eq!(
            decode_value(Value::Int(1), &enum_col).unwrap(),
            RowValue::Int64(1)
        );
        assert_eq!(
            decode_value(Value::Bytes(b"small".to_vec()), &enum_col).unwrap(),
            RowValue::String("small".to_string())
        );
    }

    #[test]
    fn test_strings_and_bytes() {
        let v = decode_value(Value::Bytes(b"abc".to_vec()), &col(ColumnType::VarChar { length: 10 }));
        assert_eq!(v.unwrap(), RowValue::String("abc".to_string()));

        let v = decode_value(Value::Bytes(vec![0xff, 0xfe]), &col(ColumnType::Text));
        assert_eq!(v.unwrap(), RowValue::Bytes(vec![0xff, 0xfe]));

        let v = decode_value(Value::Bytes(b"\x124".to_vec()), &col(ColumnType::Blob));
        assert_eq!(v.unwrap(), RowValue::Bytes(vec![0x12, 0x34]));

        let err = decode_value(Value::Int(1), &col(ColumnType::Blob));
        assert!(matches!(err, Err(ConversionError::TypeMismatch { .. })));
    }

    #[test]
    fn test_decode_row_checks_width() {
        let table = TableDefinition::new(
            "t",
            vec![
                ColumnDefinition::new("a", ColumnType::Int { unsigned: false }),
                ColumnDefinition::new("b", ColumnType::Text),
            ],
        );
        let row = decode_row(vec![Value::Int(1), Value::Bytes(b"x".to_vec())], &table).unwrap();
        assert_eq!(row, vec![RowValue::Int32(1), RowValue::String("x".to_string())]);

        let err = decode_row(vec![Value::Int(1)], &table);
        assert!(matches!(err, Err(ConversionError::ColumnCount { expected: 2, actual: 1, .. })));
    }
}
