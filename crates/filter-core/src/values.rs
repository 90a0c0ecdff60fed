//! Decoded row values.
//!
//! A decoded row is an ordered slice of `RowValue`, one per column in table
//! definition order. The variants follow what a binlog row decoder hands
//! out: signed integers of the column's width, exact decimals, IEEE floats,
//! text for temporal columns, ordinals/bitmasks for enum/set columns and raw
//! bytes for blobs and JSON documents.

use rust_decimal::Decimal;

/// A single decoded column value.
#[derive(Debug, Clone, PartialEq)]
pub enum RowValue {
    /// SQL NULL
    Null,

    /// 1-byte integer
    Int8(i8),

    /// 2-byte integer
    Int16(i16),

    /// 3- or 4-byte integer
    Int32(i32),

    /// 8-byte integer; also bit fields, enum ordinals and set bitmasks
    Int64(i64),

    /// 8-byte unsigned integer, for decoders that already widened the value
    UInt64(u64),

    /// Fixed-point decimal
    Decimal(Decimal),

    /// 32-bit floating point
    Float32(f32),

    /// 64-bit floating point
    Float64(f64),

    /// Text, including temporal values rendered by the decoder
    String(String),

    /// Binary data, including JSON documents
    Bytes(Vec<u8>),
}

impl RowValue {
    /// Check if this value is null.
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Variant name, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Int8(_) => "int8",
            Self::Int16(_) => "int16",
            Self::Int32(_) => "int32",
            Self::Int64(_) => "int64",
            Self::UInt64(_) => "uint64",
            Self::Decimal(_) => "decimal",
            Self::Float32(_) => "float32",
            Self::Float64(_) => "float64",
            Self::String(_) => "string",
            Self::Bytes(_) => "bytes",
        }
    }

    /// Try to get this value as an i64, widening smaller integers.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int8(i) => Some(*i as i64),
            Self::Int16(i) => Some(*i as i64),
            Self::Int32(i) => Some(*i as i64),
            Self::Int64(i) => Some(*i),
            Self::UInt64(u) => i64::try_from(*u).ok(),
            _ => None,
        }
    }

    /// Try to get this value as an f64.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float32(f) => Some(*f as f64),
            Self::Float64(f) => Some(*f),
            _ => None,
        }
    }

    /// Try to get this value as a string reference.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Try to get this value as a byte slice.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Bytes(b) => Some(b),
            Self::String(s) => Some(s.as_bytes()),
            _ => None,
        }
    }
}

macro_rules! impl_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for RowValue {
                fn from(v: $ty) -> Self {
                    Self::$variant(v)
                }
            }
        )*
    };
}

impl_from! {
    i8 => Int8,
    i16 => Int16,
    i32 => Int32,
    i64 => Int64,
    u64 => UInt64,
    Decimal => Decimal,
    f32 => Float32,
    f64 => Float64,
    String => String,
    Vec<u8> => Bytes,
}

impl From<&str> for RowValue {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl From<&[u8]> for RowValue {
    fn from(v: &[u8]) -> Self {
        Self::Bytes(v.to_vec())
    }
}

impl<T: Into<RowValue>> From<Option<T>> for RowValue {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Self::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_widening() {
        assert_eq!(RowValue::Int8(-3).as_i64(), Some(-3));
        assert_eq!(RowValue::UInt64(u64::MAX).as_i64(), None);
        assert_eq!(RowValue::Float32(0.5).as_f64(), Some(0.5));
        assert_eq!(RowValue::String("x".into()).as_bytes(), Some(&b"x"[..]));
    }

    #[test]
    fn test_from_option() {
        let v: RowValue = None::<i32>.into();
        assert!(v.is_null());
        let v: RowValue = Some("abc").into();
        assert_eq!(v, RowValue::String("abc".to_string()));
    }
}
