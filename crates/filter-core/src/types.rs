//! Column types as they appear on the MySQL wire protocol.
//!
//! `ColumnType` is the type universe the row filter binds predicates
//! against. It mirrors the protocol's column kinds closely enough that the
//! evaluator can interpret a decoded value (an enum ordinal, a set bitmask,
//! a JSON byte string) without consulting the source server.

use serde::{Deserialize, Serialize};

/// Column type of a table column.
///
/// # YAML Format
///
/// ```yaml
/// type:
///   type: int
///   unsigned: true
/// type:
///   type: enum
///   values: [small, medium, large]
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ColumnType {
    // Integer types
    /// 1-byte integer (MYSQL_TYPE_TINY)
    TinyInt {
        #[serde(default)]
        unsigned: bool,
    },

    /// 2-byte integer (MYSQL_TYPE_SHORT)
    SmallInt {
        #[serde(default)]
        unsigned: bool,
    },

    /// 3-byte integer (MYSQL_TYPE_INT24)
    MediumInt {
        #[serde(default)]
        unsigned: bool,
    },

    /// 4-byte integer (MYSQL_TYPE_LONG)
    Int {
        #[serde(default)]
        unsigned: bool,
    },

    /// 8-byte integer (MYSQL_TYPE_LONGLONG)
    BigInt {
        #[serde(default)]
        unsigned: bool,
    },

    // Exact numeric
    /// Fixed-point decimal (MYSQL_TYPE_NEWDECIMAL)
    Decimal {
        /// Total number of digits
        precision: u8,
        /// Number of digits after the decimal point
        scale: u8,
    },

    // Floating point
    /// 32-bit IEEE 754 (MYSQL_TYPE_FLOAT)
    Float,

    /// 64-bit IEEE 754 (MYSQL_TYPE_DOUBLE)
    Double,

    /// Bit field (MYSQL_TYPE_BIT)
    Bit {
        /// Number of bits, 1..=64
        width: u8,
    },

    // Temporal types
    Date,
    Time,
    DateTime,
    Timestamp,
    Year,

    /// Enumeration; decoded values are 1-based ordinals into `values`.
    Enum { values: Vec<String> },

    /// Set; decoded values are bitmasks over `values`.
    Set { values: Vec<String> },

    // Character strings
    Char {
        length: u32,
    },
    VarChar {
        length: u32,
    },
    Text,

    // Binary strings
    Binary {
        length: u32,
    },
    VarBinary {
        length: u32,
    },
    Blob,

    /// JSON document (MYSQL_TYPE_JSON), decoded as bytes
    Json,

    /// Spatial value, decoded as bytes
    Geometry,
}

impl ColumnType {
    /// Whether this is one of the fixed-width integer types.
    pub fn is_integer(&self) -> bool {
        matches!(
            self,
            Self::TinyInt { .. }
                | Self::SmallInt { .. }
                | Self::MediumInt { .. }
                | Self::Int { .. }
                | Self::BigInt { .. }
        )
    }

    /// Whether this is an unsigned integer type.
    pub fn is_unsigned(&self) -> bool {
        match self {
            Self::TinyInt { unsigned }
            | Self::SmallInt { unsigned }
            | Self::MediumInt { unsigned }
            | Self::Int { unsigned }
            | Self::BigInt { unsigned } => *unsigned,
            _ => false,
        }
    }

    /// Whether this is a date/time type.
    pub fn is_temporal(&self) -> bool {
        matches!(
            self,
            Self::Date | Self::Time | Self::DateTime | Self::Timestamp | Self::Year
        )
    }

    /// Whether values of this type are character strings.
    pub fn is_text(&self) -> bool {
        matches!(self, Self::Char { .. } | Self::VarChar { .. } | Self::Text)
    }

    /// Whether values of this type are binary strings.
    pub fn is_binary(&self) -> bool {
        matches!(
            self,
            Self::Binary { .. } | Self::VarBinary { .. } | Self::Blob | Self::Geometry
        )
    }

    /// Short SQL-ish name, used in error messages.
    pub fn name(&self) -> &'static str {
        match self {
            Self::TinyInt { .. } => "tinyint",
            Self::SmallInt { .. } => "smallint",
            Self::MediumInt { .. } => "mediumint",
            Self::Int { .. } => "int",
            Self::BigInt { .. } => "bigint",
            Self::Decimal { .. } => "decimal",
            Self::Float => "float",
            Self::Double => "double",
            Self::Bit { .. } => "bit",
            Self::Date => "date",
            Self::Time => "time",
            Self::DateTime => "datetime",
            Self::Timestamp => "timestamp",
            Self::Year => "year",
            Self::Enum { .. } => "enum",
            Self::Set { .. } => "set",
            Self::Char { .. } => "char",
            Self::VarChar { .. } => "varchar",
            Self::Text => "text",
            Self::Binary { .. } => "binary",
            Self::VarBinary { .. } => "varbinary",
            Self::Blob => "blob",
            Self::Json => "json",
            Self::Geometry => "geometry",
        }
    }
}

impl std::fmt::Display for ColumnType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Decimal { precision, scale } => write!(f, "decimal({precision},{scale})"),
            Self::Bit { width } => write!(f, "bit({width})"),
            Self::Char { length } => write!(f, "char({length})"),
            Self::VarChar { length } => write!(f, "varchar({length})"),
            Self::Binary { length } => write!(f, "binary({length})"),
            Self::VarBinary { length } => write!(f, "varbinary({length})"),
            other if other.is_unsigned() => write!(f, "{} unsigned", other.name()),
            other => f.write_str(other.name()),
        }
    }
}
