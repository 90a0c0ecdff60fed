//! MySQL schema column type conversion.
//!
//! This module provides conversion from MySQL column types, as written in
//! DDL or returned by `information_schema.columns`, to [`ColumnType`].

use filter_core::ColumnType;
use mysql_statement::{tokenize, Token};

/// Convert a MySQL column type to [`ColumnType`].
///
/// # Arguments
///
/// * `data_type` - The MySQL data type name (e.g., "INT", "VARCHAR", "ENUM")
/// * `column_type` - The full column type string (e.g., "int(11) unsigned",
///   "enum('small','large')", "decimal(5,2)")
///
/// # Example
///
/// ```
/// use mysql_types::mysql_column_to_column_type;
/// use filter_core::ColumnType;
///
/// let ty = mysql_column_to_column_type("INT", "int(11)");
/// assert_eq!(ty, ColumnType::Int { unsigned: false });
///
/// let ty = mysql_column_to_column_type("TINYINT", "tinyint(3) unsigned");
/// assert_eq!(ty, ColumnType::TinyInt { unsigned: true });
/// ```
pub fn mysql_column_to_column_type(data_type: &str, column_type: &str) -> ColumnType {
    let lower = column_type.to_lowercase();
    let unsigned = lower.contains("unsigned") || lower.contains("zerofill");
    let args = extract_numeric_args(column_type);

    match data_type.to_uppercase().as_str() {
        // Numeric types
        "TINYINT" | "INT1" => ColumnType::TinyInt { unsigned },
        "BOOL" | "BOOLEAN" => ColumnType::TinyInt { unsigned: false },
        "SMALLINT" | "INT2" => ColumnType::SmallInt { unsigned },
        "MEDIUMINT" | "INT3" | "MIDDLEINT" => ColumnType::MediumInt { unsigned },
        "INT" | "INTEGER" | "INT4" => ColumnType::Int { unsigned },
        "BIGINT" | "INT8" => ColumnType::BigInt { unsigned },
        "SERIAL" => ColumnType::BigInt { unsigned: true },
        "DECIMAL" | "NUMERIC" | "DEC" | "FIXED" => ColumnType::Decimal {
            // MySQL caps precision at 65 and scale at 30
            precision: args.first().map(|p| (*p).min(65) as u8).unwrap_or(10),
            scale: args.get(1).map(|s| (*s).min(30) as u8).unwrap_or(0),
        },
        // FLOAT(p) with p > 24 is a DOUBLE
        "FLOAT" if args.len() == 1 && args[0] > 24 => ColumnType::Double,
        "FLOAT" | "FLOAT4" => ColumnType::Float,
        "DOUBLE" | "DOUBLE PRECISION" | "REAL" | "FLOAT8" => ColumnType::Double,
        "BIT" => ColumnType::Bit {
            width: args.first().map(|w| (*w).clamp(1, 64) as u8).unwrap_or(1),
        },

        // Date/Time types
        "DATE" => ColumnType::Date,
        "TIME" => ColumnType::Time,
        "DATETIME" => ColumnType::DateTime,
        "TIMESTAMP" => ColumnType::Timestamp,
        "YEAR" => ColumnType::Year,

        // Enumerations
        "ENUM" => ColumnType::Enum {
            values: extract_set_or_enum_values(column_type),
        },
        "SET" => ColumnType::Set {
            values: extract_set_or_enum_values(column_type),
        },

        // String types
        "CHAR" | "NCHAR" | "CHARACTER" => ColumnType::Char {
            length: args.first().copied().unwrap_or(1),
        },
        "VARCHAR" | "NVARCHAR" | "CHARACTER VARYING" | "CHAR VARYING" => match args.first() {
            Some(len) => ColumnType::VarChar { length: *len },
            None => ColumnType::Text,
        },
        "TINYTEXT" | "TEXT" | "MEDIUMTEXT" | "LONGTEXT" => ColumnType::Text,

        // Binary types
        "BINARY" => ColumnType::Binary {
            length: args.first().copied().unwrap_or(1),
        },
        "VARBINARY" => ColumnType::VarBinary {
            length: args.first().copied().unwrap_or(255),
        },
        "TINYBLOB" | "BLOB" | "MEDIUMBLOB" | "LONGBLOB" => ColumnType::Blob,

        // JSON
        "JSON" => ColumnType::Json,

        // Geometry types
        "GEOMETRY" | "POINT" | "LINESTRING" | "POLYGON" | "MULTIPOINT" | "MULTILINESTRING"
        | "MULTIPOLYGON" | "GEOMETRYCOLLECTION" | "GEOMCOLLECTION" => ColumnType::Geometry,

        // Fallback to Text for unknown types
        _ => ColumnType::Text,
    }
}

/// Numeric arguments of a column type.
///
/// E.g., "varchar(255)" -> [255], "decimal(10,2)" -> [10, 2], "text" -> []
fn extract_numeric_args(column_type: &str) -> Vec<u32> {
    let Some(start) = column_type.find('(') else {
        return Vec::new();
    };
    let Some(end) = column_type[start..].find(')') else {
        return Vec::new();
    };
    column_type[start + 1..start + end]
        .split(',')
        .map_while(|part| part.trim().parse().ok())
        .collect()
}

/// Extract values from a MySQL SET or ENUM column type string.
///
/// Labels are read with the SQL lexer, so quotes and commas inside a label
/// survive.
///
/// E.g., "set('a','b','c')" -> vec!["a", "b", "c"]
/// E.g., "enum('it''s','a,b')" -> vec!["it's", "a,b"]
pub fn extract_set_or_enum_values(column_type: &str) -> Vec<String> {
    let Some(start) = column_type.find('(') else {
        return Vec::new();
    };
    let Ok(tokens) = tokenize(&column_type[start..]) else {
        return Vec::new();
    };
    tokens
        .into_iter()
        .filter_map(|t| match t.token {
            Token::SingleQuotedString(s) | Token::DoubleQuotedString(s) => Some(s),
            _ => None,
        })
        .collect()
}
