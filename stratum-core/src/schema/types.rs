//! Logical column types
//!
//! Types here are dialect independent. Concrete type names and default sizes
//! are chosen by the dialect that renders the column.

use crate::Error;
use std::fmt;
use std::str::FromStr;

/// Logical type of a column
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DataType {
    /// Variable-length string
    String,
    Char,
    TinyText,
    Text,
    MediumText,
    LongText,
    Binary,
    TinyBlob,
    Blob,
    MediumBlob,
    LongBlob,
    TinyInt,
    SmallInt,
    MediumInt,
    Int,
    BigInt,
    Float,
    Double,
    Decimal,
    Boolean,
    /// Textual UUID
    Uuid,
    Date,
    DateTime,
    Timestamp,
    Time,
    Year,
    Json,
    Geometry,
    Point,
    LineString,
    Polygon,
    /// One of the listed values
    Enum(Vec<String>),
    /// Any subset of the listed values
    Set(Vec<String>),
}

impl DataType {
    pub fn enumeration<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        DataType::Enum(values.into_iter().map(Into::into).collect())
    }

    pub fn set<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        DataType::Set(values.into_iter().map(Into::into).collect())
    }

    /// Name used in error messages and in `FromStr`
    pub fn name(&self) -> &'static str {
        match self {
            DataType::String => "string",
            DataType::Char => "char",
            DataType::TinyText => "tinytext",
            DataType::Text => "text",
            DataType::MediumText => "mediumtext",
            DataType::LongText => "longtext",
            DataType::Binary => "binary",
            DataType::TinyBlob => "tinyblob",
            DataType::Blob => "blob",
            DataType::MediumBlob => "mediumblob",
            DataType::LongBlob => "longblob",
            DataType::TinyInt => "tinyint",
            DataType::SmallInt => "smallint",
            DataType::MediumInt => "mediumint",
            DataType::Int => "int",
            DataType::BigInt => "bigint",
            DataType::Float => "float",
            DataType::Double => "double",
            DataType::Decimal => "decimal",
            DataType::Boolean => "boolean",
            DataType::Uuid => "uuid",
            DataType::Date => "date",
            DataType::DateTime => "datetime",
            DataType::Timestamp => "timestamp",
            DataType::Time => "time",
            DataType::Year => "year",
            DataType::Json => "json",
            DataType::Geometry => "geometry",
            DataType::Point => "point",
            DataType::LineString => "linestring",
            DataType::Polygon => "polygon",
            DataType::Enum(_) => "enum",
            DataType::Set(_) => "set",
        }
    }

    pub fn is_integer(&self) -> bool {
        matches!(
            self,
            DataType::TinyInt
                | DataType::SmallInt
                | DataType::MediumInt
                | DataType::Int
                | DataType::BigInt
        )
    }

    /// Types that carry a sign: integers and the floating/fixed point family
    ///
    /// Boolean is stored as a one-digit integer but is not treated as numeric.
    pub fn is_numeric(&self) -> bool {
        self.is_integer() || matches!(self, DataType::Float | DataType::Double | DataType::Decimal)
    }

    /// Types that accept a `(precision, scale)` pair
    pub fn has_precision(&self) -> bool {
        matches!(self, DataType::Float | DataType::Double | DataType::Decimal)
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DataType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let data_type = match s.trim().to_ascii_lowercase().as_str() {
            "string" | "varchar" => DataType::String,
            "char" => DataType::Char,
            "tinytext" => DataType::TinyText,
            "text" => DataType::Text,
            "mediumtext" => DataType::MediumText,
            "longtext" => DataType::LongText,
            "binary" => DataType::Binary,
            "tinyblob" => DataType::TinyBlob,
            "blob" => DataType::Blob,
            "mediumblob" => DataType::MediumBlob,
            "longblob" => DataType::LongBlob,
            "tinyint" => DataType::TinyInt,
            "smallint" => DataType::SmallInt,
            "mediumint" => DataType::MediumInt,
            "int" | "integer" => DataType::Int,
            "bigint" => DataType::BigInt,
            "float" => DataType::Float,
            "double" => DataType::Double,
            "decimal" => DataType::Decimal,
            "bool" | "boolean" => DataType::Boolean,
            "uuid" => DataType::Uuid,
            "date" => DataType::Date,
            "datetime" => DataType::DateTime,
            "timestamp" => DataType::Timestamp,
            "time" => DataType::Time,
            "year" => DataType::Year,
            "json" => DataType::Json,
            "geometry" => DataType::Geometry,
            "point" => DataType::Point,
            "linestring" => DataType::LineString,
            "polygon" => DataType::Polygon,
            "enum" | "set" => {
                return Err(Error::configuration(format!(
                    "column type '{}' needs its allowed values; use DataType::{}",
                    s.trim(),
                    if s.trim().eq_ignore_ascii_case("enum") { "enumeration" } else { "set" }
                )))
            }
            _ => return Err(Error::configuration(format!("Unknown column type '{}'", s))),
        };
        Ok(data_type)
    }
}

/// Explicit size of a column, overriding the dialect default
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnSize {
    /// Display width or character length: `varchar(80)`, `int(4)`
    Length(u32),
    /// Precision and scale: `decimal(10,2)`
    Precision(u32, u32),
}
