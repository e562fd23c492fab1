//! Values and column metadata delivered by the executor.

use chrono::{DateTime, FixedOffset};
use serde::Serialize;

use crate::scan::{ScanError, ScanValue};

/// One column value of a result row, as the driver delivered it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum DbValue {
    /// SQL NULL.
    Null,
    /// Boolean value.
    Bool(bool),
    /// Integer value.
    Int(i64),
    /// Floating point value.
    Float(f64),
    /// Text value.
    Text(String),
    /// Binary value.
    Bytes(Vec<u8>),
    /// Timestamp value.
    Timestamp(DateTime<FixedOffset>),
}

impl DbValue {
    /// Returns whether the value is NULL.
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Short name of the variant, used in error messages.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Null => "NULL",
            Self::Bool(_) => "bool",
            Self::Int(_) => "integer",
            Self::Float(_) => "float",
            Self::Text(_) => "text",
            Self::Bytes(_) => "bytes",
            Self::Timestamp(_) => "timestamp",
        }
    }
}

/// Metadata of one result column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnType {
    /// Column name as reported by the driver.
    pub name: String,
    /// Declared database type, e.g. `BIGINT` or `VARCHAR`. Empty when unknown.
    pub database_type_name: String,
    /// Whether the column may hold NULL, `None` when the driver cannot tell.
    pub nullable: Option<bool>,
}

impl ColumnType {
    /// Creates column metadata.
    #[must_use]
    pub fn new(name: impl Into<String>, database_type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            database_type_name: database_type_name.into(),
            nullable: None,
        }
    }

    /// Sets the nullability.
    #[must_use]
    pub const fn with_nullable(mut self, nullable: bool) -> Self {
        self.nullable = Some(nullable);
        self
    }

    /// Returns the family that decides how values of this column are read.
    #[must_use]
    pub fn family(&self) -> TypeFamily {
        TypeFamily::from_database_type(&self.database_type_name)
    }
}

/// Broad type family of a column, chosen from its declared type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeFamily {
    /// Integer types.
    Integer,
    /// Floating point and decimal types.
    Float,
    /// Boolean types.
    Bool,
    /// Character types.
    Text,
    /// Date and time types.
    Time,
    /// Everything else; values are kept as delivered.
    Raw,
}

impl TypeFamily {
    /// Classifies a declared database type name, ignoring case and any
    /// length or precision suffix such as `VARCHAR(255)`.
    #[must_use]
    pub fn from_database_type(name: &str) -> Self {
        let upper = name.trim().to_ascii_uppercase();
        let base = upper.split('(').next().unwrap_or_default().trim();
        let base = base.strip_suffix(" UNSIGNED").unwrap_or(base);
        match base {
            "TINYINT" | "SMALLINT" | "MEDIUMINT" | "INT" | "INTEGER" | "BIGINT" | "INT2"
            | "INT4" | "INT8" | "SERIAL" | "BIGSERIAL" | "SMALLSERIAL" => Self::Integer,
            "FLOAT" | "DOUBLE" | "DOUBLE PRECISION" | "REAL" | "DECIMAL" | "NUMERIC"
            | "FLOAT4" | "FLOAT8" => Self::Float,
            "BOOL" | "BOOLEAN" => Self::Bool,
            "CHAR" | "VARCHAR" | "TINYTEXT" | "TEXT" | "MEDIUMTEXT" | "LONGTEXT" | "BPCHAR"
            | "CHARACTER" | "CHARACTER VARYING" | "NAME" | "CLOB" => Self::Text,
            "DATE" | "TIME" | "YEAR" | "DATETIME" | "TIMESTAMP" | "TIMESTAMPTZ" => Self::Time,
            _ => Self::Raw,
        }
    }

    /// Converts `value` into the canonical variant of this family.
    ///
    /// NULL is rejected when `nullable` is `Some(false)`, except for raw
    /// columns which take anything.
    ///
    /// # Errors
    ///
    /// Returns a `ScanError` if the value does not convert into the family.
    pub fn read(self, value: DbValue, nullable: Option<bool>) -> Result<DbValue, ScanError> {
        if value.is_null() {
            return if nullable == Some(false) && self != Self::Raw {
                Err(ScanError::UnexpectedNull {
                    target: self.name(),
                })
            } else {
                Ok(DbValue::Null)
            };
        }
        match self {
            Self::Integer => i64::from_db_value(value).map(DbValue::Int),
            Self::Float => f64::from_db_value(value).map(DbValue::Float),
            Self::Bool => bool::from_db_value(value).map(DbValue::Bool),
            Self::Text => String::from_db_value(value).map(DbValue::Text),
            Self::Time => DateTime::<FixedOffset>::from_db_value(value).map(DbValue::Timestamp),
            Self::Raw => Ok(value),
        }
    }

    const fn name(self) -> &'static str {
        match self {
            Self::Integer => "integer",
            Self::Float => "float",
            Self::Bool => "bool",
            Self::Text => "text",
            Self::Time => "time",
            Self::Raw => "raw",
        }
    }
}
