//! Conversion of column values into Rust destinations.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, Utc};

use crate::array::{
    parse_timestamp, ArrayElement, ArrayError, BoolArray, ByteaArray, Float32Array, Float64Array,
    GenericArray, Int32Array, Int64Array, StringArray,
};
use crate::row::DbValue;
use crate::value::Nullable;

/// Why a column value could not be stored in its destination.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ScanError {
    /// NULL reached a destination that cannot hold it.
    #[error("converting NULL to {target} is unsupported")]
    UnexpectedNull {
        /// Destination type.
        target: &'static str,
    },

    /// The value kind has no conversion to the destination.
    #[error("unsupported scan, storing {from} into {target}")]
    Unsupported {
        /// Kind of the column value.
        from: &'static str,
        /// Destination type.
        target: &'static str,
    },

    /// The value does not fit the destination.
    #[error("value {value} out of range for {target}")]
    OutOfRange {
        /// Rendered value.
        value: String,
        /// Destination type.
        target: &'static str,
    },

    /// Textual value could not be parsed.
    #[error("parsing {value:?} as {target}")]
    Parse {
        /// The text.
        value: String,
        /// Destination type.
        target: &'static str,
    },

    /// A field path does not lead to a field of the destination.
    #[error("no destination field at path {0:?}")]
    FieldPath(Vec<usize>),

    /// Array text could not be decoded.
    #[error(transparent)]
    Array(#[from] ArrayError),
}

/// A type that can be built from one column value.
pub trait ScanValue: Sized {
    /// Converts a column value.
    ///
    /// # Errors
    ///
    /// Returns a `ScanError` if the value has no conversion to `Self`.
    fn from_db_value(value: DbValue) -> Result<Self, ScanError>;
}

fn unsupported<T>(value: &DbValue, target: &'static str) -> Result<T, ScanError> {
    Err(if value.is_null() {
        ScanError::UnexpectedNull { target }
    } else {
        ScanError::Unsupported {
            from: value.kind(),
            target,
        }
    })
}

/// Returns the value as text when it is textual.
fn text_of(value: DbValue, target: &'static str) -> Result<String, ScanError> {
    match value {
        DbValue::Text(s) => Ok(s),
        DbValue::Bytes(b) => String::from_utf8(b).map_err(|e| ScanError::Parse {
            value: String::from_utf8_lossy(e.as_bytes()).into_owned(),
            target,
        }),
        other => unsupported(&other, target),
    }
}

fn parse_text<T: std::str::FromStr>(text: &str, target: &'static str) -> Result<T, ScanError> {
    text.trim().parse().map_err(|_| ScanError::Parse {
        value: text.to_string(),
        target,
    })
}

macro_rules! scan_integer {
    ($($t:ty),*) => {
        $(impl ScanValue for $t {
            fn from_db_value(value: DbValue) -> Result<Self, ScanError> {
                const TARGET: &str = stringify!($t);
                let out_of_range = |value: String| ScanError::OutOfRange {
                    value,
                    target: TARGET,
                };
                match value {
                    DbValue::Int(n) => <$t>::try_from(n).map_err(|_| out_of_range(n.to_string())),
                    DbValue::Float(f) if f.fract() == 0.0 && f.is_finite() => {
                        format!("{f:.0}").parse().map_err(|_| out_of_range(f.to_string()))
                    }
                    DbValue::Bool(b) => Ok(<$t>::from(b)),
                    DbValue::Text(_) | DbValue::Bytes(_) => {
                        parse_text(&text_of(value, TARGET)?, TARGET)
                    }
                    other => unsupported(&other, TARGET),
                }
            }
        })*
    };
}

scan_integer!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

impl ScanValue for f64 {
    fn from_db_value(value: DbValue) -> Result<Self, ScanError> {
        match value {
            DbValue::Float(f) => Ok(f),
            DbValue::Int(n) => parse_text(&n.to_string(), "f64"),
            DbValue::Text(_) | DbValue::Bytes(_) => parse_text(&text_of(value, "f64")?, "f64"),
            other => unsupported(&other, "f64"),
        }
    }
}

/// Narrowing rounds to the nearest `f32`; finite values past `f32::MAX` fail.
impl ScanValue for f32 {
    fn from_db_value(value: DbValue) -> Result<Self, ScanError> {
        match value {
            DbValue::Float(f) if f.is_finite() && f.abs() > f64::from(Self::MAX) => {
                Err(ScanError::OutOfRange {
                    value: f.to_string(),
                    target: "f32",
                })
            }
            DbValue::Float(f) => parse_text(&f.to_string(), "f32"),
            DbValue::Int(n) => parse_text(&n.to_string(), "f32"),
            DbValue::Text(_) | DbValue::Bytes(_) => parse_text(&text_of(value, "f32")?, "f32"),
            other => unsupported(&other, "f32"),
        }
    }
}

/// Parses the boolean spellings accepted by the driver layer.
fn parse_bool(text: &str) -> Option<bool> {
    match text.trim() {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Some(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Some(false),
        _ => None,
    }
}

impl ScanValue for bool {
    fn from_db_value(value: DbValue) -> Result<Self, ScanError> {
        match value {
            DbValue::Bool(b) => Ok(b),
            DbValue::Int(0) => Ok(false),
            DbValue::Int(1) => Ok(true),
            DbValue::Int(n) => Err(ScanError::OutOfRange {
                value: n.to_string(),
                target: "bool",
            }),
            DbValue::Text(_) | DbValue::Bytes(_) => {
                let text = text_of(value, "bool")?;
                parse_bool(&text).ok_or(ScanError::Parse {
                    value: text,
                    target: "bool",
                })
            }
            other => unsupported(&other, "bool"),
        }
    }
}

impl ScanValue for String {
    fn from_db_value(value: DbValue) -> Result<Self, ScanError> {
        match value {
            DbValue::Text(s) => Ok(s),
            DbValue::Bytes(_) => text_of(value, "String"),
            DbValue::Int(n) => Ok(n.to_string()),
            DbValue::Float(f) => Ok(f.to_string()),
            DbValue::Bool(b) => Ok(b.to_string()),
            DbValue::Timestamp(t) => Ok(t.to_rfc3339()),
            DbValue::Null => unsupported(&value, "String"),
        }
    }
}

impl ScanValue for Vec<u8> {
    fn from_db_value(value: DbValue) -> Result<Self, ScanError> {
        match value {
            DbValue::Bytes(b) => Ok(b),
            DbValue::Text(s) => Ok(s.into_bytes()),
            DbValue::Int(n) => Ok(n.to_string().into_bytes()),
            DbValue::Float(f) => Ok(f.to_string().into_bytes()),
            other => unsupported(&other, "Vec<u8>"),
        }
    }
}

/// Reads the textual time forms produced by common drivers.
fn parse_time_text(text: &str) -> Option<DateTime<FixedOffset>> {
    let text = text.trim();
    if let Ok(t) = DateTime::parse_from_rfc3339(text) {
        return Some(t);
    }
    for format in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(t) = NaiveDateTime::parse_from_str(text, format) {
            return Some(t.and_utc().fixed_offset());
        }
    }
    if let Ok(t) = parse_timestamp(text) {
        return Some(t);
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .map(|d| d.and_time(chrono::NaiveTime::MIN).and_utc().fixed_offset())
}

impl ScanValue for DateTime<FixedOffset> {
    fn from_db_value(value: DbValue) -> Result<Self, ScanError> {
        match value {
            DbValue::Timestamp(t) => Ok(t),
            DbValue::Text(_) | DbValue::Bytes(_) => {
                let text = text_of(value, "timestamp")?;
                parse_time_text(&text).ok_or(ScanError::Parse {
                    value: text,
                    target: "timestamp",
                })
            }
            other => unsupported(&other, "timestamp"),
        }
    }
}

impl ScanValue for DateTime<Utc> {
    fn from_db_value(value: DbValue) -> Result<Self, ScanError> {
        DateTime::<FixedOffset>::from_db_value(value).map(|t| t.with_timezone(&Utc))
    }
}

impl ScanValue for NaiveDateTime {
    fn from_db_value(value: DbValue) -> Result<Self, ScanError> {
        DateTime::<FixedOffset>::from_db_value(value).map(|t| t.naive_utc())
    }
}

impl ScanValue for NaiveDate {
    fn from_db_value(value: DbValue) -> Result<Self, ScanError> {
        DateTime::<FixedOffset>::from_db_value(value).map(|t| t.date_naive())
    }
}

impl ScanValue for DbValue {
    fn from_db_value(value: DbValue) -> Result<Self, ScanError> {
        Ok(value)
    }
}

impl<T: ScanValue> ScanValue for Option<T> {
    fn from_db_value(value: DbValue) -> Result<Self, ScanError> {
        match value {
            DbValue::Null => Ok(None),
            other => T::from_db_value(other).map(Some),
        }
    }
}

impl<T: ScanValue + Default> ScanValue for Nullable<T> {
    fn from_db_value(value: DbValue) -> Result<Self, ScanError> {
        match value {
            DbValue::Null => Ok(Self::null()),
            other => T::from_db_value(other).map(Self::new),
        }
    }
}

macro_rules! scan_array {
    ($($t:ident),*) => {
        $(impl ScanValue for $t {
            fn from_db_value(value: DbValue) -> Result<Self, ScanError> {
                let text = text_of(value, stringify!($t))?;
                Ok($t::decode(&text)?)
            }
        })*
    };
}

scan_array!(
    BoolArray,
    Int32Array,
    Int64Array,
    Float32Array,
    Float64Array,
    StringArray,
    ByteaArray
);

impl<T: ArrayElement> ScanValue for GenericArray<T> {
    fn from_db_value(value: DbValue) -> Result<Self, ScanError> {
        let text = text_of(value, "GenericArray")?;
        Ok(Self::decode(&text)?)
    }
}
