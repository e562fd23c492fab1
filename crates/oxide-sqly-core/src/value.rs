//! Statement argument values.
//!
//! An argument is converted once into a [`SqlValue`] and rendered into a
//! literal by [`crate::encode::encode_value`]. The set of variants is closed so
//! the encoder can match on it exhaustively.

use chrono::{DateTime, FixedOffset, Local, NaiveDate, NaiveDateTime, TimeZone, Utc};

use crate::array::{
    ArrayElement, ArrayError, BoolArray, ByteaArray, Float32Array, Float64Array, GenericArray,
    Int32Array, Int64Array, StringArray,
};

/// A value that can be substituted for a `?` placeholder.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    /// NULL value.
    Null,
    /// Boolean value.
    Bool(bool),
    /// Signed integer of any width.
    Int(i64),
    /// Unsigned integer that may exceed `i64::MAX`.
    UInt(u64),
    /// Single precision float, rendered with 32-bit shortest form.
    Float32(f32),
    /// Double precision float.
    Float64(f64),
    /// Text value.
    Text(String),
    /// Binary value.
    Bytes(Vec<u8>),
    /// Point in time, rendered in its own offset.
    Timestamp(DateTime<FixedOffset>),
    /// Value with an explicit validity flag.
    Nullable {
        /// The wrapped value, meaningful when `valid` is set.
        inner: Box<SqlValue>,
        /// Whether the value is present.
        valid: bool,
    },
    /// Homogeneous list, rendered as `(a,b,c)` for `IN` clauses.
    List(Vec<SqlValue>),
    /// Array value rendered to the array text grammar.
    Array(ArrayValue),
}

impl SqlValue {
    /// Returns whether the value is the zero value of its kind.
    ///
    /// Used by the valid-or-nonzero nullable policy.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        match self {
            Self::Null => true,
            Self::Bool(b) => !*b,
            Self::Int(n) => *n == 0,
            Self::UInt(n) => *n == 0,
            Self::Float32(f) => *f == 0.0,
            Self::Float64(f) => *f == 0.0,
            Self::Text(s) => s.is_empty(),
            Self::Bytes(b) => b.is_empty(),
            Self::Timestamp(t) => *t == zero_time(),
            Self::Nullable { inner, valid } => !*valid && inner.is_zero(),
            Self::List(items) => items.is_empty(),
            Self::Array(_) => false,
        }
    }

    /// Short name of the variant, used in error messages.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::UInt(_) => "uint",
            Self::Float32(_) => "float32",
            Self::Float64(_) => "float64",
            Self::Text(_) => "text",
            Self::Bytes(_) => "bytes",
            Self::Timestamp(_) => "timestamp",
            Self::Nullable { .. } => "nullable",
            Self::List(_) => "list",
            Self::Array(_) => "array",
        }
    }
}

/// The zero timestamp, `0001-01-01 00:00:00 UTC`.
fn zero_time() -> DateTime<FixedOffset> {
    NaiveDate::from_ymd_opt(1, 1, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc().fixed_offset())
        .unwrap_or_default()
}

/// An array-codec value carried as an argument.
#[derive(Debug, Clone, PartialEq)]
pub enum ArrayValue {
    /// One-dimensional boolean array.
    Bool(BoolArray),
    /// One-dimensional `int4` array.
    Int32(Int32Array),
    /// One-dimensional `int8` array.
    Int64(Int64Array),
    /// One-dimensional `float4` array.
    Float32(Float32Array),
    /// One-dimensional `float8` array.
    Float64(Float64Array),
    /// One-dimensional text array.
    Text(StringArray),
    /// One-dimensional bytea array.
    Bytea(ByteaArray),
    /// Generic array, already rendered because its element type is erased.
    Generic(Result<String, ArrayError>),
}

impl ArrayValue {
    /// Renders the array text form, e.g. `{1,2,3}`.
    ///
    /// # Errors
    ///
    /// Returns the error a generic array hit while it was rendered.
    pub fn to_array_text(&self) -> Result<String, ArrayError> {
        match self {
            Self::Bool(a) => Ok(a.encode()),
            Self::Int32(a) => Ok(a.encode()),
            Self::Int64(a) => Ok(a.encode()),
            Self::Float32(a) => Ok(a.encode()),
            Self::Float64(a) => Ok(a.encode()),
            Self::Text(a) => Ok(a.encode()),
            Self::Bytea(a) => Ok(a.encode()),
            Self::Generic(rendered) => rendered.clone(),
        }
    }
}

/// A value with an explicit validity flag.
///
/// Unlike `Option<T>`, the inner value is kept when `valid` is false, which
/// matters for the valid-or-nonzero policy of the MySQL dialect.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Nullable<T> {
    /// The wrapped value.
    pub value: T,
    /// Whether the value is present.
    pub valid: bool,
}

impl<T> Nullable<T> {
    /// Creates a valid value.
    #[must_use]
    pub const fn new(value: T) -> Self {
        Self { value, valid: true }
    }

    /// Returns the value when valid.
    #[must_use]
    pub fn into_option(self) -> Option<T> {
        self.valid.then_some(self.value)
    }

    /// Returns a reference to the value when valid.
    #[must_use]
    pub const fn as_option(&self) -> Option<&T> {
        if self.valid {
            Some(&self.value)
        } else {
            None
        }
    }
}

impl<T: Default> Nullable<T> {
    /// Creates an invalid (NULL) value.
    #[must_use]
    pub fn null() -> Self {
        Self {
            value: T::default(),
            valid: false,
        }
    }
}

impl<T: Default> From<Option<T>> for Nullable<T> {
    fn from(value: Option<T>) -> Self {
        value.map_or_else(Self::null, Self::new)
    }
}

/// Nullable 64-bit integer.
pub type NullInt64 = Nullable<i64>;
/// Nullable 32-bit integer.
pub type NullInt32 = Nullable<i32>;
/// Nullable double.
pub type NullFloat64 = Nullable<f64>;
/// Nullable string.
pub type NullString = Nullable<String>;
/// Nullable boolean.
pub type NullBool = Nullable<bool>;
/// Nullable timestamp.
pub type NullTime = Nullable<NaiveDateTime>;

/// Trait for types that can be converted to SQL values.
pub trait ToSqlValue {
    /// Converts the value to a `SqlValue`.
    fn to_sql_value(self) -> SqlValue;
}

impl ToSqlValue for SqlValue {
    fn to_sql_value(self) -> SqlValue {
        self
    }
}

impl ToSqlValue for &SqlValue {
    fn to_sql_value(self) -> SqlValue {
        self.clone()
    }
}

impl ToSqlValue for bool {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Bool(self)
    }
}

macro_rules! signed_to_sql {
    ($($t:ty),*) => {
        $(impl ToSqlValue for $t {
            fn to_sql_value(self) -> SqlValue {
                SqlValue::Int(i64::from(self))
            }
        })*
    };
}

signed_to_sql!(i8, i16, i32, i64, u8, u16, u32);

impl ToSqlValue for isize {
    fn to_sql_value(self) -> SqlValue {
        i64::try_from(self).map_or_else(|_| SqlValue::Text(self.to_string()), SqlValue::Int)
    }
}

impl ToSqlValue for u64 {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::UInt(self)
    }
}

impl ToSqlValue for usize {
    fn to_sql_value(self) -> SqlValue {
        u64::try_from(self).map_or_else(|_| SqlValue::Text(self.to_string()), SqlValue::UInt)
    }
}

impl ToSqlValue for f32 {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Float32(self)
    }
}

impl ToSqlValue for f64 {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Float64(self)
    }
}

impl ToSqlValue for String {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Text(self)
    }
}

impl ToSqlValue for &str {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Text(String::from(self))
    }
}

impl ToSqlValue for &String {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Text(self.clone())
    }
}

impl ToSqlValue for Vec<u8> {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Bytes(self)
    }
}

impl ToSqlValue for &[u8] {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Bytes(self.to_vec())
    }
}

impl<Tz: TimeZone> ToSqlValue for DateTime<Tz> {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Timestamp(self.fixed_offset())
    }
}

impl ToSqlValue for NaiveDateTime {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Timestamp(self.and_utc().fixed_offset())
    }
}

impl ToSqlValue for NaiveDate {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Timestamp(self.and_time(chrono::NaiveTime::MIN).and_utc().fixed_offset())
    }
}

impl<T: ToSqlValue> ToSqlValue for Option<T> {
    fn to_sql_value(self) -> SqlValue {
        self.map_or(SqlValue::Null, ToSqlValue::to_sql_value)
    }
}

/// An invalid wrapper still holding `T::default()` carries a NULL inner value.
impl<T: ToSqlValue + Default + PartialEq> ToSqlValue for Nullable<T> {
    fn to_sql_value(self) -> SqlValue {
        let inner = if !self.valid && self.value == T::default() {
            SqlValue::Null
        } else {
            self.value.to_sql_value()
        };
        SqlValue::Nullable {
            inner: Box::new(inner),
            valid: self.valid,
        }
    }
}

fn list_of<T: ToSqlValue + Clone>(items: &[T]) -> SqlValue {
    SqlValue::List(items.iter().cloned().map(ToSqlValue::to_sql_value).collect())
}

macro_rules! list_to_sql {
    ($($t:ty),*) => {
        $(
            impl ToSqlValue for Vec<$t> {
                fn to_sql_value(self) -> SqlValue {
                    SqlValue::List(self.into_iter().map(ToSqlValue::to_sql_value).collect())
                }
            }

            impl ToSqlValue for &[$t] {
                fn to_sql_value(self) -> SqlValue {
                    list_of(self)
                }
            }

            impl<const N: usize> ToSqlValue for [$t; N] {
                fn to_sql_value(self) -> SqlValue {
                    SqlValue::List(self.into_iter().map(ToSqlValue::to_sql_value).collect())
                }
            }
        )*
    };
}

list_to_sql!(
    i8,
    i16,
    i32,
    i64,
    isize,
    u16,
    u32,
    u64,
    usize,
    f32,
    f64,
    bool,
    String,
    &str,
    NaiveDateTime,
    NaiveDate,
    DateTime<Utc>,
    DateTime<FixedOffset>,
    DateTime<Local>
);

macro_rules! array_to_sql {
    ($($t:ident => $variant:ident),*) => {
        $(impl ToSqlValue for $t {
            fn to_sql_value(self) -> SqlValue {
                SqlValue::Array(ArrayValue::$variant(self))
            }
        })*
    };
}

array_to_sql!(
    BoolArray => Bool,
    Int32Array => Int32,
    Int64Array => Int64,
    Float32Array => Float32,
    Float64Array => Float64,
    StringArray => Text,
    ByteaArray => Bytea
);

impl<T: ArrayElement> ToSqlValue for GenericArray<T> {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Array(ArrayValue::Generic(self.encode()))
    }
}

/// Builds a `Vec<SqlValue>` from heterogeneous Rust values.
///
/// ```rust
/// use oxide_sqly_core::{args, SqlValue};
///
/// let values = args![9, "active", None::<i64>];
/// assert_eq!(values[0], SqlValue::Int(9));
/// assert_eq!(values[2], SqlValue::Null);
/// ```
#[macro_export]
macro_rules! args {
    () => {
        ::std::vec::Vec::<$crate::SqlValue>::new()
    };
    ($($value:expr),+ $(,)?) => {
        ::std::vec![$($crate::ToSqlValue::to_sql_value($value)),+]
    };
}
