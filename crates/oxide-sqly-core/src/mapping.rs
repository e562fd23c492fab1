//! Column-to-field mapping.
//!
//! A record type publishes a field table: every column name it can receive,
//! with the path of declared field indices leading to the field. Nested
//! records are flattened into the parent table, so `SELECT id, street` binds
//! onto `User { id, address: Address { street } }` without aliases.
//!
//! Tables are normally generated by `#[derive(Record)]`.

use std::collections::HashMap;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, Utc};

use crate::array::{
    ArrayElement, BoolArray, ByteaArray, Float32Array, Float64Array, GenericArray, Int32Array,
    Int64Array, StringArray,
};
use crate::error::{Result, SqlyError};
use crate::row::DbValue;
use crate::scan::{ScanError, ScanValue};
use crate::value::Nullable;

/// Declared field indices from the outer record down to a leaf.
pub type FieldPath = Vec<usize>;

/// Column names of a record type and the field each one lands in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldTable {
    paths: HashMap<String, FieldPath>,
}

impl FieldTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `name`. A later registration of the same name replaces it.
    pub fn insert(&mut self, name: impl Into<String>, path: FieldPath) {
        self.paths.insert(name.into(), path);
    }

    /// Returns the path registered for `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&FieldPath> {
        self.paths.get(name)
    }

    /// Returns the number of names.
    #[must_use]
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    /// Returns whether the table is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Iterates over names and paths in no particular order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &FieldPath)> {
        self.paths.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// A struct whose fields receive result columns.
pub trait Record: Default {
    /// Returns the table of this type, built once and cached.
    fn field_table() -> &'static FieldTable;

    /// Adds every field of this type to `table`, below `prefix`.
    fn register_fields(prefix: &mut Vec<usize>, table: &mut FieldTable);

    /// Stores `value` into the field at `path`.
    ///
    /// # Errors
    ///
    /// Returns `ScanError::FieldPath` for an unknown path, or the conversion
    /// error of the value.
    fn scan_field(&mut self, path: &[usize], value: DbValue) -> std::result::Result<(), ScanError>;
}

/// A field type: either a leaf receiving one column or a nested record.
pub trait ScanField {
    /// Registers this field under `name` at `path`.
    fn register(name: &str, path: &mut Vec<usize>, table: &mut FieldTable);

    /// Stores `value` at `path` relative to this field.
    ///
    /// # Errors
    ///
    /// Fails like [`Record::scan_field`].
    fn scan_at(&mut self, path: &[usize], value: DbValue) -> std::result::Result<(), ScanError>;
}

/// Leaf registration used by [`impl_scan_leaf!`].
pub fn register_leaf(name: &str, path: &[usize], table: &mut FieldTable) {
    table.insert(name, path.to_vec());
}

/// Leaf scan used by [`impl_scan_leaf!`].
///
/// # Errors
///
/// Returns `ScanError::FieldPath` when `path` goes below a leaf, or the
/// conversion error of the value.
pub fn scan_leaf<T: ScanValue>(
    slot: &mut T,
    path: &[usize],
    value: DbValue,
) -> std::result::Result<(), ScanError> {
    if !path.is_empty() {
        return Err(ScanError::FieldPath(path.to_vec()));
    }
    *slot = T::from_db_value(value)?;
    Ok(())
}

/// Implements [`ScanField`] as a leaf for types that implement [`ScanValue`].
///
/// ```rust
/// use oxide_sqly_core::scan::{ScanError, ScanValue};
/// use oxide_sqly_core::{impl_scan_leaf, DbValue};
///
/// #[derive(Default)]
/// struct Cents(i64);
///
/// impl ScanValue for Cents {
///     fn from_db_value(value: DbValue) -> Result<Self, ScanError> {
///         i64::from_db_value(value).map(Cents)
///     }
/// }
///
/// impl_scan_leaf!(Cents);
/// ```
#[macro_export]
macro_rules! impl_scan_leaf {
    ($($t:ty),* $(,)?) => {
        $(impl $crate::mapping::ScanField for $t {
            fn register(
                name: &str,
                path: &mut ::std::vec::Vec<usize>,
                table: &mut $crate::mapping::FieldTable,
            ) {
                $crate::mapping::register_leaf(name, path, table);
            }

            fn scan_at(
                &mut self,
                path: &[usize],
                value: $crate::DbValue,
            ) -> ::std::result::Result<(), $crate::scan::ScanError> {
                $crate::mapping::scan_leaf(self, path, value)
            }
        })*
    };
}

impl_scan_leaf!(
    bool,
    i8,
    i16,
    i32,
    i64,
    isize,
    u8,
    u16,
    u32,
    u64,
    usize,
    f32,
    f64,
    String,
    Vec<u8>,
    NaiveDateTime,
    NaiveDate,
    DateTime<Utc>,
    DateTime<FixedOffset>,
    DbValue,
    BoolArray,
    Int32Array,
    Int64Array,
    Float32Array,
    Float64Array,
    StringArray,
    ByteaArray,
);

impl<T: ScanValue + Default> ScanField for Nullable<T> {
    fn register(name: &str, path: &mut Vec<usize>, table: &mut FieldTable) {
        register_leaf(name, path, table);
    }

    fn scan_at(&mut self, path: &[usize], value: DbValue) -> std::result::Result<(), ScanError> {
        scan_leaf(self, path, value)
    }
}

impl<T: ArrayElement> ScanField for GenericArray<T> {
    fn register(name: &str, path: &mut Vec<usize>, table: &mut FieldTable) {
        register_leaf(name, path, table);
    }

    fn scan_at(&mut self, path: &[usize], value: DbValue) -> std::result::Result<(), ScanError> {
        scan_leaf(self, path, value)
    }
}

/// `Option<T>` is NULL-able as a leaf. As a nested record it stays `None`
/// until a non-NULL column reaches one of its fields.
impl<T: ScanField + Default> ScanField for Option<T> {
    fn register(name: &str, path: &mut Vec<usize>, table: &mut FieldTable) {
        T::register(name, path, table);
    }

    fn scan_at(&mut self, path: &[usize], value: DbValue) -> std::result::Result<(), ScanError> {
        if value.is_null() {
            if path.is_empty() {
                *self = None;
            }
            return match self {
                Some(inner) if !path.is_empty() => inner.scan_at(path, value),
                _ => Ok(()),
            };
        }
        self.get_or_insert_with(T::default).scan_at(path, value)
    }
}

impl<T: ScanField> ScanField for Box<T> {
    fn register(name: &str, path: &mut Vec<usize>, table: &mut FieldTable) {
        T::register(name, path, table);
    }

    fn scan_at(&mut self, path: &[usize], value: DbValue) -> std::result::Result<(), ScanError> {
        (**self).scan_at(path, value)
    }
}

/// Resolves every column against `table`, in column order.
///
/// All columns must be known; the first unknown one is reported as
/// [`SqlyError::FieldsMatch`]. Fields without a column keep their default.
///
/// # Errors
///
/// Returns `SqlyError::FieldsMatch` for the first column with no field.
pub fn map_columns<S: AsRef<str>>(columns: &[S], table: &FieldTable) -> Result<Vec<FieldPath>> {
    columns
        .iter()
        .map(|column| {
            let column = column.as_ref();
            table
                .get(column)
                .cloned()
                .ok_or_else(|| SqlyError::FieldsMatch {
                    column: column.to_string(),
                })
        })
        .collect()
}
