//! Binding of result sets onto destinations.
//!
//! A binding call owns the cursor: it reads the column list, plans the
//! destination once, scans every row, and closes the cursor on every exit.

// Cursors are driven from the task that opened them.
#![allow(clippy::future_not_send)]

use std::collections::HashMap;
use std::hash::BuildHasher;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, Utc};
use tracing::{debug, error, warn};

use crate::array::{
    ArrayElement, BoolArray, ByteaArray, Float32Array, Float64Array, GenericArray, Int32Array,
    Int64Array, StringArray,
};
use crate::error::{Result, SqlyError};
use crate::executor::RowCursor;
use crate::mapping::{map_columns, FieldPath, Record};
use crate::row::{ColumnType, DbValue, TypeFamily};
use crate::scan::{ScanError, ScanValue};
use crate::value::Nullable;

/// What kind of destination receives a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    /// A single value; the result must have exactly one column.
    Scalar,
    /// A record type.
    Struct,
    /// A boxed record type.
    BoxedStruct,
    /// A map from column name to value.
    Map,
}

/// Per-result-set plan, computed from the columns before the first row.
#[derive(Debug, Clone)]
pub struct RowPlan {
    columns: Vec<String>,
    target: PlanTarget,
}

#[derive(Debug, Clone)]
enum PlanTarget {
    Single,
    Fields(Vec<FieldPath>),
    Typed(Vec<ColumnType>),
}

impl RowPlan {
    /// Plans a single-value destination.
    ///
    /// # Errors
    ///
    /// Returns `SqlyError::InvalidContainer` unless there is exactly one column.
    pub fn for_scalar(columns: &[String]) -> Result<Self> {
        // A result without rows may come without columns as well.
        if !columns.is_empty() && columns.len() != 1 {
            return Err(SqlyError::InvalidContainer(format!(
                "scalar destination needs exactly one column, got {}",
                columns.len()
            )));
        }
        Ok(Self {
            columns: columns.to_vec(),
            target: PlanTarget::Single,
        })
    }

    /// Plans a record destination, resolving every column to a field.
    ///
    /// # Errors
    ///
    /// Returns `SqlyError::FieldsMatch` for a column with no field.
    pub fn for_record<T: Record>(columns: &[String]) -> Result<Self> {
        Ok(Self {
            columns: columns.to_vec(),
            target: PlanTarget::Fields(map_columns(columns, T::field_table())?),
        })
    }

    /// Plans a map destination from column metadata.
    ///
    /// Missing metadata falls back to raw values.
    #[must_use]
    pub fn for_map(columns: &[String], column_types: &[ColumnType]) -> Self {
        let types = if column_types.len() == columns.len() {
            column_types.to_vec()
        } else {
            columns.iter().map(|c| ColumnType::new(c.as_str(), "")).collect()
        };
        Self {
            columns: columns.to_vec(),
            target: PlanTarget::Typed(types),
        }
    }

    /// Column names of the result set.
    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    fn check_width(&self, values: &[DbValue]) -> Result<()> {
        if values.len() == self.columns.len() {
            Ok(())
        } else {
            Err(SqlyError::InvalidContainer(format!(
                "row has {} values for {} columns",
                values.len(),
                self.columns.len()
            )))
        }
    }

    fn scan_error(&self, index: usize, source: ScanError) -> SqlyError {
        SqlyError::Scan {
            column: self.columns.get(index).cloned().unwrap_or_default(),
            source,
        }
    }
}

/// A destination for one result row.
pub trait FromRow: Sized {
    /// Destination shape.
    const SHAPE: Shape;

    /// Plans the destination for a result set.
    ///
    /// # Errors
    ///
    /// Returns an error if the columns cannot fill the destination.
    fn plan(columns: &[String], column_types: &[ColumnType]) -> Result<RowPlan>;

    /// Builds a value from one row.
    ///
    /// # Errors
    ///
    /// Returns the first scan error of the row.
    fn from_row(plan: &RowPlan, values: Vec<DbValue>) -> Result<Self>;
}

/// Builds a single value from a one-column row.
///
/// # Errors
///
/// Returns `SqlyError::Scan` if the value does not convert.
pub fn scan_scalar<T: ScanValue>(plan: &RowPlan, values: Vec<DbValue>) -> Result<T> {
    let value = values.into_iter().next().ok_or_else(|| {
        SqlyError::InvalidContainer(String::from("scalar destination got an empty row"))
    })?;
    T::from_db_value(value).map_err(|e| plan.scan_error(0, e))
}

/// Builds a fresh record from a row, field by field.
///
/// # Errors
///
/// Returns `SqlyError::InvalidContainer` for a plan of another shape or a row
/// of the wrong width, and `SqlyError::Scan` for the first failing field.
pub fn scan_record<T: Record>(plan: &RowPlan, values: Vec<DbValue>) -> Result<T> {
    let PlanTarget::Fields(paths) = &plan.target else {
        return Err(SqlyError::InvalidContainer(String::from(
            "record destination used without a field plan",
        )));
    };
    plan.check_width(&values)?;
    let mut out = T::default();
    for (index, (path, value)) in paths.iter().zip(values).enumerate() {
        out.scan_field(path, value)
            .map_err(|e| plan.scan_error(index, e))?;
    }
    Ok(out)
}

macro_rules! scalar_from_row {
    ($($t:ty),* $(,)?) => {
        $(impl FromRow for $t {
            const SHAPE: Shape = Shape::Scalar;

            fn plan(columns: &[String], _column_types: &[ColumnType]) -> Result<RowPlan> {
                RowPlan::for_scalar(columns)
            }

            fn from_row(plan: &RowPlan, values: Vec<DbValue>) -> Result<Self> {
                scan_scalar(plan, values)
            }
        })*
    };
}

scalar_from_row!(
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

impl<T: ScanValue> FromRow for Option<T> {
    const SHAPE: Shape = Shape::Scalar;

    fn plan(columns: &[String], _column_types: &[ColumnType]) -> Result<RowPlan> {
        RowPlan::for_scalar(columns)
    }

    fn from_row(plan: &RowPlan, values: Vec<DbValue>) -> Result<Self> {
        scan_scalar(plan, values)
    }
}

impl<T: ScanValue + Default> FromRow for Nullable<T> {
    const SHAPE: Shape = Shape::Scalar;

    fn plan(columns: &[String], _column_types: &[ColumnType]) -> Result<RowPlan> {
        RowPlan::for_scalar(columns)
    }

    fn from_row(plan: &RowPlan, values: Vec<DbValue>) -> Result<Self> {
        scan_scalar(plan, values)
    }
}

impl<T: ArrayElement> FromRow for GenericArray<T> {
    const SHAPE: Shape = Shape::Scalar;

    fn plan(columns: &[String], _column_types: &[ColumnType]) -> Result<RowPlan> {
        RowPlan::for_scalar(columns)
    }

    fn from_row(plan: &RowPlan, values: Vec<DbValue>) -> Result<Self> {
        scan_scalar(plan, values)
    }
}

impl<T: Record> FromRow for Box<T> {
    const SHAPE: Shape = Shape::BoxedStruct;

    fn plan(columns: &[String], _column_types: &[ColumnType]) -> Result<RowPlan> {
        RowPlan::for_record::<T>(columns)
    }

    fn from_row(plan: &RowPlan, values: Vec<DbValue>) -> Result<Self> {
        scan_record(plan, values).map(Box::new)
    }
}

impl<S: BuildHasher + Default> FromRow for HashMap<String, DbValue, S> {
    const SHAPE: Shape = Shape::Map;

    fn plan(columns: &[String], column_types: &[ColumnType]) -> Result<RowPlan> {
        Ok(RowPlan::for_map(columns, column_types))
    }

    fn from_row(plan: &RowPlan, values: Vec<DbValue>) -> Result<Self> {
        let PlanTarget::Typed(types) = &plan.target else {
            return Err(SqlyError::InvalidContainer(String::from(
                "map destination used without column types",
            )));
        };
        plan.check_width(&values)?;
        let mut row = Self::with_capacity_and_hasher(values.len(), S::default());
        for (index, (column, value)) in types.iter().zip(values).enumerate() {
            let value = TypeFamily::from_database_type(&column.database_type_name)
                .read(value, column.nullable)
                .map_err(|e| plan.scan_error(index, e))?;
            row.insert(plan.columns[index].clone(), value);
        }
        Ok(row)
    }
}

fn plan_for<T: FromRow, C: RowCursor>(cursor: &C) -> Result<RowPlan> {
    let columns = cursor.columns()?;
    let column_types = cursor.column_types()?;
    debug!(shape = ?T::SHAPE, columns = columns.len(), "binding result set");
    T::plan(&columns, &column_types)
}

async fn collect_rows<T: FromRow, C: RowCursor>(cursor: &mut C, out: &mut Vec<T>) -> Result<()> {
    let plan = plan_for::<T, C>(cursor)?;
    while cursor.next().await? {
        let values = cursor.scan()?;
        out.push(T::from_row(&plan, values)?);
    }
    Ok(())
}

async fn leading_row<T: FromRow, C: RowCursor>(cursor: &mut C) -> Result<T> {
    let plan = plan_for::<T, C>(cursor)?;
    if !cursor.next().await? {
        return Err(SqlyError::EmptyResult);
    }
    T::from_row(&plan, cursor.scan()?)
}

async fn first_row<T: FromRow, C: RowCursor>(cursor: &mut C) -> Result<T> {
    let value = leading_row(cursor).await?;
    if cursor.next().await? {
        return Err(SqlyError::MultipleResults);
    }
    Ok(value)
}

/// Closes the cursor and merges the close outcome with the binding outcome.
///
/// An earlier error wins over a close error.
async fn finish<C: RowCursor, R>(cursor: &mut C, outcome: Result<R>) -> Result<R> {
    let closed = cursor.close().await;
    match (outcome, closed) {
        (Ok(value), Ok(())) => Ok(value),
        (Err(e), Ok(())) => Err(e),
        (Err(e), Err(close_err)) => {
            warn!(error = %close_err, "closing row cursor failed after an earlier error");
            Err(e)
        }
        (Ok(_), Err(close_err)) => {
            error!(error = %close_err, "row cursor could not be closed after binding");
            Err(SqlyError::CursorLeak(Box::new(close_err)))
        }
    }
}

/// Binds every row of `cursor` into a new vector.
///
/// # Errors
///
/// Returns the first planning, driver or scan error, or
/// `SqlyError::CursorLeak` if only closing the cursor failed.
pub async fn fetch_all<T: FromRow, C: RowCursor>(mut cursor: C) -> Result<Vec<T>> {
    let mut out = Vec::new();
    let outcome = collect_rows(&mut cursor, &mut out).await;
    finish(&mut cursor, outcome).await?;
    Ok(out)
}

/// Binds every row of `cursor` and appends them to `dest`.
///
/// When binding fails `dest` is truncated back to its previous length.
///
/// # Errors
///
/// Fails like [`fetch_all`].
pub async fn fetch_into<T: FromRow, C: RowCursor>(mut cursor: C, dest: &mut Vec<T>) -> Result<()> {
    let kept = dest.len();
    let outcome = collect_rows(&mut cursor, dest).await;
    let result = finish(&mut cursor, outcome).await;
    if result.is_err() {
        dest.truncate(kept);
    }
    result
}

/// Binds the only row of `cursor`.
///
/// No row is [`SqlyError::EmptyResult`]; a second row is detected without
/// being scanned and reported as [`SqlyError::MultipleResults`].
///
/// # Errors
///
/// Fails like [`fetch_all`], and on a row count other than one.
pub async fn fetch_one<T: FromRow, C: RowCursor>(mut cursor: C) -> Result<T> {
    let outcome = first_row(&mut cursor).await;
    finish(&mut cursor, outcome).await
}

/// Binds the first row of `cursor` and closes it without looking further.
///
/// No row is [`SqlyError::EmptyResult`]; any further rows are ignored.
///
/// # Errors
///
/// Fails like [`fetch_all`], and when there is no row.
pub async fn fetch_first<T: FromRow, C: RowCursor>(mut cursor: C) -> Result<T> {
    let outcome = leading_row(&mut cursor).await;
    finish(&mut cursor, outcome).await
}
