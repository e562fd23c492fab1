//! Result sets read back from SQLite.

use oxide_sqly_core::{ColumnType, DbValue, Result, RowCursor, SqlyError};
use sqlx::sqlite::SqliteRow;
use sqlx::{Column, Row, TypeInfo, ValueRef};

/// Buffered rows of one query.
///
/// Column names come from the first row, so an empty result has no columns.
pub struct SqliteRows {
    columns: Vec<String>,
    column_types: Vec<ColumnType>,
    rows: std::vec::IntoIter<SqliteRow>,
    current: Option<SqliteRow>,
}

impl SqliteRows {
    pub(crate) fn new(rows: Vec<SqliteRow>) -> Self {
        let (columns, column_types) = rows.first().map_or_else(
            || (Vec::new(), Vec::new()),
            |row| {
                row.columns()
                    .iter()
                    .map(|c| {
                        (
                            c.name().to_string(),
                            ColumnType::new(c.name(), c.type_info().name()),
                        )
                    })
                    .unzip()
            },
        );
        Self {
            columns,
            column_types,
            rows: rows.into_iter(),
            current: None,
        }
    }
}

impl std::fmt::Debug for SqliteRows {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteRows")
            .field("columns", &self.columns)
            .field("remaining", &self.rows.len())
            .finish_non_exhaustive()
    }
}

impl RowCursor for SqliteRows {
    fn columns(&self) -> Result<Vec<String>> {
        Ok(self.columns.clone())
    }

    fn column_types(&self) -> Result<Vec<ColumnType>> {
        Ok(self.column_types.clone())
    }

    async fn next(&mut self) -> Result<bool> {
        self.current = self.rows.next();
        Ok(self.current.is_some())
    }

    fn scan(&mut self) -> Result<Vec<DbValue>> {
        let row = self.current.as_ref().ok_or_else(|| {
            SqlyError::InvalidContainer(String::from("scan called without a current row"))
        })?;
        (0..row.len())
            .map(|index| decode_value(row, index).map_err(SqlyError::driver))
            .collect()
    }

    async fn close(&mut self) -> Result<()> {
        self.current = None;
        self.rows = Vec::new().into_iter();
        Ok(())
    }
}

/// Decodes a column by the storage class of its value.
fn decode_value(row: &SqliteRow, index: usize) -> std::result::Result<DbValue, sqlx::Error> {
    let storage = {
        let raw = row.try_get_raw(index)?;
        if raw.is_null() {
            return Ok(DbValue::Null);
        }
        raw.type_info().name().to_ascii_uppercase()
    };
    let value = match storage.as_str() {
        "INTEGER" => DbValue::Int(row.try_get_unchecked(index)?),
        "REAL" => DbValue::Float(row.try_get_unchecked(index)?),
        "BLOB" => DbValue::Bytes(row.try_get_unchecked(index)?),
        "NULL" => DbValue::Null,
        _ => DbValue::Text(row.try_get_unchecked(index)?),
    };
    Ok(value)
}
