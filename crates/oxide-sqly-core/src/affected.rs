//! Report of a statement that changed rows.

use std::fmt;
use std::sync::OnceLock;

use crate::dialect::{AnyDialect, Dialect};
use crate::error::{Result, SqlyError};
use crate::executor::ExecOutcome;

/// Rows-affected value marking a count that cannot be known.
const ROWS_UNSUPPORTED: i64 = -1;

/// Last insert id and rows-affected count of a statement.
///
/// Both are read lazily from the driver report and memoized after the first
/// successful read. Each can fail on its own.
pub struct Affected {
    outcome: Option<Box<dyn ExecOutcome>>,
    dialect: AnyDialect,
    last_insert_id: OnceLock<i64>,
    rows_affected: OnceLock<i64>,
}

impl Affected {
    /// Wraps the driver report of an executed statement.
    #[must_use]
    pub fn new<O: ExecOutcome + 'static>(outcome: O, dialect: AnyDialect) -> Self {
        Self {
            outcome: Some(Box::new(outcome)),
            dialect,
            last_insert_id: OnceLock::new(),
            rows_affected: OnceLock::new(),
        }
    }

    /// Builds the report of a `RETURNING` statement: the id is known and the
    /// row count is not.
    #[must_use]
    pub fn returning(id: i64, dialect: AnyDialect) -> Self {
        Self {
            outcome: None,
            dialect,
            last_insert_id: OnceLock::from(id),
            rows_affected: OnceLock::from(ROWS_UNSUPPORTED),
        }
    }

    /// Returns the id generated by the statement.
    ///
    /// PostgreSQL reports no insert id; use `exec_returning` there.
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedByDialect` when the dialect has no insert id, or the
    /// driver error of the first failed read.
    pub fn last_insert_id(&self) -> Result<i64> {
        if let Some(id) = self.last_insert_id.get() {
            return Ok(*id);
        }
        if !self.dialect.supports_last_insert_id() {
            return Err(self.unsupported("last insert id"));
        }
        let id = self.outcome()?.last_insert_id()?;
        Ok(*self.last_insert_id.get_or_init(|| id))
    }

    /// Returns the number of rows changed by the statement.
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedByDialect` after `RETURNING`, or the driver error of
    /// the first failed read.
    pub fn rows_affected(&self) -> Result<i64> {
        match self.rows_affected.get() {
            Some(&ROWS_UNSUPPORTED) => Err(self.unsupported("rows affected")),
            Some(n) => Ok(*n),
            None => {
                let n = self.outcome()?.rows_affected()?;
                Ok(*self.rows_affected.get_or_init(|| n))
            }
        }
    }

    fn outcome(&self) -> Result<&dyn ExecOutcome> {
        self.outcome
            .as_deref()
            .ok_or_else(|| self.unsupported("driver report"))
    }

    fn unsupported(&self, operation: &'static str) -> SqlyError {
        SqlyError::UnsupportedByDialect {
            operation,
            dialect: self.dialect.name(),
        }
    }
}

impl fmt::Debug for Affected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Affected")
            .field("dialect", &self.dialect)
            .field("last_insert_id", &self.last_insert_id.get())
            .field("rows_affected", &self.rows_affected.get())
            .finish_non_exhaustive()
    }
}
