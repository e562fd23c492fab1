//! Collaborator traits implemented by database drivers.
//!
//! These are the only suspension points of the crate. A driver adapter
//! implements them over its own connection and row types.

use crate::error::Result;
use crate::row::{ColumnType, DbValue};

/// Driver report of a statement that returns no rows.
pub trait ExecOutcome: Send + Sync {
    /// Id generated by the last insert, if the driver tracks one.
    ///
    /// # Errors
    ///
    /// Returns the driver error.
    fn last_insert_id(&self) -> Result<i64>;

    /// Number of rows changed.
    ///
    /// # Errors
    ///
    /// Returns the driver error.
    fn rows_affected(&self) -> Result<i64>;
}

/// A forward-only cursor over a result set.
#[allow(async_fn_in_trait)]
pub trait RowCursor {
    /// Column names, in result order.
    ///
    /// # Errors
    ///
    /// Returns the driver error.
    fn columns(&self) -> Result<Vec<String>>;

    /// Column metadata, in result order. May be empty if the driver has none.
    ///
    /// # Errors
    ///
    /// Returns the driver error.
    fn column_types(&self) -> Result<Vec<ColumnType>>;

    /// Advances to the next row; `false` once exhausted.
    ///
    /// # Errors
    ///
    /// Returns the driver error.
    async fn next(&mut self) -> Result<bool>;

    /// Reads the values of the current row.
    ///
    /// # Errors
    ///
    /// Returns the driver error.
    fn scan(&mut self) -> Result<Vec<DbValue>>;

    /// Releases the cursor. Called exactly once by the binder.
    ///
    /// # Errors
    ///
    /// Returns the driver error.
    async fn close(&mut self) -> Result<()>;
}

/// Something statements can be sent to: a connection or a transaction.
#[allow(async_fn_in_trait)]
pub trait Executor {
    /// Cursor type returned by [`Executor::query`].
    type Cursor: RowCursor;
    /// Report type returned by [`Executor::execute`].
    type Outcome: ExecOutcome + 'static;

    /// Runs a statement that returns no rows.
    ///
    /// # Errors
    ///
    /// Returns the driver error.
    async fn execute(&mut self, statement: &str) -> Result<Self::Outcome>;

    /// Runs a statement that returns rows.
    ///
    /// # Errors
    ///
    /// Returns the driver error.
    async fn query(&mut self, statement: &str) -> Result<Self::Cursor>;
}

/// A connection that can open transactions.
#[allow(async_fn_in_trait)]
pub trait Connection: Executor {
    /// Transaction handle type.
    type Transaction: TxHandle;

    /// Starts a transaction.
    ///
    /// # Errors
    ///
    /// Returns the driver error.
    async fn begin(&mut self) -> Result<Self::Transaction>;
}

/// An open transaction.
///
/// Implementations must roll back when dropped without commit or rollback.
#[allow(async_fn_in_trait)]
pub trait TxHandle: Executor {
    /// Commits the transaction.
    ///
    /// # Errors
    ///
    /// Returns the driver error.
    async fn commit(self) -> Result<()>;

    /// Rolls the transaction back.
    ///
    /// # Errors
    ///
    /// Returns the driver error.
    async fn rollback(self) -> Result<()>;
}
