//! Pool and transaction executors.

use oxide_sqly_core::{
    AnyDialect, Connection, ExecOutcome, Executor, Options, Result, Sqly, SqlyError, TxHandle,
};
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions, SqliteQueryResult};
use sqlx::{Sqlite, Transaction};
use tracing::{debug, info};

use crate::rows::SqliteRows;

/// Opens a pool for `options` and wraps it in a session.
///
/// The driver name must select the SQLite dialect. Zero limits keep the sqlx
/// defaults.
///
/// # Errors
///
/// Returns `SqlyError::Config` for another dialect, or the driver error if
/// the pool cannot be opened.
pub async fn connect(options: &Options) -> Result<Sqly<SqliteExecutor>> {
    let dialect = options.dialect()?;
    if dialect != AnyDialect::Sqlite {
        return Err(SqlyError::Config(format!(
            "driver `{}` is not handled by the SQLite adapter",
            options.driver_name
        )));
    }

    let mut pool_options = SqlitePoolOptions::new().max_lifetime(options.max_lifetime());
    if options.max_open_conns > 0 {
        pool_options = pool_options.max_connections(options.max_open_conns);
    }
    if options.max_idle_conns > 0 {
        pool_options = pool_options.min_connections(options.max_idle_conns);
    }

    let pool = pool_options
        .connect(&options.dsn)
        .await
        .map_err(SqlyError::driver)?;
    info!(dsn = %options.dsn, "connected to SQLite");
    Ok(Sqly::new(SqliteExecutor::new(pool), dialect))
}

/// Executor backed by a sqlx SQLite pool.
#[derive(Debug, Clone)]
pub struct SqliteExecutor {
    pool: SqlitePool,
}

impl SqliteExecutor {
    /// Wraps an existing pool.
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Returns the pool.
    #[must_use]
    pub const fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

impl Executor for SqliteExecutor {
    type Cursor = SqliteRows;
    type Outcome = SqliteOutcome;

    async fn execute(&mut self, statement: &str) -> Result<SqliteOutcome> {
        let result = sqlx::raw_sql(statement)
            .execute(&self.pool)
            .await
            .map_err(SqlyError::driver)?;
        Ok(SqliteOutcome(result))
    }

    async fn query(&mut self, statement: &str) -> Result<SqliteRows> {
        let rows = sqlx::raw_sql(statement)
            .fetch_all(&self.pool)
            .await
            .map_err(SqlyError::driver)?;
        Ok(SqliteRows::new(rows))
    }
}

impl Connection for SqliteExecutor {
    type Transaction = SqliteTx;

    async fn begin(&mut self) -> Result<SqliteTx> {
        let tx = self.pool.begin().await.map_err(SqlyError::driver)?;
        Ok(SqliteTx { tx })
    }
}

/// An open SQLite transaction. Dropping it rolls back.
pub struct SqliteTx {
    tx: Transaction<'static, Sqlite>,
}

impl Executor for SqliteTx {
    type Cursor = SqliteRows;
    type Outcome = SqliteOutcome;

    async fn execute(&mut self, statement: &str) -> Result<SqliteOutcome> {
        let result = sqlx::raw_sql(statement)
            .execute(&mut *self.tx)
            .await
            .map_err(SqlyError::driver)?;
        Ok(SqliteOutcome(result))
    }

    async fn query(&mut self, statement: &str) -> Result<SqliteRows> {
        let rows = sqlx::raw_sql(statement)
            .fetch_all(&mut *self.tx)
            .await
            .map_err(SqlyError::driver)?;
        Ok(SqliteRows::new(rows))
    }
}

impl TxHandle for SqliteTx {
    async fn commit(self) -> Result<()> {
        self.tx.commit().await.map_err(SqlyError::driver)?;
        debug!("SQLite transaction committed");
        Ok(())
    }

    async fn rollback(self) -> Result<()> {
        self.tx.rollback().await.map_err(SqlyError::driver)?;
        debug!("SQLite transaction rolled back");
        Ok(())
    }
}

/// Report of an executed statement.
#[derive(Debug)]
pub struct SqliteOutcome(SqliteQueryResult);

impl ExecOutcome for SqliteOutcome {
    fn last_insert_id(&self) -> Result<i64> {
        Ok(self.0.last_insert_rowid())
    }

    fn rows_affected(&self) -> Result<i64> {
        i64::try_from(self.0.rows_affected()).map_err(SqlyError::driver)
    }
}
