//! Statement operations over a connection or a transaction.
//!
//! [`Session`] carries every operation once; [`Sqly`] runs them on a plain
//! connection and [`Trans`] inside an open transaction. Code that must work
//! in either takes `&mut impl Session`.

// Sessions are driven from the task that opened them.
#![allow(clippy::future_not_send)]

use futures::future::LocalBoxFuture;
use tracing::{debug, warn};

use crate::affected::Affected;
use crate::bind::{fetch_all, fetch_first, fetch_into, fetch_one, FromRow};
use crate::dialect::{AnyDialect, Dialect};
use crate::error::{Result, SqlyError};
use crate::executor::{Connection, Executor, TxHandle};
use crate::statement::{build_batch, format_statement};
use crate::value::SqlValue;

async fn run_execute<E: Executor>(
    executor: &mut E,
    dialect: AnyDialect,
    statement: &str,
) -> Result<Affected> {
    debug!(statement = %statement, dialect = dialect.name(), "executing statement");
    let outcome = executor.execute(statement).await?;
    Ok(Affected::new(outcome, dialect))
}

async fn run_query<E: Executor>(executor: &mut E, statement: &str) -> Result<E::Cursor> {
    debug!(statement = %statement, "querying");
    executor.query(statement).await
}

/// Runs `statements` one by one, stopping at the first failure.
async fn run_each<E, S>(executor: &mut E, statements: &[S]) -> Result<()>
where
    E: Executor,
    S: AsRef<str>,
{
    for statement in statements {
        let statement = statement.as_ref();
        debug!(statement = %statement, "executing statement");
        if let Err(source) = executor.execute(statement).await {
            return Err(SqlyError::ExecMany {
                statement: statement.to_string(),
                source: Box::new(source),
            });
        }
    }
    Ok(())
}

/// Formats `template` once per row and joins the statements with `;`.
fn join_rows<D, R>(dialect: &D, template: &str, rows: &[R]) -> Result<String>
where
    D: Dialect + ?Sized,
    R: AsRef<[SqlValue]>,
{
    if rows.is_empty() {
        return Err(SqlyError::EmptyArrayArgument);
    }
    let mut out = String::new();
    for row in rows {
        out.push_str(&format_statement(dialect, template, row.as_ref())?);
        out.push(';');
    }
    Ok(out)
}

/// Appends `RETURNING <id_field>` to a formatted statement.
fn with_returning(statement: &str, id_field: &str) -> String {
    let trimmed = statement.trim_end().trim_end_matches(';').trim_end();
    format!("{trimmed} RETURNING {id_field}")
}

/// Statement operations shared by connections and transactions.
///
/// Read operations treat an empty list argument as "no rows": `query`
/// returns an empty vector and `get` fails with [`SqlyError::EmptyResult`].
/// Mutating operations return [`SqlyError::EmptyArrayArgument`] without
/// running anything.
#[allow(async_fn_in_trait)]
pub trait Session {
    /// Executor the statements are sent to.
    type Executor: Executor;

    /// Dialect used to render arguments.
    fn dialect(&self) -> AnyDialect;

    /// Returns the executor.
    fn executor(&mut self) -> &mut Self::Executor;

    /// Runs a query and binds every row.
    ///
    /// # Errors
    ///
    /// Returns formatting, driver and binding errors.
    async fn query<T: FromRow>(&mut self, template: &str, args: &[SqlValue]) -> Result<Vec<T>> {
        let statement = match format_statement(&self.dialect(), template, args) {
            Ok(statement) => statement,
            Err(SqlyError::EmptyArrayArgument) => return Ok(Vec::new()),
            Err(e) => return Err(e),
        };
        let cursor = run_query(self.executor(), &statement).await?;
        fetch_all(cursor).await
    }

    /// Runs a query and appends every bound row to `dest`.
    ///
    /// # Errors
    ///
    /// Fails like [`Session::query`]; `dest` keeps its previous rows.
    async fn query_into<T: FromRow>(
        &mut self,
        dest: &mut Vec<T>,
        template: &str,
        args: &[SqlValue],
    ) -> Result<()> {
        let statement = match format_statement(&self.dialect(), template, args) {
            Ok(statement) => statement,
            Err(SqlyError::EmptyArrayArgument) => return Ok(()),
            Err(e) => return Err(e),
        };
        let cursor = run_query(self.executor(), &statement).await?;
        fetch_into(cursor, dest).await
    }

    /// Runs a query that must return exactly one row.
    ///
    /// # Errors
    ///
    /// Fails like [`Session::query`], with [`SqlyError::EmptyResult`] or
    /// [`SqlyError::MultipleResults`] on any other row count.
    async fn get<T: FromRow>(&mut self, template: &str, args: &[SqlValue]) -> Result<T> {
        let statement = match format_statement(&self.dialect(), template, args) {
            Ok(statement) => statement,
            Err(SqlyError::EmptyArrayArgument) => return Err(SqlyError::EmptyResult),
            Err(e) => return Err(e),
        };
        let cursor = run_query(self.executor(), &statement).await?;
        fetch_one(cursor).await
    }

    /// Runs one formatted statement.
    ///
    /// # Errors
    ///
    /// Returns formatting and driver errors.
    async fn exec(&mut self, template: &str, args: &[SqlValue]) -> Result<Affected> {
        let dialect = self.dialect();
        let statement = format_statement(&dialect, template, args)?;
        run_execute(self.executor(), dialect, &statement).await
    }

    /// Runs an `INSERT`.
    ///
    /// # Errors
    ///
    /// Fails like [`Session::exec`].
    async fn insert(&mut self, template: &str, args: &[SqlValue]) -> Result<Affected> {
        self.exec(template, args).await
    }

    /// Runs a multi-row `INSERT` built from a single `(?, ...)` group.
    ///
    /// # Errors
    ///
    /// Returns batch building and driver errors.
    async fn insert_many<R: AsRef<[SqlValue]>>(
        &mut self,
        template: &str,
        rows: &[R],
    ) -> Result<Affected> {
        let dialect = self.dialect();
        let statement = build_batch(&dialect, template, rows)?;
        run_execute(self.executor(), dialect, &statement).await
    }

    /// Runs an `UPDATE`.
    ///
    /// # Errors
    ///
    /// Fails like [`Session::exec`].
    async fn update(&mut self, template: &str, args: &[SqlValue]) -> Result<Affected> {
        self.exec(template, args).await
    }

    /// Formats `template` once per row and sends all statements at once.
    ///
    /// # Errors
    ///
    /// Returns [`SqlyError::EmptyArrayArgument`] for no rows, and formatting
    /// and driver errors.
    async fn update_many<R: AsRef<[SqlValue]>>(
        &mut self,
        template: &str,
        rows: &[R],
    ) -> Result<Affected> {
        let dialect = self.dialect();
        let statement = join_rows(&dialect, template, rows)?;
        run_execute(self.executor(), dialect, &statement).await
    }

    /// Runs a `DELETE`.
    ///
    /// # Errors
    ///
    /// Fails like [`Session::exec`].
    async fn delete(&mut self, template: &str, args: &[SqlValue]) -> Result<Affected> {
        self.exec(template, args).await
    }

    /// Runs raw statements in order; the first failure stops the run.
    ///
    /// # Errors
    ///
    /// Returns [`SqlyError::ExecMany`] naming the failed statement.
    async fn exec_many<S: AsRef<str>>(&mut self, statements: &[S]) -> Result<()> {
        run_each(self.executor(), statements).await
    }

    /// Runs a statement with `RETURNING <id_field>` and reads the id back.
    ///
    /// The id is taken from the first returned row; a statement touching
    /// several rows still succeeds. The returned report knows the id but not
    /// the row count.
    ///
    /// # Errors
    ///
    /// Returns [`SqlyError::UnsupportedByDialect`] on dialects without
    /// `RETURNING`, [`SqlyError::EmptyResult`] when no row comes back, and
    /// formatting, driver and binding errors.
    async fn exec_returning(
        &mut self,
        id_field: &str,
        template: &str,
        args: &[SqlValue],
    ) -> Result<Affected> {
        let dialect = self.dialect();
        if !dialect.supports_returning() {
            return Err(SqlyError::UnsupportedByDialect {
                operation: "RETURNING",
                dialect: dialect.name(),
            });
        }
        let statement = with_returning(&format_statement(&dialect, template, args)?, id_field);
        let cursor = run_query(self.executor(), &statement).await?;
        let id: i64 = fetch_first(cursor).await?;
        Ok(Affected::returning(id, dialect))
    }
}

/// Operations on a plain connection.
#[derive(Debug)]
pub struct Sqly<C> {
    conn: C,
    dialect: AnyDialect,
}

impl<C: Connection> Sqly<C> {
    /// Wraps a connection.
    #[must_use]
    pub const fn new(conn: C, dialect: AnyDialect) -> Self {
        Self { conn, dialect }
    }

    /// Returns the connection.
    #[must_use]
    pub const fn connection(&self) -> &C {
        &self.conn
    }

    /// Unwraps the connection.
    #[must_use]
    pub fn into_inner(self) -> C {
        self.conn
    }

    /// Starts a transaction.
    ///
    /// # Errors
    ///
    /// Returns the driver error.
    pub async fn begin(&mut self) -> Result<Trans<C::Transaction>> {
        debug!("beginning transaction");
        let tx = self.conn.begin().await?;
        Ok(Trans::new(tx, self.dialect))
    }

    /// Runs `f` in a transaction, committing if it returns `Ok` and rolling
    /// back otherwise.
    ///
    /// # Errors
    ///
    /// Returns the error of `f`, or the driver error of begin or commit.
    ///
    /// ```rust,ignore
    /// let id = db
    ///     .transaction(|tx| {
    ///         Box::pin(async move {
    ///             let affected = tx.insert("INSERT INTO t (a) VALUES (?)", &args![1]).await?;
    ///             affected.last_insert_id()
    ///         })
    ///     })
    ///     .await?;
    /// ```
    pub async fn transaction<F, R>(&mut self, f: F) -> Result<R>
    where
        F: for<'t> FnOnce(&'t mut Trans<C::Transaction>) -> LocalBoxFuture<'t, Result<R>>,
    {
        let mut tx = self.begin().await?;
        let outcome = f(&mut tx).await;
        match outcome {
            Ok(value) => {
                tx.commit().await?;
                Ok(value)
            }
            Err(e) => {
                if let Err(rollback_err) = tx.rollback().await {
                    warn!(error = %rollback_err, "rollback failed after transaction error");
                }
                Err(e)
            }
        }
    }
}

impl<C: Connection> Session for Sqly<C> {
    type Executor = C;

    fn dialect(&self) -> AnyDialect {
        self.dialect
    }

    fn executor(&mut self) -> &mut C {
        &mut self.conn
    }

    /// Runs raw statements inside a new transaction. The first failure rolls
    /// the transaction back and is reported with its statement.
    async fn exec_many<S: AsRef<str>>(&mut self, statements: &[S]) -> Result<()> {
        let mut tx = self.begin().await?;
        let outcome = run_each(&mut tx.tx, statements).await;
        match outcome {
            Ok(()) => tx.commit().await,
            Err(e) => {
                if let Err(rollback_err) = tx.rollback().await {
                    warn!(error = %rollback_err, "rollback failed after statement error");
                }
                Err(e)
            }
        }
    }
}

/// Operations inside an open transaction.
///
/// Dropping it without [`Trans::commit`] rolls the transaction back.
#[derive(Debug)]
pub struct Trans<T> {
    tx: T,
    dialect: AnyDialect,
}

impl<T: TxHandle> Trans<T> {
    /// Wraps a transaction handle.
    #[must_use]
    pub const fn new(tx: T, dialect: AnyDialect) -> Self {
        Self { tx, dialect }
    }

    /// Commits the transaction.
    ///
    /// # Errors
    ///
    /// Returns the driver error.
    pub async fn commit(self) -> Result<()> {
        debug!("committing transaction");
        self.tx.commit().await
    }

    /// Rolls the transaction back.
    ///
    /// # Errors
    ///
    /// Returns the driver error.
    pub async fn rollback(self) -> Result<()> {
        debug!("rolling back transaction");
        self.tx.rollback().await
    }
}

impl<T: TxHandle> Session for Trans<T> {
    type Executor = T;

    fn dialect(&self) -> AnyDialect {
        self.dialect
    }

    fn executor(&mut self) -> &mut T {
        &mut self.tx
    }
}
