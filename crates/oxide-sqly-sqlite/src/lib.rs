//! # oxide-sqly-sqlite
//!
//! SQLite adapter for `oxide-sqly-core`.
//!
//! Statements arrive fully formatted, so they are sent through
//! [`sqlx::raw_sql`] without bind parameters and may contain several
//! `;`-separated statements.
//!
//! ```rust,ignore
//! use oxide_sqly_core::{args, Options, Session};
//!
//! let mut db = oxide_sqly_sqlite::connect(&Options::new("sqlite", "sqlite::memory:")).await?;
//! db.exec("CREATE TABLE t (id INTEGER PRIMARY KEY, name TEXT)", &[]).await?;
//! let affected = db.insert("INSERT INTO t (name) VALUES (?)", &args!["ada"]).await?;
//! assert_eq!(affected.last_insert_id()?, 1);
//! ```

mod executor;
mod rows;

pub use executor::{connect, SqliteExecutor, SqliteOutcome, SqliteTx};
pub use rows::SqliteRows;
