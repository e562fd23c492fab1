//! # oxide-sqly-core
//!
//! Statement formatting and result binding over any SQL driver.
//!
//! This crate provides:
//! - Positional `?` substitution with dialect-correct literals, `IN (...)`
//!   list expansion and multi-row `VALUES` batches
//! - Binding of result rows onto records, boxed records, maps and scalars,
//!   with nested records flattened into one column namespace
//! - A text codec for PostgreSQL-style arrays
//! - Transactions and affected-row reports over a small set of async
//!   collaborator traits that a driver adapter implements
//!
//! ## Formatting
//!
//! ```rust
//! use oxide_sqly_core::dialect::MySqlDialect;
//! use oxide_sqly_core::{args, build_batch, format_statement};
//!
//! let sql = format_statement(
//!     &MySqlDialect::new(),
//!     "SELECT * FROM user WHERE id=? AND status=?",
//!     &args![9, 1],
//! )
//! .unwrap();
//! assert_eq!(sql, "SELECT * FROM user WHERE id=9 AND status=1");
//!
//! let batch = build_batch(
//!     &MySqlDialect::new(),
//!     "INSERT INTO t (a,b) VALUES (?,?)",
//!     &[args![1, "x"], args![2, "y"]],
//! )
//! .unwrap();
//! assert_eq!(batch, "INSERT INTO t (a,b) VALUES (1,'x'),(2,'y');");
//! ```
//!
//! ## Binding
//!
//! Arguments are rendered as literals, not sent as bind parameters. Text is
//! escaped for the selected dialect, so the dialect must match the server.

pub mod affected;
pub mod array;
pub mod bind;
pub mod config;
pub mod dialect;
pub mod encode;
pub mod error;
pub mod executor;
pub mod mapping;
pub mod row;
pub mod scan;
pub mod session;
pub mod statement;
pub mod value;

pub use affected::Affected;
pub use bind::{fetch_all, fetch_first, fetch_into, fetch_one, FromRow, RowPlan, Shape};
pub use config::Options;
pub use dialect::{AnyDialect, Dialect, NullablePolicy};
pub use encode::encode_value;
pub use error::{Result, SqlyError};
pub use executor::{Connection, ExecOutcome, Executor, RowCursor, TxHandle};
pub use mapping::{map_columns, FieldPath, FieldTable, Record, ScanField};
pub use row::{ColumnType, DbValue, TypeFamily};
pub use scan::{ScanError, ScanValue};
pub use session::{Session, Sqly, Trans};
pub use statement::{build_batch, format_statement};
pub use value::{
    ArrayValue, NullBool, NullFloat64, NullInt32, NullInt64, NullString, NullTime, Nullable,
    SqlValue, ToSqlValue,
};
