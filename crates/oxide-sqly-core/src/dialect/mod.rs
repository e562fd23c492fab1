//! SQL dialect support.
//!
//! A dialect decides how literals are spelled when arguments are rendered
//! into a statement, and which driver-level features exist.

mod legacy;
mod mysql;
mod postgres;
mod sqlite;

pub use legacy::LegacyDialect;
pub use mysql::MySqlDialect;
pub use postgres::PostgresDialect;
pub use sqlite::SqliteDialect;

use crate::error::{Result, SqlyError};

/// How a [`crate::Nullable`] wrapper decides that it holds a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NullablePolicy {
    /// Present only when the valid flag is set.
    Strict,
    /// Present when the valid flag is set or the inner value is non-zero.
    ///
    /// Boolean wrappers are always strict.
    ValidOrNonZero,
}

/// Trait for SQL dialect-specific behavior.
pub trait Dialect {
    /// Returns the name of the dialect.
    fn name(&self) -> &'static str;

    /// Quotes a string literal, escaping as the dialect requires.
    fn quote_string(&self, s: &str) -> String {
        format!("'{}'", s.replace('\'', "''"))
    }

    /// Returns the literal for a boolean.
    fn encode_bool(&self, b: bool) -> &'static str {
        if b {
            "1"
        } else {
            "0"
        }
    }

    /// Returns the literal for a binary value.
    fn encode_bytes(&self, bytes: &[u8]) -> String {
        format!("X'{}'", hex::encode(bytes))
    }

    /// Returns whether the dialect supports RETURNING clause.
    fn supports_returning(&self) -> bool {
        false
    }

    /// Returns whether the driver reports the last inserted id.
    fn supports_last_insert_id(&self) -> bool {
        true
    }

    /// Returns the nullable wrapper policy.
    fn nullable_policy(&self) -> NullablePolicy {
        NullablePolicy::Strict
    }
}

/// One of the built-in dialects, chosen at runtime from a driver name.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum AnyDialect {
    /// Double-quoted literals, kept for statements written against it.
    Legacy,
    /// MySQL and MariaDB.
    #[default]
    MySql,
    /// PostgreSQL.
    Postgres,
    /// SQLite.
    Sqlite,
}

impl AnyDialect {
    /// Resolves the dialect for a driver name.
    ///
    /// Accepts `mysql`, `postgres`, `postgresql`, `pgx`, `sqlite`, `sqlite3`
    /// and `legacy`, ignoring ASCII case.
    ///
    /// # Errors
    ///
    /// Returns `SqlyError::Config` for any other name.
    pub fn from_driver_name(driver: &str) -> Result<Self> {
        match driver.to_ascii_lowercase().as_str() {
            "mysql" => Ok(Self::MySql),
            "postgres" | "postgresql" | "pgx" => Ok(Self::Postgres),
            "sqlite" | "sqlite3" => Ok(Self::Sqlite),
            "legacy" => Ok(Self::Legacy),
            other => Err(SqlyError::Config(format!("unknown driver name `{other}`"))),
        }
    }

    const fn inner(self) -> &'static dyn Dialect {
        match self {
            Self::Legacy => &LegacyDialect,
            Self::MySql => &MySqlDialect,
            Self::Postgres => &PostgresDialect,
            Self::Sqlite => &SqliteDialect,
        }
    }
}

impl Dialect for AnyDialect {
    fn name(&self) -> &'static str {
        self.inner().name()
    }

    fn quote_string(&self, s: &str) -> String {
        self.inner().quote_string(s)
    }

    fn encode_bool(&self, b: bool) -> &'static str {
        self.inner().encode_bool(b)
    }

    fn encode_bytes(&self, bytes: &[u8]) -> String {
        self.inner().encode_bytes(bytes)
    }

    fn supports_returning(&self) -> bool {
        self.inner().supports_returning()
    }

    fn supports_last_insert_id(&self) -> bool {
        self.inner().supports_last_insert_id()
    }

    fn nullable_policy(&self) -> NullablePolicy {
        self.inner().nullable_policy()
    }
}
