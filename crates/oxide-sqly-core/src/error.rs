//! Error types for statement formatting and result binding.
//!
//! Every variant is a stable kind: callers are expected to match on the
//! variant, not on the rendered message.

use crate::array::ArrayError;
use crate::scan::ScanError;

/// Boxed error coming from the underlying database driver.
pub type DriverError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors surfaced by the formatting and binding layer.
#[derive(Debug, thiserror::Error)]
pub enum SqlyError {
    /// Placeholder count does not match the argument count.
    #[error("query can't be formatted: {placeholders} placeholders for {arguments} arguments")]
    StatementFormat {
        /// Number of `?` markers found in the template.
        placeholders: usize,
        /// Number of arguments supplied.
        arguments: usize,
    },

    /// An argument has no literal encoding.
    #[error("invalid variable type for argument: {0}")]
    ArgumentType(String),

    /// The batch template has no single `(?, ...)` value group.
    #[error("sql statement syntax error: {0}")]
    StatementSyntax(String),

    /// The destination cannot receive the result set.
    #[error("invalid container for scanning: {0}")]
    InvalidContainer(String),

    /// A result column has no matching destination field.
    #[error("queried fields not match with struct fields: column `{column}` not exist")]
    FieldsMatch {
        /// The unmapped column.
        column: String,
    },

    /// A single-row query returned no rows.
    #[error("no result for get query")]
    EmptyResult,

    /// A single-row query returned more than one row.
    #[error("get more than one results for get query")]
    MultipleResults,

    /// A list argument was empty where `IN (...)` expansion was required.
    #[error("has empty array in query arguments")]
    EmptyArrayArgument,

    /// The operation is structurally unavailable for the active dialect.
    #[error("{operation} is not supported for the {dialect} dialect")]
    UnsupportedByDialect {
        /// What was attempted.
        operation: &'static str,
        /// The dialect name.
        dialect: &'static str,
    },

    /// A column value could not be converted into its destination.
    #[error("scanning column `{column}`: {source}")]
    Scan {
        /// The column being scanned.
        column: String,
        /// The conversion failure.
        #[source]
        source: ScanError,
    },

    /// Array text could not be encoded or decoded.
    #[error("array codec: {0}")]
    Array(#[from] ArrayError),

    /// Error reported by the executor collaborator.
    #[error("database error: {0}")]
    Driver(#[source] DriverError),

    /// One statement of a multi-statement execution failed.
    #[error("query: {statement}; error: {source}")]
    ExecMany {
        /// The failing statement.
        statement: String,
        /// Why it failed.
        #[source]
        source: Box<SqlyError>,
    },

    /// The row cursor failed to close after a successful bind.
    #[error("row cursor leaked, close failed after binding: {0}")]
    CursorLeak(#[source] Box<SqlyError>),

    /// Configuration could not be loaded or resolved.
    #[error("configuration error: {0}")]
    Config(String),
}

impl SqlyError {
    /// Wraps a driver error.
    #[must_use]
    pub fn driver<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Driver(Box::new(err))
    }

    /// Returns whether this is the empty list signal.
    ///
    /// Mutating calls return it instead of running a statement with `IN ()`;
    /// callers usually treat it as "nothing to do".
    #[must_use]
    pub const fn is_empty_array(&self) -> bool {
        matches!(self, Self::EmptyArrayArgument)
    }
}

impl From<serde_json::Error> for SqlyError {
    fn from(err: serde_json::Error) -> Self {
        Self::Config(err.to_string())
    }
}

/// Result type alias for this crate.
pub type Result<T> = std::result::Result<T, SqlyError>;
