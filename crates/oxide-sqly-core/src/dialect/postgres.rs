//! PostgreSQL dialect implementation.

use super::Dialect;

/// PostgreSQL dialect.
///
/// Assumes `standard_conforming_strings` is on, which has been the server
/// default since 9.1.
#[derive(Debug, Default, Clone, Copy)]
pub struct PostgresDialect;

impl PostgresDialect {
    /// Creates a new PostgreSQL dialect.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Dialect for PostgresDialect {
    fn name(&self) -> &'static str {
        "postgres"
    }

    fn quote_string(&self, s: &str) -> String {
        let doubled = s.replace('\'', "''");
        if s.contains('\\') {
            format!("E'{}'", doubled.replace('\\', "\\\\"))
        } else {
            format!("'{doubled}'")
        }
    }

    fn encode_bool(&self, b: bool) -> &'static str {
        if b {
            "'t'"
        } else {
            "'f'"
        }
    }

    fn encode_bytes(&self, bytes: &[u8]) -> String {
        format!("'\\x{}'", hex::encode(bytes))
    }

    fn supports_returning(&self) -> bool {
        true
    }

    fn supports_last_insert_id(&self) -> bool {
        false
    }
}
