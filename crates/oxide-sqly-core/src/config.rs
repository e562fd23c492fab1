//! Connection options.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::dialect::AnyDialect;
use crate::error::{Result, SqlyError};

/// Options used by driver adapters to open a pool.
///
/// Zero pool limits mean "driver default".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Options {
    /// Data source name, e.g. `sqlite::memory:`.
    pub dsn: String,
    /// Driver name, which also selects the dialect.
    pub driver_name: String,
    /// Idle connections kept open.
    pub max_idle_conns: u32,
    /// Upper bound on open connections.
    pub max_open_conns: u32,
    /// Maximum lifetime of a connection, in seconds.
    pub conn_max_life_time: u64,
}

impl Options {
    /// Creates options for `driver_name` and `dsn` with default limits.
    #[must_use]
    pub fn new(driver_name: impl Into<String>, dsn: impl Into<String>) -> Self {
        Self {
            dsn: dsn.into(),
            driver_name: driver_name.into(),
            ..Self::default()
        }
    }

    /// Parses options from JSON.
    ///
    /// # Errors
    ///
    /// Returns `SqlyError::Config` if the JSON does not describe options.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reads options from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns `SqlyError::Config` if the file cannot be read or parsed.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| SqlyError::Config(format!("reading {}: {e}", path.display())))?;
        Self::from_json(&json)
    }

    /// Resolves the dialect for the driver name.
    ///
    /// # Errors
    ///
    /// Returns `SqlyError::Config` for an unknown driver name.
    pub fn dialect(&self) -> Result<AnyDialect> {
        AnyDialect::from_driver_name(&self.driver_name)
    }

    /// Connection lifetime, `None` when unlimited.
    #[must_use]
    pub fn max_lifetime(&self) -> Option<Duration> {
        (self.conn_max_life_time > 0).then(|| Duration::from_secs(self.conn_max_life_time))
    }
}
