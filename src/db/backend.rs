//! Driver seam: the traits a backing store implements.
//!
//! `Connector` opens sessions and `Session` runs SQL on one. The PostgreSQL
//! implementation lives in `postgres`; tests substitute a counting mock so
//! properties like "no network attempt" can be checked without a server.

use std::fmt;

use super::config::ConnectionConfig;
use super::value::Value;

/// Column header of a raw result set.
#[derive(Debug, Clone, PartialEq)]
pub struct RawColumn {
    pub name: String,
    /// Driver type name (e.g., "int8", "text")
    pub type_name: String,
}

/// Rows exactly as the driver produced them, before any typing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawResultSet {
    pub columns: Vec<RawColumn>,
    pub rows: Vec<Vec<Value>>,
}

impl RawResultSet {
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

/// A failure reported by the driver, before classification.
#[derive(Debug, Clone, PartialEq)]
pub struct DriverError {
    pub message: String,
    /// SQLSTATE code when the server supplied one
    pub code: Option<String>,
    /// The session can no longer be used
    pub connection_lost: bool,
}

impl DriverError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: None,
            connection_lost: false,
        }
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    pub fn lost(mut self) -> Self {
        self.connection_lost = true;
        self
    }
}

impl fmt::Display for DriverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.code {
            Some(code) => write!(f, "{} (SQLSTATE {})", self.message, code),
            None => f.write_str(&self.message),
        }
    }
}

impl std::error::Error for DriverError {}

/// Cancels the statement running on a session from another thread.
pub trait Canceller: Send + Sync {
    fn cancel(&self) -> Result<(), DriverError>;
}

/// One open session to the store.
///
/// Sessions are used by a single owner; nothing here is called concurrently.
pub trait Session: Send {
    /// Round-trip to prove the session is live.
    fn ping(&mut self) -> Result<(), DriverError>;

    /// Run `sql` with positional parameters `$1..$n` bound from `params`.
    fn query(&mut self, sql: &str, params: &[Value]) -> Result<RawResultSet, DriverError>;

    /// A handle that can cancel the in-flight statement, if supported.
    fn canceller(&self) -> Option<Box<dyn Canceller>> {
        None
    }

    /// Release the session. Called at most once by the connection manager.
    fn close(&mut self);

    /// Backend name for logging/debugging.
    fn backend_name(&self) -> &'static str;
}

/// Opens sessions from a validated config.
pub trait Connector {
    fn connect(&self, config: &ConnectionConfig) -> Result<Box<dyn Session>, DriverError>;
}
