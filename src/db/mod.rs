//! Database connection and query layer for the experiment-data store.
//!
//! This module provides everything between a connection string and a typed
//! columnar table:
//! - Connection string parsing and validation (`config`)
//! - Connection establishment, liveness, teardown (`connection`)
//! - Named query execution against a fixed catalog (`query`, `schema`)
//! - Raw row to columnar table conversion (`columnar`)
//!
//! # Architecture
//!
//! `Database` owns one `LiveConnection`, which owns one driver `Session`.
//! Queries are looked up by name in the static catalog, their parameters are
//! checked against the declared signature, and only then is SQL sent. Rows
//! come back as untyped `Value`s and are placed into typed column buffers
//! according to the catalog's column declarations.
//!
//! # Error Taxonomy
//!
//! Every failure surfaces as exactly one `DbError`:
//! - `Config` - the connection string was rejected; nothing touched the network
//! - `Connection` - connecting or the initial ping failed
//! - `Query` - unknown query, bad parameters, driver failure, or a value that
//!   does not fit its declared column type
//!
//! Driver errors never cross this boundary unwrapped.

mod backend;
mod columnar;
mod config;
mod connection;
mod database;
pub mod postgres;
mod query;
pub mod schema;
mod value;

pub use backend::{Canceller, Connector, DriverError, RawColumn, RawResultSet, Session};
pub use columnar::{build, Column, ColumnValues, ColumnarBuilder, QueryResult};
pub use config::{
    query_timeout_millis, ConnectionConfig, Secret, SslMode, DEFAULT_CONNECT_TIMEOUT,
    DEFAULT_QUERY_TIMEOUT, MAX_QUERY_TIMEOUT_MS,
};
pub use connection::{connect, CancelHandle, ConnectionState, LiveConnection};
pub use database::Database;
pub use query::{execute, run_query};
pub use value::{Params, Value};

use std::fmt;

use thiserror::Error;

/// Message used whenever a query is attempted without a live connection.
pub const CONNECTION_NOT_AVAILABLE: &str = "connection not available";

/// Message used for names missing from the catalog.
pub const UNKNOWN_QUERY: &str = "unknown query";

/// Caller-facing error kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Config,
    Connection,
    Query,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ErrorKind::Config => "ConfigError",
            ErrorKind::Connection => "ConnectionError",
            ErrorKind::Query => "QueryError",
        })
    }
}

/// Database error types
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DbError {
    #[error("Invalid connection string: {message}")]
    Config { message: String },

    #[error("Failed to connect to database: {message}")]
    Connection { message: String, code: Option<String> },

    #[error("Query failed: {message}")]
    Query { message: String, code: Option<String> },
}

impl DbError {
    pub fn config(message: impl Into<String>) -> Self {
        DbError::Config {
            message: message.into(),
        }
    }

    pub fn connection(message: impl Into<String>) -> Self {
        DbError::Connection {
            message: message.into(),
            code: None,
        }
    }

    pub fn query(message: impl Into<String>) -> Self {
        DbError::Query {
            message: message.into(),
            code: None,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            DbError::Config { .. } => ErrorKind::Config,
            DbError::Connection { .. } => ErrorKind::Connection,
            DbError::Query { .. } => ErrorKind::Query,
        }
    }

    /// The message without the kind prefix.
    pub fn message(&self) -> &str {
        match self {
            DbError::Config { message }
            | DbError::Connection { message, .. }
            | DbError::Query { message, .. } => message,
        }
    }

    /// SQLSTATE reported by the server, if any.
    pub fn code(&self) -> Option<&str> {
        match self {
            DbError::Config { .. } => None,
            DbError::Connection { code, .. } | DbError::Query { code, .. } => code.as_deref(),
        }
    }

    pub(crate) fn connection_from(err: DriverError) -> Self {
        DbError::Connection {
            message: err.message,
            code: err.code,
        }
    }

    pub(crate) fn query_from(err: DriverError) -> Self {
        DbError::Query {
            message: err.message,
            code: err.code,
        }
    }
}
