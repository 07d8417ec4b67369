//! The `Database` handle.

use tracing::debug;

use super::columnar::QueryResult;
use super::config::ConnectionConfig;
use super::connection::{self, CancelHandle, ConnectionState, LiveConnection};
use super::postgres::PgConnector;
use super::query;
use super::schema::{self, ALL_QUERIES, QueryDef};
use super::value::{Params, Value};
use super::{Connector, DbError};

/// A connected handle to the experiment-data store.
///
/// Construction parses the connection string and connects before returning,
/// so every `Database` a caller holds was live when it was handed out. It owns
/// exactly one connection; queries take `&mut self` so only one can be in
/// flight. After a connection-level failure every further query reports
/// "connection not available"; build a new `Database` to reconnect.
///
/// # Example
/// ```no_run
/// use mollerdb::db::Database;
///
/// let mut db = Database::new("host=localhost dbname=moller user=reader password=secret")?;
/// let results = db.get_main_detector_results(1000, 1100, "md1")?;
/// println!("{} rows", results.num_rows());
/// # Ok::<(), mollerdb::db::DbError>(())
/// ```
#[derive(Debug)]
pub struct Database {
    config: ConnectionConfig,
    connection: LiveConnection,
}

impl Database {
    /// Connect to PostgreSQL using a libpq-style connection string.
    ///
    /// # Errors
    ///
    /// [`DbError::Config`] if the string is rejected (nothing is sent over
    /// the network), [`DbError::Connection`] if connecting or the initial
    /// ping fails.
    pub fn new(connection_string: &str) -> Result<Self, DbError> {
        Self::with_connector(connection_string, &PgConnector)
    }

    /// Like [`Database::new`], opening the session through `connector`.
    pub fn with_connector(
        connection_string: &str,
        connector: &dyn Connector,
    ) -> Result<Self, DbError> {
        let config = ConnectionConfig::parse(connection_string)?;
        Self::from_config_with_connector(config, connector)
    }

    /// Connect to PostgreSQL with an already-parsed config.
    pub fn from_config(config: ConnectionConfig) -> Result<Self, DbError> {
        Self::from_config_with_connector(config, &PgConnector)
    }

    pub fn from_config_with_connector(
        config: ConnectionConfig,
        connector: &dyn Connector,
    ) -> Result<Self, DbError> {
        let connection = connection::connect(connector, &config)?;
        Ok(Self { config, connection })
    }

    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    pub fn state(&self) -> ConnectionState {
        self.connection.state()
    }

    pub fn is_connected(&self) -> bool {
        self.connection.is_connected()
    }

    pub fn backend_name(&self) -> Option<&'static str> {
        self.connection.backend_name()
    }

    /// A handle another thread can use to cancel the running query.
    pub fn cancel_handle(&self) -> Option<CancelHandle> {
        self.connection.cancel_handle()
    }

    /// Release the connection now rather than on drop. Idempotent.
    pub fn close(&mut self) {
        self.connection.close();
    }

    /// Every query this handle can run.
    pub fn catalog() -> &'static [QueryDef] {
        ALL_QUERIES
    }

    pub fn query_names() -> impl Iterator<Item = &'static str> {
        ALL_QUERIES.iter().map(|q| q.name)
    }

    /// Run a catalog query by name.
    pub fn execute(&mut self, query_name: &str, params: &Params) -> Result<QueryResult, DbError> {
        let result = query::run_query(&mut self.connection, query_name, params)?;
        debug!(
            query = query_name,
            rows = result.num_rows(),
            columns = result.num_columns(),
            "Built columnar result"
        );
        Ok(result)
    }

    /// Main detector results for runs in `[start_run, end_run]` for one detector.
    pub fn get_main_detector_results(
        &mut self,
        start_run: i64,
        end_run: i64,
        detector_name: &str,
    ) -> Result<QueryResult, DbError> {
        let params = Params::from([
            ("start_run".to_string(), Value::Int(start_run)),
            ("end_run".to_string(), Value::Int(end_run)),
            ("detector_name".to_string(), Value::from(detector_name)),
        ]);
        self.execute(schema::MAIN_DETECTOR_RESULTS.name, &params)
    }

    /// Run metadata for runs in `[start_run, end_run]`.
    pub fn get_runs(&mut self, start_run: i64, end_run: i64) -> Result<QueryResult, DbError> {
        let params = Params::from([
            ("start_run".to_string(), Value::Int(start_run)),
            ("end_run".to_string(), Value::Int(end_run)),
        ]);
        self.execute(schema::RUNS.name, &params)
    }
}
