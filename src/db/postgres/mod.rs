//! PostgreSQL backend implementation.
//!
//! Uses the synchronous `postgres` client. One [`PgSession`] wraps one
//! `Client`; queries are prepared first so column headers are known even
//! when no rows come back.

mod conversion;

use std::time::Instant;

use ::postgres::config::SslMode as PgSslMode;
use ::postgres::types::ToSql;
use ::postgres::{CancelToken, Client, Config, NoTls};
use tracing::debug;

use super::backend::{Canceller, Connector, DriverError, RawColumn, RawResultSet, Session};
use super::config::{query_timeout_millis, ConnectionConfig, SslMode};
use super::value::Value;
use super::CONNECTION_NOT_AVAILABLE;

/// Opens PostgreSQL sessions.
#[derive(Debug, Clone, Copy, Default)]
pub struct PgConnector;

/// Server-side options for the session: the caller's `options` followed by
/// the statement timeout derived from the query timeout.
fn session_options(config: &ConnectionConfig) -> String {
    let timeout = format!(
        "-c statement_timeout={}",
        query_timeout_millis(config.query_timeout())
    );
    match config.options().map(str::trim) {
        Some(options) if !options.is_empty() => format!("{} {}", options, timeout),
        _ => timeout,
    }
}

/// Driver config for one session.
///
/// Besides the server-side statement timeout, a dead peer is detected on the
/// client side: unacknowledged writes are bounded by `tcp_user_timeout`, and
/// keepalive probes start after the query timeout unless `keepalives_idle`
/// says otherwise.
fn pg_config(config: &ConnectionConfig) -> Config {
    let query_timeout = config.query_timeout();
    let mut pg = Config::new();
    pg.host(config.host())
        .dbname(config.dbname())
        .user(config.user())
        .connect_timeout(config.connect_timeout())
        .options(&session_options(config))
        .keepalives(config.keepalives())
        .keepalives_idle(config.keepalives_idle().unwrap_or(query_timeout))
        .tcp_user_timeout(query_timeout)
        .ssl_mode(match config.ssl_mode() {
            SslMode::Disable => PgSslMode::Disable,
            SslMode::Prefer => PgSslMode::Prefer,
            SslMode::Require => PgSslMode::Require,
        });

    if let Some(password) = config.password() {
        pg.password(password.expose());
    }
    if let Some(port) = config.port() {
        pg.port(port);
    }
    if let Some(name) = config.application_name() {
        pg.application_name(name);
    }
    if let Some(interval) = config.keepalives_interval() {
        pg.keepalives_interval(interval);
    }
    if let Some(count) = config.keepalives_count() {
        pg.keepalives_retries(count);
    }
    pg
}

impl Connector for PgConnector {
    fn connect(&self, config: &ConnectionConfig) -> Result<Box<dyn Session>, DriverError> {
        let client = pg_config(config)
            .connect(NoTls)
            .map_err(|e| conversion::driver_error(&e))?;
        Ok(Box::new(PgSession {
            client: Some(client),
        }))
    }
}

/// One PostgreSQL session.
pub struct PgSession {
    client: Option<Client>,
}

impl PgSession {
    fn client(&mut self) -> Result<&mut Client, DriverError> {
        self.client
            .as_mut()
            .ok_or_else(|| DriverError::new(CONNECTION_NOT_AVAILABLE).lost())
    }
}

impl Session for PgSession {
    fn ping(&mut self) -> Result<(), DriverError> {
        self.client()?
            .simple_query("SELECT 1")
            .map(|_| ())
            .map_err(|e| conversion::driver_error(&e))
    }

    fn query(&mut self, sql: &str, params: &[Value]) -> Result<RawResultSet, DriverError> {
        let client = self.client()?;
        let start = Instant::now();

        let statement = client
            .prepare(sql)
            .map_err(|e| conversion::driver_error(&e))?;
        let columns: Vec<RawColumn> = statement
            .columns()
            .iter()
            .map(|c| RawColumn {
                name: c.name().to_string(),
                type_name: c.type_().name().to_string(),
            })
            .collect();

        let boxed = conversion::to_sql_params(params);
        let refs: Vec<&(dyn ToSql + Sync)> = boxed.iter().map(|b| b.as_ref()).collect();
        let rows = client
            .query(&statement, &refs)
            .map_err(|e| conversion::driver_error(&e))?;

        let rows = rows
            .iter()
            .map(|row| conversion::row_to_values(row, &columns))
            .collect::<Result<Vec<_>, _>>()?;

        debug!(
            "SQL returned {} rows in {}ms",
            rows.len(),
            start.elapsed().as_millis()
        );
        Ok(RawResultSet { columns, rows })
    }

    fn canceller(&self) -> Option<Box<dyn Canceller>> {
        self.client.as_ref().map(|client| {
            Box::new(PgCanceller {
                token: client.cancel_token(),
            }) as Box<dyn Canceller>
        })
    }

    fn close(&mut self) {
        if let Some(client) = self.client.take() {
            if let Err(e) = client.close() {
                debug!(error = %e, "Error while closing PostgreSQL session");
            }
        }
    }

    fn backend_name(&self) -> &'static str {
        "PostgreSQL"
    }
}

/// Sends a cancel request over a fresh connection to the server.
struct PgCanceller {
    token: CancelToken,
}

impl Canceller for PgCanceller {
    fn cancel(&self) -> Result<(), DriverError> {
        self.token
            .cancel_query(NoTls)
            .map_err(|e| conversion::driver_error(&e))
    }
}
