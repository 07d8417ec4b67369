//! Database connection management.
//!
//! A [`LiveConnection`] is only ever handed out after the session answered a
//! ping. It stays `Connected` until it is closed or a query reports that the
//! session is gone, at which point it moves to `Closed` or `Failed` for good;
//! there is no reconnect.

use std::fmt;

use tracing::{debug, info, warn};

use super::backend::{Canceller, Connector, Session};
use super::config::ConnectionConfig;
use super::{CONNECTION_NOT_AVAILABLE, DbError};

/// Lifecycle state of a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Verified live and usable
    Connected,
    /// The session was lost mid-query
    Failed,
    /// Released by the owner
    Closed,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ConnectionState::Connected => "connected",
            ConnectionState::Failed => "failed",
            ConnectionState::Closed => "closed",
        })
    }
}

/// An open, verified, exclusively-owned session.
pub struct LiveConnection {
    session: Option<Box<dyn Session>>,
    state: ConnectionState,
}

/// Open a session with `connector` and verify it with a ping.
///
/// # Errors
///
/// Returns [`DbError::Connection`] if the connector fails or the ping does
/// not round-trip. A session that fails its ping is closed before returning.
pub fn connect(
    connector: &dyn Connector,
    config: &ConnectionConfig,
) -> Result<LiveConnection, DbError> {
    debug!(
        host = config.host(),
        port = config.port(),
        dbname = config.dbname(),
        user = config.user(),
        timeout_secs = config.connect_timeout().as_secs(),
        "Connecting to database"
    );

    let mut session = connector.connect(config).map_err(|e| {
        warn!(host = config.host(), error = %e, "Connection attempt failed");
        DbError::connection_from(e)
    })?;

    if let Err(e) = session.ping() {
        warn!(host = config.host(), error = %e, "Connection did not answer ping");
        session.close();
        return Err(DbError::connection_from(e));
    }

    info!(
        host = config.host(),
        dbname = config.dbname(),
        backend = session.backend_name(),
        "Connected to database"
    );

    Ok(LiveConnection {
        session: Some(session),
        state: ConnectionState::Connected,
    })
}

impl LiveConnection {
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn is_connected(&self) -> bool {
        self.state == ConnectionState::Connected
    }

    pub fn backend_name(&self) -> Option<&'static str> {
        self.session.as_ref().map(|s| s.backend_name())
    }

    /// The session, if the connection is still usable.
    pub(crate) fn session_mut(&mut self) -> Result<&mut (dyn Session + 'static), DbError> {
        if self.state != ConnectionState::Connected {
            return Err(DbError::query(CONNECTION_NOT_AVAILABLE));
        }
        self.session
            .as_deref_mut()
            .ok_or_else(|| DbError::query(CONNECTION_NOT_AVAILABLE))
    }

    /// Drop the session after it reported itself lost.
    pub(crate) fn mark_failed(&mut self) {
        if let Some(mut session) = self.session.take() {
            session.close();
        }
        if self.state == ConnectionState::Connected {
            warn!("Connection lost; further queries will be rejected");
            self.state = ConnectionState::Failed;
        }
    }

    /// Cancel handle for the in-flight statement, if the backend supports it.
    pub fn cancel_handle(&self) -> Option<CancelHandle> {
        if !self.is_connected() {
            return None;
        }
        self.session
            .as_ref()
            .and_then(|s| s.canceller())
            .map(|canceller| CancelHandle { canceller })
    }

    /// Release the session. Safe to call any number of times.
    pub fn close(&mut self) {
        if let Some(mut session) = self.session.take() {
            debug!(backend = session.backend_name(), "Closing connection");
            session.close();
        }
        if self.state == ConnectionState::Connected {
            self.state = ConnectionState::Closed;
        }
    }
}

impl Drop for LiveConnection {
    fn drop(&mut self) {
        self.close();
    }
}

impl fmt::Debug for LiveConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LiveConnection")
            .field("state", &self.state)
            .field("backend", &self.backend_name())
            .finish()
    }
}

/// Cancels whatever statement is running on the connection it came from.
///
/// `Send + Sync`, so it can be moved to another thread while the owner is
/// blocked in a query. The blocked call returns a `Query` error and the
/// connection stays usable.
pub struct CancelHandle {
    canceller: Box<dyn Canceller>,
}

impl CancelHandle {
    /// # Errors
    ///
    /// Returns [`DbError::Connection`] if the cancel request could not be
    /// delivered.
    pub fn cancel(&self) -> Result<(), DbError> {
        debug!("Sending cancel request");
        self.canceller.cancel().map_err(DbError::connection_from)
    }
}

impl fmt::Debug for CancelHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CancelHandle").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::ErrorKind;
    use crate::db::backend::DriverError;
    use crate::test_utils::{MockConnector, test_config};
    use rstest::rstest;

    #[rstest]
    fn test_connect_pings_before_success() {
        let connector = MockConnector::new();
        let conn = connect(&connector, &test_config()).unwrap();
        assert!(conn.is_connected());
        assert_eq!(connector.stats().connects(), 1);
        assert_eq!(connector.stats().pings(), 1);
    }

    #[rstest]
    fn test_connect_failure_is_connection_error() {
        let connector = MockConnector::refusing(DriverError::new("Connection refused"));
        let err = connect(&connector, &test_config()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Connection);
        assert_eq!(err.message(), "Connection refused");
    }

    #[rstest]
    fn test_failed_ping_closes_session() {
        let connector = MockConnector::new().failing_ping(
            DriverError::new("database \"test\" does not exist").with_code("3D000"),
        );
        let err = connect(&connector, &test_config()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Connection);
        assert_eq!(err.code(), Some("3D000"));
        assert_eq!(connector.stats().closes(), 1);
    }

    #[rstest]
    fn test_close_is_idempotent() {
        let connector = MockConnector::new();
        let mut conn = connect(&connector, &test_config()).unwrap();
        conn.close();
        conn.close();
        assert_eq!(conn.state(), ConnectionState::Closed);
        assert_eq!(connector.stats().closes(), 1);
        drop(conn);
        assert_eq!(connector.stats().closes(), 1);
    }

    #[rstest]
    fn test_drop_closes_session() {
        let connector = MockConnector::new();
        let conn = connect(&connector, &test_config()).unwrap();
        drop(conn);
        assert_eq!(connector.stats().closes(), 1);
    }

    #[rstest]
    fn test_mark_failed_then_close_is_noop() {
        let connector = MockConnector::new();
        let mut conn = connect(&connector, &test_config()).unwrap();
        conn.mark_failed();
        assert_eq!(conn.state(), ConnectionState::Failed);
        conn.close();
        assert_eq!(conn.state(), ConnectionState::Failed);
        assert_eq!(connector.stats().closes(), 1);
    }

    #[rstest]
    fn test_session_unavailable_after_close() {
        let connector = MockConnector::new();
        let mut conn = connect(&connector, &test_config()).unwrap();
        conn.close();
        let err = conn.session_mut().err().unwrap();
        assert_eq!(err.kind(), ErrorKind::Query);
        assert_eq!(err.message(), CONNECTION_NOT_AVAILABLE);
        assert!(conn.cancel_handle().is_none());
    }

    #[rstest]
    fn test_cancel_handle_forwards_to_backend() {
        let connector = MockConnector::new();
        let conn = connect(&connector, &test_config()).unwrap();
        let handle = conn.cancel_handle().unwrap();
        handle.cancel().unwrap();
        assert_eq!(connector.stats().cancels(), 1);
    }
}
