//! Shared test utilities for connection, query and command tests.
//!
//! [`MockConnector`] stands in for a PostgreSQL server. It records every call
//! it receives so tests can assert on what did (or did not) reach the store.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{NaiveDate, NaiveDateTime};

use crate::db::schema::{ColumnDef, DataType, MAIN_DETECTOR_RESULTS, RUNS};
use crate::db::{
    Canceller, ConnectionConfig, Connector, DriverError, RawColumn, RawResultSet, Session, Value,
};

/// A config that parses and points nowhere real.
pub fn test_config() -> ConnectionConfig {
    ConnectionConfig::parse("host=mock.invalid dbname=test user=test password=test")
        .expect("test config should parse")
}

/// Timestamp on 2024-05-01 at `hour`:00:00.
pub fn ts(hour: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 5, 1)
        .unwrap()
        .and_hms_opt(hour, 0, 0)
        .unwrap()
}

fn pg_type_name(data_type: DataType) -> &'static str {
    match data_type {
        DataType::Int64 => "int8",
        DataType::Float64 => "float8",
        DataType::String => "text",
        DataType::Bool => "bool",
        DataType::Timestamp => "timestamp",
    }
}

/// Raw headers matching a catalog column list.
pub fn raw_columns(defs: &[ColumnDef]) -> Vec<RawColumn> {
    defs.iter()
        .map(|def| RawColumn {
            name: def.name.to_string(),
            type_name: pg_type_name(def.data_type).to_string(),
        })
        .collect()
}

/// A zero-row result shaped like `defs`.
pub fn empty_result(defs: &[ColumnDef]) -> RawResultSet {
    RawResultSet {
        columns: raw_columns(defs),
        rows: vec![],
    }
}

/// Two `get_runs` rows; the second has a null end time and null quality flag.
pub fn runs_result() -> RawResultSet {
    RawResultSet {
        columns: raw_columns(RUNS.columns),
        rows: vec![
            vec![
                Value::Int(1001),
                Value::from("production"),
                Value::Timestamp(ts(1)),
                Value::Timestamp(ts(2)),
                Value::Int(480_000),
                Value::Bool(true),
            ],
            vec![
                Value::Int(1002),
                Value::from("calibration"),
                Value::Timestamp(ts(3)),
                Value::Null,
                Value::Int(0),
                Value::Null,
            ],
        ],
    }
}

/// Three `get_main_detector_results` rows for detector `md1`.
pub fn detector_result() -> RawResultSet {
    let row = |run: i64, segment: i64, subblock: i64, value: Value, error: Value| {
        vec![
            Value::Int(run),
            Value::Int(segment),
            Value::from("md1"),
            Value::from("asym"),
            Value::Int(subblock),
            Value::Int(1200),
            value,
            error,
            Value::Timestamp(ts(4)),
        ]
    };
    RawResultSet {
        columns: raw_columns(MAIN_DETECTOR_RESULTS.columns),
        rows: vec![
            row(1001, 0, 0, Value::Float(-0.25), Value::Float(0.01)),
            row(1001, 0, 1, Value::Float(0.5), Value::Float(0.02)),
            row(1002, 1, 0, Value::Null, Value::Null),
        ],
    }
}

#[derive(Default)]
struct StatsInner {
    connects: AtomicUsize,
    pings: AtomicUsize,
    queries: AtomicUsize,
    closes: AtomicUsize,
    cancels: AtomicUsize,
    last_query: Mutex<Option<(String, Vec<Value>)>>,
}

/// Call counters shared by a connector and every session it opened.
#[derive(Clone, Default)]
pub struct MockStats {
    inner: Arc<StatsInner>,
}

impl MockStats {
    pub fn connects(&self) -> usize {
        self.inner.connects.load(Ordering::SeqCst)
    }

    pub fn pings(&self) -> usize {
        self.inner.pings.load(Ordering::SeqCst)
    }

    pub fn queries(&self) -> usize {
        self.inner.queries.load(Ordering::SeqCst)
    }

    pub fn closes(&self) -> usize {
        self.inner.closes.load(Ordering::SeqCst)
    }

    pub fn cancels(&self) -> usize {
        self.inner.cancels.load(Ordering::SeqCst)
    }

    /// SQL and bound parameters of the most recent query.
    pub fn last_query(&self) -> Option<(String, Vec<Value>)> {
        self.inner.last_query.lock().unwrap().clone()
    }
}

/// A connector that never touches the network.
#[derive(Clone, Default)]
pub struct MockConnector {
    stats: MockStats,
    connect_error: Option<DriverError>,
    ping_error: Option<DriverError>,
    query_error: Option<DriverError>,
    result: RawResultSet,
}

impl MockConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// A connector whose every connect attempt fails with `error`.
    pub fn refusing(error: DriverError) -> Self {
        Self {
            connect_error: Some(error),
            ..Self::default()
        }
    }

    pub fn failing_ping(mut self, error: DriverError) -> Self {
        self.ping_error = Some(error);
        self
    }

    pub fn failing_query(mut self, error: DriverError) -> Self {
        self.query_error = Some(error);
        self
    }

    /// Result returned by every query.
    pub fn with_result(mut self, result: RawResultSet) -> Self {
        self.result = result;
        self
    }

    pub fn stats(&self) -> MockStats {
        self.stats.clone()
    }
}

impl Connector for MockConnector {
    fn connect(&self, _config: &ConnectionConfig) -> Result<Box<dyn Session>, DriverError> {
        self.stats.inner.connects.fetch_add(1, Ordering::SeqCst);
        if let Some(error) = &self.connect_error {
            return Err(error.clone());
        }
        Ok(Box::new(MockSession {
            stats: self.stats.clone(),
            ping_error: self.ping_error.clone(),
            query_error: self.query_error.clone(),
            result: self.result.clone(),
        }))
    }
}

struct MockSession {
    stats: MockStats,
    ping_error: Option<DriverError>,
    query_error: Option<DriverError>,
    result: RawResultSet,
}

impl Session for MockSession {
    fn ping(&mut self) -> Result<(), DriverError> {
        self.stats.inner.pings.fetch_add(1, Ordering::SeqCst);
        match &self.ping_error {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }

    fn query(&mut self, sql: &str, params: &[Value]) -> Result<RawResultSet, DriverError> {
        self.stats.inner.queries.fetch_add(1, Ordering::SeqCst);
        *self.stats.inner.last_query.lock().unwrap() = Some((sql.to_string(), params.to_vec()));
        match &self.query_error {
            Some(error) => Err(error.clone()),
            None => Ok(self.result.clone()),
        }
    }

    fn canceller(&self) -> Option<Box<dyn Canceller>> {
        Some(Box::new(MockCanceller {
            stats: self.stats.clone(),
        }))
    }

    fn close(&mut self) {
        self.stats.inner.closes.fetch_add(1, Ordering::SeqCst);
    }

    fn backend_name(&self) -> &'static str {
        "Mock"
    }
}

struct MockCanceller {
    stats: MockStats,
}

impl Canceller for MockCanceller {
    fn cancel(&self) -> Result<(), DriverError> {
        self.stats.inner.cancels.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
