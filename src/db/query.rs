//! Query execution against the catalog.

use std::time::Instant;

use tracing::{debug, warn};

use super::backend::RawResultSet;
use super::columnar::{self, QueryResult};
use super::connection::LiveConnection;
use super::schema::{QueryDef, find_query};
use super::value::{Params, Value};
use super::{DbError, UNKNOWN_QUERY};

/// Check `params` against the query's signature and order them for binding.
///
/// Every declared parameter must be present and non-null with a compatible
/// type; undeclared parameters are rejected. Integers are accepted for
/// `Float64` parameters and bound as floats.
fn bind_params(query: &QueryDef, params: &Params) -> Result<Vec<Value>, DbError> {
    if let Some(extra) = params
        .keys()
        .find(|key| !query.params.iter().any(|p| p.name == key.as_str()))
    {
        return Err(DbError::query(format!(
            "unexpected parameter {} for {}",
            extra, query.name
        )));
    }

    let mut bound = Vec::with_capacity(query.params.len());
    for param in query.params {
        let value = match params.get(param.name) {
            None | Some(Value::Null) => {
                return Err(DbError::query(format!("missing parameter {}", param.name)));
            }
            Some(value) if !param.data_type.accepts(value) => {
                return Err(DbError::query(format!(
                    "parameter {} expects {}, got {}",
                    param.name,
                    param.data_type.name(),
                    value.type_name()
                )));
            }
            Some(Value::Int(i)) if param.data_type == super::schema::DataType::Float64 => {
                Value::Float(*i as f64)
            }
            Some(value) => value.clone(),
        };
        bound.push(value);
    }

    if let Some(check) = query.check {
        check(&bound).map_err(DbError::query)?;
    }

    Ok(bound)
}

/// Run a catalog query and return the driver's raw rows.
///
/// Lookup and parameter validation happen before the connection is touched,
/// so an unknown name or a bad parameter never sends anything. A driver
/// failure that leaves the session unusable moves the connection to
/// `Failed`.
pub fn execute(
    connection: &mut LiveConnection,
    query_name: &str,
    params: &Params,
) -> Result<(&'static QueryDef, RawResultSet), DbError> {
    let query = find_query(query_name).ok_or_else(|| {
        debug!(query = query_name, "Rejected unknown query");
        DbError::query(UNKNOWN_QUERY)
    })?;
    let bound = bind_params(query, params)?;

    let session = connection.session_mut()?;
    let start = Instant::now();
    match session.query(query.sql, &bound) {
        Ok(raw) => {
            debug!(
                query = query.name,
                rows = raw.row_count(),
                elapsed_ms = start.elapsed().as_millis() as u64,
                "Query returned"
            );
            Ok((query, raw))
        }
        Err(e) => {
            warn!(query = query.name, error = %e, "Query failed");
            if e.connection_lost {
                connection.mark_failed();
            }
            Err(DbError::query_from(e))
        }
    }
}

/// Run a catalog query and materialize it as a columnar table.
pub fn run_query(
    connection: &mut LiveConnection,
    query_name: &str,
    params: &Params,
) -> Result<QueryResult, DbError> {
    let (query, raw) = execute(connection, query_name, params)?;
    columnar::build(query.columns, raw)
}
