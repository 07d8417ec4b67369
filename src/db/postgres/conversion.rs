//! Type conversion between PostgreSQL and [`Value`].
//!
//! Handles:
//! - `Value` -> bound statement parameters (via `ToSql`)
//! - result rows -> `Vec<Value>`, decided by the column's server type name
//! - `postgres::Error` -> [`DriverError`], including lost-session detection

use std::error::Error as _;

use ::postgres::Row;
use ::postgres::types::ToSql;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};

use crate::db::backend::{DriverError, RawColumn};
use crate::db::value::Value;

/// SQLSTATE sent when an administrator terminates the backend.
const ADMIN_SHUTDOWN: &str = "57P01";

/// Box each value as a statement parameter.
///
/// Nulls are bound as a text null; catalog queries never bind one.
pub(super) fn to_sql_params(params: &[Value]) -> Vec<Box<dyn ToSql + Sync>> {
    params
        .iter()
        .map(|value| -> Box<dyn ToSql + Sync> {
            match value {
                Value::Null => Box::new(Option::<String>::None),
                Value::Bool(b) => Box::new(*b),
                Value::Int(i) => Box::new(*i),
                Value::Float(f) => Box::new(*f),
                Value::Text(s) => Box::new(s.clone()),
                Value::Timestamp(t) => Box::new(*t),
            }
        })
        .collect()
}

fn column_error(column: &RawColumn, err: ::postgres::Error) -> DriverError {
    DriverError::new(format!("failed to decode column '{}': {}", column.name, err))
}

fn get<'a, T>(row: &'a Row, idx: usize, column: &RawColumn) -> Result<Option<T>, DriverError>
where
    T: ::postgres::types::FromSql<'a>,
{
    row.try_get::<_, Option<T>>(idx)
        .map_err(|e| column_error(column, e))
}

/// Decode one row. Columns with a type outside the supported set fail the row.
pub(super) fn row_to_values(row: &Row, columns: &[RawColumn]) -> Result<Vec<Value>, DriverError> {
    columns
        .iter()
        .enumerate()
        .map(|(idx, column)| decode(row, idx, column))
        .collect()
}

fn decode(row: &Row, idx: usize, column: &RawColumn) -> Result<Value, DriverError> {
    let value = match column.type_name.as_str() {
        "bool" => get::<bool>(row, idx, column)?.map(Value::Bool),
        "int2" => get::<i16>(row, idx, column)?.map(|v| Value::Int(v.into())),
        "int4" => get::<i32>(row, idx, column)?.map(|v| Value::Int(v.into())),
        "int8" => get::<i64>(row, idx, column)?.map(Value::Int),
        "float4" => get::<f32>(row, idx, column)?.map(|v| Value::Float(v.into())),
        "float8" => get::<f64>(row, idx, column)?.map(Value::Float),
        "varchar" | "text" | "bpchar" | "name" => get::<String>(row, idx, column)?.map(Value::Text),
        "timestamp" => get::<NaiveDateTime>(row, idx, column)?.map(Value::Timestamp),
        "timestamptz" => {
            get::<DateTime<Utc>>(row, idx, column)?.map(|t| Value::Timestamp(t.naive_utc()))
        }
        "date" => get::<NaiveDate>(row, idx, column)?
            .map(|d| Value::Timestamp(d.and_time(NaiveTime::MIN))),
        other => {
            return Err(DriverError::new(format!(
                "unsupported column type {} for column {}",
                other, column.name
            )));
        }
    };
    Ok(value.unwrap_or(Value::Null))
}

/// Classify a driver error.
///
/// Server errors keep their message, detail and hint plus the SQLSTATE. The
/// session counts as lost when the client reports itself closed, the failure
/// came from the socket, the SQLSTATE is in class 08 (connection exception),
/// or the backend was shut down.
pub(super) fn driver_error(err: &::postgres::Error) -> DriverError {
    let mut error = match err.as_db_error() {
        Some(db_error) => {
            let mut msg = db_error.message().to_string();
            if let Some(detail) = db_error.detail() {
                msg.push_str(&format!(" (detail: {})", detail));
            }
            if let Some(hint) = db_error.hint() {
                msg.push_str(&format!(" (hint: {})", hint));
            }
            DriverError::new(msg)
        }
        None => DriverError::new(err.to_string()),
    };

    if let Some(code) = err.code() {
        error = error.with_code(code.code());
    }
    if is_connection_lost(err) {
        error = error.lost();
    }
    error
}

fn is_connection_lost(err: &::postgres::Error) -> bool {
    if err.is_closed() {
        return true;
    }
    if let Some(code) = err.code() {
        let code = code.code();
        if code.starts_with("08") || code == ADMIN_SHUTDOWN {
            return true;
        }
    }
    err.source().is_some_and(|source| source.is::<std::io::Error>())
}
