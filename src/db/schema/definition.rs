//! Core query schema types.
//!
//! A query is described once, statically: its SQL, the parameters it binds and
//! the columns it returns. Executors validate parameters against `params` and
//! the columnar builder types each column from `columns`, never from the data.

use serde::Serialize;

use crate::db::value::Value;

/// Column and parameter data types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    Int64,
    Float64,
    String,
    Bool,
    Timestamp,
}

impl DataType {
    pub fn name(&self) -> &'static str {
        match self {
            DataType::Int64 => "int64",
            DataType::Float64 => "float64",
            DataType::String => "string",
            DataType::Bool => "bool",
            DataType::Timestamp => "timestamp",
        }
    }

    /// PostgreSQL type used in casts for this data type.
    pub fn sql_type(&self) -> &'static str {
        match self {
            DataType::Int64 => "bigint",
            DataType::Float64 => "double precision",
            DataType::String => "text",
            DataType::Bool => "boolean",
            DataType::Timestamp => "timestamp",
        }
    }

    /// Whether a non-null value can be stored under this type without loss.
    ///
    /// Integers are accepted for `Float64`; every other pairing must match
    /// exactly.
    pub fn accepts(&self, value: &Value) -> bool {
        matches!(
            (self, value),
            (DataType::Int64, Value::Int(_))
                | (DataType::Float64, Value::Float(_) | Value::Int(_))
                | (DataType::String, Value::Text(_))
                | (DataType::Bool, Value::Bool(_))
                | (DataType::Timestamp, Value::Timestamp(_))
        )
    }
}

/// A bound parameter of a catalog query.
#[derive(Debug, Clone, Serialize)]
pub struct ParamDef {
    /// Parameter name callers use as the key in `Params`
    pub name: &'static str,

    #[serde(rename = "type")]
    pub data_type: DataType,
}

/// An output column of a catalog query.
#[derive(Debug, Clone, Serialize)]
pub struct ColumnDef {
    pub name: &'static str,

    #[serde(rename = "type")]
    pub data_type: DataType,
}

/// Extra validation over bound parameters, run before anything is sent.
pub type ParamCheck = fn(&[Value]) -> Result<(), String>;

/// A named, parameterized query in the catalog.
#[derive(Debug, Clone, Serialize)]
pub struct QueryDef {
    /// Catalog name (e.g., "get_main_detector_results")
    pub name: &'static str,

    pub description: &'static str,

    /// SQL text; placeholders `$1..$n` follow the order of `params`
    #[serde(skip)]
    pub sql: &'static str,

    pub params: &'static [ParamDef],

    /// Output columns, in the order the SQL selects them
    pub columns: &'static [ColumnDef],

    #[serde(skip)]
    pub check: Option<ParamCheck>,
}

impl QueryDef {
    pub fn column_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.columns.iter().map(|c| c.name)
    }

    pub fn param_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.params.iter().map(|p| p.name)
    }
}
