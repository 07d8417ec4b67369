//! The query catalog.
//!
//! Every query a `Database` can run is declared here. The SQL casts each
//! selected column to the type its `ColumnDef` declares so the driver always
//! hands back values the builder can place without guessing.

use super::definition::{ColumnDef, DataType, ParamDef, QueryDef};
use crate::db::value::Value;

/// Rejects `start_run > end_run` for queries whose first two params are a run range.
fn check_run_range(params: &[Value]) -> Result<(), String> {
    let start = params.first().and_then(Value::as_i64);
    let end = params.get(1).and_then(Value::as_i64);
    match (start, end) {
        (Some(start), Some(end)) if start > end => Err("invalid run range".to_string()),
        _ => Ok(()),
    }
}

/// Main detector results for a run range and one detector.
///
/// Params: start_run, end_run, detector_name
/// Columns: run_number, segment_number, detector, measurement, subblock, n,
/// value, error, analysis_time
pub const MAIN_DETECTOR_RESULTS: QueryDef = QueryDef {
    name: "get_main_detector_results",
    description: "Main detector results for runs in [start_run, end_run] for one detector",
    sql: r#"
        SELECT r.run_number::bigint      AS run_number,
               rl.segment_number::bigint AS segment_number,
               md.quantity::text         AS detector,
               mt.title::text            AS measurement,
               d.subblock::bigint        AS subblock,
               d.n::bigint               AS n,
               d.value::float8           AS value,
               d.error::float8           AS error,
               a.time::timestamp         AS analysis_time
        FROM md_data d
        JOIN analysis a          ON a.analysis_id = d.analysis_id
        JOIN runlet rl           ON rl.runlet_id = a.runlet_id
        JOIN run r               ON r.run_id = rl.run_id
        JOIN main_detector md    ON md.main_detector_id = d.main_detector_id
        JOIN measurement_type mt ON mt.measurement_type_id = d.measurement_type_id
        WHERE r.run_number BETWEEN $1::bigint AND $2::bigint
          AND md.quantity = $3::text
        ORDER BY r.run_number, rl.segment_number, d.subblock
    "#,
    params: &[
        ParamDef {
            name: "start_run",
            data_type: DataType::Int64,
        },
        ParamDef {
            name: "end_run",
            data_type: DataType::Int64,
        },
        ParamDef {
            name: "detector_name",
            data_type: DataType::String,
        },
    ],
    columns: &[
        ColumnDef {
            name: "run_number",
            data_type: DataType::Int64,
        },
        ColumnDef {
            name: "segment_number",
            data_type: DataType::Int64,
        },
        ColumnDef {
            name: "detector",
            data_type: DataType::String,
        },
        ColumnDef {
            name: "measurement",
            data_type: DataType::String,
        },
        ColumnDef {
            name: "subblock",
            data_type: DataType::Int64,
        },
        ColumnDef {
            name: "n",
            data_type: DataType::Int64,
        },
        ColumnDef {
            name: "value",
            data_type: DataType::Float64,
        },
        ColumnDef {
            name: "error",
            data_type: DataType::Float64,
        },
        ColumnDef {
            name: "analysis_time",
            data_type: DataType::Timestamp,
        },
    ],
    check: Some(check_run_range),
};

/// Run metadata for a run range.
///
/// Params: start_run, end_run
/// Columns: run_number, run_type, start_time, end_time, n_mps, good_run
pub const RUNS: QueryDef = QueryDef {
    name: "get_runs",
    description: "Run metadata for runs in [start_run, end_run]",
    sql: r#"
        SELECT r.run_number::bigint    AS run_number,
               r.run_type::text        AS run_type,
               r.start_time::timestamp AS start_time,
               r.end_time::timestamp   AS end_time,
               r.n_mps::bigint         AS n_mps,
               r.good_run::boolean     AS good_run
        FROM run r
        WHERE r.run_number BETWEEN $1::bigint AND $2::bigint
        ORDER BY r.run_number
    "#,
    params: &[
        ParamDef {
            name: "start_run",
            data_type: DataType::Int64,
        },
        ParamDef {
            name: "end_run",
            data_type: DataType::Int64,
        },
    ],
    columns: &[
        ColumnDef {
            name: "run_number",
            data_type: DataType::Int64,
        },
        ColumnDef {
            name: "run_type",
            data_type: DataType::String,
        },
        ColumnDef {
            name: "start_time",
            data_type: DataType::Timestamp,
        },
        ColumnDef {
            name: "end_time",
            data_type: DataType::Timestamp,
        },
        ColumnDef {
            name: "n_mps",
            data_type: DataType::Int64,
        },
        ColumnDef {
            name: "good_run",
            data_type: DataType::Bool,
        },
    ],
    check: Some(check_run_range),
};

/// All registered queries.
pub const ALL_QUERIES: &[QueryDef] = &[MAIN_DETECTOR_RESULTS, RUNS];

/// Look up a catalog entry by name.
pub fn find_query(name: &str) -> Option<&'static QueryDef> {
    ALL_QUERIES.iter().find(|q| q.name == name)
}
