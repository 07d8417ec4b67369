//! Query schema definitions and the query catalog.
//!
//! # Overview
//!
//! 1. **Core Types** (`definition.rs`):
//!    - `DataType` - column/parameter types (Int64, Float64, String, Bool, Timestamp)
//!    - `ParamDef`, `ColumnDef` - named, typed parameters and output columns
//!    - `QueryDef` - SQL plus its parameter and column declarations
//!
//! 2. **Catalog** (`catalog.rs`):
//!    - `MAIN_DETECTOR_RESULTS`, `RUNS`
//!    - `ALL_QUERIES` - slice for iteration, `find_query` for lookup by name
//!
//! # Type Mapping
//!
//! | DataType  | PostgreSQL         | Rust            |
//! |-----------|--------------------|-----------------|
//! | Int64     | bigint             | i64             |
//! | Float64   | double precision   | f64             |
//! | String    | text               | String          |
//! | Bool      | boolean            | bool            |
//! | Timestamp | timestamp          | NaiveDateTime   |

mod catalog;
mod definition;

pub use catalog::{ALL_QUERIES, MAIN_DETECTOR_RESULTS, RUNS, find_query};
pub use definition::{ColumnDef, DataType, ParamCheck, ParamDef, QueryDef};
