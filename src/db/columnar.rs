//! Columnar result tables.
//!
//! [`ColumnarBuilder`] turns driver rows into a [`QueryResult`]: one typed
//! buffer per declared column, filled in a single forward pass. Column types
//! come from the query's [`ColumnDef`]s, so a column whose first rows are all
//! null is still typed correctly. A store null becomes `None` in the buffer,
//! which is never confused with `0`, `""` or `false`.

use chrono::NaiveDateTime;
use serde::Serialize;

use super::DbError;
use super::backend::RawResultSet;
use super::schema::{ColumnDef, DataType};
use super::value::Value;

/// Typed values of one column; `None` is a store null.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "values", rename_all = "lowercase")]
pub enum ColumnValues {
    Int64(Vec<Option<i64>>),
    Float64(Vec<Option<f64>>),
    String(Vec<Option<String>>),
    Bool(Vec<Option<bool>>),
    Timestamp(Vec<Option<NaiveDateTime>>),
}

impl ColumnValues {
    fn with_capacity(data_type: DataType, capacity: usize) -> Self {
        match data_type {
            DataType::Int64 => ColumnValues::Int64(Vec::with_capacity(capacity)),
            DataType::Float64 => ColumnValues::Float64(Vec::with_capacity(capacity)),
            DataType::String => ColumnValues::String(Vec::with_capacity(capacity)),
            DataType::Bool => ColumnValues::Bool(Vec::with_capacity(capacity)),
            DataType::Timestamp => ColumnValues::Timestamp(Vec::with_capacity(capacity)),
        }
    }

    pub fn data_type(&self) -> DataType {
        match self {
            ColumnValues::Int64(_) => DataType::Int64,
            ColumnValues::Float64(_) => DataType::Float64,
            ColumnValues::String(_) => DataType::String,
            ColumnValues::Bool(_) => DataType::Bool,
            ColumnValues::Timestamp(_) => DataType::Timestamp,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            ColumnValues::Int64(v) => v.len(),
            ColumnValues::Float64(v) => v.len(),
            ColumnValues::String(v) => v.len(),
            ColumnValues::Bool(v) => v.len(),
            ColumnValues::Timestamp(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Append one value. A value of the wrong type is handed back untouched.
    fn push(&mut self, value: Value) -> Result<(), Value> {
        match (self, value) {
            (ColumnValues::Int64(v), Value::Null) => v.push(None),
            (ColumnValues::Float64(v), Value::Null) => v.push(None),
            (ColumnValues::String(v), Value::Null) => v.push(None),
            (ColumnValues::Bool(v), Value::Null) => v.push(None),
            (ColumnValues::Timestamp(v), Value::Null) => v.push(None),
            (ColumnValues::Int64(v), Value::Int(i)) => v.push(Some(i)),
            (ColumnValues::Float64(v), Value::Float(f)) => v.push(Some(f)),
            (ColumnValues::Float64(v), Value::Int(i)) => v.push(Some(i as f64)),
            (ColumnValues::String(v), Value::Text(s)) => v.push(Some(s)),
            (ColumnValues::Bool(v), Value::Bool(b)) => v.push(Some(b)),
            (ColumnValues::Timestamp(v), Value::Timestamp(t)) => v.push(Some(t)),
            (_, other) => return Err(other),
        }
        Ok(())
    }

    /// The value at `row` as an untyped [`Value`], `Value::Null` for nulls.
    pub fn get(&self, row: usize) -> Option<Value> {
        let value = match self {
            ColumnValues::Int64(v) => v.get(row)?.map(Value::Int),
            ColumnValues::Float64(v) => v.get(row)?.map(Value::Float),
            ColumnValues::String(v) => v.get(row)?.clone().map(Value::Text),
            ColumnValues::Bool(v) => v.get(row)?.map(Value::Bool),
            ColumnValues::Timestamp(v) => v.get(row)?.map(Value::Timestamp),
        };
        Some(value.unwrap_or(Value::Null))
    }

    pub fn is_null(&self, row: usize) -> bool {
        matches!(self.get(row), Some(Value::Null))
    }

    pub fn null_count(&self) -> usize {
        match self {
            ColumnValues::Int64(v) => v.iter().filter(|x| x.is_none()).count(),
            ColumnValues::Float64(v) => v.iter().filter(|x| x.is_none()).count(),
            ColumnValues::String(v) => v.iter().filter(|x| x.is_none()).count(),
            ColumnValues::Bool(v) => v.iter().filter(|x| x.is_none()).count(),
            ColumnValues::Timestamp(v) => v.iter().filter(|x| x.is_none()).count(),
        }
    }
}

/// A named, typed column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Column {
    name: String,
    #[serde(flatten)]
    values: ColumnValues,
}

impl Column {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn data_type(&self) -> DataType {
        self.values.data_type()
    }

    pub fn values(&self) -> &ColumnValues {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, row: usize) -> Option<Value> {
        self.values.get(row)
    }

    pub fn is_null(&self, row: usize) -> bool {
        self.values.is_null(row)
    }

    pub fn as_i64(&self) -> Option<&[Option<i64>]> {
        match &self.values {
            ColumnValues::Int64(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<&[Option<f64>]> {
        match &self.values {
            ColumnValues::Float64(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_strings(&self) -> Option<&[Option<String>]> {
        match &self.values {
            ColumnValues::String(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_bools(&self) -> Option<&[Option<bool>]> {
        match &self.values {
            ColumnValues::Bool(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_timestamps(&self) -> Option<&[Option<NaiveDateTime>]> {
        match &self.values {
            ColumnValues::Timestamp(v) => Some(v),
            _ => None,
        }
    }
}

/// Immutable columnar table returned by every catalog query.
///
/// Every column has `num_rows()` entries; column order is the query's
/// declared output order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryResult {
    columns: Vec<Column>,
    num_rows: usize,
}

impl QueryResult {
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    pub fn num_rows(&self) -> usize {
        self.num_rows
    }

    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.num_rows == 0
    }

    /// One row as untyped values, in column order.
    pub fn row(&self, index: usize) -> Option<Vec<Value>> {
        if index >= self.num_rows {
            return None;
        }
        self.columns.iter().map(|c| c.get(index)).collect()
    }
}

/// Accumulates rows into typed column buffers.
pub struct ColumnarBuilder {
    columns: Vec<Column>,
    num_rows: usize,
}

impl ColumnarBuilder {
    pub fn new(schema: &[ColumnDef]) -> Self {
        Self::with_capacity(schema, 0)
    }

    pub fn with_capacity(schema: &[ColumnDef], capacity: usize) -> Self {
        let columns = schema
            .iter()
            .map(|def| Column {
                name: def.name.to_string(),
                values: ColumnValues::with_capacity(def.data_type, capacity),
            })
            .collect();
        Self {
            columns,
            num_rows: 0,
        }
    }

    pub fn num_rows(&self) -> usize {
        self.num_rows
    }

    /// Append one row.
    ///
    /// The whole row is checked before anything is appended, so a rejected
    /// row leaves every buffer at the same length.
    pub fn push_row(&mut self, row: Vec<Value>) -> Result<(), DbError> {
        if row.len() != self.columns.len() {
            return Err(DbError::query(format!(
                "row {} has {} values, expected {}",
                self.num_rows,
                row.len(),
                self.columns.len()
            )));
        }

        for (column, value) in self.columns.iter().zip(&row) {
            let data_type = column.data_type();
            if !value.is_null() && !data_type.accepts(value) {
                return Err(DbError::query(format!(
                    "column '{}' expects {}, got {} at row {}",
                    column.name,
                    data_type.name(),
                    value.type_name(),
                    self.num_rows
                )));
            }
        }

        for (column, value) in self.columns.iter_mut().zip(row) {
            column.values.push(value).map_err(|rejected| {
                DbError::query(format!(
                    "column '{}' cannot hold {}",
                    column.name,
                    rejected.type_name()
                ))
            })?;
        }
        self.num_rows += 1;
        Ok(())
    }

    pub fn finish(self) -> QueryResult {
        QueryResult {
            columns: self.columns,
            num_rows: self.num_rows,
        }
    }
}

/// Build a typed table from a raw result set.
///
/// The raw columns must match `schema` by name and position; any mismatch or
/// unconvertible value fails the whole result.
pub fn build(schema: &[ColumnDef], raw: RawResultSet) -> Result<QueryResult, DbError> {
    if raw.columns.len() != schema.len() {
        return Err(DbError::query(format!(
            "result has {} columns, expected {}",
            raw.columns.len(),
            schema.len()
        )));
    }
    for (index, (raw_column, def)) in raw.columns.iter().zip(schema).enumerate() {
        if raw_column.name != def.name {
            return Err(DbError::query(format!(
                "result column {} is '{}', expected '{}'",
                index, raw_column.name, def.name
            )));
        }
    }

    let mut builder = ColumnarBuilder::with_capacity(schema, raw.rows.len());
    for row in raw.rows {
        builder.push_row(row)?;
    }
    Ok(builder.finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::ErrorKind;
    use crate::db::backend::RawColumn;
    use chrono::NaiveDate;
    use rstest::{fixture, rstest};

    const SCHEMA: &[ColumnDef] = &[
        ColumnDef {
            name: "run_number",
            data_type: DataType::Int64,
        },
        ColumnDef {
            name: "value",
            data_type: DataType::Float64,
        },
        ColumnDef {
            name: "detector",
            data_type: DataType::String,
        },
        ColumnDef {
            name: "good",
            data_type: DataType::Bool,
        },
        ColumnDef {
            name: "time",
            data_type: DataType::Timestamp,
        },
    ];

    fn ts(hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    fn raw_columns() -> Vec<RawColumn> {
        [("run_number", "int8"), ("value", "float8"), ("detector", "text"), ("good", "bool"), ("time", "timestamp")]
            .into_iter()
            .map(|(name, type_name)| RawColumn {
                name: name.to_string(),
                type_name: type_name.to_string(),
            })
            .collect()
    }

    #[fixture]
    fn raw() -> RawResultSet {
        RawResultSet {
            columns: raw_columns(),
            rows: vec![
                vec![Value::Int(100), Value::Float(0.5), Value::Text("md1".into()), Value::Bool(true), Value::Timestamp(ts(1))],
                vec![Value::Int(101), Value::Null, Value::Text("".into()), Value::Bool(false), Value::Null],
                vec![Value::Null, Value::Int(2), Value::Null, Value::Null, Value::Timestamp(ts(3))],
            ],
        }
    }

    #[rstest]
    fn test_build_every_column_has_n_values(raw: RawResultSet) {
        let n = raw.rows.len();
        let result = build(SCHEMA, raw).unwrap();
        assert_eq!(result.num_rows(), n);
        assert_eq!(result.num_columns(), SCHEMA.len());
        for column in result.columns() {
            assert_eq!(column.len(), n, "column {} length", column.name());
        }
    }

    #[rstest]
    fn test_build_preserves_declared_order_and_types(raw: RawResultSet) {
        let result = build(SCHEMA, raw).unwrap();
        let names: Vec<_> = result.column_names().collect();
        assert_eq!(names, vec!["run_number", "value", "detector", "good", "time"]);
        let types: Vec<_> = result.columns().iter().map(Column::data_type).collect();
        assert_eq!(
            types,
            vec![DataType::Int64, DataType::Float64, DataType::String, DataType::Bool, DataType::Timestamp]
        );
    }

    #[rstest]
    #[case(DataType::Int64, Value::Text("7".into()))]
    #[case(DataType::Float64, Value::Bool(true))]
    #[case(DataType::String, Value::Int(1))]
    #[case(DataType::Bool, Value::Int(1))]
    #[case(DataType::Timestamp, Value::Text("2024-05-01".into()))]
    fn test_push_hands_back_mismatched_value(#[case] data_type: DataType, #[case] value: Value) {
        let mut values = ColumnValues::with_capacity(data_type, 1);
        assert_eq!(values.push(value.clone()), Err(value));
        assert!(values.is_empty());
    }

    #[rstest]
    fn test_push_null_and_int_into_float() {
        let mut values = ColumnValues::with_capacity(DataType::Float64, 2);
        values.push(Value::Null).unwrap();
        values.push(Value::Int(3)).unwrap();
        assert_eq!(values, ColumnValues::Float64(vec![None, Some(3.0)]));
    }

    #[rstest]
    fn test_build_is_idempotent(raw: RawResultSet) {
        let first = build(SCHEMA, raw.clone()).unwrap();
        let second = build(SCHEMA, raw).unwrap();
        assert_eq!(first, second);
    }

    #[rstest]
    fn test_nulls_distinct_from_zero_values(raw: RawResultSet) {
        let result = build(SCHEMA, raw).unwrap();

        let detector = result.column("detector").unwrap().as_strings().unwrap();
        assert_eq!(detector[1], Some(String::new()));
        assert_eq!(detector[2], None);

        let good = result.column("good").unwrap().as_bools().unwrap();
        assert_eq!(good[1], Some(false));
        assert_eq!(good[2], None);

        let run = result.column("run_number").unwrap();
        assert!(run.is_null(2));
        assert!(!run.is_null(0));
        assert_eq!(run.values().null_count(), 1);
    }

    #[rstest]
    fn test_int_widens_into_float_column(raw: RawResultSet) {
        let result = build(SCHEMA, raw).unwrap();
        let value = result.column("value").unwrap().as_f64().unwrap();
        assert_eq!(value, &[Some(0.5), None, Some(2.0)]);
    }

    #[rstest]
    fn test_all_null_leading_rows_keep_declared_type() {
        let raw = RawResultSet {
            columns: raw_columns(),
            rows: vec![
                vec![Value::Null, Value::Null, Value::Null, Value::Null, Value::Null],
                vec![Value::Null, Value::Null, Value::Null, Value::Null, Value::Null],
            ],
        };
        let result = build(SCHEMA, raw).unwrap();
        assert_eq!(result.column("time").unwrap().data_type(), DataType::Timestamp);
        assert_eq!(result.column("time").unwrap().as_timestamps().unwrap(), &[None, None]);
    }

    #[rstest]
    fn test_empty_result_has_typed_empty_columns() {
        let raw = RawResultSet {
            columns: raw_columns(),
            rows: vec![],
        };
        let result = build(SCHEMA, raw).unwrap();
        assert!(result.is_empty());
        assert_eq!(result.num_columns(), 5);
        assert!(result.columns().iter().all(Column::is_empty));
    }

    #[rstest]
    fn test_unconvertible_value_fails_whole_result(mut raw: RawResultSet) {
        raw.rows[2][0] = Value::Text("not a run".into());
        let err = build(SCHEMA, raw).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Query);
        assert_eq!(err.message(), "column 'run_number' expects int64, got text at row 2");
    }

    #[rstest]
    fn test_float_not_accepted_for_int_column(mut raw: RawResultSet) {
        raw.rows[0][0] = Value::Float(1.5);
        assert!(build(SCHEMA, raw).is_err());
    }

    #[rstest]
    fn test_column_name_mismatch(mut raw: RawResultSet) {
        raw.columns[1].name = "val".to_string();
        let err = build(SCHEMA, raw).unwrap_err();
        assert_eq!(err.message(), "result column 1 is 'val', expected 'value'");
    }

    #[rstest]
    fn test_column_count_mismatch(mut raw: RawResultSet) {
        raw.columns.pop();
        let err = build(SCHEMA, raw).unwrap_err();
        assert_eq!(err.message(), "result has 4 columns, expected 5");
    }

    #[rstest]
    fn test_rejected_row_leaves_builder_consistent() {
        let mut builder = ColumnarBuilder::new(SCHEMA);
        builder
            .push_row(vec![Value::Int(1), Value::Float(1.0), Value::Null, Value::Null, Value::Null])
            .unwrap();
        let bad = vec![Value::Int(2), Value::Float(2.0), Value::Text("x".into()), Value::Int(9), Value::Null];
        assert!(builder.push_row(bad).is_err());
        assert!(builder.push_row(vec![Value::Int(3)]).is_err());

        let result = builder.finish();
        assert_eq!(result.num_rows(), 1);
        assert!(result.columns().iter().all(|c| c.len() == 1));
    }

    #[rstest]
    fn test_row_access(raw: RawResultSet) {
        let result = build(SCHEMA, raw).unwrap();
        assert_eq!(
            result.row(1).unwrap(),
            vec![Value::Int(101), Value::Null, Value::Text("".into()), Value::Bool(false), Value::Null]
        );
        assert!(result.row(3).is_none());
    }

    #[rstest]
    fn test_serializes_column_wise(raw: RawResultSet) {
        let result = build(SCHEMA, raw).unwrap();
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["num_rows"], 3);
        assert_eq!(json["columns"][0]["name"], "run_number");
        assert_eq!(json["columns"][0]["type"], "int64");
        assert_eq!(json["columns"][0]["values"], serde_json::json!([100, 101, null]));
        assert_eq!(json["columns"][4]["values"][0], "2024-05-01T01:00:00");
    }
}
