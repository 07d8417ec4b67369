//! Dynamically typed cell and parameter values.
//!
//! `Value` is what the driver layer hands back for each result cell before
//! the columnar builder assigns it a declared type, and what callers pass as
//! query parameters.

use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDateTime;

/// Named query parameters.
pub type Params = BTreeMap<String, Value>;

/// A single untyped value from (or for) the store.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Timestamp(NaiveDateTime),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Type name for error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Text(_) => "text",
            Value::Timestamp(_) => "timestamp",
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Integers widen to `f64`; nothing else converts.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_timestamp(&self) -> Option<NaiveDateTime> {
        match self {
            Value::Timestamp(t) => Some(*t),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("NULL"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{}", x),
            Value::Text(s) => f.write_str(s),
            Value::Timestamp(t) => write!(f, "{}", t.format("%Y-%m-%dT%H:%M:%S%.f")),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(t: NaiveDateTime) -> Self {
        Value::Timestamp(t)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        opt.map_or(Value::Null, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rstest::rstest;

    #[rstest]
    fn test_int_widens_to_float() {
        assert_eq!(Value::Int(42).as_f64(), Some(42.0));
    }

    #[rstest]
    fn test_float_does_not_narrow_to_int() {
        assert_eq!(Value::Float(42.7).as_i64(), None);
    }

    #[rstest]
    fn test_null_extracts_nothing() {
        let null = Value::Null;
        assert!(null.is_null());
        assert_eq!(null.as_i64(), None);
        assert_eq!(null.as_f64(), None);
        assert_eq!(null.as_str(), None);
        assert_eq!(null.as_bool(), None);
        assert_eq!(null.as_timestamp(), None);
    }

    #[rstest]
    #[case(Value::Null, "null")]
    #[case(Value::Bool(true), "bool")]
    #[case(Value::Int(1), "int")]
    #[case(Value::Float(1.0), "float")]
    #[case(Value::Text("x".into()), "text")]
    fn test_type_name(#[case] value: Value, #[case] expected: &str) {
        assert_eq!(value.type_name(), expected);
    }

    #[rstest]
    fn test_conversions() {
        assert_eq!(Value::from(7i32), Value::Int(7));
        assert_eq!(Value::from("md1"), Value::Text("md1".to_string()));
        assert_eq!(Value::from(None::<i64>), Value::Null);
        assert_eq!(Value::from(Some(2.5)), Value::Float(2.5));
    }

    #[rstest]
    fn test_timestamp_display() {
        let ts = NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(12, 30, 0)
            .unwrap();
        assert_eq!(Value::Timestamp(ts).to_string(), "2024-03-01T12:30:00");
    }
}
