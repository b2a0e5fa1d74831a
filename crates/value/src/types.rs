//! Value types for quarry
//!
//! A `Value` is the dynamically typed scalar that flows through expression
//! evaluation, filter tests, SQL parameters and the data writer's row buffer.

use crate::column_type::ColumnType;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// A row of values, positionally matching some column list
pub type Row = Vec<Value>;

/// Dynamically typed scalar value
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    I32(i32),
    I64(i64),
    F64(f64),
    /// Exact decimal, used for currency and fixed-point columns
    Decimal(Decimal),
    Str(String),
    Date(NaiveDate),
    Time(NaiveTime),
    Timestamp(NaiveDateTime),
    /// GUID
    Uuid(Uuid),
    Bytea(Vec<u8>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// `I32` or `I64`
    pub fn is_integer(&self) -> bool {
        matches!(self, Value::I32(_) | Value::I64(_))
    }

    /// Integer, float or decimal
    pub fn is_numeric(&self) -> bool {
        self.is_integer() || matches!(self, Value::F64(_) | Value::Decimal(_))
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Integer payload widened to i64
    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            Value::I32(i) => Some(i64::from(i)),
            Value::I64(i) => Some(i),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match *self {
            Value::Bool(b) => Some(b),
            _ => None,
        }
    }

    /// The column type this value naturally belongs to
    pub fn column_type(&self) -> ColumnType {
        ColumnType::infer(self)
    }

    /// Short lowercase name of the variant, used in error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::I32(_) => "i32",
            Value::I64(_) => "i64",
            Value::F64(_) => "f64",
            Value::Decimal(_) => "decimal",
            Value::Str(_) => "string",
            Value::Date(_) => "date",
            Value::Time(_) => "time",
            Value::Timestamp(_) => "timestamp",
            Value::Uuid(_) => "uuid",
            Value::Bytea(_) => "bytea",
        }
    }
}

/// Canonical text: the form used by the `String` conversion and by
/// `Display` of expressions
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("NULL"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::I32(i) => write!(f, "{i}"),
            Value::I64(i) => write!(f, "{i}"),
            Value::F64(n) => write!(f, "{n}"),
            Value::Decimal(d) => write!(f, "{d}"),
            Value::Str(s) => f.write_str(s),
            Value::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            Value::Time(t) => write!(f, "{t}"),
            Value::Timestamp(ts) => write!(f, "{ts}"),
            Value::Uuid(u) => write!(f, "{u}"),
            Value::Bytea(b) => write!(f, "<{} bytes>", b.len()),
        }
    }
}

macro_rules! impl_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Value::$variant(v)
                }
            }
        )*
    };
}

impl_from! {
    bool => Bool,
    i32 => I32,
    i64 => I64,
    f64 => F64,
    Decimal => Decimal,
    String => Str,
    NaiveDate => Date,
    NaiveTime => Time,
    NaiveDateTime => Timestamp,
    Uuid => Uuid,
    Vec<u8> => Bytea,
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_is_canonical() {
        assert_eq!(Value::I32(42).to_string(), "42");
        assert_eq!(Value::F64(2.5).to_string(), "2.5");
        assert_eq!(Value::Null.to_string(), "NULL");
        let date = NaiveDate::from_ymd_opt(2021, 3, 7).unwrap();
        assert_eq!(Value::Date(date).to_string(), "2021-03-07");
        let ts = date.and_hms_opt(8, 30, 0).unwrap();
        assert_eq!(Value::Timestamp(ts).to_string(), "2021-03-07 08:30:00");
    }

    #[test]
    fn test_from_option() {
        assert_eq!(Value::from(Some(5)), Value::I32(5));
        assert_eq!(Value::from(None::<i64>), Value::Null);
        assert_eq!(Value::from("abc"), Value::Str("abc".into()));
    }

    #[test]
    fn test_type_checks() {
        assert!(Value::I64(1).is_numeric());
        assert!(Value::Decimal(Decimal::new(15, 1)).is_numeric());
        assert!(!Value::Str("1".into()).is_numeric());
        assert_eq!(Value::I32(7).as_i64(), Some(7));
    }

    #[test]
    fn test_bincode_round_trip() {
        let values = vec![
            Value::Null,
            Value::Decimal(Decimal::new(12345, 2)),
            Value::Date(NaiveDate::from_ymd_opt(2020, 1, 31).unwrap()),
            Value::Uuid(Uuid::nil()),
            Value::Bytea(vec![1, 2, 3]),
        ];
        let bytes = bincode::serialize(&values).unwrap();
        let decoded: Vec<Value> = bincode::deserialize(&bytes).unwrap();
        assert_eq!(values, decoded);
    }
}
