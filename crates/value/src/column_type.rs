//! Declared column types

use crate::types::Value;
use chrono::{NaiveDate, NaiveTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Logical column type of a table column or a typed literal.
///
/// This is coarser than [`Value`]'s variants: `Int` covers every integer
/// width, `DateTime` is a timestamp without zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ColumnType {
    /// Type not known (e.g. a NULL literal without declared type)
    #[default]
    Unknown,
    String,
    Int,
    Float,
    Decimal,
    Boolean,
    Date,
    DateTime,
    Time,
    Guid,
    Binary,
}

impl ColumnType {
    /// Infer the column type of a value. `Null` is `Unknown`.
    pub fn infer(value: &Value) -> Self {
        match value {
            Value::Null => ColumnType::Unknown,
            Value::Bool(_) => ColumnType::Boolean,
            Value::I32(_) | Value::I64(_) => ColumnType::Int,
            Value::F64(_) => ColumnType::Float,
            Value::Decimal(_) => ColumnType::Decimal,
            Value::Str(_) => ColumnType::String,
            Value::Date(_) => ColumnType::Date,
            Value::Time(_) => ColumnType::Time,
            Value::Timestamp(_) => ColumnType::DateTime,
            Value::Uuid(_) => ColumnType::Guid,
            Value::Bytea(_) => ColumnType::Binary,
        }
    }

    /// Value substituted for NULL when a comparison treats null as the
    /// type's default. `Unknown` has no default and stays null.
    pub fn default_value(&self) -> Value {
        match self {
            ColumnType::Unknown => Value::Null,
            ColumnType::String => Value::Str(String::new()),
            ColumnType::Int => Value::I64(0),
            ColumnType::Float => Value::F64(0.0),
            ColumnType::Decimal => Value::Decimal(Decimal::ZERO),
            ColumnType::Boolean => Value::Bool(false),
            ColumnType::Date => Value::Date(first_day()),
            ColumnType::DateTime => Value::Timestamp(first_day().and_time(NaiveTime::MIN)),
            ColumnType::Time => Value::Time(NaiveTime::MIN),
            ColumnType::Guid => Value::Uuid(Uuid::nil()),
            ColumnType::Binary => Value::Bytea(Vec::new()),
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            ColumnType::Int | ColumnType::Float | ColumnType::Decimal
        )
    }

    pub fn is_temporal(&self) -> bool {
        matches!(
            self,
            ColumnType::Date | ColumnType::DateTime | ColumnType::Time
        )
    }
}

/// 0001-01-01, the default date of the date-bearing column types
fn first_day() -> NaiveDate {
    NaiveDate::from_ymd_opt(1, 1, 1).unwrap_or(NaiveDate::MIN)
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ColumnType::Unknown => "Unknown",
            ColumnType::String => "String",
            ColumnType::Int => "Int",
            ColumnType::Float => "Float",
            ColumnType::Decimal => "Decimal",
            ColumnType::Boolean => "Boolean",
            ColumnType::Date => "Date",
            ColumnType::DateTime => "DateTime",
            ColumnType::Time => "Time",
            ColumnType::Guid => "Guid",
            ColumnType::Binary => "Binary",
        };
        write!(f, "{}", name)
    }
}
