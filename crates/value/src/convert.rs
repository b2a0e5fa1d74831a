//! Conversion of values between column types
//!
//! The rules here are a fixed conformance table, not a best-effort cast:
//! floats truncate toward zero when converted to `Int`, a timestamp loses
//! its time part when converted to `Date`, and GUIDs may be supplied as text.

use crate::column_type::ColumnType;
use crate::error::{Error, Result};
use crate::types::Value;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use uuid::Uuid;

const DATE_FORMAT: &str = "%Y-%m-%d";
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];
const TIME_FORMATS: &[&str] = &["%H:%M:%S%.f", "%H:%M"];

impl Value {
    /// Convert this value to the representation of `target`.
    ///
    /// `Null` converts to `Null` for every target; `Unknown` leaves the value
    /// untouched.
    pub fn convert_to(&self, target: ColumnType) -> Result<Value> {
        if self.is_null() {
            return Ok(Value::Null);
        }
        match target {
            ColumnType::Unknown => Ok(self.clone()),
            ColumnType::String => to_string_value(self),
            ColumnType::Int => to_int(self),
            ColumnType::Float => to_float(self),
            ColumnType::Decimal => to_decimal(self),
            ColumnType::Boolean => to_bool(self),
            ColumnType::Date => to_date(self),
            ColumnType::DateTime => to_timestamp(self),
            ColumnType::Time => to_time(self),
            ColumnType::Guid => to_guid(self),
            ColumnType::Binary => to_binary(self),
        }
    }
}

fn conversion_error(value: &Value, target: ColumnType) -> Error {
    Error::Conversion {
        value: format!("{:?}", value),
        target: target.to_string(),
    }
}

fn to_string_value(value: &Value) -> Result<Value> {
    match value {
        Value::Str(_) => Ok(value.clone()),
        Value::Bytea(_) => Err(conversion_error(value, ColumnType::String)),
        other => Ok(Value::Str(other.to_string())),
    }
}

fn to_int(value: &Value) -> Result<Value> {
    match value {
        Value::I32(i) => Ok(Value::I64(*i as i64)),
        Value::I64(_) => Ok(value.clone()),
        Value::F64(f) => truncate_f64(*f).ok_or_else(|| conversion_error(value, ColumnType::Int)),
        Value::Decimal(d) => d
            .trunc()
            .to_i64()
            .map(Value::I64)
            .ok_or_else(|| conversion_error(value, ColumnType::Int)),
        Value::Bool(b) => Ok(Value::I64(if *b { 1 } else { 0 })),
        Value::Str(s) => {
            let s = s.trim();
            if let Ok(i) = s.parse::<i64>() {
                return Ok(Value::I64(i));
            }
            s.parse::<f64>()
                .ok()
                .and_then(truncate_f64)
                .ok_or_else(|| conversion_error(value, ColumnType::Int))
        }
        _ => Err(conversion_error(value, ColumnType::Int)),
    }
}

fn truncate_f64(f: f64) -> Option<Value> {
    let t = f.trunc();
    if t.is_finite() && t >= i64::MIN as f64 && t <= i64::MAX as f64 {
        Some(Value::I64(t as i64))
    } else {
        None
    }
}

fn to_float(value: &Value) -> Result<Value> {
    match value {
        Value::I32(i) => Ok(Value::F64(*i as f64)),
        Value::I64(i) => Ok(Value::F64(*i as f64)),
        Value::F64(_) => Ok(value.clone()),
        Value::Decimal(d) => d
            .to_f64()
            .map(Value::F64)
            .ok_or_else(|| conversion_error(value, ColumnType::Float)),
        Value::Bool(b) => Ok(Value::F64(if *b { 1.0 } else { 0.0 })),
        Value::Str(s) => s
            .trim()
            .parse::<f64>()
            .map(Value::F64)
            .map_err(|_| conversion_error(value, ColumnType::Float)),
        _ => Err(conversion_error(value, ColumnType::Float)),
    }
}

fn to_decimal(value: &Value) -> Result<Value> {
    match value {
        Value::I32(i) => Ok(Value::Decimal(Decimal::from(*i))),
        Value::I64(i) => Ok(Value::Decimal(Decimal::from(*i))),
        Value::F64(f) => Decimal::from_f64_retain(*f)
            .or_else(|| Decimal::from_f64(*f))
            .map(Value::Decimal)
            .ok_or_else(|| conversion_error(value, ColumnType::Decimal)),
        Value::Decimal(_) => Ok(value.clone()),
        Value::Bool(b) => Ok(Value::Decimal(if *b { Decimal::ONE } else { Decimal::ZERO })),
        Value::Str(s) => s
            .trim()
            .parse::<Decimal>()
            .map(Value::Decimal)
            .map_err(|_| conversion_error(value, ColumnType::Decimal)),
        _ => Err(conversion_error(value, ColumnType::Decimal)),
    }
}

fn to_bool(value: &Value) -> Result<Value> {
    match value {
        Value::Bool(_) => Ok(value.clone()),
        Value::I32(i) => Ok(Value::Bool(*i != 0)),
        Value::I64(i) => Ok(Value::Bool(*i != 0)),
        Value::F64(f) => Ok(Value::Bool(*f != 0.0)),
        Value::Decimal(d) => Ok(Value::Bool(!d.is_zero())),
        Value::Str(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "1" => Ok(Value::Bool(true)),
            "false" | "0" => Ok(Value::Bool(false)),
            _ => Err(conversion_error(value, ColumnType::Boolean)),
        },
        _ => Err(conversion_error(value, ColumnType::Boolean)),
    }
}

fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
}

fn to_date(value: &Value) -> Result<Value> {
    match value {
        Value::Date(_) => Ok(value.clone()),
        Value::Timestamp(ts) => Ok(Value::Date(ts.date())),
        Value::Str(s) => {
            let s = s.trim();
            NaiveDate::parse_from_str(s, DATE_FORMAT)
                .ok()
                .or_else(|| parse_timestamp(s).map(|ts| ts.date()))
                .map(Value::Date)
                .ok_or_else(|| conversion_error(value, ColumnType::Date))
        }
        _ => Err(conversion_error(value, ColumnType::Date)),
    }
}

fn to_timestamp(value: &Value) -> Result<Value> {
    match value {
        Value::Timestamp(_) => Ok(value.clone()),
        Value::Date(d) => Ok(Value::Timestamp(d.and_time(NaiveTime::MIN))),
        Value::Str(s) => {
            let s = s.trim();
            parse_timestamp(s)
                .or_else(|| {
                    NaiveDate::parse_from_str(s, DATE_FORMAT)
                        .ok()
                        .map(|d| d.and_time(NaiveTime::MIN))
                })
                .map(Value::Timestamp)
                .ok_or_else(|| conversion_error(value, ColumnType::DateTime))
        }
        _ => Err(conversion_error(value, ColumnType::DateTime)),
    }
}

fn to_time(value: &Value) -> Result<Value> {
    match value {
        Value::Time(_) => Ok(value.clone()),
        Value::Timestamp(ts) => Ok(Value::Time(ts.time())),
        Value::Str(s) => {
            let s = s.trim();
            TIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveTime::parse_from_str(s, fmt).ok())
                .map(Value::Time)
                .ok_or_else(|| conversion_error(value, ColumnType::Time))
        }
        _ => Err(conversion_error(value, ColumnType::Time)),
    }
}

fn to_guid(value: &Value) -> Result<Value> {
    match value {
        Value::Uuid(_) => Ok(value.clone()),
        // Uuid::parse_str accepts hyphenated, simple, braced and urn forms
        Value::Str(s) => Uuid::parse_str(s.trim())
            .map(Value::Uuid)
            .map_err(|_| conversion_error(value, ColumnType::Guid)),
        Value::Bytea(b) => Uuid::from_slice(b)
            .map(Value::Uuid)
            .map_err(|_| conversion_error(value, ColumnType::Guid)),
        _ => Err(conversion_error(value, ColumnType::Guid)),
    }
}

fn to_binary(value: &Value) -> Result<Value> {
    match value {
        Value::Bytea(_) => Ok(value.clone()),
        Value::Uuid(u) => Ok(Value::Bytea(u.as_bytes().to_vec())),
        _ => Err(conversion_error(value, ColumnType::Binary)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_null_converts_to_null() {
        for target in [ColumnType::Int, ColumnType::String, ColumnType::Guid] {
            assert_eq!(Value::Null.convert_to(target).unwrap(), Value::Null);
        }
    }

    #[test]
    fn test_float_to_int_truncates() {
        assert_eq!(
            Value::F64(2.9).convert_to(ColumnType::Int).unwrap(),
            Value::I64(2)
        );
        assert_eq!(
            Value::F64(-2.9).convert_to(ColumnType::Int).unwrap(),
            Value::I64(-2)
        );
        assert_eq!(
            Value::Str("7.8".into()).convert_to(ColumnType::Int).unwrap(),
            Value::I64(7)
        );
        assert_eq!(
            Value::Decimal(Decimal::new(-155, 1))
                .convert_to(ColumnType::Int)
                .unwrap(),
            Value::I64(-15)
        );
    }

    #[test]
    fn test_timestamp_to_date_drops_time() {
        let ts = date(2020, 5, 17).and_hms_opt(23, 59, 1).unwrap();
        assert_eq!(
            Value::Timestamp(ts).convert_to(ColumnType::Date).unwrap(),
            Value::Date(date(2020, 5, 17))
        );
        assert_eq!(
            Value::Date(date(2020, 5, 17))
                .convert_to(ColumnType::DateTime)
                .unwrap(),
            Value::Timestamp(date(2020, 5, 17).and_hms_opt(0, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_guid_from_text() {
        let guid = Uuid::parse_str("67e55044-10b1-426f-9247-bb680e5fe0c8").unwrap();
        for text in [
            "67e55044-10b1-426f-9247-bb680e5fe0c8",
            "67E55044-10B1-426F-9247-BB680E5FE0C8",
            "{67e55044-10b1-426f-9247-bb680e5fe0c8}",
            "67e5504410b1426f9247bb680e5fe0c8",
        ] {
            assert_eq!(
                Value::Str(text.into()).convert_to(ColumnType::Guid).unwrap(),
                Value::Uuid(guid)
            );
        }
        assert_eq!(
            Value::Uuid(guid).convert_to(ColumnType::String).unwrap(),
            Value::Str("67e55044-10b1-426f-9247-bb680e5fe0c8".into())
        );
    }

    #[test]
    fn test_string_parsing() {
        assert_eq!(
            Value::Str("2021-02-03 04:05:06".into())
                .convert_to(ColumnType::Date)
                .unwrap(),
            Value::Date(date(2021, 2, 3))
        );
        assert_eq!(
            Value::Str("TRUE".into())
                .convert_to(ColumnType::Boolean)
                .unwrap(),
            Value::Bool(true)
        );
        assert!(
            Value::Str("maybe".into())
                .convert_to(ColumnType::Boolean)
                .is_err()
        );
    }

    #[test]
    fn test_int_widening() {
        assert_eq!(
            Value::I32(3).convert_to(ColumnType::Int).unwrap(),
            Value::I64(3)
        );
        assert_eq!(
            Value::I32(3).convert_to(ColumnType::Decimal).unwrap(),
            Value::Decimal(Decimal::from(3))
        );
        assert_eq!(
            Value::Bool(true).convert_to(ColumnType::Float).unwrap(),
            Value::F64(1.0)
        );
    }

    #[test]
    fn test_invalid_conversions() {
        assert!(matches!(
            Value::Bytea(vec![1]).convert_to(ColumnType::String),
            Err(Error::Conversion { .. })
        ));
        assert!(Value::Date(date(2020, 1, 1)).convert_to(ColumnType::Int).is_err());
    }
}
