//! Value evaluation operations
//!
//! Arithmetic and comparison on [`Value`], keeping the value type itself a
//! pure data representation. Arithmetic follows the numeric tower:
//! integer with integer stays integer, decimal wins over integer, and any
//! float operand makes the result a float. `Null` in any operand yields
//! `Null`.

use crate::error::{Error, Result};
use crate::types::Value;
use chrono::{NaiveTime, TimeDelta};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use std::cmp::Ordering;

/// Helper to convert any numeric value to Decimal for mixed-type operations
fn to_decimal(value: &Value) -> Option<Decimal> {
    match value {
        Value::I32(n) => Some(Decimal::from(*n)),
        Value::I64(n) => Some(Decimal::from(*n)),
        Value::F64(n) => Decimal::from_f64_retain(*n),
        Value::Decimal(d) => Some(*d),
        _ => None,
    }
}

/// Helper to convert any numeric value to f64
fn to_f64(value: &Value) -> Option<f64> {
    match value {
        Value::I32(n) => Some(*n as f64),
        Value::I64(n) => Some(*n as f64),
        Value::F64(n) => Some(*n),
        Value::Decimal(d) => d.to_f64(),
        _ => None,
    }
}

fn mismatch(op: &str, left: &Value, right: &Value) -> Error {
    Error::TypeMismatch {
        expected: format!("operands valid for {}", op),
        found: format!("{} and {}", left.type_name(), right.type_name()),
    }
}

/// Numeric class of a pair of operands, the widest wins
enum NumericClass {
    I32(i32, i32),
    I64(i64, i64),
    Decimal(Decimal, Decimal),
    F64(f64, f64),
}

fn classify(left: &Value, right: &Value) -> Option<NumericClass> {
    if !left.is_numeric() || !right.is_numeric() {
        return None;
    }
    match (left, right) {
        (Value::I32(a), Value::I32(b)) => Some(NumericClass::I32(*a, *b)),
        (Value::F64(_), _) | (_, Value::F64(_)) => {
            Some(NumericClass::F64(to_f64(left)?, to_f64(right)?))
        }
        (Value::Decimal(_), _) | (_, Value::Decimal(_)) => {
            Some(NumericClass::Decimal(to_decimal(left)?, to_decimal(right)?))
        }
        _ => Some(NumericClass::I64(left.as_i64()?, right.as_i64()?)),
    }
}

/// Apply a checked integer operation. I32 overflow widens to I64, I64
/// overflow is an error.
macro_rules! integer_op {
    ($class:expr, $checked:ident, $name:expr, $float:expr, $dec:expr) => {
        match $class {
            NumericClass::I32(a, b) => Ok(a
                .$checked(b)
                .map(Value::I32)
                .or_else(|| (a as i64).$checked(b as i64).map(Value::I64))
                .ok_or_else(|| Error::InvalidValue(format!("I64 {}", $name)))?),
            NumericClass::I64(a, b) => a
                .$checked(b)
                .map(Value::I64)
                .ok_or_else(|| Error::InvalidValue(format!("I64 {}", $name))),
            NumericClass::Decimal(a, b) => $dec(a, b)
                .map(Value::Decimal)
                .ok_or_else(|| Error::InvalidValue(format!("Decimal {}", $name))),
            NumericClass::F64(a, b) => Ok(Value::F64($float(a, b))),
        }
    };
}

/// Add two values: numbers, string concatenation, or date plus days
pub fn add(left: &Value, right: &Value) -> Result<Value> {
    if left.is_null() || right.is_null() {
        return Ok(Value::Null);
    }
    if let Some(class) = classify(left, right) {
        return integer_op!(
            class,
            checked_add,
            "overflow",
            |a: f64, b: f64| a + b,
            |a: Decimal, b: Decimal| a.checked_add(b)
        );
    }
    match (left, right) {
        (Value::Str(a), Value::Str(b)) => Ok(Value::Str(format!("{}{}", a, b))),
        (Value::Date(date), days) | (days, Value::Date(date)) if days.is_integer() => {
            let days = days.as_i64().unwrap_or_default();
            TimeDelta::try_days(days)
                .and_then(|delta| date.checked_add_signed(delta))
                .map(Value::Date)
                .ok_or_else(|| Error::InvalidValue("Date overflow".into()))
        }
        _ => Err(mismatch("addition", left, right)),
    }
}

/// Subtract `right` from `left`
pub fn subtract(left: &Value, right: &Value) -> Result<Value> {
    if left.is_null() || right.is_null() {
        return Ok(Value::Null);
    }
    if let Some(class) = classify(left, right) {
        return integer_op!(
            class,
            checked_sub,
            "underflow",
            |a: f64, b: f64| a - b,
            |a: Decimal, b: Decimal| a.checked_sub(b)
        );
    }
    match (left, right) {
        (Value::Date(date), days) if days.is_integer() => {
            let days = days.as_i64().unwrap_or_default();
            TimeDelta::try_days(days)
                .and_then(|delta| date.checked_sub_signed(delta))
                .map(Value::Date)
                .ok_or_else(|| Error::InvalidValue("Date underflow".into()))
        }
        // Difference of two dates is a day count
        (Value::Date(a), Value::Date(b)) => Ok(Value::I64((*a - *b).num_days())),
        _ => Err(mismatch("subtraction", left, right)),
    }
}

/// Multiply two numbers
pub fn multiply(left: &Value, right: &Value) -> Result<Value> {
    if left.is_null() || right.is_null() {
        return Ok(Value::Null);
    }
    match classify(left, right) {
        Some(class) => integer_op!(
            class,
            checked_mul,
            "overflow",
            |a: f64, b: f64| a * b,
            |a: Decimal, b: Decimal| a.checked_mul(b)
        ),
        None => Err(mismatch("multiplication", left, right)),
    }
}

/// Divide two numbers. Integer division truncates; dividing by zero is an error.
pub fn divide(left: &Value, right: &Value) -> Result<Value> {
    if left.is_null() || right.is_null() {
        return Ok(Value::Null);
    }
    let class = classify(left, right).ok_or_else(|| mismatch("division", left, right))?;
    let zero = match &class {
        NumericClass::I32(_, b) => *b == 0,
        NumericClass::I64(_, b) => *b == 0,
        NumericClass::Decimal(_, b) => b.is_zero(),
        NumericClass::F64(_, b) => *b == 0.0,
    };
    if zero {
        return Err(Error::InvalidValue("Division by zero".into()));
    }
    integer_op!(
        class,
        checked_div,
        "overflow",
        |a: f64, b: f64| a / b,
        |a: Decimal, b: Decimal| a.checked_div(b)
    )
}

/// Arithmetic negation
pub fn negate(value: &Value) -> Result<Value> {
    match value {
        Value::Null => Ok(Value::Null),
        Value::I32(i) => Ok(i
            .checked_neg()
            .map(Value::I32)
            .unwrap_or(Value::I64(-(*i as i64)))),
        Value::I64(i) => i
            .checked_neg()
            .map(Value::I64)
            .ok_or_else(|| Error::InvalidValue("I64 overflow".into())),
        Value::F64(f) => Ok(Value::F64(-f)),
        Value::Decimal(d) => Ok(Value::Decimal(-*d)),
        other => Err(Error::TypeMismatch {
            expected: "numeric".into(),
            found: other.type_name().into(),
        }),
    }
}

/// Absolute value
pub fn abs(value: &Value) -> Result<Value> {
    match value {
        Value::Null => Ok(Value::Null),
        Value::I32(i) => Ok(i
            .checked_abs()
            .map(Value::I32)
            .unwrap_or(Value::I64((*i as i64).abs()))),
        Value::I64(i) => i
            .checked_abs()
            .map(Value::I64)
            .ok_or_else(|| Error::InvalidValue("I64 overflow".into())),
        Value::F64(f) => Ok(Value::F64(f.abs())),
        Value::Decimal(d) => Ok(Value::Decimal(d.abs())),
        other => Err(Error::TypeMismatch {
            expected: "numeric".into(),
            found: other.type_name().into(),
        }),
    }
}

fn compare_f64(a: f64, b: f64) -> Ordering {
    // NaN sorts after every regular number
    match a.partial_cmp(&b) {
        Some(ord) => ord,
        None => match (a.is_nan(), b.is_nan()) {
            (true, true) => Ordering::Equal,
            (true, false) => Ordering::Greater,
            _ => Ordering::Less,
        },
    }
}

/// Three-valued comparison. `Ok(None)` when either operand is null,
/// an error when the operands are not comparable.
pub fn compare(left: &Value, right: &Value) -> Result<Option<Ordering>> {
    if left.is_null() || right.is_null() {
        return Ok(None);
    }
    let ord = match (left, right) {
        (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
        (Value::Str(a), Value::Str(b)) => a.cmp(b),
        (Value::Date(a), Value::Date(b)) => a.cmp(b),
        (Value::Time(a), Value::Time(b)) => a.cmp(b),
        (Value::Timestamp(a), Value::Timestamp(b)) => a.cmp(b),
        // A date compares as its midnight
        (Value::Date(a), Value::Timestamp(b)) => a.and_time(NaiveTime::MIN).cmp(b),
        (Value::Timestamp(a), Value::Date(b)) => a.cmp(&b.and_time(NaiveTime::MIN)),
        (Value::Uuid(a), Value::Uuid(b)) => a.cmp(b),
        (Value::Bytea(a), Value::Bytea(b)) => a.cmp(b),
        (l, r) => match classify(l, r) {
            Some(NumericClass::I32(a, b)) => a.cmp(&b),
            Some(NumericClass::I64(a, b)) => a.cmp(&b),
            Some(NumericClass::Decimal(a, b)) => a.cmp(&b),
            Some(NumericClass::F64(a, b)) => compare_f64(a, b),
            None => return Err(mismatch("comparison", l, r)),
        },
    };
    Ok(Some(ord))
}

/// Total order for sorting: null sorts first, incomparable kinds by type name
pub fn compare_total(left: &Value, right: &Value) -> Ordering {
    match (left.is_null(), right.is_null()) {
        (true, true) => return Ordering::Equal,
        (true, false) => return Ordering::Less,
        (false, true) => return Ordering::Greater,
        _ => {}
    }
    match compare(left, right) {
        Ok(Some(ord)) => ord,
        _ => left.type_name().cmp(right.type_name()),
    }
}

/// SQL-style equality: `None` when either side is null
pub fn equals(left: &Value, right: &Value) -> Result<Option<bool>> {
    Ok(compare(left, right)?.map(|ord| ord == Ordering::Equal))
}
