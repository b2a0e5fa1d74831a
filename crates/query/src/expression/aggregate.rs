//! Aggregate function nodes

use super::Expression;
use crate::error::{Error, Result};
use quarry_value::{ColumnType, NamedValues, Value, evaluator};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AggregateKind {
    Count,
    Sum,
    Min,
    Max,
    Average,
}

impl AggregateKind {
    /// SQL function name
    pub fn sql_name(self) -> &'static str {
        match self {
            AggregateKind::Count => "COUNT",
            AggregateKind::Sum => "SUM",
            AggregateKind::Min => "MIN",
            AggregateKind::Max => "MAX",
            AggregateKind::Average => "AVG",
        }
    }
}

impl fmt::Display for AggregateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.sql_name())
    }
}

/// Aggregate over a group of rows. Only `Count` may omit its argument.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "AggregateParts")]
pub struct AggregateExpr {
    kind: AggregateKind,
    arg: Option<Box<Expression>>,
}

#[derive(Deserialize)]
struct AggregateParts {
    kind: AggregateKind,
    arg: Option<Box<Expression>>,
}

impl TryFrom<AggregateParts> for AggregateExpr {
    type Error = Error;

    fn try_from(parts: AggregateParts) -> Result<Self> {
        AggregateExpr::new(parts.kind, parts.arg.map(|arg| *arg))
    }
}

impl AggregateExpr {
    pub fn new(kind: AggregateKind, arg: Option<Expression>) -> Result<Self> {
        match &arg {
            None if kind != AggregateKind::Count => {
                return Err(Error::ArgumentCount {
                    function: kind.sql_name().to_string(),
                    min: 1,
                    max: Some(1),
                    found: 0,
                });
            }
            Some(inner) if inner.contains_aggregate() => {
                return Err(Error::InvalidArgument(format!(
                    "{} cannot contain another aggregate",
                    kind.sql_name()
                )));
            }
            _ => {}
        }
        Ok(Self {
            kind,
            arg: arg.map(Box::new),
        })
    }

    pub fn count_all() -> Self {
        Self {
            kind: AggregateKind::Count,
            arg: None,
        }
    }

    pub fn kind(&self) -> AggregateKind {
        self.kind
    }

    pub fn arg(&self) -> Option<&Expression> {
        self.arg.as_deref()
    }

    pub(crate) fn map_arg(&self, f: impl Fn(&Expression) -> Expression) -> Self {
        Self {
            kind: self.kind,
            arg: self.arg.as_deref().map(|a| Box::new(f(a))),
        }
    }

    pub fn result_type(&self) -> ColumnType {
        match self.kind {
            AggregateKind::Count => ColumnType::Int,
            AggregateKind::Average => ColumnType::Float,
            _ => self
                .arg
                .as_deref()
                .map(Expression::result_type)
                .unwrap_or_default(),
        }
    }

    /// Aggregate the argument over `rows`. Nulls are skipped; `COUNT(*)`
    /// counts every row.
    pub(crate) fn evaluate_rows(&self, rows: &[&dyn NamedValues]) -> Result<Value> {
        let Some(arg) = self.arg.as_deref() else {
            return Ok(Value::I64(rows.len() as i64));
        };
        let mut values = Vec::with_capacity(rows.len());
        for row in rows {
            let value = arg.evaluate(*row)?;
            if !value.is_null() {
                values.push(value);
            }
        }
        match self.kind {
            AggregateKind::Count => Ok(Value::I64(values.len() as i64)),
            AggregateKind::Sum => sum(&values),
            AggregateKind::Min => Ok(extreme(values, Ordering::Less)),
            AggregateKind::Max => Ok(extreme(values, Ordering::Greater)),
            AggregateKind::Average => {
                if values.is_empty() {
                    return Ok(Value::Null);
                }
                let count = values.len();
                match sum(&values)? {
                    Value::Decimal(total) => Ok(Value::Decimal(total / Decimal::from(count))),
                    total => match total.convert_to(ColumnType::Float)? {
                        Value::F64(total) => Ok(Value::F64(total / count as f64)),
                        other => Err(quarry_value::Error::TypeMismatch {
                            expected: "numeric".into(),
                            found: other.type_name().into(),
                        }
                        .into()),
                    },
                }
            }
        }
    }
}

fn sum(values: &[Value]) -> Result<Value> {
    let mut total = Value::Null;
    for value in values {
        total = if total.is_null() {
            value.clone()
        } else {
            evaluator::add(&total, value)?
        };
    }
    Ok(total)
}

fn extreme(values: Vec<Value>, wanted: Ordering) -> Value {
    values
        .into_iter()
        .reduce(|best, v| {
            if evaluator::compare_total(&v, &best) == wanted {
                v
            } else {
                best
            }
        })
        .unwrap_or(Value::Null)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decoding_checks_argument() {
        let bare_sum = Expression::Aggregate(AggregateExpr {
            kind: AggregateKind::Sum,
            arg: None,
        });
        assert!(Expression::from_bytes(&bare_sum.to_bytes().unwrap()).is_err());

        let count = Expression::count_all();
        assert_eq!(Expression::from_bytes(&count.to_bytes().unwrap()).unwrap(), count);
    }
}
