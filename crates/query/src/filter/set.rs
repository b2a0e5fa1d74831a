//! Set-membership filters

use super::{Degeneration, Filter, Predicate};
use crate::error::{Error, Result};
use crate::expression::Expression;
use quarry_value::{ColumnType, NamedValues, Value, evaluator};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Integer key column is one of a set of ids. Zero is not an id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdsFilter {
    expression: Expression,
    ids: BTreeSet<i64>,
}

impl IdsFilter {
    pub fn new(expression: Expression, ids: impl IntoIterator<Item = i64>) -> Result<Self> {
        let ids: BTreeSet<i64> = ids.into_iter().collect();
        if ids.contains(&0) {
            return Err(Error::InvalidArgument("Id list cannot contain 0".into()));
        }
        Ok(Self { expression, ids })
    }

    pub fn expression(&self) -> &Expression {
        &self.expression
    }

    pub fn ids(&self) -> &BTreeSet<i64> {
        &self.ids
    }
}

impl Predicate for IdsFilter {
    fn degeneration(&self) -> Degeneration {
        if self.ids.is_empty() {
            Degeneration::AlwaysFalse
        } else {
            Degeneration::Unconstrained
        }
    }

    fn test(&self, source: &dyn NamedValues) -> Result<bool> {
        let value = self.expression.evaluate(source)?;
        if value.is_null() {
            return Ok(false);
        }
        let id = value.convert_to(ColumnType::Int)?.as_i64();
        Ok(id.is_some_and(|id| self.ids.contains(&id)))
    }

    fn expressions(&self) -> Vec<&Expression> {
        vec![&self.expression]
    }

    fn with_column_prefix(&self, prefix: &str) -> Self {
        Self {
            expression: self.expression.with_column_prefix(prefix),
            ids: self.ids.clone(),
        }
    }
}

/// Expression value is one of a list of values. A null member matches null
/// rows. Members and row values are converted to `column_type` before they
/// are compared, so a GUID given as text matches a typed GUID.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValuesFilter {
    expression: Expression,
    values: Vec<Value>,
    column_type: ColumnType,
}

impl ValuesFilter {
    /// `column_type` of `Unknown` is inferred from the first non-null value
    pub fn new(
        expression: Expression,
        values: impl IntoIterator<Item = Value>,
        column_type: ColumnType,
    ) -> Result<Self> {
        let values: Vec<Value> = values.into_iter().collect();
        let column_type = match column_type {
            ColumnType::Unknown => values
                .iter()
                .find(|v| !v.is_null())
                .map(ColumnType::infer)
                .unwrap_or_default(),
            known => known,
        };
        let mut distinct: Vec<Value> = Vec::with_capacity(values.len());
        for value in values {
            let value = if column_type == ColumnType::Unknown {
                value
            } else {
                value.convert_to(column_type)?
            };
            if !distinct.contains(&value) {
                distinct.push(value);
            }
        }
        Ok(Self {
            expression,
            values: distinct,
            column_type,
        })
    }

    pub fn expression(&self) -> &Expression {
        &self.expression
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn column_type(&self) -> ColumnType {
        self.column_type
    }

    pub fn contains_null(&self) -> bool {
        self.values.iter().any(Value::is_null)
    }

    pub fn non_null_values(&self) -> impl Iterator<Item = &Value> {
        self.values.iter().filter(|v| !v.is_null())
    }
}

impl Predicate for ValuesFilter {
    fn degeneration(&self) -> Degeneration {
        if self.values.is_empty() {
            Degeneration::AlwaysFalse
        } else {
            Degeneration::Unconstrained
        }
    }

    fn test(&self, source: &dyn NamedValues) -> Result<bool> {
        let value = self.expression.evaluate(source)?;
        if value.is_null() {
            return Ok(self.contains_null());
        }
        let value = if self.column_type == ColumnType::Unknown {
            value
        } else {
            value.convert_to(self.column_type)?
        };
        for member in self.non_null_values() {
            if evaluator::equals(&value, member)? == Some(true) {
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn expressions(&self) -> Vec<&Expression> {
        vec![&self.expression]
    }

    fn with_column_prefix(&self, prefix: &str) -> Self {
        Self {
            expression: self.expression.with_column_prefix(prefix),
            values: self.values.clone(),
            column_type: self.column_type,
        }
    }
}

impl Filter {
    pub fn ids(column: &str, ids: impl IntoIterator<Item = i64>) -> Result<Filter> {
        Ok(Filter::Ids(IdsFilter::new(Expression::column(column)?, ids)?))
    }

    pub fn values<I, V>(column: &str, values: I) -> Result<Filter>
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Ok(Filter::Values(ValuesFilter::new(
            Expression::column(column)?,
            values.into_iter().map(Into::into),
            ColumnType::Unknown,
        )?))
    }
}
