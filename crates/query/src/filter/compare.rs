//! Comparison, null-check and constant filters

use super::{Degeneration, Filter, Predicate};
use crate::error::{Error, Result};
use crate::expression::{CompareKind, Expression};
use quarry_value::{ColumnType, NamedValues, Value};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// `left <kind> right`. With `null_as_default`, a null operand is replaced
/// by the default value of the other operand's type before comparing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "CompareParts")]
pub struct CompareFilter {
    left: Expression,
    right: Expression,
    kind: CompareKind,
    null_as_default: bool,
    degeneration: Degeneration,
}

/// Decoded form, rebuilt through [`CompareFilter::new`]
#[derive(Deserialize)]
struct CompareParts {
    left: Expression,
    right: Expression,
    kind: CompareKind,
    null_as_default: bool,
    #[allow(dead_code)]
    degeneration: Degeneration,
}

impl TryFrom<CompareParts> for CompareFilter {
    type Error = Error;

    fn try_from(parts: CompareParts) -> Result<Self> {
        CompareFilter::new(parts.left, parts.right, parts.kind, parts.null_as_default)
    }
}

impl CompareFilter {
    pub fn new(
        left: Expression,
        right: Expression,
        kind: CompareKind,
        null_as_default: bool,
    ) -> Result<Self> {
        let mut filter = Self {
            left,
            right,
            kind,
            null_as_default,
            degeneration: Degeneration::Unconstrained,
        };
        if filter.left.is_constant() && filter.right.is_constant() {
            let empty: HashMap<String, Value> = HashMap::new();
            filter.degeneration = Degeneration::from_bool(filter.test(&empty)?);
        }
        Ok(filter)
    }

    pub fn left(&self) -> &Expression {
        &self.left
    }

    pub fn right(&self) -> &Expression {
        &self.right
    }

    pub fn kind(&self) -> CompareKind {
        self.kind
    }

    pub fn null_as_default(&self) -> bool {
        self.null_as_default
    }

    /// Type the operands are compared as: the declared type of a constant
    /// side, else whatever the other side is known to produce
    pub fn compare_type(&self) -> ColumnType {
        match (self.right.result_type(), self.left.result_type()) {
            (ColumnType::Unknown, left) => left,
            (right, _) => right,
        }
    }

    fn compare_values(&self, mut left: Value, mut right: Value) -> Result<bool> {
        let mut target = self.compare_type();
        if target == ColumnType::Unknown {
            target = match (&left, &right) {
                (Value::Null, other) | (other, Value::Null) => ColumnType::infer(other),
                _ => ColumnType::Unknown,
            };
        }
        if self.null_as_default && target != ColumnType::Unknown {
            if left.is_null() {
                left = target.default_value();
            }
            if right.is_null() {
                right = target.default_value();
            }
        }
        // Bring a column value to the declared type of the constant side
        if target != ColumnType::Unknown {
            if self.right.is_constant() && !left.is_null() && left.column_type() != target {
                left = left.convert_to(target)?;
            }
            if self.left.is_constant() && !right.is_null() && right.column_type() != target {
                right = right.convert_to(target)?;
            }
        }
        Ok(self.kind.compare(&left, &right)?.unwrap_or(false))
    }
}

impl Predicate for CompareFilter {
    fn degeneration(&self) -> Degeneration {
        self.degeneration
    }

    fn test(&self, source: &dyn NamedValues) -> Result<bool> {
        let left = self.left.evaluate(source)?;
        let right = self.right.evaluate(source)?;
        self.compare_values(left, right)
    }

    fn expressions(&self) -> Vec<&Expression> {
        vec![&self.left, &self.right]
    }

    fn with_column_prefix(&self, prefix: &str) -> Self {
        Self {
            left: self.left.with_column_prefix(prefix),
            right: self.right.with_column_prefix(prefix),
            ..self.clone()
        }
    }
}

/// `expression IS NULL`, or `IS NOT NULL` when `not_null` is set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NullFilter {
    expression: Expression,
    not_null: bool,
}

impl NullFilter {
    pub fn new(expression: Expression, not_null: bool) -> Self {
        Self {
            expression,
            not_null,
        }
    }

    pub fn expression(&self) -> &Expression {
        &self.expression
    }

    pub fn not_null(&self) -> bool {
        self.not_null
    }
}

impl Predicate for NullFilter {
    fn degeneration(&self) -> Degeneration {
        match self.expression.constant_value() {
            Some(value) => Degeneration::from_bool(value.is_null() != self.not_null),
            None => Degeneration::Unconstrained,
        }
    }

    fn test(&self, source: &dyn NamedValues) -> Result<bool> {
        Ok(self.expression.evaluate(source)?.is_null() != self.not_null)
    }

    fn expressions(&self) -> Vec<&Expression> {
        vec![&self.expression]
    }

    fn with_column_prefix(&self, prefix: &str) -> Self {
        Self::new(self.expression.with_column_prefix(prefix), self.not_null)
    }
}

/// Constant filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DummyFilter {
    value: bool,
}

impl DummyFilter {
    pub fn new(value: bool) -> Self {
        Self { value }
    }

    pub fn value(&self) -> bool {
        self.value
    }
}

impl Predicate for DummyFilter {
    fn degeneration(&self) -> Degeneration {
        Degeneration::from_bool(self.value)
    }

    fn test(&self, _source: &dyn NamedValues) -> Result<bool> {
        Ok(self.value)
    }

    fn expressions(&self) -> Vec<&Expression> {
        Vec::new()
    }

    fn with_column_prefix(&self, _prefix: &str) -> Self {
        *self
    }
}

impl Filter {
    /// `column = value`; a null value gives `column IS NULL`
    pub fn value(column: &str, value: impl Into<Value>) -> Result<Filter> {
        Filter::compare(column, CompareKind::Equal, value)
    }

    /// `column <kind> value` against a constant. Equality with null becomes
    /// a null check; ordering against null matches nothing.
    pub fn compare(column: &str, kind: CompareKind, value: impl Into<Value>) -> Result<Filter> {
        let value = value.into();
        let column = Expression::column(column)?;
        if value.is_null() {
            return Ok(match kind {
                CompareKind::Equal => Filter::Null(NullFilter::new(column, false)),
                CompareKind::NotEqual => Filter::Null(NullFilter::new(column, true)),
                _ => Filter::Dummy(DummyFilter::new(false)),
            });
        }
        Ok(Filter::Compare(CompareFilter::new(
            column,
            Expression::constant(value),
            kind,
            false,
        )?))
    }

    /// Compare two arbitrary expressions
    pub fn compare_expressions(
        left: Expression,
        kind: CompareKind,
        right: Expression,
    ) -> Result<Filter> {
        Ok(Filter::Compare(CompareFilter::new(left, right, kind, false)?))
    }

    pub fn is_null(column: &str) -> Result<Filter> {
        Ok(Filter::Null(NullFilter::new(Expression::column(column)?, false)))
    }

    pub fn not_null(column: &str) -> Result<Filter> {
        Ok(Filter::Null(NullFilter::new(Expression::column(column)?, true)))
    }

    pub fn dummy(value: bool) -> Filter {
        Filter::Dummy(DummyFilter::new(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quarry_value::named_values;

    #[test]
    fn test_dummy_ignores_prefix() {
        let filter = Filter::dummy(true).with_column_prefix("T.");
        assert_eq!(filter, Filter::dummy(true));
        assert!(filter.column_names().is_empty());
    }

    #[test]
    fn test_decoding_recomputes_constant_compare() {
        let tampered = Filter::Compare(CompareFilter {
            left: Expression::constant(1),
            right: Expression::constant(2),
            kind: CompareKind::Equal,
            null_as_default: false,
            degeneration: Degeneration::Unconstrained,
        });
        let decoded = Filter::from_bytes(&tampered.to_bytes().unwrap()).unwrap();
        assert_eq!(decoded.degeneration(), Degeneration::AlwaysFalse);
    }

    #[test]
    fn test_value_filter() {
        let filter = Filter::value("F2", 2).unwrap();
        assert!(filter.test(&named_values([("F2", 2)])).unwrap());
        assert!(!filter.test(&named_values([("F2", 3)])).unwrap());
        // Nulls never compare equal
        assert!(!filter.test(&named_values([("F2", Value::Null)])).unwrap());
        // Numeric widening
        assert!(filter.test(&named_values([("F2", 2i64)])).unwrap());
    }

    #[test]
    fn test_not_equal_is_three_valued() {
        let filter = Filter::compare("F", CompareKind::NotEqual, 1).unwrap();
        assert!(filter.test(&named_values([("F", 2)])).unwrap());
        assert!(!filter.test(&named_values([("F", Value::Null)])).unwrap());
    }

    #[test]
    fn test_null_value_becomes_null_check() {
        let filter = Filter::value("F", Value::Null).unwrap();
        assert!(matches!(filter, Filter::Null(_)));
        assert!(filter.test(&named_values([("F", Value::Null)])).unwrap());
        let filter = Filter::compare("F", CompareKind::NotEqual, Value::Null).unwrap();
        assert!(filter.test(&named_values([("F", 1)])).unwrap());
    }

    #[test]
    fn test_null_as_default() {
        let filter = CompareFilter::new(
            Expression::column("F").unwrap(),
            Expression::constant(0),
            CompareKind::Equal,
            true,
        )
        .unwrap();
        assert!(Filter::Compare(filter).test(&named_values([("F", Value::Null)])).unwrap());
    }

    #[test]
    fn test_converts_column_value_to_constant_type() {
        let filter = Filter::value("D", chrono::NaiveDate::from_ymd_opt(2020, 1, 31).unwrap())
            .unwrap();
        let at_noon = chrono::NaiveDate::from_ymd_opt(2020, 1, 31)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();
        assert!(filter.test(&named_values([("D", at_noon)])).unwrap());
        let guid = uuid::Uuid::nil();
        let filter = Filter::value("G", guid).unwrap();
        assert!(
            filter
                .test(&named_values([("G", guid.to_string().to_uppercase())]))
                .unwrap()
        );
    }

    #[test]
    fn test_constant_comparison_is_degenerate() {
        let yes = Filter::compare_expressions(
            Expression::constant(1),
            CompareKind::LessThan,
            Expression::constant(2),
        )
        .unwrap();
        assert_eq!(yes.degeneration(), Degeneration::AlwaysTrue);
        let null_check = Filter::Null(NullFilter::new(Expression::constant(Value::Null), true));
        assert_eq!(null_check.degeneration(), Degeneration::AlwaysFalse);
    }
}
