//! Numeric and date range filters
//!
//! Plain ranges test one expression against `[first, last]`. Inclusion
//! filters test whether a point lies in the range stored in two columns, and
//! cross filters whether the stored range overlaps `[first, last]`. A null
//! bound, in the filter or in a range column, is open. Date ranges cover
//! whole days; timestamps are compared by their date part.

use super::{Degeneration, Filter, Predicate};
use crate::error::{Error, Result};
use crate::expression::Expression;
use chrono::NaiveDate;
use quarry_value::{ColumnType, NamedValues, Value, evaluator};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

fn numeric_bound(value: Option<Value>) -> Result<Option<Value>> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(v) if v.is_numeric() => Ok(Some(v)),
        Some(v) => Err(Error::InvalidArgument(format!(
            "Numeric range bound expected, got {}",
            v.type_name()
        ))),
    }
}

fn numeric_point(value: Value) -> Result<Option<Value>> {
    match value {
        Value::Null => Ok(None),
        v if v.is_numeric() => Ok(Some(v)),
        v => Ok(Some(v.convert_to(ColumnType::Decimal)?)),
    }
}

fn date_point(value: Value) -> Result<Option<Value>> {
    Ok(match value.convert_to(ColumnType::Date)? {
        Value::Null => None,
        date => Some(date),
    })
}

fn date_bound(date: Option<NaiveDate>) -> Option<Value> {
    date.map(Value::Date)
}

fn ordering(left: &Value, right: &Value) -> Result<Ordering> {
    Ok(evaluator::compare(left, right)?.unwrap_or(Ordering::Equal))
}

/// Both open covers everything, an inverted pair covers nothing
fn bounds_degeneration(first: Option<&Value>, last: Option<&Value>) -> Degeneration {
    match (first, last) {
        (None, None) => Degeneration::AlwaysTrue,
        (Some(first), Some(last)) => match evaluator::compare(first, last) {
            Ok(Some(Ordering::Greater)) => Degeneration::AlwaysFalse,
            _ => Degeneration::Unconstrained,
        },
        _ => Degeneration::Unconstrained,
    }
}

fn within(point: &Value, first: Option<&Value>, last: Option<&Value>) -> Result<bool> {
    if let Some(first) = first
        && ordering(point, first)? == Ordering::Less
    {
        return Ok(false);
    }
    if let Some(last) = last
        && ordering(point, last)? == Ordering::Greater
    {
        return Ok(false);
    }
    Ok(true)
}

/// Whether `[low, high]` (null ends open) overlaps `[first, last]`
fn overlaps(
    low: Option<&Value>,
    high: Option<&Value>,
    first: Option<&Value>,
    last: Option<&Value>,
) -> Result<bool> {
    if let (Some(low), Some(last)) = (low, last)
        && ordering(low, last)? == Ordering::Greater
    {
        return Ok(false);
    }
    if let (Some(high), Some(first)) = (high, first)
        && ordering(high, first)? == Ordering::Less
    {
        return Ok(false);
    }
    Ok(true)
}

/// `first <= expression <= last`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumRangeFilter {
    expression: Expression,
    first: Option<Value>,
    last: Option<Value>,
}

impl NumRangeFilter {
    pub fn new(expression: Expression, first: Option<Value>, last: Option<Value>) -> Result<Self> {
        Ok(Self {
            expression,
            first: numeric_bound(first)?,
            last: numeric_bound(last)?,
        })
    }

    pub fn expression(&self) -> &Expression {
        &self.expression
    }

    pub fn first(&self) -> Option<&Value> {
        self.first.as_ref()
    }

    pub fn last(&self) -> Option<&Value> {
        self.last.as_ref()
    }
}

impl Predicate for NumRangeFilter {
    fn degeneration(&self) -> Degeneration {
        bounds_degeneration(self.first(), self.last())
    }

    fn test(&self, source: &dyn NamedValues) -> Result<bool> {
        match numeric_point(self.expression.evaluate(source)?)? {
            Some(point) => within(&point, self.first(), self.last()),
            None => Ok(false),
        }
    }

    fn expressions(&self) -> Vec<&Expression> {
        vec![&self.expression]
    }

    fn with_column_prefix(&self, prefix: &str) -> Self {
        Self {
            expression: self.expression.with_column_prefix(prefix),
            ..self.clone()
        }
    }
}

/// `first <= date(expression) <= last`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DateRangeFilter {
    expression: Expression,
    first: Option<NaiveDate>,
    last: Option<NaiveDate>,
}

impl DateRangeFilter {
    pub fn new(expression: Expression, first: Option<NaiveDate>, last: Option<NaiveDate>) -> Self {
        Self {
            expression,
            first,
            last,
        }
    }

    pub fn expression(&self) -> &Expression {
        &self.expression
    }

    pub fn first(&self) -> Option<NaiveDate> {
        self.first
    }

    pub fn last(&self) -> Option<NaiveDate> {
        self.last
    }
}

impl Predicate for DateRangeFilter {
    fn degeneration(&self) -> Degeneration {
        bounds_degeneration(date_bound(self.first).as_ref(), date_bound(self.last).as_ref())
    }

    fn test(&self, source: &dyn NamedValues) -> Result<bool> {
        match date_point(self.expression.evaluate(source)?)? {
            Some(point) => within(
                &point,
                date_bound(self.first).as_ref(),
                date_bound(self.last).as_ref(),
            ),
            None => Ok(false),
        }
    }

    fn expressions(&self) -> Vec<&Expression> {
        vec![&self.expression]
    }

    fn with_column_prefix(&self, prefix: &str) -> Self {
        Self {
            expression: self.expression.with_column_prefix(prefix),
            ..self.clone()
        }
    }
}

/// `value` lies in the range stored in `first_column..=last_column`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumRangeInclusionFilter {
    first_column: Expression,
    last_column: Expression,
    value: Value,
}

impl NumRangeInclusionFilter {
    pub fn new(first_column: Expression, last_column: Expression, value: impl Into<Value>) -> Result<Self> {
        let value = numeric_bound(Some(value.into()))?
            .ok_or_else(|| Error::InvalidArgument("Range inclusion point cannot be null".into()))?;
        Ok(Self {
            first_column,
            last_column,
            value,
        })
    }

    pub fn first_column(&self) -> &Expression {
        &self.first_column
    }

    pub fn last_column(&self) -> &Expression {
        &self.last_column
    }

    pub fn value(&self) -> &Value {
        &self.value
    }
}

impl Predicate for NumRangeInclusionFilter {
    fn degeneration(&self) -> Degeneration {
        Degeneration::Unconstrained
    }

    fn test(&self, source: &dyn NamedValues) -> Result<bool> {
        let low = numeric_point(self.first_column.evaluate(source)?)?;
        let high = numeric_point(self.last_column.evaluate(source)?)?;
        within(&self.value, low.as_ref(), high.as_ref())
    }

    fn expressions(&self) -> Vec<&Expression> {
        vec![&self.first_column, &self.last_column]
    }

    fn with_column_prefix(&self, prefix: &str) -> Self {
        Self {
            first_column: self.first_column.with_column_prefix(prefix),
            last_column: self.last_column.with_column_prefix(prefix),
            value: self.value.clone(),
        }
    }
}

/// `value` lies in the date range stored in `first_column..=last_column`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DateRangeInclusionFilter {
    first_column: Expression,
    last_column: Expression,
    value: NaiveDate,
}

impl DateRangeInclusionFilter {
    pub fn new(first_column: Expression, last_column: Expression, value: NaiveDate) -> Self {
        Self {
            first_column,
            last_column,
            value,
        }
    }

    pub fn first_column(&self) -> &Expression {
        &self.first_column
    }

    pub fn last_column(&self) -> &Expression {
        &self.last_column
    }

    pub fn value(&self) -> NaiveDate {
        self.value
    }
}

impl Predicate for DateRangeInclusionFilter {
    fn degeneration(&self) -> Degeneration {
        Degeneration::Unconstrained
    }

    fn test(&self, source: &dyn NamedValues) -> Result<bool> {
        let low = date_point(self.first_column.evaluate(source)?)?;
        let high = date_point(self.last_column.evaluate(source)?)?;
        within(&Value::Date(self.value), low.as_ref(), high.as_ref())
    }

    fn expressions(&self) -> Vec<&Expression> {
        vec![&self.first_column, &self.last_column]
    }

    fn with_column_prefix(&self, prefix: &str) -> Self {
        Self {
            first_column: self.first_column.with_column_prefix(prefix),
            last_column: self.last_column.with_column_prefix(prefix),
            value: self.value,
        }
    }
}

/// The range stored in `first_column..=last_column` overlaps `[first, last]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumRangeCrossFilter {
    first_column: Expression,
    last_column: Expression,
    first: Option<Value>,
    last: Option<Value>,
}

impl NumRangeCrossFilter {
    pub fn new(
        first_column: Expression,
        last_column: Expression,
        first: Option<Value>,
        last: Option<Value>,
    ) -> Result<Self> {
        Ok(Self {
            first_column,
            last_column,
            first: numeric_bound(first)?,
            last: numeric_bound(last)?,
        })
    }

    pub fn first_column(&self) -> &Expression {
        &self.first_column
    }

    pub fn last_column(&self) -> &Expression {
        &self.last_column
    }

    pub fn first(&self) -> Option<&Value> {
        self.first.as_ref()
    }

    pub fn last(&self) -> Option<&Value> {
        self.last.as_ref()
    }
}

impl Predicate for NumRangeCrossFilter {
    fn degeneration(&self) -> Degeneration {
        bounds_degeneration(self.first(), self.last())
    }

    fn test(&self, source: &dyn NamedValues) -> Result<bool> {
        let low = numeric_point(self.first_column.evaluate(source)?)?;
        let high = numeric_point(self.last_column.evaluate(source)?)?;
        overlaps(low.as_ref(), high.as_ref(), self.first(), self.last())
    }

    fn expressions(&self) -> Vec<&Expression> {
        vec![&self.first_column, &self.last_column]
    }

    fn with_column_prefix(&self, prefix: &str) -> Self {
        Self {
            first_column: self.first_column.with_column_prefix(prefix),
            last_column: self.last_column.with_column_prefix(prefix),
            ..self.clone()
        }
    }
}

/// The date range stored in `first_column..=last_column` overlaps
/// `[first, last]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DateRangeCrossFilter {
    first_column: Expression,
    last_column: Expression,
    first: Option<NaiveDate>,
    last: Option<NaiveDate>,
}

impl DateRangeCrossFilter {
    pub fn new(
        first_column: Expression,
        last_column: Expression,
        first: Option<NaiveDate>,
        last: Option<NaiveDate>,
    ) -> Self {
        Self {
            first_column,
            last_column,
            first,
            last,
        }
    }

    pub fn first_column(&self) -> &Expression {
        &self.first_column
    }

    pub fn last_column(&self) -> &Expression {
        &self.last_column
    }

    pub fn first(&self) -> Option<NaiveDate> {
        self.first
    }

    pub fn last(&self) -> Option<NaiveDate> {
        self.last
    }
}

impl Predicate for DateRangeCrossFilter {
    fn degeneration(&self) -> Degeneration {
        bounds_degeneration(date_bound(self.first).as_ref(), date_bound(self.last).as_ref())
    }

    fn test(&self, source: &dyn NamedValues) -> Result<bool> {
        let low = date_point(self.first_column.evaluate(source)?)?;
        let high = date_point(self.last_column.evaluate(source)?)?;
        overlaps(
            low.as_ref(),
            high.as_ref(),
            date_bound(self.first).as_ref(),
            date_bound(self.last).as_ref(),
        )
    }

    fn expressions(&self) -> Vec<&Expression> {
        vec![&self.first_column, &self.last_column]
    }

    fn with_column_prefix(&self, prefix: &str) -> Self {
        Self {
            first_column: self.first_column.with_column_prefix(prefix),
            last_column: self.last_column.with_column_prefix(prefix),
            ..self.clone()
        }
    }
}

impl Filter {
    pub fn num_range(column: &str, first: Option<Value>, last: Option<Value>) -> Result<Filter> {
        Ok(Filter::NumRange(NumRangeFilter::new(
            Expression::column(column)?,
            first,
            last,
        )?))
    }

    pub fn date_range(
        column: &str,
        first: Option<NaiveDate>,
        last: Option<NaiveDate>,
    ) -> Result<Filter> {
        Ok(Filter::DateRange(DateRangeFilter::new(
            Expression::column(column)?,
            first,
            last,
        )))
    }

    pub fn num_range_inclusion(
        first_column: &str,
        last_column: &str,
        value: impl Into<Value>,
    ) -> Result<Filter> {
        Ok(Filter::NumRangeInclusion(NumRangeInclusionFilter::new(
            Expression::column(first_column)?,
            Expression::column(last_column)?,
            value,
        )?))
    }

    pub fn date_range_inclusion(
        first_column: &str,
        last_column: &str,
        value: NaiveDate,
    ) -> Result<Filter> {
        Ok(Filter::DateRangeInclusion(DateRangeInclusionFilter::new(
            Expression::column(first_column)?,
            Expression::column(last_column)?,
            value,
        )))
    }

    pub fn num_range_cross(
        first_column: &str,
        last_column: &str,
        first: Option<Value>,
        last: Option<Value>,
    ) -> Result<Filter> {
        Ok(Filter::NumRangeCross(NumRangeCrossFilter::new(
            Expression::column(first_column)?,
            Expression::column(last_column)?,
            first,
            last,
        )?))
    }

    pub fn date_range_cross(
        first_column: &str,
        last_column: &str,
        first: Option<NaiveDate>,
        last: Option<NaiveDate>,
    ) -> Result<Filter> {
        Ok(Filter::DateRangeCross(DateRangeCrossFilter::new(
            Expression::column(first_column)?,
            Expression::column(last_column)?,
            first,
            last,
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quarry_value::named_values;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_num_range_degeneration() {
        let inverted = Filter::num_range("F", Some(3.into()), Some(2.into())).unwrap();
        assert_eq!(inverted.degeneration(), Degeneration::AlwaysFalse);
        let open = Filter::num_range("F", None, None).unwrap();
        assert_eq!(open.degeneration(), Degeneration::AlwaysTrue);
        let half = Filter::num_range("F", Some(3.into()), None).unwrap();
        assert_eq!(half.degeneration(), Degeneration::Unconstrained);
        let point = Filter::num_range("F", Some(2.into()), Some(2.into())).unwrap();
        assert_eq!(point.degeneration(), Degeneration::Unconstrained);
    }

    #[test]
    fn test_num_range_bounds_inclusive() {
        let filter = Filter::num_range("F", Some(1.into()), Some(Value::F64(2.5))).unwrap();
        assert!(filter.test(&named_values([("F", 1)])).unwrap());
        assert!(filter.test(&named_values([("F", 2.5)])).unwrap());
        assert!(!filter.test(&named_values([("F", 3)])).unwrap());
        assert!(!filter.test(&named_values([("F", Value::Null)])).unwrap());
        assert!(Filter::num_range("F", Some("x".into()), None).is_err());
    }

    #[test]
    fn test_date_range_covers_whole_days() {
        let filter =
            Filter::date_range("D", Some(date(2020, 1, 1)), Some(date(2020, 1, 31))).unwrap();
        let late = date(2020, 1, 31).and_hms_opt(23, 59, 59).unwrap();
        assert!(filter.test(&named_values([("D", late)])).unwrap());
        assert!(!filter.test(&named_values([("D", date(2020, 2, 1))])).unwrap());
        let inverted =
            Filter::date_range("D", Some(date(2020, 2, 1)), Some(date(2020, 1, 1))).unwrap();
        assert!(inverted.is_always_false());
    }

    #[test]
    fn test_inclusion_with_open_columns() {
        let filter = Filter::num_range_inclusion("Lo", "Hi", 5).unwrap();
        assert!(filter.test(&named_values([("Lo", Value::I32(1)), ("Hi", Value::I32(5))])).unwrap());
        assert!(filter.test(&named_values([("Lo", Value::Null), ("Hi", Value::I32(9))])).unwrap());
        assert!(!filter.test(&named_values([("Lo", Value::I32(6)), ("Hi", Value::Null)])).unwrap());
        assert_eq!(filter.degeneration(), Degeneration::Unconstrained);
    }

    #[test]
    fn test_date_cross() {
        let filter = Filter::date_range_cross(
            "From",
            "To",
            Some(date(2020, 3, 1)),
            Some(date(2020, 3, 31)),
        )
        .unwrap();
        let row = |from: Value, to: Value| named_values([("From", from), ("To", to)]);
        assert!(filter.test(&row(date(2020, 2, 1).into(), date(2020, 3, 1).into())).unwrap());
        assert!(!filter.test(&row(date(2020, 1, 1).into(), date(2020, 2, 28).into())).unwrap());
        assert!(filter.test(&row(Value::Null, Value::Null)).unwrap());
        assert!(!filter.test(&row(date(2020, 4, 1).into(), Value::Null)).unwrap());
        let open = Filter::date_range_cross("From", "To", None, None).unwrap();
        assert!(open.is_always_true());
    }
}
