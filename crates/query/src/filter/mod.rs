//! Filter algebra
//!
//! Filters are immutable predicate trees over expressions. Every filter
//! knows its [`Degeneration`]: whether its truth value is fixed regardless of
//! row data. Combining filters through [`and`], [`or`], [`not`] or
//! [`Filter::from_list`] collapses degenerate members so trivially true or
//! false sub-filters are never rendered to SQL.
//!
//! `Option<Filter>` is the "maybe filtered" type: `None` means no filter at
//! all, which behaves as unconstrained.

mod compare;
mod logical;
mod range;
mod set;
mod string;

pub use compare::{CompareFilter, DummyFilter, NullFilter};
pub use logical::{AndFilter, NotFilter, OrFilter, and, not, or};
pub use range::{
    DateRangeCrossFilter, DateRangeFilter, DateRangeInclusionFilter, NumRangeCrossFilter,
    NumRangeFilter, NumRangeInclusionFilter,
};
pub use set::{IdsFilter, ValuesFilter};
pub use string::{StartsWithFilter, StringValueFilter, SubstringFilter};

use crate::codec;
use crate::columns::{ColumnList, ColumnListBuilder};
use crate::error::{Error, Result};
use crate::expression::Expression;
use crate::format::{DefaultFormatter, SqlBuffer};
use quarry_value::{DataTable, NamedValues, Value};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Truth value of a filter known without looking at any row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Degeneration {
    /// Depends on row data
    #[default]
    Unconstrained,
    AlwaysTrue,
    AlwaysFalse,
}

impl Degeneration {
    pub fn from_bool(value: bool) -> Self {
        if value {
            Degeneration::AlwaysTrue
        } else {
            Degeneration::AlwaysFalse
        }
    }

    /// The fixed truth value, if any
    pub fn as_bool(self) -> Option<bool> {
        match self {
            Degeneration::Unconstrained => None,
            Degeneration::AlwaysTrue => Some(true),
            Degeneration::AlwaysFalse => Some(false),
        }
    }

    pub fn negate(self) -> Self {
        match self {
            Degeneration::Unconstrained => Degeneration::Unconstrained,
            Degeneration::AlwaysTrue => Degeneration::AlwaysFalse,
            Degeneration::AlwaysFalse => Degeneration::AlwaysTrue,
        }
    }

    /// Conjunction: false if any member is false, true only if all are true
    pub fn and_all(items: impl IntoIterator<Item = Degeneration>) -> Self {
        let mut result = Degeneration::AlwaysTrue;
        for item in items {
            match item {
                Degeneration::AlwaysFalse => return Degeneration::AlwaysFalse,
                Degeneration::Unconstrained => result = Degeneration::Unconstrained,
                Degeneration::AlwaysTrue => {}
            }
        }
        result
    }

    /// Disjunction: true if any member is true, false only if all are false
    pub fn or_all(items: impl IntoIterator<Item = Degeneration>) -> Self {
        Degeneration::and_all(items.into_iter().map(Degeneration::negate)).negate()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Filter {
    And(AndFilter),
    Or(OrFilter),
    Not(NotFilter),
    Compare(CompareFilter),
    Null(NullFilter),
    Ids(IdsFilter),
    Values(ValuesFilter),
    NumRange(NumRangeFilter),
    DateRange(DateRangeFilter),
    NumRangeInclusion(NumRangeInclusionFilter),
    DateRangeInclusion(DateRangeInclusionFilter),
    NumRangeCross(NumRangeCrossFilter),
    DateRangeCross(DateRangeCrossFilter),
    StringValue(StringValueFilter),
    StartsWith(StartsWithFilter),
    Substring(SubstringFilter),
    Dummy(DummyFilter),
}

/// Behaviour shared by all leaf filters
pub(crate) trait Predicate: Sized {
    fn degeneration(&self) -> Degeneration;

    /// Row test; only called for non-degenerate filters
    fn test(&self, source: &dyn NamedValues) -> Result<bool>;

    /// Expressions the filter tests, in rendering order
    fn expressions(&self) -> Vec<&Expression>;

    fn with_column_prefix(&self, prefix: &str) -> Self;
}

/// Dispatch over the leaf variants; composite filters go to `$other`
macro_rules! for_leaf {
    ($filter:expr, $leaf:ident => $body:expr, $composite:ident => $other:expr) => {
        match $filter {
            Filter::Compare($leaf) => $body,
            Filter::Null($leaf) => $body,
            Filter::Ids($leaf) => $body,
            Filter::Values($leaf) => $body,
            Filter::NumRange($leaf) => $body,
            Filter::DateRange($leaf) => $body,
            Filter::NumRangeInclusion($leaf) => $body,
            Filter::DateRangeInclusion($leaf) => $body,
            Filter::NumRangeCross($leaf) => $body,
            Filter::DateRangeCross($leaf) => $body,
            Filter::StringValue($leaf) => $body,
            Filter::StartsWith($leaf) => $body,
            Filter::Substring($leaf) => $body,
            Filter::Dummy($leaf) => $body,
            $composite @ (Filter::And(_) | Filter::Or(_) | Filter::Not(_)) => $other,
        }
    };
}

impl Filter {
    pub fn degeneration(&self) -> Degeneration {
        for_leaf!(self, leaf => leaf.degeneration(), composite => match composite {
            Filter::And(f) => f.degeneration(),
            Filter::Or(f) => f.degeneration(),
            Filter::Not(f) => f.degeneration(),
            _ => Degeneration::Unconstrained,
        })
    }

    pub fn is_always_true(&self) -> bool {
        self.degeneration() == Degeneration::AlwaysTrue
    }

    pub fn is_always_false(&self) -> bool {
        self.degeneration() == Degeneration::AlwaysFalse
    }

    pub fn is_degenerate(&self) -> bool {
        self.degeneration() != Degeneration::Unconstrained
    }

    /// Test the filter against a row. Degenerate filters answer without
    /// reading any column.
    pub fn test(&self, source: &dyn NamedValues) -> Result<bool> {
        if let Some(fixed) = self.degeneration().as_bool() {
            return Ok(fixed);
        }
        for_leaf!(self, leaf => leaf.test(source), composite => match composite {
            Filter::And(f) => {
                for child in f.filters() {
                    if !child.test(source)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            Filter::Or(f) => {
                for child in f.filters() {
                    if child.test(source)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
            Filter::Not(f) => Ok(!f.inner().test(source)?),
            _ => Ok(true),
        })
    }

    /// Append every column name referenced anywhere in the tree
    pub fn collect_column_names(&self, into: &mut ColumnListBuilder) {
        for_leaf!(self, leaf => {
            for expression in leaf.expressions() {
                expression.collect_column_names(into);
            }
        }, composite => match composite {
            Filter::And(f) => f.filters().iter().for_each(|c| c.collect_column_names(into)),
            Filter::Or(f) => f.filters().iter().for_each(|c| c.collect_column_names(into)),
            Filter::Not(f) => f.inner().collect_column_names(into),
            _ => {}
        })
    }

    pub fn column_names(&self) -> ColumnList {
        let mut builder = ColumnListBuilder::new();
        self.collect_column_names(&mut builder);
        builder.build()
    }

    /// Copy of the tree with `prefix` prepended to every column name
    pub fn with_column_prefix(&self, prefix: &str) -> Filter {
        match self {
            Filter::And(f) => Filter::And(f.map_children(|c| c.with_column_prefix(prefix))),
            Filter::Or(f) => Filter::Or(f.map_children(|c| c.with_column_prefix(prefix))),
            Filter::Not(f) => Filter::Not(NotFilter::new(f.inner().with_column_prefix(prefix))),
            Filter::Compare(f) => Filter::Compare(f.with_column_prefix(prefix)),
            Filter::Null(f) => Filter::Null(f.with_column_prefix(prefix)),
            Filter::Ids(f) => Filter::Ids(f.with_column_prefix(prefix)),
            Filter::Values(f) => Filter::Values(f.with_column_prefix(prefix)),
            Filter::NumRange(f) => Filter::NumRange(f.with_column_prefix(prefix)),
            Filter::DateRange(f) => Filter::DateRange(f.with_column_prefix(prefix)),
            Filter::NumRangeInclusion(f) => {
                Filter::NumRangeInclusion(f.with_column_prefix(prefix))
            }
            Filter::DateRangeInclusion(f) => {
                Filter::DateRangeInclusion(f.with_column_prefix(prefix))
            }
            Filter::NumRangeCross(f) => Filter::NumRangeCross(f.with_column_prefix(prefix)),
            Filter::DateRangeCross(f) => Filter::DateRangeCross(f.with_column_prefix(prefix)),
            Filter::StringValue(f) => Filter::StringValue(f.with_column_prefix(prefix)),
            Filter::StartsWith(f) => Filter::StartsWith(f.with_column_prefix(prefix)),
            Filter::Substring(f) => Filter::Substring(f.with_column_prefix(prefix)),
            Filter::Dummy(f) => Filter::Dummy(f.with_column_prefix(prefix)),
        }
    }

    /// Pre-order traversal of the filter tree
    pub fn all_filters<'a>(&'a self, into: &mut Vec<&'a Filter>) {
        into.push(self);
        match self {
            Filter::And(f) => f.filters().iter().for_each(|c| c.all_filters(into)),
            Filter::Or(f) => f.filters().iter().for_each(|c| c.all_filters(into)),
            Filter::Not(f) => f.inner().all_filters(into),
            _ => {}
        }
    }

    /// Pre-order traversal of every expression tested anywhere in the tree
    pub fn all_expressions<'a>(&'a self, into: &mut Vec<&'a Expression>) {
        for_leaf!(self, leaf => {
            for expression in leaf.expressions() {
                expression.all_expressions(into);
            }
        }, composite => match composite {
            Filter::And(f) => f.filters().iter().for_each(|c| c.all_expressions(into)),
            Filter::Or(f) => f.filters().iter().for_each(|c| c.all_expressions(into)),
            Filter::Not(f) => f.inner().all_expressions(into),
            _ => {}
        })
    }

    pub fn contains_aggregate(&self) -> bool {
        let mut expressions = Vec::new();
        self.all_expressions(&mut expressions);
        expressions
            .iter()
            .any(|e| matches!(e, Expression::Aggregate(_)))
    }

    /// Write `value` into `column` of every row of `table` the filter
    /// accepts. Returns the number of rows written.
    pub fn set_column_values(&self, table: &mut DataTable, column: &str, value: &Value) -> Result<usize> {
        if table.column_index(column).is_none() {
            return Err(Error::ColumnNotFound(column.to_string()));
        }
        let mut matches = Vec::new();
        for (index, row) in table.rows().enumerate() {
            if self.test(&row)? {
                matches.push(index);
            }
        }
        for index in &matches {
            table.set(*index, column, value.clone())?;
        }
        Ok(matches.len())
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        codec::encode(self)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        codec::decode(bytes)
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut buffer = SqlBuffer::new(&DefaultFormatter);
        match buffer.format_filter(self) {
            Ok(()) => f.write_str(buffer.sql()),
            Err(e) => write!(f, "<{e}>"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quarry_value::named_values;

    #[test]
    fn test_degeneration_tables() {
        use Degeneration::*;
        assert_eq!(Degeneration::and_all([AlwaysTrue, AlwaysTrue]), AlwaysTrue);
        assert_eq!(Degeneration::and_all([AlwaysTrue, Unconstrained]), Unconstrained);
        assert_eq!(Degeneration::and_all([Unconstrained, AlwaysFalse]), AlwaysFalse);
        assert_eq!(Degeneration::or_all([AlwaysFalse, AlwaysFalse]), AlwaysFalse);
        assert_eq!(Degeneration::or_all([AlwaysFalse, Unconstrained]), Unconstrained);
        assert_eq!(Degeneration::or_all([Unconstrained, AlwaysTrue]), AlwaysTrue);
    }

    #[test]
    fn test_degenerate_filter_skips_column_lookup() {
        let filter = Filter::num_range("Missing", None, None).unwrap();
        assert!(filter.test(&named_values([("Other", 1)])).unwrap());
        let filter = Filter::value("Missing", 1).unwrap();
        assert_eq!(
            filter.test(&named_values([("Other", 1)])),
            Err(Error::ColumnNotFound("Missing".into()))
        );
    }

    #[test]
    fn test_set_column_values() {
        let mut table = DataTable::new(["Id", "Flag"]).unwrap();
        for id in 1..=4 {
            table.add_row(vec![Value::I32(id), Value::Bool(false)]).unwrap();
        }
        let filter = Filter::num_range("Id", Some(2.into()), Some(3.into())).unwrap();
        let changed = filter
            .set_column_values(&mut table, "Flag", &Value::Bool(true))
            .unwrap();
        assert_eq!(changed, 2);
        assert_eq!(table.get(0, "Flag").unwrap(), &Value::Bool(false));
        assert_eq!(table.get(1, "Flag").unwrap(), &Value::Bool(true));
        assert_eq!(table.get(2, "Flag").unwrap(), &Value::Bool(true));
        assert!(
            filter
                .set_column_values(&mut table, "Nope", &Value::Null)
                .is_err()
        );
    }

    #[test]
    fn test_all_filters_preorder() {
        let a = Filter::value("A", 1).unwrap();
        let b = Filter::value("B", 2).unwrap();
        let c = Filter::value("C", 3).unwrap();
        let tree = (a.clone() | b.clone()).unwrap() & !c.clone();
        let mut all = Vec::new();
        tree.all_filters(&mut all);
        assert_eq!(all.len(), 6);
        assert_eq!(all[2], &a);
        assert_eq!(all[3], &b);
        assert_eq!(all[5], &c);
    }

    #[test]
    fn test_column_names_across_tree() {
        let tree = Filter::value("A", 1).unwrap()
            & Filter::starts_with("B", "x", false).unwrap()
            & !Filter::value("A", 2).unwrap();
        assert_eq!(tree.column_names(), ColumnList::parse("A,B").unwrap());
        assert_eq!(
            tree.with_column_prefix("t.").column_names(),
            ColumnList::parse("t.A,t.B").unwrap()
        );
    }
}
