//! Composite filters and the combination laws
//!
//! `And`/`Or` nodes splice same-kind children into themselves, so nesting is
//! always flat. The combinators below also drop trivially true or false
//! members:
//!
//! | expression          | result            |
//! |---------------------|-------------------|
//! | `None & f`          | `f`               |
//! | `AlwaysTrue & f`    | `f`               |
//! | `AlwaysFalse & f`   | `AlwaysFalse`     |
//! | `None \| f`         | `None`            |
//! | `AlwaysTrue \| f`   | `None`            |
//! | `AlwaysFalse \| f`  | `f`               |
//! | `!None`             | `AlwaysFalse`     |
//! | `!!f`               | `f`               |

use super::{Degeneration, DummyFilter, Filter};
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::ops::{BitAnd, BitOr, Not};

fn require_operands(name: &str, count: usize) -> Result<()> {
    if count < 2 {
        return Err(Error::InvalidArgument(format!(
            "{name} requires at least 2 filters, got {count}"
        )));
    }
    Ok(())
}

/// Decoded form of `And`/`Or`; the operand count is checked and the
/// degeneration recomputed
#[derive(Deserialize)]
struct OperandParts {
    filters: Vec<Filter>,
    #[allow(dead_code)]
    degeneration: Degeneration,
}

impl TryFrom<OperandParts> for AndFilter {
    type Error = Error;

    fn try_from(parts: OperandParts) -> Result<Self> {
        AndFilter::new(parts.filters)
    }
}

impl TryFrom<OperandParts> for OrFilter {
    type Error = Error;

    fn try_from(parts: OperandParts) -> Result<Self> {
        OrFilter::new(parts.filters)
    }
}

/// Conjunction of at least two filters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "OperandParts")]
pub struct AndFilter {
    filters: Vec<Filter>,
    degeneration: Degeneration,
}

impl AndFilter {
    pub fn new(filters: Vec<Filter>) -> Result<Self> {
        require_operands("And", filters.len())?;
        Ok(Self::from_operands(filters))
    }

    fn from_operands(operands: Vec<Filter>) -> Self {
        let mut filters = Vec::with_capacity(operands.len());
        for operand in operands {
            match operand {
                Filter::And(nested) => filters.extend(nested.filters),
                other => filters.push(other),
            }
        }
        let degeneration = Degeneration::and_all(filters.iter().map(Filter::degeneration));
        Self {
            filters,
            degeneration,
        }
    }

    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }

    pub fn degeneration(&self) -> Degeneration {
        self.degeneration
    }

    pub(crate) fn map_children(&self, f: impl Fn(&Filter) -> Filter) -> Self {
        Self::from_operands(self.filters.iter().map(f).collect())
    }
}

/// Disjunction of at least two filters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "OperandParts")]
pub struct OrFilter {
    filters: Vec<Filter>,
    degeneration: Degeneration,
}

impl OrFilter {
    pub fn new(filters: Vec<Filter>) -> Result<Self> {
        require_operands("Or", filters.len())?;
        Ok(Self::from_operands(filters))
    }

    fn from_operands(operands: Vec<Filter>) -> Self {
        let mut filters = Vec::with_capacity(operands.len());
        for operand in operands {
            match operand {
                Filter::Or(nested) => filters.extend(nested.filters),
                other => filters.push(other),
            }
        }
        let degeneration = Degeneration::or_all(filters.iter().map(Filter::degeneration));
        Self {
            filters,
            degeneration,
        }
    }

    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }

    pub fn degeneration(&self) -> Degeneration {
        self.degeneration
    }

    pub(crate) fn map_children(&self, f: impl Fn(&Filter) -> Filter) -> Self {
        Self::from_operands(self.filters.iter().map(f).collect())
    }
}

/// Negation of a filter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotFilter {
    inner: Box<Filter>,
}

impl NotFilter {
    /// Wrap `inner` as is; use [`not`] or `!` for the simplifying form
    pub fn new(inner: Filter) -> Self {
        Self {
            inner: Box::new(inner),
        }
    }

    pub fn inner(&self) -> &Filter {
        &self.inner
    }

    pub fn into_inner(self) -> Filter {
        *self.inner
    }

    pub fn degeneration(&self) -> Degeneration {
        self.inner.degeneration().negate()
    }
}

fn and_filters(left: Filter, right: Filter) -> Filter {
    match (left.degeneration(), right.degeneration()) {
        (Degeneration::AlwaysFalse, _) | (_, Degeneration::AlwaysFalse) => {
            Filter::Dummy(DummyFilter::new(false))
        }
        (Degeneration::AlwaysTrue, _) => right,
        (_, Degeneration::AlwaysTrue) => left,
        _ => Filter::And(AndFilter::from_operands(vec![left, right])),
    }
}

fn or_filters(left: Filter, right: Filter) -> Option<Filter> {
    match (left.degeneration(), right.degeneration()) {
        (Degeneration::AlwaysTrue, _) | (_, Degeneration::AlwaysTrue) => None,
        (Degeneration::AlwaysFalse, _) => Some(right),
        (_, Degeneration::AlwaysFalse) => Some(left),
        _ => Some(Filter::Or(OrFilter::from_operands(vec![left, right]))),
    }
}

fn negate(filter: Filter) -> Filter {
    match (filter.degeneration(), filter) {
        (Degeneration::AlwaysTrue, _) => Filter::Dummy(DummyFilter::new(false)),
        (Degeneration::AlwaysFalse, _) => Filter::Dummy(DummyFilter::new(true)),
        (_, Filter::Not(negated)) => negated.into_inner(),
        (_, filter) => Filter::Not(NotFilter::new(filter)),
    }
}

/// Conjunction of two optional filters; `None` means unconstrained
pub fn and(left: Option<Filter>, right: Option<Filter>) -> Option<Filter> {
    match (left, right) {
        (None, other) | (other, None) => other,
        (Some(left), Some(right)) => Some(and_filters(left, right)),
    }
}

/// Disjunction of two optional filters; an unconstrained side wins
pub fn or(left: Option<Filter>, right: Option<Filter>) -> Option<Filter> {
    match (left, right) {
        (Some(left), Some(right)) => or_filters(left, right),
        _ => None,
    }
}

/// Negation of an optional filter; negating "no filter" excludes everything
pub fn not(filter: Option<Filter>) -> Filter {
    match filter {
        Some(filter) => negate(filter),
        None => Filter::Dummy(DummyFilter::new(false)),
    }
}

impl Filter {
    /// Minimal conjunction of `filters`. Always-true members are dropped, an
    /// always-false member collapses the whole list, a single survivor is
    /// returned unwrapped and an empty list yields `None`.
    pub fn from_list<I: IntoIterator<Item = Filter>>(filters: I) -> Option<Filter> {
        let mut kept = Vec::new();
        for filter in filters {
            match filter.degeneration() {
                Degeneration::AlwaysTrue => continue,
                Degeneration::AlwaysFalse => {
                    tracing::trace!(filter = %filter, "filter list collapsed to always-false");
                    return Some(Filter::Dummy(DummyFilter::new(false)));
                }
                Degeneration::Unconstrained => kept.push(filter),
            }
        }
        match kept.len() {
            0 => None,
            1 => kept.pop(),
            _ => Some(Filter::And(AndFilter::from_operands(kept))),
        }
    }
}

impl BitAnd for Filter {
    type Output = Filter;

    fn bitand(self, rhs: Filter) -> Filter {
        and_filters(self, rhs)
    }
}

impl BitOr for Filter {
    type Output = Option<Filter>;

    fn bitor(self, rhs: Filter) -> Option<Filter> {
        or_filters(self, rhs)
    }
}

impl Not for Filter {
    type Output = Filter;

    fn not(self) -> Filter {
        negate(self)
    }
}
