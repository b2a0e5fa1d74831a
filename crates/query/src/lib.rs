//! Quarry Query - expressions, filters and dialect SQL rendering
//!
//! This crate provides:
//! - `Expression`, a typed tree of columns, constants, functions and aggregates
//! - `Filter`, the predicate algebra with degeneration tracking and collapse
//!   laws for `And`, `Or` and `Not`
//! - `SqlFormatter` implementations rendering both trees per SQL dialect
//! - `SelectInfo`, a single-table query descriptor
//!
//! Trees evaluate locally against any `NamedValues` source, and serialize
//! to bytes for caching or transport.

pub mod codec;
pub mod columns;
pub mod error;
pub mod expression;
pub mod filter;
pub mod format;
pub mod select;

pub use columns::{ColumnList, ColumnListBuilder};
pub use error::{Error, Result};
pub use expression::{AggregateExpr, AggregateKind, CompareKind, Expression, FunctionExpr, FunctionKind};
pub use filter::{Degeneration, Filter, and, not, or};
pub use format::{Dialect, FormatOptions, SqlBuffer, SqlFormatter, Statement};
pub use select::{Order, OrderItem, SelectExpression, SelectInfo};
