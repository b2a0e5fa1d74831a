//! Quarry - a dialect-independent filter and expression algebra
//!
//! This crate ties the workspace together:
//! - `value`: dynamically typed values, conversions and in-memory tables
//! - `query`: expressions, filters with degeneration, SQL formatters per dialect
//! - `writer`: the positional data writer with transaction pulsing
//!
//! A filter built once can be tested against in-memory rows or rendered
//! for any supported dialect:
//!
//! ```
//! use quarry::{Dialect, Filter, Statement};
//! use quarry::value::named_values;
//!
//! let filter = Filter::value("Name", "Apple").unwrap() & Filter::is_null("Price").unwrap();
//! let row = named_values([("Name", quarry::Value::from("Apple")), ("Price", quarry::Value::Null)]);
//! assert!(filter.test(&row).unwrap());
//!
//! let statement = Statement::filter(Dialect::Sqlite, &filter, false).unwrap();
//! assert_eq!(statement.sql, "\"Name\" = 'Apple' AND \"Price\" IS NULL");
//! ```

pub use quarry_query as query;
pub use quarry_value as value;
pub use quarry_writer as writer;

pub use quarry_query::{
    ColumnList, Degeneration, Dialect, Expression, Filter, SelectInfo, SqlBuffer, SqlFormatter,
    Statement,
};
pub use quarry_value::{ColumnType, DataTable, Value};
pub use quarry_writer::{Connection, DataWriter, WriteMode, WriterInfo};
