//! Quarry Value - dynamically typed values for the quarry query layer
//!
//! This crate provides:
//! - `Value`, the scalar flowing through evaluation, parameters and writers
//! - `ColumnType` and the conversion matrix between column types
//! - Three-valued comparison and numeric-tower arithmetic
//! - `NamedValues`, the lookup capability filters and expressions evaluate against
//! - `DataTable` and `RowSource` for in-memory rows and forward-only cursors

pub mod column_type;
pub mod convert;
pub mod error;
pub mod evaluator;
pub mod named;
pub mod table;
pub mod types;

pub use column_type::ColumnType;
pub use error::{Error, Result};
pub use named::{NamedValues, named_values};
pub use table::{DataRow, DataTable, RowSource, VecRowSource};
pub use types::{Row, Value};
