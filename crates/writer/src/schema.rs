//! Table and column descriptors
//!
//! Schema metadata is consumed, never produced: the writer uses it to check
//! its column set against the target table, to substitute column defaults
//! for nulls and to reject values the column cannot hold.

use crate::error::{Error, Result};
use quarry_value::{ColumnType, Value};
use serde::{Deserialize, Serialize};

/// A table column
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct ColumnDef {
    /// Column name. Can't be empty.
    pub name: String,
    /// Declared type values are converted to before writing.
    pub column_type: ColumnType,
    /// Whether the column allows null values.
    pub nullable: bool,
    /// Maximum length in characters for text columns.
    pub max_length: Option<usize>,
    /// Value written in place of null.
    pub default: Option<Value>,
    /// Master table this column references, if any.
    pub references: Option<String>,
}

impl ColumnDef {
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        ColumnDef {
            name: name.into(),
            column_type,
            nullable: true,
            max_length: None,
            default: None,
            references: None,
        }
    }

    pub fn nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    pub fn max_length(mut self, max_length: usize) -> Self {
        self.max_length = Some(max_length);
        self
    }

    pub fn default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn references(mut self, table: impl Into<String>) -> Self {
        self.references = Some(table.into());
        self
    }

    /// Bring `value` into the shape this column stores: nulls take the
    /// default, the value is converted to the declared type and checked
    /// against nullability and length.
    pub fn prepare(&self, value: Value) -> Result<Value> {
        let value = match (value, &self.default) {
            (Value::Null, Some(default)) => default.clone(),
            (value, _) => value,
        };
        if value.is_null() {
            if !self.nullable {
                return Err(Error::NullConstraintViolation(self.name.clone()));
            }
            return Ok(value);
        }
        let value = if self.column_type == ColumnType::Unknown {
            value
        } else {
            value.convert_to(self.column_type)?
        };
        if let (Some(max), Value::Str(s)) = (self.max_length, &value)
            && s.chars().count() > max
        {
            return Err(Error::ValueTooLong {
                column: self.name.clone(),
                max,
            });
        }
        Ok(value)
    }
}

/// A table schema
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct TableDef {
    /// The table name. Can't be empty.
    pub name: String,
    /// The table's columns, unique by name.
    pub columns: Vec<ColumnDef>,
}

impl TableDef {
    pub fn new(name: impl Into<String>, columns: Vec<ColumnDef>) -> Result<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(Error::InvalidArgument("Table name cannot be empty".into()));
        }
        for (i, column) in columns.iter().enumerate() {
            if column.name.is_empty() {
                return Err(Error::InvalidArgument(format!(
                    "Column {i} of table {name} has no name"
                )));
            }
            if columns[..i].iter().any(|c| c.name == column.name) {
                return Err(Error::InvalidArgument(format!(
                    "Duplicate column {} in table {name}",
                    column.name
                )));
            }
        }
        Ok(TableDef { name, columns })
    }

    /// Returns the column with the given name, if it exists.
    pub fn get_column(&self, name: &str) -> Option<(usize, &ColumnDef)> {
        self.columns
            .iter()
            .enumerate()
            .find(|(_, c)| c.name == name)
    }

    /// Non-nullable columns without a default, which every insert must set
    pub fn required_columns(&self) -> impl Iterator<Item = &ColumnDef> {
        self.columns
            .iter()
            .filter(|c| !c.nullable && c.default.is_none())
    }
}
