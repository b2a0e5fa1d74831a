//! In-memory tables and forward-only row sources
//!
//! `DataTable` is the tabular collaborator used for local filter tests,
//! bulk corrections and as a bulk source for the data writer.

use crate::error::{Error, Result};
use crate::named::NamedValues;
use crate::types::{Row, Value};
use serde::{Deserialize, Serialize};

/// Forward-only cursor over rows with a fixed set of named columns
pub trait RowSource {
    /// Column names, positionally matching the values of every row
    fn column_names(&self) -> Vec<String>;

    /// Next row, or `None` when the source is exhausted
    fn next_row(&mut self) -> Result<Option<Row>>;
}

/// Rows held in memory with named columns
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DataTable {
    columns: Vec<String>,
    rows: Vec<Row>,
}

impl DataTable {
    /// Create an empty table. Column names must be unique and non-empty.
    pub fn new<I, S>(columns: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut names: Vec<String> = Vec::new();
        for name in columns {
            let name = name.into();
            if name.is_empty() {
                return Err(Error::InvalidValue("Column name cannot be empty".into()));
            }
            if names.contains(&name) {
                return Err(Error::DuplicateColumn(name));
            }
            names.push(name);
        }
        Ok(Self {
            columns: names,
            rows: Vec::new(),
        })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Append a row; its length must match the column count
    pub fn add_row(&mut self, row: Row) -> Result<()> {
        if row.len() != self.columns.len() {
            return Err(Error::InvalidValue(format!(
                "Row has {} values, table has {} columns",
                row.len(),
                self.columns.len()
            )));
        }
        self.rows.push(row);
        Ok(())
    }

    /// Row view usable as a [`NamedValues`] source
    pub fn row(&self, index: usize) -> Option<DataRow<'_>> {
        self.rows.get(index).map(|values| DataRow {
            columns: &self.columns,
            values,
        })
    }

    pub fn rows(&self) -> impl Iterator<Item = DataRow<'_>> {
        self.rows.iter().map(|values| DataRow {
            columns: &self.columns,
            values,
        })
    }

    pub fn get(&self, row: usize, column: &str) -> Result<&Value> {
        let col = self
            .column_index(column)
            .ok_or_else(|| Error::ColumnNotFound(column.to_string()))?;
        self.rows
            .get(row)
            .map(|r| &r[col])
            .ok_or(Error::RowOutOfRange {
                row,
                count: self.rows.len(),
            })
    }

    pub fn set(&mut self, row: usize, column: &str, value: Value) -> Result<()> {
        let col = self
            .column_index(column)
            .ok_or_else(|| Error::ColumnNotFound(column.to_string()))?;
        let count = self.rows.len();
        let target = self
            .rows
            .get_mut(row)
            .ok_or(Error::RowOutOfRange { row, count })?;
        target[col] = value;
        Ok(())
    }

    /// Forward-only cursor over a snapshot of this table's rows
    pub fn reader(&self) -> VecRowSource {
        VecRowSource::new(self.columns.clone(), self.rows.clone())
    }
}

/// Borrowed view of one row of a [`DataTable`]
#[derive(Debug, Clone, Copy)]
pub struct DataRow<'a> {
    columns: &'a [String],
    values: &'a [Value],
}

impl DataRow<'_> {
    pub fn values(&self) -> &[Value] {
        self.values
    }
}

impl NamedValues for DataRow<'_> {
    fn get_value(&self, name: &str) -> Option<Value> {
        self.columns
            .iter()
            .position(|c| c == name)
            .map(|i| self.values[i].clone())
    }

    fn contains(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c == name)
    }
}

/// Row source over owned rows
#[derive(Debug, Clone)]
pub struct VecRowSource {
    columns: Vec<String>,
    rows: std::vec::IntoIter<Row>,
}

impl VecRowSource {
    pub fn new(columns: Vec<String>, rows: Vec<Row>) -> Self {
        Self {
            columns,
            rows: rows.into_iter(),
        }
    }
}

impl RowSource for VecRowSource {
    fn column_names(&self) -> Vec<String> {
        self.columns.clone()
    }

    fn next_row(&mut self) -> Result<Option<Row>> {
        match self.rows.next() {
            Some(row) if row.len() != self.columns.len() => Err(Error::InvalidValue(format!(
                "Row has {} values, source has {} columns",
                row.len(),
                self.columns.len()
            ))),
            next => Ok(next),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> DataTable {
        let mut table = DataTable::new(["Id", "Name"]).unwrap();
        table
            .add_row(vec![Value::I32(1), Value::Str("one".into())])
            .unwrap();
        table
            .add_row(vec![Value::I32(2), Value::Null])
            .unwrap();
        table
    }

    #[test]
    fn test_duplicate_columns_rejected() {
        assert!(matches!(
            DataTable::new(["A", "A"]),
            Err(Error::DuplicateColumn(_))
        ));
    }

    #[test]
    fn test_row_as_named_values() {
        let table = sample();
        let row = table.row(1).unwrap();
        assert_eq!(row.get_value("Id"), Some(Value::I32(2)));
        assert_eq!(row.get_value("Name"), Some(Value::Null));
        assert!(!row.contains("Missing"));
    }

    #[test]
    fn test_get_and_set() {
        let mut table = sample();
        table.set(0, "Name", Value::Str("uno".into())).unwrap();
        assert_eq!(table.get(0, "Name").unwrap(), &Value::Str("uno".into()));
        assert!(table.set(5, "Name", Value::Null).is_err());
        assert!(table.get(0, "Other").is_err());
        assert!(table.add_row(vec![Value::Null]).is_err());
    }

    #[test]
    fn test_reader_is_forward_only() {
        let table = sample();
        let mut reader = table.reader();
        assert_eq!(reader.column_names(), vec!["Id", "Name"]);
        assert!(reader.next_row().unwrap().is_some());
        assert!(reader.next_row().unwrap().is_some());
        assert!(reader.next_row().unwrap().is_none());
    }
}
