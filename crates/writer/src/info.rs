//! Writer configuration

use crate::error::{Error, Result};
use quarry_query::ColumnList;
use quarry_query::codec;
use serde::{Deserialize, Serialize};
use std::fmt;

/// What a write does with the buffered row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum WriteMode {
    /// Append a new row
    #[default]
    Insert,
    /// Update the row matching the search columns; no match is not an error
    Update,
    /// Update the matching row, inserting when none exists
    InsertOrUpdate,
}

impl WriteMode {
    pub fn needs_search_columns(self) -> bool {
        !matches!(self, WriteMode::Insert)
    }
}

impl fmt::Display for WriteMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            WriteMode::Insert => "Insert",
            WriteMode::Update => "Update",
            WriteMode::InsertOrUpdate => "InsertOrUpdate",
        })
    }
}

/// Immutable description of a writer's target, columns and policy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "WriterInfoParts")]
pub struct WriterInfo {
    table_name: String,
    columns: ColumnList,
    search_columns: ColumnList,
    mode: WriteMode,
    expected_row_count: Option<usize>,
    pulse_row_count: usize,
}

/// Decoded form, revalidated through [`WriterInfoBuilder::build`]
#[derive(Deserialize)]
struct WriterInfoParts {
    table_name: String,
    columns: ColumnList,
    search_columns: ColumnList,
    mode: WriteMode,
    expected_row_count: Option<usize>,
    pulse_row_count: usize,
}

impl TryFrom<WriterInfoParts> for WriterInfo {
    type Error = Error;

    fn try_from(parts: WriterInfoParts) -> Result<Self> {
        let mut builder = WriterInfo::builder(parts.table_name)
            .columns(parts.columns)
            .search_columns(parts.search_columns)
            .mode(parts.mode)
            .pulse_row_count(parts.pulse_row_count);
        builder.expected_row_count = parts.expected_row_count;
        builder.build()
    }
}

impl WriterInfo {
    pub fn builder(table_name: impl Into<String>) -> WriterInfoBuilder {
        WriterInfoBuilder::new(table_name)
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    /// All written columns, in buffer order
    pub fn columns(&self) -> &ColumnList {
        &self.columns
    }

    /// Columns locating an existing row; empty for [`WriteMode::Insert`]
    pub fn search_columns(&self) -> &ColumnList {
        &self.search_columns
    }

    /// Columns written but never used for matching
    pub fn other_columns(&self) -> ColumnList {
        self.columns.difference(&self.search_columns)
    }

    pub fn mode(&self) -> WriteMode {
        self.mode
    }

    /// Sizing hint only
    pub fn expected_row_count(&self) -> Option<usize> {
        self.expected_row_count
    }

    /// Rows per transaction; 0 keeps everything in one transaction
    pub fn pulse_row_count(&self) -> usize {
        self.pulse_row_count
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(codec::encode(self)?)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Ok(codec::decode(bytes)?)
    }
}

/// Builder for [`WriterInfo`]
#[derive(Debug, Clone, Default)]
pub struct WriterInfoBuilder {
    table_name: String,
    columns: ColumnList,
    search_columns: ColumnList,
    mode: WriteMode,
    expected_row_count: Option<usize>,
    pulse_row_count: usize,
}

impl WriterInfoBuilder {
    pub fn new(table_name: impl Into<String>) -> Self {
        Self {
            table_name: table_name.into(),
            ..Self::default()
        }
    }

    pub fn columns(mut self, columns: ColumnList) -> Self {
        self.columns = columns;
        self
    }

    pub fn search_columns(mut self, columns: ColumnList) -> Self {
        self.search_columns = columns;
        self
    }

    pub fn mode(mut self, mode: WriteMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn expected_row_count(mut self, rows: usize) -> Self {
        self.expected_row_count = Some(rows);
        self
    }

    pub fn pulse_row_count(mut self, rows: usize) -> Self {
        self.pulse_row_count = rows;
        self
    }

    pub fn build(self) -> Result<WriterInfo> {
        if self.table_name.is_empty() {
            return Err(Error::InvalidArgument("Table name cannot be empty".into()));
        }
        if self.columns.is_empty() {
            return Err(Error::InvalidArgument("Writer needs at least one column".into()));
        }
        if let Some(missing) = self
            .search_columns
            .iter()
            .find(|c| !self.columns.contains(c))
        {
            return Err(Error::ColumnNotFound(missing.clone()));
        }
        let search_columns = if self.mode.needs_search_columns() {
            if self.search_columns.is_empty() {
                return Err(Error::InvalidArgument(format!(
                    "{} mode requires search columns",
                    self.mode
                )));
            }
            if self.mode == WriteMode::Update && self.columns.len() == self.search_columns.len() {
                return Err(Error::InvalidArgument(
                    "Update mode requires at least one column besides the search columns".into(),
                ));
            }
            self.search_columns
        } else {
            ColumnList::empty()
        };
        Ok(WriterInfo {
            table_name: self.table_name,
            columns: self.columns,
            search_columns,
            mode: self.mode,
            expected_row_count: self.expected_row_count,
            pulse_row_count: self.pulse_row_count,
        })
    }
}
