//! Positional data writer
//!
//! A `DataWriter` buffers one row of values in column order, then writes it
//! with [`write`](DataWriter::write) as an insert, an update keyed by the
//! search columns, or an upsert. Transactions are opened lazily on the first
//! write and, with a pulse row count, committed every N rows so no single
//! transaction grows without bound.
//!
//! Disposal (explicit or on drop) without [`finish`](DataWriter::finish)
//! rolls back the rows written since the last pulse; completed pulses stay
//! committed.

use crate::connection::Connection;
use crate::error::{Error, Result};
use crate::info::{WriteMode, WriterInfo};
use crate::schema::{ColumnDef, TableDef};
use quarry_query::{ColumnList, Filter, SqlBuffer, SqlFormatter, Statement};
use quarry_value::{RowSource, Value};
use std::fmt;

/// Lifecycle of a [`DataWriter`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriterState {
    Created,
    Writing,
    Finished,
    Disposed,
}

impl fmt::Display for WriterState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            WriterState::Created => "created",
            WriterState::Writing => "writing",
            WriterState::Finished => "finished",
            WriterState::Disposed => "disposed",
        })
    }
}

/// Writes rows into one table through one connection
pub struct DataWriter<C: Connection> {
    info: WriterInfo,
    connection: C,
    formatter: &'static dyn SqlFormatter,
    /// Schema definition per buffer position
    schema: Option<Vec<ColumnDef>>,
    values: Vec<Value>,
    search_indices: Vec<usize>,
    other_columns: ColumnList,
    other_indices: Vec<usize>,
    state: WriterState,
    in_transaction: bool,
    rows_in_batch: usize,
    rows_written: u64,
    rows_affected: u64,
    pulses: u64,
}

impl<C: Connection> DataWriter<C> {
    pub fn new(info: WriterInfo, connection: C) -> Self {
        let columns = info.columns();
        let search_indices = info
            .search_columns()
            .iter()
            .filter_map(|name| columns.index_of(name))
            .collect();
        let other_columns = info.other_columns();
        let other_indices = other_columns
            .iter()
            .filter_map(|name| columns.index_of(name))
            .collect();
        let width = columns.len();
        let formatter = connection.dialect().formatter();
        tracing::debug!(
            table = info.table_name(),
            mode = %info.mode(),
            expected_rows = ?info.expected_row_count(),
            pulse = info.pulse_row_count(),
            "opening data writer"
        );
        Self {
            values: vec![Value::Null; width],
            info,
            connection,
            formatter,
            schema: None,
            search_indices,
            other_columns,
            other_indices,
            state: WriterState::Created,
            in_transaction: false,
            rows_in_batch: 0,
            rows_written: 0,
            rows_affected: 0,
            pulses: 0,
        }
    }

    /// Validate the writer's columns against `table` and apply its column
    /// definitions (type conversion, defaults, constraints) to every row
    pub fn with_schema(mut self, table: &TableDef) -> Result<Self> {
        self.check_state("attach a schema", &[WriterState::Created])?;
        if table.name != self.info.table_name() {
            return Err(Error::InvalidArgument(format!(
                "Schema describes table {}, writer targets {}",
                table.name,
                self.info.table_name()
            )));
        }
        let mut defs = Vec::with_capacity(self.values.len());
        for name in self.info.columns() {
            let (_, def) = table
                .get_column(name)
                .ok_or_else(|| Error::ColumnNotFound(name.clone()))?;
            defs.push(def.clone());
        }
        if self.info.mode() != WriteMode::Update
            && let Some(missing) = table
                .required_columns()
                .find(|c| !self.info.columns().contains(&c.name))
        {
            return Err(Error::InvalidArgument(format!(
                "Column {} is required by table {} but not written",
                missing.name, table.name
            )));
        }
        self.schema = Some(defs);
        Ok(self)
    }

    pub fn info(&self) -> &WriterInfo {
        &self.info
    }

    pub fn state(&self) -> WriterState {
        self.state
    }

    /// Rows passed to [`write`](Self::write), including updates that matched nothing
    pub fn rows_written(&self) -> u64 {
        self.rows_written
    }

    /// Rows inserted or changed in the database
    pub fn rows_affected(&self) -> u64 {
        self.rows_affected
    }

    /// Transactions committed because the pulse row count was reached
    pub fn pulse_count(&self) -> u64 {
        self.pulses
    }

    /// The buffered row
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn set_value(&mut self, index: usize, value: impl Into<Value>) -> Result<()> {
        self.check_state("set a value", &[WriterState::Created, WriterState::Writing])?;
        let count = self.values.len();
        let slot = self.values.get_mut(index).ok_or_else(|| {
            Error::InvalidArgument(format!("Column index {index} out of range for {count} columns"))
        })?;
        *slot = value.into();
        Ok(())
    }

    pub fn set_value_by_name(&mut self, name: &str, value: impl Into<Value>) -> Result<()> {
        let index = self
            .info
            .columns()
            .index_of(name)
            .ok_or_else(|| Error::ColumnNotFound(name.to_string()))?;
        self.set_value(index, value)
    }

    /// Replace the whole buffered row
    pub fn set_values<I, V>(&mut self, values: I) -> Result<()>
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.check_state("set values", &[WriterState::Created, WriterState::Writing])?;
        let values: Vec<Value> = values.into_iter().map(Into::into).collect();
        if values.len() != self.values.len() {
            return Err(Error::InvalidArgument(format!(
                "Expected {} values, got {}",
                self.values.len(),
                values.len()
            )));
        }
        self.values = values;
        Ok(())
    }

    /// Write the buffered row, then reset the buffer to nulls
    pub fn write(&mut self) -> Result<()> {
        self.check_state("write", &[WriterState::Created, WriterState::Writing])?;
        self.state = WriterState::Writing;
        let row = self.prepare_row()?;
        if !self.in_transaction {
            self.connection.begin_transaction()?;
            self.in_transaction = true;
        }
        let affected = match self.info.mode() {
            WriteMode::Insert => self.insert(&row)?,
            WriteMode::Update => self.update(&row)?,
            WriteMode::InsertOrUpdate => self.upsert(&row)?,
        };
        self.rows_written += 1;
        self.rows_affected += affected as u64;
        self.rows_in_batch += 1;
        self.values.fill(Value::Null);

        let pulse = self.info.pulse_row_count();
        if pulse > 0 && self.rows_in_batch >= pulse {
            self.connection.commit_transaction()?;
            self.in_transaction = false;
            self.rows_in_batch = 0;
            self.pulses += 1;
            tracing::debug!(
                table = self.info.table_name(),
                pulse = self.pulses,
                rows = self.rows_written,
                "transaction pulse"
            );
        }
        Ok(())
    }

    /// Write every row of `source`, mapping its columns to the writer's by
    /// name. Source columns the writer does not have are ignored; writer
    /// columns the source lacks are written as null. Returns the number of
    /// rows written.
    pub fn load_from(&mut self, source: &mut dyn RowSource) -> Result<u64> {
        self.check_state("load rows", &[WriterState::Created, WriterState::Writing])?;
        let mapping: Vec<Option<usize>> = source
            .column_names()
            .iter()
            .map(|name| self.info.columns().index_of(name))
            .collect();
        let mut loaded = 0;
        while let Some(row) = source.next_row()? {
            self.values.fill(Value::Null);
            for (value, target) in row.into_iter().zip(&mapping) {
                if let Some(index) = target {
                    self.values[*index] = value;
                }
            }
            self.write()?;
            loaded += 1;
        }
        Ok(loaded)
    }

    /// Commit outstanding rows. Valid once.
    pub fn finish(&mut self) -> Result<()> {
        self.check_state("finish", &[WriterState::Created, WriterState::Writing])?;
        if self.in_transaction {
            self.connection.commit_transaction()?;
            self.in_transaction = false;
            self.rows_in_batch = 0;
        }
        self.state = WriterState::Finished;
        tracing::debug!(
            table = self.info.table_name(),
            rows = self.rows_written,
            affected = self.rows_affected,
            pulses = self.pulses,
            "data writer finished"
        );
        Ok(())
    }

    /// Release the writer, rolling back rows written since the last commit.
    /// Idempotent.
    pub fn dispose(&mut self) {
        if self.state == WriterState::Disposed {
            return;
        }
        if self.in_transaction {
            tracing::warn!(
                table = self.info.table_name(),
                rows = self.rows_in_batch,
                "rolling back unfinished batch"
            );
            if let Err(e) = self.connection.rollback_transaction() {
                tracing::warn!("Failed to roll back writer transaction: {}", e);
            }
            self.in_transaction = false;
            self.rows_in_batch = 0;
        }
        self.state = WriterState::Disposed;
    }

    fn check_state(&self, operation: &str, allowed: &[WriterState]) -> Result<()> {
        if allowed.contains(&self.state) {
            Ok(())
        } else {
            Err(Error::InvalidState {
                operation: operation.to_string(),
                state: self.state.to_string(),
            })
        }
    }

    fn prepare_row(&self) -> Result<Vec<Value>> {
        match &self.schema {
            Some(defs) => defs
                .iter()
                .zip(&self.values)
                .map(|(def, value)| def.prepare(value.clone()))
                .collect(),
            None => Ok(self.values.clone()),
        }
    }

    /// Equality on every search column, `IS NULL` for null keys
    fn key_filter(&self, row: &[Value]) -> Result<Filter> {
        let columns = self.info.columns().as_slice();
        let mut parts = Vec::with_capacity(self.search_indices.len());
        for &index in &self.search_indices {
            parts.push(Filter::value(&columns[index], row[index].clone())?);
        }
        Filter::from_list(parts).ok_or_else(|| {
            Error::InvalidArgument(format!(
                "{} mode requires search columns",
                self.info.mode()
            ))
        })
    }

    fn run(&mut self, statement: Statement) -> Result<usize> {
        tracing::trace!(sql = %statement.sql, params = statement.params.len(), "executing");
        self.connection.execute(&statement)
    }

    fn insert(&mut self, row: &[Value]) -> Result<usize> {
        let mut buffer = SqlBuffer::with_parameters(self.formatter);
        self.formatter
            .format_insert(&mut buffer, self.info.table_name(), self.info.columns(), row)?;
        self.run(buffer.into_statement())
    }

    fn update(&mut self, row: &[Value]) -> Result<usize> {
        let key = self.key_filter(row)?;
        let values: Vec<Value> = self.other_indices.iter().map(|&i| row[i].clone()).collect();
        let mut buffer = SqlBuffer::with_parameters(self.formatter);
        self.formatter.format_update(
            &mut buffer,
            self.info.table_name(),
            &self.other_columns,
            &values,
            Some(&key),
        )?;
        self.run(buffer.into_statement())
    }

    fn upsert(&mut self, row: &[Value]) -> Result<usize> {
        if !self.other_indices.is_empty() {
            return match self.update(row)? {
                0 => self.insert(row),
                updated => Ok(updated),
            };
        }
        // Every column is a key: the row either exists already or is inserted
        let key = self.key_filter(row)?;
        let mut buffer = SqlBuffer::with_parameters(self.formatter);
        self.formatter
            .format_count(&mut buffer, self.info.table_name(), Some(&key))?;
        let statement = buffer.into_statement();
        tracing::trace!(sql = %statement.sql, "checking existence");
        let existing = self.connection.query_scalar(&statement)?;
        match existing.as_i64() {
            Some(0) | None => self.insert(row),
            Some(_) => Ok(0),
        }
    }
}

impl<C: Connection> Drop for DataWriter<C> {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl<C: Connection> fmt::Debug for DataWriter<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataWriter")
            .field("table", &self.info.table_name())
            .field("mode", &self.info.mode())
            .field("state", &self.state)
            .field("rows_written", &self.rows_written)
            .field("pulses", &self.pulses)
            .finish()
    }
}
