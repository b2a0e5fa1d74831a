//! Text accumulator for rendered SQL

use super::{Dialect, FormatOptions, SqlFormatter};
use crate::error::Result;
use crate::expression::Expression;
use crate::filter::Filter;
use quarry_value::Value;
use serde::{Deserialize, Serialize};
use std::fmt;

/// SQL text under construction, bound to one formatter
///
/// In parameter mode non-null values are collected into [`params`](Self::params)
/// and replaced by the dialect's markers; otherwise they are inlined as
/// literals.
pub struct SqlBuffer<'f> {
    formatter: &'f dyn SqlFormatter,
    sql: String,
    params: Vec<Value>,
    use_parameters: bool,
}

impl<'f> SqlBuffer<'f> {
    /// Buffer that inlines every value
    pub fn new(formatter: &'f dyn SqlFormatter) -> Self {
        Self {
            formatter,
            sql: String::new(),
            params: Vec::new(),
            use_parameters: false,
        }
    }

    /// Buffer that collects values as parameters
    pub fn with_parameters(formatter: &'f dyn SqlFormatter) -> Self {
        Self {
            use_parameters: true,
            ..Self::new(formatter)
        }
    }

    pub fn formatter(&self) -> &'f dyn SqlFormatter {
        self.formatter
    }

    pub fn push(&mut self, c: char) {
        self.sql.push(c);
    }

    pub fn push_str(&mut self, s: &str) {
        self.sql.push_str(s);
    }

    /// Record a parameter value, returning its 1-based position
    pub fn add_parameter(&mut self, value: Value) -> usize {
        self.params.push(value);
        self.params.len()
    }

    pub fn uses_parameters(&self) -> bool {
        self.use_parameters
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn params(&self) -> &[Value] {
        &self.params
    }

    pub fn is_empty(&self) -> bool {
        self.sql.is_empty()
    }

    pub fn clear(&mut self) {
        self.sql.clear();
        self.params.clear();
    }

    pub fn format_expression(&mut self, expression: &Expression, options: &FormatOptions) -> Result<()> {
        let formatter = self.formatter;
        formatter.format_expression(self, expression, options)
    }

    pub fn format_filter(&mut self, filter: &Filter) -> Result<()> {
        let formatter = self.formatter;
        formatter.format_filter(self, filter)
    }

    pub fn format_value(&mut self, value: &Value) -> Result<()> {
        let formatter = self.formatter;
        formatter.format_value(self, value)
    }

    pub fn format_name(&mut self, name: &str) {
        let formatter = self.formatter;
        formatter.format_name(self, name);
    }

    pub fn into_statement(self) -> Statement {
        Statement {
            sql: self.sql,
            params: self.params,
        }
    }
}

impl SqlBuffer<'static> {
    pub fn for_dialect(dialect: Dialect, use_parameters: bool) -> Self {
        let formatter = dialect.formatter();
        if use_parameters {
            Self::with_parameters(formatter)
        } else {
            Self::new(formatter)
        }
    }
}

impl fmt::Debug for SqlBuffer<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqlBuffer")
            .field("dialect", &self.formatter.dialect())
            .field("sql", &self.sql)
            .field("params", &self.params)
            .finish()
    }
}

impl fmt::Display for SqlBuffer<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.sql)
    }
}

/// Finished SQL text with its positional parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Statement {
    pub sql: String,
    pub params: Vec<Value>,
}

impl Statement {
    /// Render a filter as a standalone predicate
    pub fn filter(dialect: Dialect, filter: &Filter, use_parameters: bool) -> Result<Self> {
        let mut buffer = SqlBuffer::for_dialect(dialect, use_parameters);
        buffer.format_filter(filter)?;
        Ok(buffer.into_statement())
    }

    /// Render an expression on its own
    pub fn expression(dialect: Dialect, expression: &Expression, use_parameters: bool) -> Result<Self> {
        let mut buffer = SqlBuffer::for_dialect(dialect, use_parameters);
        buffer.format_expression(expression, &FormatOptions::default())?;
        Ok(buffer.into_statement())
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.sql)
    }
}
