//! Select descriptor
//!
//! Composes expression and filter trees into a single query: projection,
//! where, grouping, having, ordering, a row cap and a distinct flag.
//! Rendering is done by [`SqlFormatter::format_select`](crate::format::SqlFormatter::format_select).

use crate::codec;
use crate::columns::{ColumnList, ColumnListBuilder};
use crate::error::{Error, Result};
use crate::expression::Expression;
use crate::filter::Filter;
use crate::format::{Dialect, SqlBuffer, Statement};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One item of the select list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectExpression {
    pub expression: Expression,
    pub alias: Option<String>,
}

impl SelectExpression {
    pub fn new(expression: Expression) -> Self {
        Self {
            expression,
            alias: None,
        }
    }

    pub fn aliased(expression: Expression, alias: impl Into<String>) -> Self {
        Self {
            expression,
            alias: Some(alias.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    pub expression: Expression,
    pub descending: bool,
}

/// Sort order
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Order {
    items: Vec<OrderItem>,
}

impl Order {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ascending order over comma-separated column names
    pub fn by_columns(columns: &str) -> Result<Self> {
        let mut order = Self::new();
        for name in ColumnList::parse(columns)?.iter() {
            order = order.then(Expression::column(name)?, false);
        }
        Ok(order)
    }

    pub fn then(mut self, expression: Expression, descending: bool) -> Self {
        self.items.push(OrderItem {
            expression,
            descending,
        });
        self
    }

    pub fn items(&self) -> &[OrderItem] {
        &self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn collect_column_names(&self, into: &mut ColumnListBuilder) {
        for item in &self.items {
            item.expression.collect_column_names(into);
        }
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        codec::encode(self)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        codec::decode(bytes)
    }
}

impl fmt::Display for Order {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, item) in self.items.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", item.expression)?;
            if item.descending {
                f.write_str(" DESC")?;
            }
        }
        Ok(())
    }
}

/// Description of a single-table `SELECT`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectInfo {
    table_name: String,
    expressions: Vec<SelectExpression>,
    where_filter: Option<Filter>,
    group_by: Vec<Expression>,
    having: Option<Filter>,
    order_by: Option<Order>,
    max_records: Option<usize>,
    unique: bool,
}

impl SelectInfo {
    /// `SELECT * FROM table_name`
    pub fn new(table_name: impl Into<String>) -> Result<Self> {
        let table_name = table_name.into();
        if table_name.is_empty() {
            return Err(Error::InvalidArgument("Table name cannot be empty".into()));
        }
        Ok(Self {
            table_name,
            expressions: Vec::new(),
            where_filter: None,
            group_by: Vec::new(),
            having: None,
            order_by: None,
            max_records: None,
            unique: false,
        })
    }

    /// Select plain columns, replacing the select list
    pub fn columns(mut self, columns: &ColumnList) -> Result<Self> {
        self.expressions = columns
            .iter()
            .map(|name| Expression::column(name).map(SelectExpression::new))
            .collect::<Result<_>>()?;
        Ok(self)
    }

    pub fn expression(mut self, expression: Expression) -> Self {
        self.expressions.push(SelectExpression::new(expression));
        self
    }

    /// Add an aliased item; aliases must be unique within the select list
    pub fn aliased(mut self, expression: Expression, alias: impl Into<String>) -> Result<Self> {
        let alias = alias.into();
        if alias.is_empty() {
            return Err(Error::EmptyColumnName);
        }
        if self.aliases().any(|a| a == alias) {
            return Err(Error::DuplicateColumn(alias));
        }
        self.expressions
            .push(SelectExpression::aliased(expression, alias));
        Ok(self)
    }

    pub fn filter(mut self, filter: Option<Filter>) -> Self {
        self.where_filter = filter;
        self
    }

    pub fn group_by(mut self, expression: Expression) -> Self {
        self.group_by.push(expression);
        self
    }

    pub fn having_filter(mut self, filter: Option<Filter>) -> Self {
        self.having = filter;
        self
    }

    pub fn order(mut self, order: Order) -> Self {
        self.order_by = if order.is_empty() { None } else { Some(order) };
        self
    }

    pub fn max_records(&self) -> Option<usize> {
        self.max_records
    }

    pub fn limit(mut self, max_records: usize) -> Self {
        self.max_records = Some(max_records);
        self
    }

    pub fn distinct(mut self, unique: bool) -> Self {
        self.unique = unique;
        self
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    pub fn expressions(&self) -> &[SelectExpression] {
        &self.expressions
    }

    pub fn where_filter(&self) -> Option<&Filter> {
        self.where_filter.as_ref()
    }

    pub fn group_by_expressions(&self) -> &[Expression] {
        &self.group_by
    }

    pub fn having(&self) -> Option<&Filter> {
        self.having.as_ref()
    }

    pub fn order_by(&self) -> Option<&Order> {
        self.order_by.as_ref()
    }

    pub fn unique(&self) -> bool {
        self.unique
    }

    fn aliases(&self) -> impl Iterator<Item = &str> {
        self.expressions.iter().filter_map(|e| e.alias.as_deref())
    }

    /// Source columns referenced anywhere in the query. Names defined as
    /// aliases by the select list are not source columns and are skipped.
    pub fn collect_column_names(&self, into: &mut ColumnListBuilder) {
        let mut all = ColumnListBuilder::new();
        for item in &self.expressions {
            item.expression.collect_column_names(&mut all);
        }
        if let Some(filter) = &self.where_filter {
            filter.collect_column_names(&mut all);
        }
        for expression in &self.group_by {
            expression.collect_column_names(&mut all);
        }
        if let Some(filter) = &self.having {
            filter.collect_column_names(&mut all);
        }
        if let Some(order) = &self.order_by {
            order.collect_column_names(&mut all);
        }
        let aliases: Vec<&str> = self.aliases().collect();
        for name in all.build().iter() {
            if !aliases.contains(&name.as_str()) {
                into.insert(name.clone());
            }
        }
    }

    pub fn column_names(&self) -> ColumnList {
        let mut builder = ColumnListBuilder::new();
        self.collect_column_names(&mut builder);
        builder.build()
    }

    /// Render for `dialect`
    pub fn to_statement(&self, dialect: Dialect, use_parameters: bool) -> Result<Statement> {
        let mut buffer = SqlBuffer::for_dialect(dialect, use_parameters);
        let formatter = buffer.formatter();
        formatter.format_select(&mut buffer, self)?;
        Ok(buffer.into_statement())
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        codec::encode(self)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        codec::decode(bytes)
    }
}
