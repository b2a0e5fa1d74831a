//! Expression engine
//!
//! An expression is an immutable tree of column references, typed constants,
//! scalar functions and aggregates. The same tree can be evaluated against a
//! [`NamedValues`] source or rendered to SQL by a formatter.

mod aggregate;
mod function;

pub use aggregate::{AggregateExpr, AggregateKind};
pub use function::{CompareKind, FunctionExpr, FunctionKind};

use crate::codec;
use crate::columns::{ColumnList, ColumnListBuilder};
use crate::error::{Error, Result};
use crate::format::{DefaultFormatter, FormatOptions, SqlBuffer};
use quarry_value::{ColumnType, NamedValues, Value};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expression {
    /// Reference to a named column
    Column(String),
    /// Literal value with its declared type
    Constant {
        value: Value,
        column_type: ColumnType,
    },
    /// Scalar function over argument expressions
    Function(FunctionExpr),
    /// Aggregate over a group of rows
    Aggregate(AggregateExpr),
}

/// Where evaluation reads its column values from
#[derive(Clone, Copy)]
enum Scope<'a> {
    Row(&'a dyn NamedValues),
    Group(&'a [&'a dyn NamedValues]),
}

impl Expression {
    pub fn column(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(Error::EmptyColumnName);
        }
        Ok(Expression::Column(name))
    }

    /// Constant whose declared type is inferred from the value
    pub fn constant(value: impl Into<Value>) -> Self {
        let value = value.into();
        Expression::Constant {
            column_type: ColumnType::infer(&value),
            value,
        }
    }

    /// Constant converted to `column_type`
    pub fn typed_constant(value: impl Into<Value>, column_type: ColumnType) -> Result<Self> {
        let value = value.into();
        let value = if column_type == ColumnType::Unknown {
            value
        } else {
            value.convert_to(column_type)?
        };
        Ok(Expression::Constant { value, column_type })
    }

    pub fn function(kind: FunctionKind, args: Vec<Expression>) -> Result<Self> {
        Ok(Expression::Function(FunctionExpr::new(kind, args)?))
    }

    pub fn aggregate(kind: AggregateKind, arg: Option<Expression>) -> Result<Self> {
        Ok(Expression::Aggregate(AggregateExpr::new(kind, arg)?))
    }

    /// `COUNT(*)`
    pub fn count_all() -> Self {
        Expression::Aggregate(AggregateExpr::count_all())
    }

    pub fn is_constant(&self) -> bool {
        matches!(self, Expression::Constant { .. })
    }

    pub fn constant_value(&self) -> Option<&Value> {
        match self {
            Expression::Constant { value, .. } => Some(value),
            _ => None,
        }
    }

    pub fn column_name(&self) -> Option<&str> {
        match self {
            Expression::Column(name) => Some(name),
            _ => None,
        }
    }

    pub fn contains_aggregate(&self) -> bool {
        match self {
            Expression::Column(_) | Expression::Constant { .. } => false,
            Expression::Function(f) => f.args().iter().any(Expression::contains_aggregate),
            Expression::Aggregate(_) => true,
        }
    }

    /// Type of the value this expression produces, `Unknown` for columns
    pub fn result_type(&self) -> ColumnType {
        match self {
            Expression::Column(_) => ColumnType::Unknown,
            Expression::Constant { column_type, .. } => *column_type,
            Expression::Function(f) => f.result_type(),
            Expression::Aggregate(a) => a.result_type(),
        }
    }

    /// Append every referenced column name to `into`
    pub fn collect_column_names(&self, into: &mut ColumnListBuilder) {
        match self {
            Expression::Column(name) => {
                into.insert(name.clone());
            }
            Expression::Constant { .. } => {}
            Expression::Function(f) => {
                for arg in f.args() {
                    arg.collect_column_names(into);
                }
            }
            Expression::Aggregate(a) => {
                if let Some(arg) = a.arg() {
                    arg.collect_column_names(into);
                }
            }
        }
    }

    pub fn column_names(&self) -> ColumnList {
        let mut builder = ColumnListBuilder::new();
        self.collect_column_names(&mut builder);
        builder.build()
    }

    /// Copy of the tree with `prefix` prepended to every column name
    pub fn with_column_prefix(&self, prefix: &str) -> Expression {
        match self {
            Expression::Column(name) => Expression::Column(format!("{prefix}{name}")),
            Expression::Constant { .. } => self.clone(),
            Expression::Function(f) => {
                Expression::Function(f.map_args(|arg| arg.with_column_prefix(prefix)))
            }
            Expression::Aggregate(a) => {
                Expression::Aggregate(a.map_arg(|arg| arg.with_column_prefix(prefix)))
            }
        }
    }

    /// Pre-order traversal: the node itself, then its arguments in order
    pub fn all_expressions<'a>(&'a self, into: &mut Vec<&'a Expression>) {
        into.push(self);
        match self {
            Expression::Column(_) | Expression::Constant { .. } => {}
            Expression::Function(f) => {
                for arg in f.args() {
                    arg.all_expressions(into);
                }
            }
            Expression::Aggregate(a) => {
                if let Some(arg) = a.arg() {
                    arg.all_expressions(into);
                }
            }
        }
    }

    /// Evaluate against a single row
    pub fn evaluate(&self, source: &dyn NamedValues) -> Result<Value> {
        self.eval(Scope::Row(source))
    }

    /// Evaluate against a group of rows. Aggregates consume the whole group;
    /// plain column references read the first row.
    pub fn evaluate_aggregate<S: NamedValues>(&self, rows: &[S]) -> Result<Value> {
        let rows: Vec<&dyn NamedValues> = rows.iter().map(|r| r as &dyn NamedValues).collect();
        self.eval(Scope::Group(&rows))
    }

    fn eval(&self, scope: Scope<'_>) -> Result<Value> {
        match self {
            Expression::Column(name) => {
                let source = match scope {
                    Scope::Row(source) => source,
                    Scope::Group(rows) => match rows.first() {
                        Some(first) => *first,
                        None => return Ok(Value::Null),
                    },
                };
                source
                    .get_value(name)
                    .ok_or_else(|| Error::ColumnNotFound(name.clone()))
            }
            Expression::Constant { value, .. } => Ok(value.clone()),
            Expression::Function(f) => f.apply(&mut |arg| arg.eval(scope)),
            Expression::Aggregate(a) => match scope {
                Scope::Group(rows) => a.evaluate_rows(rows),
                Scope::Row(_) => Err(Error::InvalidArgument(format!(
                    "{} cannot be evaluated against a single row",
                    a.kind()
                ))),
            },
        }
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        codec::encode(self)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        codec::decode(bytes)
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut buffer = SqlBuffer::new(&DefaultFormatter);
        match buffer.format_expression(self, &FormatOptions::default()) {
            Ok(()) => f.write_str(buffer.sql()),
            Err(e) => write!(f, "<{e}>"),
        }
    }
}

impl From<Value> for Expression {
    fn from(value: Value) -> Self {
        Expression::constant(value)
    }
}
