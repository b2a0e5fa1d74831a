//! SQL formatting
//!
//! A [`SqlFormatter`] renders expressions, filters and whole statements into
//! a [`SqlBuffer`]. The trait's provided methods produce portable SQL; each
//! dialect overrides the hooks where its syntax differs (identifier quoting,
//! parameter markers, literal syntax, function names, pattern escaping and
//! case-insensitive comparison).
//!
//! The [`DefaultFormatter`] produces the canonical predicate text used by
//! `Display` on expressions and filters.

mod access;
mod buffer;
mod default;
mod postgres;
mod sqlite;
mod sqlserver;

pub use access::AccessFormatter;
pub use buffer::{SqlBuffer, Statement};
pub use default::DefaultFormatter;
pub use postgres::PostgresFormatter;
pub use sqlite::SqliteFormatter;
pub use sqlserver::SqlServerFormatter;

use crate::columns::ColumnList;
use crate::error::{Error, Result};
use crate::expression::{AggregateExpr, CompareKind, Expression, FunctionExpr, FunctionKind};
use crate::filter::{
    CompareFilter, DateRangeCrossFilter, DateRangeFilter, DateRangeInclusionFilter, Filter,
    IdsFilter, NullFilter, NumRangeCrossFilter, NumRangeFilter, NumRangeInclusionFilter,
    StartsWithFilter, StringValueFilter, SubstringFilter, ValuesFilter,
};
use crate::select::SelectInfo;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use quarry_value::{ColumnType, Value};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Target SQL dialect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Dialect {
    /// Canonical predicate text for in-memory row filtering
    #[default]
    Default,
    /// Embedded file database
    Sqlite,
    Postgres,
    SqlServer,
    /// Legacy desktop (Jet) database
    Access,
}

impl Dialect {
    pub fn formatter(self) -> &'static dyn SqlFormatter {
        match self {
            Dialect::Default => &DefaultFormatter,
            Dialect::Sqlite => &SqliteFormatter,
            Dialect::Postgres => &PostgresFormatter,
            Dialect::SqlServer => &SqlServerFormatter,
            Dialect::Access => &AccessFormatter,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Dialect::Default => "Default",
            Dialect::Sqlite => "SQLite",
            Dialect::Postgres => "PostgreSQL",
            Dialect::SqlServer => "SQL Server",
            Dialect::Access => "Access",
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Options for rendering a single expression
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FormatOptions {
    /// Wrap function and aggregate nodes in parentheses
    pub parenthesize: bool,
    /// Render a null result as the default value of this type
    pub null_as_default: Option<ColumnType>,
}

impl FormatOptions {
    pub fn with_parentheses(mut self) -> Self {
        self.parenthesize = true;
        self
    }

    pub fn with_null_as_default(mut self, column_type: ColumnType) -> Self {
        self.null_as_default = Some(column_type);
        self
    }
}

/// How a dialect caps the number of returned rows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimitStyle {
    /// `SELECT ... LIMIT n`
    Limit,
    /// `SELECT TOP n ...`
    Top,
}

const NO_OPTIONS: FormatOptions = FormatOptions {
    parenthesize: false,
    null_as_default: None,
};

/// Renders query trees as dialect-specific SQL
pub trait SqlFormatter: Send + Sync {
    fn dialect(&self) -> Dialect;

    fn unsupported(&self, feature: &str) -> Error {
        Error::UnsupportedByDialect {
            dialect: self.dialect().name().to_string(),
            feature: feature.to_string(),
        }
    }

    // ========================================================================
    // Identifiers
    // ========================================================================

    fn format_name(&self, buffer: &mut SqlBuffer<'_>, name: &str) {
        buffer.push('"');
        buffer.push_str(&name.replace('"', "\"\""));
        buffer.push('"');
    }

    // ========================================================================
    // Values
    // ========================================================================

    /// Marker for the 1-based `index`-th parameter; `None` when the dialect
    /// always inlines values
    fn parameter_marker(&self, _index: usize) -> Option<String> {
        None
    }

    /// Render a value as a parameter when the buffer collects parameters,
    /// otherwise as a literal. Nulls are always inlined.
    fn format_value(&self, buffer: &mut SqlBuffer<'_>, value: &Value) -> Result<()> {
        if buffer.uses_parameters()
            && !value.is_null()
            && let Some(marker) = self.parameter_marker(buffer.params().len() + 1)
        {
            buffer.push_str(&marker);
            buffer.add_parameter(value.clone());
            return Ok(());
        }
        self.format_literal(buffer, value)
    }

    fn format_literal(&self, buffer: &mut SqlBuffer<'_>, value: &Value) -> Result<()> {
        match value {
            Value::Null => buffer.push_str("NULL"),
            Value::Bool(b) => self.format_bool_literal(buffer, *b),
            Value::I32(i) => buffer.push_str(&i.to_string()),
            Value::I64(i) => buffer.push_str(&i.to_string()),
            Value::F64(f) => {
                if !f.is_finite() {
                    return Err(Error::InvalidArgument(format!(
                        "{f} cannot be written as a SQL literal"
                    )));
                }
                buffer.push_str(&f.to_string());
            }
            Value::Decimal(d) => buffer.push_str(&d.to_string()),
            Value::Str(s) => self.format_string_literal(buffer, s),
            Value::Date(d) => self.format_date_literal(buffer, *d),
            Value::Time(t) => self.format_time_literal(buffer, *t),
            Value::Timestamp(ts) => self.format_timestamp_literal(buffer, *ts),
            Value::Uuid(u) => self.format_guid_literal(buffer, *u),
            Value::Bytea(bytes) => return self.format_binary_literal(buffer, bytes),
        }
        Ok(())
    }

    fn format_string_literal(&self, buffer: &mut SqlBuffer<'_>, s: &str) {
        buffer.push('\'');
        buffer.push_str(&s.replace('\'', "''"));
        buffer.push('\'');
    }

    fn format_bool_literal(&self, buffer: &mut SqlBuffer<'_>, b: bool) {
        buffer.push_str(if b { "TRUE" } else { "FALSE" });
    }

    fn format_date_literal(&self, buffer: &mut SqlBuffer<'_>, date: NaiveDate) {
        buffer.push_str(&date.format("DATE '%Y-%m-%d'").to_string());
    }

    fn format_time_literal(&self, buffer: &mut SqlBuffer<'_>, time: NaiveTime) {
        buffer.push_str(&time.format("TIME '%H:%M:%S%.f'").to_string());
    }

    fn format_timestamp_literal(&self, buffer: &mut SqlBuffer<'_>, ts: NaiveDateTime) {
        buffer.push_str(&ts.format("TIMESTAMP '%Y-%m-%d %H:%M:%S%.f'").to_string());
    }

    fn format_guid_literal(&self, buffer: &mut SqlBuffer<'_>, guid: Uuid) {
        self.format_string_literal(buffer, &guid.hyphenated().to_string());
    }

    fn format_binary_literal(&self, buffer: &mut SqlBuffer<'_>, bytes: &[u8]) -> Result<()> {
        buffer.push_str("X'");
        buffer.push_str(&hex(bytes));
        buffer.push('\'');
        Ok(())
    }

    // ========================================================================
    // Expressions
    // ========================================================================

    fn format_expression(
        &self,
        buffer: &mut SqlBuffer<'_>,
        expression: &Expression,
        options: &FormatOptions,
    ) -> Result<()> {
        if let Some(column_type) = options.null_as_default
            && !expression.is_constant()
        {
            let default = column_type.default_value();
            if !default.is_null() {
                return self.format_null_as_default(buffer, expression, &default);
            }
        }
        let wrap = options.parenthesize
            && matches!(expression, Expression::Function(_) | Expression::Aggregate(_));
        if wrap {
            buffer.push('(');
        }
        match expression {
            Expression::Column(name) => self.format_name(buffer, name),
            Expression::Constant { value, .. } => self.format_value(buffer, value)?,
            Expression::Function(function) => self.format_function(buffer, function)?,
            Expression::Aggregate(aggregate) => self.format_aggregate(buffer, aggregate)?,
        }
        if wrap {
            buffer.push(')');
        }
        Ok(())
    }

    /// Expression with nulls replaced by `default`
    fn format_null_as_default(
        &self,
        buffer: &mut SqlBuffer<'_>,
        expression: &Expression,
        default: &Value,
    ) -> Result<()> {
        buffer.push_str("COALESCE(");
        self.format_expression(buffer, expression, &NO_OPTIONS)?;
        buffer.push_str(", ");
        self.format_value(buffer, default)?;
        buffer.push(')');
        Ok(())
    }

    fn function_name(&self, kind: FunctionKind) -> &'static str {
        match kind {
            FunctionKind::Abs => "ABS",
            FunctionKind::Coalesce => "COALESCE",
            FunctionKind::Length => "LENGTH",
            FunctionKind::Lower => "LOWER",
            FunctionKind::Upper => "UPPER",
            FunctionKind::Substring => "SUBSTRING",
            other => other.name(),
        }
    }

    fn format_function(&self, buffer: &mut SqlBuffer<'_>, function: &FunctionExpr) -> Result<()> {
        format_function_default(self, buffer, function)
    }

    /// `NAME(arg, arg, ...)`
    fn format_call(&self, buffer: &mut SqlBuffer<'_>, name: &str, args: &[Expression]) -> Result<()> {
        buffer.push_str(name);
        buffer.push('(');
        for (i, arg) in args.iter().enumerate() {
            if i > 0 {
                buffer.push_str(", ");
            }
            self.format_expression(buffer, arg, &NO_OPTIONS)?;
        }
        buffer.push(')');
        Ok(())
    }

    /// Comparison used as a value
    fn format_comparison(
        &self,
        buffer: &mut SqlBuffer<'_>,
        kind: CompareKind,
        left: &Expression,
        right: &Expression,
    ) -> Result<()> {
        buffer.push('(');
        self.format_expression(buffer, left, &NO_OPTIONS)?;
        buffer.push(' ');
        buffer.push_str(kind.symbol());
        buffer.push(' ');
        self.format_expression(buffer, right, &NO_OPTIONS)?;
        buffer.push(')');
        Ok(())
    }

    /// Expression used where the dialect expects a predicate
    fn format_condition(&self, buffer: &mut SqlBuffer<'_>, condition: &Expression) -> Result<()> {
        self.format_expression(buffer, condition, &NO_OPTIONS)
    }

    fn format_coalesce(&self, buffer: &mut SqlBuffer<'_>, args: &[Expression]) -> Result<()> {
        self.format_call(buffer, self.function_name(FunctionKind::Coalesce), args)
    }

    fn format_iif(
        &self,
        buffer: &mut SqlBuffer<'_>,
        condition: &Expression,
        when_true: &Expression,
        when_false: &Expression,
    ) -> Result<()> {
        buffer.push_str("CASE WHEN ");
        self.format_condition(buffer, condition)?;
        buffer.push_str(" THEN ");
        self.format_expression(buffer, when_true, &NO_OPTIONS)?;
        buffer.push_str(" ELSE ");
        self.format_expression(buffer, when_false, &NO_OPTIONS)?;
        buffer.push_str(" END");
        Ok(())
    }

    fn format_aggregate(&self, buffer: &mut SqlBuffer<'_>, aggregate: &AggregateExpr) -> Result<()> {
        buffer.push_str(aggregate.kind().sql_name());
        buffer.push('(');
        match aggregate.arg() {
            Some(arg) => self.format_expression(buffer, arg, &NO_OPTIONS)?,
            None => buffer.push('*'),
        }
        buffer.push(')');
        Ok(())
    }

    // ========================================================================
    // Filters
    // ========================================================================

    fn format_filter(&self, buffer: &mut SqlBuffer<'_>, filter: &Filter) -> Result<()> {
        format_filter_default(self, buffer, filter)
    }

    fn format_constant_filter(&self, buffer: &mut SqlBuffer<'_>, value: bool) {
        buffer.push_str(if value { "1=1" } else { "1=0" });
    }

    fn format_logical(&self, buffer: &mut SqlBuffer<'_>, filters: &[Filter], operator: &str) -> Result<()> {
        for (i, filter) in filters.iter().enumerate() {
            if i > 0 {
                buffer.push(' ');
                buffer.push_str(operator);
                buffer.push(' ');
            }
            let nested = matches!(filter, Filter::And(_) | Filter::Or(_));
            if nested {
                buffer.push('(');
            }
            self.format_filter(buffer, filter)?;
            if nested {
                buffer.push(')');
            }
        }
        Ok(())
    }

    fn format_compare_filter(&self, buffer: &mut SqlBuffer<'_>, filter: &CompareFilter) -> Result<()> {
        let options = if filter.null_as_default() {
            NO_OPTIONS.with_null_as_default(filter.compare_type())
        } else {
            NO_OPTIONS
        };
        self.format_expression(buffer, filter.left(), &options)?;
        buffer.push(' ');
        buffer.push_str(filter.kind().symbol());
        buffer.push(' ');
        self.format_expression(buffer, filter.right(), &options)
    }

    fn format_null_filter(&self, buffer: &mut SqlBuffer<'_>, filter: &NullFilter) -> Result<()> {
        self.format_expression(buffer, filter.expression(), &NO_OPTIONS)?;
        buffer.push_str(if filter.not_null() {
            " IS NOT NULL"
        } else {
            " IS NULL"
        });
        Ok(())
    }

    fn format_ids_filter(&self, buffer: &mut SqlBuffer<'_>, filter: &IdsFilter) -> Result<()> {
        self.format_expression(buffer, filter.expression(), &NO_OPTIONS)?;
        let ids: Vec<String> = filter.ids().iter().map(i64::to_string).collect();
        if ids.len() == 1 {
            buffer.push_str(" = ");
            buffer.push_str(&ids[0]);
        } else {
            buffer.push_str(" IN (");
            buffer.push_str(&ids.join(", "));
            buffer.push(')');
        }
        Ok(())
    }

    fn format_values_filter(&self, buffer: &mut SqlBuffer<'_>, filter: &ValuesFilter) -> Result<()> {
        let values: Vec<&Value> = filter.non_null_values().collect();
        let with_null = filter.contains_null();
        if values.is_empty() {
            self.format_expression(buffer, filter.expression(), &NO_OPTIONS)?;
            buffer.push_str(" IS NULL");
            return Ok(());
        }
        if with_null {
            buffer.push('(');
        }
        self.format_expression(buffer, filter.expression(), &NO_OPTIONS)?;
        if values.len() == 1 {
            buffer.push_str(" = ");
            self.format_value(buffer, values[0])?;
        } else {
            buffer.push_str(" IN (");
            for (i, value) in values.iter().enumerate() {
                if i > 0 {
                    buffer.push_str(", ");
                }
                self.format_value(buffer, value)?;
            }
            buffer.push(')');
        }
        if with_null {
            buffer.push_str(" OR ");
            self.format_expression(buffer, filter.expression(), &NO_OPTIONS)?;
            buffer.push_str(" IS NULL)");
        }
        Ok(())
    }

    /// `expression >= first AND expression <= last`, parenthesized when both
    /// bounds are present
    fn format_bounds(
        &self,
        buffer: &mut SqlBuffer<'_>,
        expression: &Expression,
        lower: Option<(&str, &Value)>,
        upper: Option<(&str, &Value)>,
    ) -> Result<()> {
        let both = lower.is_some() && upper.is_some();
        if both {
            buffer.push('(');
        }
        for (i, (operator, bound)) in lower.into_iter().chain(upper).enumerate() {
            if i > 0 {
                buffer.push_str(" AND ");
            }
            self.format_expression(buffer, expression, &NO_OPTIONS)?;
            buffer.push(' ');
            buffer.push_str(operator);
            buffer.push(' ');
            self.format_value(buffer, bound)?;
        }
        if both {
            buffer.push(')');
        }
        Ok(())
    }

    fn format_num_range_filter(&self, buffer: &mut SqlBuffer<'_>, filter: &NumRangeFilter) -> Result<()> {
        self.format_bounds(
            buffer,
            filter.expression(),
            filter.first().map(|v| (">=", v)),
            filter.last().map(|v| ("<=", v)),
        )
    }

    /// Whole days: the upper bound is exclusive on the following day so
    /// values carrying a time of day still match
    fn format_date_range_filter(&self, buffer: &mut SqlBuffer<'_>, filter: &DateRangeFilter) -> Result<()> {
        let first = filter.first().map(Value::Date);
        let last = filter.last().map(|last| match last.succ_opt() {
            Some(next) => ("<", Value::Date(next)),
            None => ("<=", Value::Date(last)),
        });
        self.format_bounds(
            buffer,
            filter.expression(),
            first.as_ref().map(|v| (">=", v)),
            last.as_ref().map(|(op, v)| (*op, v)),
        )
    }

    /// `(column IS NULL OR column <operator> value)`
    fn format_open_bound(
        &self,
        buffer: &mut SqlBuffer<'_>,
        column: &Expression,
        operator: &str,
        value: &Value,
    ) -> Result<()> {
        buffer.push('(');
        self.format_expression(buffer, column, &NO_OPTIONS)?;
        buffer.push_str(" IS NULL OR ");
        self.format_expression(buffer, column, &NO_OPTIONS)?;
        buffer.push(' ');
        buffer.push_str(operator);
        buffer.push(' ');
        self.format_value(buffer, value)?;
        buffer.push(')');
        Ok(())
    }

    /// Conjunction of open bounds on the two range columns
    fn format_range_columns(
        &self,
        buffer: &mut SqlBuffer<'_>,
        first_column: &Expression,
        last_column: &Expression,
        upper_for_first: Option<&Value>,
        lower_for_last: Option<&Value>,
    ) -> Result<()> {
        let both = upper_for_first.is_some() && lower_for_last.is_some();
        if both {
            buffer.push('(');
        }
        if let Some(value) = upper_for_first {
            self.format_open_bound(buffer, first_column, "<=", value)?;
        }
        if both {
            buffer.push_str(" AND ");
        }
        if let Some(value) = lower_for_last {
            self.format_open_bound(buffer, last_column, ">=", value)?;
        }
        if both {
            buffer.push(')');
        }
        Ok(())
    }

    fn format_num_range_inclusion_filter(
        &self,
        buffer: &mut SqlBuffer<'_>,
        filter: &NumRangeInclusionFilter,
    ) -> Result<()> {
        self.format_range_columns(
            buffer,
            filter.first_column(),
            filter.last_column(),
            Some(filter.value()),
            Some(filter.value()),
        )
    }

    fn format_date_range_inclusion_filter(
        &self,
        buffer: &mut SqlBuffer<'_>,
        filter: &DateRangeInclusionFilter,
    ) -> Result<()> {
        let value = Value::Date(filter.value());
        self.format_range_columns(
            buffer,
            filter.first_column(),
            filter.last_column(),
            Some(&value),
            Some(&value),
        )
    }

    fn format_num_range_cross_filter(
        &self,
        buffer: &mut SqlBuffer<'_>,
        filter: &NumRangeCrossFilter,
    ) -> Result<()> {
        self.format_range_columns(
            buffer,
            filter.first_column(),
            filter.last_column(),
            filter.last(),
            filter.first(),
        )
    }

    fn format_date_range_cross_filter(
        &self,
        buffer: &mut SqlBuffer<'_>,
        filter: &DateRangeCrossFilter,
    ) -> Result<()> {
        let first = filter.first().map(Value::Date);
        let last = filter.last().map(Value::Date);
        self.format_range_columns(
            buffer,
            filter.first_column(),
            filter.last_column(),
            last.as_ref(),
            first.as_ref(),
        )
    }

    // ========================================================================
    // String filters
    // ========================================================================

    /// Wildcard matching any run of characters
    fn like_any(&self) -> &'static str {
        "%"
    }

    /// Wildcard matching exactly one character
    fn like_one(&self) -> &'static str {
        "_"
    }

    /// Escape wildcard characters of `text` so it matches literally
    fn escape_like(&self, text: &str) -> String {
        let mut escaped = String::with_capacity(text.len());
        for c in text.chars() {
            if matches!(c, '%' | '_' | '\\') {
                escaped.push('\\');
            }
            escaped.push(c);
        }
        escaped
    }

    /// Clause declaring the escape character used by [`escape_like`](Self::escape_like)
    fn like_escape_clause(&self) -> &'static str {
        " ESCAPE '\\'"
    }

    /// `expression LIKE pattern`, folding case on both sides when asked
    fn format_like(
        &self,
        buffer: &mut SqlBuffer<'_>,
        expression: &Expression,
        pattern: &str,
        ignore_case: bool,
    ) -> Result<()> {
        if ignore_case {
            buffer.push_str("UPPER(");
            self.format_expression(buffer, expression, &NO_OPTIONS)?;
            buffer.push_str(") LIKE ");
            self.format_string_literal(buffer, &pattern.to_uppercase());
        } else {
            self.format_expression(buffer, expression, &NO_OPTIONS)?;
            buffer.push_str(" LIKE ");
            self.format_string_literal(buffer, pattern);
        }
        buffer.push_str(self.like_escape_clause());
        Ok(())
    }

    /// `expression = value` on text
    fn format_text_equals(
        &self,
        buffer: &mut SqlBuffer<'_>,
        expression: &Expression,
        value: &str,
        ignore_case: bool,
    ) -> Result<()> {
        if ignore_case {
            buffer.push_str("UPPER(");
            self.format_expression(buffer, expression, &NO_OPTIONS)?;
            buffer.push_str(") = ");
            self.format_value(buffer, &Value::Str(value.to_uppercase()))
        } else {
            self.format_expression(buffer, expression, &NO_OPTIONS)?;
            buffer.push_str(" = ");
            self.format_value(buffer, &Value::Str(value.to_string()))
        }
    }

    fn format_string_value_filter(
        &self,
        buffer: &mut SqlBuffer<'_>,
        filter: &StringValueFilter,
    ) -> Result<()> {
        self.format_text_equals(buffer, filter.expression(), filter.value(), filter.ignore_case())
    }

    fn format_starts_with_filter(
        &self,
        buffer: &mut SqlBuffer<'_>,
        filter: &StartsWithFilter,
    ) -> Result<()> {
        let pattern = format!("{}{}", self.escape_like(filter.prefix()), self.like_any());
        self.format_like(buffer, filter.expression(), &pattern, filter.ignore_case())
    }

    fn format_substring_filter(&self, buffer: &mut SqlBuffer<'_>, filter: &SubstringFilter) -> Result<()> {
        let pattern = format!(
            "{}{}{}",
            self.like_one().repeat(filter.start_index()),
            self.escape_like(filter.value()),
            self.like_any()
        );
        self.format_like(buffer, filter.expression(), &pattern, filter.ignore_case())
    }

    // ========================================================================
    // Statements
    // ========================================================================

    fn limit_style(&self) -> LimitStyle {
        LimitStyle::Limit
    }

    fn format_select(&self, buffer: &mut SqlBuffer<'_>, select: &SelectInfo) -> Result<()> {
        buffer.push_str("SELECT ");
        if select.unique() {
            buffer.push_str("DISTINCT ");
        }
        let limit = select.max_records();
        if let Some(limit) = limit
            && self.limit_style() == LimitStyle::Top
        {
            buffer.push_str(&format!("TOP {limit} "));
        }
        if select.expressions().is_empty() {
            buffer.push('*');
        }
        for (i, item) in select.expressions().iter().enumerate() {
            if i > 0 {
                buffer.push_str(", ");
            }
            self.format_expression(buffer, &item.expression, &NO_OPTIONS)?;
            if let Some(alias) = &item.alias {
                buffer.push_str(" AS ");
                self.format_name(buffer, alias);
            }
        }
        buffer.push_str(" FROM ");
        self.format_name(buffer, select.table_name());
        if let Some(filter) = select.where_filter()
            && !filter.is_always_true()
        {
            buffer.push_str(" WHERE ");
            self.format_filter(buffer, filter)?;
        }
        if !select.group_by_expressions().is_empty() {
            buffer.push_str(" GROUP BY ");
            for (i, expression) in select.group_by_expressions().iter().enumerate() {
                if i > 0 {
                    buffer.push_str(", ");
                }
                self.format_expression(buffer, expression, &NO_OPTIONS)?;
            }
        }
        if let Some(having) = select.having()
            && !having.is_always_true()
        {
            buffer.push_str(" HAVING ");
            self.format_filter(buffer, having)?;
        }
        if let Some(order) = select.order_by()
            && !order.is_empty()
        {
            buffer.push_str(" ORDER BY ");
            for (i, item) in order.items().iter().enumerate() {
                if i > 0 {
                    buffer.push_str(", ");
                }
                self.format_expression(buffer, &item.expression, &NO_OPTIONS)?;
                if item.descending {
                    buffer.push_str(" DESC");
                }
            }
        }
        if let Some(limit) = limit
            && self.limit_style() == LimitStyle::Limit
        {
            buffer.push_str(&format!(" LIMIT {limit}"));
        }
        Ok(())
    }

    fn format_insert(
        &self,
        buffer: &mut SqlBuffer<'_>,
        table: &str,
        columns: &ColumnList,
        values: &[Value],
    ) -> Result<()> {
        check_row_width(columns, values)?;
        buffer.push_str("INSERT INTO ");
        self.format_name(buffer, table);
        buffer.push_str(" (");
        for (i, column) in columns.iter().enumerate() {
            if i > 0 {
                buffer.push_str(", ");
            }
            self.format_name(buffer, column);
        }
        buffer.push_str(") VALUES (");
        for (i, value) in values.iter().enumerate() {
            if i > 0 {
                buffer.push_str(", ");
            }
            self.format_value(buffer, value)?;
        }
        buffer.push(')');
        Ok(())
    }

    fn format_update(
        &self,
        buffer: &mut SqlBuffer<'_>,
        table: &str,
        columns: &ColumnList,
        values: &[Value],
        where_filter: Option<&Filter>,
    ) -> Result<()> {
        check_row_width(columns, values)?;
        if columns.is_empty() {
            return Err(Error::InvalidArgument("UPDATE requires at least one column".into()));
        }
        buffer.push_str("UPDATE ");
        self.format_name(buffer, table);
        buffer.push_str(" SET ");
        for (i, (column, value)) in columns.iter().zip(values).enumerate() {
            if i > 0 {
                buffer.push_str(", ");
            }
            self.format_name(buffer, column);
            buffer.push_str(" = ");
            self.format_value(buffer, value)?;
        }
        self.format_where(buffer, where_filter)
    }

    fn format_count(
        &self,
        buffer: &mut SqlBuffer<'_>,
        table: &str,
        where_filter: Option<&Filter>,
    ) -> Result<()> {
        buffer.push_str("SELECT COUNT(*) FROM ");
        self.format_name(buffer, table);
        self.format_where(buffer, where_filter)
    }

    /// ` WHERE filter`, or nothing for an absent or always-true filter
    fn format_where(&self, buffer: &mut SqlBuffer<'_>, where_filter: Option<&Filter>) -> Result<()> {
        if let Some(filter) = where_filter
            && !filter.is_always_true()
        {
            buffer.push_str(" WHERE ");
            self.format_filter(buffer, filter)?;
        }
        Ok(())
    }
}

/// Portable rendering of a filter node
pub(crate) fn format_filter_default<F: SqlFormatter + ?Sized>(
    formatter: &F,
    buffer: &mut SqlBuffer<'_>,
    filter: &Filter,
) -> Result<()> {
    if let Some(fixed) = filter.degeneration().as_bool() {
        formatter.format_constant_filter(buffer, fixed);
        return Ok(());
    }
    match filter {
        Filter::And(leaf) => formatter.format_logical(buffer, leaf.filters(), "AND"),
        Filter::Or(leaf) => formatter.format_logical(buffer, leaf.filters(), "OR"),
        Filter::Not(leaf) => {
            buffer.push_str("NOT (");
            formatter.format_filter(buffer, leaf.inner())?;
            buffer.push(')');
            Ok(())
        }
        Filter::Compare(leaf) => formatter.format_compare_filter(buffer, leaf),
        Filter::Null(leaf) => formatter.format_null_filter(buffer, leaf),
        Filter::Ids(leaf) => formatter.format_ids_filter(buffer, leaf),
        Filter::Values(leaf) => formatter.format_values_filter(buffer, leaf),
        Filter::NumRange(leaf) => formatter.format_num_range_filter(buffer, leaf),
        Filter::DateRange(leaf) => formatter.format_date_range_filter(buffer, leaf),
        Filter::NumRangeInclusion(leaf) => formatter.format_num_range_inclusion_filter(buffer, leaf),
        Filter::DateRangeInclusion(leaf) => formatter.format_date_range_inclusion_filter(buffer, leaf),
        Filter::NumRangeCross(leaf) => formatter.format_num_range_cross_filter(buffer, leaf),
        Filter::DateRangeCross(leaf) => formatter.format_date_range_cross_filter(buffer, leaf),
        Filter::StringValue(leaf) => formatter.format_string_value_filter(buffer, leaf),
        Filter::StartsWith(leaf) => formatter.format_starts_with_filter(buffer, leaf),
        Filter::Substring(leaf) => formatter.format_substring_filter(buffer, leaf),
        Filter::Dummy(leaf) => {
            formatter.format_constant_filter(buffer, leaf.value());
            Ok(())
        }
    }
}

/// Portable rendering of a function node, for dialects that override
/// [`SqlFormatter::format_function`] for only some kinds
pub(crate) fn format_function_default<F: SqlFormatter + ?Sized>(
    formatter: &F,
    buffer: &mut SqlBuffer<'_>,
    function: &FunctionExpr,
) -> Result<()> {
    let args = function.args();
    match function.kind() {
        FunctionKind::Compare(kind) => formatter.format_comparison(buffer, kind, &args[0], &args[1]),
        FunctionKind::Add
        | FunctionKind::Subtract
        | FunctionKind::Multiply
        | FunctionKind::Divide => {
            buffer.push('(');
            formatter.format_expression(buffer, &args[0], &NO_OPTIONS)?;
            buffer.push(' ');
            buffer.push_str(function.kind().operator_symbol().unwrap_or_default());
            buffer.push(' ');
            formatter.format_expression(buffer, &args[1], &NO_OPTIONS)?;
            buffer.push(')');
            Ok(())
        }
        FunctionKind::Neg => {
            buffer.push_str("(-");
            formatter.format_expression(buffer, &args[0], &NO_OPTIONS)?;
            buffer.push(')');
            Ok(())
        }
        FunctionKind::Coalesce => formatter.format_coalesce(buffer, args),
        FunctionKind::IIf => formatter.format_iif(buffer, &args[0], &args[1], &args[2]),
        kind => formatter.format_call(buffer, formatter.function_name(kind), args),
    }
}

fn check_row_width(columns: &ColumnList, values: &[Value]) -> Result<()> {
    if columns.len() != values.len() {
        return Err(Error::InvalidArgument(format!(
            "{} columns but {} values",
            columns.len(),
            values.len()
        )));
    }
    Ok(())
}

/// Lowercase hex digits of `bytes`
pub(crate) fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}
