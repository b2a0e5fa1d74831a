//! Canonical predicate text
//!
//! This is the syntax of the in-memory row-filtering facility: bare or
//! bracketed column names, `#...#` date literals, `*` as the only pattern
//! wildcard and bracket escaping inside patterns. Values are always inlined.

use super::{Dialect, NO_OPTIONS, SqlBuffer, SqlFormatter, format_filter_default};
use crate::error::Result;
use crate::expression::{Expression, FunctionKind};
use crate::filter::{Filter, SubstringFilter};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use quarry_value::Value;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultFormatter;

/// Whether `name` can be written without brackets
fn is_plain_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' => chars.all(|c| c.is_alphanumeric() || c == '_'),
        _ => false,
    }
}

impl SqlFormatter for DefaultFormatter {
    fn dialect(&self) -> Dialect {
        Dialect::Default
    }

    fn format_name(&self, buffer: &mut SqlBuffer<'_>, name: &str) {
        if is_plain_name(name) {
            buffer.push_str(name);
            return;
        }
        buffer.push('[');
        for c in name.chars() {
            if matches!(c, ']' | '\\') {
                buffer.push('\\');
            }
            buffer.push(c);
        }
        buffer.push(']');
    }

    /// Row filters are evaluated one row at a time
    fn format_filter(&self, buffer: &mut SqlBuffer<'_>, filter: &Filter) -> Result<()> {
        if filter.contains_aggregate() {
            return Err(self.unsupported("aggregate functions in row filters"));
        }
        format_filter_default(self, buffer, filter)
    }

    fn format_bool_literal(&self, buffer: &mut SqlBuffer<'_>, b: bool) {
        buffer.push_str(if b { "true" } else { "false" });
    }

    fn format_date_literal(&self, buffer: &mut SqlBuffer<'_>, date: NaiveDate) {
        buffer.push_str(&date.format("#%Y-%m-%d#").to_string());
    }

    fn format_time_literal(&self, buffer: &mut SqlBuffer<'_>, time: NaiveTime) {
        buffer.push_str(&time.format("#%H:%M:%S#").to_string());
    }

    fn format_timestamp_literal(&self, buffer: &mut SqlBuffer<'_>, ts: NaiveDateTime) {
        buffer.push_str(&ts.format("#%Y-%m-%d %H:%M:%S#").to_string());
    }

    fn format_guid_literal(&self, buffer: &mut SqlBuffer<'_>, guid: Uuid) {
        buffer.push_str("CONVERT(");
        self.format_string_literal(buffer, &guid.hyphenated().to_string());
        buffer.push_str(", 'System.Guid')");
    }

    fn format_binary_literal(&self, _buffer: &mut SqlBuffer<'_>, _bytes: &[u8]) -> Result<()> {
        Err(self.unsupported("binary literals"))
    }

    fn function_name(&self, kind: FunctionKind) -> &'static str {
        match kind {
            FunctionKind::Abs => "ABS",
            FunctionKind::Length => "LEN",
            FunctionKind::Lower => "LOWER",
            FunctionKind::Upper => "UPPER",
            FunctionKind::Substring => "SUBSTRING",
            FunctionKind::Coalesce => "ISNULL",
            other => other.name(),
        }
    }

    fn format_null_as_default(
        &self,
        buffer: &mut SqlBuffer<'_>,
        expression: &Expression,
        default: &Value,
    ) -> Result<()> {
        buffer.push_str("ISNULL(");
        self.format_expression(buffer, expression, &NO_OPTIONS)?;
        buffer.push_str(", ");
        self.format_value(buffer, default)?;
        buffer.push(')');
        Ok(())
    }

    /// `ISNULL(a, ISNULL(b, c))`
    fn format_coalesce(&self, buffer: &mut SqlBuffer<'_>, args: &[Expression]) -> Result<()> {
        match args {
            [] => {
                buffer.push_str("NULL");
                Ok(())
            }
            [last] => self.format_expression(buffer, last, &NO_OPTIONS),
            [first, rest @ ..] => {
                buffer.push_str("ISNULL(");
                self.format_expression(buffer, first, &NO_OPTIONS)?;
                buffer.push_str(", ");
                self.format_coalesce(buffer, rest)?;
                buffer.push(')');
                Ok(())
            }
        }
    }

    fn format_iif(
        &self,
        buffer: &mut SqlBuffer<'_>,
        condition: &Expression,
        when_true: &Expression,
        when_false: &Expression,
    ) -> Result<()> {
        buffer.push_str("IIF(");
        self.format_condition(buffer, condition)?;
        buffer.push_str(", ");
        self.format_expression(buffer, when_true, &NO_OPTIONS)?;
        buffer.push_str(", ");
        self.format_expression(buffer, when_false, &NO_OPTIONS)?;
        buffer.push(')');
        Ok(())
    }

    fn like_any(&self) -> &'static str {
        "*"
    }

    fn escape_like(&self, text: &str) -> String {
        let mut escaped = String::with_capacity(text.len());
        for c in text.chars() {
            match c {
                '*' | '%' | '[' | ']' => {
                    escaped.push('[');
                    escaped.push(c);
                    escaped.push(']');
                }
                c => escaped.push(c),
            }
        }
        escaped
    }

    fn like_escape_clause(&self) -> &'static str {
        ""
    }

    /// No single-character wildcard: `SUBSTRING(e, start, len) = 'value'`
    fn format_substring_filter(&self, buffer: &mut SqlBuffer<'_>, filter: &SubstringFilter) -> Result<()> {
        let value = if filter.ignore_case() {
            filter.value().to_uppercase()
        } else {
            filter.value().to_string()
        };
        if filter.ignore_case() {
            buffer.push_str("UPPER(");
        }
        buffer.push_str("SUBSTRING(");
        self.format_expression(buffer, filter.expression(), &NO_OPTIONS)?;
        buffer.push_str(&format!(
            ", {}, {})",
            filter.start_index() + 1,
            filter.value().chars().count()
        ));
        if filter.ignore_case() {
            buffer.push(')');
        }
        buffer.push_str(" = ");
        self.format_string_literal(buffer, &value);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expression::{AggregateKind, CompareKind};

    fn render(filter: &Filter) -> String {
        let mut buffer = SqlBuffer::new(&DefaultFormatter);
        buffer.format_filter(filter).unwrap();
        buffer.sql().to_string()
    }

    #[test]
    fn test_names() {
        let mut buffer = SqlBuffer::new(&DefaultFormatter);
        buffer.format_name("Name");
        buffer.push(' ');
        buffer.format_name("Unit Price");
        buffer.push(' ');
        buffer.format_name("a]b");
        assert_eq!(buffer.sql(), r"Name [Unit Price] [a\]b]");
    }

    #[test]
    fn test_date_range_is_day_exclusive() {
        let filter = Filter::date_range(
            "D",
            NaiveDate::from_ymd_opt(2024, 1, 1),
            NaiveDate::from_ymd_opt(2024, 1, 31),
        )
        .unwrap();
        assert_eq!(render(&filter), "(D >= #2024-01-01# AND D < #2024-02-01#)");
    }

    #[test]
    fn test_starts_with_escapes_wildcards() {
        let filter = Filter::starts_with("Code", "5*[x]%", false).unwrap();
        assert_eq!(render(&filter), "Code LIKE '5[*][[]x[]][%]*'");
    }

    #[test]
    fn test_substring_uses_function() {
        let filter = Filter::substring("Code", 2, "ab", true).unwrap();
        assert_eq!(render(&filter), "UPPER(SUBSTRING(Code, 3, 2)) = 'AB'");
    }

    #[test]
    fn test_aggregate_rejected_in_row_filter() {
        let sum = Expression::aggregate(AggregateKind::Sum, Some(Expression::column("Qty").unwrap())).unwrap();
        let filter = Filter::compare_expressions(sum, CompareKind::GreaterThan, Expression::constant(5i64)).unwrap();
        let mut buffer = SqlBuffer::new(&DefaultFormatter);
        assert!(matches!(
            buffer.format_filter(&filter),
            Err(crate::Error::UnsupportedByDialect { .. })
        ));
    }

    #[test]
    fn test_binary_literal_unsupported() {
        let mut buffer = SqlBuffer::new(&DefaultFormatter);
        let err = buffer.format_value(&Value::Bytea(vec![1])).unwrap_err();
        assert!(matches!(err, crate::Error::UnsupportedByDialect { .. }));
    }
}
