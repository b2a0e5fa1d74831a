//! SQLite dialect

use super::{Dialect, NO_OPTIONS, SqlBuffer, SqlFormatter};
use crate::error::Result;
use crate::expression::{Expression, FunctionKind};
use crate::filter::{StartsWithFilter, SubstringFilter};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use quarry_value::Value;

#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteFormatter;

impl SqliteFormatter {
    /// `SUBSTR(e, start, len) = 'value'`, byte-exact
    fn format_substr_equals(
        &self,
        buffer: &mut SqlBuffer<'_>,
        expression: &Expression,
        start: usize,
        value: &str,
    ) -> Result<()> {
        buffer.push_str("SUBSTR(");
        self.format_expression(buffer, expression, &NO_OPTIONS)?;
        buffer.push_str(&format!(", {}, {}) = ", start + 1, value.chars().count()));
        self.format_value(buffer, &Value::from(value))
    }

    /// LIKE in SQLite folds ASCII case on its own
    fn format_like_nocase(&self, buffer: &mut SqlBuffer<'_>, expression: &Expression, pattern: &str) -> Result<()> {
        self.format_expression(buffer, expression, &NO_OPTIONS)?;
        buffer.push_str(" LIKE ");
        self.format_string_literal(buffer, pattern);
        buffer.push_str(self.like_escape_clause());
        Ok(())
    }
}

impl SqlFormatter for SqliteFormatter {
    fn dialect(&self) -> Dialect {
        Dialect::Sqlite
    }

    fn parameter_marker(&self, index: usize) -> Option<String> {
        Some(format!("?{index}"))
    }

    fn format_bool_literal(&self, buffer: &mut SqlBuffer<'_>, b: bool) {
        buffer.push(if b { '1' } else { '0' });
    }

    fn format_date_literal(&self, buffer: &mut SqlBuffer<'_>, date: NaiveDate) {
        buffer.push_str(&date.format("'%Y-%m-%d'").to_string());
    }

    fn format_time_literal(&self, buffer: &mut SqlBuffer<'_>, time: NaiveTime) {
        buffer.push_str(&time.format("'%H:%M:%S%.f'").to_string());
    }

    fn format_timestamp_literal(&self, buffer: &mut SqlBuffer<'_>, ts: NaiveDateTime) {
        buffer.push_str(&ts.format("'%Y-%m-%d %H:%M:%S%.f'").to_string());
    }

    fn function_name(&self, kind: FunctionKind) -> &'static str {
        match kind {
            FunctionKind::Substring => "SUBSTR",
            FunctionKind::Abs => "ABS",
            FunctionKind::Coalesce => "COALESCE",
            FunctionKind::Length => "LENGTH",
            FunctionKind::Lower => "LOWER",
            FunctionKind::Upper => "UPPER",
            other => other.name(),
        }
    }

    fn format_text_equals(
        &self,
        buffer: &mut SqlBuffer<'_>,
        expression: &Expression,
        value: &str,
        ignore_case: bool,
    ) -> Result<()> {
        self.format_expression(buffer, expression, &NO_OPTIONS)?;
        buffer.push_str(" = ");
        self.format_value(buffer, &Value::from(value))?;
        if ignore_case {
            buffer.push_str(" COLLATE NOCASE");
        }
        Ok(())
    }

    fn format_starts_with_filter(&self, buffer: &mut SqlBuffer<'_>, filter: &StartsWithFilter) -> Result<()> {
        if filter.ignore_case() {
            let pattern = format!("{}%", self.escape_like(filter.prefix()));
            self.format_like_nocase(buffer, filter.expression(), &pattern)
        } else {
            self.format_substr_equals(buffer, filter.expression(), 0, filter.prefix())
        }
    }

    fn format_substring_filter(&self, buffer: &mut SqlBuffer<'_>, filter: &SubstringFilter) -> Result<()> {
        if filter.ignore_case() {
            let pattern = format!(
                "{}{}%",
                "_".repeat(filter.start_index()),
                self.escape_like(filter.value())
            );
            self.format_like_nocase(buffer, filter.expression(), &pattern)
        } else {
            self.format_substr_equals(buffer, filter.expression(), filter.start_index(), filter.value())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::Filter;

    fn render(filter: &Filter) -> (String, Vec<Value>) {
        let mut buffer = SqlBuffer::with_parameters(&SqliteFormatter);
        buffer.format_filter(filter).unwrap();
        let statement = buffer.into_statement();
        (statement.sql, statement.params)
    }

    #[test]
    fn test_case_sensitive_prefix_uses_substr() {
        let (sql, params) = render(&Filter::starts_with("Code", "A%", false).unwrap());
        assert_eq!(sql, "SUBSTR(\"Code\", 1, 2) = ?1");
        assert_eq!(params, vec![Value::Str("A%".into())]);
    }

    #[test]
    fn test_case_insensitive_prefix_uses_like() {
        let (sql, params) = render(&Filter::starts_with("Code", "a_b", true).unwrap());
        assert_eq!(sql, "\"Code\" LIKE 'a\\_b%' ESCAPE '\\'");
        assert!(params.is_empty());
    }

    #[test]
    fn test_string_equality_nocase() {
        let (sql, _) = render(&Filter::string_value("Name", "bob", true).unwrap());
        assert_eq!(sql, "\"Name\" = ?1 COLLATE NOCASE");
    }
}
