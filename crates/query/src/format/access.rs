//! Access (Jet) dialect
//!
//! Jet compares text case-insensitively, so case-sensitive tests go
//! through `StrComp(..., 0)`. Patterns use `*` and `?` wildcards.

use super::{Dialect, LimitStyle, NO_OPTIONS, SqlBuffer, SqlFormatter};
use crate::error::Result;
use crate::expression::{Expression, FunctionKind};
use crate::filter::{StartsWithFilter, SubstringFilter};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use quarry_value::Value;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Default)]
pub struct AccessFormatter;

impl AccessFormatter {
    /// `StrComp(text, 'value', 0) = 0`, where `text` renders the compared text
    fn format_binary_compare(
        &self,
        buffer: &mut SqlBuffer<'_>,
        value: &str,
        text: impl FnOnce(&mut SqlBuffer<'_>) -> Result<()>,
    ) -> Result<()> {
        buffer.push_str("StrComp(");
        text(buffer)?;
        buffer.push_str(", ");
        self.format_value(buffer, &Value::from(value))?;
        buffer.push_str(", 0) = 0");
        Ok(())
    }
}

impl SqlFormatter for AccessFormatter {
    fn dialect(&self) -> Dialect {
        Dialect::Access
    }

    fn format_name(&self, buffer: &mut SqlBuffer<'_>, name: &str) {
        buffer.push('[');
        buffer.push_str(&name.replace(']', "]]"));
        buffer.push(']');
    }

    fn parameter_marker(&self, _index: usize) -> Option<String> {
        Some("?".to_string())
    }

    fn format_date_literal(&self, buffer: &mut SqlBuffer<'_>, date: NaiveDate) {
        buffer.push_str(&date.format("#%m/%d/%Y#").to_string());
    }

    fn format_time_literal(&self, buffer: &mut SqlBuffer<'_>, time: NaiveTime) {
        buffer.push_str(&time.format("#%H:%M:%S#").to_string());
    }

    fn format_timestamp_literal(&self, buffer: &mut SqlBuffer<'_>, ts: NaiveDateTime) {
        buffer.push_str(&ts.format("#%m/%d/%Y %H:%M:%S#").to_string());
    }

    fn format_guid_literal(&self, buffer: &mut SqlBuffer<'_>, guid: Uuid) {
        buffer.push_str(&format!("{{guid {{{}}}}}", guid.hyphenated()));
    }

    fn format_binary_literal(&self, _buffer: &mut SqlBuffer<'_>, _bytes: &[u8]) -> Result<()> {
        Err(self.unsupported("binary literals"))
    }

    fn function_name(&self, kind: FunctionKind) -> &'static str {
        match kind {
            FunctionKind::Abs => "ABS",
            FunctionKind::Length => "LEN",
            FunctionKind::Lower => "LCASE",
            FunctionKind::Upper => "UCASE",
            FunctionKind::Substring => "MID",
            other => other.name(),
        }
    }

    fn format_null_as_default(
        &self,
        buffer: &mut SqlBuffer<'_>,
        expression: &Expression,
        default: &Value,
    ) -> Result<()> {
        buffer.push_str("IIF(");
        self.format_expression(buffer, expression, &NO_OPTIONS)?;
        buffer.push_str(" IS NULL, ");
        self.format_value(buffer, default)?;
        buffer.push_str(", ");
        self.format_expression(buffer, expression, &NO_OPTIONS)?;
        buffer.push(')');
        Ok(())
    }

    /// `IIF(a IS NULL, IIF(b IS NULL, c, b), a)`
    fn format_coalesce(&self, buffer: &mut SqlBuffer<'_>, args: &[Expression]) -> Result<()> {
        match args {
            [] => {
                buffer.push_str("NULL");
                Ok(())
            }
            [last] => self.format_expression(buffer, last, &NO_OPTIONS),
            [first, rest @ ..] => {
                buffer.push_str("IIF(");
                self.format_expression(buffer, first, &NO_OPTIONS)?;
                buffer.push_str(" IS NULL, ");
                self.format_coalesce(buffer, rest)?;
                buffer.push_str(", ");
                self.format_expression(buffer, first, &NO_OPTIONS)?;
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

    fn like_one(&self) -> &'static str {
        "?"
    }

    fn escape_like(&self, text: &str) -> String {
        let mut escaped = String::with_capacity(text.len());
        for c in text.chars() {
            match c {
                '*' | '?' | '#' | '[' => {
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

    fn format_text_equals(
        &self,
        buffer: &mut SqlBuffer<'_>,
        expression: &Expression,
        value: &str,
        ignore_case: bool,
    ) -> Result<()> {
        if ignore_case {
            self.format_expression(buffer, expression, &NO_OPTIONS)?;
            buffer.push_str(" = ");
            return self.format_value(buffer, &Value::from(value));
        }
        self.format_binary_compare(buffer, value, |buffer| {
            self.format_expression(buffer, expression, &NO_OPTIONS)
        })
    }

    fn format_starts_with_filter(&self, buffer: &mut SqlBuffer<'_>, filter: &StartsWithFilter) -> Result<()> {
        if filter.ignore_case() {
            self.format_expression(buffer, filter.expression(), &NO_OPTIONS)?;
            buffer.push_str(" LIKE ");
            self.format_string_literal(buffer, &format!("{}*", self.escape_like(filter.prefix())));
            return Ok(());
        }
        let length = filter.prefix().chars().count();
        self.format_binary_compare(buffer, filter.prefix(), |buffer| {
            buffer.push_str("LEFT(");
            self.format_expression(buffer, filter.expression(), &NO_OPTIONS)?;
            buffer.push_str(&format!(", {length})"));
            Ok(())
        })
    }

    fn format_substring_filter(&self, buffer: &mut SqlBuffer<'_>, filter: &SubstringFilter) -> Result<()> {
        if filter.ignore_case() {
            let pattern = format!(
                "{}{}*",
                "?".repeat(filter.start_index()),
                self.escape_like(filter.value())
            );
            self.format_expression(buffer, filter.expression(), &NO_OPTIONS)?;
            buffer.push_str(" LIKE ");
            self.format_string_literal(buffer, &pattern);
            return Ok(());
        }
        let start = filter.start_index() + 1;
        let length = filter.value().chars().count();
        self.format_binary_compare(buffer, filter.value(), |buffer| {
            buffer.push_str("MID(");
            self.format_expression(buffer, filter.expression(), &NO_OPTIONS)?;
            buffer.push_str(&format!(", {start}, {length})"));
            Ok(())
        })
    }

    fn limit_style(&self) -> LimitStyle {
        LimitStyle::Top
    }
}
