//! SQL Server dialect

use super::{Dialect, LimitStyle, NO_OPTIONS, SqlBuffer, SqlFormatter, hex};
use crate::error::Result;
use crate::expression::{CompareKind, Expression, FunctionKind};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use quarry_value::Value;

const CASE_SENSITIVE_COLLATION: &str = " COLLATE Latin1_General_CS_AS";

#[derive(Debug, Clone, Copy, Default)]
pub struct SqlServerFormatter;

impl SqlServerFormatter {
    fn format_bare_comparison(
        &self,
        buffer: &mut SqlBuffer<'_>,
        kind: CompareKind,
        left: &Expression,
        right: &Expression,
    ) -> Result<()> {
        self.format_expression(buffer, left, &NO_OPTIONS)?;
        buffer.push(' ');
        buffer.push_str(kind.symbol());
        buffer.push(' ');
        self.format_expression(buffer, right, &NO_OPTIONS)
    }
}

impl SqlFormatter for SqlServerFormatter {
    fn dialect(&self) -> Dialect {
        Dialect::SqlServer
    }

    fn format_name(&self, buffer: &mut SqlBuffer<'_>, name: &str) {
        buffer.push('[');
        buffer.push_str(&name.replace(']', "]]"));
        buffer.push(']');
    }

    fn parameter_marker(&self, index: usize) -> Option<String> {
        Some(format!("@P{index}"))
    }

    fn format_string_literal(&self, buffer: &mut SqlBuffer<'_>, s: &str) {
        buffer.push_str("N'");
        buffer.push_str(&s.replace('\'', "''"));
        buffer.push('\'');
    }

    fn format_bool_literal(&self, buffer: &mut SqlBuffer<'_>, b: bool) {
        buffer.push(if b { '1' } else { '0' });
    }

    fn format_date_literal(&self, buffer: &mut SqlBuffer<'_>, date: NaiveDate) {
        buffer.push_str(&date.format("'%Y%m%d'").to_string());
    }

    fn format_time_literal(&self, buffer: &mut SqlBuffer<'_>, time: NaiveTime) {
        buffer.push_str(&time.format("'%H:%M:%S%.3f'").to_string());
    }

    fn format_timestamp_literal(&self, buffer: &mut SqlBuffer<'_>, ts: NaiveDateTime) {
        buffer.push_str(&ts.format("'%Y-%m-%dT%H:%M:%S%.3f'").to_string());
    }

    fn format_binary_literal(&self, buffer: &mut SqlBuffer<'_>, bytes: &[u8]) -> Result<()> {
        buffer.push_str("0x");
        buffer.push_str(&hex(bytes));
        Ok(())
    }

    fn function_name(&self, kind: FunctionKind) -> &'static str {
        match kind {
            FunctionKind::Length => "LEN",
            FunctionKind::Abs => "ABS",
            FunctionKind::Coalesce => "COALESCE",
            FunctionKind::Lower => "LOWER",
            FunctionKind::Upper => "UPPER",
            FunctionKind::Substring => "SUBSTRING",
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

    /// No boolean type: a comparison used as a value becomes 1, 0 or NULL
    fn format_comparison(
        &self,
        buffer: &mut SqlBuffer<'_>,
        kind: CompareKind,
        left: &Expression,
        right: &Expression,
    ) -> Result<()> {
        buffer.push_str("CASE WHEN ");
        self.format_bare_comparison(buffer, kind, left, right)?;
        buffer.push_str(" THEN 1 WHEN NOT (");
        self.format_bare_comparison(buffer, kind, left, right)?;
        buffer.push_str(") THEN 0 END");
        Ok(())
    }

    fn format_condition(&self, buffer: &mut SqlBuffer<'_>, condition: &Expression) -> Result<()> {
        if let Expression::Function(function) = condition
            && let FunctionKind::Compare(kind) = function.kind()
        {
            let args = function.args();
            return self.format_bare_comparison(buffer, kind, &args[0], &args[1]);
        }
        self.format_expression(buffer, condition, &NO_OPTIONS)?;
        buffer.push_str(" = 1");
        Ok(())
    }

    fn escape_like(&self, text: &str) -> String {
        let mut escaped = String::with_capacity(text.len());
        for c in text.chars() {
            match c {
                '%' | '_' | '[' => {
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
            buffer.push_str(CASE_SENSITIVE_COLLATION);
            buffer.push_str(" LIKE ");
            self.format_string_literal(buffer, pattern);
        }
        Ok(())
    }

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
            buffer.push_str(CASE_SENSITIVE_COLLATION);
            buffer.push_str(" = ");
            self.format_value(buffer, &Value::from(value))
        }
    }

    fn limit_style(&self) -> LimitStyle {
        LimitStyle::Top
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::Filter;

    #[test]
    fn test_bracket_escaping_in_patterns() {
        let mut buffer = SqlBuffer::new(&SqlServerFormatter);
        buffer
            .format_filter(&Filter::starts_with("Code", "10%_[a]", false).unwrap())
            .unwrap();
        assert_eq!(
            buffer.sql(),
            "[Code] COLLATE Latin1_General_CS_AS LIKE N'10[%][_][[]a]%'"
        );
    }

    #[test]
    fn test_iif_with_comparison_condition() {
        let condition = Expression::function(
            FunctionKind::Compare(CompareKind::GreaterThan),
            vec![Expression::column("Qty").unwrap(), Expression::constant(10i64)],
        )
        .unwrap();
        let iif = Expression::function(
            FunctionKind::IIf,
            vec![condition, Expression::constant("big"), Expression::constant("small")],
        )
        .unwrap();
        let mut buffer = SqlBuffer::new(&SqlServerFormatter);
        buffer.format_expression(&iif, &Default::default()).unwrap();
        assert_eq!(
            buffer.sql(),
            "CASE WHEN [Qty] > 10 THEN N'big' ELSE N'small' END"
        );
    }

    #[test]
    fn test_comparison_as_value() {
        let cmp = Expression::function(
            FunctionKind::Compare(CompareKind::Equal),
            vec![Expression::column("A").unwrap(), Expression::column("B").unwrap()],
        )
        .unwrap();
        let mut buffer = SqlBuffer::new(&SqlServerFormatter);
        buffer.format_expression(&cmp, &Default::default()).unwrap();
        assert_eq!(
            buffer.sql(),
            "CASE WHEN [A] = [B] THEN 1 WHEN NOT ([A] = [B]) THEN 0 END"
        );
    }
}
