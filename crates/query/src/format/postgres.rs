//! PostgreSQL dialect

use super::{Dialect, NO_OPTIONS, SqlBuffer, SqlFormatter, hex};
use crate::error::Result;
use crate::expression::{Expression, FunctionExpr, FunctionKind};
use quarry_value::Value;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Default)]
pub struct PostgresFormatter;

impl SqlFormatter for PostgresFormatter {
    fn dialect(&self) -> Dialect {
        Dialect::Postgres
    }

    fn parameter_marker(&self, index: usize) -> Option<String> {
        Some(format!("${index}"))
    }

    fn format_guid_literal(&self, buffer: &mut SqlBuffer<'_>, guid: Uuid) {
        self.format_string_literal(buffer, &guid.hyphenated().to_string());
        buffer.push_str("::uuid");
    }

    fn format_binary_literal(&self, buffer: &mut SqlBuffer<'_>, bytes: &[u8]) -> Result<()> {
        buffer.push_str("'\\x");
        buffer.push_str(&hex(bytes));
        buffer.push_str("'::bytea");
        Ok(())
    }

    /// `SUBSTRING(s FROM start FOR length)`
    fn format_function(&self, buffer: &mut SqlBuffer<'_>, function: &FunctionExpr) -> Result<()> {
        if function.kind() != FunctionKind::Substring {
            return super::format_function_default(self, buffer, function);
        }
        let args = function.args();
        buffer.push_str("SUBSTRING(");
        self.format_expression(buffer, &args[0], &NO_OPTIONS)?;
        buffer.push_str(" FROM ");
        self.format_expression(buffer, &args[1], &NO_OPTIONS)?;
        buffer.push_str(" FOR ");
        self.format_expression(buffer, &args[2], &NO_OPTIONS)?;
        buffer.push(')');
        Ok(())
    }

    fn format_like(
        &self,
        buffer: &mut SqlBuffer<'_>,
        expression: &Expression,
        pattern: &str,
        ignore_case: bool,
    ) -> Result<()> {
        self.format_expression(buffer, expression, &NO_OPTIONS)?;
        buffer.push_str(if ignore_case { " ILIKE " } else { " LIKE " });
        self.format_string_literal(buffer, pattern);
        buffer.push_str(self.like_escape_clause());
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
            buffer.push_str("LOWER(");
            self.format_expression(buffer, expression, &NO_OPTIONS)?;
            buffer.push_str(") = ");
            self.format_value(buffer, &Value::Str(value.to_lowercase()))
        } else {
            self.format_expression(buffer, expression, &NO_OPTIONS)?;
            buffer.push_str(" = ");
            self.format_value(buffer, &Value::from(value))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::Filter;

    #[test]
    fn test_ilike_for_ignore_case() {
        let mut buffer = SqlBuffer::new(&PostgresFormatter);
        buffer
            .format_filter(&Filter::starts_with("Name", "Ab", true).unwrap())
            .unwrap();
        assert_eq!(buffer.sql(), "\"Name\" ILIKE 'Ab%' ESCAPE '\\'");
    }

    #[test]
    fn test_substring_syntax() {
        let expr = Expression::function(
            FunctionKind::Substring,
            vec![
                Expression::column("Name").unwrap(),
                Expression::constant(2i64),
                Expression::constant(3i64),
            ],
        )
        .unwrap();
        let mut buffer = SqlBuffer::with_parameters(&PostgresFormatter);
        buffer.format_expression(&expr, &Default::default()).unwrap();
        assert_eq!(buffer.sql(), "SUBSTRING(\"Name\" FROM $1 FOR $2)");
    }

    #[test]
    fn test_binary_and_guid_literals() {
        let mut buffer = SqlBuffer::new(&PostgresFormatter);
        buffer.format_value(&Value::Bytea(vec![0xde, 0xad])).unwrap();
        buffer.push(' ');
        buffer.format_value(&Value::Uuid(Uuid::nil())).unwrap();
        assert_eq!(
            buffer.sql(),
            "'\\xdead'::bytea '00000000-0000-0000-0000-000000000000'::uuid"
        );
    }
}
