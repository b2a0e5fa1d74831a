//! String filters: exact value, prefix and substring at a fixed offset

use super::{Degeneration, Filter, Predicate};
use crate::error::{Error, Result};
use crate::expression::Expression;
use quarry_value::{ColumnType, NamedValues, Value};
use serde::{Deserialize, Serialize};

fn text(value: Value) -> Result<Option<String>> {
    match value.convert_to(ColumnType::String)? {
        Value::Str(s) => Ok(Some(s)),
        _ => Ok(None),
    }
}

/// Case-insensitive matching lowercases the full Unicode range. SQLite's
/// NOCASE and LIKE fold ASCII only, so non-ASCII text can match here and
/// not in a rendered query.
fn same_text(a: &str, b: &str, ignore_case: bool) -> bool {
    if ignore_case {
        a.to_lowercase() == b.to_lowercase()
    } else {
        a == b
    }
}

/// `expression = value` on text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StringValueFilter {
    expression: Expression,
    value: String,
    ignore_case: bool,
}

impl StringValueFilter {
    pub fn new(expression: Expression, value: impl Into<String>, ignore_case: bool) -> Self {
        Self {
            expression,
            value: value.into(),
            ignore_case,
        }
    }

    pub fn expression(&self) -> &Expression {
        &self.expression
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn ignore_case(&self) -> bool {
        self.ignore_case
    }
}

impl Predicate for StringValueFilter {
    fn degeneration(&self) -> Degeneration {
        Degeneration::Unconstrained
    }

    fn test(&self, source: &dyn NamedValues) -> Result<bool> {
        Ok(text(self.expression.evaluate(source)?)?
            .is_some_and(|s| same_text(&s, &self.value, self.ignore_case)))
    }

    fn expressions(&self) -> Vec<&Expression> {
        vec![&self.expression]
    }

    fn with_column_prefix(&self, prefix: &str) -> Self {
        Self {
            expression: self.expression.with_column_prefix(prefix),
            ..self.clone()
        }
    }
}

/// Text begins with `prefix`. An empty prefix matches everything.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StartsWithFilter {
    expression: Expression,
    prefix: String,
    ignore_case: bool,
}

impl StartsWithFilter {
    pub fn new(expression: Expression, prefix: impl Into<String>, ignore_case: bool) -> Self {
        Self {
            expression,
            prefix: prefix.into(),
            ignore_case,
        }
    }

    pub fn expression(&self) -> &Expression {
        &self.expression
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn ignore_case(&self) -> bool {
        self.ignore_case
    }
}

impl Predicate for StartsWithFilter {
    fn degeneration(&self) -> Degeneration {
        if self.prefix.is_empty() {
            Degeneration::AlwaysTrue
        } else {
            Degeneration::Unconstrained
        }
    }

    fn test(&self, source: &dyn NamedValues) -> Result<bool> {
        let Some(s) = text(self.expression.evaluate(source)?)? else {
            return Ok(false);
        };
        let head: String = s.chars().take(self.prefix.chars().count()).collect();
        Ok(same_text(&head, &self.prefix, self.ignore_case))
    }

    fn expressions(&self) -> Vec<&Expression> {
        vec![&self.expression]
    }

    fn with_column_prefix(&self, prefix: &str) -> Self {
        Self {
            expression: self.expression.with_column_prefix(prefix),
            ..self.clone()
        }
    }
}

/// The characters of the text starting at the 0-based `start_index` equal
/// `value`. An empty value matches everything.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubstringFilter {
    expression: Expression,
    start_index: usize,
    value: String,
    ignore_case: bool,
}

impl SubstringFilter {
    pub fn new(
        expression: Expression,
        start_index: i64,
        value: impl Into<String>,
        ignore_case: bool,
    ) -> Result<Self> {
        let start_index = usize::try_from(start_index).map_err(|_| {
            Error::InvalidArgument(format!("Start index cannot be negative: {start_index}"))
        })?;
        Ok(Self {
            expression,
            start_index,
            value: value.into(),
            ignore_case,
        })
    }

    pub fn expression(&self) -> &Expression {
        &self.expression
    }

    pub fn start_index(&self) -> usize {
        self.start_index
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn ignore_case(&self) -> bool {
        self.ignore_case
    }
}

impl Predicate for SubstringFilter {
    fn degeneration(&self) -> Degeneration {
        if self.value.is_empty() {
            Degeneration::AlwaysTrue
        } else {
            Degeneration::Unconstrained
        }
    }

    fn test(&self, source: &dyn NamedValues) -> Result<bool> {
        let Some(s) = text(self.expression.evaluate(source)?)? else {
            return Ok(false);
        };
        let part: String = s
            .chars()
            .skip(self.start_index)
            .take(self.value.chars().count())
            .collect();
        Ok(same_text(&part, &self.value, self.ignore_case))
    }

    fn expressions(&self) -> Vec<&Expression> {
        vec![&self.expression]
    }

    fn with_column_prefix(&self, prefix: &str) -> Self {
        Self {
            expression: self.expression.with_column_prefix(prefix),
            ..self.clone()
        }
    }
}

impl Filter {
    pub fn string_value(column: &str, value: impl Into<String>, ignore_case: bool) -> Result<Filter> {
        Ok(Filter::StringValue(StringValueFilter::new(
            Expression::column(column)?,
            value,
            ignore_case,
        )))
    }

    pub fn starts_with(column: &str, prefix: impl Into<String>, ignore_case: bool) -> Result<Filter> {
        Ok(Filter::StartsWith(StartsWithFilter::new(
            Expression::column(column)?,
            prefix,
            ignore_case,
        )))
    }

    pub fn substring(
        column: &str,
        start_index: i64,
        value: impl Into<String>,
        ignore_case: bool,
    ) -> Result<Filter> {
        Ok(Filter::Substring(SubstringFilter::new(
            Expression::column(column)?,
            start_index,
            value,
            ignore_case,
        )?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quarry_value::named_values;

    #[test]
    fn test_substring_case_sensitivity() {
        let source = named_values([("F1", "aBcDe")]);
        let cases = [
            (2, "cD", false, true),
            (2, "cd", false, false),
            (2, "cd", true, true),
            (1, "Bc", false, true),
            (1, "bc", false, false),
            (1, "bc", true, true),
            (4, "eX", true, false),
            (9, "e", false, false),
        ];
        for (start, value, ignore_case, expected) in cases {
            let filter = Filter::substring("F1", start, value, ignore_case).unwrap();
            assert_eq!(
                filter.test(&source).unwrap(),
                expected,
                "substring({start}, {value:?}, {ignore_case})"
            );
        }
    }

    #[test]
    fn test_substring_rejects_negative_start() {
        assert!(Filter::substring("F1", -1, "x", false).is_err());
        assert!(Filter::substring("F1", 0, "", false).unwrap().is_always_true());
    }

    #[test]
    fn test_starts_with() {
        let source = named_values([("S", "Hello")]);
        assert!(Filter::starts_with("S", "He", false).unwrap().test(&source).unwrap());
        assert!(!Filter::starts_with("S", "he", false).unwrap().test(&source).unwrap());
        assert!(Filter::starts_with("S", "he", true).unwrap().test(&source).unwrap());
        assert!(!Filter::starts_with("S", "Hello!", false).unwrap().test(&source).unwrap());
        assert!(Filter::starts_with("S", "", false).unwrap().is_always_true());
        let null = named_values([("S", Value::Null)]);
        assert!(!Filter::starts_with("S", "H", false).unwrap().test(&null).unwrap());
    }

    #[test]
    fn test_string_value() {
        let source = named_values([("S", "Straße")]);
        // Lowercasing is not full case folding: ß never becomes ss
        assert!(!Filter::string_value("S", "STRASSE", true).unwrap().test(&source).unwrap());
        assert!(Filter::string_value("S", "STRAßE", true).unwrap().test(&source).unwrap());
        assert!(Filter::string_value("S", "straße", true).unwrap().test(&source).unwrap());
        assert!(!Filter::string_value("S", "straße", false).unwrap().test(&source).unwrap());
    }
}
