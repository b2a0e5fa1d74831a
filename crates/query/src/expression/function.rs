//! Scalar functions and comparison kinds

use super::Expression;
use crate::error::{Error, Result};
use quarry_value::{ColumnType, Value, evaluator};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Comparison operator shared by comparison functions and compare filters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CompareKind {
    Equal,
    NotEqual,
    LessThan,
    LessOrEqualThan,
    GreaterThan,
    GreaterOrEqualThan,
}

impl CompareKind {
    pub fn symbol(self) -> &'static str {
        match self {
            CompareKind::Equal => "=",
            CompareKind::NotEqual => "<>",
            CompareKind::LessThan => "<",
            CompareKind::LessOrEqualThan => "<=",
            CompareKind::GreaterThan => ">",
            CompareKind::GreaterOrEqualThan => ">=",
        }
    }

    /// Whether an ordering of left against right satisfies the comparison
    pub fn matches(self, ord: Ordering) -> bool {
        match self {
            CompareKind::Equal => ord == Ordering::Equal,
            CompareKind::NotEqual => ord != Ordering::Equal,
            CompareKind::LessThan => ord == Ordering::Less,
            CompareKind::LessOrEqualThan => ord != Ordering::Greater,
            CompareKind::GreaterThan => ord == Ordering::Greater,
            CompareKind::GreaterOrEqualThan => ord != Ordering::Less,
        }
    }

    /// The comparison that holds exactly when this one does not
    pub fn inverse(self) -> Self {
        match self {
            CompareKind::Equal => CompareKind::NotEqual,
            CompareKind::NotEqual => CompareKind::Equal,
            CompareKind::LessThan => CompareKind::GreaterOrEqualThan,
            CompareKind::LessOrEqualThan => CompareKind::GreaterThan,
            CompareKind::GreaterThan => CompareKind::LessOrEqualThan,
            CompareKind::GreaterOrEqualThan => CompareKind::LessThan,
        }
    }

    /// Three-valued comparison of two values: `None` when either is null
    pub fn compare(self, left: &Value, right: &Value) -> Result<Option<bool>> {
        Ok(evaluator::compare(left, right)?.map(|ord| self.matches(ord)))
    }
}

impl fmt::Display for CompareKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Kind of a scalar function node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FunctionKind {
    Add,
    Subtract,
    Multiply,
    Divide,
    Neg,
    Abs,
    Coalesce,
    IIf,
    Length,
    Lower,
    Upper,
    Substring,
    Compare(CompareKind),
}

impl FunctionKind {
    /// Inclusive `(min, max)` argument count; `None` means unbounded
    pub fn arity(self) -> (usize, Option<usize>) {
        match self {
            FunctionKind::Add
            | FunctionKind::Subtract
            | FunctionKind::Multiply
            | FunctionKind::Divide
            | FunctionKind::Compare(_) => (2, Some(2)),
            FunctionKind::Neg
            | FunctionKind::Abs
            | FunctionKind::Length
            | FunctionKind::Lower
            | FunctionKind::Upper => (1, Some(1)),
            FunctionKind::Coalesce => (2, None),
            FunctionKind::IIf | FunctionKind::Substring => (3, Some(3)),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            FunctionKind::Add => "Add",
            FunctionKind::Subtract => "Subtract",
            FunctionKind::Multiply => "Multiply",
            FunctionKind::Divide => "Divide",
            FunctionKind::Neg => "Neg",
            FunctionKind::Abs => "Abs",
            FunctionKind::Coalesce => "Coalesce",
            FunctionKind::IIf => "IIf",
            FunctionKind::Length => "Length",
            FunctionKind::Lower => "Lower",
            FunctionKind::Upper => "Upper",
            FunctionKind::Substring => "Substring",
            FunctionKind::Compare(CompareKind::Equal) => "Equal",
            FunctionKind::Compare(CompareKind::NotEqual) => "NotEqual",
            FunctionKind::Compare(CompareKind::LessThan) => "LessThan",
            FunctionKind::Compare(CompareKind::LessOrEqualThan) => "LessOrEqualThan",
            FunctionKind::Compare(CompareKind::GreaterThan) => "GreaterThan",
            FunctionKind::Compare(CompareKind::GreaterOrEqualThan) => "GreaterOrEqualThan",
        }
    }

    /// Binary infix operator symbol for arithmetic kinds
    pub fn operator_symbol(self) -> Option<&'static str> {
        match self {
            FunctionKind::Add => Some("+"),
            FunctionKind::Subtract => Some("-"),
            FunctionKind::Multiply => Some("*"),
            FunctionKind::Divide => Some("/"),
            FunctionKind::Compare(kind) => Some(kind.symbol()),
            _ => None,
        }
    }

    fn check_arity(self, found: usize) -> Result<()> {
        let (min, max) = self.arity();
        if found < min || max.is_some_and(|max| found > max) {
            return Err(Error::ArgumentCount {
                function: self.name().to_string(),
                min,
                max,
                found,
            });
        }
        Ok(())
    }
}

impl fmt::Display for FunctionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Function node: a kind and its argument expressions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "FunctionParts")]
pub struct FunctionExpr {
    kind: FunctionKind,
    args: Vec<Expression>,
}

/// Decoded form, arity-checked through [`FunctionExpr::new`]
#[derive(Deserialize)]
struct FunctionParts {
    kind: FunctionKind,
    args: Vec<Expression>,
}

impl TryFrom<FunctionParts> for FunctionExpr {
    type Error = Error;

    fn try_from(parts: FunctionParts) -> Result<Self> {
        FunctionExpr::new(parts.kind, parts.args)
    }
}

impl FunctionExpr {
    pub fn new(kind: FunctionKind, args: Vec<Expression>) -> Result<Self> {
        kind.check_arity(args.len())?;
        Ok(Self { kind, args })
    }

    pub fn kind(&self) -> FunctionKind {
        self.kind
    }

    pub fn args(&self) -> &[Expression] {
        &self.args
    }

    pub(crate) fn map_args(&self, f: impl Fn(&Expression) -> Expression) -> Self {
        Self {
            kind: self.kind,
            args: self.args.iter().map(f).collect(),
        }
    }

    /// Type of the value the function produces, as far as it is known
    pub fn result_type(&self) -> ColumnType {
        match self.kind {
            FunctionKind::Length => ColumnType::Int,
            FunctionKind::Lower | FunctionKind::Upper | FunctionKind::Substring => {
                ColumnType::String
            }
            FunctionKind::Compare(_) => ColumnType::Boolean,
            FunctionKind::IIf => first_known(&self.args[1..]),
            _ => first_known(&self.args),
        }
    }

    /// Apply the function, evaluating arguments through `eval`. Arguments of
    /// `Coalesce` and the branches of `IIf` are evaluated lazily.
    pub(crate) fn apply(
        &self,
        eval: &mut dyn FnMut(&Expression) -> Result<Value>,
    ) -> Result<Value> {
        let args = &self.args;
        match self.kind {
            FunctionKind::Add => Ok(evaluator::add(&eval(&args[0])?, &eval(&args[1])?)?),
            FunctionKind::Subtract => {
                Ok(evaluator::subtract(&eval(&args[0])?, &eval(&args[1])?)?)
            }
            FunctionKind::Multiply => {
                Ok(evaluator::multiply(&eval(&args[0])?, &eval(&args[1])?)?)
            }
            FunctionKind::Divide => Ok(evaluator::divide(&eval(&args[0])?, &eval(&args[1])?)?),
            FunctionKind::Neg => Ok(evaluator::negate(&eval(&args[0])?)?),
            FunctionKind::Abs => Ok(evaluator::abs(&eval(&args[0])?)?),
            FunctionKind::Coalesce => {
                for arg in args {
                    let value = eval(arg)?;
                    if !value.is_null() {
                        return Ok(value);
                    }
                }
                Ok(Value::Null)
            }
            FunctionKind::IIf => {
                let branch = if truthy(&eval(&args[0])?)? {
                    &args[1]
                } else {
                    &args[2]
                };
                eval(branch)
            }
            FunctionKind::Length => Ok(match text(eval(&args[0])?)? {
                Some(s) => Value::I32(s.chars().count() as i32),
                None => Value::Null,
            }),
            FunctionKind::Lower => Ok(text(eval(&args[0])?)?
                .map(|s| Value::Str(s.to_lowercase()))
                .unwrap_or(Value::Null)),
            FunctionKind::Upper => Ok(text(eval(&args[0])?)?
                .map(|s| Value::Str(s.to_uppercase()))
                .unwrap_or(Value::Null)),
            FunctionKind::Substring => {
                let source = text(eval(&args[0])?)?;
                let start = eval(&args[1])?;
                let length = eval(&args[2])?;
                match (source, integer(&start)?, integer(&length)?) {
                    (Some(s), Some(start), Some(length)) => {
                        Ok(Value::Str(substring(&s, start, length)?))
                    }
                    _ => Ok(Value::Null),
                }
            }
            FunctionKind::Compare(kind) => {
                let left = eval(&args[0])?;
                let right = eval(&args[1])?;
                Ok(kind
                    .compare(&left, &right)?
                    .map(Value::Bool)
                    .unwrap_or(Value::Null))
            }
        }
    }
}

fn first_known(args: &[Expression]) -> ColumnType {
    args.iter()
        .map(Expression::result_type)
        .find(|t| *t != ColumnType::Unknown)
        .unwrap_or_default()
}

/// Null counts as false
fn truthy(value: &Value) -> Result<bool> {
    match value {
        Value::Null => Ok(false),
        Value::Bool(b) => Ok(*b),
        other => Ok(other.convert_to(ColumnType::Boolean)?.as_bool().unwrap_or(false)),
    }
}

fn text(value: Value) -> Result<Option<String>> {
    match value {
        Value::Null => Ok(None),
        Value::Str(s) => Ok(Some(s)),
        other => match other.convert_to(ColumnType::String)? {
            Value::Str(s) => Ok(Some(s)),
            _ => Ok(None),
        },
    }
}

fn integer(value: &Value) -> Result<Option<i64>> {
    if value.is_null() {
        return Ok(None);
    }
    Ok(value.convert_to(ColumnType::Int)?.as_i64())
}

/// SQL `SUBSTRING` over characters with a 1-based `start`. The requested
/// window is clipped to the string, so it never fails for long lengths.
pub(crate) fn substring(s: &str, start: i64, length: i64) -> Result<String> {
    if length < 0 {
        return Err(Error::InvalidArgument(format!(
            "Substring length cannot be negative: {length}"
        )));
    }
    let count = s.chars().count() as i64;
    let offset = start.saturating_sub(1);
    let begin = offset.max(0);
    let end = offset.saturating_add(length).min(count);
    if end <= begin {
        return Ok(String::new());
    }
    Ok(s.chars()
        .skip(begin as usize)
        .take((end - begin) as usize)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arity_table() {
        assert_eq!(FunctionKind::Substring.arity(), (3, Some(3)));
        assert_eq!(FunctionKind::Coalesce.arity(), (2, None));
        assert!(FunctionExpr::new(FunctionKind::Coalesce, vec![Expression::constant(1)]).is_err());
        let err = FunctionExpr::new(FunctionKind::Neg, vec![]).unwrap_err();
        assert_eq!(
            err,
            Error::ArgumentCount {
                function: "Neg".into(),
                min: 1,
                max: Some(1),
                found: 0
            }
        );
    }

    #[test]
    fn test_substring_clips() {
        assert_eq!(substring("abcde", 2, 3).unwrap(), "bcd");
        assert_eq!(substring("abcde", 4, 10).unwrap(), "de");
        assert_eq!(substring("abcde", 9, 2).unwrap(), "");
        assert_eq!(substring("abcde", 0, 2).unwrap(), "a");
        assert!(substring("abcde", 1, -1).is_err());
    }

    #[test]
    fn test_substring_extreme_starts() {
        assert_eq!(substring("abc", i64::MIN, 1).unwrap(), "");
        assert_eq!(substring("abc", i64::MIN, i64::MAX).unwrap(), "");
        assert_eq!(substring("abc", i64::MAX, 1).unwrap(), "");
        assert_eq!(substring("abc", 1, i64::MAX).unwrap(), "abc");

        let expression = Expression::function(
            FunctionKind::Substring,
            vec![
                Expression::constant("abc"),
                Expression::constant(i64::MIN),
                Expression::constant(1i64),
            ],
        )
        .unwrap();
        let empty: std::collections::HashMap<String, Value> = Default::default();
        assert_eq!(expression.evaluate(&empty).unwrap(), Value::Str(String::new()));
    }

    #[test]
    fn test_decoding_checks_arity() {
        let unchecked = Expression::Function(FunctionExpr {
            kind: FunctionKind::Neg,
            args: vec![],
        });
        let bytes = unchecked.to_bytes().unwrap();
        assert!(matches!(Expression::from_bytes(&bytes), Err(Error::Serialization(_))));

        let valid = Expression::function(FunctionKind::Neg, vec![Expression::constant(2)]).unwrap();
        assert_eq!(Expression::from_bytes(&valid.to_bytes().unwrap()).unwrap(), valid);
    }

    #[test]
    fn test_compare_kind_inverse() {
        for kind in [
            CompareKind::Equal,
            CompareKind::NotEqual,
            CompareKind::LessThan,
            CompareKind::LessOrEqualThan,
            CompareKind::GreaterThan,
            CompareKind::GreaterOrEqualThan,
        ] {
            for ord in [Ordering::Less, Ordering::Equal, Ordering::Greater] {
                assert_ne!(kind.matches(ord), kind.inverse().matches(ord));
            }
        }
    }
}
