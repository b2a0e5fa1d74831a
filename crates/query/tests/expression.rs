//! Expression trees: canonical text, evaluation over tables and transport

mod common;

use common::products;
use quarry_query::{AggregateKind, CompareKind, Expression, FunctionKind};
use quarry_value::{ColumnType, Value};

fn col(name: &str) -> Expression {
    Expression::column(name).unwrap()
}

fn call(kind: FunctionKind, args: Vec<Expression>) -> Expression {
    Expression::function(kind, args).unwrap()
}

#[test]
fn test_canonical_text() {
    let sum = call(FunctionKind::Add, vec![col("Price"), Expression::constant(1i64)]);
    assert_eq!(sum.to_string(), "(Price + 1)");

    let big = call(
        FunctionKind::IIf,
        vec![
            call(FunctionKind::Compare(CompareKind::GreaterThan), vec![col("Qty"), Expression::constant(10i64)]),
            Expression::constant("big"),
            Expression::constant("small"),
        ],
    );
    assert_eq!(big.to_string(), "IIF((Qty > 10), 'big', 'small')");

    let fallback = call(FunctionKind::Coalesce, vec![col("A"), col("B"), Expression::constant(0i64)]);
    assert_eq!(fallback.to_string(), "ISNULL(A, ISNULL(B, 0))");

    assert_eq!(call(FunctionKind::Length, vec![col("Name")]).to_string(), "LEN(Name)");
    assert_eq!(call(FunctionKind::Neg, vec![col("Price")]).to_string(), "(-Price)");
    assert_eq!(Expression::count_all().to_string(), "COUNT(*)");
}

#[test]
fn test_evaluate_over_table_rows() {
    let table = products();
    let label = call(
        FunctionKind::Coalesce,
        vec![
            call(FunctionKind::Upper, vec![col("Name")]),
            Expression::constant("?"),
        ],
    );
    let labels: Vec<Value> = table.rows().map(|row| label.evaluate(&row).unwrap()).collect();
    assert_eq!(
        labels,
        vec![
            Value::from("APPLE"),
            Value::from("APRICOT"),
            Value::from("BANANA"),
            Value::from("50% OFF"),
            Value::from("?"),
        ]
    );
}

#[test]
fn test_aggregates_over_table() {
    let table = products();
    let rows: Vec<_> = table.rows().collect();

    let count = Expression::aggregate(AggregateKind::Count, Some(col("Price"))).unwrap();
    assert_eq!(count.evaluate_aggregate(&rows).unwrap(), Value::I64(4));
    assert_eq!(Expression::count_all().evaluate_aggregate(&rows).unwrap(), Value::I64(5));

    let max = Expression::aggregate(AggregateKind::Max, Some(col("Price"))).unwrap();
    assert_eq!(max.evaluate_aggregate(&rows).unwrap(), Value::F64(10.0));

    let total = Expression::aggregate(AggregateKind::Sum, Some(col("Id"))).unwrap();
    assert_eq!(total.evaluate_aggregate(&rows).unwrap(), Value::I64(15));
}

#[test]
fn test_typed_constant_converts() {
    let constant = Expression::typed_constant("42", ColumnType::Int).unwrap();
    assert_eq!(constant.constant_value(), Some(&Value::I64(42)));
    assert_eq!(constant.result_type(), ColumnType::Int);
    assert!(Expression::typed_constant("abc", ColumnType::Int).is_err());
}

#[test]
fn test_bytes_round_trip_preserves_text() {
    let expression = call(
        FunctionKind::Substring,
        vec![col("Name"), Expression::constant(2i64), Expression::constant(3i64)],
    );
    let decoded = Expression::from_bytes(&expression.to_bytes().unwrap()).unwrap();
    assert_eq!(decoded, expression);
    assert_eq!(decoded.to_string(), "SUBSTRING(Name, 2, 3)");
}
