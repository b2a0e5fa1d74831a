//! Common test utilities for query integration tests
#![allow(dead_code)]

use chrono::NaiveDate;
use quarry_query::{Dialect, Filter, Statement};
use quarry_value::{DataTable, Value};

/// Products table used across filter tests
///
/// | Id | Name       | Price | Added      | ValidFrom  | ValidTo    |
/// |----|------------|-------|------------|------------|------------|
/// | 1  | Apple      | 1.5   | 2024-01-10 | 2024-01-01 | 2024-06-30 |
/// | 2  | apricot    | 3     | 2024-02-01 | 2024-03-01 | NULL       |
/// | 3  | Banana     | NULL  | 2024-02-29 | NULL       | 2024-02-01 |
/// | 4  | 50% off    | 10    | NULL       | NULL       | NULL       |
/// | 5  | NULL       | 7     | 2024-03-15 | 2024-01-01 | 2024-12-31 |
pub fn products() -> DataTable {
    let mut table = DataTable::new(["Id", "Name", "Price", "Added", "ValidFrom", "ValidTo"]).unwrap();
    let rows: Vec<(i64, Option<&str>, Option<f64>, Option<NaiveDate>, Option<NaiveDate>, Option<NaiveDate>)> = vec![
        (1, Some("Apple"), Some(1.5), date(2024, 1, 10), date(2024, 1, 1), date(2024, 6, 30)),
        (2, Some("apricot"), Some(3.0), date(2024, 2, 1), date(2024, 3, 1), None),
        (3, Some("Banana"), None, date(2024, 2, 29), None, date(2024, 2, 1)),
        (4, Some("50% off"), Some(10.0), None, None, None),
        (5, None, Some(7.0), date(2024, 3, 15), date(2024, 1, 1), date(2024, 12, 31)),
    ];
    for (id, name, price, added, from, to) in rows {
        table
            .add_row(vec![
                Value::I64(id),
                name.map_or(Value::Null, Value::from),
                price.map_or(Value::Null, Value::F64),
                added.map_or(Value::Null, Value::Date),
                from.map_or(Value::Null, Value::Date),
                to.map_or(Value::Null, Value::Date),
            ])
            .unwrap();
    }
    table
}

pub fn date(y: i32, m: u32, d: u32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(y, m, d)
}

/// Ids of the rows of `table` matching `filter`
pub fn matching_ids(table: &DataTable, filter: &Filter) -> Vec<i64> {
    table
        .rows()
        .filter(|row| filter.test(row).unwrap())
        .map(|row| row.values()[0].as_i64().unwrap())
        .collect()
}

/// Render a filter for `dialect` with inlined values
pub fn render(dialect: Dialect, filter: &Filter) -> String {
    Statement::filter(dialect, filter, false).unwrap().sql
}

/// Render a filter for `dialect` collecting parameters
pub fn render_params(dialect: Dialect, filter: &Filter) -> Statement {
    Statement::filter(dialect, filter, true).unwrap()
}
