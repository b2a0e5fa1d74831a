//! Common test utilities for writer integration tests
#![allow(dead_code)]

use quarry_query::{Dialect, Statement};
use quarry_value::Value;
use quarry_writer::{Connection, Error, Result};
use rusqlite::params_from_iter;
use rusqlite::types::Value as SqlValue;

/// In-memory SQLite database implementing the writer's connection
pub struct SqliteConnection {
    conn: rusqlite::Connection,
    pub commits: usize,
    pub rollbacks: usize,
}

impl SqliteConnection {
    pub fn open() -> Self {
        Self {
            conn: rusqlite::Connection::open_in_memory().unwrap(),
            commits: 0,
            rollbacks: 0,
        }
    }

    /// `People (Id INTEGER PRIMARY KEY, Name TEXT, Score REAL)`
    pub fn with_people() -> Self {
        let db = Self::open();
        db.conn
            .execute_batch("CREATE TABLE People (Id INTEGER PRIMARY KEY, Name TEXT, Score REAL)")
            .unwrap();
        db
    }

    /// Insert `(id, 'seed')` for every id in one transaction
    pub fn seed_people(&self, ids: impl IntoIterator<Item = i64>) {
        self.conn.execute_batch("BEGIN").unwrap();
        for id in ids {
            self.conn
                .execute("INSERT INTO People (Id, Name) VALUES (?1, 'seed')", [id])
                .unwrap();
        }
        self.conn.execute_batch("COMMIT").unwrap();
    }

    pub fn batch(&self, sql: &str) {
        self.conn.execute_batch(sql).unwrap();
    }

    pub fn count(&self, sql: &str) -> i64 {
        self.conn.query_row(sql, [], |row| row.get(0)).unwrap()
    }

    pub fn text(&self, sql: &str) -> Option<String> {
        self.conn.query_row(sql, [], |row| row.get(0)).unwrap()
    }

    pub fn real(&self, sql: &str) -> Option<f64> {
        self.conn.query_row(sql, [], |row| row.get(0)).unwrap()
    }
}

fn to_sql(value: &Value) -> SqlValue {
    match value {
        Value::Null => SqlValue::Null,
        Value::Bool(b) => SqlValue::Integer(i64::from(*b)),
        Value::I32(n) => SqlValue::Integer(i64::from(*n)),
        Value::I64(n) => SqlValue::Integer(*n),
        Value::F64(n) => SqlValue::Real(*n),
        Value::Decimal(d) => SqlValue::Text(d.to_string()),
        Value::Str(s) => SqlValue::Text(s.clone()),
        Value::Date(d) => SqlValue::Text(d.format("%Y-%m-%d").to_string()),
        Value::Time(t) => SqlValue::Text(t.format("%H:%M:%S").to_string()),
        Value::Timestamp(ts) => SqlValue::Text(ts.format("%Y-%m-%d %H:%M:%S").to_string()),
        Value::Uuid(u) => SqlValue::Text(u.to_string()),
        Value::Bytea(b) => SqlValue::Blob(b.clone()),
    }
}

fn from_sql(value: SqlValue) -> Value {
    match value {
        SqlValue::Null => Value::Null,
        SqlValue::Integer(n) => Value::I64(n),
        SqlValue::Real(n) => Value::F64(n),
        SqlValue::Text(s) => Value::Str(s),
        SqlValue::Blob(b) => Value::Bytea(b),
    }
}

fn connection_error(e: rusqlite::Error) -> Error {
    Error::Connection(e.to_string())
}

impl Connection for SqliteConnection {
    fn dialect(&self) -> Dialect {
        Dialect::Sqlite
    }

    fn execute(&mut self, statement: &Statement) -> Result<usize> {
        let params = statement.params.iter().map(to_sql);
        self.conn
            .execute(&statement.sql, params_from_iter(params))
            .map_err(connection_error)
    }

    fn query_scalar(&mut self, statement: &Statement) -> Result<Value> {
        let params = statement.params.iter().map(to_sql);
        self.conn
            .query_row(&statement.sql, params_from_iter(params), |row| row.get::<_, SqlValue>(0))
            .map(from_sql)
            .map_err(connection_error)
    }

    fn begin_transaction(&mut self) -> Result<()> {
        self.conn.execute_batch("BEGIN").map_err(connection_error)
    }

    fn commit_transaction(&mut self) -> Result<()> {
        self.conn.execute_batch("COMMIT").map_err(connection_error)?;
        self.commits += 1;
        Ok(())
    }

    fn rollback_transaction(&mut self) -> Result<()> {
        self.conn.execute_batch("ROLLBACK").map_err(connection_error)?;
        self.rollbacks += 1;
        Ok(())
    }
}
