//! The database collaborator the writer executes statements through

use crate::error::Result;
use quarry_query::{Dialect, Statement};
use quarry_value::Value;

/// A live database connection
///
/// Statements arrive fully rendered for [`dialect`](Self::dialect), with
/// positional parameters. Transactions are flat: the writer never nests
/// `begin_transaction` calls.
pub trait Connection {
    fn dialect(&self) -> Dialect;

    /// Execute a statement, returning the number of affected rows
    fn execute(&mut self, statement: &Statement) -> Result<usize>;

    /// Execute a query returning a single value
    fn query_scalar(&mut self, statement: &Statement) -> Result<Value>;

    fn begin_transaction(&mut self) -> Result<()>;

    fn commit_transaction(&mut self) -> Result<()>;

    fn rollback_transaction(&mut self) -> Result<()>;
}

impl<C: Connection + ?Sized> Connection for &mut C {
    fn dialect(&self) -> Dialect {
        (**self).dialect()
    }

    fn execute(&mut self, statement: &Statement) -> Result<usize> {
        (**self).execute(statement)
    }

    fn query_scalar(&mut self, statement: &Statement) -> Result<Value> {
        (**self).query_scalar(statement)
    }

    fn begin_transaction(&mut self) -> Result<()> {
        (**self).begin_transaction()
    }

    fn commit_transaction(&mut self) -> Result<()> {
        (**self).commit_transaction()
    }

    fn rollback_transaction(&mut self) -> Result<()> {
        (**self).rollback_transaction()
    }
}
