//! Connection, statement-result and row-stream traits

use crate::{ColumnDescriptor, Result, Value};
use async_trait::async_trait;

/// A live, forward-only cursor over a tabular result.
///
/// Drivers hand one of these back from [`Connection::execute`] when a
/// statement produces rows. A stream can be consumed exactly once; after
/// [`RowStream::close`] it must never be read again.
#[async_trait]
pub trait RowStream: Send {
    /// Column descriptors for the result, in result order.
    fn columns(&self) -> &[ColumnDescriptor];

    /// Fetch the next row, or `None` once the stream is exhausted.
    ///
    /// Values come back in column order; SQL NULL is delivered as
    /// [`Value::Null`], never coerced to a type default.
    async fn next_row(&mut self) -> Result<Option<Vec<Value>>>;

    /// Release the cursor and any driver resources behind it.
    async fn close(&mut self) -> Result<()>;
}

/// What a statement execution produced.
pub enum ExecuteOutcome {
    /// A tabular result, delivered as a live cursor.
    Rows(Box<dyn RowStream>),
    /// An update count (no tabular result).
    RowsAffected(u64),
}

impl ExecuteOutcome {
    /// True if the execution produced a tabular result.
    pub fn is_rows(&self) -> bool {
        matches!(self, ExecuteOutcome::Rows(_))
    }
}

impl std::fmt::Debug for ExecuteOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExecuteOutcome::Rows(_) => f.write_str("ExecuteOutcome::Rows(..)"),
            ExecuteOutcome::RowsAffected(n) => write!(f, "ExecuteOutcome::RowsAffected({})", n),
        }
    }
}

/// A database connection
#[async_trait]
pub trait Connection: Send + Sync {
    /// Get the driver name (e.g., "sqlite", "postgresql", "mysql")
    fn driver_name(&self) -> &str;

    /// Execute a statement with positional parameters.
    ///
    /// Returns a live row stream for statements that produce rows, or an
    /// update count for those that do not. All parameter positions used by
    /// the statement must be bound.
    async fn execute(&self, sql: &str, params: &[Value]) -> Result<ExecuteOutcome>;

    /// Begin a transaction
    async fn begin_transaction(&self) -> Result<Box<dyn Transaction>>;

    /// Close the connection
    async fn close(&self) -> Result<()>;

    /// Check if the connection is closed
    fn is_closed(&self) -> bool;
}

/// A database transaction
#[async_trait]
pub trait Transaction: Send + Sync {
    /// Commit the transaction
    async fn commit(self: Box<Self>) -> Result<()>;

    /// Rollback the transaction
    async fn rollback(self: Box<Self>) -> Result<()>;

    /// Execute a statement within the transaction
    async fn execute(&self, sql: &str, params: &[Value]) -> Result<ExecuteOutcome>;
}

impl std::fmt::Debug for dyn Transaction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Transaction(..)")
    }
}
