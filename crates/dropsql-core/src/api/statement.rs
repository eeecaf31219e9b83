use crate::engine::RowSet;
use crate::error::Result;
use crate::types::Scalar;

use super::DBFile;

/// Outcome of executing a statement.
pub enum ExecutionResult<'a> {
    /// A lazy result set borrowing the database.
    RowSet(Box<dyn RowSet + 'a>),
    /// Number of records inserted, updated or deleted.
    Affected(usize),
    Done,
}

impl std::fmt::Debug for ExecutionResult<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExecutionResult::RowSet(rows) => f
                .debug_tuple("RowSet")
                .field(&rows.columns())
                .finish(),
            ExecutionResult::Affected(n) => f.debug_tuple("Affected").field(n).finish(),
            ExecutionResult::Done => f.write_str("Done"),
        }
    }
}

/// A statement that can run against a database with positional arguments.
pub trait Statement {
    fn execute<'a>(&'a self, db: &'a DBFile, args: &'a [Scalar]) -> Result<ExecutionResult<'a>>;
}
