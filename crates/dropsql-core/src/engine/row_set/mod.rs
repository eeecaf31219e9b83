//! Lazy, restartable row sets.
//!
//! Row sets compose by ownership: an operator owns its boxed inputs and
//! borrows the expressions and arguments it evaluates. Every call to
//! [`RowSet::iter`] starts a fresh traversal. A traversal ends right after
//! the first error it yields.

mod empty;
mod filtered;
mod join;
mod mock;
mod projection;
mod rename;
mod table;

use std::sync::Arc;

use crate::error::Result;

use super::{Column, Row};

pub use empty::EmptyRowSet;
pub use filtered::FilteredRowSet;
pub use join::{CrossJoinRowSet, InnerJoinRowSet};
pub use mock::MockRowSet;
pub use projection::{ProjectionRowSet, ResultColumn};
pub use rename::RenameTableRowSet;
pub use table::TableRowSet;

/// A fresh traversal over a row set.
pub type RowIter<'a> = Box<dyn Iterator<Item = Result<Row>> + 'a>;

pub trait RowSet {
    /// The output schema, fixed at construction.
    fn columns(&self) -> Arc<[Column]>;

    /// Start a new traversal.
    fn iter(&self) -> RowIter<'_>;

    /// Drain a traversal, failing on the first error.
    fn collect_rows(&self) -> Result<Vec<Row>> {
        self.iter().collect()
    }
}

impl<R: RowSet + ?Sized> RowSet for Box<R> {
    fn columns(&self) -> Arc<[Column]> {
        (**self).columns()
    }

    fn iter(&self) -> RowIter<'_> {
        (**self).iter()
    }
}

impl<R: RowSet + ?Sized> RowSet for &R {
    fn columns(&self) -> Arc<[Column]> {
        (**self).columns()
    }

    fn iter(&self) -> RowIter<'_> {
        (**self).iter()
    }
}

/// Wrap `iter` so nothing is yielded after its first error.
pub(crate) fn stop_on_error<'a, I>(iter: I) -> RowIter<'a>
where
    I: Iterator<Item = Result<Row>> + 'a,
{
    Box::new(StopOnError {
        inner: iter,
        failed: false,
    })
}

struct StopOnError<I> {
    inner: I,
    failed: bool,
}

impl<I: Iterator<Item = Result<Row>>> Iterator for StopOnError<I> {
    type Item = Result<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        let item = self.inner.next();
        if matches!(item, Some(Err(_))) {
            self.failed = true;
        }
        item
    }
}
