use std::sync::Arc;

use super::{RowIter, RowSet, stop_on_error};
use crate::engine::{Column, Context, Expression};
use crate::types::Scalar;

/// Rows of `inner` for which the predicate is truthy, ids preserved.
pub struct FilteredRowSet<'a> {
    inner: Box<dyn RowSet + 'a>,
    predicate: &'a dyn Expression,
    args: &'a [Scalar],
}

impl<'a> FilteredRowSet<'a> {
    pub fn new(
        inner: Box<dyn RowSet + 'a>,
        predicate: &'a dyn Expression,
        args: &'a [Scalar],
    ) -> Self {
        Self {
            inner,
            predicate,
            args,
        }
    }
}

impl RowSet for FilteredRowSet<'_> {
    fn columns(&self) -> Arc<[Column]> {
        self.inner.columns()
    }

    fn iter(&self) -> RowIter<'_> {
        let rows = self.inner.iter().filter_map(move |row| {
            let row = match row {
                Ok(row) => row,
                Err(e) => return Some(Err(e)),
            };
            match self.predicate.evaluate(&Context::new(&row, self.args)) {
                Ok(verdict) if verdict.is_truthy() => Some(Ok(row)),
                Ok(_) => None,
                Err(e) => Some(Err(e)),
            }
        });
        stop_on_error(rows)
    }
}
