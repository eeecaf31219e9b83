use std::sync::Arc;

use super::{FilteredRowSet, RowIter, RowSet, stop_on_error};
use crate::engine::{Column, Expression, Row};
use crate::error::Result;
use crate::types::Scalar;

/// Every pairing of an lhs row with an rhs row, rhs varying fastest.
///
/// The rhs is re-traversed once per lhs row. Output rows have no id.
pub struct CrossJoinRowSet<'a> {
    lhs: Box<dyn RowSet + 'a>,
    rhs: Box<dyn RowSet + 'a>,
    columns: Arc<[Column]>,
}

impl<'a> CrossJoinRowSet<'a> {
    pub fn new(lhs: Box<dyn RowSet + 'a>, rhs: Box<dyn RowSet + 'a>) -> Self {
        let columns = lhs.columns().iter().chain(rhs.columns().iter()).cloned().collect();
        Self { lhs, rhs, columns }
    }

    fn pairs<'s>(&'s self, left: Result<Row>) -> RowIter<'s> {
        let left = match left {
            Ok(row) => row,
            Err(e) => return Box::new(std::iter::once(Err(e))),
        };
        Box::new(self.rhs.iter().map(move |right| {
            let right = right?;
            let mut values = Vec::with_capacity(self.columns.len());
            values.extend(left.values.iter().cloned());
            values.extend(right.values);
            Ok(Row::new(self.columns.clone(), values, None))
        }))
    }
}

impl RowSet for CrossJoinRowSet<'_> {
    fn columns(&self) -> Arc<[Column]> {
        self.columns.clone()
    }

    fn iter(&self) -> RowIter<'_> {
        stop_on_error(self.lhs.iter().flat_map(move |left| self.pairs(left)))
    }
}

/// A cross join filtered by an `on` predicate.
pub struct InnerJoinRowSet<'a> {
    inner: FilteredRowSet<'a>,
}

impl<'a> InnerJoinRowSet<'a> {
    pub fn new(
        lhs: Box<dyn RowSet + 'a>,
        rhs: Box<dyn RowSet + 'a>,
        on: &'a dyn Expression,
        args: &'a [Scalar],
    ) -> Self {
        let cross = CrossJoinRowSet::new(lhs, rhs);
        Self {
            inner: FilteredRowSet::new(Box::new(cross), on, args),
        }
    }
}

impl RowSet for InnerJoinRowSet<'_> {
    fn columns(&self) -> Arc<[Column]> {
        self.inner.columns()
    }

    fn iter(&self) -> RowIter<'_> {
        self.inner.iter()
    }
}
