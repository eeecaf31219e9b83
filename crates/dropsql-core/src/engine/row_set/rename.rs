use std::sync::Arc;

use super::{RowIter, RowSet};
use crate::engine::{Column, Row};

/// Re-tags every column of `inner` with a table alias. Data is unchanged.
pub struct RenameTableRowSet<'a> {
    inner: Box<dyn RowSet + 'a>,
    columns: Arc<[Column]>,
}

impl<'a> RenameTableRowSet<'a> {
    pub fn new(inner: Box<dyn RowSet + 'a>, alias: &str) -> Self {
        let columns = inner
            .columns()
            .iter()
            .map(|c| Column::new(alias, c.name.clone(), c.ty))
            .collect();
        Self { inner, columns }
    }
}

impl RowSet for RenameTableRowSet<'_> {
    fn columns(&self) -> Arc<[Column]> {
        self.columns.clone()
    }

    fn iter(&self) -> RowIter<'_> {
        Box::new(self.inner.iter().map(move |row| {
            let row = row?;
            Ok(Row::new(self.columns.clone(), row.values, row.id))
        }))
    }
}
