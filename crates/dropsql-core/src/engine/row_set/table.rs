use std::sync::Arc;

use tracing::warn;

use super::{RowIter, RowSet, stop_on_error};
use crate::engine::{Column, Row};
use crate::error::{Error, RecordError};
use crate::table::Table;

/// Scans the records of a stored table in index order.
///
/// Dead records are skipped. Any other failure to read a record is yielded
/// and ends the scan.
pub struct TableRowSet<'s> {
    table: Table<'s>,
    columns: Arc<[Column]>,
}

impl<'s> TableRowSet<'s> {
    pub fn new(table: Table<'s>) -> Self {
        let name = table.name();
        let columns = table
            .columns()
            .iter()
            .map(|def| Column::from_def(name, def))
            .collect();
        Self { table, columns }
    }

    pub fn table(&self) -> &Table<'s> {
        &self.table
    }
}

impl RowSet for TableRowSet<'_> {
    fn columns(&self) -> Arc<[Column]> {
        self.columns.clone()
    }

    fn iter(&self) -> RowIter<'_> {
        let rows = (0..self.table.record_count()).filter_map(move |index| {
            match self.table.select(index) {
                Ok(values) => Some(Ok(Row::new(self.columns.clone(), values, Some(index)))),
                Err(Error::Record(RecordError::Dead { .. })) => None,
                Err(e) => {
                    warn!(table = self.table.name(), index, error = %e, "unreadable record during scan");
                    Some(Err(e))
                }
            }
        });
        stop_on_error(rows)
    }
}
