use std::sync::Arc;

use super::{RowIter, RowSet};
use crate::engine::{Column, Row};
use crate::types::Scalar;

/// A row set over fixed in-memory data. Row ids count from 1.
#[derive(Debug, Clone)]
pub struct MockRowSet {
    columns: Arc<[Column]>,
    rows: Vec<Vec<Scalar>>,
}

impl MockRowSet {
    pub fn new(columns: Vec<Column>, rows: Vec<Vec<Scalar>>) -> Self {
        debug_assert!(rows.iter().all(|r| r.len() == columns.len()));
        Self {
            columns: columns.into(),
            rows,
        }
    }
}

impl RowSet for MockRowSet {
    fn columns(&self) -> Arc<[Column]> {
        self.columns.clone()
    }

    fn iter(&self) -> RowIter<'_> {
        Box::new(self.rows.iter().enumerate().map(|(i, values)| {
            Ok(Row::new(
                self.columns.clone(),
                values.clone(),
                Some(i as u32 + 1),
            ))
        }))
    }
}
