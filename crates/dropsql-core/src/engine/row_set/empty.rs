use std::sync::Arc;

use super::{RowIter, RowSet};
use crate::engine::Column;

/// No columns and no rows.
#[derive(Debug, Default, Clone, Copy)]
pub struct EmptyRowSet;

impl RowSet for EmptyRowSet {
    fn columns(&self) -> Arc<[Column]> {
        Arc::from(Vec::new())
    }

    fn iter(&self) -> RowIter<'_> {
        Box::new(std::iter::empty())
    }
}
