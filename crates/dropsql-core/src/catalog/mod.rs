//! Table catalog: descriptors in the 16 fixed slots, lookup, create/drop.

pub mod ops;

use serde::{Deserialize, Serialize};

use crate::encoding::record_width;
use crate::types::{ColumnDef, DESCRIPTOR_POINTERS, Pointer};

/// Persisted metadata of one table slot.
///
/// A descriptor is a detached value: changing its fields has no effect on
/// storage until it is handed to [`ops::store_descriptor`] (or to the
/// owning [`crate::table::Table`], which stores on every mutation).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Descriptor {
    pub table_name: String,
    pub columns: Vec<ColumnDef>,
    pub pointers: [Pointer; DESCRIPTOR_POINTERS],
    pub record_count: u32,
}

impl Descriptor {
    /// The free-slot sentinel.
    pub fn empty() -> Self {
        Self {
            table_name: String::new(),
            columns: Vec::new(),
            pointers: [0; DESCRIPTOR_POINTERS],
            record_count: 0,
        }
    }

    pub fn new(table_name: impl Into<String>, columns: Vec<ColumnDef>) -> Self {
        Self {
            table_name: table_name.into(),
            columns,
            ..Self::empty()
        }
    }

    /// A slot is free when its table name is empty.
    pub fn is_free(&self) -> bool {
        self.table_name.is_empty()
    }

    pub fn record_width(&self) -> usize {
        record_width(&self.columns)
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    /// The `create table` statement that reproduces this schema.
    pub fn create_sql(&self) -> String {
        let columns = self
            .columns
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        format!("/create table {} ( {columns} ) /drop", self.table_name)
    }
}

impl Default for Descriptor {
    fn default() -> Self {
        Self::empty()
    }
}
