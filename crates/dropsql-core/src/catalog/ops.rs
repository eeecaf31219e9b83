//! Catalog operations: load/store descriptors, find, create, drop and list tables.
//!
//! Table slot `i` is stored in block `1 + i`. Slots are scanned in order, so
//! a new table always takes the lowest free slot.

use std::collections::HashSet;

use tracing::debug;

use crate::encoding::{decode_descriptor, encode_descriptor};
use crate::error::{Error, SchemaError, StorageError};
use crate::storage::{Block, BlockStorage};
use crate::types::{BlockIndex, ColumnDef, HEADER_BLOCKS, MASTER_TABLE_NAME, TABLE_SLOTS};

use super::Descriptor;

/// Physical block holding the descriptor of `slot`.
pub fn descriptor_block(slot: u32) -> Result<BlockIndex, StorageError> {
    if slot >= TABLE_SLOTS {
        return Err(StorageError::BlockOutOfRange {
            index: 1 + slot,
            count: HEADER_BLOCKS,
        });
    }
    Ok(1 + slot)
}

/// Read and decode the descriptor of `slot`.
pub fn load_descriptor(storage: &dyn BlockStorage, slot: u32) -> Result<Descriptor, Error> {
    let block = storage.read_block(descriptor_block(slot)?)?;
    Ok(decode_descriptor(&block)?)
}

/// Encode and write `descriptor` into `slot`.
pub fn store_descriptor(
    storage: &dyn BlockStorage,
    slot: u32,
    descriptor: &Descriptor,
) -> Result<(), Error> {
    let mut block = Block::new(descriptor_block(slot)?);
    encode_descriptor(descriptor, &mut block)?;
    storage.write_block(&block)?;
    Ok(())
}

/// Every slot with its descriptor, free slots included.
pub fn list_slots(storage: &dyn BlockStorage) -> Result<Vec<(u32, Descriptor)>, Error> {
    (0..TABLE_SLOTS)
        .map(|slot| Ok((slot, load_descriptor(storage, slot)?)))
        .collect()
}

/// Slots holding a live table, in slot order.
pub fn list_tables(storage: &dyn BlockStorage) -> Result<Vec<(u32, Descriptor)>, Error> {
    Ok(list_slots(storage)?
        .into_iter()
        .filter(|(_, d)| !d.is_free())
        .collect())
}

/// Find the slot of the table called `name`.
pub fn find_table(storage: &dyn BlockStorage, name: &str) -> Result<Option<u32>, Error> {
    if name.is_empty() {
        return Ok(None);
    }
    for slot in 0..TABLE_SLOTS {
        if load_descriptor(storage, slot)?.table_name == name {
            return Ok(Some(slot));
        }
    }
    Ok(None)
}

/// The lowest free slot.
pub fn free_slot(storage: &dyn BlockStorage) -> Result<u32, Error> {
    for slot in 0..TABLE_SLOTS {
        if load_descriptor(storage, slot)?.is_free() {
            return Ok(slot);
        }
    }
    Err(SchemaError::NoFreeSlot.into())
}

/// Create a table in the lowest free slot and return the slot.
///
/// Rejects the empty name, the master table name, an empty or duplicated
/// column list, and names already in use.
pub fn create_table(
    storage: &dyn BlockStorage,
    name: &str,
    columns: Vec<ColumnDef>,
) -> Result<u32, Error> {
    if name.is_empty() {
        return Err(SchemaError::InvalidIdentifier(name.to_string()).into());
    }
    if name == MASTER_TABLE_NAME {
        return Err(SchemaError::ReadOnlyTable(name.to_string()).into());
    }
    if columns.is_empty() {
        return Err(SchemaError::NoColumns(name.to_string()).into());
    }
    let mut seen = HashSet::new();
    for column in &columns {
        if !seen.insert(column.name.as_str()) {
            return Err(SchemaError::DuplicateColumn(column.name.clone()).into());
        }
    }
    if find_table(storage, name)?.is_some() {
        return Err(SchemaError::TableAlreadyExists(name.to_string()).into());
    }

    let slot = free_slot(storage)?;
    store_descriptor(storage, slot, &Descriptor::new(name, columns))?;
    debug!(slot, table = name, "created table");
    Ok(slot)
}

/// Reset the slot of `name` to the free sentinel. Data pages are abandoned.
pub fn drop_table(storage: &dyn BlockStorage, name: &str) -> Result<u32, Error> {
    if name == MASTER_TABLE_NAME {
        return Err(SchemaError::ReadOnlyTable(name.to_string()).into());
    }
    let slot = find_table(storage, name)?
        .ok_or_else(|| SchemaError::TableNotFound(name.to_string()))?;
    store_descriptor(storage, slot, &Descriptor::empty())?;
    debug!(slot, table = name, "dropped table");
    Ok(slot)
}
