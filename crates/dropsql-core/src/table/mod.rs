//! Table handles: descriptor caching, page indirection and record CRUD.
//!
//! Records are packed back to back across the table's logical pages, so
//! record `i` starts at byte `i * record_width` of the page sequence and may
//! straddle page boundaries.

pub mod pages;

use tracing::{debug, trace};

use crate::catalog::Descriptor;
use crate::catalog::ops::{find_table, load_descriptor, store_descriptor};
use crate::encoding::{decode_record, encode_record};
use crate::error::{Error, RecordError, SchemaError};
use crate::storage::{Block, BlockStorage};
use crate::types::{BLOCK_SIZE, BlockIndex, ColumnDef, MASTER_TABLE_NAME, RECORD_DEAD, Scalar};

use self::pages::locate;

/// A handle on one table slot.
///
/// The descriptor is decoded when the handle is opened and cached in the
/// handle. Every mutating method first re-reads the stored descriptor, then
/// persists the new one before replacing the cached copy, so several
/// handles on one slot never overwrite each other's records or pages.
/// Reads use the cached copy until [`Table::reload`] or the next mutation.
pub struct Table<'s> {
    storage: &'s dyn BlockStorage,
    slot: u32,
    descriptor: Descriptor,
}

impl std::fmt::Debug for Table<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Table")
            .field("slot", &self.slot)
            .field("descriptor", &self.descriptor)
            .finish_non_exhaustive()
    }
}

impl<'s> Table<'s> {
    /// Open the table stored in `slot`.
    pub fn open(storage: &'s dyn BlockStorage, slot: u32) -> Result<Self, Error> {
        let descriptor = load_descriptor(storage, slot)?;
        Ok(Self {
            storage,
            slot,
            descriptor,
        })
    }

    pub fn slot(&self) -> u32 {
        self.slot
    }

    pub fn descriptor(&self) -> &Descriptor {
        &self.descriptor
    }

    pub fn name(&self) -> &str {
        &self.descriptor.table_name
    }

    pub fn columns(&self) -> &[ColumnDef] {
        &self.descriptor.columns
    }

    pub fn record_count(&self) -> u32 {
        self.descriptor.record_count
    }

    pub fn record_width(&self) -> usize {
        self.descriptor.record_width()
    }

    pub fn is_free(&self) -> bool {
        self.descriptor.is_free()
    }

    /// Re-read the descriptor from storage.
    pub fn reload(&mut self) -> Result<(), Error> {
        self.descriptor = load_descriptor(self.storage, self.slot)?;
        Ok(())
    }

    fn commit(&mut self, descriptor: Descriptor) -> Result<(), Error> {
        store_descriptor(self.storage, self.slot, &descriptor)?;
        self.descriptor = descriptor;
        Ok(())
    }

    /// Rename the table.
    pub fn rename(&mut self, name: &str) -> Result<(), Error> {
        self.reload()?;
        if name.is_empty() {
            return Err(SchemaError::InvalidIdentifier(name.to_string()).into());
        }
        if name == MASTER_TABLE_NAME {
            return Err(SchemaError::ReadOnlyTable(name.to_string()).into());
        }
        if let Some(other) = find_table(self.storage, name)?
            && other != self.slot
        {
            return Err(SchemaError::TableAlreadyExists(name.to_string()).into());
        }
        let mut descriptor = self.descriptor.clone();
        descriptor.table_name = name.to_string();
        self.commit(descriptor)
    }

    /// Append a column. The schema is frozen once the table holds records.
    pub fn add_column(&mut self, column: ColumnDef) -> Result<(), Error> {
        self.reload()?;
        if self.descriptor.record_count > 0 {
            return Err(SchemaError::TableNotEmpty(self.name().to_string()).into());
        }
        if self.descriptor.column_index(&column.name).is_some() {
            return Err(SchemaError::DuplicateColumn(column.name).into());
        }
        debug!(table = self.name(), column = %column, "adding column");
        let mut descriptor = self.descriptor.clone();
        descriptor.columns.push(column);
        self.commit(descriptor)
    }

    /// Reset the slot to the free sentinel. Allocated pages are abandoned.
    pub fn drop(&mut self) -> Result<(), Error> {
        debug!(slot = self.slot, table = self.name(), "dropping table");
        self.commit(Descriptor::empty())
    }

    /// Physical block of a logical page, without allocating.
    ///
    /// Returns `None` if any pointer along the chain is unallocated.
    pub fn page_pointer(&self, page: u64) -> Result<Option<BlockIndex>, Error> {
        let path = locate(page)?;
        let mut pointer = self.descriptor.pointers[path.root];
        for &slot in path.slots() {
            if pointer == 0 {
                return Ok(None);
            }
            pointer = self.storage.read_block(pointer)?.pointer(slot);
        }
        Ok((pointer != 0).then_some(pointer))
    }

    /// The data block of a logical page, allocating the pointer chain on demand.
    ///
    /// Allocation runs top-down: each new block is linked into its parent,
    /// and the parent persisted, before anything below it is allocated.
    pub fn get_or_allocate_page(&mut self, page: u64) -> Result<Block, Error> {
        self.reload()?;
        self.allocate_page(page)
    }

    fn allocate_page(&mut self, page: u64) -> Result<Block, Error> {
        let path = locate(page)?;

        let mut pointer = self.descriptor.pointers[path.root];
        if pointer == 0 {
            let block = self.storage.allocate_block()?;
            pointer = block.index();
            trace!(table = self.name(), page, root = path.root, block = pointer, "allocated root block");
            let mut descriptor = self.descriptor.clone();
            descriptor.pointers[path.root] = pointer;
            self.commit(descriptor)?;
            if path.depth() == 0 {
                return Ok(block);
            }
        }

        for (level, &slot) in path.slots().iter().enumerate() {
            let mut index_block = self.storage.read_block(pointer)?;
            let child = index_block.pointer(slot);
            if child != 0 {
                pointer = child;
                continue;
            }
            let block = self.storage.allocate_block()?;
            trace!(page, level, parent = pointer, block = block.index(), "allocated chain block");
            index_block.set_pointer(slot, block.index());
            self.storage.write_block(&index_block)?;
            pointer = block.index();
            if level + 1 == path.depth() {
                return Ok(block);
            }
        }

        Ok(self.storage.read_block(pointer)?)
    }

    fn read_bytes(&self, mut offset: u64, len: usize) -> Result<Vec<u8>, Error> {
        let mut out = Vec::with_capacity(len);
        while out.len() < len {
            let page = offset / BLOCK_SIZE as u64;
            let within = (offset % BLOCK_SIZE as u64) as usize;
            let chunk = (BLOCK_SIZE - within).min(len - out.len());
            let pointer = self
                .page_pointer(page)?
                .ok_or(RecordError::UnallocatedPage { page })?;
            let block = self.storage.read_block(pointer)?;
            out.extend_from_slice(&block.data()[within..within + chunk]);
            offset += chunk as u64;
        }
        Ok(out)
    }

    fn write_bytes(&mut self, mut offset: u64, bytes: &[u8]) -> Result<(), Error> {
        let mut written = 0;
        while written < bytes.len() {
            let page = offset / BLOCK_SIZE as u64;
            let within = (offset % BLOCK_SIZE as u64) as usize;
            let chunk = (BLOCK_SIZE - within).min(bytes.len() - written);
            let mut block = self.allocate_page(page)?;
            block.overwrite(within, &bytes[written..written + chunk])?;
            self.storage.write_block(&block)?;
            written += chunk;
            offset += chunk as u64;
        }
        Ok(())
    }

    fn record_offset(&self, index: u32) -> u64 {
        index as u64 * self.record_width() as u64
    }

    fn check_index(&self, index: u32) -> Result<(), RecordError> {
        if index >= self.descriptor.record_count {
            return Err(RecordError::OutOfRange {
                index,
                count: self.descriptor.record_count,
            });
        }
        Ok(())
    }

    /// Append a record and return its index.
    pub fn insert(&mut self, values: &[Scalar]) -> Result<u32, Error> {
        self.reload()?;
        let index = self.descriptor.record_count;
        self.write_record(index, values)
    }

    /// Write a live record at `index`, which may be at most `record_count`.
    /// Writing at `record_count` appends.
    pub fn insert_at(&mut self, index: u32, values: &[Scalar]) -> Result<u32, Error> {
        self.reload()?;
        self.write_record(index, values)
    }

    fn write_record(&mut self, index: u32, values: &[Scalar]) -> Result<u32, Error> {
        let count = self.descriptor.record_count;
        if index > count {
            return Err(RecordError::OutOfRange { index, count }.into());
        }
        let bytes = encode_record(&self.descriptor.columns, values)?;
        self.write_bytes(self.record_offset(index), &bytes)?;

        if index == count {
            let mut descriptor = self.descriptor.clone();
            descriptor.record_count += 1;
            self.commit(descriptor)?;
        }
        Ok(index)
    }

    /// Read the live record at `index`.
    pub fn select(&self, index: u32) -> Result<Vec<Scalar>, Error> {
        self.check_index(index)?;
        let bytes = self.read_bytes(self.record_offset(index), self.record_width())?;
        Ok(decode_record(&self.descriptor.columns, index, &bytes)?)
    }

    /// Tombstone the record at `index`. Its space is never reclaimed.
    pub fn delete(&mut self, index: u32) -> Result<(), Error> {
        self.reload()?;
        self.check_index(index)?;
        self.write_bytes(self.record_offset(index), &[RECORD_DEAD])
    }

    /// Overwrite the record at `index` with live values.
    pub fn update(&mut self, index: u32, values: &[Scalar]) -> Result<u32, Error> {
        self.insert_at(index, values)
    }
}
