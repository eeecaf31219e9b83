//! Storage engine: blocks, block stores, the global metadata block.

pub mod block;
pub mod file;
pub mod memory;
pub mod metadata;

pub use block::Block;
pub use file::{FileBlockStorage, SyncMode};
pub use memory::MemoryBlockStorage;
pub use metadata::Metadata;

use crate::error::StorageError;
use crate::types::BlockIndex;

/// Abstraction over a block-addressed backing store.
///
/// Every method takes `&self`: implementations keep their mutable state
/// behind a lock so table handles and row sets can share one store.
pub trait BlockStorage {
    /// Read a block by index. Fails if `index >= count_blocks()`.
    fn read_block(&self, index: BlockIndex) -> Result<Block, StorageError>;
    /// Replace an existing block in place. Fails if the block does not exist.
    fn write_block(&self, block: &Block) -> Result<(), StorageError>;
    /// Append one zero-filled block and return it.
    fn allocate_block(&self) -> Result<Block, StorageError>;
    /// Total number of blocks in the store.
    fn count_blocks(&self) -> u32;
    /// Push buffered writes to durable storage.
    fn flush(&self) -> Result<(), StorageError> {
        Ok(())
    }
}

impl<S: BlockStorage + ?Sized> BlockStorage for Box<S> {
    fn read_block(&self, index: BlockIndex) -> Result<Block, StorageError> {
        (**self).read_block(index)
    }

    fn write_block(&self, block: &Block) -> Result<(), StorageError> {
        (**self).write_block(block)
    }

    fn allocate_block(&self) -> Result<Block, StorageError> {
        (**self).allocate_block()
    }

    fn count_blocks(&self) -> u32 {
        (**self).count_blocks()
    }

    fn flush(&self) -> Result<(), StorageError> {
        (**self).flush()
    }
}
