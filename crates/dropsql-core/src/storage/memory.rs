use parking_lot::RwLock;

use crate::error::StorageError;
use crate::types::{BLOCK_SIZE, BlockIndex};

use super::{Block, BlockStorage};

/// Block store backed by a growable in-memory buffer.
#[derive(Debug, Default)]
pub struct MemoryBlockStorage {
    buf: RwLock<Vec<u8>>,
}

impl MemoryBlockStorage {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adopt an existing image. Its length must be a multiple of `BLOCK_SIZE`.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, StorageError> {
        if bytes.len() % BLOCK_SIZE != 0 {
            return Err(StorageError::InvalidFileSize {
                len: bytes.len() as u64,
            });
        }
        Ok(Self {
            buf: RwLock::new(bytes),
        })
    }

    /// Copy out the full image.
    pub fn to_bytes(&self) -> Vec<u8> {
        self.buf.read().clone()
    }

    fn range(&self, index: BlockIndex, len: usize) -> Result<std::ops::Range<usize>, StorageError> {
        let count = (len / BLOCK_SIZE) as u32;
        if index >= count {
            return Err(StorageError::BlockOutOfRange { index, count });
        }
        let start = index as usize * BLOCK_SIZE;
        Ok(start..start + BLOCK_SIZE)
    }
}

impl BlockStorage for MemoryBlockStorage {
    fn read_block(&self, index: BlockIndex) -> Result<Block, StorageError> {
        let buf = self.buf.read();
        let range = self.range(index, buf.len())?;
        Block::from_slice(index, &buf[range])
    }

    fn write_block(&self, block: &Block) -> Result<(), StorageError> {
        let mut buf = self.buf.write();
        let range = self.range(block.index(), buf.len())?;
        buf[range].copy_from_slice(block.data());
        Ok(())
    }

    fn allocate_block(&self) -> Result<Block, StorageError> {
        let mut buf = self.buf.write();
        let index = (buf.len() / BLOCK_SIZE) as BlockIndex;
        let new_len = buf.len() + BLOCK_SIZE;
        buf.resize(new_len, 0);
        Ok(Block::new(index))
    }

    fn count_blocks(&self) -> u32 {
        (self.buf.read().len() / BLOCK_SIZE) as u32
    }
}
