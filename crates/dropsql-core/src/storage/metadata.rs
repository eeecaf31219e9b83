use crate::error::{SchemaError, StorageError};
use crate::types::BLOCK_SIZE;

use super::Block;

/// Bytes reserved for the NUL-terminated database name.
pub const NAME_REGION: usize = 256;

/// Byte offset of the data-block count.
const DATA_BLOCKS_OFFSET: usize = NAME_REGION;

/// Global metadata stored in block 0.
///
/// Layout:
/// ```text
/// [0..256]   database name, UTF-8, NUL-terminated
/// [256..260] data block count: u32 big-endian
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Metadata {
    pub name: String,
    pub data_blocks_count: u32,
}

impl Metadata {
    /// Parse metadata from block 0.
    pub fn from_block(block: &Block) -> Result<Self, StorageError> {
        let region = &block.data()[..NAME_REGION];
        let end = region.iter().position(|&b| b == 0).unwrap_or(NAME_REGION);
        let name = std::str::from_utf8(&region[..end])
            .map_err(|_| StorageError::CorruptedBlock("database name is not UTF-8".to_string()))?
            .to_string();
        let data_blocks_count = block.read_u32(DATA_BLOCKS_OFFSET);

        Ok(Self {
            name,
            data_blocks_count,
        })
    }

    /// Serialize into block 0, leaving the rest of the block untouched.
    pub fn write_to_block(&self, block: &mut Block) -> Result<(), SchemaError> {
        validate_name(&self.name)?;
        let buf = block.data_mut();
        buf[..NAME_REGION].fill(0);
        buf[..self.name.len()].copy_from_slice(self.name.as_bytes());
        self.write_count(block);
        Ok(())
    }

    /// Update only the data block count in block 0.
    pub fn write_count(&self, block: &mut Block) {
        block.write_u32(DATA_BLOCKS_OFFSET, self.data_blocks_count);
    }
}

/// A database name must fit in the name region with its terminator.
pub fn validate_name(name: &str) -> Result<(), SchemaError> {
    if name.len() >= NAME_REGION || name.as_bytes().contains(&0) {
        return Err(SchemaError::InvalidIdentifier(name.to_string()));
    }
    Ok(())
}

const _: () = assert!(DATA_BLOCKS_OFFSET + 4 <= BLOCK_SIZE);
