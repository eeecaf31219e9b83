use crate::error::StorageError;
use crate::types::{BLOCK_SIZE, BlockIndex, POINTER_SIZE, POINTERS_PER_BLOCK, Pointer};

/// A fixed-size block backed by a heap `[u8; BLOCK_SIZE]` buffer.
///
/// The buffer length never changes; writes only overwrite a sub-range.
/// Pointers are 4-byte big-endian words addressed by slot, so slot `i`
/// lives at byte offset `4 * i`.
#[derive(Clone, PartialEq, Eq)]
pub struct Block {
    index: BlockIndex,
    buf: Box<[u8; BLOCK_SIZE]>,
}

impl Block {
    /// Create a zero-filled block.
    pub fn new(index: BlockIndex) -> Self {
        Self {
            index,
            buf: Box::new([0u8; BLOCK_SIZE]),
        }
    }

    /// Wrap an existing raw block buffer.
    pub fn from_bytes(index: BlockIndex, data: Box<[u8; BLOCK_SIZE]>) -> Self {
        Self { index, buf: data }
    }

    /// Copy a slice of exactly `BLOCK_SIZE` bytes into a new block.
    pub fn from_slice(index: BlockIndex, data: &[u8]) -> Result<Self, StorageError> {
        if data.len() != BLOCK_SIZE {
            return Err(StorageError::CorruptedBlock(format!(
                "block {index} has {} bytes, expected {BLOCK_SIZE}",
                data.len()
            )));
        }
        let mut block = Self::new(index);
        block.buf.copy_from_slice(data);
        Ok(block)
    }

    /// Physical index of this block.
    pub fn index(&self) -> BlockIndex {
        self.index
    }

    /// Raw buffer access (read-only).
    pub fn data(&self) -> &[u8; BLOCK_SIZE] {
        &self.buf
    }

    /// Raw buffer access (mutable).
    pub fn data_mut(&mut self) -> &mut [u8; BLOCK_SIZE] {
        &mut self.buf
    }

    /// Overwrite `bytes.len()` bytes starting at `offset`.
    pub fn overwrite(&mut self, offset: usize, bytes: &[u8]) -> Result<(), StorageError> {
        let end = offset
            .checked_add(bytes.len())
            .filter(|&end| end <= BLOCK_SIZE)
            .ok_or(StorageError::OverwriteOutOfBounds {
                offset,
                len: bytes.len(),
            })?;
        self.buf[offset..end].copy_from_slice(bytes);
        Ok(())
    }

    /// Read a big-endian u32 at a word-aligned byte offset.
    pub fn read_u32(&self, offset: usize) -> u32 {
        debug_assert_eq!(offset % POINTER_SIZE, 0, "unaligned word read");
        let mut word = [0u8; POINTER_SIZE];
        word.copy_from_slice(&self.buf[offset..offset + POINTER_SIZE]);
        u32::from_be_bytes(word)
    }

    /// Write a big-endian u32 at a word-aligned byte offset.
    pub fn write_u32(&mut self, offset: usize, value: u32) {
        debug_assert_eq!(offset % POINTER_SIZE, 0, "unaligned word write");
        self.buf[offset..offset + POINTER_SIZE].copy_from_slice(&value.to_be_bytes());
    }

    /// Read pointer slot `slot` of an index block.
    pub fn pointer(&self, slot: usize) -> Pointer {
        assert!(slot < POINTERS_PER_BLOCK, "pointer slot {slot} out of range");
        self.read_u32(slot * POINTER_SIZE)
    }

    /// Write pointer slot `slot` of an index block.
    pub fn set_pointer(&mut self, slot: usize, pointer: Pointer) {
        assert!(slot < POINTERS_PER_BLOCK, "pointer slot {slot} out of range");
        self.write_u32(slot * POINTER_SIZE, pointer);
    }

    /// Whether every byte is zero.
    pub fn is_zeroed(&self) -> bool {
        self.buf.iter().all(|&b| b == 0)
    }
}

impl std::fmt::Debug for Block {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Block").field("index", &self.index).finish_non_exhaustive()
    }
}
