use std::fs::{File, OpenOptions};
use std::os::unix::fs::FileExt;
use std::path::Path;

use parking_lot::Mutex;
use tracing::trace;

use crate::error::StorageError;
use crate::types::{BLOCK_SIZE, BlockIndex};

use super::{Block, BlockStorage};

/// When the file store forces data to disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SyncMode {
    /// fsync after every block write or allocation.
    Full,
    /// fsync only on explicit flush and when the store is dropped.
    #[default]
    OnClose,
}

/// Random-access file block store.
///
/// Block-granularity reads and writes use `pread`/`pwrite`
/// (via `FileExt::read_exact_at` / `write_all_at`), so no seek state is
/// shared between callers. The file carries an exclusive advisory lock for
/// the lifetime of the store.
pub struct FileBlockStorage {
    file: File,
    block_count: Mutex<u32>,
    sync_mode: SyncMode,
}

impl FileBlockStorage {
    /// Open the file at `path`, creating it empty if missing.
    ///
    /// Fails with `InvalidFileSize` if the existing length is not a whole
    /// number of blocks and with `FileLocked` if another handle holds it.
    pub fn open(path: &Path, sync_mode: SyncMode) -> Result<Self, StorageError> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)?;

        fs2::FileExt::try_lock_exclusive(&file).map_err(|_| StorageError::FileLocked)?;

        let len = file.metadata()?.len();
        if len % BLOCK_SIZE as u64 != 0 {
            return Err(StorageError::InvalidFileSize { len });
        }
        let block_count = (len / BLOCK_SIZE as u64) as u32;

        Ok(Self {
            file,
            block_count: Mutex::new(block_count),
            sync_mode,
        })
    }

    pub fn sync_mode(&self) -> SyncMode {
        self.sync_mode
    }

    fn sync_if_full(&self) -> Result<(), StorageError> {
        if self.sync_mode == SyncMode::Full {
            self.file.sync_data()?;
        }
        Ok(())
    }

    fn offset(index: BlockIndex) -> u64 {
        index as u64 * BLOCK_SIZE as u64
    }
}

impl BlockStorage for FileBlockStorage {
    fn read_block(&self, index: BlockIndex) -> Result<Block, StorageError> {
        let count = *self.block_count.lock();
        if index >= count {
            return Err(StorageError::BlockOutOfRange { index, count });
        }
        let mut buf = Box::new([0u8; BLOCK_SIZE]);
        self.file.read_exact_at(&mut buf[..], Self::offset(index))?;
        Ok(Block::from_bytes(index, buf))
    }

    fn write_block(&self, block: &Block) -> Result<(), StorageError> {
        let count = *self.block_count.lock();
        if block.index() >= count {
            return Err(StorageError::BlockOutOfRange {
                index: block.index(),
                count,
            });
        }
        self.file
            .write_all_at(block.data(), Self::offset(block.index()))?;
        self.sync_if_full()
    }

    fn allocate_block(&self) -> Result<Block, StorageError> {
        let mut count = self.block_count.lock();
        let index = *count;
        let block = Block::new(index);
        self.file.write_all_at(block.data(), Self::offset(index))?;
        *count += 1;
        trace!(index, "allocated block");
        self.sync_if_full()?;
        Ok(block)
    }

    fn count_blocks(&self) -> u32 {
        *self.block_count.lock()
    }

    fn flush(&self) -> Result<(), StorageError> {
        self.file.sync_all()?;
        Ok(())
    }
}

impl Drop for FileBlockStorage {
    fn drop(&mut self) {
        let _ = self.file.sync_all();
    }
}
