use std::path::Path;

use tracing::debug;

use crate::error::Error;
use crate::storage::{FileBlockStorage, MemoryBlockStorage, SyncMode};

use super::DBFile;

/// Options for opening a [`DBFile`].
#[derive(Debug, Clone, Default)]
pub struct DBFileBuilder {
    sync_mode: SyncMode,
    name: Option<String>,
}

impl DBFileBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// When a file-backed store forces writes to disk.
    pub fn sync_mode(mut self, mode: SyncMode) -> Self {
        self.sync_mode = mode;
        self
    }

    /// Database name recorded in the metadata block of a fresh store.
    /// Ignored when opening an initialised store.
    pub fn name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    /// Open or create a file-backed database.
    pub fn open(self, path: impl AsRef<Path>) -> Result<DBFile, Error> {
        let path = path.as_ref();
        debug!(path = %path.display(), sync_mode = ?self.sync_mode, "opening database file");
        let storage = FileBlockStorage::open(path, self.sync_mode)?;
        DBFile::with_storage(Box::new(storage), self.name.as_deref())
    }

    /// Create a transient in-memory database.
    pub fn memory(self) -> Result<DBFile, Error> {
        DBFile::with_storage(Box::new(MemoryBlockStorage::new()), self.name.as_deref())
    }
}
