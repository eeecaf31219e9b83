use std::path::Path;

use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::catalog::ops as catalog_ops;
use crate::engine::{Column, MockRowSet, RowSet, TableRowSet};
use crate::error::{Error, SchemaError, StorageError};
use crate::storage::metadata::validate_name;
use crate::storage::{Block, BlockStorage, Metadata};
use crate::table::Table;
use crate::types::{
    BlockIndex, ColumnDef, ColumnType, HEADER_BLOCKS, MASTER_TABLE_NAME, Scalar, TABLE_SLOTS,
};

use super::config::DBFileBuilder;
use super::statement::{ExecutionResult, Statement};

/// A dropSQL database: the fixed header region plus on-demand data blocks.
///
/// `DBFile` is itself a [`BlockStorage`]. Tables opened through it allocate
/// their pages through it, which keeps the data block count in the
/// metadata block equal to `count_blocks() - HEADER_BLOCKS`.
pub struct DBFile {
    storage: Box<dyn BlockStorage>,
    metadata: Mutex<Metadata>,
}

impl DBFile {
    pub fn builder() -> DBFileBuilder {
        DBFileBuilder::new()
    }

    /// Open or create a file-backed database with default options.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, Error> {
        Self::builder().open(path)
    }

    /// Create a transient in-memory database.
    pub fn memory() -> Result<Self, Error> {
        Self::builder().memory()
    }

    /// Wrap a block store, initialising the header region if it is empty.
    pub fn with_storage(storage: Box<dyn BlockStorage>, name: Option<&str>) -> Result<Self, Error> {
        let blocks = storage.count_blocks();
        let metadata = if blocks == 0 {
            let metadata = Metadata {
                name: name.unwrap_or_default().to_string(),
                data_blocks_count: 0,
            };
            let mut header = Block::new(0);
            metadata.write_to_block(&mut header)?;
            for _ in 0..HEADER_BLOCKS {
                storage.allocate_block()?;
            }
            storage.write_block(&header)?;
            debug!(name = %metadata.name, "initialised database");
            metadata
        } else if blocks < HEADER_BLOCKS {
            return Err(StorageError::TruncatedHeader { blocks }.into());
        } else {
            let metadata = Metadata::from_block(&storage.read_block(0)?)?;
            if metadata.data_blocks_count != blocks - HEADER_BLOCKS {
                warn!(
                    recorded = metadata.data_blocks_count,
                    actual = blocks - HEADER_BLOCKS,
                    "data block count out of sync"
                );
            }
            debug!(blocks, name = %metadata.name, "opened database");
            metadata
        };

        Ok(Self {
            storage,
            metadata: Mutex::new(metadata),
        })
    }

    // --- metadata ---

    pub fn metadata(&self) -> Metadata {
        self.metadata.lock().clone()
    }

    pub fn name(&self) -> String {
        self.metadata.lock().name.clone()
    }

    pub fn set_name(&self, name: &str) -> Result<(), Error> {
        validate_name(name)?;
        let mut metadata = self.metadata.lock();
        let mut header = self.storage.read_block(0)?;
        let updated = Metadata {
            name: name.to_string(),
            data_blocks_count: metadata.data_blocks_count,
        };
        updated.write_to_block(&mut header)?;
        self.storage.write_block(&header)?;
        *metadata = updated;
        Ok(())
    }

    pub fn data_blocks_count(&self) -> u32 {
        self.metadata.lock().data_blocks_count
    }

    // --- catalog ---

    /// Handles on all table slots, free ones included.
    pub fn tables(&self) -> Result<Vec<Table<'_>>, Error> {
        (0..TABLE_SLOTS).map(|slot| Table::open(self, slot)).collect()
    }

    /// Handles on the slots holding a table.
    pub fn live_tables(&self) -> Result<Vec<Table<'_>>, Error> {
        Ok(self.tables()?.into_iter().filter(|t| !t.is_free()).collect())
    }

    pub fn table(&self, name: &str) -> Result<Table<'_>, Error> {
        let slot = catalog_ops::find_table(self, name)?
            .ok_or_else(|| SchemaError::TableNotFound(name.to_string()))?;
        Table::open(self, slot)
    }

    pub fn free_slot(&self) -> Result<u32, Error> {
        catalog_ops::free_slot(self)
    }

    pub fn create_table(&self, name: &str, columns: Vec<ColumnDef>) -> Result<Table<'_>, Error> {
        let slot = catalog_ops::create_table(self, name, columns)?;
        Table::open(self, slot)
    }

    pub fn drop_table(&self, name: &str) -> Result<(), Error> {
        catalog_ops::drop_table(self, name)?;
        Ok(())
    }

    /// The introspection row set: one `(type, name, sql)` row per live table.
    pub fn master_table(&self) -> Result<MockRowSet, Error> {
        let columns = vec![
            Column::new(MASTER_TABLE_NAME, "type", ColumnType::VarChar(16)),
            Column::new(MASTER_TABLE_NAME, "name", ColumnType::VarChar(255)),
            Column::new(MASTER_TABLE_NAME, "sql", ColumnType::VarChar(4096)),
        ];
        let rows = catalog_ops::list_tables(self)?
            .into_iter()
            .map(|(_, descriptor)| {
                vec![
                    Scalar::from("table"),
                    Scalar::from(descriptor.table_name.as_str()),
                    Scalar::from(descriptor.create_sql()),
                ]
            })
            .collect();
        Ok(MockRowSet::new(columns, rows))
    }

    /// A scan over the named table, or over the master table for its
    /// reserved name.
    pub fn row_set(&self, name: &str) -> Result<Box<dyn RowSet + '_>, Error> {
        if name == MASTER_TABLE_NAME {
            return Ok(Box::new(self.master_table()?));
        }
        Ok(Box::new(TableRowSet::new(self.table(name)?)))
    }

    pub fn execute<'a>(
        &'a self,
        statement: &'a dyn Statement,
        args: &'a [Scalar],
    ) -> Result<ExecutionResult<'a>, Error> {
        statement.execute(self, args)
    }

    // --- lifecycle ---

    pub fn flush(&self) -> Result<(), Error> {
        self.storage.flush()?;
        Ok(())
    }

    /// Flush and release the database.
    pub fn close(self) -> Result<(), Error> {
        self.flush()
    }
}

impl BlockStorage for DBFile {
    fn read_block(&self, index: BlockIndex) -> Result<Block, StorageError> {
        self.storage.read_block(index)
    }

    fn write_block(&self, block: &Block) -> Result<(), StorageError> {
        self.storage.write_block(block)
    }

    fn allocate_block(&self) -> Result<Block, StorageError> {
        let mut metadata = self.metadata.lock();
        let block = self.storage.allocate_block()?;
        let updated = Metadata {
            name: metadata.name.clone(),
            data_blocks_count: metadata.data_blocks_count + 1,
        };
        let mut header = self.storage.read_block(0)?;
        updated.write_count(&mut header);
        self.storage.write_block(&header)?;
        *metadata = updated;
        Ok(block)
    }

    fn count_blocks(&self) -> u32 {
        self.storage.count_blocks()
    }

    fn flush(&self) -> Result<(), StorageError> {
        self.storage.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::storage::MemoryBlockStorage;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};

    /// Memory store that can be told to reject writes to block 0.
    struct HeaderFault {
        inner: MemoryBlockStorage,
        fail: Arc<AtomicBool>,
    }

    impl BlockStorage for HeaderFault {
        fn read_block(&self, index: BlockIndex) -> Result<Block, StorageError> {
            self.inner.read_block(index)
        }

        fn write_block(&self, block: &Block) -> Result<(), StorageError> {
            if block.index() == 0 && self.fail.load(Ordering::SeqCst) {
                return Err(std::io::Error::other("header write refused").into());
            }
            self.inner.write_block(block)
        }

        fn allocate_block(&self) -> Result<Block, StorageError> {
            self.inner.allocate_block()
        }

        fn count_blocks(&self) -> u32 {
            self.inner.count_blocks()
        }
    }

    fn columns() -> Vec<ColumnDef> {
        vec![
            ColumnDef::new("id", ColumnType::Integer).primary_key(),
            ColumnDef::new("name", ColumnType::VarChar(32)),
        ]
    }

    #[test]
    fn test_fresh_database_has_header() {
        let db = DBFile::memory().unwrap();
        assert_eq!(db.count_blocks(), HEADER_BLOCKS);
        assert_eq!(db.data_blocks_count(), 0);
        assert_eq!(db.tables().unwrap().len(), TABLE_SLOTS as usize);
        assert!(db.live_tables().unwrap().is_empty());
    }

    #[test]
    fn test_truncated_header_rejected() {
        let storage = MemoryBlockStorage::new();
        for _ in 0..3 {
            storage.allocate_block().unwrap();
        }
        match DBFile::with_storage(Box::new(storage), None) {
            Err(Error::Storage(StorageError::TruncatedHeader { blocks: 3 })) => {}
            Err(other) => panic!("expected TruncatedHeader, got {other:?}"),
            Ok(_) => panic!("expected TruncatedHeader, got a database"),
        }
    }

    #[test]
    fn test_data_block_count_tracks_allocations() {
        let db = DBFile::memory().unwrap();
        let mut table = db.create_table("t", columns()).unwrap();
        for i in 0..10 {
            table.insert(&[Scalar::Integer(i), Scalar::from("x")]).unwrap();
        }
        assert!(db.data_blocks_count() > 0);
        assert_eq!(db.data_blocks_count(), db.count_blocks() - HEADER_BLOCKS);
        let header = Metadata::from_block(&db.read_block(0).unwrap()).unwrap();
        assert_eq!(header.data_blocks_count, db.data_blocks_count());
    }

    #[test]
    fn test_failed_header_write_keeps_cached_count() {
        let fail = Arc::new(AtomicBool::new(false));
        let storage = HeaderFault {
            inner: MemoryBlockStorage::new(),
            fail: Arc::clone(&fail),
        };
        let db = DBFile::with_storage(Box::new(storage), None).unwrap();
        db.allocate_block().unwrap();
        assert_eq!(db.data_blocks_count(), 1);

        fail.store(true, Ordering::SeqCst);
        match db.allocate_block() {
            Err(StorageError::Io(_)) => {}
            other => panic!("expected Io, got {other:?}"),
        }
        assert_eq!(db.data_blocks_count(), 1);

        fail.store(false, Ordering::SeqCst);
        let header = Metadata::from_block(&db.read_block(0).unwrap()).unwrap();
        assert_eq!(header.data_blocks_count, 1);
    }

    #[test]
    fn test_appends_through_separate_handles() {
        let db = DBFile::memory().unwrap();
        let mut created = db.create_table("t", columns()).unwrap();
        let mut looked_up = db.table("t").unwrap();

        created.insert(&[Scalar::Integer(1), Scalar::from("a")]).unwrap();
        looked_up.insert(&[Scalar::Integer(2), Scalar::from("b")]).unwrap();

        let fresh = db.table("t").unwrap();
        assert_eq!(fresh.record_count(), 2);
        assert_eq!(fresh.select(0).unwrap()[0], Scalar::Integer(1));
        assert_eq!(fresh.select(1).unwrap()[0], Scalar::Integer(2));
    }

    #[test]
    fn test_set_name_keeps_count() {
        let db = DBFile::memory().unwrap();
        let mut table = db.create_table("t", columns()).unwrap();
        table.insert(&[Scalar::Integer(1), Scalar::from("x")]).unwrap();
        let count = db.data_blocks_count();

        db.set_name("renamed").unwrap();
        let header = Metadata::from_block(&db.read_block(0).unwrap()).unwrap();
        assert_eq!(header.name, "renamed");
        assert_eq!(header.data_blocks_count, count);
        assert!(db.set_name(&"n".repeat(300)).is_err());
    }

    #[test]
    fn test_table_lookup() {
        let db = DBFile::memory().unwrap();
        db.create_table("t", columns()).unwrap();
        assert_eq!(db.table("t").unwrap().slot(), 0);
        assert_eq!(db.free_slot().unwrap(), 1);

        match db.table("missing") {
            Err(e) => assert_eq!(e.kind(), ErrorKind::NotFound),
            Ok(_) => panic!("expected NotFound"),
        }

        db.drop_table("t").unwrap();
        assert!(db.table("t").is_err());
        assert_eq!(db.free_slot().unwrap(), 0);
    }

    #[test]
    fn test_master_table_rows() {
        let db = DBFile::memory().unwrap();
        db.create_table("t1", columns()).unwrap();
        db.create_table("t2", vec![ColumnDef::new("v", ColumnType::Float)])
            .unwrap();

        let master = db.row_set(MASTER_TABLE_NAME).unwrap();
        let names: Vec<_> = master.columns().iter().map(|c| c.name.clone()).collect();
        assert_eq!(names, vec!["type", "name", "sql"]);

        // the primary key flag has no slot on disk
        let rows = master.collect_rows().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].values[0], Scalar::from("table"));
        assert_eq!(rows[0].values[1], Scalar::from("t1"));
        assert_eq!(
            rows[0].values[2],
            Scalar::from("/create table t1 ( id integer, name varchar(32) ) /drop")
        );
        assert_eq!(rows[1].values[1], Scalar::from("t2"));
    }

    #[test]
    fn test_master_table_is_read_only() {
        let db = DBFile::memory().unwrap();
        match db.create_table(MASTER_TABLE_NAME, columns()) {
            Err(Error::Schema(SchemaError::ReadOnlyTable(_))) => {}
            Err(other) => panic!("expected ReadOnlyTable, got {other:?}"),
            Ok(table) => panic!("expected ReadOnlyTable, got {table:?}"),
        }
        assert!(db.drop_table(MASTER_TABLE_NAME).is_err());
    }
}
