//! Error types for all dropSQL operations.

use std::io;
use thiserror::Error;

use crate::types::ColumnType;

/// Top-level error type for dropSQL operations.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Record(#[from] RecordError),

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Eval(#[from] EvalError),
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("block out of range: {index} >= {count}")]
    BlockOutOfRange { index: u32, count: u32 },

    #[error("overwrite of {len} bytes at offset {offset} exceeds block size")]
    OverwriteOutOfBounds { offset: usize, len: usize },

    #[error("storage size {len} is not a multiple of the block size")]
    InvalidFileSize { len: u64 },

    #[error("storage holds {blocks} blocks, fewer than the fixed header region")]
    TruncatedHeader { blocks: u32 },

    #[error("database file is locked")]
    FileLocked,

    #[error("corrupted block: {0}")]
    CorruptedBlock(String),
}

#[derive(Debug, Error)]
pub enum RecordError {
    #[error("record out of range: {index} >= {count}")]
    OutOfRange { index: u32, count: u32 },

    #[error("record {index} is dead")]
    Dead { index: u32 },

    #[error("record {index} has corrupted liveness tag {tag:#04x}")]
    CorruptedTag { index: u32, tag: u8 },

    #[error("column '{column}' holds invalid UTF-8")]
    InvalidUtf8 { column: String },

    #[error("type mismatch for column '{column}': expected {expected}, got {actual}")]
    TypeMismatch {
        column: String,
        expected: ColumnType,
        actual: &'static str,
    },

    #[error("value for column '{column}' is {actual} bytes, exceeding varchar({width})")]
    ValueTooLong {
        column: String,
        width: u16,
        actual: usize,
    },

    #[error("value for column '{column}' contains a NUL byte")]
    NulInVarChar { column: String },

    #[error("page {page} is beyond the triple-indirect range")]
    PageOutOfRange { page: u64 },

    #[error("page {page} is not allocated")]
    UnallocatedPage { page: u64 },
}

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("table not found: {0}")]
    TableNotFound(String),

    #[error("table already exists: {0}")]
    TableAlreadyExists(String),

    #[error("no free table slot")]
    NoFreeSlot,

    #[error("cannot add columns to non-empty table '{0}'")]
    TableNotEmpty(String),

    #[error("duplicate column: {0}")]
    DuplicateColumn(String),

    #[error("unknown column: {0}")]
    UnknownColumn(String),

    #[error("expected {expected} values, got {actual}")]
    ArityMismatch { expected: usize, actual: usize },

    #[error("invalid identifier: {0:?}")]
    InvalidIdentifier(String),

    #[error("column '{column}' has type {ty}, which has no on-disk code")]
    UnencodableType { column: String, ty: ColumnType },

    #[error("descriptor of table '{0}' does not fit in one block")]
    DescriptorOverflow(String),

    #[error("table '{0}' is read-only")]
    ReadOnlyTable(String),

    #[error("table '{0}' must have at least one column")]
    NoColumns(String),
}

#[derive(Debug, Error)]
pub enum EvalError {
    #[error("unknown column reference: {0}")]
    UnknownColumn(String),

    #[error("ambiguous column reference: {0}")]
    AmbiguousColumn(String),

    #[error("missing argument ?{index} ({count} supplied)")]
    MissingArgument { index: usize, count: usize },

    #[error("invalid operands for '{op}': {lhs} and {rhs}")]
    InvalidOperands {
        op: &'static str,
        lhs: &'static str,
        rhs: &'static str,
    },

    #[error("division by zero")]
    DivisionByZero,

    #[error("integer overflow")]
    Overflow,
}

/// Coarse classification of every error, independent of which layer raised it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    OutOfRange,
    Corruption,
    DeadRecord,
    TypeMismatch,
    SchemaViolation,
    NotFound,
    Io,
    Evaluation,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Storage(e) => match e {
                StorageError::Io(_) | StorageError::FileLocked => ErrorKind::Io,
                StorageError::BlockOutOfRange { .. }
                | StorageError::OverwriteOutOfBounds { .. } => ErrorKind::OutOfRange,
                StorageError::InvalidFileSize { .. }
                | StorageError::TruncatedHeader { .. }
                | StorageError::CorruptedBlock(_) => ErrorKind::Corruption,
            },
            Error::Record(e) => match e {
                RecordError::OutOfRange { .. } | RecordError::PageOutOfRange { .. } => {
                    ErrorKind::OutOfRange
                }
                RecordError::Dead { .. } => ErrorKind::DeadRecord,
                RecordError::CorruptedTag { .. }
                | RecordError::InvalidUtf8 { .. }
                | RecordError::UnallocatedPage { .. } => ErrorKind::Corruption,
                RecordError::TypeMismatch { .. } => ErrorKind::TypeMismatch,
                RecordError::ValueTooLong { .. } | RecordError::NulInVarChar { .. } => {
                    ErrorKind::SchemaViolation
                }
            },
            Error::Schema(e) => match e {
                SchemaError::TableNotFound(_) | SchemaError::NoFreeSlot => ErrorKind::NotFound,
                _ => ErrorKind::SchemaViolation,
            },
            Error::Eval(_) => ErrorKind::Evaluation,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
