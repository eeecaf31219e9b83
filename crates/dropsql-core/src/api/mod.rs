//! Public API: the database handle, its builder, and the statement interface.

pub mod config;
pub mod database;
pub mod statement;

pub use config::DBFileBuilder;
pub use database::DBFile;
pub use statement::{ExecutionResult, Statement};
