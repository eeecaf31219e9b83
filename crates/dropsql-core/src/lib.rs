//! # dropSQL
//!
//! A small embedded relational database stored in a single file of
//! 12 KiB blocks.
//!
//! The file starts with a fixed header: one metadata block and sixteen
//! table descriptor slots. Each table addresses its data pages through ten
//! direct pointers and single, double and triple indirect pointers, and
//! stores fixed-width records that carry a one-byte liveness tag. Queries
//! are composed from lazy row sets: table scans, filters, projections,
//! renames and joins.
//!
//! ## Quick Start
//!
//! ```no_run
//! use dropsql_core::api::DBFile;
//! use dropsql_core::engine::RowSet;
//! use dropsql_core::types::{ColumnDef, ColumnType, Scalar};
//!
//! let db = DBFile::open("pets.db").unwrap();
//!
//! let mut pets = db
//!     .create_table(
//!         "pets",
//!         vec![
//!             ColumnDef::new("id", ColumnType::Integer).primary_key(),
//!             ColumnDef::new("name", ColumnType::VarChar(32)),
//!         ],
//!     )
//!     .unwrap();
//! let id = pets.insert(&[Scalar::Integer(1), Scalar::from("Tom")]).unwrap();
//! assert_eq!(pets.select(id).unwrap()[1], Scalar::from("Tom"));
//!
//! for row in db.row_set("pets").unwrap().iter() {
//!     println!("{:?}", row.unwrap().values);
//! }
//! ```

pub mod api;
pub mod catalog;
pub mod encoding;
pub mod engine;
pub mod error;
pub mod sql;
pub mod storage;
pub mod table;
pub mod types;
