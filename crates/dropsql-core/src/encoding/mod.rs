//! Byte-level codecs for descriptor blocks and fixed-width records.

pub mod descriptor;
pub mod record;

pub use descriptor::{decode_descriptor, encode_descriptor};
pub use record::{decode_record, encode_record, record_width};
