//! Core types: block and pointer ids, layout constants, column types, scalars.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Physical block index (offset in units of BLOCK_SIZE).
pub type BlockIndex = u32;

/// A 4-byte on-disk block pointer. Zero means unallocated.
pub type Pointer = u32;

/// Size of every block in bytes.
pub const BLOCK_SIZE: usize = 12288;

/// Size of an on-disk pointer in bytes.
pub const POINTER_SIZE: usize = 4;

/// Number of pointer slots in an index block.
pub const POINTERS_PER_BLOCK: usize = BLOCK_SIZE / POINTER_SIZE;

/// Number of table descriptor slots.
pub const TABLE_SLOTS: u32 = 16;

/// Block 0 plus one descriptor block per table slot.
pub const HEADER_BLOCKS: u32 = 1 + TABLE_SLOTS;

/// Direct page pointers in a descriptor.
pub const DIRECT_POINTERS: usize = 10;

/// Indirection levels beyond the direct pointers.
pub const INDIRECT_LEVELS: usize = 3;

/// Total pointers stored in a descriptor.
pub const DESCRIPTOR_POINTERS: usize = DIRECT_POINTERS + INDIRECT_LEVELS;

/// Reserved name of the introspection table.
pub const MASTER_TABLE_NAME: &str = "autism";

/// Liveness tag of a live record.
pub const RECORD_ALIVE: u8 = b'a';

/// Liveness tag of a deleted record.
pub const RECORD_DEAD: u8 = b'd';

/// Declared type of a table column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColumnType {
    Integer,
    Float,
    VarChar(u16),
}

impl ColumnType {
    const INTEGER_CODE: u16 = 0x0000;
    const FLOAT_CODE: u16 = 0xFFFF;

    /// Decode the 2-byte type code stored in a descriptor.
    pub fn from_code(code: u16) -> Self {
        match code {
            Self::INTEGER_CODE => ColumnType::Integer,
            Self::FLOAT_CODE => ColumnType::Float,
            width => ColumnType::VarChar(width),
        }
    }

    /// The 2-byte type code. Only meaningful when [`ColumnType::is_encodable`].
    pub fn code(self) -> u16 {
        match self {
            ColumnType::Integer => Self::INTEGER_CODE,
            ColumnType::Float => Self::FLOAT_CODE,
            ColumnType::VarChar(width) => width,
        }
    }

    /// VarChar widths 0 and 0xFFFF collide with the Integer/Float codes.
    pub fn is_encodable(self) -> bool {
        match self {
            ColumnType::VarChar(width) => width != Self::INTEGER_CODE && width != Self::FLOAT_CODE,
            _ => true,
        }
    }

    /// Width of the fixed record field in bytes.
    pub fn width(self) -> usize {
        match self {
            ColumnType::Integer | ColumnType::Float => 4,
            ColumnType::VarChar(width) => width as usize,
        }
    }

    /// Whether a scalar's dynamic type is storable in a column of this type.
    pub fn accepts(self, value: &Scalar) -> bool {
        matches!(
            (self, value),
            (ColumnType::Integer, Scalar::Integer(_))
                | (ColumnType::Float, Scalar::Float(_))
                | (ColumnType::VarChar(_), Scalar::VarChar(_))
        )
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnType::Integer => write!(f, "integer"),
            ColumnType::Float => write!(f, "float"),
            ColumnType::VarChar(width) => write!(f, "varchar({width})"),
        }
    }
}

/// A column definition as declared by `create table`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDef {
    pub name: String,
    pub ty: ColumnType,
    #[serde(default)]
    pub is_primary_key: bool,
}

impl ColumnDef {
    pub fn new(name: impl Into<String>, ty: ColumnType) -> Self {
        Self {
            name: name.into(),
            ty,
            is_primary_key: false,
        }
    }

    pub fn primary_key(mut self) -> Self {
        self.is_primary_key = true;
        self
    }
}

impl fmt::Display for ColumnDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.name, self.ty)?;
        if self.is_primary_key {
            write!(f, " /primary key")?;
        }
        Ok(())
    }
}

/// A dynamically typed value flowing through records, rows and expressions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Scalar {
    Integer(i32),
    Float(f32),
    VarChar(String),
}

impl Scalar {
    pub fn type_name(&self) -> &'static str {
        match self {
            Scalar::Integer(_) => "integer",
            Scalar::Float(_) => "float",
            Scalar::VarChar(_) => "varchar",
        }
    }

    /// Truthiness used by filter predicates and the boolean operators.
    pub fn is_truthy(&self) -> bool {
        match self {
            Scalar::Integer(v) => *v != 0,
            Scalar::Float(v) => *v != 0.0,
            Scalar::VarChar(s) => !s.is_empty(),
        }
    }
}

impl From<i32> for Scalar {
    fn from(v: i32) -> Self {
        Scalar::Integer(v)
    }
}

impl From<f32> for Scalar {
    fn from(v: f32) -> Self {
        Scalar::Float(v)
    }
}

impl From<&str> for Scalar {
    fn from(v: &str) -> Self {
        Scalar::VarChar(v.to_string())
    }
}

impl From<String> for Scalar {
    fn from(v: String) -> Self {
        Scalar::VarChar(v)
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Integer(v) => write!(f, "{v}"),
            Scalar::Float(v) => write!(f, "{v:?}"),
            Scalar::VarChar(s) => write!(f, "{s}"),
        }
    }
}
