use crate::catalog::Descriptor;
use crate::error::{Error, SchemaError, StorageError};
use crate::storage::Block;
use crate::types::{
    BLOCK_SIZE, ColumnDef, ColumnType, DESCRIPTOR_POINTERS, POINTER_SIZE, Pointer,
};

/// Bytes at the block end holding the pointer array and the record count.
pub const DESCRIPTOR_TAIL: usize = DESCRIPTOR_POINTERS * POINTER_SIZE + 4;

/// End of the front region holding the name and column list.
pub const FRONT_END: usize = BLOCK_SIZE - DESCRIPTOR_TAIL;

const RECORD_COUNT_OFFSET: usize = BLOCK_SIZE - 4;

/// Decode a table descriptor block.
///
/// Layout:
/// ```text
/// [0..]              table name, NUL-terminated
/// [..]               repeated: column name NUL-terminated + u16 type code
/// [..FRONT_END]      zero fill; the column list ends at the first zero byte
/// [FRONT_END..-4]    13 pointers: u32 big-endian
/// [-4..]             record count: u32 big-endian
/// ```
pub fn decode_descriptor(block: &Block) -> Result<Descriptor, StorageError> {
    let front = &block.data()[..FRONT_END];
    let corrupt = |what: &str| {
        StorageError::CorruptedBlock(format!("descriptor block {}: {what}", block.index()))
    };

    let name_end = front
        .iter()
        .position(|&b| b == 0)
        .ok_or_else(|| corrupt("unterminated table name"))?;
    let table_name = std::str::from_utf8(&front[..name_end])
        .map_err(|_| corrupt("table name is not UTF-8"))?
        .to_string();

    let mut columns = Vec::new();
    let mut pos = name_end + 1;
    while pos < FRONT_END && front[pos] != 0 {
        let nul = front[pos..]
            .iter()
            .position(|&b| b == 0)
            .map(|n| pos + n)
            .ok_or_else(|| corrupt("unterminated column name"))?;
        if nul + 3 > FRONT_END {
            return Err(corrupt("truncated column type"));
        }
        let name = std::str::from_utf8(&front[pos..nul])
            .map_err(|_| corrupt("column name is not UTF-8"))?
            .to_string();
        let code = u16::from_be_bytes([front[nul + 1], front[nul + 2]]);
        columns.push(ColumnDef::new(name, ColumnType::from_code(code)));
        pos = nul + 3;
    }

    let mut pointers: [Pointer; DESCRIPTOR_POINTERS] = [0; DESCRIPTOR_POINTERS];
    for (i, pointer) in pointers.iter_mut().enumerate() {
        *pointer = block.read_u32(FRONT_END + i * POINTER_SIZE);
    }
    let record_count = block.read_u32(RECORD_COUNT_OFFSET);

    Ok(Descriptor {
        table_name,
        columns,
        pointers,
        record_count,
    })
}

/// Encode a descriptor into `block`, replacing its whole content.
///
/// Fails if a name is not a valid identifier, a column type has no code,
/// or the name and column list overflow the front region.
pub fn encode_descriptor(descriptor: &Descriptor, block: &mut Block) -> Result<(), Error> {
    if descriptor.table_name.as_bytes().contains(&0) {
        return Err(SchemaError::InvalidIdentifier(descriptor.table_name.clone()).into());
    }

    let mut front = Vec::with_capacity(FRONT_END);
    front.extend_from_slice(descriptor.table_name.as_bytes());
    front.push(0);
    for column in &descriptor.columns {
        if column.name.is_empty() || column.name.as_bytes().contains(&0) {
            return Err(SchemaError::InvalidIdentifier(column.name.clone()).into());
        }
        if !column.ty.is_encodable() {
            return Err(SchemaError::UnencodableType {
                column: column.name.clone(),
                ty: column.ty,
            }
            .into());
        }
        front.extend_from_slice(column.name.as_bytes());
        front.push(0);
        front.extend_from_slice(&column.ty.code().to_be_bytes());
    }
    if front.len() > FRONT_END {
        return Err(SchemaError::DescriptorOverflow(descriptor.table_name.clone()).into());
    }

    let buf = block.data_mut();
    buf.fill(0);
    buf[..front.len()].copy_from_slice(&front);
    for (i, &pointer) in descriptor.pointers.iter().enumerate() {
        block.write_u32(FRONT_END + i * POINTER_SIZE, pointer);
    }
    block.write_u32(RECORD_COUNT_OFFSET, descriptor.record_count);
    Ok(())
}
