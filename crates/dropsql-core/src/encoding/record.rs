use crate::error::{Error, RecordError, SchemaError};
use crate::types::{ColumnDef, ColumnType, RECORD_ALIVE, RECORD_DEAD, Scalar};

/// Width of an encoded record: the liveness tag plus every fixed field.
pub fn record_width(columns: &[ColumnDef]) -> usize {
    1 + columns.iter().map(|c| c.ty.width()).sum::<usize>()
}

/// Check `values` against the column list.
///
/// Arity is checked first, then every field's dynamic type, then every
/// field's storage constraints.
pub fn validate_values(columns: &[ColumnDef], values: &[Scalar]) -> Result<(), Error> {
    if values.len() != columns.len() {
        return Err(SchemaError::ArityMismatch {
            expected: columns.len(),
            actual: values.len(),
        }
        .into());
    }

    for (column, value) in columns.iter().zip(values) {
        if !column.ty.accepts(value) {
            return Err(RecordError::TypeMismatch {
                column: column.name.clone(),
                expected: column.ty,
                actual: value.type_name(),
            }
            .into());
        }
    }

    for (column, value) in columns.iter().zip(values) {
        if let (ColumnType::VarChar(width), Scalar::VarChar(s)) = (column.ty, value) {
            if s.len() > width as usize {
                return Err(RecordError::ValueTooLong {
                    column: column.name.clone(),
                    width,
                    actual: s.len(),
                }
                .into());
            }
            if s.as_bytes().contains(&0) {
                return Err(RecordError::NulInVarChar {
                    column: column.name.clone(),
                }
                .into());
            }
        }
    }

    Ok(())
}

/// Encode a live record: `['a', field_0, field_1, ...]`.
///
/// Integer and Float fields are 4 bytes big-endian; VarChar fields are
/// UTF-8 zero-padded to the declared width.
pub fn encode_record(columns: &[ColumnDef], values: &[Scalar]) -> Result<Vec<u8>, Error> {
    validate_values(columns, values)?;

    let mut out = Vec::with_capacity(record_width(columns));
    out.push(RECORD_ALIVE);
    for (column, value) in columns.iter().zip(values) {
        match value {
            Scalar::Integer(v) => out.extend_from_slice(&v.to_be_bytes()),
            Scalar::Float(v) => out.extend_from_slice(&v.to_be_bytes()),
            Scalar::VarChar(s) => {
                let start = out.len();
                out.extend_from_slice(s.as_bytes());
                out.resize(start + column.ty.width(), 0);
            }
        }
    }
    Ok(out)
}

/// Decode the record at `index` from exactly `record_width(columns)` bytes.
pub fn decode_record(
    columns: &[ColumnDef],
    index: u32,
    bytes: &[u8],
) -> Result<Vec<Scalar>, RecordError> {
    debug_assert_eq!(bytes.len(), record_width(columns));

    match bytes[0] {
        RECORD_ALIVE => {}
        RECORD_DEAD => return Err(RecordError::Dead { index }),
        tag => return Err(RecordError::CorruptedTag { index, tag }),
    }

    let mut values = Vec::with_capacity(columns.len());
    let mut pos = 1;
    for column in columns {
        let width = column.ty.width();
        let field = &bytes[pos..pos + width];
        let value = match column.ty {
            ColumnType::Integer => Scalar::Integer(i32::from_be_bytes(word(field))),
            ColumnType::Float => Scalar::Float(f32::from_be_bytes(word(field))),
            ColumnType::VarChar(_) => {
                let end = field.iter().position(|&b| b == 0).unwrap_or(width);
                let s = std::str::from_utf8(&field[..end]).map_err(|_| {
                    RecordError::InvalidUtf8 {
                        column: column.name.clone(),
                    }
                })?;
                Scalar::VarChar(s.to_string())
            }
        };
        values.push(value);
        pos += width;
    }
    Ok(values)
}

fn word(field: &[u8]) -> [u8; 4] {
    let mut w = [0u8; 4];
    w.copy_from_slice(field);
    w
}
