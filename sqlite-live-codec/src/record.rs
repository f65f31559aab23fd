use sqlite_live_types::{apply_json_affinity, Row, TableDescriptor, Value};

use crate::error::CodecError;
use crate::varint::read_varint;

/// A column's serial type from a record header, per §4.1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SerialType {
    Null,
    Int8,
    Int16,
    Int24,
    Int32,
    Int48,
    Int64,
    Real,
    Zero,
    One,
    Text(usize),
    Blob(usize),
}

impl SerialType {
    pub fn from_code(code: u64) -> Result<SerialType, CodecError> {
        Ok(match code {
            0 => SerialType::Null,
            1 => SerialType::Int8,
            2 => SerialType::Int16,
            3 => SerialType::Int24,
            4 => SerialType::Int32,
            5 => SerialType::Int48,
            6 => SerialType::Int64,
            7 => SerialType::Real,
            8 => SerialType::Zero,
            9 => SerialType::One,
            10 | 11 => return Err(CodecError::ReservedSerialType { serial_type: code }),
            n if n >= 12 && n % 2 == 0 => SerialType::Blob(((n - 12) / 2) as usize),
            n => SerialType::Text(((n - 13) / 2) as usize),
        })
    }

    pub fn size(&self) -> usize {
        match self {
            SerialType::Null | SerialType::Zero | SerialType::One => 0,
            SerialType::Int8 => 1,
            SerialType::Int16 => 2,
            SerialType::Int24 => 3,
            SerialType::Int32 => 4,
            SerialType::Int48 => 6,
            SerialType::Int64 | SerialType::Real => 8,
            SerialType::Text(n) | SerialType::Blob(n) => *n,
        }
    }
}

/// Read the record header: a header-length varint followed by one serial-type varint per
/// column, in declaration order. Returns `(header_len_in_bytes, serial_types)`.
pub fn read_record_header(payload: &[u8]) -> Result<(usize, Vec<SerialType>), CodecError> {
    let (header_len, mut consumed) = read_varint(payload)?;
    let header_len = header_len as usize;
    if header_len > payload.len() {
        return Err(CodecError::HeaderOverrunsPayload { declared: header_len, payload_len: payload.len() });
    }
    let mut serial_types = Vec::new();
    while consumed < header_len {
        let (code, len) = read_varint(&payload[consumed..])?;
        serial_types.push(SerialType::from_code(code)?);
        consumed += len;
    }
    Ok((header_len, serial_types))
}

fn decode_int(buf: &[u8], width: usize) -> i64 {
    let mut bytes = [0u8; 8];
    if buf[0] & 0x80 != 0 {
        for b in bytes.iter_mut().take(8 - width) {
            *b = 0xff;
        }
    }
    bytes[8 - width..].copy_from_slice(buf);
    i64::from_be_bytes(bytes)
}

fn decode_column_value(st: SerialType, buf: &[u8]) -> Value {
    match st {
        SerialType::Null => Value::Null,
        SerialType::Zero => Value::Integer(0),
        SerialType::One => Value::Integer(1),
        SerialType::Int8 => Value::Integer(decode_int(buf, 1)),
        SerialType::Int16 => Value::Integer(decode_int(buf, 2)),
        SerialType::Int24 => Value::Integer(decode_int(buf, 3)),
        SerialType::Int32 => Value::Integer(decode_int(buf, 4)),
        SerialType::Int48 => Value::Integer(decode_int(buf, 6)),
        SerialType::Int64 => Value::Integer(i64::from_be_bytes(buf.try_into().unwrap())),
        SerialType::Real => Value::Real(f64::from_bits(u64::from_be_bytes(buf.try_into().unwrap()))),
        SerialType::Text(n) => {
            let text = String::from_utf8_lossy(&buf[..n]).into_owned();
            apply_json_affinity(Value::Text(text))
        }
        SerialType::Blob(n) => Value::Blob(buf[..n].to_vec()),
    }
}

/// Decode a record body into a [`Row`] holding only the table descriptor's cached columns.
/// Untracked columns are skipped by advancing past their serial-type size without
/// materializing a value, per §4.1. `rowid` is the cell's own rowid: SQLite stores an
/// `INTEGER PRIMARY KEY` column that aliases `rowid` as a `NULL` record entry, so that
/// column's value is substituted from `rowid` rather than from the decoded serial type.
pub fn decode_row(payload: &[u8], descriptor: &TableDescriptor, rowid: i64) -> Result<Row, CodecError> {
    let (header_len, serial_types) = read_record_header(payload)?;
    let mut offset = header_len;
    let mut row = Row::new();
    for (column, st) in descriptor.columns.iter().zip(serial_types.iter()) {
        let size = st.size();
        if offset + size > payload.len() {
            return Err(CodecError::TruncatedColumnBody {
                offset,
                needed: size,
                available: payload.len().saturating_sub(offset),
            });
        }
        if descriptor.is_cached(&column.name) {
            let value = if descriptor.rowid_alias.as_deref() == Some(column.name.as_str()) {
                Value::Integer(rowid)
            } else {
                decode_column_value(*st, &payload[offset..offset + size])
            };
            row.insert(column.name.clone(), value);
        }
        offset += size;
    }
    Ok(row)
}
