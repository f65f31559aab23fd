use crate::error::CodecError;
use crate::varint::read_varint;

/// A decoded table B-tree leaf cell (§4.1): `(rowid, local payload bytes, optional overflow
/// page number)`. When `overflow_page` is `Some`, the payload spilled past the page and the
/// bytes here are only the locally-stored prefix; callers must re-fetch the row from the live
/// database rather than chase the overflow chain (§9).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeafCell<'a> {
    pub rowid: i64,
    pub payload: &'a [u8],
    pub overflow_page: Option<u32>,
}

/// `usable_size` is the page size minus any reserved-per-page space (almost always 0, so
/// usable_size == page_size in practice, but PRAGMA page_size's reserved-bytes byte is honored
/// by the caller).
fn local_payload_size(payload_len: usize, usable_size: usize) -> usize {
    let max_local = usable_size - 35;
    if payload_len <= max_local {
        return payload_len;
    }
    let min_local = (usable_size - 12) * 32 / 255 - 23;
    let surplus = min_local + (payload_len - min_local) % (usable_size - 4);
    if surplus <= max_local {
        surplus
    } else {
        min_local
    }
}

/// Decode the leaf cell (page type 0x0D) starting at `cell_offset` within `page`.
pub fn decode_leaf_cell(page: &[u8], cell_offset: usize, usable_size: usize) -> Result<LeafCell<'_>, CodecError> {
    let buf = page.get(cell_offset..).ok_or(CodecError::TruncatedCell {
        offset: cell_offset,
        available: page.len().saturating_sub(cell_offset),
    })?;

    let (payload_len, len1) = read_varint(buf)?;
    let (rowid, len2) = read_varint(&buf[len1..])?;
    let header_len = len1 + len2;
    let payload_len = payload_len as usize;

    let local_len = local_payload_size(payload_len, usable_size);
    let available = buf.len().saturating_sub(header_len);
    if available < local_len {
        return Err(CodecError::TruncatedCell { offset: cell_offset, available });
    }

    let payload = &buf[header_len..header_len + local_len];
    let overflow_page = if local_len < payload_len {
        let tail = header_len + local_len;
        if buf.len() < tail + 4 {
            return Err(CodecError::TruncatedCell { offset: cell_offset, available: buf.len() - tail });
        }
        Some(u32::from_be_bytes(buf[tail..tail + 4].try_into().unwrap()))
    } else {
        None
    };

    Ok(LeafCell { rowid: rowid as i64, payload, overflow_page })
}
