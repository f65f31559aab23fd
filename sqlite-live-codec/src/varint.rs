use crate::error::CodecError;

/// Decode a SQLite-style packed integer: up to 9 bytes, continuation bit (MSB) set on every
/// byte but the last of the first eight, 7 payload bits per byte big-endian; if all eight
/// carry a continuation bit the ninth byte contributes all 8 of its bits with no continuation
/// check. Returns `(value, bytes consumed)`.
pub fn read_varint(buf: &[u8]) -> Result<(u64, usize), CodecError> {
    let mut result: u64 = 0;
    for i in 0..8 {
        let byte = *buf
            .get(i)
            .ok_or(CodecError::TruncatedVarint { available: buf.len() })?;
        result = (result << 7) | u64::from(byte & 0x7f);
        if byte & 0x80 == 0 {
            return Ok((result, i + 1));
        }
    }
    let byte = *buf
        .get(8)
        .ok_or(CodecError::TruncatedVarint { available: buf.len() })?;
    result = (result << 8) | u64::from(byte);
    Ok((result, 9))
}

/// Like [`read_varint`] but discards the value, for skipping untracked columns.
pub fn skip_varint(buf: &[u8]) -> Result<usize, CodecError> {
    read_varint(buf).map(|(_, len)| len)
}
