use thiserror::Error;

/// Errors from decoding the varint, record header, or leaf-cell encodings of §4.1.
/// Surfaces to callers as `CorruptFrame`-shaped failures (§4.5, §7's `WalParseError`).
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CodecError {
    #[error("buffer of {available} bytes too short to decode a varint")]
    TruncatedVarint { available: usize },

    #[error("buffer of {available} bytes too short to decode cell at offset {offset}")]
    TruncatedCell { offset: usize, available: usize },

    #[error("serial type {serial_type} is reserved and cannot appear in a record")]
    ReservedSerialType { serial_type: u64 },

    #[error("record header length {declared} exceeds payload length {payload_len}")]
    HeaderOverrunsPayload { declared: usize, payload_len: usize },

    #[error("column body at offset {offset} needs {needed} bytes but only {available} remain")]
    TruncatedColumnBody { offset: usize, needed: usize, available: usize },
}
