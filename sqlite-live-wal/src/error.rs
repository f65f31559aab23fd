use thiserror::Error;

/// §7's `WalProcessError` and `WalParseError` (the latter covering what spec.md calls
/// `CorruptFrame`).
#[derive(Debug, Error)]
pub enum WalError {
    #[error("failed to stat or read WAL file {path}: {source}")]
    Process { path: String, #[source] source: std::io::Error },

    #[error("WAL header truncated: {available} bytes available, 32 required")]
    TruncatedHeader { available: usize },

    #[error("WAL header magic {0:#x} is not a recognized SQLite WAL magic number")]
    BadMagic(u32),

    #[error("frame header truncated at byte offset {offset}")]
    TruncatedFrameHeader { offset: usize },

    #[error("frame payload truncated at byte offset {offset}: needed {needed}, had {available}")]
    TruncatedFramePayload { offset: usize, needed: usize, available: usize },

    #[error("corrupt cell or record in page {page}: {source}")]
    CorruptFrame { page: u32, #[source] source: sqlite_live_codec::CodecError },

    #[error("row refetch from live database failed for {table}:{rowid}: {source}")]
    Refetch { table: String, rowid: i64, #[source] source: rusqlite::Error },

    #[error("failed to install filesystem watcher: {source}")]
    Watch { #[source] source: notify::Error },
}
