use thiserror::Error;

/// §7's `CacheTableError`: the initial full-table load into memory failed.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("failed to materialize table {table:?} into the snapshot store: {source}")]
    InitialLoad { table: String, #[source] source: rusqlite::Error },
}
