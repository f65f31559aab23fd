use thiserror::Error;

/// §7's `CacheTableInfoError`: schema introspection against the live database failed.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("table {table:?} not found in sqlite_master")]
    UnknownTable { table: String },

    #[error("failed to introspect table {table:?}: {source}")]
    Introspection { table: String, #[source] source: rusqlite::Error },
}
