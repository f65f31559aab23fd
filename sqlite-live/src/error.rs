use thiserror::Error;

use sqlite_live_cache::CacheError;
use sqlite_live_schema::SchemaError;
use sqlite_live_wal::WalError;
use sqlite_live_query::QueryError;

/// Top-level error umbrella, composed from each lower crate's own error type via `#[from]`
/// (§7). Schema/cache failures during `select` surface synchronously through this type;
/// WAL-processing and per-query execution failures are instead emitted on the relevant
/// error channel and never reach a caller through a `Result`.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Cache(#[from] CacheError),

    #[error(transparent)]
    Wal(#[from] WalError),

    #[error(transparent)]
    Query(#[from] QueryError),

    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("io error opening {path}: {source}")]
    Io { path: String, #[source] source: std::io::Error },

    #[error("connection pool is empty")]
    EmptyPool,

    #[error("unknown live query id {0}")]
    UnknownQuery(u64),
}
