use thiserror::Error;

/// §7's `QueryExecutionError`: a live query's own re-execution failed. Surfaced on that
/// query's error channel only; sibling queries are unaffected.
#[derive(Debug, Error)]
pub enum QueryError {
    #[error("failed to re-execute query {query_id}: {source}")]
    Execution { query_id: u64, #[source] source: rusqlite::Error },

    #[error("key selector produced duplicate keys within one result set for query {query_id}")]
    DuplicateKey { query_id: u64 },
}
