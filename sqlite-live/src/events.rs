use sqlite_live_types::Row;
use sqlite_live_query::{Diff, QueryError};

/// Emitted once on the channel returned by [`crate::Database::construct`] when initial setup
/// (opening the primary connection and, if configured, the read pool) has completed (§6).
#[derive(Debug, Clone, Copy)]
pub struct Ready;

/// Events delivered on a [`crate::LiveQueryHandle`]'s channel (§6: `update(diff, full-result)`
/// and `error(err)`).
#[derive(Debug)]
pub enum QueryEvent {
    Update { diff: Diff, full_result: Vec<Row> },
    Error(QueryError),
}
