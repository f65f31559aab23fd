use std::sync::Arc;

use sqlite_live_types::{Mutation, MutationKind, Row};

/// A `(table name, optional predicate)` pair directing when a mutation should invalidate a
/// query (§3, §4.6). Unrelated to database-side triggers. The predicate receives `(new row,
/// old row, was_deleted)`.
#[derive(Clone)]
pub struct Trigger {
    pub table: String,
    pub predicate: Option<Arc<dyn Fn(Option<&Row>, Option<&Row>, bool) -> bool + Send + Sync>>,
}

impl std::fmt::Debug for Trigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Trigger")
            .field("table", &self.table)
            .field("predicate", &self.predicate.as_ref().map(|_| "Fn(..)"))
            .finish()
    }
}

impl Trigger {
    pub fn always(table: impl Into<String>) -> Self {
        Trigger { table: table.into(), predicate: None }
    }

    pub fn when(
        table: impl Into<String>,
        predicate: impl Fn(Option<&Row>, Option<&Row>, bool) -> bool + Send + Sync + 'static,
    ) -> Self {
        Trigger { table: table.into(), predicate: Some(Arc::new(predicate)) }
    }

    /// Whether `mutation` can affect a query carrying this trigger, per §4.6: matches on
    /// table first, then defers to the predicate (absent predicate always matches).
    pub fn matches(&self, mutation: &Mutation) -> bool {
        if self.table != mutation.table {
            return false;
        }
        match &self.predicate {
            None => true,
            Some(predicate) => predicate(
                mutation.new.as_ref(),
                mutation.old.as_ref(),
                mutation.kind == MutationKind::Delete,
            ),
        }
    }
}
