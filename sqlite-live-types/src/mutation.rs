use crate::row::Row;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationKind {
    Insert,
    Update,
    Delete,
}

/// `(table, rowid, kind, old row or null, new row or null)` from §3. Construction is through
/// the named constructors below so the invariant (`insert` has null old, `delete` has null
/// new, `update` has both) can't be violated by callers.
#[derive(Debug, Clone, PartialEq)]
pub struct Mutation {
    pub table: String,
    pub rowid: i64,
    pub kind: MutationKind,
    pub old: Option<Row>,
    pub new: Option<Row>,
}

impl Mutation {
    pub fn insert(table: impl Into<String>, rowid: i64, new: Row) -> Self {
        Mutation { table: table.into(), rowid, kind: MutationKind::Insert, old: None, new: Some(new) }
    }

    pub fn update(table: impl Into<String>, rowid: i64, old: Row, new: Row) -> Self {
        Mutation { table: table.into(), rowid, kind: MutationKind::Update, old: Some(old), new: Some(new) }
    }

    pub fn delete(table: impl Into<String>, rowid: i64, old: Row) -> Self {
        Mutation { table: table.into(), rowid, kind: MutationKind::Delete, old: Some(old), new: None }
    }
}

/// A row freshly decoded from a WAL page, or a tombstone inferred from its disappearance.
/// Input to the mutation applicator (§4.6), distinct from [`Mutation`] which is its output.
#[derive(Debug, Clone, PartialEq)]
pub enum IncomingRow {
    Present(Row),
    Tombstone,
}
