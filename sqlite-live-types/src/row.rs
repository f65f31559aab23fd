use std::collections::BTreeMap;

use crate::value::{KeyAtom, Value};

/// A decoded row, restricted to whichever columns a table descriptor decided to cache.
/// Keyed by column name rather than position: the frame decoder never observes dropped
/// columns, so there is no fixed positional width to preserve.
pub type Row = BTreeMap<String, Value>;

/// Build a [`KeyAtom`] vector for `row` over the given ordered column list. Used by both the
/// column-list key selector and the diff engine's deep-equality fast path.
pub fn key_atoms(row: &Row, columns: &[String]) -> Vec<KeyAtom> {
    columns
        .iter()
        .map(|c| row.get(c).unwrap_or(&Value::Null).into())
        .collect()
}

/// Deep-equality between two rows over the full set of cached columns, using the same
/// typed comparison the diff engine relies on (so JSON-decoded text columns compare by
/// structure, not by raw string).
pub fn rows_equal(a: &Row, b: &Row) -> bool {
    a == b
}
