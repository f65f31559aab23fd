use std::collections::HashMap;

use sqlite_live_types::Row;

use crate::key::{Key, KeySelector};

/// `added`/`changed`/`removed` row sequences between a query's prior and freshly executed
/// result (§4.8). Order within each sequence follows order of appearance in `new` (or `old`
/// for `removed`).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Diff {
    pub added: Vec<Row>,
    pub changed: Vec<Row>,
    pub removed: Vec<Row>,
}

impl Diff {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.changed.is_empty() && self.removed.is_empty()
    }
}

fn keyed(rows: &[Row], selector: &KeySelector) -> HashMap<Key, &Row> {
    rows.iter()
        .enumerate()
        .map(|(i, row)| (selector.key_for(row, i), row))
        .collect()
}

/// Compute the diff between `old` (absent on first execution) and `new` for a query using
/// `key_selector`. Per §4.8: if `old` is absent, everything in `new` counts as `added`.
pub fn compute_diff(old: Option<&[Row]>, new: &[Row], key_selector: &KeySelector) -> Diff {
    let Some(old) = old else {
        return Diff { added: new.to_vec(), changed: Vec::new(), removed: Vec::new() };
    };

    let old_by_key = keyed(old, key_selector);
    let new_by_key = keyed(new, key_selector);

    let mut added = Vec::new();
    let mut changed = Vec::new();
    for (i, row) in new.iter().enumerate() {
        let key = key_selector.key_for(row, i);
        match old_by_key.get(&key) {
            None => added.push(row.clone()),
            Some(old_row) => {
                if *old_row != row {
                    changed.push(row.clone());
                }
            }
        }
    }

    let mut removed = Vec::new();
    for (i, row) in old.iter().enumerate() {
        let key = key_selector.key_for(row, i);
        if !new_by_key.contains_key(&key) {
            removed.push(row.clone());
        }
    }

    Diff { added, changed, removed }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlite_live_types::Value;

    fn row(id: i64, name: &str) -> Row {
        let mut r = Row::new();
        r.insert("id".to_string(), Value::Integer(id));
        r.insert("name".to_string(), Value::Text(name.to_string()));
        r
    }

    fn by_id() -> KeySelector {
        KeySelector::Columns(vec!["id".to_string()])
    }

    #[test]
    fn first_execution_everything_is_added() {
        let new = vec![row(11, "Alice")];
        let diff = compute_diff(None, &new, &by_id());
        assert_eq!(diff.added, new);
        assert!(diff.changed.is_empty());
        assert!(diff.removed.is_empty());
    }

    #[test]
    fn insert_update_delete_scenario() {
        let selector = by_id();

        let diff = compute_diff(Some(&[]), &[row(11, "Alice")], &selector);
        assert_eq!(diff.added, vec![row(11, "Alice")]);

        let diff = compute_diff(Some(&[row(11, "Alice")]), &[row(11, "Bob")], &selector);
        assert_eq!(diff.changed, vec![row(11, "Bob")]);
        assert!(diff.added.is_empty());
        assert!(diff.removed.is_empty());

        let diff = compute_diff(Some(&[row(11, "Bob")]), &[], &selector);
        assert_eq!(diff.removed, vec![row(11, "Bob")]);
    }

    #[test]
    fn diff_idempotence() {
        let rows = vec![row(1, "a"), row(2, "b")];
        let diff = compute_diff(Some(&rows), &rows, &by_id());
        assert!(diff.is_empty());
    }

    #[test]
    fn order_follows_new_result_order() {
        let old = vec![row(1, "a")];
        let new = vec![row(2, "b"), row(3, "c")];
        let diff = compute_diff(Some(&old), &new, &by_id());
        assert_eq!(diff.added, vec![row(2, "b"), row(3, "c")]);
    }
}
