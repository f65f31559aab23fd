use std::sync::Arc;

use sqlite_live_types::{key_atoms, KeyAtom, Row};

pub type Key = Vec<KeyAtom>;

/// §4.7's polymorphic key selector, modeled as a tagged variant rather than inheritance so
/// the diff engine can dispatch on it directly.
#[derive(Clone)]
pub enum KeySelector {
    /// The row's position in the result sequence.
    Index,
    /// A tuple of declared columns, compared by value equality.
    Columns(Vec<String>),
    /// A user-supplied function from row to a hashable/comparable key atom.
    Custom(Arc<dyn Fn(&Row) -> KeyAtom + Send + Sync>),
}

impl std::fmt::Debug for KeySelector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            KeySelector::Index => write!(f, "KeySelector::Index"),
            KeySelector::Columns(cols) => write!(f, "KeySelector::Columns({cols:?})"),
            KeySelector::Custom(_) => write!(f, "KeySelector::Custom(..)"),
        }
    }
}

impl KeySelector {
    pub fn key_for(&self, row: &Row, index: usize) -> Key {
        match self {
            KeySelector::Index => vec![KeyAtom::Integer(index as i64)],
            KeySelector::Columns(columns) => key_atoms(row, columns),
            KeySelector::Custom(f) => vec![f(row)],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlite_live_types::Value;

    fn row(id: i64) -> Row {
        let mut r = Row::new();
        r.insert("id".to_string(), Value::Integer(id));
        r
    }

    #[test]
    fn index_key_is_position() {
        let sel = KeySelector::Index;
        assert_eq!(sel.key_for(&row(1), 3), vec![KeyAtom::Integer(3)]);
    }

    #[test]
    fn column_key_pulls_named_columns() {
        let sel = KeySelector::Columns(vec!["id".to_string()]);
        assert_eq!(sel.key_for(&row(11), 0), vec![KeyAtom::Integer(11)]);
    }

    #[test]
    fn custom_key_invokes_closure() {
        let sel = KeySelector::Custom(Arc::new(|r: &Row| {
            r.get("id").map(KeyAtom::from).unwrap_or(KeyAtom::Null)
        }));
        assert_eq!(sel.key_for(&row(11), 0), vec![KeyAtom::Integer(11)]);
    }
}
