use serde::{Deserialize, Serialize};

/// A single cell value as decoded from a SQLite record, or re-typed by JSON affinity.
///
/// Storage classes follow SQLite: `Null`, `Integer`, `Real`, `Text`, `Blob`. `Json` is not a
/// SQLite storage class; it replaces `Text` once the text has been confirmed to parse as JSON
/// (see [`apply_json_affinity`]).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum Value {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
    Json(serde_json::Value),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

/// If `value` is `Text` and the text parses as JSON, replace it with the parsed structure.
/// Any other variant, or text that fails to parse, is returned unchanged.
pub fn apply_json_affinity(value: Value) -> Value {
    match value {
        Value::Text(s) => match serde_json::from_str::<serde_json::Value>(&s) {
            Ok(parsed) => Value::Json(parsed),
            Err(_) => Value::Text(s),
        },
        other => other,
    }
}

/// A hashable, totally-ordered-enough projection of [`Value`] used as a diff/key-selector atom.
/// `Real` is bit-cast so that `f64`, which is not `Eq`/`Hash`, can still participate in keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum KeyAtom {
    Null,
    Integer(i64),
    Real(u64),
    Text(String),
    Blob(Vec<u8>),
    Json(String),
}

impl From<&Value> for KeyAtom {
    fn from(value: &Value) -> Self {
        match value {
            Value::Null => KeyAtom::Null,
            Value::Integer(i) => KeyAtom::Integer(*i),
            Value::Real(r) => KeyAtom::Real(r.to_bits()),
            Value::Text(s) => KeyAtom::Text(s.clone()),
            Value::Blob(b) => KeyAtom::Blob(b.clone()),
            // canonicalized via serde_json's own key ordering for objects
            Value::Json(j) => KeyAtom::Json(j.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_affinity_replaces_valid_json_text() {
        let v = apply_json_affinity(Value::Text("{\"age\":30}".to_string()));
        assert_eq!(v, Value::Json(serde_json::json!({"age": 30})));
    }

    #[test]
    fn json_affinity_leaves_invalid_json_untouched() {
        let v = apply_json_affinity(Value::Text("not json".to_string()));
        assert_eq!(v, Value::Text("not json".to_string()));
    }

    #[test]
    fn json_affinity_leaves_non_text_untouched() {
        let v = apply_json_affinity(Value::Integer(42));
        assert_eq!(v, Value::Integer(42));
    }

    #[test]
    fn key_atom_hashes_equal_reals_equal() {
        let a: KeyAtom = (&Value::Real(1.5)).into();
        let b: KeyAtom = (&Value::Real(1.5)).into();
        assert_eq!(a, b);
    }
}
