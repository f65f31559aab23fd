use serde::{Deserialize, Serialize};

/// Declared SQLite column affinity, per the `sqlite_master`/`PRAGMA table_info` type string.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Affinity {
    Integer,
    Real,
    Text,
    Blob,
    Numeric,
}

impl Affinity {
    /// Map a declared-type string to an affinity using SQLite's type-affinity rules
    /// (first match wins, case-insensitive substring search).
    pub fn from_declared_type(declared: &str) -> Affinity {
        let ty = declared.to_ascii_uppercase();
        if ty.contains("INT") {
            Affinity::Integer
        } else if ty.contains("CHAR") || ty.contains("CLOB") || ty.contains("TEXT") {
            Affinity::Text
        } else if ty.contains("BLOB") || ty.is_empty() {
            Affinity::Blob
        } else if ty.contains("REAL") || ty.contains("FLOA") || ty.contains("DOUB") {
            Affinity::Real
        } else {
            Affinity::Numeric
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ColumnInfo {
    pub name: String,
    pub affinity: Affinity,
}

/// Everything the engine knows about a tracked table, fixed at first observation.
/// Per §3, never mutated after creation within a session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TableDescriptor {
    pub name: String,
    pub root_page: u32,
    pub columns: Vec<ColumnInfo>,
    pub cached_columns: Vec<String>,
    /// The single `INTEGER PRIMARY KEY` column, if any, that aliases `rowid`. SQLite stores
    /// such a column as a `NULL` record entry on disk since its value is the cell's rowid;
    /// the codec substitutes the cell's rowid back in when decoding this column.
    pub rowid_alias: Option<String>,
}

impl TableDescriptor {
    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    pub fn is_cached(&self, column: &str) -> bool {
        self.cached_columns.iter().any(|c| c == column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn affinity_from_declared_type() {
        assert_eq!(Affinity::from_declared_type("INTEGER PRIMARY KEY"), Affinity::Integer);
        assert_eq!(Affinity::from_declared_type("TEXT"), Affinity::Text);
        assert_eq!(Affinity::from_declared_type("BLOB"), Affinity::Blob);
        assert_eq!(Affinity::from_declared_type("REAL"), Affinity::Real);
        assert_eq!(Affinity::from_declared_type("NUMERIC(10,2)"), Affinity::Numeric);
        assert_eq!(Affinity::from_declared_type(""), Affinity::Blob);
    }
}
