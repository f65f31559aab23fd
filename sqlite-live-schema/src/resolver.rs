use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use rusqlite::Connection;
use sqlite_live_types::{quote_ident, Affinity, ColumnCacheSpec, ColumnInfo, TableDescriptor};
use tracing::debug;

use crate::error::SchemaError;

/// Maps B-tree root page numbers to tracked table names, and table names to their column
/// metadata, per §4.2. Entries are created lazily on first reference by a live query and are
/// never mutated afterward within a session (mid-session schema change is out of scope, §1).
#[derive(Default)]
pub struct SchemaResolver {
    root_to_table: RwLock<HashMap<u32, String>>,
    tables: RwLock<HashMap<String, Arc<TableDescriptor>>>,
}

impl SchemaResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached descriptor for `table`, querying the system catalog on first use.
    /// Idempotent: repeated calls for an already-resolved table are a cheap map lookup.
    pub fn ensure_table(
        &self,
        conn: &Connection,
        table: &str,
        cache_spec: &ColumnCacheSpec,
    ) -> Result<Arc<TableDescriptor>, SchemaError> {
        if let Some(existing) = self.tables.read().get(table) {
            return Ok(existing.clone());
        }

        let root_page: i64 = conn
            .query_row(
                "SELECT rootpage FROM sqlite_master WHERE type = 'table' AND name = ?1",
                [table],
                |row| row.get(0),
            )
            .map_err(|source| match source {
                rusqlite::Error::QueryReturnedNoRows => {
                    SchemaError::UnknownTable { table: table.to_string() }
                }
                other => SchemaError::Introspection { table: table.to_string(), source: other },
            })?;

        let pragma = format!("PRAGMA table_info({})", quote_ident(table));
        let mut stmt = conn
            .prepare(&pragma)
            .map_err(|source| SchemaError::Introspection { table: table.to_string(), source })?;
        let rows = stmt
            .query_map([], |row| {
                let name: String = row.get(1)?;
                let declared_type: String = row.get(2)?;
                let pk: i64 = row.get(5)?;
                Ok((name, declared_type, pk))
            })
            .map_err(|source| SchemaError::Introspection { table: table.to_string(), source })?;

        let mut columns = Vec::new();
        let mut pk_columns = Vec::new();
        for row in rows {
            let (name, declared_type, pk) =
                row.map_err(|source| SchemaError::Introspection { table: table.to_string(), source })?;
            let affinity = Affinity::from_declared_type(&declared_type);
            if pk > 0 {
                pk_columns.push((name.clone(), affinity));
            }
            columns.push(ColumnInfo { affinity, name });
        }

        // A lone `INTEGER PRIMARY KEY` column aliases `rowid`: SQLite stores it as a `NULL`
        // record entry on disk and the real value is the cell's rowid (§4.1). Composite
        // primary keys, or a non-integer-affinity single key, do not alias rowid.
        let rowid_alias = match pk_columns.as_slice() {
            [(name, Affinity::Integer)] => Some(name.clone()),
            _ => None,
        };

        let declared_names: Vec<String> = columns.iter().map(|c| c.name.clone()).collect();
        let cached_columns = cache_spec.resolve(&declared_names);

        let descriptor = Arc::new(TableDescriptor {
            name: table.to_string(),
            root_page: root_page as u32,
            columns,
            cached_columns,
            rowid_alias,
        });

        debug!(table, root_page, columns = descriptor.columns.len(), "resolved table schema");

        self.tables.write().insert(table.to_string(), descriptor.clone());
        self.root_to_table.write().insert(descriptor.root_page, table.to_string());

        Ok(descriptor)
    }

    /// Map a B-tree root page number to its owning table name. Returns `None` for pages the
    /// resolver has never bound, which the frame decoder treats as "ignore this page" (§4.2).
    pub fn lookup_by_page(&self, page: u32) -> Option<String> {
        self.root_to_table.read().get(&page).cloned()
    }

    pub fn table(&self, name: &str) -> Option<Arc<TableDescriptor>> {
        self.tables.read().get(name).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE players(id INTEGER PRIMARY KEY, name TEXT, password TEXT);")
            .unwrap();
        conn
    }

    #[test]
    fn resolves_root_page_and_columns() {
        let conn = setup();
        let resolver = SchemaResolver::new();
        let descriptor = resolver.ensure_table(&conn, "players", &ColumnCacheSpec::All).unwrap();
        assert_eq!(descriptor.name, "players");
        assert_eq!(descriptor.column_names(), vec!["id", "name", "password"]);
        assert_eq!(resolver.lookup_by_page(descriptor.root_page), Some("players".to_string()));
    }

    #[test]
    fn is_idempotent() {
        let conn = setup();
        let resolver = SchemaResolver::new();
        let a = resolver.ensure_table(&conn, "players", &ColumnCacheSpec::All).unwrap();
        let b = resolver.ensure_table(&conn, "players", &ColumnCacheSpec::All).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn honors_exclude_column_cache() {
        let conn = setup();
        let resolver = SchemaResolver::new();
        let descriptor = resolver
            .ensure_table(&conn, "players", &ColumnCacheSpec::Exclude(vec!["password".to_string()]))
            .unwrap();
        assert!(!descriptor.is_cached("password"));
        assert!(descriptor.is_cached("name"));
    }

    #[test]
    fn unknown_table_errors() {
        let conn = setup();
        let resolver = SchemaResolver::new();
        let err = resolver.ensure_table(&conn, "ghosts", &ColumnCacheSpec::All).unwrap_err();
        assert!(matches!(err, SchemaError::UnknownTable { .. }));
    }

    #[test]
    fn unknown_page_lookup_is_none() {
        let resolver = SchemaResolver::new();
        assert_eq!(resolver.lookup_by_page(999), None);
    }

    #[test]
    fn detects_integer_primary_key_as_rowid_alias() {
        let conn = setup();
        let resolver = SchemaResolver::new();
        let descriptor = resolver.ensure_table(&conn, "players", &ColumnCacheSpec::All).unwrap();
        assert_eq!(descriptor.rowid_alias, Some("id".to_string()));
    }

    #[test]
    fn text_primary_key_is_not_a_rowid_alias() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE accounts(uuid TEXT PRIMARY KEY, name TEXT);").unwrap();
        let resolver = SchemaResolver::new();
        let descriptor = resolver.ensure_table(&conn, "accounts", &ColumnCacheSpec::All).unwrap();
        assert_eq!(descriptor.rowid_alias, None);
    }

    #[test]
    fn composite_primary_key_is_not_a_rowid_alias() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE memberships(org_id INTEGER, user_id INTEGER, PRIMARY KEY(org_id, user_id));",
        )
        .unwrap();
        let resolver = SchemaResolver::new();
        let descriptor = resolver.ensure_table(&conn, "memberships", &ColumnCacheSpec::All).unwrap();
        assert_eq!(descriptor.rowid_alias, None);
    }
}
