use dashmap::DashMap;
use rusqlite::types::ValueRef;
use rusqlite::Connection;
use sqlite_live_types::{apply_json_affinity, quote_ident, IncomingRow, Mutation, Row, TableDescriptor, Value};
use tracing::debug;

use crate::error::CacheError;

fn value_from_ref(v: ValueRef<'_>) -> Value {
    match v {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::Integer(i),
        ValueRef::Real(f) => Value::Real(f),
        ValueRef::Text(t) => apply_json_affinity(Value::Text(String::from_utf8_lossy(t).into_owned())),
        ValueRef::Blob(b) => Value::Blob(b.to_vec()),
    }
}

/// Per-table, rowid-keyed snapshot of the columns the engine tracks (§4.3). Only cached
/// columns are ever keys of a stored row; a rowid absent from a table's map means either
/// never-seen or deleted.
#[derive(Default)]
pub struct SnapshotStore {
    tables: DashMap<String, DashMap<i64, Row>>,
    loaded: DashMap<String, ()>,
}

impl SnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the current rows for `descriptor`'s cached columns into memory. Idempotent: a
    /// second call for the same table is a no-op.
    pub fn ensure_cached(&self, conn: &Connection, descriptor: &TableDescriptor) -> Result<(), CacheError> {
        if self.loaded.contains_key(&descriptor.name) {
            return Ok(());
        }

        let column_list = descriptor
            .cached_columns
            .iter()
            .map(|c| quote_ident(c))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = if column_list.is_empty() {
            format!("SELECT rowid FROM {}", quote_ident(&descriptor.name))
        } else {
            format!("SELECT rowid, {} FROM {}", column_list, quote_ident(&descriptor.name))
        };

        let table_map: DashMap<i64, Row> = DashMap::new();
        let map_err = |source| CacheError::InitialLoad { table: descriptor.name.clone(), source };

        let mut stmt = conn.prepare(&sql).map_err(map_err)?;
        let cached_columns = descriptor.cached_columns.clone();
        let rows = stmt
            .query_map([], move |sql_row| {
                let rowid: i64 = sql_row.get(0)?;
                let mut row = Row::new();
                for (i, name) in cached_columns.iter().enumerate() {
                    let value = value_from_ref(sql_row.get_ref(i + 1)?);
                    row.insert(name.clone(), value);
                }
                Ok((rowid, row))
            })
            .map_err(map_err)?;

        for entry in rows {
            let (rowid, row) = entry.map_err(map_err)?;
            table_map.insert(rowid, row);
        }

        debug!(table = %descriptor.name, rows = table_map.len(), "materialized table snapshot");
        self.tables.insert(descriptor.name.clone(), table_map);
        self.loaded.insert(descriptor.name.clone(), ());
        Ok(())
    }

    pub fn get(&self, table: &str, rowid: i64) -> Option<Row> {
        self.tables.get(table).and_then(|m| m.get(&rowid).map(|r| r.clone()))
    }

    pub fn rowids(&self, table: &str) -> Vec<i64> {
        self.tables.get(table).map(|m| m.iter().map(|e| *e.key()).collect()).unwrap_or_default()
    }

    /// Drop every cached table and loaded-marker, as on engine shutdown (§5).
    pub fn clear(&self) {
        self.tables.clear();
        self.loaded.clear();
    }

    /// Apply an incoming row or tombstone for `(table, rowid)` and return the resulting
    /// [`Mutation`], or `None` when a tombstone arrives for a rowid the store never held
    /// (§4.6: "if tombstone and not in store, ignore").
    pub fn apply(&self, table: &str, rowid: i64, incoming: IncomingRow) -> Option<Mutation> {
        let map = self.tables.entry(table.to_string()).or_default();
        match incoming {
            IncomingRow::Present(new) => {
                let old = map.insert(rowid, new.clone());
                Some(match old {
                    Some(old) => Mutation::update(table, rowid, old, new),
                    None => Mutation::insert(table, rowid, new),
                })
            }
            IncomingRow::Tombstone => map.remove(&rowid).map(|(_, old)| Mutation::delete(table, rowid, old)),
        }
    }
}
