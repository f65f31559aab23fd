use rusqlite::types::{Value as SqlValue, ValueRef};
use rusqlite::Connection;
use sqlite_live_types::{apply_json_affinity, Row, Value};

use crate::error::EngineError;

fn value_from_ref(v: ValueRef<'_>) -> Value {
    match v {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::Integer(i),
        ValueRef::Real(f) => Value::Real(f),
        ValueRef::Text(t) => apply_json_affinity(Value::Text(String::from_utf8_lossy(t).into_owned())),
        ValueRef::Blob(b) => Value::Blob(b.to_vec()),
    }
}

/// Run an arbitrary caller-supplied `SELECT` and decode its result set into [`Row`]s keyed by
/// column name, applying JSON affinity the same way the snapshot store does (§6: the emitted
/// rows of a live query go through the same affinity rules as cached columns).
pub fn run_query(conn: &Connection, sql: &str, params: &[SqlValue]) -> Result<Vec<Row>, EngineError> {
    let mut stmt = conn.prepare(sql).map_err(EngineError::Sqlite)?;
    let column_names: Vec<String> = stmt.column_names().iter().map(|s| s.to_string()).collect();
    let param_refs: Vec<&dyn rusqlite::ToSql> = params.iter().map(|p| p as &dyn rusqlite::ToSql).collect();

    let rows = stmt
        .query_map(param_refs.as_slice(), |sql_row| {
            let mut row = Row::new();
            for (i, name) in column_names.iter().enumerate() {
                row.insert(name.clone(), value_from_ref(sql_row.get_ref(i)?));
            }
            Ok(row)
        })
        .map_err(EngineError::Sqlite)?;

    rows.collect::<Result<Vec<_>, _>>().map_err(EngineError::Sqlite)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_columns_by_name_with_json_affinity() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE players(id INTEGER PRIMARY KEY, profile TEXT);
             INSERT INTO players(id, profile) VALUES (1, '{\"level\":4}');",
        )
        .unwrap();

        let rows = run_query(&conn, "SELECT id, profile FROM players", &[]).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get("id"), Some(&Value::Integer(1)));
        assert_eq!(rows[0].get("profile"), Some(&Value::Json(serde_json::json!({"level": 4}))));
    }
}
