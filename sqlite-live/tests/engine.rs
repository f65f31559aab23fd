use rusqlite::Connection;
use sqlite_live::{Database, KeySelector, QueryEvent, Settings, Trigger, Value};

fn writer_connection(path: &std::path::Path) -> Connection {
    let conn = Connection::open(path).unwrap();
    conn.pragma_update(None, "journal_mode", "WAL").unwrap();
    conn
}

#[tokio::test]
async fn tracks_inserts_updates_and_deletes_through_the_wal() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("app.db");

    let writer = writer_connection(&db_path);
    writer
        .execute_batch(
            "CREATE TABLE players(id INTEGER PRIMARY KEY, name TEXT);
             INSERT INTO players(id, name) VALUES (1, 'Alice');",
        )
        .unwrap();

    let settings = Settings::new(db_path.clone());
    let (db, mut ready_rx, mut error_rx) = Database::construct(settings).unwrap();
    ready_rx.recv().await.expect("construct emits ready");

    let mut handle = db
        .select(
            "SELECT id, name FROM players ORDER BY id",
            vec![],
            KeySelector::Columns(vec!["id".to_string()]),
            vec![Trigger::always("players")],
        )
        .unwrap();

    let initial = match handle.recv().await.unwrap() {
        QueryEvent::Update { diff, full_result } => {
            assert_eq!(diff.added.len(), 1);
            full_result
        }
        QueryEvent::Error(err) => panic!("unexpected error: {err}"),
    };
    assert_eq!(initial[0].get("name"), Some(&Value::Text("Alice".to_string())));

    writer.execute("INSERT INTO players(id, name) VALUES (2, 'Bob')", []).unwrap();
    db.process_once().await.unwrap();

    match handle.recv().await.unwrap() {
        QueryEvent::Update { diff, .. } => {
            assert_eq!(diff.added.len(), 1);
            assert_eq!(diff.added[0].get("id"), Some(&Value::Integer(2)));
        }
        QueryEvent::Error(err) => panic!("unexpected error: {err}"),
    }

    writer.execute("UPDATE players SET name = 'Bobby' WHERE id = 2", []).unwrap();
    db.process_once().await.unwrap();

    match handle.recv().await.unwrap() {
        QueryEvent::Update { diff, .. } => {
            assert_eq!(diff.changed.len(), 1);
            assert_eq!(diff.changed[0].get("name"), Some(&Value::Text("Bobby".to_string())));
        }
        QueryEvent::Error(err) => panic!("unexpected error: {err}"),
    }

    writer.execute("DELETE FROM players WHERE id = 1", []).unwrap();
    db.process_once().await.unwrap();

    match handle.recv().await.unwrap() {
        QueryEvent::Update { diff, .. } => {
            assert_eq!(diff.removed.len(), 1);
            assert_eq!(diff.removed[0].get("id"), Some(&Value::Integer(1)));
        }
        QueryEvent::Error(err) => panic!("unexpected error: {err}"),
    }

    assert!(error_rx.try_recv().is_err());

    handle.stop();
    db.end();
}

#[tokio::test]
async fn pause_suppresses_processing_until_resume() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("app.db");

    let writer = writer_connection(&db_path);
    writer.execute_batch("CREATE TABLE counters(id INTEGER PRIMARY KEY, value INTEGER);").unwrap();

    let settings = Settings::new(db_path.clone());
    let (db, mut ready_rx, _error_rx) = Database::construct(settings).unwrap();
    ready_rx.recv().await.unwrap();

    let mut handle = db
        .select(
            "SELECT id, value FROM counters",
            vec![],
            KeySelector::Columns(vec!["id".to_string()]),
            vec![Trigger::always("counters")],
        )
        .unwrap();

    db.pause();
    writer.execute("INSERT INTO counters(id, value) VALUES (1, 10)", []).unwrap();
    db.process_once().await.unwrap();
    assert!(handle.try_recv().is_err());

    db.resume();
    db.process_once().await.unwrap();
    match handle.recv().await.unwrap() {
        QueryEvent::Update { diff, .. } => assert_eq!(diff.added.len(), 1),
        QueryEvent::Error(err) => panic!("unexpected error: {err}"),
    }
}
