use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::Mutex;
use rusqlite::{Connection, OpenFlags};

use crate::error::EngineError;

/// A fixed-size set of read-only connections, checked out round-robin (§5: "the read pool is
/// used round-robin" for live-query re-execution so no single connection serializes every
/// query). Absent from `Settings`, the engine runs every read off the primary connection.
pub struct ConnectionPool {
    connections: Vec<Mutex<Connection>>,
    next: AtomicUsize,
}

impl ConnectionPool {
    pub fn open(path: &Path, size: usize) -> Result<Self, EngineError> {
        let mut connections = Vec::with_capacity(size);
        for _ in 0..size {
            let conn = Connection::open_with_flags(
                path,
                OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
            )
            .map_err(EngineError::Sqlite)?;
            connections.push(Mutex::new(conn));
        }
        Ok(ConnectionPool { connections, next: AtomicUsize::new(0) })
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    /// Run `f` against the next connection in round-robin order.
    pub fn with_connection<T>(
        &self,
        f: impl FnOnce(&Connection) -> Result<T, EngineError>,
    ) -> Result<T, EngineError> {
        if self.connections.is_empty() {
            return Err(EngineError::EmptyPool);
        }
        let index = self.next.fetch_add(1, Ordering::Relaxed) % self.connections.len();
        let guard = self.connections[index].lock();
        f(&guard)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_robins_across_checkouts() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("pool.db");
        Connection::open(&db_path).unwrap().execute_batch("CREATE TABLE t(x)").unwrap();

        let pool = ConnectionPool::open(&db_path, 3).unwrap();
        assert_eq!(pool.len(), 3);
        for _ in 0..6 {
            pool.with_connection(|conn| {
                conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0)).map_err(EngineError::Sqlite)
            })
            .unwrap();
        }
    }
}
