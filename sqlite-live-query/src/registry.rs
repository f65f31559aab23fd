use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::RwLock;
use rusqlite::types::Value as SqlValue;
use sqlite_live_types::{Mutation, Row};

use crate::key::KeySelector;
use crate::trigger::Trigger;

/// A registered live query: its prepared-statement text, bound parameters, key selector,
/// triggers, last emitted result, and active flag (§3).
pub struct LiveQuery {
    pub id: u64,
    pub sql: String,
    pub params: Vec<SqlValue>,
    pub key_selector: KeySelector,
    pub triggers: Vec<Trigger>,
    last_result: RwLock<Option<Vec<Row>>>,
    active: AtomicBool,
}

impl LiveQuery {
    pub fn last_result(&self) -> Option<Vec<Row>> {
        self.last_result.read().clone()
    }

    pub fn set_last_result(&self, rows: Vec<Row>) {
        *self.last_result.write() = Some(rows);
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    fn deactivate(&self) {
        self.active.store(false, Ordering::SeqCst);
    }

    /// Triggers on `mutation`'s table whose predicate (if any) matches it, per §4.6.
    pub fn matching_triggers(&self, mutation: &Mutation) -> impl Iterator<Item = &Trigger> {
        self.triggers.iter().filter(move |t| t.matches(mutation))
    }
}

/// Holds all registered live queries, keyed by stable identifier (§4.7, §9's arena-style
/// ownership: the handle owns this map, each query holds only its id as a back-reference).
#[derive(Default)]
pub struct LiveQueryRegistry {
    queries: DashMap<u64, Arc<LiveQuery>>,
    next_id: AtomicU64,
}

impl LiveQueryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &self,
        sql: impl Into<String>,
        params: Vec<SqlValue>,
        key_selector: KeySelector,
        triggers: Vec<Trigger>,
    ) -> Arc<LiveQuery> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let query = Arc::new(LiveQuery {
            id,
            sql: sql.into(),
            params,
            key_selector,
            triggers,
            last_result: RwLock::new(None),
            active: AtomicBool::new(true),
        });
        self.queries.insert(id, query.clone());
        query
    }

    /// Stop a query: it is removed from the registry and becomes inert (§9).
    pub fn unregister(&self, id: u64) {
        if let Some((_, query)) = self.queries.remove(&id) {
            query.deactivate();
        }
    }

    pub fn get(&self, id: u64) -> Option<Arc<LiveQuery>> {
        self.queries.get(&id).map(|q| q.clone())
    }

    /// All active queries with at least one trigger on `table`.
    pub fn queries_for_table(&self, table: &str) -> Vec<Arc<LiveQuery>> {
        self.queries
            .iter()
            .filter(|entry| entry.value().is_active() && entry.value().triggers.iter().any(|t| t.table == table))
            .map(|entry| entry.value().clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.queries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queries.is_empty()
    }

    pub fn clear(&self) {
        for entry in self.queries.iter() {
            entry.value().deactivate();
        }
        self.queries.clear();
    }
}
