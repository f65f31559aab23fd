use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use parking_lot::Mutex;
use rusqlite::types::Value as SqlValue;
use rusqlite::Connection;
use tokio::sync::mpsc;
use tracing::{debug, error, warn};

use sqlite_live_cache::SnapshotStore;
use sqlite_live_query::{
    compute_diff, FiringPolicy, KeySelector, LiveQuery, LiveQueryRegistry, QueryError, Trigger,
    UpdateScheduler,
};
use sqlite_live_schema::SchemaResolver;
use sqlite_live_types::Settings;
use sqlite_live_wal::{decode_and_apply, WalObserver, WalWatcher};

use crate::error::EngineError;
use crate::events::{QueryEvent, Ready};
use crate::handle::LiveQueryHandle;
use crate::pool::ConnectionPool;
use crate::rows::run_query;

/// Fallback spacing between WAL growth-observation passes when [`Database::run`] hasn't heard
/// from the filesystem watcher in a while — a safety net for editors/tools that write the WAL
/// in ways `notify` doesn't surface promptly, not the primary wakeup source (§2.5).
const POLL_INTERVAL: Duration = Duration::from_millis(50);

struct Inner {
    settings: Settings,
    primary: Mutex<Connection>,
    pool: Option<ConnectionPool>,
    resolver: SchemaResolver,
    snapshot: SnapshotStore,
    observer: WalObserver,
    registry: LiveQueryRegistry,
    scheduler: UpdateScheduler,
    channels: DashMap<u64, mpsc::Sender<QueryEvent>>,
    error_tx: mpsc::Sender<EngineError>,
    _watcher: Option<WalWatcher>,
    wal_notify: tokio::sync::Mutex<mpsc::Receiver<()>>,
}

/// The engine's public handle (§3). Cheap to clone: every clone shares the same underlying
/// connections, snapshot store, and registry. The single-threaded cooperative executor of §5
/// is realized as the [`Database::run`] loop plus the synchronous sections guarded by
/// `primary`'s mutex and the registry/snapshot's own internal concurrency.
#[derive(Clone)]
pub struct Database {
    inner: Arc<Inner>,
}

impl Database {
    /// Open the primary connection, the read pool (if configured), and emit `ready` once
    /// setup completes (§6).
    pub fn construct(
        settings: Settings,
    ) -> Result<(Database, mpsc::Receiver<Ready>, mpsc::Receiver<EngineError>), EngineError> {
        let primary = Connection::open(&settings.filename).map_err(EngineError::Sqlite)?;
        primary.pragma_update(None, "journal_mode", "WAL").map_err(EngineError::Sqlite)?;

        let pool = match &settings.pool {
            Some(cfg) => Some(ConnectionPool::open(&settings.filename, cfg.size)?),
            None => None,
        };

        let policy = if settings.check_condition_when_queued {
            FiringPolicy::RecheckOnEachFiring
        } else {
            FiringPolicy::CoalesceSilently
        };
        let scheduler = UpdateScheduler::new(settings.min_interval_ms, policy);
        let observer = WalObserver::new(settings.wal_path());

        let (error_tx, error_rx) = mpsc::channel(32);
        let (ready_tx, ready_rx) = mpsc::channel(1);
        let (notify_tx, notify_rx) = mpsc::channel(8);

        let watcher = match WalWatcher::spawn(settings.wal_path(), notify_tx) {
            Ok(watcher) => Some(watcher),
            Err(err) => {
                warn!(error = %err, "filesystem watcher unavailable, falling back to polling only");
                None
            }
        };

        let inner = Arc::new(Inner {
            settings,
            primary: Mutex::new(primary),
            pool,
            resolver: SchemaResolver::new(),
            snapshot: SnapshotStore::new(),
            observer,
            registry: LiveQueryRegistry::new(),
            scheduler,
            channels: DashMap::new(),
            error_tx,
            _watcher: watcher,
            wal_notify: tokio::sync::Mutex::new(notify_rx),
        });

        let _ = ready_tx.try_send(Ready);
        debug!("engine constructed");
        Ok((Database { inner }, ready_rx, error_rx))
    }

    /// Register a new live query (§3, §4.7): resolves and caches every trigger's table,
    /// executes the statement once to seed `last_result`, and emits the initial `added` batch
    /// as the first `update` event.
    pub fn select(
        &self,
        sql: impl Into<String>,
        params: Vec<SqlValue>,
        key_selector: KeySelector,
        triggers: Vec<Trigger>,
    ) -> Result<LiveQueryHandle, EngineError> {
        let sql = sql.into();

        {
            let conn = self.inner.primary.lock();
            for trigger in &triggers {
                let cache_spec = self.inner.settings.column_cache_for(&trigger.table);
                let descriptor = self.inner.resolver.ensure_table(&conn, &trigger.table, &cache_spec)?;
                self.inner.snapshot.ensure_cached(&conn, &descriptor)?;
            }
        }

        let initial_rows = self.run_select(&sql, &params)?;

        let query = self.inner.registry.register(sql, params, key_selector.clone(), triggers);
        let (tx, rx) = mpsc::channel(16);
        self.inner.channels.insert(query.id, tx.clone());

        let diff = compute_diff(None, &initial_rows, &key_selector);
        query.set_last_result(initial_rows.clone());
        if !diff.is_empty() {
            let _ = tx.try_send(QueryEvent::Update { diff, full_result: initial_rows });
        }

        Ok(LiveQueryHandle { id: query.id, events: rx, database: self.clone() })
    }

    /// Deregister a live query (normally called through [`LiveQueryHandle::stop`]).
    pub fn unregister(&self, id: u64) {
        self.inner.registry.unregister(id);
        self.inner.channels.remove(&id);
    }

    /// Suspend WAL processing; in-flight passes still run to completion (§5).
    pub fn pause(&self) {
        self.inner.observer.pause();
    }

    /// Resume WAL processing from the last recorded offset, catching up any growth that
    /// happened while paused (§5). Catch-up itself happens on the next [`Self::process_once`].
    pub fn resume(&self) {
        self.inner.observer.resume();
    }

    /// Full shutdown (§5): stops WAL processing, drops every registered query and its
    /// channel, and clears cached snapshots. Connections close when the last clone of this
    /// handle is dropped.
    pub fn end(&self) {
        self.inner.observer.pause();
        self.inner.registry.clear();
        self.inner.snapshot.clear();
        self.inner.channels.clear();
        debug!("engine shut down");
    }

    /// One WAL growth-observation pass: poll for new frames, decode and apply them, queue any
    /// live query whose trigger matched, and flush the queue if the scheduler says it's time.
    pub async fn process_once(&self) -> Result<(), EngineError> {
        let poll = self.inner.observer.poll().await?;
        if poll.frames.is_empty() {
            return Ok(());
        }

        let frame_refs: Vec<_> = poll.frames.iter().map(|(h, p)| (*h, p.as_slice())).collect();
        let mutations = {
            let conn = self.inner.primary.lock();
            decode_and_apply(&self.inner.resolver, &self.inner.snapshot, &conn, &frame_refs)?
        };

        for mutation in &mutations {
            for query in self.inner.registry.queries_for_table(&mutation.table) {
                if !self.inner.scheduler.should_check_predicate(query.id) {
                    continue;
                }
                if query.matching_triggers(mutation).next().is_some() {
                    self.inner.scheduler.queue(query.id);
                }
            }
        }

        if self.inner.scheduler.ready() {
            self.flush().await;
        }

        Ok(())
    }

    /// Drive [`Self::process_once`] forever, woken primarily by the filesystem watcher on the
    /// WAL file and falling back to [`POLL_INTERVAL`] ticks if no notification arrives in time
    /// (§2.5). Any processing error is forwarded to the error channel returned by
    /// [`Self::construct`] instead of stopping the engine, matching §7's "the engine remains
    /// live and continues with the next change event" policy.
    pub async fn run(self) {
        let mut notify_rx = self.inner.wal_notify.lock().await;
        loop {
            tokio::select! {
                _ = notify_rx.recv() => {}
                _ = tokio::time::sleep(POLL_INTERVAL) => {}
            }

            if self.inner.observer.is_paused() {
                continue;
            }
            if let Err(err) = self.process_once().await {
                warn!(error = %err, "WAL processing pass failed, continuing with the next one");
                let _ = self.inner.error_tx.try_send(err);
            }
        }
    }

    fn run_select(&self, sql: &str, params: &[SqlValue]) -> Result<Vec<sqlite_live_types::Row>, EngineError> {
        match &self.inner.pool {
            Some(pool) => pool.with_connection(|conn| run_query(conn, sql, params)),
            None => {
                let conn = self.inner.primary.lock();
                run_query(&conn, sql, params)
            }
        }
    }

    async fn reexecute(&self, query: &LiveQuery) -> Result<(), EngineError> {
        let rows = self.run_select(&query.sql, &query.params)?;
        let diff = compute_diff(query.last_result().as_deref(), &rows, &query.key_selector);
        query.set_last_result(rows.clone());
        if !diff.is_empty() {
            if let Some(tx) = self.inner.channels.get(&query.id) {
                let _ = tx.try_send(QueryEvent::Update { diff, full_result: rows });
            }
        }
        Ok(())
    }

    async fn flush(&self) {
        let ids = self.inner.scheduler.drain();
        for id in ids {
            let Some(query) = self.inner.registry.get(id) else { continue };
            if let Err(err) = self.reexecute(&query).await {
                match err {
                    EngineError::Sqlite(source) => {
                        if let Some(tx) = self.inner.channels.get(&id) {
                            let _ = tx.try_send(QueryEvent::Error(QueryError::Execution {
                                query_id: id,
                                source,
                            }));
                        }
                    }
                    other => error!(query_id = id, error = %other, "live query re-execution failed"),
                }
            }
        }
    }
}
