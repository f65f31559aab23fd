use tokio::sync::mpsc;

use crate::database::Database;
use crate::events::QueryEvent;

/// A handle to one registered live query (§6). Dropping it without calling [`Self::stop`]
/// leaves the query registered; use `stop` to deregister and release its trigger bindings.
pub struct LiveQueryHandle {
    pub(crate) id: u64,
    pub(crate) events: mpsc::Receiver<QueryEvent>,
    pub(crate) database: Database,
}

impl LiveQueryHandle {
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Await the next `update`/`error` event for this query.
    pub async fn recv(&mut self) -> Option<QueryEvent> {
        self.events.recv().await
    }

    /// Non-blocking poll for the next event, useful for asserting that nothing was emitted.
    pub fn try_recv(&mut self) -> Result<QueryEvent, mpsc::error::TryRecvError> {
        self.events.try_recv()
    }

    /// Deregister this query; its trigger bindings stop being evaluated and no further
    /// events will be delivered.
    pub fn stop(&self) {
        self.database.unregister(self.id);
    }
}
