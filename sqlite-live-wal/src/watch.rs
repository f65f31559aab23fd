use std::path::{Path, PathBuf};

use notify::{Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::error::WalError;

/// Bridges `notify`'s callback-based filesystem events into the async world: whenever the
/// watched WAL file changes, a wakeup is pushed onto `notify_tx` so [`crate::WalObserver::poll`]
/// gets driven promptly instead of waiting for the next fixed-interval tick (§2.5). The
/// underlying OS watch is held alive for as long as this value is; dropping it stops delivery.
pub struct WalWatcher {
    _watcher: RecommendedWatcher,
}

impl WalWatcher {
    /// Watch the parent directory of `wal_path`, not the file itself: the WAL file does not
    /// exist until the first write after the database is opened, and is recreated from scratch
    /// on every checkpoint, so watching the file handle directly would miss those transitions.
    pub fn spawn(wal_path: impl Into<PathBuf>, notify_tx: mpsc::Sender<()>) -> Result<Self, WalError> {
        let wal_path = wal_path.into();
        let parent = wal_path.parent().map(Path::to_path_buf).unwrap_or_else(|| PathBuf::from("."));

        let mut watcher = notify::recommended_watcher(move |event: notify::Result<Event>| {
            let relevant = match &event {
                Ok(event) => event.paths.iter().any(|p| p == &wal_path),
                Err(_) => true,
            };
            if relevant {
                let _ = notify_tx.try_send(());
            }
        })
        .map_err(|source| WalError::Watch { source })?;

        watcher.watch(&parent, RecursiveMode::NonRecursive).map_err(|source| WalError::Watch { source })?;

        Ok(WalWatcher { _watcher: watcher })
    }
}
