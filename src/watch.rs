//! File-watch / auto-rebuild facility.
//!
//! A silo is immutable once loaded, so this module never mutates one in
//! place. Instead it watches a source path on a background thread and
//! hands change notifications to the caller over a channel; the caller
//! decides when (and whether) to call [`crate::builder::Builder::ensure`]
//! again and swap in a freshly built silo.

use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver};
use std::sync::Mutex;

use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tracing::warn;

use crate::error::{Error, Result};

/// A live watch on a single path. Dropping it stops the watcher thread.
///
/// The receiver is wrapped in a `Mutex` solely so `Watch` (and therefore
/// `Silo`, which holds one optionally) is `Sync`: `mpsc::Receiver` is
/// `Send` but not `Sync`, and a silo must be usable from multiple threads
/// at once regardless of whether it was loaded with `WATCH_BLOB`.
pub struct Watch {
    _watcher: RecommendedWatcher,
    events: Mutex<Receiver<()>>,
    path: PathBuf,
}

impl Watch {
    /// Registers a watch on `path`. Only modification/creation events for
    /// that exact path are surfaced; everything else is filtered out here
    /// so callers don't have to understand the underlying backend's event
    /// model.
    pub fn register(path: &Path) -> Result<Watch> {
        let (tx, rx) = mpsc::channel();
        let watch_path = path.to_path_buf();
        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| match res
        {
            Ok(event) if matches!(event.kind, EventKind::Modify(_) | EventKind::Create(_)) => {
                let _ = tx.send(());
            }
            Ok(_) => {}
            Err(e) => warn!("file watch error: {e}"),
        })
        .map_err(notify_err)?;
        watcher
            .watch(&watch_path, RecursiveMode::NonRecursive)
            .map_err(notify_err)?;
        Ok(Watch {
            _watcher: watcher,
            events: Mutex::new(rx),
            path: watch_path,
        })
    }

    /// Non-blocking check for a pending change notification.
    pub fn poll_changed(&self) -> bool {
        let rx = self.events.lock().unwrap_or_else(|e| e.into_inner());
        rx.try_iter().count() > 0
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn notify_err(e: notify::Error) -> Error {
    Error::invalid_argument(format!("could not watch file: {e}"))
}
