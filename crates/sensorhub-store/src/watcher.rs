//! Change notifier for the sensor file.
//!
//! [`SensorFileWatcher`] reacts to edits made outside the running process
//! (an operator opening `data.json` in an editor, a deploy script copying
//! a new file in). It watches the file's parent directory so that
//! rename-and-replace saves are seen as well as in-place writes.
//!
//! Filesystem events arrive on `notify`'s own thread and are forwarded to
//! a Tokio task over a one-slot channel, which coalesces bursts. After a
//! short settle delay the task reloads the registry and hands the new
//! collection to the `on_reload` callback. The daemon's own saves also
//! trigger events; those reload to the collection already in memory and
//! are not reported. A reload that fails to parse is logged by the
//! registry and leaves the previous state in place.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use sensorhub_types::SensorCollection;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::error::StoreError;
use crate::registry::SensorRegistry;

/// How long to wait after the first event before reloading, so that
/// multi-step editor writes settle.
const SETTLE_DELAY: Duration = Duration::from_millis(100);

/// A running watch on the sensor file. Dropping it stops the watch.
pub struct SensorFileWatcher {
    _watcher: RecommendedWatcher,
    task: JoinHandle<()>,
}

impl core::fmt::Debug for SensorFileWatcher {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SensorFileWatcher").finish_non_exhaustive()
    }
}

impl SensorFileWatcher {
    /// Start watching `path`; every reload that changes the collection is
    /// passed to `on_reload`.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn spawn<F>(
        path: impl Into<PathBuf>,
        registry: Arc<SensorRegistry>,
        on_reload: F,
    ) -> Result<Self, StoreError>
    where
        F: Fn(Arc<SensorCollection>) + Send + Sync + 'static,
    {
        let path = path.into();
        let file_name = path
            .file_name()
            .map(ToOwned::to_owned)
            .ok_or_else(|| notify::Error::generic("sensor file path has no file name"))?;
        let dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map_or_else(|| PathBuf::from("."), Path::to_path_buf);

        let (tx, rx) = mpsc::channel::<()>(1);
        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| match res {
            Ok(event) if touches_file(&event, &file_name) => {
                // A full slot means a reload is already queued.
                let _ = tx.try_send(());
            }
            Ok(_) => {}
            Err(e) => warn!(error = %e, "Sensor file watch error"),
        })?;
        watcher.watch(&dir, RecursiveMode::NonRecursive)?;

        info!(path = %path.display(), "Watching sensor file for changes");

        let task = tokio::spawn(reload_loop(rx, registry, on_reload));
        Ok(Self {
            _watcher: watcher,
            task,
        })
    }
}

impl Drop for SensorFileWatcher {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Whether `event` is a create or modify of the watched file.
fn touches_file(event: &Event, file_name: &OsStr) -> bool {
    matches!(event.kind, EventKind::Create(_) | EventKind::Modify(_))
        && event
            .paths
            .iter()
            .any(|p| p.file_name() == Some(file_name))
}

async fn reload_loop<F>(
    mut rx: mpsc::Receiver<()>,
    registry: Arc<SensorRegistry>,
    on_reload: F,
) where
    F: Fn(Arc<SensorCollection>) + Send + Sync + 'static,
{
    while rx.recv().await.is_some() {
        tokio::time::sleep(SETTLE_DELAY).await;
        while rx.try_recv().is_ok() {}

        debug!("Sensor file changed, reloading");
        if let Ok(Some(collection)) = registry.reload().await {
            on_reload(collection);
        }
    }
}
