//! FileSystem Actor
//!
//! Watches the plugin source root and sends settled change sets to the
//! RebuildActor. Implements the "Watcher-First" pattern: the watcher is
//! attached before the initial pass so no event is lost.
//!
//! Architecture:
//! ```text
//! Watcher → Debouncer (timing + dedup) → ChangeSet → RebuildMsg
//! ```

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::time::Duration;

use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use rustc_hash::FxHashMap;
use tokio::sync::mpsc;

use super::messages::RebuildMsg;
use crate::plugin::ChangeSet;

// Pure timing and deduplication.
mod debouncer;

#[cfg(test)]
mod tests;

use debouncer::{Debouncer, Edit};

/// FileSystem Actor - watches for file changes
pub struct FsActor {
    /// Channel to receive notify events (sync -> async bridge)
    notify_rx: std::sync::mpsc::Receiver<notify::Result<notify::Event>>,
    /// Watcher handle (must be kept alive)
    _watcher: RecommendedWatcher,
    /// Channel to send messages to RebuildActor
    rebuild_tx: mpsc::Sender<RebuildMsg>,
    /// Debouncer state
    debouncer: Debouncer,
}

impl FsActor {
    /// Create a new FsActor with Watcher-First pattern
    ///
    /// The watcher starts immediately, buffering events while the caller
    /// performs the initial pass. Missing roots are skipped with a warning.
    pub fn new(
        paths: Vec<PathBuf>,
        rebuild_tx: mpsc::Sender<RebuildMsg>,
        settle: Duration,
    ) -> notify::Result<Self> {
        // Create sync channel for notify (it doesn't support async)
        let (notify_tx, notify_rx) = std::sync::mpsc::channel();

        let mut watcher = notify::recommended_watcher(move |res| {
            let _ = notify_tx.send(res);
        })?;

        for path in &paths {
            if path.exists() {
                watcher.watch(path, RecursiveMode::Recursive)?;
                crate::debug!("watch"; "watching {}", path.display());
            } else {
                crate::log!("watch"; "{} does not exist, not watching", path.display());
            }
        }

        Ok(Self {
            notify_rx,
            _watcher: watcher,
            rebuild_tx,
            debouncer: Debouncer::new(settle),
        })
    }

    /// Run the actor event loop
    pub async fn run(self) {
        // Extract fields before consuming self
        let notify_rx = self.notify_rx;
        let rebuild_tx = self.rebuild_tx;
        let mut debouncer = self.debouncer;
        let _watcher = self._watcher;

        let (async_tx, mut async_rx) = mpsc::channel::<notify::Event>(64);

        // Spawn a thread to poll notify events and send to async channel
        std::thread::spawn(move || {
            while let Ok(result) = notify_rx.recv() {
                match result {
                    Ok(event) => {
                        if async_tx.blocking_send(event).is_err() {
                            break; // Receiver dropped
                        }
                    }
                    Err(e) => crate::log!("watch"; "notify error: {}", e),
                }
            }
        });

        loop {
            tokio::select! {
                biased;
                Some(event) = async_rx.recv() => debouncer.add_event(&event),
                _ = tokio::time::sleep(debouncer.sleep_duration()) => {
                    if process_changes(&mut debouncer, &rebuild_tx).await.is_err() {
                        break;
                    }
                }
            }
        }
    }
}

/// Forward settled changes to the RebuildActor
///
/// Returns `Err(())` if RebuildActor shut down
async fn process_changes(
    debouncer: &mut Debouncer,
    rebuild_tx: &mpsc::Sender<RebuildMsg>,
) -> Result<(), ()> {
    let Some(changes) = debouncer.take_if_ready() else {
        return Ok(());
    };

    log_changes(&changes);

    let changes = ChangeSet::Paths(changes.into_keys().collect::<BTreeSet<_>>());
    rebuild_tx
        .send(RebuildMsg::Change(changes))
        .await
        .map_err(|_| ())
}

fn log_changes(changes: &FxHashMap<PathBuf, Edit>) {
    let mut paths: Vec<_> = changes.iter().collect();
    paths.sort_by(|a, b| a.0.cmp(b.0));

    match paths.as_slice() {
        [(path, kind)] => {
            crate::log!("watch"; "{} {}", kind, path.display());
        }
        [(path, _), rest @ ..] => {
            crate::log!("watch"; "{} and {} more changed", path.display(), rest.len());
        }
        [] => {}
    }
}
