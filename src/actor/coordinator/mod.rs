//! Actor Coordinator - Wires up the Dev Actor System
//!
//! The Coordinator is a thin orchestrator that:
//! - Creates communication channels
//! - Starts the live-reload listener
//! - Wires up actors and queues the initial full pass
//! - Runs them until shutdown

mod runtime;

use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use crossbeam::channel::Receiver;
use tokio::sync::mpsc;

use super::fs::FsActor;
use super::messages::{RebuildMsg, WsMsg};
use super::rebuild::{BuildPass, RebuildActor};
use super::ws::{WsActor, start_ws_server};
use crate::plugin::ChangeSet;

const CHANNEL_BUFFER: usize = 32;

/// Coordinator - wires up and runs the actor system.
pub struct Coordinator {
    watch: Vec<PathBuf>,
    settle: Duration,
    ws_interface: IpAddr,
    ws_port: u16,
    shutdown_rx: Option<Receiver<()>>,
}

impl Coordinator {
    /// Watch `paths`, rebuilding once they have been quiet for `settle`.
    pub fn new(watch: Vec<PathBuf>, settle: Duration) -> Self {
        Self {
            watch,
            settle,
            ws_interface: IpAddr::V4(Ipv4Addr::LOCALHOST),
            ws_port: 0,
            shutdown_rx: None,
        }
    }

    /// Set the live-reload listener address (port 0 picks any free port).
    pub fn with_ws(mut self, interface: IpAddr, port: u16) -> Self {
        self.ws_interface = interface;
        self.ws_port = port;
        self
    }

    /// Set shutdown signal receiver.
    pub fn with_shutdown_signal(mut self, rx: Receiver<()>) -> Self {
        self.shutdown_rx = Some(rx);
        self
    }

    /// Run the actor system.
    ///
    /// `make_pass` receives the bound live-reload port, so the pass can
    /// point its preview at it.
    pub async fn run<P, F>(mut self, make_pass: F) -> Result<()>
    where
        P: BuildPass,
        F: FnOnce(u16) -> Result<P>,
    {
        let (rebuild_tx, rebuild_rx) = mpsc::channel::<RebuildMsg>(CHANNEL_BUFFER);
        let (ws_tx, ws_rx) = mpsc::channel::<WsMsg>(CHANNEL_BUFFER);

        let ws_port = start_ws_server(self.ws_interface, self.ws_port, ws_tx.clone())?;
        crate::debug!("actor"; "live reload on {}:{}", self.ws_interface, ws_port);

        let pass = make_pass(ws_port)?;

        let fs_actor = FsActor::new(std::mem::take(&mut self.watch), rebuild_tx.clone(), self.settle)
            .map_err(|e| anyhow::anyhow!("watcher failed: {}", e))?;
        let rebuild_actor = RebuildActor::new(rebuild_rx, ws_tx.clone(), pass);
        let ws_actor = WsActor::new(ws_rx);

        // Watcher is already buffering; the first pass sees everything
        rebuild_tx.send(RebuildMsg::Change(ChangeSet::Full)).await?;

        crate::debug!("actor"; "start");
        runtime::run_actors(
            fs_actor,
            rebuild_actor,
            ws_actor,
            rebuild_tx,
            ws_tx,
            self.shutdown_rx.take(),
        )
        .await?;

        crate::debug!("actor"; "stopped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};
    use tempfile::TempDir;

    #[derive(Default)]
    struct Probe {
        runs: Mutex<Vec<ChangeSet>>,
        port: Mutex<Option<u16>>,
        shut: AtomicBool,
    }

    struct RecordingPass(Arc<Probe>);

    impl BuildPass for RecordingPass {
        fn run(&mut self, changes: ChangeSet) -> Result<()> {
            self.0.runs.lock().push(changes);
            Ok(())
        }

        fn shutdown(&mut self) {
            self.0.shut.store(true, Ordering::SeqCst);
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_initial_full_pass_and_shutdown() {
        let dir = TempDir::new().unwrap();
        let probe = Arc::new(Probe::default());
        let (shutdown_tx, shutdown_rx) = crossbeam::channel::bounded(1);

        let coordinator = Coordinator::new(vec![dir.path().to_path_buf()], Duration::from_millis(50))
            .with_shutdown_signal(shutdown_rx);
        let for_pass = Arc::clone(&probe);
        let handle = tokio::spawn(coordinator.run(move |port| {
            *for_pass.port.lock() = Some(port);
            Ok(RecordingPass(for_pass))
        }));

        let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
        while probe.runs.lock().is_empty() {
            assert!(tokio::time::Instant::now() < deadline, "initial pass never ran");
            tokio::time::sleep(Duration::from_millis(20)).await;
        }

        shutdown_tx.send(()).unwrap();
        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .unwrap()
            .unwrap()
            .unwrap();

        assert_eq!(probe.runs.lock()[0], ChangeSet::Full);
        assert!(probe.port.lock().is_some_and(|port| port != 0));
        assert!(probe.shut.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_pass_construction_error_propagates() {
        let coordinator = Coordinator::new(Vec::new(), Duration::from_millis(50));
        let result = coordinator
            .run(|_| -> Result<RecordingPass> { Err(anyhow::anyhow!("preview port taken")) })
            .await;
        assert!(result.unwrap_err().to_string().contains("preview port taken"));
    }
}
