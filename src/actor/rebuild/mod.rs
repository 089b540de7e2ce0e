//! Rebuild Actor
//!
//! Serializes compile passes. Change sets arriving while a pass runs are
//! coalesced into the next batch; when the queue runs dry a single
//! `Refresh` goes to the WsActor, whether or not the last pass succeeded.
//!
//! ```text
//! FsActor --Change--> RebuildActor --spawn_blocking--> BuildPass
//!                          ^                              |
//!                          +-----------(pass)-------------+
//!                          |
//!                          +--Refresh--> WsActor
//! ```

mod batch;


use std::any::Any;
use std::panic::AssertUnwindSafe;

use tokio::sync::mpsc;

use super::messages::{RebuildMsg, WsMsg};
use crate::plugin::ChangeSet;
use batch::{Completion, RebuildQueue};

/// One compile + serve cycle.
///
/// Runs on a blocking thread; the actor hands the pass back and forth so
/// only one pass ever runs at a time. A panic inside `run` is caught and
/// treated as a failed pass.
pub trait BuildPass: Send + 'static {
    fn run(&mut self, changes: ChangeSet) -> anyhow::Result<()>;

    /// Release whatever the pass holds (preview listeners, ..).
    fn shutdown(&mut self) {}
}

/// Rebuild Actor - owns the pass and the coalescing queue
pub struct RebuildActor<P: BuildPass> {
    rx: mpsc::Receiver<RebuildMsg>,
    ws_tx: mpsc::Sender<WsMsg>,
    pass: P,
}

impl<P: BuildPass> RebuildActor<P> {
    pub fn new(rx: mpsc::Receiver<RebuildMsg>, ws_tx: mpsc::Sender<WsMsg>, pass: P) -> Self {
        Self { rx, ws_tx, pass }
    }

    /// Run the actor event loop
    pub async fn run(self) {
        let mut rx = self.rx;
        let ws_tx = self.ws_tx;
        let mut pass = Some(self.pass);

        let (done_tx, mut done_rx) = mpsc::channel::<P>(1);
        let mut queue = RebuildQueue::new();
        let mut stopping = false;

        // Changes that arrived before a completion join the next batch
        loop {
            tokio::select! {
                biased;
                msg = rx.recv(), if !stopping => match msg {
                    Some(RebuildMsg::Change(changes)) => {
                        if let Some(batch) = queue.push(changes) {
                            start(&mut pass, batch, &done_tx);
                        }
                    }
                    Some(RebuildMsg::Shutdown) | None => {
                        stopping = true;
                        if !queue.is_draining() {
                            break;
                        }
                        crate::debug!("rebuild"; "waiting for pass in flight");
                    }
                },
                Some(returned) = done_rx.recv() => {
                    pass = Some(returned);
                    if stopping {
                        break;
                    }
                    match queue.complete() {
                        Completion::Drain(batch) => start(&mut pass, batch, &done_tx),
                        Completion::Idle => {
                            if ws_tx.send(WsMsg::Refresh).await.is_err() {
                                crate::debug!("rebuild"; "ws actor gone");
                            }
                        }
                    }
                }
            }
        }

        if let Some(mut pass) = pass {
            let _ = tokio::task::spawn_blocking(move || pass.shutdown()).await;
        }
        crate::debug!("rebuild"; "stopped");
    }
}

fn start<P: BuildPass>(pass: &mut Option<P>, changes: ChangeSet, done_tx: &mpsc::Sender<P>) {
    let Some(mut current) = pass.take() else {
        return;
    };

    match changes.path_count() {
        Some(n) => crate::debug!("rebuild"; "pass over {} changed paths", n),
        None => crate::debug!("rebuild"; "full pass"),
    }

    let done_tx = done_tx.clone();
    tokio::task::spawn_blocking(move || {
        // The pass must come back even if it panics, or the queue never drains
        let result = std::panic::catch_unwind(AssertUnwindSafe(|| current.run(changes)));
        match result {
            Ok(Ok(())) => {}
            Ok(Err(e)) => crate::log!("rebuild"; "{:#}", e),
            Err(panic) => crate::log!("rebuild"; "pass panicked: {}", panic_message(&*panic)),
        }
        let _ = done_tx.blocking_send(current);
    });
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.as_str()
    } else {
        "unknown panic"
    }
}
