use std::time::Duration;

use anyhow::Result;
use crossbeam::channel::Receiver;
use tokio::sync::mpsc;

use crate::actor::fs::FsActor;
use crate::actor::messages::{RebuildMsg, WsMsg};
use crate::actor::rebuild::{BuildPass, RebuildActor};
use crate::actor::ws::WsActor;

const POLL_INTERVAL: Duration = Duration::from_millis(100);
const WS_GRACE: Duration = Duration::from_millis(500);

/// Run all actors concurrently, then stop them in dependency order.
pub(super) async fn run_actors<P: BuildPass>(
    fs: FsActor,
    rebuild: RebuildActor<P>,
    ws: WsActor,
    rebuild_tx: mpsc::Sender<RebuildMsg>,
    ws_tx: mpsc::Sender<WsMsg>,
    shutdown_rx: Option<Receiver<()>>,
) -> Result<()> {
    let ws_handle = tokio::spawn(async move { ws.run().await });
    let rebuild_handle = tokio::spawn(async move { rebuild.run().await });
    let fs_handle = tokio::spawn(async move { fs.run().await });

    loop {
        if let Some(rx) = &shutdown_rx
            && rx.try_recv().is_ok()
        {
            crate::debug!("actor"; "shutdown signal received");
            break;
        }
        if rebuild_handle.is_finished() {
            break;
        }
        tokio::time::sleep(POLL_INTERVAL).await;
    }

    // Stop producing changes before draining the rebuild queue
    fs_handle.abort();

    crate::debug!("actor"; "sending shutdown to rebuild");
    let _ = rebuild_tx.send(RebuildMsg::Shutdown).await;
    if let Err(e) = rebuild_handle.await
        && e.is_panic()
    {
        crate::log!("actor"; "rebuild actor panicked");
    }

    crate::debug!("actor"; "sending shutdown to ws");
    let _ = ws_tx.send(WsMsg::Shutdown).await;
    let _ = tokio::time::timeout(WS_GRACE, ws_handle).await;

    Ok(())
}
