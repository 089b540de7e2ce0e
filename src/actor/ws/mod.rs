//! WebSocket Actor - Live Reload Channel
//!
//! This actor is responsible for:
//! - Completing handshakes for connections accepted by the listener, one
//!   short-lived thread per connection
//! - Broadcasting `refresh` after each successful rebuild
//! - Keeping clients alive with ping/pong and dropping silent ones
//! - Saying `bye` to every client on shutdown
//!
//! # Architecture
//!
//! ```text
//! listener --[AddClient]--> WsActor --[refresh/bye]--> Clients
//! RebuildActor --[Refresh]----^   ^                      |
//!                                 +-----[pong/close]-----+ (reader thread)
//! ```

mod client_io;
mod delivery;
mod heartbeat;
mod server;


use std::net::TcpStream;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tungstenite::WebSocket;
use tungstenite::protocol::Message;

use super::messages::WsMsg;
use heartbeat::Heartbeat;

pub use server::start_ws_server;

/// Text frame telling clients to reload.
pub const REFRESH: &str = "refresh";
/// Text frame sent to every client when the server stops.
pub const BYE: &str = "bye";

/// A connected client and its liveness state
struct Client {
    ws: WebSocket<TcpStream>,
    heartbeat: Heartbeat,
}

/// WebSocket Actor - manages client connections and broadcasts
pub struct WsActor {
    /// Channel to receive messages
    rx: mpsc::Receiver<WsMsg>,
    /// Connected clients (shared for broadcast + reader thread)
    clients: Arc<Mutex<Vec<Client>>>,
    /// Cleared when the actor exits; stops the reader thread and turns
    /// late handshakes away
    running: Arc<AtomicBool>,
}

impl WsActor {
    pub fn new(rx: mpsc::Receiver<WsMsg>) -> Self {
        Self {
            rx,
            clients: Arc::new(Mutex::new(Vec::new())),
            running: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Run the actor event loop
    pub async fn run(mut self) {
        let clients_for_reader = Arc::clone(&self.clients);
        let running = Arc::clone(&self.running);
        std::thread::spawn(move || {
            Self::client_reader_loop(clients_for_reader, running);
        });

        while let Some(msg) = self.rx.recv().await {
            match msg {
                WsMsg::Refresh => {
                    crate::debug!("ws"; "sending refresh");
                    self.broadcast(Message::text(REFRESH));
                }
                WsMsg::AddClient(stream) => self.add_client(stream),
                WsMsg::Shutdown => break,
            }
        }

        crate::debug!("ws"; "shutting down");
        self.running.store(false, Ordering::SeqCst);
        self.close_all();
    }
}
