use std::io::ErrorKind;
use std::net::{Shutdown, TcpStream};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tungstenite::protocol::Message;

use super::heartbeat::{Beat, Heartbeat};
use super::{BYE, Client, WsActor};

/// Reader thread poll interval
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// How long a peer gets to send its upgrade request
const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(5);

/// What a drained read loop found out about a client.
enum ReadState {
    Open,
    Gone,
}

impl WsActor {
    /// Add a new client connection
    ///
    /// The handshake runs on its own thread, bounded by `HANDSHAKE_TIMEOUT`.
    pub(super) fn add_client(&self, stream: TcpStream) {
        let clients = Arc::clone(&self.clients);
        let running = Arc::clone(&self.running);
        let spawned = std::thread::Builder::new()
            .name("ws-handshake".into())
            .spawn(move || Self::handshake(stream, &clients, &running));
        if let Err(e) = spawned {
            crate::log!("ws"; "failed to spawn handshake thread: {}", e);
        }
    }

    fn handshake(stream: TcpStream, clients: &Mutex<Vec<Client>>, running: &AtomicBool) {
        // Blocking with a deadline during the handshake, non-blocking after
        let _ = stream.set_read_timeout(Some(HANDSHAKE_TIMEOUT));
        let mut ws = match tungstenite::accept(stream) {
            Ok(ws) => ws,
            Err(e) => {
                crate::log!("ws"; "handshake failed: {}", e);
                return;
            }
        };
        let _ = ws.get_ref().set_read_timeout(None);
        let _ = ws.get_ref().set_nonblocking(true);

        // Holding the lock orders this against broadcast and close_all
        let mut clients = clients.lock();
        if !running.load(Ordering::SeqCst) {
            let _ = ws.send(Message::text(BYE));
            let _ = ws.close(None);
            let _ = ws.flush();
            return;
        }

        // Probe right away; the heartbeat starts counting from here
        if let Err(e) = ws.send(Message::Ping(Default::default())) {
            crate::log!("ws"; "failed to ping new client: {}", e);
            return;
        }

        crate::debug!("ws"; "client connected (total: {})", clients.len() + 1);
        clients.push(Client {
            ws,
            heartbeat: Heartbeat::new(Instant::now()),
        });
    }

    /// Background thread reading client frames and driving heartbeats
    pub(super) fn client_reader_loop(clients: Arc<Mutex<Vec<Client>>>, running: Arc<AtomicBool>) {
        while running.load(Ordering::SeqCst) {
            std::thread::sleep(POLL_INTERVAL);

            let now = Instant::now();
            let mut clients = clients.lock();
            clients.retain_mut(|client| {
                if let ReadState::Gone = Self::drain_reads(client, now) {
                    crate::debug!("ws"; "client disconnected");
                    return false;
                }
                match client.heartbeat.poll(now) {
                    Beat::Idle => true,
                    Beat::Probe => client.ws.send(Message::Ping(Default::default())).is_ok(),
                    Beat::Terminate => {
                        crate::debug!("ws"; "client missed heartbeat, terminating");
                        let _ = client.ws.get_ref().shutdown(Shutdown::Both);
                        false
                    }
                }
            });
        }
    }

    /// Read everything the client has sent so far (non-blocking).
    ///
    /// tungstenite answers pings and queues close replies on its own.
    fn drain_reads(client: &mut Client, now: Instant) -> ReadState {
        loop {
            match client.ws.read() {
                Ok(Message::Pong(_)) => client.heartbeat.on_pong(now),
                Ok(Message::Close(_)) => return ReadState::Gone,
                Ok(_) => {}
                Err(tungstenite::Error::Io(ref e)) if e.kind() == ErrorKind::WouldBlock => {
                    return ReadState::Open;
                }
                Err(_) => return ReadState::Gone,
            }
        }
    }
}
