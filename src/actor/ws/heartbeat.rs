//! Per-client liveness.
//!
//! A client is probed on connect. Every interval without an answer since
//! the last probe marks it dead:
//!
//! ```text
//! connect ──► alive, probe ──(5s)──► not alive? terminate
//!                 ▲                   alive?     mark not alive, probe
//!                 └───── pong: alive, restart the 5s timer
//! ```

use std::time::{Duration, Instant};

pub const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(5);

/// What the reader loop should do with a client right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Beat {
    Idle,
    /// Send a ping.
    Probe,
    /// Close the connection forcibly.
    Terminate,
}

#[derive(Debug)]
pub(super) struct Heartbeat {
    alive: bool,
    deadline: Instant,
}

impl Heartbeat {
    /// A freshly connected (and just probed) client.
    pub(super) fn new(now: Instant) -> Self {
        Self {
            alive: true,
            deadline: now + HEARTBEAT_INTERVAL,
        }
    }

    pub(super) fn on_pong(&mut self, now: Instant) {
        self.alive = true;
        self.deadline = now + HEARTBEAT_INTERVAL;
    }

    pub(super) fn poll(&mut self, now: Instant) -> Beat {
        if now < self.deadline {
            return Beat::Idle;
        }
        if !self.alive {
            return Beat::Terminate;
        }
        self.alive = false;
        self.deadline = now + HEARTBEAT_INTERVAL;
        Beat::Probe
    }
}
