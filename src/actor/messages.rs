//! Actor Message Definitions
//!
//! Message types for inter-actor communication.
//!
//! ```text
//! FsActor --Change--> RebuildActor --Refresh--> WsActor
//! ```

use crate::plugin::ChangeSet;

// =============================================================================
// RebuildActor Messages
// =============================================================================

/// Messages to Rebuild Actor
#[derive(Debug)]
pub enum RebuildMsg {
    /// Paths changed (or `ChangeSet::Full` for the initial pass)
    Change(ChangeSet),
    /// Finish the pass in flight, then stop
    Shutdown,
}

// =============================================================================
// WsActor Messages
// =============================================================================

/// Messages to WebSocket Actor
#[derive(Debug)]
pub enum WsMsg {
    /// Tell every client to reload
    Refresh,
    /// Add client (handshake happens in the actor)
    AddClient(std::net::TcpStream),
    /// Say `bye` to every client and stop
    Shutdown,
}
