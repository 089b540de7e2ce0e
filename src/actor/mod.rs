//! Actor-based dev loop.
//!
//! ```text
//! FsActor --Change--> RebuildActor --Refresh--> WsActor --> browsers
//! ```
//!
//! [`Coordinator`] wires the actors together and owns their shutdown.

pub mod coordinator;
pub mod fs;
pub mod messages;
pub mod rebuild;
pub mod ws;

pub use coordinator::Coordinator;
