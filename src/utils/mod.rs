//! Utility modules shared across the toolchain.

pub mod exec;
pub mod path;
pub mod plural;
