//! Command-line interface module.
//!
//! - `build` - one production pass written to the output directory
//! - `dev` - the watch / preview / live-reload loop

mod args;
pub mod build;
pub mod dev;

pub use args::{BuildArgs, Cli, Commands};
