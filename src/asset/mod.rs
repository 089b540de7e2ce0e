//! Production post-processing of compiled records.
//!
//! - `minify` - JS (oxc) and CSS (lightningcss) minification per record
//! - `hash` - blake3 content hash attached to plugin aggregates

pub mod hash;
pub mod minify;

pub use hash::ContentHash;
pub use minify::minify_record;
