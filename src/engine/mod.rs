//! Document-engine collaborator.
//!
//! Everything the toolchain needs from the record-based engine, kept behind
//! a small surface:
//!
//! - `folder` - `load_plugin_folder`, `load_file_metadata`, base wiki records
//! - `filter` - filter expressions evaluated against a record title
//! - `types` - content type by extension
//! - `store` / `server` - a bootable preview instance preloaded with records

pub mod filter;
pub mod folder;
pub mod server;
pub mod store;
pub mod types;

pub use filter::{Filter, FilterError};
pub use folder::{PluginFolder, has_sidecar, load_file_metadata, load_plugin_folder, load_wiki_records, walk_files};
pub use server::{PreviewError, PreviewInstance};
pub use store::RecordStore;
