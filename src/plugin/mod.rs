//! Plugin compilation.
//!
//! Turns every plugin directory under the source root into one aggregate
//! record whose `text` is the JSON-serialized set of its sub-records.
//!
//! # Module Structure
//!
//! ```text
//! plugin/
//! ├── meta.rs     # Plugin directory listing, manifest and per-file options
//! ├── policy.rs   # Compile units and compiled-title rules
//! ├── cache.rs    # ChangeSet and the directory-keyed PluginCache
//! ├── outputs.rs  # Bundler outputs → records
//! └── compile.rs  # Per-pass orchestration (rayon fan-out)
//! ```

mod cache;
mod compile;
mod meta;
mod outputs;
mod policy;


pub use cache::{ChangeSet, PluginCache};
pub use compile::{CompileContext, CompileReport, compile};

// Option fields on manifests and file metadata, all under `plugsmith#`.
pub const NO_COMPILE: &str = "plugsmith#NoCompile";
pub const INCLUDE_SOURCE: &str = "plugsmith#IncludeSource";
pub const SOURCE_MAP: &str = "plugsmith#SourceMap";
pub const MINIFY: &str = "plugsmith#Minify";
pub const BROWSERS_LIST: &str = "plugsmith#BrowsersList";
pub const EXTERNAL_MODULES: &str = "plugsmith#ExternalModules";
pub const NODE_MODULES_NOT_EXTERNAL: &str = "plugsmith#NodeModulesNotExternal";

/// Relative source path of a compiled record.
pub const ORIGIN: &str = "plugsmith#Origin";
/// Content hash of a production plugin aggregate.
pub const HASH: &str = "plugsmith#Hash";

/// Browser query used when a plugin does not declare one.
pub const DEFAULT_BROWSERS_LIST: &str = ">0.25%, not ie 11, not op_mini all";

/// Stylesheet tag given to CSS outputs without their own metadata.
pub const STYLESHEET_TAG: &str = "$:/tags/Stylesheet";
