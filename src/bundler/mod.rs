//! Bundler collaborator.
//!
//! The compile orchestrator hands a [`BundleRequest`] per plugin directory to
//! a [`Bundler`] and gets back [`OutputFile`]s tagged with the entry point and
//! the inputs that produced them. Module resolution, transpilation and
//! tree-shaking all happen on the other side of this trait.
//!
//! - `esbuild` - drives the esbuild CLI
//! - `targets` - browserslist query → esbuild target names

mod esbuild;
mod targets;

pub use esbuild::Esbuild;
pub use targets::{browsers_for, esbuild_targets};

use std::path::PathBuf;
use thiserror::Error;

/// Modules provided by the runtime platform, external unless whitelisted.
pub const NODE_BUILTINS: &[&str] = &[
    "assert",
    "buffer",
    "child_process",
    "cluster",
    "crypto",
    "dgram",
    "dns",
    "domain",
    "events",
    "fs",
    "fsevents",
    "http",
    "https",
    "net",
    "os",
    "path",
    "punycode",
    "querystring",
    "readline",
    "stream",
    "string_decoder",
    "timers",
    "tls",
    "tty",
    "url",
    "util",
    "v8",
    "vm",
    "zlib",
];

/// Engine-internal module titles, resolved at runtime by the engine.
pub const ENGINE_MODULES: &str = "$:/*";

/// Asset extensions inlined into the bundle as data URLs.
pub const DATAURL_EXTENSIONS: &[&str] = &[".png", ".woff", ".woff2", ".eot", ".ttf", ".svg"];

/// Banner prepended to every JS and CSS output.
pub const BANNER: &str = "/* Compiled by plugsmith */";

/// One bundler invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleRequest {
    /// Absolute entry-point paths.
    pub entries: Vec<PathBuf>,
    /// Module specifiers left unresolved.
    pub externals: Vec<String>,
    /// esbuild-style targets (`chrome109`, `safari15.6`, ..).
    pub targets: Vec<String>,
    pub inline_sourcemap: bool,
    /// Output paths are reported relative to this directory.
    pub out_base: PathBuf,
}

/// One file produced by the bundler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputFile {
    /// Path relative to [`BundleRequest::out_base`], e.g. `index.js`.
    pub path: PathBuf,
    pub text: String,
    /// Absolute entry point, if this output is the bundle of an entry.
    pub entry_point: Option<PathBuf>,
    /// Absolute contributing inputs, in bundler order.
    pub inputs: Vec<PathBuf>,
}

#[derive(Debug, Error)]
pub enum BundleError {
    #[error("bundler command is empty")]
    NoCommand,

    #[error("bundler `{0}` not found in PATH")]
    NotFound(String),

    #[error("bundler failed: {0}")]
    Failed(String),

    #[error("invalid browsers list `{0}`: {1}")]
    Targets(String, String),

    #[error("malformed bundler metafile")]
    Metafile(#[source] serde_json::Error),

    #[error("failed to read bundler output")]
    Io(#[from] std::io::Error),
}

/// Something that turns entry points into output files.
pub trait Bundler: Send + Sync {
    fn build(&self, request: &BundleRequest) -> Result<Vec<OutputFile>, BundleError>;
}

/// Compute the external list: platform built-ins minus the whitelist, plus extras.
pub fn externals_for(not_external: &[String], extra: &[String]) -> Vec<String> {
    let mut externals = vec![ENGINE_MODULES.to_string()];
    externals.extend(
        NODE_BUILTINS
            .iter()
            .filter(|name| !not_external.iter().any(|n| n == *name))
            .map(|name| name.to_string()),
    );
    for name in extra {
        if !externals.contains(name) {
            externals.push(name.clone());
        }
    }
    externals
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_externals_whitelist_and_extra() {
        let externals = externals_for(&["fs".to_string()], &["lodash".to_string(), "path".to_string()]);
        assert_eq!(externals[0], ENGINE_MODULES);
        assert!(!externals.contains(&"fs".to_string()));
        assert!(externals.contains(&"crypto".to_string()));
        assert_eq!(externals.last().map(String::as_str), Some("lodash"));
        assert_eq!(externals.iter().filter(|e| *e == "path").count(), 1);
    }

    #[test]
    fn test_externals_default() {
        let externals = externals_for(&[], &[]);
        assert_eq!(externals.len(), NODE_BUILTINS.len() + 1);
    }
}
