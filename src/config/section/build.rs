//! `[build]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [build]
//! src = "src"              # Each sub-directory with a plugin.info is a plugin
//! output = "dist"          # Production output directory
//! exclude = ""             # Filter expression; matching plugin titles are skipped
//! bundler = ["esbuild"]    # Bundler command line (e.g. ["npx", "esbuild"])
//! ```

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::config::ConfigDiagnostics;
use crate::engine::{Filter, FilterError};

/// Build settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// Plugin source root.
    pub src: PathBuf,

    /// Production output directory.
    pub output: PathBuf,

    /// Exclusion filter applied to plugin titles (empty: exclude nothing).
    pub exclude: String,

    /// Bundler command; the first element must be on `PATH`.
    pub bundler: Vec<String>,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            src: "src".into(),
            output: "dist".into(),
            exclude: String::new(),
            bundler: vec!["esbuild".into()],
        }
    }
}

impl BuildConfig {
    /// Parsed exclusion filter, `None` when blank.
    pub fn exclude_filter(&self) -> Result<Option<Filter>, FilterError> {
        if self.exclude.trim().is_empty() {
            return Ok(None);
        }
        Filter::parse(&self.exclude).map(Some)
    }

    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        if let Err(e) = self.exclude_filter() {
            diag.error("build.exclude", e.to_string());
        }

        match self.bundler.first() {
            None => diag.error("build.bundler", "bundler command is empty"),
            Some(program) => {
                if which::which(program).is_err() {
                    diag.error_with_hint(
                        "build.bundler",
                        format!("`{program}` not found"),
                        "install esbuild, or set e.g. bundler = [\"npx\", \"esbuild\"]",
                    );
                }
            }
        }
    }
}
