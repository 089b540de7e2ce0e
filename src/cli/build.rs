//! Production build.
//!
//! One full compile pass with minification and content hashes, then the
//! plugin records are written to the output directory:
//!
//! ```text
//! <output>/<title>.json                    # default
//! <output>/library/tiddlers.json           # --library: records without text
//! <output>/library/tiddlers/<title>.json   # --library: one file per plugin
//! ```
//!
//! Titles are percent-encoded into file names.

use anyhow::{Context, Result, bail};
use std::fs;
use std::path::Path;
use std::sync::Arc;

use crate::bundler::Esbuild;
use crate::config::PlugsmithConfig;
use crate::core::BuildMode;
use crate::log;
use crate::plugin::{ChangeSet, CompileContext, PluginCache, compile};
use crate::record::Record;
use crate::utils::path::encode_title;
use crate::utils::plural::plural_count;

/// Build all plugins under `build.src` into `build.output`.
pub fn build_plugins(config: &PlugsmithConfig, library: bool) -> Result<()> {
    let bundler = Esbuild::new(config.build.bundler.clone())?;
    let exclude = config.build.exclude_filter()?;

    let ctx = CompileContext {
        bundler: &bundler,
        mode: BuildMode::PRODUCTION,
        exclude: exclude.as_ref(),
        progress: true,
    };
    let mut cache = PluginCache::new();
    let report = compile(&config.build.src, &ChangeSet::Full, &mut cache, &ctx)?;

    if !report.is_ok() {
        for (dir, e) in &report.failures {
            log!("error"; "{}: {:#}", dir.display(), e);
        }
        bail!("{} failed to build", plural_count(report.failures.len(), "plugin"));
    }

    let written = write_plugins(&report.plugins, &config.build.output, library)?;
    log!("build"; "{} written to {}", plural_count(written, "plugin"), config.build.output.display());
    Ok(())
}

/// Write `plugins` to `output`; returns the number of plugin files.
pub fn write_plugins(plugins: &[Arc<Record>], output: &Path, library: bool) -> Result<usize> {
    let dir = if library {
        output.join("library").join("tiddlers")
    } else {
        output.to_path_buf()
    };
    fs::create_dir_all(&dir).with_context(|| format!("failed to create {}", dir.display()))?;

    let mut written = 0;
    for plugin in plugins {
        let Some(title) = plugin.title() else { continue };
        let path = dir.join(format!("{}.json", encode_title(title)));
        let json = serde_json::to_string(plugin.as_ref())?;
        fs::write(&path, json).with_context(|| format!("failed to write {}", path.display()))?;
        crate::debug!("build"; "wrote {}", path.display());
        written += 1;
    }

    if library {
        let skinny: Vec<Record> = plugins.iter().map(|plugin| plugin.skinny()).collect();
        let index = output.join("library").join("tiddlers.json");
        fs::write(&index, serde_json::to_string_pretty(&skinny)?)
            .with_context(|| format!("failed to write {}", index.display()))?;
    }

    Ok(written)
}
