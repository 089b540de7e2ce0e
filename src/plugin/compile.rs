//! One compile pass over the plugin source root.
//!
//! Directories are compiled concurrently against a shared view of the
//! cache; results are published back into the cache sequentially once the
//! whole task group has joined.

use anyhow::{Context, Result};
use rayon::prelude::*;
use rustc_hash::FxHashMap;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::cache::{ChangeSet, PluginCache};
use super::meta::{PluginOptions, opts_out_of_minify, plugin_dirs, source_files};
use super::outputs::OutputMapper;
use super::policy::{CompileUnit, is_compileable};
use super::HASH;
use crate::asset::{ContentHash, minify_record};
use crate::bundler::{BundleRequest, Bundler, browsers_for, esbuild_targets, externals_for};
use crate::core::BuildMode;
use crate::engine::{Filter, PluginFolder, has_sidecar, load_plugin_folder};
use crate::logger::CompileProgress;
use crate::record::{Record, TEXT};
use crate::utils::path::normalize_path;

/// Everything a pass needs besides the cache.
pub struct CompileContext<'a> {
    pub bundler: &'a dyn Bundler,
    pub mode: BuildMode,
    /// Plugins whose title matches are left out.
    pub exclude: Option<&'a Filter>,
    /// Show a per-directory progress line.
    pub progress: bool,
}

/// Result of one pass.
#[derive(Debug, Default)]
pub struct CompileReport {
    /// Plugin aggregates in directory order.
    pub plugins: Vec<Arc<Record>>,
    /// Directories whose compile failed this pass.
    pub failures: Vec<(PathBuf, anyhow::Error)>,
    pub compiled: usize,
    pub cached: usize,
}

impl CompileReport {
    pub fn is_ok(&self) -> bool {
        self.failures.is_empty()
    }
}

enum DirOutcome {
    Cached(Arc<Record>),
    Compiled(Arc<Record>),
    /// No manifest, no title, malformed or excluded.
    Skipped,
    Failed(anyhow::Error),
}

#[derive(Serialize)]
struct Payload<'a> {
    tiddlers: &'a BTreeMap<String, Record>,
}

/// Compile every plugin directory under `base` that `changes` makes stale.
///
/// Non-stale directories are served from `cache`. A failed directory keeps
/// its previous cache entry but contributes no record to this pass.
pub fn compile(
    base: &Path,
    changes: &ChangeSet,
    cache: &mut PluginCache,
    ctx: &CompileContext<'_>,
) -> Result<CompileReport> {
    let base = normalize_path(base);
    let dirs = plugin_dirs(&base)?;

    let progress = ctx.progress.then(|| CompileProgress::new(dirs.len()));

    let outcomes: Vec<DirOutcome> = {
        let cache = &*cache;
        dirs.par_iter()
            .map(|dir| {
                let outcome = compile_dir(dir, changes, cache, ctx);
                if let Some(progress) = &progress {
                    progress.inc();
                }
                outcome
            })
            .collect()
    };

    if let Some(progress) = progress {
        progress.finish();
    }

    let mut report = CompileReport::default();
    for (dir, outcome) in dirs.into_iter().zip(outcomes) {
        match outcome {
            DirOutcome::Cached(record) => {
                report.cached += 1;
                report.plugins.push(record);
            }
            DirOutcome::Compiled(record) => {
                report.compiled += 1;
                cache.put(dir, Arc::clone(&record));
                report.plugins.push(record);
            }
            DirOutcome::Skipped => {
                cache.invalidate(&dir);
            }
            DirOutcome::Failed(e) => {
                report.failures.push((dir, e));
            }
        }
    }

    Ok(report)
}

fn compile_dir(
    dir: &Path,
    changes: &ChangeSet,
    cache: &PluginCache,
    ctx: &CompileContext<'_>,
) -> DirOutcome {
    if !cache.is_stale(dir, changes)
        && let Some(record) = cache.get(dir)
    {
        return DirOutcome::Cached(Arc::clone(record));
    }

    match build_plugin(dir, ctx) {
        Ok(Some(record)) => DirOutcome::Compiled(Arc::new(record)),
        Ok(None) => DirOutcome::Skipped,
        Err(e) => DirOutcome::Failed(e),
    }
}

fn build_plugin(dir: &Path, ctx: &CompileContext<'_>) -> Result<Option<Record>> {
    let PluginFolder {
        manifest,
        mut records,
    } = match load_plugin_folder(dir) {
        Ok(Some(folder)) => folder,
        Ok(None) => return Ok(None),
        Err(e) => {
            crate::log!("compile"; "skipping {}: {:#}", dir.display(), e);
            return Ok(None);
        }
    };

    let Some(title) = manifest.title().map(str::to_string) else {
        return Ok(None);
    };
    if ctx.exclude.is_some_and(|filter| filter.matches(&title)) {
        crate::debug!("compile"; "excluded {}", title);
        return Ok(None);
    }

    strip_unclaimed(&mut records);

    let options = PluginOptions::from_manifest(&manifest);
    let browsers = browsers_for(&options.browsers_list)?;

    let mut metas = FxHashMap::default();
    let mut entries = Vec::new();
    for (path, meta) in source_files(dir)? {
        if !is_compileable(&path) {
            metas.insert(path, meta);
            continue;
        }

        let unit = CompileUnit::new(path, meta);
        if let Some(source_title) = unit.meta.title() {
            records.remove(source_title);
        }
        if unit.keep_source {
            let text = fs::read_to_string(&unit.path)
                .with_context(|| format!("failed to read {}", unit.path.display()))?;
            if let Some(source) = unit.source_record(text)
                && let Some(source_title) = source.title().map(str::to_string)
            {
                records.insert(source_title, source);
            }
        }
        match unit.compiled_meta() {
            Some(compiled) => {
                entries.push(unit.path.clone());
                metas.insert(unit.path, compiled);
            }
            None => {
                metas.insert(unit.path, unit.meta);
            }
        }
    }

    let request = BundleRequest {
        entries,
        externals: externals_for(&options.node_modules_not_external, &options.external_modules),
        targets: esbuild_targets(&browsers),
        inline_sourcemap: ctx.mode.inline_sourcemap || options.source_map,
        out_base: dir.to_path_buf(),
    };
    let mut outputs = ctx
        .bundler
        .build(&request)
        .with_context(|| format!("failed to bundle {}", dir.display()))?;
    // Title collisions resolve in output path order
    outputs.sort_by(|a, b| a.path.cmp(&b.path));

    let mapper = OutputMapper {
        dir,
        plugin_title: &title,
        metas: &metas,
    };
    for file in outputs {
        if let Some(record) = mapper.map(file, &records)
            && let Some(record_title) = record.title().map(str::to_string)
        {
            records.insert(record_title, record);
        }
    }

    if ctx.mode.minify && options.minify {
        records = records
            .into_iter()
            .map(|(record_title, record)| {
                let record = if opts_out_of_minify(&record) {
                    record
                } else {
                    minify_record(record, browsers)
                };
                (record_title, record)
            })
            .collect();
    }

    let text = serde_json::to_string(&Payload { tiddlers: &records })?;
    let mut aggregate = manifest;
    aggregate.set(TEXT, text);

    if ctx.mode.hash {
        let serialized = serde_json::to_string(&aggregate)?;
        aggregate.set(HASH, ContentHash::of(serialized).to_hex());
    }

    crate::debug!("compile"; "{} ({} records)", title, records.len());
    Ok(Some(aggregate))
}

/// Drop records titled by an existing absolute path that have no sidecar.
///
/// Those are files the folder loader picked up without any metadata.
fn strip_unclaimed(records: &mut BTreeMap<String, Record>) {
    records.retain(|title, _| {
        let path = Path::new(title);
        !(path.is_absolute() && path.exists() && !has_sidecar(path))
    });
}
