//! Dev loop: watch, compile incrementally, preview, live reload.
//!
//! The actor system drives a [`DevPass`] once per batch of settled
//! changes. The pass owns the plugin cache and the preview supervisor, so
//! both live exactly as long as the dev session.

use anyhow::Result;
use std::path::PathBuf;

use crate::actor::Coordinator;
use crate::actor::rebuild::BuildPass;
use crate::bundler::{Bundler, Esbuild};
use crate::config::PlugsmithConfig;
use crate::core::{BuildMode, is_shutdown, register_shutdown};
use crate::engine::{Filter, load_wiki_records};
use crate::log;
use crate::logger::{status_error, status_success};
use crate::plugin::{ChangeSet, CompileContext, PluginCache, compile};
use crate::preview::PreviewSupervisor;
use crate::utils::plural::plural_count;

/// One dev session's compile + preview state.
pub struct DevPass<B: Bundler> {
    bundler: B,
    exclude: Option<Filter>,
    src: PathBuf,
    cache: PluginCache,
    supervisor: PreviewSupervisor,
}

impl<B: Bundler + 'static> DevPass<B> {
    pub fn new(bundler: B, exclude: Option<Filter>, src: PathBuf, supervisor: PreviewSupervisor) -> Self {
        Self {
            bundler,
            exclude,
            src,
            cache: PluginCache::new(),
            supervisor,
        }
    }
}

impl<B: Bundler + 'static> BuildPass for DevPass<B> {
    fn run(&mut self, changes: ChangeSet) -> Result<()> {
        let ctx = CompileContext {
            bundler: &self.bundler,
            mode: BuildMode::DEVELOPMENT,
            exclude: self.exclude.as_ref(),
            progress: changes.is_full(),
        };
        let report = compile(&self.src, &changes, &mut self.cache, &ctx)?;

        for (dir, e) in &report.failures {
            log!("compile"; "{}: {:#}", dir.display(), e);
        }

        // Ctrl+C arrived mid-pass; the supervisor is about to be shut down
        if is_shutdown() {
            return Ok(());
        }

        self.supervisor.swap(&report.plugins)?;

        let summary = format!(
            "{} ({} compiled, {} cached)",
            plural_count(report.plugins.len(), "plugin"),
            report.compiled,
            report.cached
        );
        match report.failures.first() {
            None => status_success(&summary),
            Some((dir, e)) => status_error(
                &format!("{summary}, {} failed", report.failures.len()),
                &format!("{}: {:#}", dir.display(), e),
            ),
        }
        Ok(())
    }

    fn shutdown(&mut self) {
        self.supervisor.shutdown();
    }
}

/// Run `plugsmith dev` until Ctrl+C.
pub fn run_dev(config: &PlugsmithConfig) -> Result<()> {
    let bundler = Esbuild::new(config.build.bundler.clone())?;
    let exclude = config.build.exclude_filter()?;
    let base = load_wiki_records(&config.serve.wiki)?;
    crate::debug!("dev"; "{} base wiki records from {}", base.len(), config.serve.wiki.display());

    let (shutdown_tx, shutdown_rx) = crossbeam::channel::bounded(1);
    register_shutdown(shutdown_tx);

    let preview_addr = config.serve.preview_addr();
    let src = config.build.src.clone();
    let coordinator = Coordinator::new(vec![src.clone()], config.serve.settle())
        .with_ws(config.serve.interface, config.serve.ws_port)
        .with_shutdown_signal(shutdown_rx);

    let rt = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()?;

    rt.block_on(coordinator.run(move |ws_port| {
        log!("serve"; "preview at http://{} (live reload on port {})", preview_addr, ws_port);
        let supervisor = PreviewSupervisor::new(preview_addr, ws_port, base);
        Ok(DevPass::new(bundler, exclude, src, supervisor))
    }))
}
