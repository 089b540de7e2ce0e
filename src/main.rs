//! plugsmith - incremental plugin compiler with a live-reloading preview.

mod actor;
mod asset;
mod bundler;
mod cli;
mod config;
mod core;
mod embed;
mod engine;
mod logger;
mod plugin;
mod preview;
mod record;
mod utils;

use anyhow::Result;
use clap::{ColorChoice, Parser};
use cli::{Cli, Commands};
use config::PlugsmithConfig;

fn main() -> Result<()> {
    // Setup global Ctrl+C handler (before any blocking operations)
    core::setup_shutdown_handler()?;

    let cli = Cli::parse();

    // Set global color override based on CLI option
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }
    logger::set_verbose(cli.verbose);

    let config = PlugsmithConfig::load(&cli)?;

    match &cli.command {
        Commands::Build { args } => cli::build::build_plugins(&config, args.library),
        Commands::Dev { .. } => cli::dev::run_dev(&config),
    }
}
