//! Command-line interface definitions.

use clap::{ColorChoice, Parser, Subcommand};
use std::net::IpAddr;
use std::path::PathBuf;

/// Incremental plugin compiler with a live-reloading preview
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Control colored output (auto, always, never)
    #[arg(long, global = true, default_value = "auto")]
    pub color: ColorChoice,

    /// Enable verbose output for debugging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Config file path (default: plugsmith.toml)
    #[arg(short = 'C', long, global = true, default_value = "plugsmith.toml", value_hint = clap::ValueHint::FilePath)]
    pub config: PathBuf,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Watch plugin sources, serve a preview and reload it on change
    #[command(visible_alias = "d")]
    Dev {
        /// Network interface to bind (e.g., 127.0.0.1, 0.0.0.0)
        #[arg(short, long)]
        interface: Option<IpAddr>,

        /// Preview port
        #[arg(short, long)]
        port: Option<u16>,

        /// First live-reload port to try
        #[arg(short, long)]
        ws_port: Option<u16>,
    },

    /// Compile every plugin for production
    #[command(visible_alias = "b")]
    Build {
        #[command(flatten)]
        args: BuildArgs,
    },
}

/// Build command arguments.
#[derive(clap::Args, Debug, Clone)]
pub struct BuildArgs {
    /// Output directory path (relative to project root)
    #[arg(short, long, value_hint = clap::ValueHint::DirPath)]
    pub output: Option<PathBuf>,

    /// Write a plugin library layout instead of one file per plugin
    #[arg(short, long)]
    pub library: bool,

    /// Filter expression; matching plugin titles are not built
    #[arg(short, long)]
    pub exclude: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_build() {
        let cli = Cli::parse_from(["plugsmith", "-v", "build", "--library", "-o", "out", "-e", "[[x]]"]);
        assert!(cli.verbose);
        let Commands::Build { args } = cli.command else {
            panic!("expected build");
        };
        assert!(args.library);
        assert_eq!(args.output, Some(PathBuf::from("out")));
        assert_eq!(args.exclude.as_deref(), Some("[[x]]"));
    }

    #[test]
    fn test_parse_dev_with_global_flags_after() {
        let cli = Cli::parse_from(["plugsmith", "dev", "-p", "9000", "-C", "alt.toml"]);
        assert_eq!(cli.config, PathBuf::from("alt.toml"));
        assert!(matches!(cli.command, Commands::Dev { port: Some(9000), .. }));
    }

    #[test]
    fn test_cli_definition() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
