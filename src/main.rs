//! canopy - a live, filesystem-backed project tree
//!
//! canopy provides:
//! - A tree mirror of a project directory (hidden entries and the .canopy
//!   service directory excluded)
//! - Search filtering over paths and text content
//! - Validated structural mutations (create/delete/rename/move)
//! - Watcher-driven refresh with single-flight coalescing
//! - Unified output format (jsonl/json/md/tree)

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    cli::run(cli)
}
