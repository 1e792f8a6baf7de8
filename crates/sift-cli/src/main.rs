//! Sift CLI - AI-assisted transaction categorization
//!
//! Usage:
//!   sift update <tag>            Categorize transactions carrying <tag>
//!   sift update <tag> --dry-run  Show proposals without persisting
//!   sift health                  Check ledger and LLM connectivity

mod cli;
mod commands;
mod console;

#[cfg(test)]
mod tests;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();

    match cli.command {
        Commands::Update {
            tag,
            mode,
            dry_run,
            include_transfers,
        } => commands::cmd_update(&tag, mode.into(), dry_run, include_transfers).await,
        Commands::Health => commands::cmd_health().await,
    }
}
