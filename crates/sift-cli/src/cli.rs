//! CLI argument definitions using clap
//!
//! This module contains all the clap structs and enums for parsing CLI
//! arguments. The actual command implementations are in the `commands`
//! module.

use clap::{Parser, Subcommand, ValueEnum};
use sift_core::UpdateMode;

/// Sift - AI-assisted transaction categorization
#[derive(Parser)]
#[command(name = "sift")]
#[command(about = "Categorize ledger transactions with LLM suggestions", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Categorize and update the transactions carrying a tag
    Update {
        /// Tag selecting the transactions to process
        tag: String,

        /// What to assign: categories, budgets, or both
        #[arg(short, long, value_enum, default_value = "both")]
        mode: Mode,

        /// Compute and display proposed changes without persisting them
        #[arg(long)]
        dry_run: bool,

        /// Also process transfers (skipped by default)
        #[arg(long)]
        include_transfers: bool,
    },

    /// Check connectivity to the ledger server and the LLM backend
    Health,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Mode {
    Both,
    Categories,
    Budgets,
}

impl From<Mode> for UpdateMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Both => UpdateMode::Both,
            Mode::Categories => UpdateMode::CategoriesOnly,
            Mode::Budgets => UpdateMode::BudgetsOnly,
        }
    }
}
