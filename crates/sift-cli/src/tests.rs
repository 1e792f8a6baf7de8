//! CLI tests
//!
//! Argument parsing and display helper tests.

use clap::Parser;
use sift_core::UpdateMode;

use crate::cli::{Cli, Commands, Mode};
use crate::commands::truncate;

#[test]
fn test_parse_update_defaults() {
    let cli = Cli::try_parse_from(["sift", "update", "ai-scan"]).unwrap();
    match cli.command {
        Commands::Update {
            tag,
            mode,
            dry_run,
            include_transfers,
        } => {
            assert_eq!(tag, "ai-scan");
            assert_eq!(mode, Mode::Both);
            assert!(!dry_run);
            assert!(!include_transfers);
        }
        _ => panic!("expected update command"),
    }
    assert!(!cli.verbose);
}

#[test]
fn test_parse_update_flags() {
    let cli = Cli::try_parse_from([
        "sift",
        "update",
        "ai-scan",
        "--mode",
        "budgets",
        "--dry-run",
        "--include-transfers",
        "--verbose",
    ])
    .unwrap();
    match cli.command {
        Commands::Update {
            mode,
            dry_run,
            include_transfers,
            ..
        } => {
            assert_eq!(mode, Mode::Budgets);
            assert!(dry_run);
            assert!(include_transfers);
        }
        _ => panic!("expected update command"),
    }
    assert!(cli.verbose);
}

#[test]
fn test_parse_health() {
    let cli = Cli::try_parse_from(["sift", "health"]).unwrap();
    assert!(matches!(cli.command, Commands::Health));
}

#[test]
fn test_update_requires_tag() {
    assert!(Cli::try_parse_from(["sift", "update"]).is_err());
}

#[test]
fn test_mode_maps_to_update_mode() {
    assert_eq!(UpdateMode::from(Mode::Both), UpdateMode::Both);
    assert_eq!(UpdateMode::from(Mode::Categories), UpdateMode::CategoriesOnly);
    assert_eq!(UpdateMode::from(Mode::Budgets), UpdateMode::BudgetsOnly);
}

#[test]
fn test_truncate() {
    assert_eq!(truncate("short", 10), "short");
    assert_eq!(truncate("exactly-ten", 11), "exactly-ten");
    let cut = truncate("a very long transaction description", 10);
    assert!(cut.ends_with('…'));
    assert_eq!(cut.chars().count(), 10);
}
