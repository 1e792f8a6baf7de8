//! Update command - run the categorization pipeline for one tag

use anyhow::{Context, Result};

use sift_core::{
    BatchAssignmentService, Config, LedgerHttpClient, LedgerRules, LlmClient, RetryingCallClient,
    RunStatus, UpdateMode, UpdateOrchestrator,
};

use crate::console::ConsolePrompter;

/// Categorize and update the transactions carrying `tag`.
pub async fn cmd_update(
    tag: &str,
    mode: UpdateMode,
    dry_run: bool,
    include_transfers: bool,
) -> Result<()> {
    let config = Config::from_env().context("configuration incomplete")?;

    let ledger = LedgerHttpClient::from_config(&config.ledger);
    let llm = LlmClient::from_config(&config.llm);
    let gate = RetryingCallClient::from_config(llm, &config.llm);
    let assigner = BatchAssignmentService::new(gate);
    let prompter = ConsolePrompter::new();
    let rules = LedgerRules;

    let orchestrator =
        UpdateOrchestrator::new(&ledger, &assigner, &rules, &prompter, !include_transfers);

    if dry_run {
        println!("🔍 Dry run — no changes will be sent to the ledger.");
    }

    let outcome = orchestrator
        .update_transactions_by_tag(tag, mode, dry_run)
        .await;

    match outcome.status {
        RunStatus::NoTag => {
            println!("Tag {:?} does not exist in the ledger.", tag);
        }
        RunStatus::EmptyTag => {
            println!("No eligible transactions carry tag {:?}.", tag);
        }
        RunStatus::ProcessingFailed => {
            let message = outcome
                .failure
                .unwrap_or_else(|| "unknown failure".to_string());
            anyhow::bail!("{}", message);
        }
        RunStatus::HasResults => {
            println!();
            println!(
                "✅ Updated {} transaction(s), {} error(s)",
                outcome.updated,
                outcome.error_count()
            );
            if let Some(report) = outcome.error_report() {
                println!();
                println!("{}", report);
            }
        }
    }

    Ok(())
}
