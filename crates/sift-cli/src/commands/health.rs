//! Health command - connectivity checks for both backends

use anyhow::{Context, Result};

use sift_core::{Config, LedgerHttpClient, LlmBackend, LlmClient};

/// Check that the ledger server and the LLM backend are reachable.
pub async fn cmd_health() -> Result<()> {
    let config = Config::from_env().context("configuration incomplete")?;

    let ledger = LedgerHttpClient::from_config(&config.ledger);
    let llm = LlmClient::from_config(&config.llm);

    let ledger_ok = ledger.health_check().await;
    let llm_ok = llm.health_check().await;

    println!(
        "{} ledger server at {}",
        if ledger_ok { "✅" } else { "❌" },
        config.ledger.base_url
    );
    println!(
        "{} LLM backend {} at {}",
        if llm_ok { "✅" } else { "❌" },
        llm.model(),
        llm.host()
    );

    if !(ledger_ok && llm_ok) {
        anyhow::bail!("one or more backends are unreachable");
    }
    Ok(())
}
