//! Update orchestrator
//!
//! Top-level driver for one run: resolve the tag, fetch and filter the
//! transactions, issue one batched assignment call per requested type, then
//! walk the edit cycle per transaction and aggregate the outcome. Errors
//! before the edit cycle abort the run as `ProcessingFailed`; errors inside
//! it are collected per transaction and never halt the remaining ones.

use std::collections::HashMap;

use tracing::{debug, info, warn};

use crate::assign::BatchAssignmentService;
use crate::catalog::CatalogValidator;
use crate::edit_cycle::EditCycleController;
use crate::error::{Result, ValidationError, ValidationField};
use crate::interact::Prompter;
use crate::ledger::LedgerService;
use crate::models::{AssignmentResults, AssignmentType, Transaction, UpdateMode};
use crate::rules::BusinessRules;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    /// The tag does not exist in the ledger.
    NoTag,
    /// The tag exists but no eligible transaction carries it.
    EmptyTag,
    /// A fetch or catalog call failed before the edit cycle.
    ProcessingFailed,
    /// The edit cycle ran; counts and errors are meaningful.
    HasResults,
}

/// One transaction's failure, as shown in the end-of-run report.
#[derive(Debug, Clone)]
pub struct TransactionError {
    pub description: String,
    pub field: ValidationField,
    pub message: String,
    pub suggestion: Option<String>,
}

impl TransactionError {
    fn from_validation(description: &str, err: ValidationError) -> Self {
        Self {
            description: description.to_string(),
            field: err.field,
            message: err.user_message,
            suggestion: err.suggestion,
        }
    }
}

/// Aggregated result of one run.
#[derive(Debug)]
pub struct RunOutcome {
    pub status: RunStatus,
    pub updated: usize,
    pub errors: Vec<TransactionError>,
    pub failure: Option<String>,
}

impl RunOutcome {
    fn no_tag() -> Self {
        Self {
            status: RunStatus::NoTag,
            updated: 0,
            errors: Vec::new(),
            failure: None,
        }
    }

    fn empty_tag() -> Self {
        Self {
            status: RunStatus::EmptyTag,
            updated: 0,
            errors: Vec::new(),
            failure: None,
        }
    }

    fn processing_failed(message: String) -> Self {
        Self {
            status: RunStatus::ProcessingFailed,
            updated: 0,
            errors: Vec::new(),
            failure: Some(message),
        }
    }

    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    /// Render the consolidated error report, if there is anything to report.
    pub fn error_report(&self) -> Option<String> {
        if self.errors.is_empty() {
            return None;
        }

        let mut out = format!("{} transaction(s) could not be updated:\n", self.errors.len());
        for err in &self.errors {
            out.push_str(&format!("\n  {} [{}]\n", err.description, err.field));
            out.push_str(&format!("    {}\n", err.message));
            if let Some(suggestion) = &err.suggestion {
                out.push_str(&format!("    suggested value: {:?}\n", suggestion));
            }
        }
        Some(out)
    }
}

enum Prepared {
    NoTag,
    Empty,
    Ready {
        transactions: Vec<Transaction>,
        validator: CatalogValidator,
        results: AssignmentResults,
    },
}

/// Top-level driver wiring the collaborators together for one run.
pub struct UpdateOrchestrator<'a> {
    ledger: &'a dyn LedgerService,
    assigner: &'a BatchAssignmentService,
    rules: &'a dyn BusinessRules,
    prompter: &'a dyn Prompter,
    skip_transfers: bool,
}

impl<'a> UpdateOrchestrator<'a> {
    pub fn new(
        ledger: &'a dyn LedgerService,
        assigner: &'a BatchAssignmentService,
        rules: &'a dyn BusinessRules,
        prompter: &'a dyn Prompter,
        skip_transfers: bool,
    ) -> Self {
        Self {
            ledger,
            assigner,
            rules,
            prompter,
            skip_transfers,
        }
    }

    pub async fn update_transactions_by_tag(
        &self,
        tag: &str,
        mode: UpdateMode,
        dry_run: bool,
    ) -> RunOutcome {
        match self.prepare(tag, mode).await {
            Ok(Prepared::NoTag) => RunOutcome::no_tag(),
            Ok(Prepared::Empty) => RunOutcome::empty_tag(),
            Ok(Prepared::Ready {
                transactions,
                validator,
                results,
            }) => self.drive(&transactions, &validator, &results, dry_run).await,
            Err(err) => {
                warn!(error = %err, "run aborted before the edit cycle");
                // the one place an escaping error changes kind
                let failure = crate::error::Error::ProcessingFailed(err.to_string());
                RunOutcome::processing_failed(failure.to_string())
            }
        }
    }

    async fn prepare(&self, tag: &str, mode: UpdateMode) -> Result<Prepared> {
        if !self.ledger.tag_exists(tag).await? {
            info!(tag, "tag does not exist");
            return Ok(Prepared::NoTag);
        }

        let fetched = self.ledger.get_transactions_by_tag(tag).await?;
        let total = fetched.len();
        let transactions: Vec<Transaction> = fetched
            .into_iter()
            .filter(|tx| self.rules.is_eligible(tx, self.skip_transfers))
            .collect();
        debug!(
            tag,
            total,
            eligible = transactions.len(),
            "transactions fetched"
        );
        if transactions.is_empty() {
            return Ok(Prepared::Empty);
        }

        let validator = CatalogValidator::initialize(self.ledger, mode).await?;

        // one batched call per requested type, covering the whole set at once
        let (categories, budgets) = tokio::try_join!(
            async {
                if mode.includes_categories() {
                    self.assigner
                        .assign(
                            &transactions,
                            AssignmentType::Category,
                            &validator.category_names(),
                        )
                        .await
                } else {
                    Ok(HashMap::new())
                }
            },
            async {
                if mode.includes_budgets() {
                    let names: Vec<String> = validator
                        .budget_options()
                        .into_iter()
                        .map(|b| b.name)
                        .collect();
                    self.assigner
                        .assign(&transactions, AssignmentType::Budget, &names)
                        .await
                } else {
                    Ok(HashMap::new())
                }
            },
        )?;

        Ok(Prepared::Ready {
            transactions,
            validator,
            results: AssignmentResults {
                categories,
                budgets,
            },
        })
    }

    async fn drive(
        &self,
        transactions: &[Transaction],
        validator: &CatalogValidator,
        results: &AssignmentResults,
        dry_run: bool,
    ) -> RunOutcome {
        let controller =
            EditCycleController::new(validator, self.rules, self.prompter, self.ledger, dry_run);

        let mut updated = 0usize;
        let mut errors = Vec::new();

        for tx in transactions {
            if tx.journal_id.trim().is_empty() {
                debug!(description = %tx.description, "skipping transaction without journal identifier");
                continue;
            }

            match controller.update_transaction(tx, results).await {
                Ok(outcome) if outcome.counts_as_updated() => updated += 1,
                Ok(_) => {}
                Err(err) => {
                    debug!(journal_id = %tx.journal_id, field = %err.field, "transaction failed");
                    errors.push(TransactionError::from_validation(&tx.description, err));
                }
            }
        }

        info!(updated, errors = errors.len(), "run complete");
        RunOutcome {
            status: RunStatus::HasResults,
            updated,
            errors,
            failure: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::{LlmClient, MockBackend, RetryPolicy, RetryingCallClient};
    use crate::interact::{Decision, ScriptedPrompter};
    use crate::ledger::MockLedger;
    use crate::models::{Budget, Category, TransactionType};
    use crate::rules::LedgerRules;
    use chrono::NaiveDate;
    use std::time::Duration;

    fn tx(journal_id: &str, description: &str, transaction_type: TransactionType) -> Transaction {
        Transaction {
            journal_id: journal_id.to_string(),
            description: description.to_string(),
            amount: -10.0,
            date: NaiveDate::from_ymd_opt(2024, 4, 4).unwrap(),
            transaction_type,
            source_id: None,
            source_name: None,
            destination_id: None,
            destination_name: None,
            currency_id: None,
            currency_code: None,
            currency_symbol: None,
            category_name: None,
            budget_id: None,
            budget_name: None,
            tags: vec!["ai-scan".to_string()],
        }
    }

    fn assigner(mock: MockBackend) -> BatchAssignmentService {
        let policy = RetryPolicy {
            max_retries: 0,
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(2),
        };
        BatchAssignmentService::new(RetryingCallClient::new(LlmClient::Mock(mock), 2, policy))
    }

    fn seeded_ledger(transactions: Vec<Transaction>) -> MockLedger {
        let mut ledger = MockLedger::new("ai-scan", transactions);
        ledger.categories = vec![Category::named("Groceries"), Category::named("Dining")];
        ledger.budgets = vec![Budget::new("1", "Household")];
        ledger
    }

    #[tokio::test]
    async fn test_unknown_tag_short_circuits() {
        let ledger = seeded_ledger(vec![tx("1", "A", TransactionType::Withdrawal)]);
        let service = assigner(MockBackend::new());
        let prompter = ScriptedPrompter::new();
        let orchestrator =
            UpdateOrchestrator::new(&ledger, &service, &LedgerRules, &prompter, true);

        let outcome = orchestrator
            .update_transactions_by_tag("nope", UpdateMode::Both, false)
            .await;
        assert_eq!(outcome.status, RunStatus::NoTag);
        assert_eq!(outcome.updated, 0);
        // the transaction fetch is never attempted
        assert_eq!(ledger.fetches(), 0);
    }

    #[tokio::test]
    async fn test_all_filtered_out_is_empty_tag() {
        let ledger = seeded_ledger(vec![
            tx("1", "MOVE TO SAVINGS", TransactionType::Transfer),
            tx("2", "MOVE BACK", TransactionType::Transfer),
        ]);
        let service = assigner(MockBackend::new());
        let prompter = ScriptedPrompter::new();
        let orchestrator =
            UpdateOrchestrator::new(&ledger, &service, &LedgerRules, &prompter, true);

        let outcome = orchestrator
            .update_transactions_by_tag("ai-scan", UpdateMode::Both, false)
            .await;
        assert_eq!(outcome.status, RunStatus::EmptyTag);
    }

    #[tokio::test]
    async fn test_fetch_failure_is_processing_failed() {
        let mut ledger = seeded_ledger(vec![tx("1", "A", TransactionType::Withdrawal)]);
        ledger.fail_fetch = true;
        let service = assigner(MockBackend::new());
        let prompter = ScriptedPrompter::new();
        let orchestrator =
            UpdateOrchestrator::new(&ledger, &service, &LedgerRules, &prompter, true);

        let outcome = orchestrator
            .update_transactions_by_tag("ai-scan", UpdateMode::Both, false)
            .await;
        assert_eq!(outcome.status, RunStatus::ProcessingFailed);
        assert!(outcome.failure.as_deref().unwrap().contains("fetch failed"));
    }

    #[tokio::test]
    async fn test_catalog_failure_is_processing_failed() {
        let mut ledger = seeded_ledger(vec![tx("1", "A", TransactionType::Withdrawal)]);
        ledger.fail_catalogs = true;
        let service = assigner(MockBackend::new());
        let prompter = ScriptedPrompter::new();
        let orchestrator =
            UpdateOrchestrator::new(&ledger, &service, &LedgerRules, &prompter, true);

        let outcome = orchestrator
            .update_transactions_by_tag("ai-scan", UpdateMode::Both, false)
            .await;
        assert_eq!(outcome.status, RunStatus::ProcessingFailed);
    }

    #[tokio::test]
    async fn test_one_batched_call_per_requested_type() {
        let mock = MockBackend::with_responses(&[
            r#"{"assignments": ["Groceries", "Dining"]}"#,
            r#"{"assignments": ["Household", "(no budget)"]}"#,
        ]);
        let ledger = seeded_ledger(vec![
            tx("1", "ALDI", TransactionType::Withdrawal),
            tx("2", "CAFE", TransactionType::Withdrawal),
        ]);
        let service = assigner(mock.clone());
        let prompter =
            ScriptedPrompter::with_decisions(vec![Decision::ApplyBoth, Decision::ApplyBoth]);
        let orchestrator =
            UpdateOrchestrator::new(&ledger, &service, &LedgerRules, &prompter, true);

        let outcome = orchestrator
            .update_transactions_by_tag("ai-scan", UpdateMode::Both, false)
            .await;
        assert_eq!(outcome.status, RunStatus::HasResults);
        assert_eq!(outcome.updated, 2);
        assert_eq!(outcome.error_count(), 0);
        // two transactions, but exactly one completion call per type
        assert_eq!(mock.calls(), 2);
    }

    #[tokio::test]
    async fn test_mixed_success_and_failure_both_reported() {
        let mock = MockBackend::with_responses(&[
            r#"{"assignments": ["Groceries", "Rocketry"]}"#,
        ]);
        let ledger = seeded_ledger(vec![
            tx("1", "ALDI", TransactionType::Withdrawal),
            tx("2", "SPACE SHOP", TransactionType::Withdrawal),
        ]);
        let service = assigner(mock);
        let prompter = ScriptedPrompter::with_decisions(vec![Decision::ApplyCategory]);
        let orchestrator =
            UpdateOrchestrator::new(&ledger, &service, &LedgerRules, &prompter, true);

        let outcome = orchestrator
            .update_transactions_by_tag("ai-scan", UpdateMode::CategoriesOnly, false)
            .await;
        assert_eq!(outcome.status, RunStatus::HasResults);
        assert_eq!(outcome.updated, 1);
        assert_eq!(outcome.error_count(), 1);

        let report = outcome.error_report().unwrap();
        assert!(report.starts_with("1 transaction(s) could not be updated"));
        assert!(report.contains("SPACE SHOP"));
        assert!(report.contains("[category]"));
        assert!(report.contains("Rocketry"));
    }

    #[tokio::test]
    async fn test_interrupt_on_one_transaction_does_not_halt_the_run() {
        let mock = MockBackend::with_responses(&[
            r#"{"assignments": ["Groceries", "Dining"]}"#,
        ]);
        let ledger = seeded_ledger(vec![
            tx("1", "ALDI", TransactionType::Withdrawal),
            tx("2", "CAFE", TransactionType::Withdrawal),
        ]);
        let service = assigner(mock);
        let prompter = ScriptedPrompter::new();
        prompter.push_interrupt(); // first transaction: input closed
        prompter.push_decision(Decision::ApplyCategory); // second still processed
        let orchestrator =
            UpdateOrchestrator::new(&ledger, &service, &LedgerRules, &prompter, true);

        let outcome = orchestrator
            .update_transactions_by_tag("ai-scan", UpdateMode::CategoriesOnly, false)
            .await;
        assert_eq!(outcome.updated, 1);
        assert_eq!(outcome.error_count(), 1);
        assert_eq!(outcome.errors[0].field, ValidationField::UserInterrupt);
        assert_eq!(ledger.updates().len(), 1);
        assert_eq!(ledger.updates()[0].journal_id, "2");
    }

    #[tokio::test]
    async fn test_transactions_without_journal_id_silently_skipped() {
        let mock = MockBackend::with_responses(&[r#"{"assignments": ["Groceries", "Dining"]}"#]);
        let ledger = seeded_ledger(vec![
            tx("", "NO JOURNAL", TransactionType::Withdrawal),
            tx("2", "CAFE", TransactionType::Withdrawal),
        ]);
        let service = assigner(mock);
        let prompter = ScriptedPrompter::with_decisions(vec![Decision::ApplyCategory]);
        let orchestrator =
            UpdateOrchestrator::new(&ledger, &service, &LedgerRules, &prompter, true);

        let outcome = orchestrator
            .update_transactions_by_tag("ai-scan", UpdateMode::CategoriesOnly, false)
            .await;
        // the id-less transaction counts as neither updated nor errored
        assert_eq!(outcome.updated, 1);
        assert_eq!(outcome.error_count(), 0);
    }

    #[tokio::test]
    async fn test_dry_run_counts_previews_without_updates() {
        let mock = MockBackend::with_responses(&[r#"{"assignments": ["Groceries"]}"#]);
        let ledger = seeded_ledger(vec![tx("1", "ALDI", TransactionType::Withdrawal)]);
        let service = assigner(mock);
        let prompter = ScriptedPrompter::new();
        let orchestrator =
            UpdateOrchestrator::new(&ledger, &service, &LedgerRules, &prompter, true);

        let outcome = orchestrator
            .update_transactions_by_tag("ai-scan", UpdateMode::CategoriesOnly, true)
            .await;
        assert_eq!(outcome.status, RunStatus::HasResults);
        assert_eq!(outcome.updated, 1);
        assert!(ledger.updates().is_empty());
    }
}
