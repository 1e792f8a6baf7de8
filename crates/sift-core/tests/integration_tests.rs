//! Integration tests for sift-core
//!
//! These tests exercise the full fetch → assign → validate → edit cycle
//! pipeline over scripted collaborators: a mock ledger, a scripted LLM
//! backend and a scripted prompter.

use std::time::Duration;

use chrono::NaiveDate;
use sift_core::{
    BatchAssignmentService, Budget, Category, Decision, LlmClient, MockBackend, MockLedger,
    LedgerRules, RetryPolicy, RetryingCallClient, RunStatus, ScriptedPrompter, Transaction,
    TransactionType, UpdateMode, UpdateOrchestrator, ValidationField,
};

fn tx(journal_id: &str, description: &str, transaction_type: TransactionType) -> Transaction {
    Transaction {
        journal_id: journal_id.to_string(),
        description: description.to_string(),
        amount: -42.0,
        date: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
        transaction_type,
        source_id: Some("1".to_string()),
        source_name: Some("Checking".to_string()),
        destination_id: Some("9".to_string()),
        destination_name: Some(description.to_string()),
        currency_id: Some("1".to_string()),
        currency_code: Some("EUR".to_string()),
        currency_symbol: Some("€".to_string()),
        category_name: None,
        budget_id: None,
        budget_name: None,
        tags: vec!["ai-scan".to_string()],
    }
}

fn seeded_ledger(transactions: Vec<Transaction>) -> MockLedger {
    let mut ledger = MockLedger::new("ai-scan", transactions);
    ledger.categories = vec![
        Category::named("Groceries"),
        Category::named("Bills & Utilities"),
        Category::named("Dining"),
    ];
    ledger.budgets = vec![
        Budget::new("1", "Household"),
        Budget::new("2", "Fun Money"),
    ];
    ledger
}

fn assignment_service(mock: MockBackend) -> BatchAssignmentService {
    let policy = RetryPolicy {
        max_retries: 1,
        base_delay: Duration::from_millis(1),
        max_delay: Duration::from_millis(2),
    };
    BatchAssignmentService::new(RetryingCallClient::new(LlmClient::Mock(mock), 4, policy))
}

#[tokio::test]
async fn full_run_updates_confirmed_transactions() {
    let mock = MockBackend::with_responses(&[
        r#"{"assignments": ["Groceries", "Bills & Utilities"]}"#,
        r#"{"assignments": ["Household", "(no budget)"]}"#,
    ]);
    let ledger = seeded_ledger(vec![
        tx("100", "ALDI SUED", TransactionType::Withdrawal),
        tx("101", "STADTWERKE", TransactionType::Withdrawal),
    ]);
    let service = assignment_service(mock);
    let prompter = ScriptedPrompter::with_decisions(vec![Decision::ApplyBoth, Decision::ApplyBoth]);
    let orchestrator = UpdateOrchestrator::new(&ledger, &service, &LedgerRules, &prompter, true);

    let outcome = orchestrator
        .update_transactions_by_tag("ai-scan", UpdateMode::Both, false)
        .await;

    assert_eq!(outcome.status, RunStatus::HasResults);
    assert_eq!(outcome.updated, 2);
    assert_eq!(outcome.error_count(), 0);
    assert!(outcome.error_report().is_none());

    let updates = ledger.updates();
    assert_eq!(updates.len(), 2);
    assert_eq!(updates[0].journal_id, "100");
    assert_eq!(updates[0].category_name.as_deref(), Some("Groceries"));
    assert_eq!(updates[0].budget_id.as_deref(), Some("1"));
    assert_eq!(updates[1].journal_id, "101");
    assert_eq!(updates[1].budget_id, None);
}

#[tokio::test]
async fn model_failure_degrades_to_no_assignments_not_an_error() {
    // both completion attempts fail (initial + one retry), for both types
    let mock = MockBackend::new();
    for _ in 0..4 {
        mock.push_failure("model unavailable");
    }
    let ledger = seeded_ledger(vec![tx("100", "ALDI SUED", TransactionType::Withdrawal)]);
    let service = assignment_service(mock);
    let prompter = ScriptedPrompter::new(); // would error if consulted
    let orchestrator = UpdateOrchestrator::new(&ledger, &service, &LedgerRules, &prompter, true);

    let outcome = orchestrator
        .update_transactions_by_tag("ai-scan", UpdateMode::Both, false)
        .await;

    // empty proposals match the current (empty) values, so nothing happens
    assert_eq!(outcome.status, RunStatus::HasResults);
    assert_eq!(outcome.updated, 0);
    assert_eq!(outcome.error_count(), 0);
    assert!(ledger.updates().is_empty());
}

#[tokio::test]
async fn unknown_suggestion_lands_in_the_error_report() {
    let mock = MockBackend::with_responses(&[
        r#"{"assignments": ["Groceries", "Rocketry Supplies"]}"#,
    ]);
    let ledger = seeded_ledger(vec![
        tx("100", "ALDI SUED", TransactionType::Withdrawal),
        tx("101", "SPACE SHOP", TransactionType::Withdrawal),
    ]);
    let service = assignment_service(mock);
    let prompter = ScriptedPrompter::with_decisions(vec![Decision::ApplyCategory]);
    let orchestrator = UpdateOrchestrator::new(&ledger, &service, &LedgerRules, &prompter, true);

    let outcome = orchestrator
        .update_transactions_by_tag("ai-scan", UpdateMode::CategoriesOnly, false)
        .await;

    assert_eq!(outcome.updated, 1);
    assert_eq!(outcome.error_count(), 1);
    assert_eq!(outcome.errors[0].field, ValidationField::Category);

    let report = outcome.error_report().unwrap();
    assert!(report.contains("SPACE SHOP"));
    assert!(report.contains("Rocketry Supplies"));
}

#[tokio::test]
async fn dry_run_previews_without_prompting_or_updating() {
    let mock = MockBackend::with_responses(&[r#"{"assignments": ["Dining"]}"#]);
    let ledger = seeded_ledger(vec![tx("100", "CAFE CENTRAL", TransactionType::Withdrawal)]);
    let service = assignment_service(mock);
    let prompter = ScriptedPrompter::new(); // would error if consulted
    let orchestrator = UpdateOrchestrator::new(&ledger, &service, &LedgerRules, &prompter, true);

    let outcome = orchestrator
        .update_transactions_by_tag("ai-scan", UpdateMode::CategoriesOnly, true)
        .await;

    assert_eq!(outcome.status, RunStatus::HasResults);
    assert_eq!(outcome.updated, 1);
    assert!(ledger.updates().is_empty());
}

#[tokio::test]
async fn edit_loop_survives_many_rounds_with_frozen_original() {
    let mock = MockBackend::with_responses(&[r#"{"assignments": ["Groceries"]}"#]);
    let ledger = seeded_ledger(vec![tx("100", "MARKET", TransactionType::Withdrawal)]);
    let service = assignment_service(mock);

    let prompter = ScriptedPrompter::with_decisions(vec![
        Decision::Edit,
        Decision::Edit,
        Decision::Edit,
        Decision::ApplyCategory,
    ]);
    for _ in 0..3 {
        prompter.push_field(sift_core::EditField::Category);
    }
    prompter.push_category(Some("Dining"));
    prompter.push_category(Some("Bills & Utilities"));
    prompter.push_category(Some("Groceries"));

    let orchestrator = UpdateOrchestrator::new(&ledger, &service, &LedgerRules, &prompter, true);
    let outcome = orchestrator
        .update_transactions_by_tag("ai-scan", UpdateMode::CategoriesOnly, false)
        .await;

    assert_eq!(outcome.updated, 1);

    let seen = prompter.seen();
    assert_eq!(seen.len(), 4);
    for (original, _) in &seen {
        assert_eq!(original.category, Some(Category::named("Groceries")));
    }
    assert_eq!(seen[1].1.category, Some(Category::named("Dining")));
    assert_eq!(
        seen[2].1.category,
        Some(Category::named("Bills & Utilities"))
    );
}

#[tokio::test]
async fn tag_statuses_are_distinguished() {
    let ledger = seeded_ledger(vec![tx("1", "MOVE", TransactionType::Transfer)]);
    let service = assignment_service(MockBackend::new());
    let prompter = ScriptedPrompter::new();
    let orchestrator = UpdateOrchestrator::new(&ledger, &service, &LedgerRules, &prompter, true);

    let outcome = orchestrator
        .update_transactions_by_tag("does-not-exist", UpdateMode::Both, false)
        .await;
    assert_eq!(outcome.status, RunStatus::NoTag);

    // tag exists but the only transaction is a transfer, filtered out
    let outcome = orchestrator
        .update_transactions_by_tag("ai-scan", UpdateMode::Both, false)
        .await;
    assert_eq!(outcome.status, RunStatus::EmptyTag);
}
