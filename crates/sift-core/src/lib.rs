//! Sift Core Library
//!
//! Shared functionality for the sift transaction categorizer:
//! - Ledger server client (transactions, tags, catalogs, updates)
//! - Pluggable LLM completion backends with a gated, retrying call client
//! - Batch assignment service (one structured-output call per batch)
//! - Catalog validation of free-text model suggestions
//! - Interactive per-transaction edit cycle
//! - Top-level update orchestrator and run reporting

pub mod ai;
pub mod assign;
pub mod catalog;
pub mod config;
pub mod edit_cycle;
pub mod error;
pub mod interact;
pub mod ledger;
pub mod models;
pub mod orchestrator;
pub mod rules;

pub use ai::{
    AnthropicBackend, CompletionOptions, LlmBackend, LlmClient, Message, MockBackend, RetryPolicy,
    RetryingCallClient,
};
pub use assign::BatchAssignmentService;
pub use catalog::{CatalogValidator, ValidatedAssignment};
pub use config::{Config, LedgerConfig, LlmConfig};
pub use edit_cycle::{EditCycleController, EditSession, UpdateOutcome, UpdateResult};
pub use error::{Error, Result, ValidationError, ValidationField};
pub use interact::{Decision, EditField, Prompter, Proposal, ScriptedPrompter};
pub use ledger::{LedgerHttpClient, LedgerService, MockLedger, UpdateRecord};
pub use models::{
    AssignmentResults, AssignmentType, Budget, Category, Suggestion, Transaction, TransactionType,
    UpdateMode,
};
pub use orchestrator::{RunOutcome, RunStatus, TransactionError, UpdateOrchestrator};
pub use rules::{BusinessRules, LedgerRules};
