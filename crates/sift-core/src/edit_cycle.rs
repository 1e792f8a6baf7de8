//! Per-transaction edit cycle
//!
//! Drives one transaction through propose → decide → {apply | edit | skip}.
//! An edit loops back to the decision prompt with an updated current value;
//! the original AI proposal shown alongside it is frozen for the life of the
//! session. All failures come back as field-tagged validation errors; nothing
//! escapes as a raw error.

use tracing::debug;

use crate::catalog::{CatalogValidator, ValidatedAssignment};
use crate::error::{Error, ValidationError, ValidationField};
use crate::interact::{Decision, EditField, Prompter, Proposal};
use crate::ledger::LedgerService;
use crate::models::{AssignmentResults, Budget, Category, Transaction};
use crate::rules::BusinessRules;

/// Outcome of one transaction's cycle.
#[derive(Debug, Clone)]
pub enum UpdateOutcome {
    /// Update call applied; payload is whatever the ledger echoed back.
    Applied(Option<Transaction>),
    /// Dry-run preview; payload is the unmodified transaction.
    DryRun(Transaction),
    /// Current values already match the proposal; nothing was sent.
    Unchanged,
    /// Operator skipped the transaction.
    Skipped,
}

impl UpdateOutcome {
    pub fn counts_as_updated(&self) -> bool {
        matches!(self, UpdateOutcome::Applied(_) | UpdateOutcome::DryRun(_))
    }
}

pub type UpdateResult = std::result::Result<UpdateOutcome, ValidationError>;

/// Per-transaction session state.
///
/// The original proposal is frozen at construction and has no mutator; only
/// the current proposal moves between rounds.
#[derive(Debug)]
pub struct EditSession {
    journal_id: String,
    original: Proposal,
    current: Proposal,
    rounds: u32,
}

impl EditSession {
    pub fn new(journal_id: String, proposal: Proposal) -> Self {
        Self {
            journal_id,
            original: proposal.clone(),
            current: proposal,
            rounds: 0,
        }
    }

    pub fn journal_id(&self) -> &str {
        &self.journal_id
    }

    pub fn original(&self) -> &Proposal {
        &self.original
    }

    pub fn current(&self) -> &Proposal {
        &self.current
    }

    pub fn rounds(&self) -> u32 {
        self.rounds
    }

    fn next_round(&mut self) {
        self.rounds += 1;
    }

    fn set_category(&mut self, category: Option<Category>) {
        self.current.category = category;
    }

    fn set_budget(&mut self, budget: Option<Budget>) {
        self.current.budget = budget;
    }
}

/// Interactive confirm/edit/skip controller for one run.
pub struct EditCycleController<'a> {
    validator: &'a CatalogValidator,
    rules: &'a dyn BusinessRules,
    prompter: &'a dyn Prompter,
    ledger: &'a dyn LedgerService,
    dry_run: bool,
}

impl<'a> EditCycleController<'a> {
    pub fn new(
        validator: &'a CatalogValidator,
        rules: &'a dyn BusinessRules,
        prompter: &'a dyn Prompter,
        ledger: &'a dyn LedgerService,
        dry_run: bool,
    ) -> Self {
        Self {
            validator,
            rules,
            prompter,
            ledger,
            dry_run,
        }
    }

    pub async fn update_transaction(
        &self,
        tx: &Transaction,
        results: &AssignmentResults,
    ) -> UpdateResult {
        if !self.rules.is_well_formed(tx, results) {
            return Err(ValidationError::new(
                ValidationField::Transaction,
                format!("transaction {:?} has incomplete data", tx.journal_id),
                "Transaction data is incomplete",
            ));
        }
        if tx.journal_id.trim().is_empty() {
            return Err(ValidationError::new(
                ValidationField::JournalId,
                "transaction has no journal identifier",
                "Transaction is missing its journal identifier",
            ));
        }

        let suggested_category = results
            .category_for(&tx.journal_id)
            .and_then(|s| s.as_name());
        let suggested_budget = results.budget_for(&tx.journal_id).and_then(|s| s.as_name());

        let ValidatedAssignment {
            category,
            mut budget,
        } = self
            .validator
            .validate(tx, suggested_category, suggested_budget, self.rules)?;

        if !self.rules.can_carry_budget(tx) {
            budget = None;
        }

        let mut session = EditSession::new(tx.journal_id.clone(), Proposal { category, budget });

        if !self.rules.has_changed(
            tx,
            session.current().category.as_ref(),
            session.current().budget.as_ref(),
        ) {
            debug!(journal_id = %tx.journal_id, "proposal matches current values, nothing to do");
            return Ok(UpdateOutcome::Unchanged);
        }

        if self.dry_run {
            return Ok(UpdateOutcome::DryRun(tx.clone()));
        }

        loop {
            session.next_round();
            let decision = self
                .prompter
                .decide(tx, session.original(), session.current())
                .map_err(interrupted)?;

            match decision {
                Decision::Skip => return Ok(UpdateOutcome::Skipped),
                Decision::Edit => self.edit_round(&mut session).map_err(interrupted)?,
                apply => return self.apply(tx, &session, apply).await,
            }
        }
    }

    fn edit_round(&self, session: &mut EditSession) -> crate::error::Result<()> {
        let field = self.prompter.choose_fields()?;

        if matches!(field, EditField::Category | EditField::Both) {
            let name = self
                .prompter
                .replacement_category(&self.validator.category_names())?;
            session.set_category(name.map(|n| {
                // canonicalize to the catalog entity when the name is known
                self.validator
                    .resolve_category(&n)
                    .cloned()
                    .unwrap_or_else(|| Category::named(n))
            }));
        }

        if matches!(field, EditField::Budget | EditField::Both) {
            let budget = self
                .prompter
                .replacement_budget(&self.validator.budget_options())?;
            session.set_budget(budget.map(|b| self.relookup_budget(b)));
        }

        debug!(
            journal_id = %session.journal_id(),
            round = session.rounds(),
            "proposal edited"
        );
        Ok(())
    }

    /// One name-based re-lookup for an id-less budget. A budget that already
    /// carries an id is taken as-is; a miss keeps the placeholder.
    fn relookup_budget(&self, budget: Budget) -> Budget {
        if budget.has_id() {
            return budget;
        }
        match self.validator.resolve_budget(&budget.name) {
            Some(found) => found.clone(),
            None => budget,
        }
    }

    async fn apply(&self, tx: &Transaction, session: &EditSession, decision: Decision) -> UpdateResult {
        let category_name = if matches!(decision, Decision::ApplyBoth | Decision::ApplyCategory) {
            session.current().category.as_ref().map(|c| c.name.as_str())
        } else {
            None
        };
        // a placeholder budget has no id to send
        let budget_id = if matches!(decision, Decision::ApplyBoth | Decision::ApplyBudget) {
            session
                .current()
                .budget
                .as_ref()
                .filter(|b| b.has_id())
                .map(|b| b.id.as_str())
        } else {
            None
        };

        match self
            .ledger
            .update_transaction(tx, category_name, budget_id)
            .await
        {
            Ok(updated) => Ok(UpdateOutcome::Applied(updated)),
            Err(err) => Err(ValidationError::new(
                ValidationField::Transaction,
                err.to_string(),
                "Updating the transaction failed",
            )),
        }
    }
}

fn interrupted(err: Error) -> ValidationError {
    ValidationError::new(
        ValidationField::UserInterrupt,
        err.to_string(),
        "Input was interrupted",
    )
}
