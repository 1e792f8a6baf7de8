//! Business rules for transaction processing
//!
//! The pipeline consults these rules at its seams instead of hard-coding
//! ledger semantics: which transactions a run may touch, which may carry a
//! budget, and whether a proposal differs from what the ledger already holds.

use crate::models::{AssignmentResults, Budget, Category, Transaction, TransactionType};

pub trait BusinessRules: Send + Sync {
    /// May this transaction be processed at all?
    fn is_eligible(&self, tx: &Transaction, skip_transfers: bool) -> bool;

    /// May this transaction class carry a budget?
    fn can_carry_budget(&self, tx: &Transaction) -> bool;

    /// Does the proposal differ from the transaction's current values?
    fn has_changed(
        &self,
        tx: &Transaction,
        category: Option<&Category>,
        budget: Option<&Budget>,
    ) -> bool;

    /// Is the transaction data complete enough to process?
    fn is_well_formed(&self, tx: &Transaction, results: &AssignmentResults) -> bool;
}

/// Default rules matching the ledger server's transaction model.
pub struct LedgerRules;

impl BusinessRules for LedgerRules {
    fn is_eligible(&self, tx: &Transaction, skip_transfers: bool) -> bool {
        !(skip_transfers && tx.transaction_type == TransactionType::Transfer)
    }

    fn can_carry_budget(&self, tx: &Transaction) -> bool {
        // the ledger only accepts budgets on expense transactions
        tx.transaction_type == TransactionType::Withdrawal
    }

    fn has_changed(
        &self,
        tx: &Transaction,
        category: Option<&Category>,
        budget: Option<&Budget>,
    ) -> bool {
        let category_changed = match category {
            Some(proposed) => !tx
                .category_name
                .as_deref()
                .map(|current| current.eq_ignore_ascii_case(&proposed.name))
                .unwrap_or(false),
            None => false,
        };

        let budget_changed = match budget {
            Some(proposed) if proposed.has_id() => {
                tx.budget_id.as_deref() != Some(proposed.id.as_str())
            }
            Some(proposed) => !tx
                .budget_name
                .as_deref()
                .map(|current| current.eq_ignore_ascii_case(&proposed.name))
                .unwrap_or(false),
            None => false,
        };

        category_changed || budget_changed
    }

    fn is_well_formed(&self, tx: &Transaction, _results: &AssignmentResults) -> bool {
        !tx.description.trim().is_empty()
    }
}
