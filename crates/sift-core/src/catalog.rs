//! Catalog validation
//!
//! Builds normalized lookup indices over the category and budget catalogs,
//! once per run, and resolves or rejects the free-text names the model
//! suggests. Normalization is trim + lowercase only; punctuation is part of
//! the name, so "Bills & Utilities" must match exactly modulo case and
//! surrounding whitespace.

use std::collections::HashMap;

use tracing::debug;

use crate::error::{Result, ValidationError, ValidationField};
use crate::ledger::LedgerService;
use crate::models::{Budget, Category, Transaction, UpdateMode};
use crate::rules::BusinessRules;

/// A suggestion pair that survived validation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidatedAssignment {
    pub category: Option<Category>,
    pub budget: Option<Budget>,
}

fn normalize(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Normalized-name indices over both catalogs. Built once, read-only after.
pub struct CatalogValidator {
    categories: HashMap<String, Category>,
    budgets: HashMap<String, Budget>,
}

impl CatalogValidator {
    /// Fetch both catalogs (each skipped when the mode excludes it) and build
    /// the indices. The two fetches run concurrently.
    pub async fn initialize<L: LedgerService + ?Sized>(
        ledger: &L,
        mode: UpdateMode,
    ) -> Result<Self> {
        let (categories, budgets) = tokio::try_join!(
            async {
                if mode.includes_categories() {
                    ledger.get_categories().await
                } else {
                    Ok(Vec::new())
                }
            },
            async {
                if mode.includes_budgets() {
                    ledger.get_budgets().await
                } else {
                    Ok(Vec::new())
                }
            },
        )?;

        Ok(Self::from_catalogs(categories, budgets))
    }

    /// Build the indices from already-fetched catalogs.
    pub fn from_catalogs(categories: Vec<Category>, budgets: Vec<Budget>) -> Self {
        let categories: HashMap<String, Category> = categories
            .into_iter()
            .map(|c| (normalize(&c.name), c))
            .collect();
        let budgets: HashMap<String, Budget> = budgets
            .into_iter()
            .map(|b| (normalize(&b.name), b))
            .collect();

        debug!(
            categories = categories.len(),
            budgets = budgets.len(),
            "catalog indices built"
        );

        Self {
            categories,
            budgets,
        }
    }

    pub fn resolve_category(&self, name: &str) -> Option<&Category> {
        self.categories.get(&normalize(name))
    }

    pub fn resolve_budget(&self, name: &str) -> Option<&Budget> {
        self.budgets.get(&normalize(name))
    }

    /// Catalog category names, sorted for stable prompt text.
    pub fn category_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.categories.values().map(|c| c.name.clone()).collect();
        names.sort();
        names
    }

    /// Catalog budgets, sorted by name.
    pub fn budget_options(&self) -> Vec<Budget> {
        let mut budgets: Vec<Budget> = self.budgets.values().cloned().collect();
        budgets.sort_by(|a, b| a.name.cmp(&b.name));
        budgets
    }

    /// Resolve a suggested category/budget pair for one transaction.
    ///
    /// The two sides are computed independently; a failure on one never
    /// prevents the other from being evaluated. Empty-string input means
    /// "explicitly no assignment" and resolves to `None`. Budget validation
    /// is skipped (satisfied as `None`) when the transaction class cannot
    /// carry a budget at all.
    pub fn validate<R: BusinessRules + ?Sized>(
        &self,
        tx: &Transaction,
        suggested_category: Option<&str>,
        suggested_budget: Option<&str>,
        rules: &R,
    ) -> std::result::Result<ValidatedAssignment, ValidationError> {
        let category = self.resolve_category_suggestion(suggested_category);
        let budget = if rules.can_carry_budget(tx) {
            self.resolve_budget_suggestion(suggested_budget)
        } else {
            Ok(None)
        };

        match (category, budget) {
            (Ok(category), Ok(budget)) => Ok(ValidatedAssignment { category, budget }),
            (Err(err), _) => Err(err),
            (_, Err(err)) => Err(err),
        }
    }

    fn resolve_category_suggestion(
        &self,
        suggested: Option<&str>,
    ) -> std::result::Result<Option<Category>, ValidationError> {
        match suggested {
            None => Ok(None),
            Some(name) if name.trim().is_empty() => Ok(None),
            Some(name) => self.resolve_category(name).cloned().map(Some).ok_or_else(|| {
                ValidationError::new(
                    ValidationField::Category,
                    format!("unknown category {:?}", name),
                    "The suggested category does not exist in the ledger",
                )
                .with_suggestion(name)
            }),
        }
    }

    fn resolve_budget_suggestion(
        &self,
        suggested: Option<&str>,
    ) -> std::result::Result<Option<Budget>, ValidationError> {
        match suggested {
            None => Ok(None),
            Some(name) if name.trim().is_empty() => Ok(None),
            Some(name) => self.resolve_budget(name).cloned().map(Some).ok_or_else(|| {
                ValidationError::new(
                    ValidationField::Budget,
                    format!("unknown budget {:?}", name),
                    "The suggested budget does not exist in the ledger",
                )
                .with_suggestion(name)
            }),
        }
    }
}
