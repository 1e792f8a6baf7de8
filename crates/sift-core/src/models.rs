//! Data model
//!
//! Read views of ledger-owned data plus the suggestion types flowing through
//! the assignment pipeline. The core never mutates a `Transaction` in place;
//! it only produces update requests against the ledger.

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Transaction class as reported by the ledger server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Withdrawal,
    Deposit,
    Transfer,
    #[serde(other)]
    Other,
}

impl TransactionType {
    /// Parse the ledger API's type string ("withdrawal", "deposit", ...).
    pub fn from_api(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "withdrawal" => TransactionType::Withdrawal,
            "deposit" => TransactionType::Deposit,
            "transfer" => TransactionType::Transfer,
            _ => TransactionType::Other,
        }
    }
}

/// One transaction split as held by the ledger server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    /// Unique id of this split within its transaction group.
    pub journal_id: String,
    pub description: String,
    pub amount: f64,
    pub date: NaiveDate,
    pub transaction_type: TransactionType,
    pub source_id: Option<String>,
    pub source_name: Option<String>,
    pub destination_id: Option<String>,
    pub destination_name: Option<String>,
    pub currency_id: Option<String>,
    pub currency_code: Option<String>,
    pub currency_symbol: Option<String>,
    pub category_name: Option<String>,
    pub budget_id: Option<String>,
    pub budget_name: Option<String>,
    pub tags: Vec<String>,
}

/// Category catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub name: String,
    pub kind: Option<String>,
}

impl Category {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: None,
        }
    }
}

/// Budget catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Budget {
    pub id: String,
    pub name: String,
}

impl Budget {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }

    /// A budget known only by name, e.g. one the operator typed in.
    pub fn placeholder(name: impl Into<String>) -> Self {
        Self {
            id: String::new(),
            name: name.into(),
        }
    }

    pub fn has_id(&self) -> bool {
        !self.id.is_empty()
    }
}

/// Which catalog a batch assignment targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignmentType {
    Category,
    Budget,
}

impl AssignmentType {
    pub fn noun(&self) -> &'static str {
        match self {
            AssignmentType::Category => "category",
            AssignmentType::Budget => "budget",
        }
    }

    /// Placeholder the model is told to answer with when nothing fits.
    pub fn sentinel(&self) -> &'static str {
        match self {
            AssignmentType::Category => "(no category)",
            AssignmentType::Budget => "(no budget)",
        }
    }
}

/// One model suggestion for one transaction.
///
/// `None` means "explicitly no assignment" and covers both the empty string
/// and the wire sentinel; it is not an error. An unrecognized non-empty name
/// stays a `Name` and fails later at validation.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Suggestion {
    #[default]
    None,
    Name(String),
}

impl Suggestion {
    /// Map one raw model answer to a suggestion.
    pub fn from_model_output(raw: &str, kind: AssignmentType) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case(kind.sentinel()) {
            Suggestion::None
        } else {
            Suggestion::Name(trimmed.to_string())
        }
    }

    pub fn as_name(&self) -> Option<&str> {
        match self {
            Suggestion::None => None,
            Suggestion::Name(name) => Some(name),
        }
    }

    pub fn is_assigned(&self) -> bool {
        matches!(self, Suggestion::Name(_))
    }
}

/// Per-type suggestion maps keyed by journal id. Read-only once built.
#[derive(Debug, Default)]
pub struct AssignmentResults {
    pub categories: HashMap<String, Suggestion>,
    pub budgets: HashMap<String, Suggestion>,
}

impl AssignmentResults {
    pub fn category_for(&self, journal_id: &str) -> Option<&Suggestion> {
        self.categories.get(journal_id)
    }

    pub fn budget_for(&self, journal_id: &str) -> Option<&Suggestion> {
        self.budgets.get(journal_id)
    }
}

/// What a run assigns: categories, budgets, or both.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateMode {
    Both,
    CategoriesOnly,
    BudgetsOnly,
}

impl UpdateMode {
    pub fn includes_categories(&self) -> bool {
        matches!(self, UpdateMode::Both | UpdateMode::CategoriesOnly)
    }

    pub fn includes_budgets(&self) -> bool {
        matches!(self, UpdateMode::Both | UpdateMode::BudgetsOnly)
    }
}
