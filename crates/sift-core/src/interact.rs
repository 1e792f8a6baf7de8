//! Interactive prompt provider
//!
//! The edit cycle talks to the operator through this seam. The console
//! implementation lives in the CLI crate; `ScriptedPrompter` replays canned
//! answers for tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use crate::error::{Error, Result};
use crate::models::{Budget, Category, Transaction};

/// Operator decision for one proposal round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    ApplyBoth,
    ApplyCategory,
    ApplyBudget,
    Edit,
    Skip,
}

/// Which field(s) an edit round replaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditField {
    Category,
    Budget,
    Both,
}

/// A proposed category/budget pair shown to the operator.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Proposal {
    pub category: Option<Category>,
    pub budget: Option<Budget>,
}

pub trait Prompter: Send + Sync {
    /// Ask for a decision on one transaction. `original` is the untouched AI
    /// proposal from round one; `current` reflects any edits made since.
    fn decide(
        &self,
        tx: &Transaction,
        original: &Proposal,
        current: &Proposal,
    ) -> Result<Decision>;

    /// Ask which field(s) to edit.
    fn choose_fields(&self) -> Result<EditField>;

    /// Ask for a replacement category name; `None` clears the assignment.
    fn replacement_category(&self, options: &[String]) -> Result<Option<String>>;

    /// Ask for a replacement budget; one picked from the catalog carries its
    /// id, a free-typed name comes back as an id-less placeholder. `None`
    /// clears the assignment.
    fn replacement_budget(&self, options: &[Budget]) -> Result<Option<Budget>>;
}

/// Replays scripted answers in FIFO order; an exhausted queue behaves like
/// the operator closing stdin mid-conversation.
#[derive(Default)]
pub struct ScriptedPrompter {
    decisions: Mutex<VecDeque<Result<Decision>>>,
    fields: Mutex<VecDeque<EditField>>,
    categories: Mutex<VecDeque<Option<String>>>,
    budgets: Mutex<VecDeque<Option<Budget>>>,
    seen: Mutex<Vec<(Proposal, Proposal)>>,
}

impl ScriptedPrompter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_decisions(decisions: Vec<Decision>) -> Self {
        let prompter = Self::new();
        for decision in decisions {
            prompter.push_decision(decision);
        }
        prompter
    }

    pub fn push_decision(&self, decision: Decision) {
        if let Ok(mut queue) = self.decisions.lock() {
            queue.push_back(Ok(decision));
        }
    }

    /// Queue a user interrupt (closed stdin) in decision position.
    pub fn push_interrupt(&self) {
        if let Ok(mut queue) = self.decisions.lock() {
            queue.push_back(Err(interrupt()));
        }
    }

    pub fn push_field(&self, field: EditField) {
        if let Ok(mut queue) = self.fields.lock() {
            queue.push_back(field);
        }
    }

    pub fn push_category(&self, category: Option<&str>) {
        if let Ok(mut queue) = self.categories.lock() {
            queue.push_back(category.map(str::to_string));
        }
    }

    pub fn push_budget(&self, budget: Option<Budget>) {
        if let Ok(mut queue) = self.budgets.lock() {
            queue.push_back(budget);
        }
    }

    /// The (original, current) proposal pairs shown at each decision round.
    pub fn seen(&self) -> Vec<(Proposal, Proposal)> {
        self.seen.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

fn interrupt() -> Error {
    Error::Io(std::io::Error::new(
        std::io::ErrorKind::UnexpectedEof,
        "input closed",
    ))
}

impl Prompter for ScriptedPrompter {
    fn decide(
        &self,
        _tx: &Transaction,
        original: &Proposal,
        current: &Proposal,
    ) -> Result<Decision> {
        if let Ok(mut seen) = self.seen.lock() {
            seen.push((original.clone(), current.clone()));
        }
        self.decisions
            .lock()
            .ok()
            .and_then(|mut queue| queue.pop_front())
            .unwrap_or_else(|| Err(interrupt()))
    }

    fn choose_fields(&self) -> Result<EditField> {
        self.fields
            .lock()
            .ok()
            .and_then(|mut queue| queue.pop_front())
            .ok_or_else(interrupt)
    }

    fn replacement_category(&self, _options: &[String]) -> Result<Option<String>> {
        self.categories
            .lock()
            .ok()
            .and_then(|mut queue| queue.pop_front())
            .ok_or_else(interrupt)
    }

    fn replacement_budget(&self, _options: &[Budget]) -> Result<Option<Budget>> {
        self.budgets
            .lock()
            .ok()
            .and_then(|mut queue| queue.pop_front())
            .ok_or_else(interrupt)
    }
}
