//! Console prompt provider
//!
//! Stdin/stdout implementation of the `Prompter` seam: decision menu, field
//! selection and replacement prompts for the interactive edit cycle.

use std::io::{self, Write};

use sift_core::{
    Budget, Decision, EditField, Error, Prompter, Proposal, Result, Transaction,
};

use crate::commands::truncate;

/// Interactive prompter reading from stdin.
pub struct ConsolePrompter;

impl ConsolePrompter {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ConsolePrompter {
    fn default() -> Self {
        Self::new()
    }
}

/// Read one trimmed line; a closed stdin is an interrupt.
fn read_line() -> Result<String> {
    io::stdout().flush()?;
    let mut input = String::new();
    let bytes = io::stdin().read_line(&mut input)?;
    if bytes == 0 {
        return Err(Error::Io(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            "input closed",
        )));
    }
    Ok(input.trim().to_string())
}

fn fmt_proposal(proposal: &Proposal) -> String {
    let category = proposal
        .category
        .as_ref()
        .map(|c| c.name.as_str())
        .unwrap_or("-");
    let budget = proposal
        .budget
        .as_ref()
        .map(|b| b.name.as_str())
        .unwrap_or("-");
    format!("category: {} │ budget: {}", category, budget)
}

impl Prompter for ConsolePrompter {
    fn decide(
        &self,
        tx: &Transaction,
        original: &Proposal,
        current: &Proposal,
    ) -> Result<Decision> {
        println!();
        println!("📝 {}", truncate(&tx.description, 60));
        println!(
            "   {} │ {}{:.2} │ currently: {} / {}",
            tx.date,
            tx.currency_symbol.as_deref().unwrap_or(""),
            tx.amount,
            tx.category_name.as_deref().unwrap_or("-"),
            tx.budget_name.as_deref().unwrap_or("-"),
        );
        println!("   AI suggestion │ {}", fmt_proposal(original));
        if current != original {
            println!("   Your pick     │ {}", fmt_proposal(current));
        }

        loop {
            print!("   [a]pply both, apply [c]ategory, apply [b]udget, [e]dit, [s]kip: ");
            let input = read_line()?;
            match input.to_lowercase().as_str() {
                "a" | "" => return Ok(Decision::ApplyBoth),
                "c" => return Ok(Decision::ApplyCategory),
                "b" => return Ok(Decision::ApplyBudget),
                "e" => return Ok(Decision::Edit),
                "s" => return Ok(Decision::Skip),
                other => println!("   Unrecognized choice {:?}", other),
            }
        }
    }

    fn choose_fields(&self) -> Result<EditField> {
        loop {
            print!("   Edit [c]ategory, [b]udget, or b[o]th? ");
            let input = read_line()?;
            match input.to_lowercase().as_str() {
                "c" => return Ok(EditField::Category),
                "b" => return Ok(EditField::Budget),
                "o" => return Ok(EditField::Both),
                other => println!("   Unrecognized choice {:?}", other),
            }
        }
    }

    fn replacement_category(&self, options: &[String]) -> Result<Option<String>> {
        if options.len() <= 15 {
            println!("   Categories: {}", options.join(", "));
        } else {
            println!("   {} categories available", options.len());
        }
        print!("   Category name (empty clears): ");
        let input = read_line()?;
        if input.is_empty() {
            Ok(None)
        } else {
            Ok(Some(input))
        }
    }

    fn replacement_budget(&self, options: &[Budget]) -> Result<Option<Budget>> {
        for (i, budget) in options.iter().enumerate() {
            println!("   {}. {}", i + 1, budget.name);
        }
        print!("   Budget number or name (empty clears): ");
        let input = read_line()?;
        if input.is_empty() {
            return Ok(None);
        }
        if let Ok(index) = input.parse::<usize>() {
            if index >= 1 && index <= options.len() {
                return Ok(Some(options[index - 1].clone()));
            }
        }
        // free-typed name; the edit cycle re-looks it up once
        Ok(Some(Budget::placeholder(input)))
    }
}
