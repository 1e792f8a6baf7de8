//! CLI command implementations
//!
//! Commands are organized by domain:
//! - `update` - The categorize-and-update run for one tag
//! - `health` - Ledger server and LLM backend connectivity checks

pub mod health;
pub mod update;

// Re-export command functions for main.rs
pub use health::*;
pub use update::*;

/// Truncate a string for single-line display.
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max.saturating_sub(1)).collect();
        format!("{}…", cut)
    }
}
