//! Error types for Sift

use std::fmt;

use thiserror::Error;

/// The transaction field a validation failure is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationField {
    JournalId,
    Transaction,
    Category,
    Budget,
    UserInterrupt,
}

impl ValidationField {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValidationField::JournalId => "journal_id",
            ValidationField::Transaction => "transaction",
            ValidationField::Category => "category",
            ValidationField::Budget => "budget",
            ValidationField::UserInterrupt => "user-interrupt",
        }
    }
}

impl fmt::Display for ValidationField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A per-transaction validation failure.
///
/// Carries a technical message (logs) and a user-facing message (end-of-run
/// report), plus the offending suggested value when there is one.
#[derive(Error, Debug, Clone)]
#[error("{message}")]
pub struct ValidationError {
    pub field: ValidationField,
    pub message: String,
    pub user_message: String,
    pub suggestion: Option<String>,
}

impl ValidationError {
    pub fn new(
        field: ValidationField,
        message: impl Into<String>,
        user_message: impl Into<String>,
    ) -> Self {
        Self {
            field,
            message: message.into(),
            user_message: user_message.into(),
            suggestion: None,
        }
    }

    /// Attach the suggested value that failed to validate.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Ledger API error: {0}")]
    Api(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Processing failed: {0}")]
    ProcessingFailed(String),

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

pub type Result<T> = std::result::Result<T, Error>;
