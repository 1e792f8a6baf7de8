//! Batch assignment service
//!
//! Turns a batch of transactions plus the valid option catalog into exactly
//! one structured-output completion call, and maps the model's answer list
//! back to a per-transaction suggestion map. A failed or unparseable call
//! degrades to "no assignment" for the whole batch instead of erroring.

use std::collections::HashMap;
use std::fmt::Write as _;

use serde::Deserialize;
use tracing::{info, warn};

use crate::ai::{CompletionOptions, Message, RetryingCallClient};
use crate::error::{Error, Result};
use crate::models::{AssignmentType, Suggestion, Transaction};

const FORCED_SCHEMA_NAME: &str = "record_assignments";

/// Parsed structured output from the model
#[derive(Debug, Deserialize)]
struct AssignmentPayload {
    assignments: Vec<String>,
}

/// One-call-per-batch assignment front end over the gated LLM client.
pub struct BatchAssignmentService {
    client: RetryingCallClient,
}

impl BatchAssignmentService {
    pub fn new(client: RetryingCallClient) -> Self {
        Self { client }
    }

    /// Suggest one name per transaction in a single completion call.
    ///
    /// Returns a map keyed by journal id. An empty transaction list yields an
    /// empty map; an empty option list is a configuration error. Transport
    /// and parse failures (after the gate's retries) are absorbed here: every
    /// transaction falls back to `Suggestion::None`.
    pub async fn assign(
        &self,
        transactions: &[Transaction],
        kind: AssignmentType,
        valid_options: &[String],
    ) -> Result<HashMap<String, Suggestion>> {
        if transactions.is_empty() {
            warn!("no transactions in {} batch, skipping", kind.noun());
            return Ok(HashMap::new());
        }
        if valid_options.is_empty() {
            return Err(Error::Configuration(format!(
                "No valid {} options provided",
                kind.noun()
            )));
        }

        let options = CompletionOptions {
            system_prompt: Some(system_prompt(kind)),
            output_schema: Some(output_schema(kind, transactions.len())),
            forced_schema_name: Some(FORCED_SCHEMA_NAME.to_string()),
        };
        let messages = [Message::user(batch_prompt(transactions, kind, valid_options))];

        let parsed = match self.client.complete(&messages, &options).await {
            Ok(raw) => parse_assignments(&raw),
            Err(err) => Err(err),
        };

        let names = match parsed {
            Ok(names) => names,
            Err(err) => {
                warn!(
                    count = transactions.len(),
                    error = %err,
                    "batch {} assignment failed, substituting {}",
                    kind.noun(),
                    kind.sentinel()
                );
                return Ok(transactions
                    .iter()
                    .map(|tx| (tx.journal_id.clone(), Suggestion::None))
                    .collect());
            }
        };

        if names.len() != transactions.len() {
            warn!(
                expected = transactions.len(),
                received = names.len(),
                "model returned a wrong-length {} list, pairing by position",
                kind.noun()
            );
        }

        let mut results = HashMap::with_capacity(transactions.len());
        let mut assigned = 0usize;
        for (i, tx) in transactions.iter().enumerate() {
            let suggestion = names
                .get(i)
                .map(|raw| Suggestion::from_model_output(raw, kind))
                .unwrap_or(Suggestion::None);
            if suggestion.is_assigned() {
                assigned += 1;
            }
            results.insert(tx.journal_id.clone(), suggestion);
        }

        let rate = assigned as f64 / transactions.len() as f64 * 100.0;
        info!(
            assigned,
            total = transactions.len(),
            "{} assignment complete ({:.1}% suggested)",
            kind.noun(),
            rate
        );

        Ok(results)
    }
}

fn system_prompt(kind: AssignmentType) -> String {
    format!(
        "You are a personal-finance assistant. For each transaction you are \
         given, pick the best-fitting {noun} from the provided list. Answer \
         only through the {tool} tool, with exactly one entry per transaction \
         in input order. Use {sentinel:?} when no listed {noun} fits.",
        noun = kind.noun(),
        tool = FORCED_SCHEMA_NAME,
        sentinel = kind.sentinel(),
    )
}

fn batch_prompt(transactions: &[Transaction], kind: AssignmentType, valid_options: &[String]) -> String {
    let mut prompt = format!("Valid {} names:\n", kind.noun());
    for name in valid_options {
        let _ = writeln!(prompt, "- {}", name);
    }

    let _ = writeln!(prompt, "\nTransactions:");
    for (i, tx) in transactions.iter().enumerate() {
        let counterparty = tx
            .destination_name
            .as_deref()
            .or(tx.source_name.as_deref())
            .unwrap_or("unknown");
        let _ = writeln!(
            prompt,
            "{}. {} | {} {:.2} | {} | to/from {}",
            i + 1,
            tx.description,
            tx.currency_code.as_deref().unwrap_or(""),
            tx.amount,
            tx.date,
            counterparty
        );
    }

    prompt
}

fn output_schema(kind: AssignmentType, count: usize) -> serde_json::Value {
    serde_json::json!({
        "type": "object",
        "properties": {
            "assignments": {
                "type": "array",
                "items": { "type": "string" },
                "minItems": count,
                "maxItems": count,
                "description": format!(
                    "One {} name per transaction, in input order; {:?} when none fits",
                    kind.noun(),
                    kind.sentinel()
                ),
            }
        },
        "required": ["assignments"]
    })
}

/// Extract the assignments array from the model payload, tolerating stray
/// text around the JSON object.
fn parse_assignments(raw: &str) -> Result<Vec<String>> {
    let raw = raw.trim();
    let start = raw.find('{');
    let end = raw.rfind('}');

    match (start, end) {
        (Some(s), Some(e)) if s < e => {
            let json_str = &raw[s..=e];
            let payload: AssignmentPayload = serde_json::from_str(json_str).map_err(|e| {
                let truncated = if json_str.len() > 200 {
                    format!("{}...", &json_str[..200])
                } else {
                    json_str.to_string()
                };
                Error::InvalidData(format!("Invalid JSON from model: {} | Raw: {}", e, truncated))
            })?;
            Ok(payload.assignments)
        }
        _ => Err(Error::InvalidData(format!(
            "No JSON found in model response | Raw: {}",
            if raw.len() > 200 {
                format!("{}...", &raw[..200])
            } else {
                raw.to_string()
            }
        ))),
    }
}
