//! Runtime configuration
//!
//! One `Config` value is built from the environment at startup and passed by
//! reference to every component that needs it. There is no global instance.
//!
//! Environment variables:
//! - `SIFT_LEDGER_URL`: ledger server base URL (required)
//! - `SIFT_LEDGER_TOKEN`: ledger server personal access token (required)
//! - `SIFT_LLM_HOST`: LLM completion server URL (required)
//! - `SIFT_LLM_MODEL`: model name (default: llama3.2)
//! - `SIFT_LLM_MAX_CONCURRENT`: cap on in-flight completion calls (default: 4)
//! - `SIFT_LLM_MAX_RETRIES`: retries per completion call (default: 3)
//! - `SIFT_LLM_BASE_DELAY_MS`: backoff base delay in ms (default: 500)
//! - `SIFT_LLM_MAX_DELAY_SECS`: backoff delay cap in seconds (default: 15)

use std::str::FromStr;
use std::time::Duration;

use crate::error::{Error, Result};

/// Ledger server connection settings.
#[derive(Debug, Clone)]
pub struct LedgerConfig {
    pub base_url: String,
    pub token: String,
}

/// LLM completion settings, including the retry/concurrency knobs consumed
/// by the call gate.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub host: String,
    pub model: String,
    pub max_concurrent: usize,
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub ledger: LedgerConfig,
    pub llm: LlmConfig,
}

impl Config {
    /// Build the configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        let ledger = LedgerConfig {
            base_url: require("SIFT_LEDGER_URL")?,
            token: require("SIFT_LEDGER_TOKEN")?,
        };

        let llm = LlmConfig {
            host: require("SIFT_LLM_HOST")?,
            model: std::env::var("SIFT_LLM_MODEL").unwrap_or_else(|_| "llama3.2".to_string()),
            max_concurrent: parse_or("SIFT_LLM_MAX_CONCURRENT", 4)?,
            max_retries: parse_or("SIFT_LLM_MAX_RETRIES", 3)?,
            base_delay: Duration::from_millis(parse_or("SIFT_LLM_BASE_DELAY_MS", 500)?),
            max_delay: Duration::from_secs(parse_or("SIFT_LLM_MAX_DELAY_SECS", 15)?),
        };

        Ok(Self { ledger, llm })
    }
}

fn require(key: &str) -> Result<String> {
    std::env::var(key)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .ok_or_else(|| Error::Configuration(format!("{} is not set", key)))
}

fn parse_or<T: FromStr>(key: &str, default: T) -> Result<T> {
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| Error::Configuration(format!("{} has an invalid value: {:?}", key, raw))),
        Err(_) => Ok(default),
    }
}
