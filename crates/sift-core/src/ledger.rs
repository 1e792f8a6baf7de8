//! Ledger server client
//!
//! HTTP client for the ledger server's JSON REST API: transactions by tag,
//! tag existence, split updates, and the category/budget catalogs. The
//! `LedgerService` trait is the seam the pipeline consumes, so tests can run
//! against `MockLedger` without a server.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::LedgerConfig;
use crate::error::{Error, Result};
use crate::models::{Budget, Category, Transaction, TransactionType};

/// Page size for list endpoints.
const PAGE_LIMIT: u32 = 500;

#[async_trait]
pub trait LedgerService: Send + Sync {
    async fn tag_exists(&self, tag: &str) -> Result<bool>;

    async fn get_transactions_by_tag(&self, tag: &str) -> Result<Vec<Transaction>>;

    /// Update one split; category is referenced by name, budget by id.
    /// Returns the updated split when the server echoes one back.
    async fn update_transaction(
        &self,
        tx: &Transaction,
        category_name: Option<&str>,
        budget_id: Option<&str>,
    ) -> Result<Option<Transaction>>;

    async fn get_categories(&self) -> Result<Vec<Category>>;

    async fn get_budgets(&self) -> Result<Vec<Budget>>;
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct ListEnvelope<T> {
    data: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct SingleEnvelope<T> {
    data: T,
}

#[derive(Debug, Deserialize)]
struct TransactionGroup {
    attributes: GroupAttributes,
}

#[derive(Debug, Deserialize)]
struct GroupAttributes {
    transactions: Vec<SplitAttributes>,
}

#[derive(Debug, Deserialize)]
struct SplitAttributes {
    #[serde(default)]
    transaction_journal_id: Option<String>,
    description: String,
    amount: String,
    date: String,
    #[serde(rename = "type")]
    transaction_type: String,
    #[serde(default)]
    source_id: Option<String>,
    #[serde(default)]
    source_name: Option<String>,
    #[serde(default)]
    destination_id: Option<String>,
    #[serde(default)]
    destination_name: Option<String>,
    #[serde(default)]
    currency_id: Option<String>,
    #[serde(default)]
    currency_code: Option<String>,
    #[serde(default)]
    currency_symbol: Option<String>,
    #[serde(default)]
    category_name: Option<String>,
    #[serde(default)]
    budget_id: Option<String>,
    #[serde(default)]
    budget_name: Option<String>,
    #[serde(default)]
    tags: Vec<String>,
}

impl SplitAttributes {
    fn into_transaction(self) -> Result<Transaction> {
        let amount: f64 = self
            .amount
            .trim()
            .parse()
            .map_err(|_| Error::InvalidData(format!("unparseable amount {:?}", self.amount)))?;

        // the API sends RFC 3339 timestamps; the date part is all we keep
        let date_part = self.date.get(..10).unwrap_or(&self.date);
        let date = NaiveDate::parse_from_str(date_part, "%Y-%m-%d")
            .map_err(|_| Error::InvalidData(format!("unparseable date {:?}", self.date)))?;

        Ok(Transaction {
            journal_id: self.transaction_journal_id.unwrap_or_default(),
            description: self.description,
            amount,
            date,
            transaction_type: TransactionType::from_api(&self.transaction_type),
            source_id: self.source_id,
            source_name: self.source_name,
            destination_id: self.destination_id,
            destination_name: self.destination_name,
            currency_id: self.currency_id,
            currency_code: self.currency_code,
            currency_symbol: self.currency_symbol,
            category_name: self.category_name,
            budget_id: self.budget_id,
            budget_name: self.budget_name,
            tags: self.tags,
        })
    }
}

#[derive(Debug, Deserialize)]
struct CategoryResource {
    attributes: CategoryAttributes,
}

#[derive(Debug, Deserialize)]
struct CategoryAttributes {
    name: String,
    #[serde(rename = "type", default)]
    kind: Option<String>,
}

#[derive(Debug, Deserialize)]
struct BudgetResource {
    id: String,
    attributes: BudgetAttributes,
}

#[derive(Debug, Deserialize)]
struct BudgetAttributes {
    name: String,
}

#[derive(Debug, Serialize)]
struct UpdateSplit<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    category_name: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    budget_id: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct UpdateRequest<'a> {
    transactions: Vec<UpdateSplit<'a>>,
}

// ---------------------------------------------------------------------------
// HTTP client
// ---------------------------------------------------------------------------

/// Bearer-authenticated client for the ledger server.
pub struct LedgerHttpClient {
    http_client: Client,
    base_url: String,
    token: String,
}

impl LedgerHttpClient {
    pub fn new(base_url: &str, token: &str) -> Self {
        Self {
            http_client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
        }
    }

    pub fn from_config(config: &LedgerConfig) -> Self {
        Self::new(&config.base_url, &config.token)
    }

    /// Verify the server is reachable and the token is accepted.
    pub async fn health_check(&self) -> bool {
        match self
            .http_client
            .get(format!("{}/api/v1/about", self.base_url))
            .bearer_auth(&self.token)
            .send()
            .await
        {
            Ok(resp) => resp.status().is_success(),
            Err(_) => false,
        }
    }

    async fn api_error(response: reqwest::Response) -> Error {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        Error::Api(format!("ledger API error ({}): {}", status, body))
    }
}

#[async_trait]
impl LedgerService for LedgerHttpClient {
    async fn tag_exists(&self, tag: &str) -> Result<bool> {
        let response = self
            .http_client
            .get(format!("{}/api/v1/tags/{}", self.base_url, tag))
            .bearer_auth(&self.token)
            .header("accept", "application/json")
            .send()
            .await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(false);
        }
        if !response.status().is_success() {
            return Err(Self::api_error(response).await);
        }
        Ok(true)
    }

    async fn get_transactions_by_tag(&self, tag: &str) -> Result<Vec<Transaction>> {
        let response = self
            .http_client
            .get(format!(
                "{}/api/v1/tags/{}/transactions?limit={}",
                self.base_url, tag, PAGE_LIMIT
            ))
            .bearer_auth(&self.token)
            .header("accept", "application/json")
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::api_error(response).await);
        }

        let envelope: ListEnvelope<TransactionGroup> = response.json().await?;
        let mut transactions = Vec::new();
        for group in envelope.data {
            for split in group.attributes.transactions {
                transactions.push(split.into_transaction()?);
            }
        }

        debug!(tag, count = transactions.len(), "fetched transactions");
        Ok(transactions)
    }

    async fn update_transaction(
        &self,
        tx: &Transaction,
        category_name: Option<&str>,
        budget_id: Option<&str>,
    ) -> Result<Option<Transaction>> {
        let request = UpdateRequest {
            transactions: vec![UpdateSplit {
                category_name,
                budget_id,
            }],
        };

        let response = self
            .http_client
            .put(format!(
                "{}/api/v1/transactions/{}",
                self.base_url, tx.journal_id
            ))
            .bearer_auth(&self.token)
            .header("accept", "application/json")
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::api_error(response).await);
        }

        let envelope: SingleEnvelope<TransactionGroup> = response.json().await?;
        let updated = envelope
            .data
            .attributes
            .transactions
            .into_iter()
            .next()
            .map(SplitAttributes::into_transaction)
            .transpose()?;

        debug!(journal_id = %tx.journal_id, "transaction updated");
        Ok(updated)
    }

    async fn get_categories(&self) -> Result<Vec<Category>> {
        let response = self
            .http_client
            .get(format!(
                "{}/api/v1/categories?limit={}",
                self.base_url, PAGE_LIMIT
            ))
            .bearer_auth(&self.token)
            .header("accept", "application/json")
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::api_error(response).await);
        }

        let envelope: ListEnvelope<CategoryResource> = response.json().await?;
        Ok(envelope
            .data
            .into_iter()
            .map(|resource| Category {
                name: resource.attributes.name,
                kind: resource.attributes.kind,
            })
            .collect())
    }

    async fn get_budgets(&self) -> Result<Vec<Budget>> {
        let response = self
            .http_client
            .get(format!(
                "{}/api/v1/budgets?limit={}",
                self.base_url, PAGE_LIMIT
            ))
            .bearer_auth(&self.token)
            .header("accept", "application/json")
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::api_error(response).await);
        }

        let envelope: ListEnvelope<BudgetResource> = response.json().await?;
        Ok(envelope
            .data
            .into_iter()
            .map(|resource| Budget {
                id: resource.id,
                name: resource.attributes.name,
            })
            .collect())
    }
}

// ---------------------------------------------------------------------------
// Mock ledger
// ---------------------------------------------------------------------------

/// One recorded `update_transaction` call.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateRecord {
    pub journal_id: String,
    pub category_name: Option<String>,
    pub budget_id: Option<String>,
}

/// In-memory ledger for tests and development without a running server.
#[derive(Clone, Default)]
pub struct MockLedger {
    pub tag: Option<String>,
    pub transactions: Vec<Transaction>,
    pub categories: Vec<Category>,
    pub budgets: Vec<Budget>,
    pub fail_fetch: bool,
    pub fail_catalogs: bool,
    pub fail_update: bool,
    fetches: Arc<Mutex<usize>>,
    updates: Arc<Mutex<Vec<UpdateRecord>>>,
}

impl MockLedger {
    pub fn new(tag: &str, transactions: Vec<Transaction>) -> Self {
        Self {
            tag: Some(tag.to_string()),
            transactions,
            ..Self::default()
        }
    }

    /// Recorded update calls, in order.
    pub fn updates(&self) -> Vec<UpdateRecord> {
        self.updates.lock().map(|u| u.clone()).unwrap_or_default()
    }

    /// Number of `get_transactions_by_tag` calls made.
    pub fn fetches(&self) -> usize {
        self.fetches.lock().map(|f| *f).unwrap_or(0)
    }
}

#[async_trait]
impl LedgerService for MockLedger {
    async fn tag_exists(&self, tag: &str) -> Result<bool> {
        Ok(self.tag.as_deref() == Some(tag))
    }

    async fn get_transactions_by_tag(&self, _tag: &str) -> Result<Vec<Transaction>> {
        if let Ok(mut fetches) = self.fetches.lock() {
            *fetches += 1;
        }
        if self.fail_fetch {
            return Err(Error::Api("transaction fetch failed (mock)".to_string()));
        }
        Ok(self.transactions.clone())
    }

    async fn update_transaction(
        &self,
        tx: &Transaction,
        category_name: Option<&str>,
        budget_id: Option<&str>,
    ) -> Result<Option<Transaction>> {
        if self.fail_update {
            return Err(Error::Api("transaction update failed (mock)".to_string()));
        }

        if let Ok(mut updates) = self.updates.lock() {
            updates.push(UpdateRecord {
                journal_id: tx.journal_id.clone(),
                category_name: category_name.map(str::to_string),
                budget_id: budget_id.map(str::to_string),
            });
        }

        let mut updated = tx.clone();
        if let Some(name) = category_name {
            updated.category_name = Some(name.to_string());
        }
        if let Some(id) = budget_id {
            updated.budget_id = Some(id.to_string());
        }
        Ok(Some(updated))
    }

    async fn get_categories(&self) -> Result<Vec<Category>> {
        if self.fail_catalogs {
            return Err(Error::Api("category fetch failed (mock)".to_string()));
        }
        Ok(self.categories.clone())
    }

    async fn get_budgets(&self) -> Result<Vec<Budget>> {
        if self.fail_catalogs {
            return Err(Error::Api("budget fetch failed (mock)".to_string()));
        }
        Ok(self.budgets.clone())
    }
}
