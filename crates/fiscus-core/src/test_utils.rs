//! Test utilities for fiscus-core
//!
//! An in-memory ledger implementing the storage-facing traits, plus a mock
//! oracle HTTP server for integration tests against the real transport.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Mutex;

use axum::{
    extract::Json,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use tokio::sync::oneshot;

use crate::error::Result;
use crate::insights::FinancialInsight;
use crate::ledger::{InsightSink, LedgerQuery, Taxonomy, TransactionFilter};
use crate::models::{default_category_name, Category, Transaction, TransactionType};

/// In-memory ledger backing all three storage traits
#[derive(Default)]
pub struct MemoryLedger {
    transactions: Mutex<Vec<Transaction>>,
    categories: Mutex<Vec<Category>>,
    insights: Mutex<Vec<FinancialInsight>>,
    next_category_id: AtomicI64,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self {
            next_category_id: AtomicI64::new(1),
            ..Self::default()
        }
    }

    pub fn add_transaction(&self, tx: Transaction) {
        self.transactions.lock().unwrap().push(tx);
    }

    /// Add a user-owned category and return it
    pub fn add_category(&self, owner_id: i64, name: &str, affinity: TransactionType) -> Category {
        let category = Category {
            id: self.next_category_id.fetch_add(1, Ordering::SeqCst),
            name: name.to_string(),
            description: None,
            color: None,
            icon: None,
            parent_id: None,
            system: false,
            owner_id: Some(owner_id),
            affinity,
        };
        self.categories.lock().unwrap().push(category.clone());
        category
    }

    /// All insights appended so far
    pub fn insights(&self) -> Vec<FinancialInsight> {
        self.insights.lock().unwrap().clone()
    }
}

impl LedgerQuery for MemoryLedger {
    fn transactions(&self, user_id: i64, filter: &TransactionFilter) -> Result<Vec<Transaction>> {
        let mut matched: Vec<Transaction> = self
            .transactions
            .lock()
            .unwrap()
            .iter()
            .filter(|tx| tx.user_id == user_id && filter.matches(tx))
            .cloned()
            .collect();
        matched.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(matched)
    }

    fn category_history(
        &self,
        user_id: i64,
        category_id: i64,
        since: chrono::NaiveDate,
        limit: usize,
    ) -> Result<Vec<Transaction>> {
        let mut matched: Vec<Transaction> = self
            .transactions
            .lock()
            .unwrap()
            .iter()
            .filter(|tx| {
                tx.user_id == user_id
                    && tx.category_id == Some(category_id)
                    && tx.date >= since
            })
            .cloned()
            .collect();
        matched.sort_by(|a, b| b.date.cmp(&a.date));
        matched.truncate(limit);
        Ok(matched)
    }
}

impl Taxonomy for MemoryLedger {
    fn categories_for_type(
        &self,
        user_id: i64,
        tx_type: TransactionType,
    ) -> Result<Vec<Category>> {
        Ok(self
            .categories
            .lock()
            .unwrap()
            .iter()
            .filter(|c| (c.system || c.owner_id == Some(user_id)) && c.accepts(tx_type))
            .cloned()
            .collect())
    }

    fn ensure_default_category(
        &self,
        user_id: i64,
        tx_type: TransactionType,
    ) -> Result<Category> {
        let name = default_category_name(tx_type);
        let mut categories = self.categories.lock().unwrap();

        if let Some(existing) = categories
            .iter()
            .find(|c| c.name == name && c.owner_id == Some(user_id))
        {
            return Ok(existing.clone());
        }

        let category = Category {
            id: self.next_category_id.fetch_add(1, Ordering::SeqCst),
            name: name.to_string(),
            description: None,
            color: None,
            icon: None,
            parent_id: None,
            system: false,
            owner_id: Some(user_id),
            affinity: tx_type,
        };
        categories.push(category.clone());
        Ok(category)
    }
}

impl InsightSink for MemoryLedger {
    fn append_insight(&self, insight: &FinancialInsight) -> Result<()> {
        self.insights.lock().unwrap().push(insight.clone());
        Ok(())
    }
}

/// Mock oracle server speaking the generate API
pub struct MockOracleServer {
    addr: SocketAddr,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl MockOracleServer {
    /// Start the mock server on an available port
    pub async fn start() -> Self {
        let app = Router::new()
            .route("/api/tags", get(handle_tags))
            .route("/api/generate", post(handle_generate));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .unwrap();
        });

        Self {
            addr,
            shutdown_tx: Some(shutdown_tx),
        }
    }

    /// Get the base URL for this mock server
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Stop the mock server
    pub fn stop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

impl Drop for MockOracleServer {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Tags endpoint response (health check)
async fn handle_tags() -> Json<TagsResponse> {
    Json(TagsResponse {
        models: vec![ModelInfo {
            name: "llama3.2:latest".to_string(),
            modified_at: "2026-01-01T00:00:00Z".to_string(),
            size: 4_000_000_000,
        }],
    })
}

/// Generate endpoint; routes on prompt content
async fn handle_generate(Json(request): Json<GenerateRequest>) -> Json<GenerateResponse> {
    let response = if request.prompt.contains("Pick the single best category") {
        classify_mock(&request.prompt)
    } else {
        // Insight synthesis
        r#"[
            {"title": "Top category dominates", "description": "One category holds most of your spend this period.", "type": "spending_pattern", "severity": "medium"},
            {"title": "Review subscriptions", "description": "Recurring charges make up a notable share of expenses.", "type": "saving_opportunity", "severity": "low", "monetary_impact": 45.0}
        ]"#
        .to_string()
    };

    Json(GenerateResponse {
        model: request.model,
        response,
        done: true,
    })
}

/// Pick the candidate mentioned in the transaction line, else the first one
fn classify_mock(prompt: &str) -> String {
    let candidates: Vec<&str> = prompt
        .lines()
        .find_map(|line| line.strip_prefix("Pick the single best category from this list: "))
        .map(|list| list.split(", ").collect())
        .unwrap_or_default();

    let transaction = prompt
        .lines()
        .find_map(|line| line.strip_prefix("Transaction: "))
        .unwrap_or("")
        .to_lowercase();

    candidates
        .iter()
        .find(|name| transaction.contains(&name.to_lowercase()))
        .or_else(|| candidates.first())
        .unwrap_or(&"Other Expense")
        .to_string()
}

// Request/response types for the mock server

#[derive(Debug, Serialize)]
struct TagsResponse {
    models: Vec<ModelInfo>,
}

#[derive(Debug, Serialize)]
struct ModelInfo {
    name: String,
    modified_at: String,
    size: u64,
}

#[derive(Debug, Deserialize)]
struct GenerateRequest {
    model: String,
    prompt: String,
    #[allow(dead_code)]
    stream: bool,
}

#[derive(Debug, Serialize)]
struct GenerateResponse {
    model: String,
    response: String,
    done: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::{HttpOracle, NarrativeOracle};

    #[tokio::test]
    async fn test_mock_server_health_check() {
        let server = MockOracleServer::start().await;
        let client = HttpOracle::new(&server.url(), "test-model");

        assert!(client.health_check().await);
    }

    #[tokio::test]
    async fn test_mock_server_classifies_by_summary() {
        let server = MockOracleServer::start().await;
        let client = HttpOracle::new(&server.url(), "test-model");

        let candidates = vec!["Groceries".to_string(), "Dining".to_string()];
        let reply = client
            .classify(&candidates, "expense 42.00 USD; merchant: Dining Hall")
            .await
            .unwrap();
        assert_eq!(reply, "Dining");
    }

    #[tokio::test]
    async fn test_mock_server_insights_parse() {
        let server = MockOracleServer::start().await;
        let client = HttpOracle::new(&server.url(), "test-model");

        let raw = client.synthesize_insights("{}").await.unwrap();
        let drafts = crate::oracle::parsing::parse_insight_drafts(&raw).unwrap();
        assert_eq!(drafts.len(), 2);
    }

    #[tokio::test]
    async fn test_memory_ledger_history_scope() {
        use chrono::NaiveDate;

        let ledger = MemoryLedger::new();
        let cat = ledger.add_category(1, "Coffee", TransactionType::Expense);

        let make = |id: i64, user_id: i64, day: u32| Transaction {
            id,
            account_id: id, // different account per entry on purpose
            user_id,
            date: NaiveDate::from_ymd_opt(2026, 1, day).unwrap(),
            description: "coffee".to_string(),
            amount: 5.0,
            tx_type: TransactionType::Expense,
            category_id: Some(cat.id),
            currency: "USD".to_string(),
            merchant: None,
            location: None,
            recurrence: None,
        };

        ledger.add_transaction(make(1, 1, 10));
        ledger.add_transaction(make(2, 1, 12));
        ledger.add_transaction(make(3, 2, 11)); // other user, excluded

        let history = ledger
            .category_history(1, cat.id, NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(), 10)
            .unwrap();

        // Same user across accounts, most recent first
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].id, 2);
    }

    #[test]
    fn test_memory_ledger_default_category_idempotent() {
        let ledger = MemoryLedger::new();
        let first = ledger
            .ensure_default_category(1, TransactionType::Expense)
            .unwrap();
        let second = ledger
            .ensure_default_category(1, TransactionType::Expense)
            .unwrap();
        assert_eq!(first.id, second.id);

        // Different scope gets its own default
        let other_user = ledger
            .ensure_default_category(2, TransactionType::Expense)
            .unwrap();
        assert_ne!(first.id, other_user.id);
    }
}
