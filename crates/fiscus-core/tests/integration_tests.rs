//! Integration tests for fiscus-core
//!
//! These tests exercise the full enrich → detect → forecast → insight
//! workflow through the public trait surface, the way an embedding
//! application would drive the engine.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Mutex;

use chrono::{Datelike, Duration, Months, NaiveDate, Utc};

use fiscus_core::{
    AnalyticsEngine, Category, FinancialInsight, InsightSink, InsightType, LedgerQuery,
    MockOracle, OracleClient, Result, Taxonomy, Transaction, TransactionFilter, TransactionType,
};

/// Minimal in-memory ledger for driving the engine end to end
#[derive(Default)]
struct TestLedger {
    transactions: Mutex<Vec<Transaction>>,
    categories: Mutex<Vec<Category>>,
    insights: Mutex<Vec<FinancialInsight>>,
    next_id: AtomicI64,
}

impl TestLedger {
    fn new() -> Self {
        Self {
            next_id: AtomicI64::new(1),
            ..Self::default()
        }
    }

    fn add_category(&self, name: &str, affinity: TransactionType) -> Category {
        let category = Category {
            id: self.next_id.fetch_add(1, Ordering::SeqCst),
            name: name.to_string(),
            description: None,
            color: None,
            icon: None,
            parent_id: None,
            system: true,
            owner_id: None,
            affinity,
        };
        self.categories.lock().unwrap().push(category.clone());
        category
    }

    fn add(&self, tx: Transaction) {
        self.transactions.lock().unwrap().push(tx);
    }

    fn insights(&self) -> Vec<FinancialInsight> {
        self.insights.lock().unwrap().clone()
    }
}

impl LedgerQuery for TestLedger {
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
        since: NaiveDate,
        limit: usize,
    ) -> Result<Vec<Transaction>> {
        let mut matched: Vec<Transaction> = self
            .transactions
            .lock()
            .unwrap()
            .iter()
            .filter(|tx| {
                tx.user_id == user_id && tx.category_id == Some(category_id) && tx.date >= since
            })
            .cloned()
            .collect();
        matched.sort_by(|a, b| b.date.cmp(&a.date));
        matched.truncate(limit);
        Ok(matched)
    }
}

impl Taxonomy for TestLedger {
    fn categories_for_type(
        &self,
        _user_id: i64,
        tx_type: TransactionType,
    ) -> Result<Vec<Category>> {
        Ok(self
            .categories
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.accepts(tx_type))
            .cloned()
            .collect())
    }

    fn ensure_default_category(
        &self,
        _user_id: i64,
        tx_type: TransactionType,
    ) -> Result<Category> {
        let name = fiscus_core::models::default_category_name(tx_type);
        {
            let categories = self.categories.lock().unwrap();
            if let Some(existing) = categories.iter().find(|c| c.name == name) {
                return Ok(existing.clone());
            }
        }
        Ok(self.add_category(name, tx_type))
    }
}

impl InsightSink for TestLedger {
    fn append_insight(&self, insight: &FinancialInsight) -> Result<()> {
        self.insights.lock().unwrap().push(insight.clone());
        Ok(())
    }
}

fn expense(id: i64, date: NaiveDate, amount: f64, category_id: Option<i64>, desc: &str) -> Transaction {
    Transaction {
        id,
        account_id: 1,
        user_id: 1,
        date,
        description: desc.to_string(),
        amount,
        tx_type: TransactionType::Expense,
        category_id,
        currency: "USD".to_string(),
        merchant: None,
        location: None,
        recurrence: None,
    }
}

fn days_ago(n: i64) -> NaiveDate {
    Utc::now().date_naive() - Duration::days(n)
}

#[tokio::test]
async fn test_full_enrichment_workflow() {
    let ledger = TestLedger::new();
    let groceries = ledger.add_category("Groceries", TransactionType::Expense);
    ledger.add_category("Dining", TransactionType::Expense);

    // A stable grocery history
    for i in 0..8 {
        ledger.add(expense(
            i,
            days_ago(7 * (i + 1)),
            60.0 + i as f64,
            Some(groceries.id),
            "SUPERMARKET",
        ));
    }

    let oracle = OracleClient::Mock(MockOracle::new().with_classification("Groceries"));
    let engine = AnalyticsEngine::new(&ledger, &ledger, &ledger, Some(&oracle));

    // Ordinary uncategorized purchase: classified, not anomalous
    let enrichment = engine
        .enrich_new_transaction(&expense(100, days_ago(0), 65.0, None, "SUPERMARKET"))
        .await
        .unwrap();
    assert_eq!(enrichment.category.as_ref().unwrap().id, groceries.id);
    assert!(!enrichment.anomaly.anomalous);
    assert!(ledger.insights().is_empty());

    // Ten-fold spike in the same category: flagged and recorded
    let enrichment = engine
        .enrich_new_transaction(&expense(101, days_ago(0), 650.0, None, "SUPERMARKET"))
        .await
        .unwrap();
    assert!(enrichment.anomaly.anomalous);
    assert!(enrichment.anomaly.z_score.unwrap() > 3.0);

    let recorded = ledger.insights();
    assert_eq!(recorded.len(), 1);
    assert_eq!(recorded[0].insight_type, InsightType::Anomaly);
    assert_eq!(recorded[0].monetary_impact, Some(650.0));
}

#[tokio::test]
async fn test_classification_survives_oracle_outage() {
    let ledger = TestLedger::new();
    ledger.add_category("Groceries", TransactionType::Expense);

    let oracle = OracleClient::Mock(MockOracle::new().failing_classification());
    let engine = AnalyticsEngine::new(&ledger, &ledger, &ledger, Some(&oracle));

    let enrichment = engine
        .enrich_new_transaction(&expense(1, days_ago(0), 20.0, None, "SOMEWHERE"))
        .await
        .unwrap();

    // Falls back to the type default instead of failing ingestion
    assert_eq!(enrichment.category.unwrap().name, "Other Expense");
}

#[tokio::test]
async fn test_forecast_follows_spending_trend() {
    let ledger = TestLedger::new();
    let rent = ledger.add_category("Rent", TransactionType::Expense);

    let today = Utc::now().date_naive();
    for (i, amount) in [1000.0, 1100.0, 1200.0, 1300.0].iter().enumerate() {
        let date = today.checked_sub_months(Months::new(4 - i as u32)).unwrap();
        ledger.add(expense(i as i64, date, *amount, Some(rent.id), "RENT"));
    }

    let engine = AnalyticsEngine::new(&ledger, &ledger, &ledger, None);
    let forecast = engine.forecast_expenses(1, 1).unwrap();
    assert!((forecast - 1400.0).abs() < 1e-6);
}

#[tokio::test]
async fn test_insight_generation_and_persistence() {
    let ledger = TestLedger::new();
    let dining = ledger.add_category("Dining", TransactionType::Expense);
    for i in 0..15 {
        ledger.add(expense(i, days_ago(i * 3), 25.0, Some(dining.id), "RESTAURANT"));
    }

    let oracle = OracleClient::Mock(MockOracle::new().with_insights_json(
        r#"[
            {"title": "Dining is your top category", "description": "Most spend went to dining.", "type": "spending_pattern", "severity": "high"},
            {"title": "Try cooking twice a week", "description": "Could save around $50.", "type": "saving_opportunity", "severity": "low", "monetary_impact": 50.0},
            {"title": "Legacy flag", "description": "Old type name still works.", "type": "unusual_activity", "severity": "medium"}
        ]"#,
    ));
    let engine = AnalyticsEngine::new(&ledger, &ledger, &ledger, Some(&oracle));

    let persisted = engine.run_and_persist_insights(1).await.unwrap();
    assert_eq!(persisted, 3);

    let insights = ledger.insights();
    // Most severe first, legacy type folded into Anomaly
    assert_eq!(insights[0].title, "Dining is your top category");
    assert_eq!(insights[1].insight_type, InsightType::Anomaly);
    assert_eq!(insights[2].monetary_impact, Some(50.0));

    // All valid now, none for more than two weeks
    let now = Utc::now();
    for insight in &insights {
        assert!(insight.is_valid_at(now));
        assert!(!insight.is_valid_at(now + Duration::days(15)));
        assert!(!insight.read);
        assert!(!insight.dismissed);
    }
}

#[tokio::test]
async fn test_insights_fail_closed_on_sparse_data() {
    let ledger = TestLedger::new();
    let dining = ledger.add_category("Dining", TransactionType::Expense);
    // Only 5 transactions, below the minimum of 10
    for i in 0..5 {
        ledger.add(expense(i, days_ago(i), 25.0, Some(dining.id), "RESTAURANT"));
    }

    let mock = MockOracle::new();
    let oracle = OracleClient::Mock(mock.clone());
    let engine = AnalyticsEngine::new(&ledger, &ledger, &ledger, Some(&oracle));

    let persisted = engine.run_and_persist_insights(1).await.unwrap();
    assert_eq!(persisted, 0);
    assert_eq!(mock.insight_calls(), 0);
}

#[tokio::test]
async fn test_insights_fail_closed_on_garbage_reply() {
    let ledger = TestLedger::new();
    let dining = ledger.add_category("Dining", TransactionType::Expense);
    for i in 0..15 {
        ledger.add(expense(i, days_ago(i), 25.0, Some(dining.id), "RESTAURANT"));
    }

    let oracle = OracleClient::Mock(
        MockOracle::new().with_insights_json("I'd rather write you a poem about budgets."),
    );
    let engine = AnalyticsEngine::new(&ledger, &ledger, &ledger, Some(&oracle));

    let persisted = engine.run_and_persist_insights(1).await.unwrap();
    assert_eq!(persisted, 0);
    assert!(ledger.insights().is_empty());
}

#[test]
fn test_monthly_aggregation_boundaries() {
    // Transactions on month boundaries land in their own months
    let jan_31 = NaiveDate::from_ymd_opt(2026, 1, 31).unwrap();
    let feb_1 = NaiveDate::from_ymd_opt(2026, 2, 1).unwrap();

    let txs = vec![
        expense(1, jan_31, 100.0, None, "A"),
        expense(2, feb_1, 200.0, None, "B"),
    ];

    let aggregates = fiscus_core::aggregate::monthly_aggregates(&txs);
    assert_eq!(aggregates.len(), 2);
    assert_eq!(aggregates[0].month, 1);
    assert_eq!(aggregates[1].month, 2);
    assert_eq!(aggregates[0].year, jan_31.year());
    assert!((aggregates[0].expense_total - 100.0).abs() < 1e-9);
}
