//! Fiscus Core Library
//!
//! Analytics core for the Fiscus personal finance tracker:
//! - Transaction classification against the category taxonomy
//! - Three-sigma anomaly detection over category history
//! - Monthly expense trend forecasting
//! - Narrative insight generation from spending summaries
//! - Pluggable narrative oracle backends (HTTP, mock)
//!
//! Storage stays behind the `ledger` traits; the crate computes, it never
//! persists.

pub mod aggregate;
pub mod anomaly;
pub mod classifier;
pub mod engine;
pub mod error;
pub mod forecast;
pub mod insights;
pub mod ledger;
pub mod models;
pub mod oracle;
pub mod stats;

/// Test utilities including the in-memory ledger and mock oracle server
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use anomaly::{AnomalyConfig, AnomalyDetector, AnomalyVerdict};
pub use classifier::CategoryClassifier;
pub use engine::{AnalyticsEngine, Enrichment};
pub use error::{Error, Result};
pub use forecast::TrendForecaster;
pub use insights::{FinancialInsight, InsightGenerator, InsightType, Severity, SpendingSummary};
pub use ledger::{InsightSink, LedgerQuery, Taxonomy, TransactionFilter};
pub use models::{
    Category, CategoryArena, MonthlyAggregate, RecurrencePattern, Transaction, TransactionType,
};
pub use oracle::{HttpOracle, MockOracle, NarrativeOracle, OracleClient};
