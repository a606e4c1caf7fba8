//! Consumed and produced interfaces
//!
//! The analytics core never touches storage directly. It reads the ledger and
//! the category taxonomy through these traits and appends generated insights
//! through the sink; the persistence layer behind them is expected to give
//! serializable reads (no computation observes a half-written transaction).

use chrono::NaiveDate;

use crate::error::Result;
use crate::insights::FinancialInsight;
use crate::models::{Category, Transaction, TransactionType};

/// Filter for ledger queries
#[derive(Debug, Default, Clone)]
pub struct TransactionFilter {
    /// Inclusive start date
    pub from: Option<NaiveDate>,
    /// Inclusive end date
    pub to: Option<NaiveDate>,
    pub category_id: Option<i64>,
    pub account_id: Option<i64>,
    pub tx_type: Option<TransactionType>,
}

impl TransactionFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn date_range(mut self, from: NaiveDate, to: NaiveDate) -> Self {
        self.from = Some(from);
        self.to = Some(to);
        self
    }

    pub fn category(mut self, category_id: i64) -> Self {
        self.category_id = Some(category_id);
        self
    }

    pub fn account(mut self, account_id: i64) -> Self {
        self.account_id = Some(account_id);
        self
    }

    pub fn tx_type(mut self, tx_type: TransactionType) -> Self {
        self.tx_type = Some(tx_type);
        self
    }

    /// Whether a transaction passes this filter (ownership is checked by the
    /// ledger implementation, not here)
    pub fn matches(&self, tx: &Transaction) -> bool {
        if let Some(from) = self.from {
            if tx.date < from {
                return false;
            }
        }
        if let Some(to) = self.to {
            if tx.date > to {
                return false;
            }
        }
        if let Some(category_id) = self.category_id {
            if tx.category_id != Some(category_id) {
                return false;
            }
        }
        if let Some(account_id) = self.account_id {
            if tx.account_id != account_id {
                return false;
            }
        }
        if let Some(tx_type) = self.tx_type {
            if tx.tx_type != tx_type {
                return false;
            }
        }
        true
    }
}

/// Read access to a user's transaction history
pub trait LedgerQuery: Send + Sync {
    /// Transactions for a user matching the filter, most recent first
    fn transactions(&self, user_id: i64, filter: &TransactionFilter) -> Result<Vec<Transaction>>;

    /// Up to `limit` most recent transactions in the given category for the
    /// owning user, on or after `since`. One consistent anomaly scope:
    /// category + user, across all of the user's accounts.
    fn category_history(
        &self,
        user_id: i64,
        category_id: i64,
        since: NaiveDate,
        limit: usize,
    ) -> Result<Vec<Transaction>>;
}

/// Read/upsert access to the category taxonomy
pub trait Taxonomy: Send + Sync {
    /// Active categories visible to the user for a transaction type
    /// (system categories plus the user's own)
    fn categories_for_type(
        &self,
        user_id: i64,
        tx_type: TransactionType,
    ) -> Result<Vec<Category>>;

    /// Idempotent upsert of the default category for (user scope, type).
    /// Repeated calls return the same category; at most one is ever created
    /// per scope and type.
    fn ensure_default_category(&self, user_id: i64, tx_type: TransactionType)
        -> Result<Category>;
}

/// Append-only insight writes, scoped to a user
pub trait InsightSink: Send + Sync {
    fn append_insight(&self, insight: &FinancialInsight) -> Result<()>;
}
