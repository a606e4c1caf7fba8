//! Structured spending summary
//!
//! Condenses a period of transactions into the compact JSON document the
//! oracle receives for insight synthesis. Raw transactions never leave the
//! engine; the oracle only ever sees this aggregate view.

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::Serialize;

use crate::aggregate;
use crate::error::Result;
use crate::models::{Category, MonthlyAggregate, Transaction, TransactionType};

/// Default number of top expense categories included in a summary
pub const DEFAULT_TOP_CATEGORIES: usize = 5;

/// Spend in one category over the summary period
#[derive(Debug, Clone, Serialize)]
pub struct CategorySpend {
    pub name: String,
    pub total: f64,
    /// Share of the period's total expense, in percent
    pub share_pct: f64,
}

/// Aggregate view of a user's activity over a period
#[derive(Debug, Clone, Serialize)]
pub struct SpendingSummary {
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub transaction_count: usize,
    pub income_total: f64,
    pub expense_total: f64,
    /// income_total - expense_total
    pub net: f64,
    /// Largest expense categories first
    pub top_categories: Vec<CategorySpend>,
    /// Month-by-month totals, chronological
    pub monthly: Vec<MonthlyAggregate>,
    /// Share of expense volume from recurring transactions, in percent
    pub recurring_share_pct: f64,
}

impl SpendingSummary {
    /// Build a summary over `transactions`, resolving category names from
    /// `categories`. Uncategorized spend is reported under its own label.
    pub fn build(
        transactions: &[Transaction],
        categories: &[Category],
        period: (NaiveDate, NaiveDate),
        top_n: usize,
    ) -> Self {
        let names: HashMap<i64, &str> = categories
            .iter()
            .map(|c| (c.id, c.name.as_str()))
            .collect();

        let mut income_total = 0.0;
        let mut expense_total = 0.0;
        let mut recurring_expense = 0.0;
        let mut by_category: HashMap<String, f64> = HashMap::new();

        for tx in transactions {
            match tx.tx_type {
                TransactionType::Income => income_total += tx.amount,
                TransactionType::Expense => {
                    expense_total += tx.amount;
                    if tx.is_recurring() {
                        recurring_expense += tx.amount;
                    }
                    let label = tx
                        .category_id
                        .and_then(|id| names.get(&id).copied())
                        .unwrap_or("Uncategorized");
                    *by_category.entry(label.to_string()).or_insert(0.0) += tx.amount;
                }
                TransactionType::Transfer => {}
            }
        }

        let mut top_categories: Vec<CategorySpend> = by_category
            .into_iter()
            .map(|(name, total)| CategorySpend {
                name,
                total,
                share_pct: if expense_total > 0.0 {
                    total / expense_total * 100.0
                } else {
                    0.0
                },
            })
            .collect();
        top_categories.sort_by(|a, b| {
            b.total
                .partial_cmp(&a.total)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.name.cmp(&b.name))
        });
        top_categories.truncate(top_n);

        Self {
            period_start: period.0,
            period_end: period.1,
            transaction_count: transactions.len(),
            income_total,
            expense_total,
            net: income_total - expense_total,
            top_categories,
            monthly: aggregate::monthly_aggregates(transactions),
            recurring_share_pct: if expense_total > 0.0 {
                recurring_expense / expense_total * 100.0
            } else {
                0.0
            },
        }
    }

    /// Serialize for inclusion in an oracle prompt
    pub fn to_prompt_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
