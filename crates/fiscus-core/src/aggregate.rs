//! Monthly aggregation
//!
//! Derives ordered per-month totals from raw transactions. Aggregates are
//! computed on demand and never persisted.

use std::collections::BTreeMap;

use chrono::Datelike;

use crate::models::{MonthlyAggregate, Transaction, TransactionType};

/// Group transactions into chronologically ordered monthly aggregates.
///
/// Months with no transactions are absent; callers that need a dense series
/// should treat gaps according to their own semantics.
pub fn monthly_aggregates(transactions: &[Transaction]) -> Vec<MonthlyAggregate> {
    let mut by_month: BTreeMap<(i32, u32), MonthlyAggregate> = BTreeMap::new();

    for tx in transactions {
        let key = (tx.date.year(), tx.date.month());
        let agg = by_month
            .entry(key)
            .or_insert_with(|| MonthlyAggregate::new(key.0, key.1));

        match tx.tx_type {
            TransactionType::Income => agg.income_total += tx.amount,
            TransactionType::Expense => agg.expense_total += tx.amount,
            TransactionType::Transfer => agg.transfer_total += tx.amount,
        }
    }

    by_month.into_values().collect()
}

/// Chronological expense totals, the forecaster's input series
pub fn expense_series(aggregates: &[MonthlyAggregate]) -> Vec<f64> {
    aggregates.iter().map(|a| a.expense_total).collect()
}
