//! Insight generator
//!
//! Feeds a structured spending summary to the oracle and turns the reply
//! into validated insights. Fail-closed: any oracle failure, malformed
//! reply included, produces an empty list rather than an error.

use chrono::NaiveDate;
use tracing::{debug, warn};

use crate::models::{Category, Transaction};
use crate::oracle::{parsing, NarrativeOracle, OracleClient};

use super::summary::{SpendingSummary, DEFAULT_TOP_CATEGORIES};
use super::types::{FinancialInsight, InsightDraft, InsightType, Severity};

/// Generates narrative insights from a period of activity
#[derive(Debug, Clone)]
pub struct InsightGenerator {
    /// Below this many transactions the oracle is not consulted
    min_transactions: usize,
    /// How long generated insights stay valid, in days
    validity_days: i64,
    /// Top expense categories included in the summary
    top_categories: usize,
}

impl Default for InsightGenerator {
    fn default() -> Self {
        Self {
            min_transactions: 10,
            validity_days: 14,
            top_categories: DEFAULT_TOP_CATEGORIES,
        }
    }
}

impl InsightGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_min_transactions(mut self, min: usize) -> Self {
        self.min_transactions = min;
        self
    }

    pub fn with_validity_days(mut self, days: i64) -> Self {
        self.validity_days = days;
        self
    }

    /// Generate insights for a user's activity over `period`.
    ///
    /// Too little data, an unreachable oracle, or an unparseable reply all
    /// yield an empty list. Results are sorted most severe first.
    pub async fn generate(
        &self,
        user_id: i64,
        transactions: &[Transaction],
        categories: &[Category],
        period: (NaiveDate, NaiveDate),
        oracle: &OracleClient,
    ) -> Vec<FinancialInsight> {
        if transactions.len() < self.min_transactions {
            debug!(
                user_id,
                count = transactions.len(),
                min = self.min_transactions,
                "Not enough transactions for insight generation"
            );
            return vec![];
        }

        let summary = SpendingSummary::build(transactions, categories, period, self.top_categories);
        let summary_json = match summary.to_prompt_json() {
            Ok(json) => json,
            Err(e) => {
                warn!(user_id, error = %e, "Failed to serialize spending summary");
                return vec![];
            }
        };

        let raw = match oracle.synthesize_insights(&summary_json).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!(user_id, error = %e, "Oracle insight synthesis failed");
                return vec![];
            }
        };

        let drafts = match parsing::parse_insight_drafts(&raw) {
            Ok(drafts) => drafts,
            Err(e) => {
                warn!(user_id, error = %e, "Oracle insight reply was malformed");
                return vec![];
            }
        };

        let mut insights: Vec<FinancialInsight> = drafts
            .into_iter()
            .filter(|d| !d.title.trim().is_empty() && !d.description.trim().is_empty())
            .map(|d| self.materialize(user_id, d))
            .collect();

        insights.sort_by(|a, b| b.severity.priority().cmp(&a.severity.priority()));

        debug!(user_id, count = insights.len(), "Insight generation complete");
        insights
    }

    /// Turn a draft into a concrete insight, coercing unknown or missing
    /// enum values to their defaults
    fn materialize(&self, user_id: i64, draft: InsightDraft) -> FinancialInsight {
        let insight_type = draft
            .insight_type
            .as_deref()
            .and_then(|s| s.parse().ok())
            .unwrap_or(InsightType::FinancialTip);
        let severity = draft
            .severity
            .as_deref()
            .and_then(|s| s.parse().ok())
            .unwrap_or(Severity::Medium);

        let mut insight = FinancialInsight::new(
            user_id,
            draft.title,
            draft.description,
            insight_type,
            severity,
            self.validity_days,
        );
        if let Some(impact) = draft.monetary_impact {
            insight = insight.with_monetary_impact(impact);
        }
        insight
    }
}
